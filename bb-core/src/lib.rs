//! # BB Core
//!
//! Continuous-collision physics for balls in a rectangular arena.
//!
//! Instead of moving every ball by a fixed step and fixing overlaps
//! afterwards, each step predicts the exact time of the next wall or ball
//! contact, moves everything there, resolves it and repeats until the step's
//! time budget is spent. Fast balls cannot pass through walls or each other.
//!
//! ## Architecture
//!
//! - `types`: Core data structures (Vec2, balls, arena bounds)
//! - `collision`: Time-of-impact detection and impulse resolution
//! - `integrator`: Constant-velocity drift between events
//! - `engine`: The sub-stepping loop
//! - `diagnostics`: Minimum distance, collision count, trails
//! - `scenario`: Arena setups and seeded random populations
//! - `config`: YAML scenario loader

pub mod collision;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod integrator;
pub mod scenario;
pub mod types;

pub use engine::{EngineConfig, PhysicsEngine};
pub use types::{ArenaBounds, Ball, BallId, Vec2};
