//! Collision detection and resolution for balls in a rectangular arena.
//!
//! This module handles:
//! - **Detection**: Finding when the next collision happens (time of impact)
//! - **Resolution**: Computing post-collision velocities and positions
//!
//! ## Time-of-Impact Detection
//!
//! Instead of checking whether balls overlap after a fixed step (which lets
//! fast balls pass through walls and each other), we solve for the exact time
//! each ball reaches a wall or another ball, and step the world event by event.
//!
//! ```text
//! t=0          t=toi        t=dt
//!  ●──────────────●|  ←  ────●      (without TOI: ball ends past the wall)
//!                  |
//!                wall
//! ```

pub mod detection;
pub mod resolution;

pub use detection::*;
pub use resolution::*;
