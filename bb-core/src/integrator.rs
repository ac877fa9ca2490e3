//! Advancing balls between collision events.
//!
//! No forces act on the balls, so between two events every ball moves in a
//! straight line at constant velocity and the exact update is
//!
//! ```text
//! x_new = x + v*dt
//! v_new = v
//! ```
//!
//! After each drift the boundary clamp ([`Ball::enforce_bounds`]) runs on every
//! ball. It catches balls that floating-point drift (or a wall resolution)
//! left slightly outside the arena.

use crate::types::{ArenaBounds, Ball};

/// Constant-velocity integrator for the arena.
pub struct Drift;

impl Drift {
    /// Move one ball along its velocity for `dt`.
    pub fn advance(ball: &mut Ball, dt: f64) {
        ball.position = ball.predict_position(dt);
    }

    /// Move every ball by `dt`, then clamp each one back inside the arena.
    pub fn advance_all(balls: &mut [Ball], dt: f64, bounds: &ArenaBounds) {
        for ball in balls.iter_mut() {
            Self::advance(ball, dt);
            ball.enforce_bounds(bounds);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
