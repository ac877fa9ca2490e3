//! Collision resolution for balls in a rectangular arena.
//!
//! Computes post-collision state for the two event kinds:
//! - **Wall**: the ball is moved to its impact position and the velocity
//!   component along the wall normal is negated.
//! - **Pair**: equal-and-opposite impulse along the contact normal, with
//!   restitution `min(ea, eb)` and a positional push-out for residual overlap.
//!
//! ## Model Assumptions
//!
//! - **Wall hits are perfectly elastic here.** Restitution against walls is
//!   applied by [`Ball::enforce_bounds`], which the engine runs after every
//!   drift. Both layers always run.
//! - **Instantaneous collision**: no contact duration, no friction, no spin.
//!
//! ```text
//!      a ●──→   ←──● b          j = -(1 + e) (vb - va)·n / (1/ma + 1/mb)
//!          ───n───→             va -= j n / ma
//!                               vb += j n / mb
//! ```

use crate::collision::CollisionEvent;
use crate::types::{Ball, BallId, Vec2};

/// Outcome of resolving one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// State was changed; counts as a collision.
    Resolved,
    /// Pair already separating along the normal; velocities untouched, no push-out.
    Skipped,
}

/// Collision resolver for the arena.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    /// Interpenetration tolerated before balls are pushed apart
    pub overlap_threshold: f64,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self {
            overlap_threshold: crate::types::constants::OVERLAP_THRESHOLD,
        }
    }
}

impl CollisionResolver {
    pub fn new(overlap_threshold: f64) -> Self {
        Self { overlap_threshold }
    }

    /// Resolve a collision against the current ball state.
    ///
    /// # Arguments
    /// * `balls` - The ball collection the event's ids index into
    /// * `event` - Collision to resolve
    /// * `current_time` - Time already consumed inside the current sub-step.
    ///   Pair events advance both balls by `event.time() - current_time`;
    ///   wall events advance their ball by the raw `event.time()`.
    ///
    /// # Panics
    /// If the event refers to a ball outside `balls`.
    pub fn resolve(
        &self,
        balls: &mut [Ball],
        event: &CollisionEvent,
        current_time: f64,
    ) -> Resolution {
        match *event {
            CollisionEvent::Wall { time, ball, normal } => {
                Self::resolve_wall_collision(&mut balls[ball.index()], time, normal.x, normal.y);
                Resolution::Resolved
            }
            CollisionEvent::Pair { time, a, b, normal } => {
                let dt = time - current_time;
                let (ball_a, ball_b) = pair_mut(balls, a, b);
                self.resolve_pair_collision(ball_a, ball_b, dt, normal)
            }
        }
    }

    fn resolve_wall_collision(ball: &mut Ball, time: f64, normal_x: f64, normal_y: f64) {
        ball.position = ball.predict_position(time);

        if normal_x != 0.0 {
            ball.velocity.x = -ball.velocity.x;
        }
        if normal_y != 0.0 {
            ball.velocity.y = -ball.velocity.y;
        }
    }

    fn resolve_pair_collision(
        &self,
        a: &mut Ball,
        b: &mut Ball,
        dt: f64,
        normal: Vec2,
    ) -> Resolution {
        a.position = a.predict_position(dt);
        b.position = b.predict_position(dt);

        let rel_vel = b.velocity - a.velocity;
        let vel_along_normal = rel_vel.dot(&normal);
        if vel_along_normal >= 0.0 {
            return Resolution::Skipped;
        }

        // Push apart any overlap beyond the tolerance, half to each side
        let distance = a.position.distance_to(&b.position);
        let min_distance = a.radius + b.radius;
        if distance < min_distance - self.overlap_threshold {
            let separation = normal * ((min_distance - distance) / 2.0);
            a.position -= separation;
            b.position += separation;
        }

        let restitution = a.restitution.min(b.restitution);
        let j = -(1.0 + restitution) * vel_along_normal / (1.0 / a.mass + 1.0 / b.mass);
        let impulse = normal * j;

        a.velocity -= impulse / a.mass;
        b.velocity += impulse / b.mass;

        Resolution::Resolved
    }
}

/// Borrow two distinct balls mutably.
fn pair_mut(balls: &mut [Ball], a: BallId, b: BallId) -> (&mut Ball, &mut Ball) {
    let (i, j) = (a.index(), b.index());
    assert_ne!(i, j, "pair event must reference two distinct balls");
    if i < j {
        let (left, right) = balls.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = balls.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

// =============================================================================
// Tests
// =============================================================================
