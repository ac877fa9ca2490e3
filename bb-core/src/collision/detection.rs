//! Time-of-impact collision detection.
//!
//! Predicts when a ball will touch a wall or another ball, assuming every ball
//! keeps its current velocity. All times are relative to the current instant.

use crate::types::{ArenaBounds, Ball, BallId, Vec2};

/// A predicted collision.
///
/// Balls are referenced by [`BallId`] so an event is plain data and stays
/// valid while the ball collection is mutated around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEvent {
    /// A ball reaching one of the four arena walls.
    ///
    /// `normal` is axis-aligned and points into the arena.
    Wall {
        time: f64,
        ball: BallId,
        normal: Vec2,
    },
    /// Two balls touching. `normal` is a unit vector from `a` toward `b`.
    Pair {
        time: f64,
        a: BallId,
        b: BallId,
        normal: Vec2,
    },
}

impl CollisionEvent {
    pub fn time(&self) -> f64 {
        match self {
            CollisionEvent::Wall { time, .. } | CollisionEvent::Pair { time, .. } => *time,
        }
    }

    pub fn normal(&self) -> Vec2 {
        match self {
            CollisionEvent::Wall { normal, .. } | CollisionEvent::Pair { normal, .. } => *normal,
        }
    }

    /// Whether the event involves the given ball
    pub fn involves(&self, id: BallId) -> bool {
        match self {
            CollisionEvent::Wall { ball, .. } => *ball == id,
            CollisionEvent::Pair { a, b, .. } => *a == id || *b == id,
        }
    }
}

/// Collision detector for balls in a rectangular arena.
pub struct CollisionDetector;

impl CollisionDetector {
    /// Find the earliest upcoming collision among all walls and ball pairs.
    ///
    /// Scans ball `i`'s walls, then pairs `(i, j > i)`, for each `i` in order.
    /// A later candidate only wins when strictly earlier, so ties go to the
    /// first one found.
    pub fn find_next_collision(balls: &[Ball], bounds: &ArenaBounds) -> Option<CollisionEvent> {
        let mut earliest: Option<CollisionEvent> = None;

        for (i, ball) in balls.iter().enumerate() {
            let id = BallId(i);

            if let Some(event) = Self::predict_wall_collision(id, ball, bounds) {
                earliest = Self::earlier(earliest, event);
            }

            for (j, other) in balls.iter().enumerate().skip(i + 1) {
                if let Some(event) = Self::predict_collision(id, ball, BallId(j), other) {
                    earliest = Self::earlier(earliest, event);
                }
            }
        }

        earliest
    }

    fn earlier(
        current: Option<CollisionEvent>,
        candidate: CollisionEvent,
    ) -> Option<CollisionEvent> {
        match current {
            Some(best) if candidate.time() >= best.time() => Some(best),
            _ => Some(candidate),
        }
    }

    /// Predict when a ball's edge reaches a wall.
    ///
    /// Axes are checked X then Y. A Y candidate replaces an X candidate only
    /// if strictly earlier, so a simultaneous corner hit resolves the X wall
    /// first on every run. Negative times (ball already past the wall line)
    /// are ignored; the boundary clamp deals with those.
    pub fn predict_wall_collision(
        id: BallId,
        ball: &Ball,
        bounds: &ArenaBounds,
    ) -> Option<CollisionEvent> {
        let mut best: Option<(f64, Vec2)> = None;

        let axes = [
            (ball.position.x, ball.velocity.x, bounds.width, Vec2::new(1.0, 0.0)),
            (ball.position.y, ball.velocity.y, bounds.height, Vec2::new(0.0, 1.0)),
        ];

        for (pos, vel, limit, axis) in axes {
            let candidate = if vel < 0.0 {
                Some(((ball.radius - pos) / vel, axis))
            } else if vel > 0.0 {
                Some(((limit - ball.radius - pos) / vel, -axis))
            } else {
                None
            };

            if let Some((t, normal)) = candidate {
                let better = match best {
                    Some((best_t, _)) => t < best_t,
                    None => true,
                };
                if t >= 0.0 && better {
                    best = Some((t, normal));
                }
            }
        }

        best.map(|(time, normal)| CollisionEvent::Wall {
            time,
            ball: id,
            normal,
        })
    }

    /// Predict when two balls first touch.
    ///
    /// Solves `|rel_pos + rel_vel * t| = ra + rb` for the smaller root.
    ///
    /// ```text
    /// A t² + B t + C = 0
    /// A = |rel_vel|²
    /// B = 2 rel_pos · rel_vel
    /// C = |rel_pos|² - (ra + rb)²
    /// ```
    ///
    /// Balls that already overlap collide immediately unless they are moving
    /// apart, in which case no event is produced.
    pub fn predict_collision(
        a_id: BallId,
        a: &Ball,
        b_id: BallId,
        b: &Ball,
    ) -> Option<CollisionEvent> {
        let rel_pos = b.position - a.position;
        let rel_vel = b.velocity - a.velocity;

        let a_coef = rel_vel.length_squared();
        if a_coef == 0.0 {
            return None;
        }

        let b_coef = 2.0 * rel_pos.dot(&rel_vel);
        let reach = a.radius + b.radius;
        let c_coef = rel_pos.length_squared() - reach * reach;

        if c_coef <= 0.0 {
            if rel_vel.dot(&rel_pos) >= 0.0 {
                return None;
            }
            return Some(CollisionEvent::Pair {
                time: 0.0,
                a: a_id,
                b: b_id,
                normal: rel_pos.normalized(),
            });
        }

        let discriminant = b_coef * b_coef - 4.0 * a_coef * c_coef;
        if discriminant < 0.0 {
            return None;
        }

        let t = (-b_coef - discriminant.sqrt()) / (2.0 * a_coef);
        if t < 0.0 {
            return None;
        }

        // Orient the normal from the contact positions, not the current ones
        let normal = (b.predict_position(t) - a.predict_position(t)).normalized();

        Some(CollisionEvent::Pair {
            time: t,
            a: a_id,
            b: b_id,
            normal,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
