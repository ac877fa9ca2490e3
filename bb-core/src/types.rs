//! Core types for the arena simulation.
//!
//! Units are whatever the caller uses consistently. The bundled scenarios use
//! pixels for lengths and seconds for time, with a y-down screen frame:
//! - Position: px
//! - Velocity: px/s
//! - Mass: arbitrary (only ratios matter for impulses)

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Vec2 - 2D Vector
// =============================================================================

/// A 2D vector used for positions, velocities, normals and impulses.
///
/// Coordinate system (screen convention):
/// - X: horizontal, positive to the right
/// - Y: vertical, positive downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared length (avoids sqrt for comparisons)
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Length of the vector
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Returns a unit vector in the same direction, or zero if the length is zero
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            *self * (1.0 / len)
        }
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    pub fn distance_to_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Rotate 90 degrees clockwise (in a y-down frame): `(x, y) -> (y, -x)`
    pub fn perpendicular(&self) -> Self {
        Self {
            x: self.y,
            y: -self.x,
        }
    }

    /// Build a vector from polar components
    pub fn from_angle(angle: f64, magnitude: f64) -> Self {
        Self {
            x: angle.cos() * magnitude,
            y: angle.sin() * magnitude,
        }
    }
}

// Operator overloads for Vec2
impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::ZERO
    }
}

// =============================================================================
// Arena
// =============================================================================

/// The rectangular arena, spanning `[0, width] x [0, height]`.
///
/// Owned by whoever drives the engine; passed in on every step so a resize
/// takes effect immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub width: f64,
    pub height: f64,
}

impl ArenaBounds {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether a circle lies completely inside the arena
    pub fn contains_circle(&self, center: Vec2, radius: f64) -> bool {
        center.x - radius >= 0.0
            && center.x + radius <= self.width
            && center.y - radius >= 0.0
            && center.y + radius <= self.height
    }
}

// =============================================================================
// Ball
// =============================================================================

/// Stable handle to a ball: its index in the engine's ball collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId(pub usize);

impl BallId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for BallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Complete physical state of one ball.
///
/// Radius and mass are assumed positive and restitution in `[0, 1]`; the
/// engine does not validate them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub position: Vec2,
    #[serde(default)]
    pub velocity: Vec2,
    pub radius: f64,
    pub mass: f64,
    #[serde(default = "default_restitution")]
    pub restitution: f64,
}

fn default_restitution() -> f64 {
    1.0
}

impl Ball {
    /// Perfectly elastic ball.
    pub fn new(position: Vec2, velocity: Vec2, radius: f64, mass: f64) -> Self {
        Self {
            position,
            velocity,
            radius,
            mass,
            restitution: 1.0,
        }
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Where the ball would be after `dt` at its current velocity.
    ///
    /// Pure: the caller decides whether to commit the result.
    pub fn predict_position(&self, dt: f64) -> Vec2 {
        self.position + self.velocity * dt
    }

    /// Clamp the ball back inside the arena if it has breached a wall.
    ///
    /// The offending velocity component is made to point back into the
    /// arena and scaled by restitution. X and Y are handled independently.
    pub fn enforce_bounds(&mut self, bounds: &ArenaBounds) {
        if self.position.x - self.radius < 0.0 {
            self.position.x = self.radius;
            self.velocity.x = self.velocity.x.abs() * self.restitution;
        } else if self.position.x + self.radius > bounds.width {
            self.position.x = bounds.width - self.radius;
            self.velocity.x = -self.velocity.x.abs() * self.restitution;
        }

        if self.position.y - self.radius < 0.0 {
            self.position.y = self.radius;
            self.velocity.y = self.velocity.y.abs() * self.restitution;
        } else if self.position.y + self.radius > bounds.height {
            self.position.y = bounds.height - self.radius;
            self.velocity.y = -self.velocity.y.abs() * self.restitution;
        }
    }

    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            x: self.position.x,
            y: self.position.y,
            radius: self.radius,
        }
    }
}

/// What a renderer needs to draw one ball.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

// =============================================================================
// Constants
// =============================================================================

/// Numerical constants used by the engine defaults.
pub mod constants {
    /// Overlap below which two touching balls are not pushed apart
    pub const OVERLAP_THRESHOLD: f64 = 1e-4;

    /// Fraction of the frame budget under which a step stops sub-stepping
    pub const MIN_REMAINING_FRACTION: f64 = 1e-3;

    /// Points kept per trajectory trail
    pub const TRAIL_LENGTH: usize = 5;

    /// Doubled triangle area under which three trail points count as collinear
    pub const COLLINEAR_AREA: f64 = 1e-4;

    /// Hard cap on collision events processed in one step
    pub const MAX_SUBSTEPS: usize = 100_000;
}

// =============================================================================
// Tests
// =============================================================================
