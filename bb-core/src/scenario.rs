//! Scenario descriptions: what goes into the arena before the first step.
//!
//! A scenario is an arena size, a time scale, optional engine tuning, a list
//! of explicit balls and an optional seeded random fill. Random fills use
//! `ChaChaRng` so the same seed always produces the same arena.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::engine::{EngineConfig, PhysicsEngine};
use crate::types::{ArenaBounds, Ball, Vec2};

/// Simulated seconds per real second when nothing else is configured.
pub const DEFAULT_TIME_SCALE: f64 = 0.01;

/// Strength range of a random velocity kick.
pub const IMPULSE_STRENGTH_MIN: f64 = 2000.0;
pub const IMPULSE_STRENGTH_MAX: f64 = 5000.0;

/// Time scale range covered by a `[0, 1]` slider.
const SLIDER_TIME_SCALE_MIN: f64 = 0.001;
const SLIDER_TIME_SCALE_SPAN: f64 = 1_000_000.0;

fn default_time_scale() -> f64 {
    DEFAULT_TIME_SCALE
}

/// A complete arena setup, usually loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub arena: ArenaBounds,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub balls: Vec<Ball>,
    #[serde(default)]
    pub random: Option<RandomFill>,
}

impl ScenarioConfig {
    /// Empty scenario for an arena of the given size.
    pub fn new(arena: ArenaBounds) -> Self {
        Self {
            arena,
            time_scale: DEFAULT_TIME_SCALE,
            engine: EngineConfig::default(),
            balls: Vec::new(),
            random: None,
        }
    }

    /// Check everything the engine assumes but never verifies.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.arena.width > 0.0 && self.arena.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "arena must have positive size, got {}x{}",
                self.arena.width, self.arena.height
            )));
        }
        if !(self.time_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "time_scale must be positive, got {}",
                self.time_scale
            )));
        }

        for (i, ball) in self.balls.iter().enumerate() {
            if !(ball.radius > 0.0) || !(ball.mass > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "ball {} needs positive radius and mass",
                    i
                )));
            }
            if !(0.0..=1.0).contains(&ball.restitution) {
                return Err(ConfigError::Invalid(format!(
                    "ball {} restitution {} outside [0, 1]",
                    i, ball.restitution
                )));
            }
            if !self.arena.contains_circle(ball.position, ball.radius) {
                return Err(ConfigError::Invalid(format!(
                    "ball {} at ({}, {}) does not fit in the arena",
                    i, ball.position.x, ball.position.y
                )));
            }
        }

        if let Some(fill) = &self.random {
            fill.validate(&self.arena)?;
        }
        Ok(())
    }

    /// Explicit balls followed by the random fill, if any.
    pub fn build_balls(&self) -> Vec<Ball> {
        let mut balls = self.balls.clone();
        if let Some(fill) = &self.random {
            balls.extend(fill.generate(&self.arena));
        }
        balls
    }

    /// Validate and build a populated engine.
    pub fn build_engine(&self) -> Result<PhysicsEngine, ConfigError> {
        self.validate()?;
        let mut engine = PhysicsEngine::with_config(self.engine.clone());
        for ball in self.build_balls() {
            engine.add(ball);
        }
        Ok(engine)
    }
}

/// Seeded random population of the arena.
///
/// Ranges are half-open. Mass follows the radius as `π r² / 400`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomFill {
    pub seed: u64,
    pub count_min: usize,
    pub count_max: usize,
    pub radius_min: f64,
    pub radius_max: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub restitution: f64,
}

impl Default for RandomFill {
    fn default() -> Self {
        Self {
            seed: 0,
            count_min: 2,
            count_max: 192,
            radius_min: 15.0,
            radius_max: 40.0,
            speed_min: 2000.0,
            speed_max: 4000.0,
            restitution: 1.0,
        }
    }
}

impl RandomFill {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self, arena: &ArenaBounds) -> Result<(), ConfigError> {
        if self.count_min >= self.count_max {
            return Err(ConfigError::Invalid(format!(
                "random count range [{}, {}) is empty",
                self.count_min, self.count_max
            )));
        }
        if !(self.radius_min > 0.0 && self.radius_min <= self.radius_max) {
            return Err(ConfigError::Invalid(format!(
                "random radius range [{}, {}) is invalid",
                self.radius_min, self.radius_max
            )));
        }
        if !(self.speed_min >= 0.0 && self.speed_min <= self.speed_max) {
            return Err(ConfigError::Invalid(format!(
                "random speed range [{}, {}) is invalid",
                self.speed_min, self.speed_max
            )));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::Invalid(format!(
                "random restitution {} outside [0, 1]",
                self.restitution
            )));
        }
        if 2.0 * self.radius_max > arena.width.min(arena.height) {
            return Err(ConfigError::Invalid(format!(
                "arena {}x{} too small for radius {}",
                arena.width, arena.height, self.radius_max
            )));
        }
        Ok(())
    }

    /// Generate balls from this fill's own seed.
    pub fn generate(&self, arena: &ArenaBounds) -> Vec<Ball> {
        let mut rng = ChaChaRng::seed_from_u64(self.seed);
        self.generate_with(&mut rng, arena)
    }

    /// Generate balls drawing from an existing generator.
    ///
    /// Balls may overlap each other; nothing separates them up front.
    pub fn generate_with(&self, rng: &mut ChaChaRng, arena: &ArenaBounds) -> Vec<Ball> {
        let count = if self.count_max > self.count_min {
            rng.gen_range(self.count_min..self.count_max)
        } else {
            self.count_min
        };

        (0..count)
            .map(|_| {
                let radius = uniform(rng, self.radius_min, self.radius_max);
                let mass = PI * radius * radius / 400.0;
                let position = Vec2::new(
                    uniform(rng, radius, arena.width - radius),
                    uniform(rng, radius, arena.height - radius),
                );
                let angle = rng.gen_range(0.0..2.0 * PI);
                let speed = uniform(rng, self.speed_min, self.speed_max);

                Ball::new(position, Vec2::from_angle(angle, speed), radius, mass)
                    .with_restitution(self.restitution)
            })
            .collect()
    }
}

fn uniform(rng: &mut ChaChaRng, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// A velocity kick in a uniformly random direction.
pub fn random_impulse(rng: &mut ChaChaRng) -> Vec2 {
    let angle = rng.gen_range(0.0..2.0 * PI);
    let strength = rng.gen_range(IMPULSE_STRENGTH_MIN..IMPULSE_STRENGTH_MAX);
    Vec2::from_angle(angle, strength)
}

/// Map a `[0, 1]` slider position onto a logarithmic time scale
/// (0 -> 0.001x, 1 -> 1000x).
pub fn slider_to_time_scale(slider: f64) -> f64 {
    SLIDER_TIME_SCALE_MIN * SLIDER_TIME_SCALE_SPAN.powf(slider)
}

/// Inverse of [`slider_to_time_scale`].
pub fn time_scale_to_slider(time_scale: f64) -> f64 {
    (time_scale / SLIDER_TIME_SCALE_MIN).ln() / SLIDER_TIME_SCALE_SPAN.ln()
}

// =============================================================================
// Tests
// =============================================================================
