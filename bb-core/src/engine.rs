//! The collision-stepping engine.
//!
//! [`PhysicsEngine::step`] spends a time budget by jumping from one collision
//! to the next:
//!
//! ```text
//! remaining = dt
//! loop:
//!     event = earliest wall / pair collision
//!     none, or later than remaining -> drift everything by remaining, done
//!     drift everything to the event, resolve it, remaining -= event.time
//!     remaining < dt * min_remaining_fraction -> done
//! ```
//!
//! Every drift is followed by the boundary clamp. Diagnostics are refreshed
//! once per call.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionDetector, CollisionEvent, CollisionResolver, Resolution};
use crate::diagnostics::Diagnostics;
use crate::integrator::Drift;
use crate::types::{constants, ArenaBounds, Ball, BallId, BallSnapshot, Vec2};

/// Tunable engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Overlap tolerated between touching balls before they are pushed apart
    pub overlap_threshold: f64,
    /// A step stops once less than this fraction of its budget remains
    pub min_remaining_fraction: f64,
    /// Points kept per trajectory trail
    pub trail_length: usize,
    /// Doubled triangle area under which trail points count as collinear
    pub collinear_area: f64,
    /// Maximum collision events processed by a single step
    pub max_substeps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: constants::OVERLAP_THRESHOLD,
            min_remaining_fraction: constants::MIN_REMAINING_FRACTION,
            trail_length: constants::TRAIL_LENGTH,
            collinear_area: constants::COLLINEAR_AREA,
            max_substeps: constants::MAX_SUBSTEPS,
        }
    }
}

/// Owns the balls and advances them through time.
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    balls: Vec<Ball>,
    config: EngineConfig,
    resolver: CollisionResolver,
    /// Time consumed inside the current sub-step
    current_time: f64,
    /// Simulated time advanced since creation
    elapsed: f64,
    diagnostics: Diagnostics,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            balls: Vec::new(),
            resolver: CollisionResolver::new(config.overlap_threshold),
            diagnostics: Diagnostics::new(config.trail_length, config.collinear_area),
            current_time: 0.0,
            elapsed: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a ball and return its handle.
    pub fn add(&mut self, ball: Ball) -> BallId {
        self.balls.push(ball);
        BallId(self.balls.len() - 1)
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id.index())
    }

    pub fn ball_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    /// Replace every ball at once (e.g. after an arena resize).
    ///
    /// Old handles become meaningless and trails restart; the collision
    /// counter keeps running.
    pub fn replace_balls(&mut self, balls: Vec<Ball>) {
        debug!("replacing {} balls with {}", self.balls.len(), balls.len());
        self.balls = balls;
        self.diagnostics.clear_trails();
    }

    pub fn clear(&mut self) {
        self.replace_balls(Vec::new());
    }

    /// Add `delta_v` to a ball's velocity. Returns false for an unknown id.
    pub fn apply_impulse(&mut self, id: BallId, delta_v: Vec2) -> bool {
        match self.balls.get_mut(id.index()) {
            Some(ball) => {
                ball.velocity += delta_v;
                true
            }
            None => false,
        }
    }

    /// Position and radius of every ball, in handle order.
    pub fn balls_state(&self) -> Vec<BallSnapshot> {
        self.balls.iter().map(Ball::snapshot).collect()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advance the simulation by `dt` inside `bounds`.
    ///
    /// Collisions are processed in time order. A non-positive or NaN `dt`
    /// moves nothing but still refreshes diagnostics.
    pub fn step(&mut self, dt: f64, bounds: &ArenaBounds) {
        let min_remaining = dt * self.config.min_remaining_fraction;
        let mut remaining = dt;
        let mut substeps = 0usize;

        while remaining > 0.0 {
            self.current_time = 0.0;

            let event = match CollisionDetector::find_next_collision(&self.balls, bounds) {
                Some(event) if event.time() <= remaining => event,
                _ => {
                    Drift::advance_all(&mut self.balls, remaining, bounds);
                    self.elapsed += remaining;
                    remaining = 0.0;
                    break;
                }
            };

            let t = event.time();
            Drift::advance_all(&mut self.balls, t, bounds);
            self.current_time = t;
            self.elapsed += t;

            self.resolve(&event);

            remaining -= t;
            substeps += 1;

            if remaining < min_remaining {
                break;
            }
            if substeps >= self.config.max_substeps {
                warn!(
                    "step hit the {} event cap with {:.3e}s of {:.3e}s left",
                    self.config.max_substeps, remaining, dt
                );
                break;
            }
        }

        if remaining > 0.0 {
            debug!("step stopped early, {:.3e}s unspent after {} events", remaining, substeps);
        }

        // Wall resolution can leave a ball past its wall when no drift follows
        self.settle(bounds);
        self.current_time = 0.0;
        self.diagnostics.update(&self.balls);
    }

    fn resolve(&mut self, event: &CollisionEvent) {
        match self.resolver.resolve(&mut self.balls, event, self.current_time) {
            Resolution::Resolved => {
                self.diagnostics.record_collision();
                trace!("resolved {:?}", event);
            }
            Resolution::Skipped => {
                trace!("skipped separating {:?}", event);
            }
        }
    }

    fn settle(&mut self, bounds: &ArenaBounds) {
        for ball in self.balls.iter_mut() {
            ball.enforce_bounds(bounds);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn engine_with(balls: &[Ball]) -> PhysicsEngine {
        let mut engine = PhysicsEngine::new();
        for ball in balls {
            engine.add(*ball);
        }
        engine
    }

    fn assert_inside(ball: &Ball, bounds: &ArenaBounds) {
        let eps = constants::OVERLAP_THRESHOLD;
        assert!(
            ball.position.x >= ball.radius - eps
                && ball.position.x <= bounds.width - ball.radius + eps,
            "x out of bounds: {:?}",
            ball.position
        );
        assert!(
            ball.position.y >= ball.radius - eps
                && ball.position.y <= bounds.height - ball.radius + eps,
            "y out of bounds: {:?}",
            ball.position
        );
    }

    #[test]
    fn test_add_returns_sequential_ids() {
        let mut engine = PhysicsEngine::new();
        let a = engine.add(Ball::new(Vec2::new(10.0, 10.0), Vec2::ZERO, 1.0, 1.0));
        let b = engine.add(Ball::new(Vec2::new(20.0, 10.0), Vec2::ZERO, 1.0, 1.0));
        assert_eq!((a, b), (BallId(0), BallId(1)));
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.ball(b).unwrap().position, Vec2::new(20.0, 10.0));
    }

    #[test]
    fn test_free_flight_without_collisions() {
        let bounds = ArenaBounds::new(1000.0, 1000.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 20.0), 5.0, 1.0),
        ]);

        engine.step(1.0, &bounds);

        let ball = engine.balls()[0];
        assert_relative_eq!(ball.position.x, 150.0);
        assert_relative_eq!(ball.position.y, 120.0);
        assert_eq!(engine.diagnostics().collisions_count(), 0);
        assert_relative_eq!(engine.elapsed(), 1.0);
    }

    #[test]
    fn test_embedded_ball_clamped_and_reflected() {
        // Starts 5px into the left wall, so no wall event is predicted;
        // the clamp after the drift puts it back.
        let bounds = ArenaBounds::new(200.0, 100.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(5.0, 50.0), Vec2::new(-100.0, 0.0), 10.0, 1.0),
        ]);

        engine.step(0.1, &bounds);

        let ball = engine.balls()[0];
        assert_eq!(ball.position.x, 10.0);
        assert!(ball.velocity.x > 0.0);
        assert_eq!(ball.velocity.x, 100.0);
    }

    #[test]
    fn test_head_on_pair_swaps_velocities() {
        let bounds = ArenaBounds::new(1000.0, 1000.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0), 10.0, 1.0),
            Ball::new(Vec2::new(125.0, 100.0), Vec2::new(-100.0, 0.0), 10.0, 1.0),
        ]);

        engine.step(0.05, &bounds);

        let (a, b) = (engine.balls()[0], engine.balls()[1]);
        assert_relative_eq!(a.velocity.x, -100.0, epsilon = 1e-9);
        assert_relative_eq!(b.velocity.x, 100.0, epsilon = 1e-9);
        // Collide at 0.025, then spend the other 0.025 moving apart
        assert_relative_eq!(a.position.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(b.position.x, 125.0, epsilon = 1e-9);
        assert_eq!(engine.diagnostics().collisions_count(), 1);
    }

    #[test]
    fn test_momentum_conserved_in_step() {
        let bounds = ArenaBounds::new(10_000.0, 10_000.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(5000.0, 5000.0), Vec2::new(40.0, 10.0), 10.0, 3.0),
            Ball::new(Vec2::new(5050.0, 5008.0), Vec2::new(-30.0, 0.0), 15.0, 1.5),
        ]);
        let before: Vec2 = engine.balls().iter().fold(Vec2::ZERO, |acc, b| acc + b.momentum());

        engine.step(1.0, &bounds);

        let after: Vec2 = engine.balls().iter().fold(Vec2::ZERO, |acc, b| acc + b.momentum());
        assert_eq!(engine.diagnostics().collisions_count(), 1);
        assert_abs_diff_eq!(before.x, after.x, epsilon = 1e-9);
        assert_abs_diff_eq!(before.y, after.y, epsilon = 1e-9);
    }

    #[test]
    fn test_wall_hit_at_end_of_budget_stays_inside() {
        let bounds = ArenaBounds::new(200.0, 100.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(50.0, 50.0), Vec2::new(-100.0, 0.0), 10.0, 1.0),
        ]);

        engine.step(0.4, &bounds);

        let ball = engine.balls()[0];
        assert_relative_eq!(ball.position.x, 10.0, epsilon = 1e-9);
        assert!(ball.velocity.x > 0.0);
        assert_eq!(engine.diagnostics().collisions_count(), 1);
    }

    #[test]
    fn test_wall_bounce_reenters_at_wall() {
        // Wall resolution advances by the raw event time after the step has
        // already drifted the ball to the wall; the next drift's clamp snaps
        // it back onto the wall line.
        let bounds = ArenaBounds::new(200.0, 100.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(50.0, 50.0), Vec2::new(-100.0, 0.0), 10.0, 1.0),
        ]);

        engine.step(0.5, &bounds);

        let ball = engine.balls()[0];
        assert_relative_eq!(ball.position.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(ball.velocity.x, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_wall_restitution_applied_by_clamp() {
        let bounds = ArenaBounds::new(200.0, 100.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(50.0, 50.0), Vec2::new(-100.0, 0.0), 10.0, 1.0)
                .with_restitution(0.5),
        ]);

        engine.step(0.5, &bounds);

        assert_relative_eq!(engine.balls()[0].velocity.x, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_tunneling_through_wall() {
        let bounds = ArenaBounds::new(100.0, 100.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(50.0, 50.0), Vec2::new(-1.0e6, 3.0e5), 5.0, 1.0),
        ]);

        for _ in 0..5 {
            engine.step(0.1, &bounds);
            assert_inside(&engine.balls()[0], &bounds);
        }
        assert!(engine.diagnostics().collisions_count() > 0);
    }

    #[test]
    fn test_no_tunneling_through_ball() {
        let bounds = ArenaBounds::new(1000.0, 100.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(400.0, 50.0), Vec2::new(50_000.0, 0.0), 10.0, 1.0),
            Ball::new(Vec2::new(600.0, 50.0), Vec2::new(-50_000.0, 0.0), 10.0, 1.0),
        ]);

        engine.step(0.01, &bounds);

        let (a, b) = (engine.balls()[0], engine.balls()[1]);
        assert!(a.position.x < b.position.x, "balls passed through each other");
        assert!(a.position.distance_to(&b.position) >= 20.0 - constants::OVERLAP_THRESHOLD);
        assert!(a.velocity.x < 0.0 && b.velocity.x > 0.0);
        assert_relative_eq!(a.position.x, 80.0, epsilon = 1e-6);
        assert_relative_eq!(b.position.x, 920.0, epsilon = 1e-6);
    }

    #[test]
    fn test_separating_overlap_untouched() {
        let bounds = ArenaBounds::new(1000.0, 1000.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(500.0, 500.0), Vec2::new(-10.0, 0.0), 10.0, 1.0),
            Ball::new(Vec2::new(515.0, 500.0), Vec2::new(10.0, 0.0), 10.0, 1.0),
        ]);

        engine.step(0.1, &bounds);

        assert_eq!(engine.balls()[0].velocity, Vec2::new(-10.0, 0.0));
        assert_eq!(engine.balls()[1].velocity, Vec2::new(10.0, 0.0));
        assert_relative_eq!(engine.balls()[0].position.x, 499.0);
        assert_relative_eq!(engine.balls()[1].position.x, 516.0);
        assert_eq!(engine.diagnostics().collisions_count(), 0);
    }

    #[test]
    fn test_corner_tie_is_deterministic() {
        let bounds = ArenaBounds::new(200.0, 100.0);
        let start = Ball::new(Vec2::new(140.0, 40.0), Vec2::new(100.0, 100.0), 10.0, 1.0);

        let run = || {
            let mut engine = engine_with(&[start]);
            engine.step(1.0, &bounds);
            (engine.balls()[0], engine.diagnostics().collisions_count())
        };

        let (first, count) = run();
        for _ in 0..5 {
            let (again, again_count) = run();
            assert_eq!(again, first);
            assert_eq!(again_count, count);
        }
        // X wall resolved by event, Y wall by the clamp
        assert_eq!(count, 1);
        assert!(first.velocity.x < 0.0 && first.velocity.y < 0.0);
        assert_inside(&first, &bounds);
    }

    #[test]
    fn test_non_positive_dt_only_refreshes_diagnostics() {
        let bounds = ArenaBounds::new(100.0, 100.0);
        let original = [
            Ball::new(Vec2::new(20.0, 20.0), Vec2::new(5.0, 0.0), 5.0, 1.0),
            Ball::new(Vec2::new(50.0, 20.0), Vec2::new(0.0, 5.0), 5.0, 1.0),
        ];
        let mut engine = engine_with(&original);

        engine.step(0.0, &bounds);
        engine.step(-1.0, &bounds);
        engine.step(f64::NAN, &bounds);

        assert_eq!(engine.balls(), &original);
        assert_relative_eq!(engine.diagnostics().min_distance(), 30.0);
        // Repeated identical points are collinear, so the middle one is pruned
        assert_eq!(engine.diagnostics().trail(BallId(0)).unwrap().len(), 2);
    }

    #[test]
    fn test_early_exit_guard_leaves_budget_unspent() {
        // Wall contact at 0.9995 leaves 0.0005 of a 1.0 budget, under the 0.001 fraction
        let bounds = ArenaBounds::new(200.0, 100.0);
        let mut engine = engine_with(&[Ball::new(
            Vec2::new(109.95, 50.0),
            Vec2::new(-100.0, 0.0),
            10.0,
            1.0,
        )]);

        engine.step(1.0, &bounds);

        let ball = engine.balls()[0];
        assert_relative_eq!(engine.elapsed(), 0.9995, epsilon = 1e-12);
        assert_eq!(ball.position.x, 10.0);
        assert_relative_eq!(ball.velocity.x, 100.0, epsilon = 1e-9);
        assert_eq!(engine.diagnostics().collisions_count(), 1);
    }

    #[test]
    fn test_substep_cap_stops_zero_time_loop() {
        // Two balls wedged between the walls keep producing zero-time events
        let bounds = ArenaBounds::new(40.0, 40.0);
        let config = EngineConfig {
            max_substeps: 1_000,
            ..EngineConfig::default()
        };
        let mut engine = PhysicsEngine::with_config(config);
        engine.add(Ball::new(Vec2::new(10.0, 20.0), Vec2::new(5.0, 0.0), 10.0, 1.0));
        engine.add(Ball::new(Vec2::new(30.0, 20.0), Vec2::new(-5.0, 0.0), 10.0, 1.0));

        engine.step(0.1, &bounds);

        assert_eq!(engine.diagnostics().collisions_count(), 1_000);
        assert_eq!(engine.elapsed(), 0.0);
        for ball in engine.balls() {
            assert_inside(ball, &bounds);
        }
    }

    #[test]
    fn test_replace_balls_resets_trails() {
        let bounds = ArenaBounds::new(100.0, 100.0);
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(20.0, 20.0), Vec2::new(5.0, 1.0), 5.0, 1.0),
        ]);
        engine.step(0.1, &bounds);
        assert!(engine.diagnostics().trail(BallId(0)).is_some());

        engine.replace_balls(vec![Ball::new(Vec2::new(70.0, 70.0), Vec2::ZERO, 5.0, 1.0)]);
        assert!(engine.diagnostics().trail(BallId(0)).is_none());

        engine.step(0.1, &bounds);
        let trail = engine.diagnostics().trail(BallId(0)).unwrap().to_vec();
        assert_eq!(trail, vec![Vec2::new(70.0, 70.0)]);
    }

    #[test]
    fn test_apply_impulse() {
        let mut engine = engine_with(&[
            Ball::new(Vec2::new(20.0, 20.0), Vec2::new(1.0, 1.0), 5.0, 1.0),
        ]);
        assert!(engine.apply_impulse(BallId(0), Vec2::new(2.0, -3.0)));
        assert_eq!(engine.balls()[0].velocity, Vec2::new(3.0, -2.0));
        assert!(!engine.apply_impulse(BallId(7), Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_balls_state_snapshot() {
        let engine = engine_with(&[
            Ball::new(Vec2::new(1.0, 2.0), Vec2::ZERO, 3.0, 1.0),
            Ball::new(Vec2::new(4.0, 5.0), Vec2::ZERO, 6.0, 1.0),
        ]);
        let state = engine.balls_state();
        assert_eq!(
            state,
            vec![
                BallSnapshot { x: 1.0, y: 2.0, radius: 3.0 },
                BallSnapshot { x: 4.0, y: 5.0, radius: 6.0 },
            ]
        );
    }

    #[test]
    fn test_engine_config_yaml_defaults() {
        let config: EngineConfig = serde_yaml::from_str("trail_length: 8").unwrap();
        assert_eq!(config.trail_length, 8);
        assert_eq!(config.overlap_threshold, constants::OVERLAP_THRESHOLD);
        assert_eq!(config.max_substeps, constants::MAX_SUBSTEPS);
    }

    #[test]
    fn test_many_balls_stay_in_arena() {
        let bounds = ArenaBounds::new(400.0, 300.0);
        let mut engine = PhysicsEngine::new();
        for i in 0..6 {
            for j in 0..4 {
                let angle = (i * 4 + j) as f64 * 0.7;
                engine.add(Ball::new(
                    Vec2::new(40.0 + 60.0 * i as f64, 40.0 + 70.0 * j as f64),
                    Vec2::from_angle(angle, 800.0),
                    12.0,
                    1.0 + j as f64,
                ));
            }
        }

        for _ in 0..60 {
            engine.step(1.0 / 60.0, &bounds);
            for ball in engine.balls() {
                assert_inside(ball, &bounds);
            }
        }
        assert!(engine.diagnostics().collisions_count() > 0);
    }
}
