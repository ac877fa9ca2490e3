//! Python bindings for the bb-core ball arena engine.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from ballbox import Simulation
//!
//! sim = Simulation.random(1280, 720, seed=7)
//!
//! for _ in range(600):
//!     sim.step(0.01 / 60)
//!     print(f"min distance {sim.min_distance:.2f}, collisions {sim.collisions_count}")
//! ```

use log::debug;
use pyo3::exceptions::{PyIndexError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use bb_core::config::{ConfigError, ScenarioLoader};
use bb_core::engine::PhysicsEngine;
use bb_core::scenario::{random_impulse, RandomFill};
use bb_core::types::{ArenaBounds, Ball, BallId, Vec2 as CoreVec2};

fn config_error(err: ConfigError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// 2D vector for positions and velocities.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec2 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
}

#[pymethods]
impl Vec2 {
    #[new]
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn __repr__(&self) -> String {
        format!("Vec2({:.4}, {:.4})", self.x, self.y)
    }

    fn magnitude(&self) -> f64 {
        CoreVec2::from(*self).length()
    }

    fn to_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl From<CoreVec2> for Vec2 {
    fn from(v: CoreVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Vec2> for CoreVec2 {
    fn from(v: Vec2) -> Self {
        CoreVec2::new(v.x, v.y)
    }
}

/// Ball arena simulation.
///
/// Owns the engine, the arena size and a seeded generator used for
/// re-seeding on resize and for random impulses.
#[pyclass]
pub struct Simulation {
    engine: PhysicsEngine,
    bounds: ArenaBounds,
    fill: RandomFill,
    rng: ChaChaRng,
}

impl Simulation {
    fn ball_at(&self, index: usize) -> PyResult<&Ball> {
        self.engine
            .ball(BallId(index))
            .ok_or_else(|| PyIndexError::new_err(format!("no ball {}", index)))
    }
}

#[pymethods]
impl Simulation {
    /// Create an empty arena.
    #[new]
    #[pyo3(signature = (width, height, seed=0))]
    fn new(width: f64, height: f64, seed: u64) -> Self {
        Self {
            engine: PhysicsEngine::new(),
            bounds: ArenaBounds::new(width, height),
            fill: RandomFill::with_seed(seed),
            rng: ChaChaRng::seed_from_u64(seed),
        }
    }

    /// Create an arena filled with the default random population.
    #[staticmethod]
    #[pyo3(signature = (width, height, seed=0))]
    fn random(width: f64, height: f64, seed: u64) -> PyResult<Self> {
        let mut sim = Self::new(width, height, seed);
        sim.fill.validate(&sim.bounds).map_err(config_error)?;
        let balls = sim.fill.generate_with(&mut sim.rng, &sim.bounds);
        sim.engine.replace_balls(balls);
        Ok(sim)
    }

    /// Load a scenario YAML file.
    #[staticmethod]
    fn from_scenario(path: &str) -> PyResult<Self> {
        let scenario = ScenarioLoader::load_path(path).map_err(config_error)?;
        let engine = scenario.build_engine().map_err(config_error)?;
        let fill = scenario.random.clone().unwrap_or_default();
        let rng = ChaChaRng::seed_from_u64(fill.seed);
        Ok(Self {
            engine,
            bounds: scenario.arena,
            fill,
            rng,
        })
    }

    /// Simulated time in seconds.
    #[getter]
    fn time(&self) -> f64 {
        self.engine.elapsed()
    }

    #[getter]
    fn width(&self) -> f64 {
        self.bounds.width
    }

    #[getter]
    fn height(&self) -> f64 {
        self.bounds.height
    }

    fn __len__(&self) -> usize {
        self.engine.len()
    }

    /// Add a ball. Returns its index.
    #[pyo3(signature = (x, y, vx, vy, radius, mass, restitution=1.0))]
    fn add_ball(
        &mut self,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        radius: f64,
        mass: f64,
        restitution: f64,
    ) -> PyResult<usize> {
        if !(radius > 0.0 && mass > 0.0) {
            return Err(PyValueError::new_err("radius and mass must be positive"));
        }
        let ball = Ball::new(CoreVec2::new(x, y), CoreVec2::new(vx, vy), radius, mass)
            .with_restitution(restitution);
        Ok(self.engine.add(ball).index())
    }

    fn ball_position(&self, index: usize) -> PyResult<Vec2> {
        Ok(self.ball_at(index)?.position.into())
    }

    fn ball_velocity(&self, index: usize) -> PyResult<Vec2> {
        Ok(self.ball_at(index)?.velocity.into())
    }

    /// Advance the simulation by dt seconds of simulated time.
    fn step(&mut self, dt: f64) {
        self.engine.step(dt, &self.bounds);
    }

    /// Run multiple steps at once (more efficient).
    fn step_n(&mut self, dt: f64, steps: usize) {
        for _ in 0..steps {
            self.engine.step(dt, &self.bounds);
        }
    }

    /// Change the arena size and replace every ball with a fresh random population.
    fn resize(&mut self, width: f64, height: f64) -> PyResult<()> {
        let bounds = ArenaBounds::new(width, height);
        self.fill.validate(&bounds).map_err(config_error)?;
        debug!("resizing arena to {}x{}", width, height);
        self.bounds = bounds;
        let balls = self.fill.generate_with(&mut self.rng, &self.bounds);
        self.engine.replace_balls(balls);
        Ok(())
    }

    /// List of (x, y, radius) tuples, one per ball.
    fn balls_state(&self) -> Vec<(f64, f64, f64)> {
        self.engine
            .balls_state()
            .into_iter()
            .map(|s| (s.x, s.y, s.radius))
            .collect()
    }

    /// Smallest center-to-center distance after the last step.
    #[getter]
    fn min_distance(&self) -> f64 {
        self.engine.diagnostics().min_distance()
    }

    #[getter]
    fn collisions_count(&self) -> u64 {
        self.engine.diagnostics().collisions_count()
    }

    /// Recent positions of one ball, oldest first.
    fn trail(&self, index: usize) -> Vec<(f64, f64)> {
        self.engine
            .diagnostics()
            .trail(BallId(index))
            .map(|trail| trail.points().map(|p| (p.x, p.y)).collect())
            .unwrap_or_default()
    }

    /// Kick a random ball in a random direction.
    ///
    /// Returns the index of the kicked ball, or None for an empty arena.
    fn apply_random_impulse(&mut self) -> Option<usize> {
        if self.engine.is_empty() {
            return None;
        }
        let id = BallId(self.rng.gen_range(0..self.engine.len()));
        let impulse = random_impulse(&mut self.rng);
        self.engine.apply_impulse(id, impulse);
        Some(id.index())
    }

    /// Get current state as dict for easy inspection.
    fn state_dict(&self) -> PyResult<PyObject> {
        Python::with_gil(|py| {
            let dict = PyDict::new_bound(py);
            let diagnostics = self.engine.diagnostics();
            dict.set_item("time", self.engine.elapsed())?;
            dict.set_item("width", self.bounds.width)?;
            dict.set_item("height", self.bounds.height)?;
            dict.set_item("balls", self.engine.len())?;
            dict.set_item("min_distance", diagnostics.min_distance())?;
            dict.set_item("collisions_count", diagnostics.collisions_count())?;
            let kinetic_energy: f64 = self.engine.balls().iter().map(Ball::kinetic_energy).sum();
            dict.set_item("kinetic_energy", kinetic_energy)?;
            Ok(dict.into_any().unbind())
        })
    }
}

/// Python module definition.
#[pymodule]
fn ballbox(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec2>()?;
    m.add_class::<Simulation>()?;
    Ok(())
}
