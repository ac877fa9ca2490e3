//! Per-step observations that are not part of the physics.
//!
//! Refreshed once at the end of every engine step:
//! - minimum center-to-center distance over all pairs
//! - running count of resolved collisions
//! - a short trail of recent positions per ball, with collinear middle
//!   points dropped so straight runs collapse to their endpoints

use std::collections::VecDeque;

use serde::Serialize;

use crate::types::{constants, Ball, BallId, Vec2};

/// Recent positions of one ball, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trail {
    points: VecDeque<Vec2>,
}

impl Trail {
    pub fn points(&self) -> impl Iterator<Item = &Vec2> + '_ {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Vec2> {
        self.points.iter().copied().collect()
    }

    /// Append a point, prune a collinear middle point, cap the length.
    fn record(&mut self, point: Vec2, max_len: usize, collinear_area: f64) {
        self.points.push_back(point);

        let n = self.points.len();
        if n >= 3 {
            let p1 = self.points[n - 3];
            let p2 = self.points[n - 2];
            let p3 = self.points[n - 1];
            if triangle_area2(p1, p2, p3) < collinear_area {
                self.points.remove(n - 2);
            }
        }

        if self.points.len() > max_len {
            self.points.pop_front();
        }
    }
}

/// Twice the unsigned area of the triangle `p1 p2 p3`.
fn triangle_area2(p1: Vec2, p2: Vec2, p3: Vec2) -> f64 {
    ((p2.x - p1.x) * (p3.y - p1.y) - (p3.x - p1.x) * (p2.y - p1.y)).abs()
}

/// Diagnostics collected by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    min_distance: f64,
    collisions_count: u64,
    trails: Vec<Trail>,
    trail_length: usize,
    collinear_area: f64,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(constants::TRAIL_LENGTH, constants::COLLINEAR_AREA)
    }
}

impl Diagnostics {
    pub fn new(trail_length: usize, collinear_area: f64) -> Self {
        Self {
            min_distance: f64::INFINITY,
            collisions_count: 0,
            trails: Vec::new(),
            trail_length,
            collinear_area,
        }
    }

    /// Smallest center distance between any two balls after the last step;
    /// infinite with fewer than two balls
    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    /// Collisions resolved since the engine was created
    pub fn collisions_count(&self) -> u64 {
        self.collisions_count
    }

    /// Trail for a ball, if it has been observed at least once
    pub fn trail(&self, id: BallId) -> Option<&Trail> {
        self.trails.get(id.index())
    }

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    pub(crate) fn record_collision(&mut self) {
        self.collisions_count += 1;
    }

    /// Drop all trails; used when the ball set is replaced
    pub(crate) fn clear_trails(&mut self) {
        self.trails.clear();
    }

    /// Refresh distances and trails from the current ball state.
    pub(crate) fn update(&mut self, balls: &[Ball]) {
        if self.trails.len() < balls.len() {
            self.trails.resize_with(balls.len(), Trail::default);
        }

        self.min_distance = f64::INFINITY;
        for (i, ball) in balls.iter().enumerate() {
            self.trails[i].record(ball.position, self.trail_length, self.collinear_area);

            for other in &balls[i + 1..] {
                let distance = ball.position.distance_to(&other.position);
                self.min_distance = self.min_distance.min(distance);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
