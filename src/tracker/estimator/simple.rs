//! Measurement-driven estimator without a noise model.
//!
//! The corrected position is the measurement itself; velocity is the last
//! displacement divided by the elapsed time.

use nalgebra::Vector2;

use crate::error::EstimatorError;
use crate::tracker::estimator::{Estimator, EstimatorParams};
use crate::tracker::geometry::Point;

#[derive(Debug, Clone)]
pub struct SimpleEstimator {
    initialized: bool,
    velocity: Vector2<f64>,
    /// Clamped duration of the frame being predicted
    step_dt: f64,
    measured: Point,
    predicted: Point,
    corrected: Point,
}

impl Default for SimpleEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleEstimator {
    pub fn new() -> Self {
        let origin = Point::origin();
        Self {
            initialized: false,
            velocity: Vector2::zeros(),
            step_dt: 0.0,
            measured: origin,
            predicted: origin,
            corrected: origin,
        }
    }
}

impl Estimator for SimpleEstimator {
    fn prepare(&mut self, measurement: Point) {
        self.initialized = false;
        self.velocity = Vector2::zeros();
        self.measured = measurement;
        self.predicted = measurement;
        self.corrected = measurement;
    }

    fn initialize(
        &mut self,
        measurement: Point,
        dt_ms: i64,
        params: &EstimatorParams,
    ) -> Result<(), EstimatorError> {
        let dt = params.effective_dt(dt_ms)?;
        self.velocity = (measurement - self.corrected) / dt;
        self.measured = measurement;
        self.predicted = measurement;
        self.corrected = measurement;
        self.initialized = true;
        Ok(())
    }

    fn predict(&mut self, dt_ms: i64, params: &EstimatorParams) -> Result<(), EstimatorError> {
        if !self.initialized {
            return Err(EstimatorError::NotInitialized);
        }
        // Gap rejection is the pool's job here; only clamp.
        self.step_dt = dt_ms.max(params.dt_min_ms) as f64;
        self.predicted = self.corrected + self.velocity * self.step_dt;
        Ok(())
    }

    fn correct(
        &mut self,
        measurement: Point,
        _params: &EstimatorParams,
    ) -> Result<(), EstimatorError> {
        if !self.initialized {
            return Err(EstimatorError::NotInitialized);
        }
        if self.step_dt > 0.0 {
            self.velocity = (measurement - self.corrected) / self.step_dt;
        }
        self.measured = measurement;
        self.corrected = measurement;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn measured(&self) -> Point {
        self.measured
    }

    fn predicted(&self) -> Point {
        self.predicted
    }

    fn corrected(&self) -> Point {
        self.corrected
    }

    fn velocity(&self) -> Vector2<f64> {
        self.velocity
    }
}
