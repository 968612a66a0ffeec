//! Position estimators behind a common strategy trait.
//!
//! The pool drives every estimator through the same three-phase lifecycle:
//! `prepare` (first measurement), `initialize` (second measurement, derives
//! the motion model) and then `predict`/`correct` once per frame.

mod kalman;
mod simple;

use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;
use crate::tracker::geometry::Point;

pub use kalman::KalmanEstimator;
pub use simple::SimpleEstimator;

/// Tunables read by the estimators on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorParams {
    /// Process noise scale (Q = q * I)
    pub process_noise: f64,
    /// Measurement noise scale (R = r * I)
    pub measurement_noise: f64,
    /// Nominal cycle duration in milliseconds
    pub dt_min_ms: i64,
    /// Largest accepted gap between two updates in milliseconds
    pub dt_max_ms: i64,
}

impl EstimatorParams {
    /// Reject gaps above `dt_max_ms`, otherwise clamp to `dt_min_ms`.
    pub fn effective_dt(&self, dt_ms: i64) -> Result<f64, EstimatorError> {
        if dt_ms > self.dt_max_ms {
            return Err(EstimatorError::TemporalGap {
                dt_ms,
                max_ms: self.dt_max_ms,
            });
        }
        Ok(dt_ms.max(self.dt_min_ms) as f64)
    }
}

/// Filtering strategy owned by a single tracker.
pub trait Estimator: Send + fmt::Debug {
    /// Remember the first measurement. No filter math.
    fn prepare(&mut self, measurement: Point);

    /// Build the motion model from the second measurement, `dt_ms` after the first.
    fn initialize(
        &mut self,
        measurement: Point,
        dt_ms: i64,
        params: &EstimatorParams,
    ) -> Result<(), EstimatorError>;

    /// Propagate the state one frame ahead; `dt_ms` is the time since the last update.
    fn predict(&mut self, dt_ms: i64, params: &EstimatorParams) -> Result<(), EstimatorError>;

    /// Fold a measurement into the predicted state.
    ///
    /// On error the predicted state is kept as the corrected one.
    fn correct(&mut self, measurement: Point, params: &EstimatorParams)
    -> Result<(), EstimatorError>;

    /// Forget everything; the next call must be `prepare`.
    fn reset(&mut self);

    fn is_initialized(&self) -> bool;

    fn measured(&self) -> Point;

    fn predicted(&self) -> Point;

    fn corrected(&self) -> Point;

    /// Velocity estimate in pixels per millisecond.
    fn velocity(&self) -> Vector2<f64>;
}

/// Which estimator the pool instantiates for its slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EstimatorKind {
    #[default]
    Kalman,
    Simple,
}

impl EstimatorKind {
    pub fn create(self) -> Box<dyn Estimator> {
        match self {
            EstimatorKind::Kalman => Box::new(KalmanEstimator::new()),
            EstimatorKind::Simple => Box::new(SimpleEstimator::new()),
        }
    }
}
