//! Kalman filter for 2-D region centroids.
//!
//! State `[x, y, vx, vy, ax, ay]` under a constant-acceleration model,
//! measurement `[x, y]`. Time is in milliseconds, so velocities are in
//! pixels per millisecond.
//!
//! Process noise follows the discrete white-noise acceleration model:
//! `process_noise` is the variance of the acceleration per cycle, in
//! pixels per cycle squared, and enters each axis as `q * g * g^T` with
//! `g = [1/2, 1/dt, 1/dt^2]`. The initial covariance is scaled the same way,
//! so `measurement_noise` reads as pixels squared at every state order.

use nalgebra::Vector2;

use crate::error::EstimatorError;
use crate::matrix::Matrix;
use crate::tracker::estimator::{Estimator, EstimatorParams};
use crate::tracker::geometry::Point;

const STATE_DIM: usize = 6;
const MEAS_DIM: usize = 2;

#[derive(Debug, Clone)]
struct Model {
    motion_mat: Matrix,
    motion_mat_t: Matrix,
    update_mat: Matrix,
    update_mat_t: Matrix,
    process_cov: Matrix,
    measurement_cov: Matrix,
}

impl Model {
    fn new(dt: f64, params: &EstimatorParams) -> Self {
        let mut motion_mat = Matrix::identity(STATE_DIM);
        for i in 0..2 {
            motion_mat[(i, i + 2)] = dt;
            motion_mat[(i, i + 4)] = dt * dt / 2.0;
            motion_mat[(i + 2, i + 4)] = dt;
        }

        let mut update_mat = Matrix::zeros(MEAS_DIM, STATE_DIM);
        for i in 0..MEAS_DIM {
            update_mat[(i, i)] = 1.0;
        }

        // Axis i owns states i, i + 2, i + 4.
        let gain = [0.5, 1.0 / dt, 1.0 / (dt * dt)];
        let mut process_cov = Matrix::zeros(STATE_DIM, STATE_DIM);
        for axis in 0..2 {
            for (a, ga) in gain.iter().enumerate() {
                for (b, gb) in gain.iter().enumerate() {
                    process_cov[(axis + 2 * a, axis + 2 * b)] = params.process_noise * ga * gb;
                }
            }
        }

        Self {
            motion_mat_t: motion_mat.transpose(),
            motion_mat,
            update_mat_t: update_mat.transpose(),
            update_mat,
            process_cov,
            measurement_cov: Matrix::identity(MEAS_DIM).scale(params.measurement_noise),
        }
    }

    /// `P0 = r * diag(1, 1, 1/dt^2, 1/dt^2, 1/dt^4, 1/dt^4)`
    fn initial_cov(dt: f64, measurement_noise: f64) -> Matrix {
        let mut cov = Matrix::zeros(STATE_DIM, STATE_DIM);
        for i in 0..STATE_DIM {
            cov[(i, i)] = measurement_noise / dt.powi(2 * (i / 2) as i32);
        }
        cov
    }
}

/// Per-tracker Kalman estimator.
#[derive(Debug, Clone)]
pub struct KalmanEstimator {
    /// State mean (6x1)
    mean: Matrix,
    /// State covariance (6x6)
    covariance: Matrix,
    /// Built on the init step, `None` before
    model: Option<Model>,
    previous: Point,
    measured: Point,
    predicted: Point,
    corrected: Point,
}

impl Default for KalmanEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanEstimator {
    pub fn new() -> Self {
        let origin = Point::origin();
        Self {
            mean: Matrix::zeros(STATE_DIM, 1),
            covariance: Matrix::zeros(STATE_DIM, STATE_DIM),
            model: None,
            previous: origin,
            measured: origin,
            predicted: origin,
            corrected: origin,
        }
    }

    pub fn mean(&self) -> &Matrix {
        &self.mean
    }

    pub fn covariance(&self) -> &Matrix {
        &self.covariance
    }

    fn position(&self) -> Point {
        Point::new(self.mean[(0, 0)], self.mean[(1, 0)])
    }

    fn update(&mut self, measurement: Point) -> Result<(), EstimatorError> {
        let model = self.model.as_ref().ok_or(EstimatorError::NotInitialized)?;
        let h = &model.update_mat;
        let h_t = &model.update_mat_t;

        // S = H * P * H^T + R
        let pht = self.covariance.mul(h_t)?;
        let s = h.mul(&pht)?.add(&model.measurement_cov)?;
        let s_inv = s.invert()?;

        // K = P * H^T * S^-1
        let gain = pht.mul(&s_inv)?;

        let z = Matrix::column(&[measurement.x, measurement.y]);
        let innovation = z.sub(&h.mul(&self.mean)?)?;
        let mean = self.mean.add(&gain.mul(&innovation)?)?;

        // P = (I - K * H) * P
        let i_kh = Matrix::identity(STATE_DIM).sub(&gain.mul(h)?)?;
        let covariance = i_kh.mul(&self.covariance)?;

        self.mean = mean;
        self.covariance = covariance;
        Ok(())
    }
}

impl Estimator for KalmanEstimator {
    fn prepare(&mut self, measurement: Point) {
        self.model = None;
        self.previous = measurement;
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
        let velocity = (measurement - self.previous) / dt;

        self.mean = Matrix::column(&[
            measurement.x,
            measurement.y,
            velocity.x,
            velocity.y,
            0.0,
            0.0,
        ]);
        self.covariance = Model::initial_cov(dt, params.measurement_noise);
        self.model = Some(Model::new(dt, params));
        self.measured = measurement;
        self.predicted = measurement;

        let result = self.update(measurement);
        self.corrected = self.position();
        self.previous = self.corrected;
        result
    }

    fn predict(&mut self, _dt_ms: i64, _params: &EstimatorParams) -> Result<(), EstimatorError> {
        let model = self.model.as_ref().ok_or(EstimatorError::NotInitialized)?;

        // x = A * x, P = A * P * A^T + Q
        let mean = model.motion_mat.mul(&self.mean)?;
        let covariance = model
            .motion_mat
            .mul(&self.covariance)?
            .mul(&model.motion_mat_t)?
            .add(&model.process_cov)?;

        self.mean = mean;
        self.covariance = covariance;
        self.predicted = self.position();
        Ok(())
    }

    fn correct(
        &mut self,
        measurement: Point,
        _params: &EstimatorParams,
    ) -> Result<(), EstimatorError> {
        self.measured = measurement;
        let result = self.update(measurement);
        self.corrected = self.position();
        self.previous = self.corrected;
        result
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn is_initialized(&self) -> bool {
        self.model.is_some()
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
        Vector2::new(self.mean[(2, 0)], self.mean[(3, 0)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatrixError;
    use approx::assert_relative_eq;

    fn params() -> EstimatorParams {
        EstimatorParams {
            process_noise: 0.1,
            measurement_noise: 4.0,
            dt_min_ms: 40,
            dt_max_ms: 500,
        }
    }

    fn initialized_at(p0: Point, p1: Point) -> KalmanEstimator {
        let mut kf = KalmanEstimator::new();
        kf.prepare(p0);
        kf.initialize(p1, 40, &params()).unwrap();
        kf
    }

    #[test]
    fn test_prepare_has_no_model() {
        let mut kf = KalmanEstimator::new();
        kf.prepare(Point::new(10.0, 20.0));
        assert!(!kf.is_initialized());
        assert_eq!(kf.corrected(), Point::new(10.0, 20.0));
        assert_eq!(
            kf.predict(40, &params()).unwrap_err(),
            EstimatorError::NotInitialized
        );
    }

    #[test]
    fn test_initialize_derives_velocity() {
        let kf = initialized_at(Point::new(100.0, 100.0), Point::new(104.0, 98.0));
        assert_relative_eq!(kf.velocity().x, 0.1);
        assert_relative_eq!(kf.velocity().y, -0.05);
        assert_eq!(kf.corrected(), Point::new(104.0, 98.0));
    }

    #[test]
    fn test_initialize_clamps_dt() {
        let mut kf = KalmanEstimator::new();
        kf.prepare(Point::new(0.0, 0.0));
        kf.initialize(Point::new(4.0, 0.0), 5, &params()).unwrap();
        // 5 ms is clamped up to the 40 ms nominal cycle.
        assert_relative_eq!(kf.velocity().x, 0.1);
    }

    #[test]
    fn test_initialize_rejects_gap() {
        let mut kf = KalmanEstimator::new();
        kf.prepare(Point::new(0.0, 0.0));
        let err = kf.initialize(Point::new(4.0, 0.0), 900, &params()).unwrap_err();
        assert!(matches!(err, EstimatorError::TemporalGap { dt_ms: 900, .. }));
        assert!(!kf.is_initialized());
    }

    #[test]
    fn test_predict_moves_with_velocity() {
        let mut kf = initialized_at(Point::new(100.0, 100.0), Point::new(104.0, 100.0));
        kf.predict(40, &params()).unwrap();
        assert_relative_eq!(kf.predicted().x, 108.0, epsilon = 1e-9);
        assert_relative_eq!(kf.predicted().y, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_correct_pulls_towards_measurement() {
        let mut kf = initialized_at(Point::new(100.0, 100.0), Point::new(100.0, 100.0));
        kf.predict(40, &params()).unwrap();
        kf.correct(Point::new(110.0, 100.0), &params()).unwrap();
        let x = kf.corrected().x;
        assert!(x > 100.0 && x <= 110.0);
        assert_eq!(kf.measured(), Point::new(110.0, 100.0));
    }

    #[test]
    fn test_correct_with_predicted_position_keeps_state() {
        let p = params();
        let mut kf = initialized_at(Point::new(50.0, 60.0), Point::new(52.0, 61.0));
        for i in 0..30 {
            kf.predict(40, &p).unwrap();
            let z = Point::new(52.0 + 2.0 * (i + 1) as f64, 61.0 + (i + 1) as f64);
            kf.correct(z, &p).unwrap();
        }

        let trace_before = kf.covariance().trace();
        kf.predict(40, &p).unwrap();
        let predicted_mean = kf.mean().clone();
        let predicted = kf.predicted();
        kf.correct(predicted, &p).unwrap();

        assert!(kf.mean().approx_eq(&predicted_mean, 1e-9));
        let injected = kf.model.as_ref().unwrap().process_cov.trace();
        assert!(kf.covariance().trace() <= trace_before + injected + 1e-9);
    }

    #[test]
    fn test_singular_innovation_keeps_prediction() {
        // Zero measurement noise with a zero covariance makes S singular.
        let p = EstimatorParams {
            process_noise: 0.0,
            measurement_noise: 0.0,
            ..params()
        };
        let mut kf = KalmanEstimator::new();
        kf.prepare(Point::new(0.0, 0.0));
        let err = kf.initialize(Point::new(4.0, 0.0), 40, &p).unwrap_err();
        assert_eq!(err, EstimatorError::Matrix(MatrixError::Singular));
        assert!(kf.is_initialized());

        kf.predict(40, &p).unwrap();
        let predicted = kf.predicted();
        assert!(kf.correct(Point::new(50.0, 50.0), &p).is_err());
        assert_eq!(kf.corrected(), predicted);
    }
}
