//! Real-time multi-target 2-D region tracker.
//!
//! A fixed pool of trackers follows blob-like regions from frame to frame.
//! Each tracker owns a position estimator (Kalman by default), three bounded
//! trajectories (measured, predicted, corrected) and a confidence score
//! derived from how long and how far it has been tracked.
//!
//! ```
//! use regiontrack_rs::{Region, TrackerConfig, TrackerPool};
//!
//! let mut pool = TrackerPool::new(TrackerConfig::default()).unwrap();
//! for t in [0, 40, 80] {
//!     let report = pool.update(&[Region::new(100.0, 100.0, 1.0)], t);
//!     assert_eq!(report.tracks.len(), 1);
//! }
//! ```

pub mod error;
pub mod integration;
pub mod matrix;
pub mod tracker;

pub use error::{ConfigError, EstimatorError, MatrixError};
pub use integration::{Frame, RegionBuilder, RegionSource, TrackerPipeline};
pub use matrix::Matrix;
pub use tracker::{
    Estimator, EstimatorKind, FrameReport, KalmanEstimator, Point, Region, RetireReason,
    SimpleEstimator, TrackStatus, Tracker, TrackerConfig, TrackerPool, TrackerSnapshot,
    Trajectory,
};
