mod estimator;
mod geometry;
mod judgement;
mod matching;
mod pool;
mod region;
mod slot;
mod track_state;
mod trajectory;

pub use estimator::{Estimator, EstimatorKind, EstimatorParams, KalmanEstimator, SimpleEstimator};
pub use geometry::{Point, centroid, distance, partition_centroids, split_centroids};
pub use judgement::{JUDGEMENT_CEILING, Judge, QUALITY_WINDOW, judgement};
pub use matching::{AssignmentResult, TrackerProbe, associate, find_merges, nearest_region};
pub use pool::{FrameReport, TrackerConfig, TrackerPool};
pub use region::Region;
pub use slot::{Tracker, TrackerSnapshot, WorkData};
pub use track_state::{RetireReason, TrackStatus};
pub use trajectory::{MAX_TRAJECTORY_POINTS, Trajectories, Trajectory};
