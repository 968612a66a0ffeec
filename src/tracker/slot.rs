//! One tracker slot of the pool.

use serde::Serialize;

use crate::tracker::estimator::{Estimator, EstimatorKind};
use crate::tracker::geometry::Point;
use crate::tracker::judgement::Judge;
use crate::tracker::track_state::TrackStatus;
use crate::tracker::trajectory::Trajectories;

/// Per-frame working data of a slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkData {
    /// Region index matched in the current frame
    pub region: Option<usize>,
    /// Timestamp of the last estimator update
    pub last_update: i64,
    /// Fractional cycles carried to the next update
    pub cycle_remainder: f64,
    /// Sub-centroid used while this slot shares a merged region
    pub virtual_centroid: Option<Point>,
}

impl WorkData {
    /// Convert `dt_ms` into whole cycles, carrying the rounding error.
    pub fn advance_cycles(&mut self, dt_ms: i64, dt_min_ms: i64) -> u32 {
        let exact = dt_ms.max(0) as f64 / dt_min_ms.max(1) as f64 + self.cycle_remainder;
        let cycles = exact.round().max(0.0);
        self.cycle_remainder = exact - cycles;
        cycles as u32
    }
}

/// A persistent slot tracking a single target across frames.
///
/// The slot index doubles as the tracker id and never changes.
#[derive(Debug)]
pub struct Tracker {
    id: usize,
    pub(crate) status: TrackStatus,
    kind: EstimatorKind,
    pub(crate) estimator: Box<dyn Estimator>,
    pub(crate) trajectories: Trajectories,
    pub(crate) work: WorkData,
    pub(crate) judge: Judge,
}

impl Tracker {
    pub fn new(id: usize, kind: EstimatorKind) -> Self {
        Self {
            id,
            status: TrackStatus::Prepare,
            kind,
            estimator: kind.create(),
            trajectories: Trajectories::new(),
            work: WorkData::default(),
            judge: Judge::default(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    /// Whether the slot is following a region.
    pub fn is_active(&self) -> bool {
        self.work.region.is_some()
    }

    /// Currently matched region index.
    pub fn region(&self) -> Option<usize> {
        self.work.region
    }

    pub fn estimator(&self) -> &dyn Estimator {
        self.estimator.as_ref()
    }

    pub fn trajectories(&self) -> &Trajectories {
        &self.trajectories
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    pub fn work(&self) -> &WorkData {
        &self.work
    }

    pub fn judgement(&self) -> f64 {
        self.judge.judgement
    }

    pub fn motion_quality(&self) -> f64 {
        self.judge.motion_quality
    }

    pub fn virtual_centroid(&self) -> Option<Point> {
        self.work.virtual_centroid
    }

    /// Go back to `Prepare` and drop all history. The slot stays allocated.
    pub(crate) fn retire(&mut self) {
        self.status = TrackStatus::Prepare;
        self.estimator.reset();
        self.trajectories.clear();
        self.work = WorkData::default();
        self.judge.reset();
    }

    pub fn estimator_kind(&self) -> EstimatorKind {
        self.kind
    }

    /// Swap the estimator strategy; only used on idle slots.
    pub(crate) fn use_estimator(&mut self, kind: EstimatorKind) {
        if self.kind != kind {
            self.kind = kind;
            self.estimator = kind.create();
        }
    }

    pub fn snapshot(&self, rating_threshold: f64) -> TrackerSnapshot {
        TrackerSnapshot {
            id: self.id,
            status: self.status,
            measured: self.estimator.measured(),
            predicted: self.estimator.predicted(),
            corrected: self.estimator.corrected(),
            velocity: (self.estimator.velocity().x, self.estimator.velocity().y),
            judgement: self.judge.judgement,
            motion_quality: self.judge.motion_quality,
            age_cycles: self.trajectories.corrected.age_cycles,
            max_excursion: self.trajectories.corrected.max_excursion,
            valid: self.judge.is_valid(rating_threshold),
            virtual_centroid: self.work.virtual_centroid,
        }
    }
}

/// Copy of a tracker's outputs after a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerSnapshot {
    pub id: usize,
    pub status: TrackStatus,
    pub measured: Point,
    pub predicted: Point,
    pub corrected: Point,
    /// Pixels per millisecond
    pub velocity: (f64, f64),
    pub judgement: f64,
    pub motion_quality: f64,
    pub age_cycles: u32,
    pub max_excursion: f64,
    /// `judgement > rating_threshold`
    pub valid: bool,
    pub virtual_centroid: Option<Point>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_cycles_carries_remainder() {
        let mut work = WorkData::default();
        // 60 ms at a 40 ms cycle: 1.5, 1.5, 1.5, 1.5 -> 2, 1, 2, 1
        let counts: Vec<u32> = (0..4).map(|_| work.advance_cycles(60, 40)).collect();
        assert_eq!(counts.iter().sum::<u32>(), 6);
        assert_eq!(counts, vec![2, 1, 2, 1]);
    }

    #[test]
    fn test_advance_cycles_short_frames() {
        let mut work = WorkData::default();
        // 10 ms frames at a 40 ms cycle emit one cycle every fourth frame.
        let counts: Vec<u32> = (0..8).map(|_| work.advance_cycles(10, 40)).collect();
        assert_eq!(counts.iter().sum::<u32>(), 2);
    }

    #[test]
    fn test_retire_clears_everything() {
        let mut tracker = Tracker::new(3, EstimatorKind::Kalman);
        tracker.status = TrackStatus::Run;
        tracker.work.region = Some(1);
        tracker.trajectories.init(Point::new(1.0, 2.0));
        tracker.judge.start(10, Point::new(1.0, 2.0));

        tracker.retire();
        assert_eq!(tracker.id(), 3);
        assert_eq!(tracker.status(), TrackStatus::Prepare);
        assert!(!tracker.is_active());
        assert!(tracker.trajectories().corrected.is_empty());
        assert_eq!(tracker.judge(), &Judge::default());
    }
}
