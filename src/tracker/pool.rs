//! Fixed-size tracker pool: per-frame association and lifecycle management.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{ConfigError, EstimatorError};
use crate::tracker::estimator::{EstimatorKind, EstimatorParams};
use crate::tracker::geometry::{Point, partition_centroids};
use crate::tracker::matching::{self, AssignmentResult, TrackerProbe};
use crate::tracker::region::Region;
use crate::tracker::slot::{Tracker, TrackerSnapshot};
use crate::tracker::track_state::{RetireReason, TrackStatus};

/// Configuration for the TrackerPool.
///
/// Every field except `pool_size` may be changed between frames through
/// [`TrackerPool::set_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of tracker slots
    pub pool_size: usize,
    /// Estimator strategy used for newly spawned trackers
    pub estimator: EstimatorKind,
    pub process_noise: f64,
    pub measurement_noise: f64,
    /// A region matches only if strictly closer than this (pixels)
    pub max_tol_dist: f64,
    /// Minimum region quality for spawning a tracker
    pub spawn_quality: f64,
    /// Judgement time normaliser; 0 trusts any age
    pub min_time_ms: i64,
    /// Judgement distance normaliser; 0 trusts any excursion
    pub min_dist: f64,
    /// A tracker is valid if its judgement is strictly above this
    pub rating_threshold: f64,
    /// On a merge with equal judgements, retire the older tracker
    pub delete_merged: bool,
    /// Nominal cycle duration
    pub dt_min_ms: i64,
    /// Largest gap between two updates of one tracker
    pub dt_max_ms: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            estimator: EstimatorKind::Kalman,
            process_noise: 0.01,
            measurement_noise: 4.0,
            max_tol_dist: 60.0,
            spawn_quality: 0.5,
            min_time_ms: 500,
            min_dist: 0.0,
            rating_threshold: 0.5,
            delete_merged: false,
            dt_min_ms: 40,
            dt_max_ms: 500,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::invalid("pool_size", "must be at least 1"));
        }
        for (field, value) in [
            ("process_noise", self.process_noise),
            ("measurement_noise", self.measurement_noise),
            ("min_dist", self.min_dist),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("{value} is not >= 0")));
            }
        }
        if !(self.max_tol_dist.is_finite() && self.max_tol_dist > 0.0) {
            return Err(ConfigError::invalid("max_tol_dist", "must be positive"));
        }
        if self.min_time_ms < 0 {
            return Err(ConfigError::invalid("min_time_ms", "must not be negative"));
        }
        if self.dt_min_ms <= 0 {
            return Err(ConfigError::invalid("dt_min_ms", "must be positive"));
        }
        if self.dt_max_ms < self.dt_min_ms {
            return Err(ConfigError::invalid("dt_max_ms", "must not be below dt_min_ms"));
        }
        Ok(())
    }

    pub fn estimator_params(&self) -> EstimatorParams {
        EstimatorParams {
            process_noise: self.process_noise,
            measurement_noise: self.measurement_noise,
            dt_min_ms: self.dt_min_ms,
            dt_max_ms: self.dt_max_ms,
        }
    }
}

/// Outcome of one `update` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub timestamp: i64,
    /// Active trackers after the frame, in slot order
    pub tracks: Vec<TrackerSnapshot>,
    /// Slots that picked up a new region
    pub spawned: Vec<usize>,
    pub retired: Vec<(usize, RetireReason)>,
    /// Regions that could not get a slot
    pub dropped_regions: Vec<usize>,
    /// Estimator steps that fell back to the prediction
    pub numeric_failures: u32,
}

impl FrameReport {
    fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct TrackerPool {
    trackers: Vec<Tracker>,
    config: TrackerConfig,
    frame_id: u64,
}

impl Default for TrackerPool {
    fn default() -> Self {
        Self::with_valid_config(TrackerConfig::default())
    }
}

impl TrackerPool {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: TrackerConfig) -> Self {
        let trackers = (0..config.pool_size)
            .map(|id| Tracker::new(id, config.estimator))
            .collect();
        Self {
            trackers,
            config,
            frame_id: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replace the configuration; takes effect on the next `update`.
    pub fn set_config(&mut self, config: TrackerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.pool_size != self.config.pool_size {
            return Err(ConfigError::invalid(
                "pool_size",
                "the pool size is fixed at construction",
            ));
        }
        self.config = config;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.trackers.len()
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn trackers(&self) -> &[Tracker] {
        &self.trackers
    }

    pub fn tracker(&self, id: usize) -> Option<&Tracker> {
        self.trackers.get(id)
    }

    pub fn active(&self) -> impl Iterator<Item = &Tracker> {
        self.trackers.iter().filter(|t| t.is_active())
    }

    /// Trackers in `Run` whose judgement passes the rating threshold.
    pub fn valid(&self) -> impl Iterator<Item = &Tracker> {
        let threshold = self.config.rating_threshold;
        self.trackers
            .iter()
            .filter(move |t| t.status() == TrackStatus::Run && t.judge().is_valid(threshold))
    }

    /// Snapshots of all active trackers.
    pub fn snapshots(&self) -> Vec<TrackerSnapshot> {
        self.active()
            .map(|t| t.snapshot(self.config.rating_threshold))
            .collect()
    }

    /// Retire every active tracker, reporting each as `Cleared`.
    pub fn clear_all(&mut self) -> Vec<(usize, RetireReason)> {
        let mut cleared = Vec::new();
        for tracker in self.trackers.iter_mut().filter(|t| t.is_active()) {
            retire(tracker, RetireReason::Cleared, &mut cleared);
        }
        debug!(count = cleared.len(), "cleared all trackers");
        cleared
    }

    /// Process one frame of regions observed at `cur_time` (milliseconds).
    pub fn update(&mut self, regions: &[Region], cur_time: i64) -> FrameReport {
        self.frame_id += 1;
        let params = self.config.estimator_params();
        let mut report = FrameReport::new(cur_time);
        let n = self.trackers.len();

        // Step 1: predict running trackers
        for tracker in self.trackers.iter_mut() {
            if tracker.status != TrackStatus::Run || !tracker.is_active() {
                continue;
            }
            let dt = cur_time - tracker.work.last_update;
            if let Err(err) = tracker.estimator.predict(dt, &params) {
                warn!(tracker = tracker.id(), %err, "prediction failed");
                report.numeric_failures += 1;
            }
        }

        // Step 2: match active trackers to their nearest region
        let was_active: Vec<bool> = self.trackers.iter().map(|t| t.is_active()).collect();
        let previous: Vec<Point> = self
            .trackers
            .iter()
            .map(|t| t.estimator.corrected())
            .collect();
        let probes: Vec<TrackerProbe> = self
            .trackers
            .iter()
            .filter(|t| t.is_active())
            .map(|t| TrackerProbe {
                id: t.id(),
                position: t.estimator.corrected(),
                virtual_centroid: t.work.virtual_centroid,
            })
            .collect();

        let AssignmentResult {
            matches,
            unmatched_trackers,
            unclaimed_regions,
        } = matching::associate(&probes, regions, self.config.max_tol_dist);

        let mut claims: Vec<Option<usize>> = vec![None; n];
        for &(id, region) in &matches {
            claims[id] = Some(region);
        }

        // Step 3: spawn trackers for unclaimed, good-enough regions
        for region_idx in unclaimed_regions {
            if regions[region_idx].quality < self.config.spawn_quality {
                continue;
            }
            let free = (0..n).find(|&i| !was_active[i] && claims[i].is_none());
            match free {
                Some(slot) => claims[slot] = Some(region_idx),
                None => {
                    warn!(
                        region = region_idx,
                        capacity = n,
                        "tracker pool exhausted, dropping region"
                    );
                    report.dropped_regions.push(region_idx);
                }
            }
        }

        // Step 4: resolve trackers sharing one region
        let mut virtual_centroids: Vec<Option<Point>> = vec![None; n];
        for (region_idx, claimants) in matching::find_merges(&matches) {
            self.resolve_merge(
                &regions[region_idx],
                &claimants,
                &previous,
                &mut claims,
                &mut virtual_centroids,
                &mut report,
            );
        }

        // Step 5: retire trackers that lost their region
        for id in unmatched_trackers {
            retire(&mut self.trackers[id], RetireReason::Unmatched, &mut report.retired);
        }

        // Step 6: seed, initialise or correct the matched trackers
        for i in 0..n {
            let Some(region_idx) = claims[i] else {
                continue;
            };
            let region = &regions[region_idx];
            let measurement = virtual_centroids[i].unwrap_or(region.centroid);
            let tracker = &mut self.trackers[i];
            tracker.work.region = Some(region_idx);
            tracker.work.virtual_centroid = virtual_centroids[i];

            match tracker.status {
                TrackStatus::Prepare => {
                    tracker.use_estimator(self.config.estimator);
                    tracker.estimator.prepare(measurement);
                    tracker.trajectories.init(measurement);
                    tracker.judge.start(cur_time, measurement);
                    tracker.work.last_update = cur_time;
                    tracker.work.cycle_remainder = 0.0;
                    tracker.status = TrackStatus::Init;
                    report.spawned.push(i);
                    debug!(tracker = i, region = region_idx, "tracker spawned");
                }
                TrackStatus::Init => {
                    let dt = cur_time - tracker.work.last_update;
                    match tracker.estimator.initialize(measurement, dt, &params) {
                        Err(EstimatorError::TemporalGap { dt_ms, max_ms }) => {
                            warn!(tracker = i, dt_ms, max_ms, "initialisation gap too large");
                            retire(tracker, RetireReason::TemporalGap, &mut report.retired);
                            continue;
                        }
                        Err(err) => {
                            warn!(tracker = i, %err, "initial correction skipped");
                            report.numeric_failures += 1;
                        }
                        Ok(()) => {}
                    }
                    tracker.status = TrackStatus::Run;
                    debug!(tracker = i, "tracker running");
                    self.advance(i, region, dt, cur_time);
                }
                TrackStatus::Run => {
                    let dt = cur_time - tracker.work.last_update;
                    if let Err(err) = params.effective_dt(dt) {
                        warn!(tracker = i, %err, "update gap too large");
                        retire(tracker, RetireReason::TemporalGap, &mut report.retired);
                        continue;
                    }
                    if let Err(err) = tracker.estimator.correct(measurement, &params) {
                        warn!(tracker = i, %err, "correction skipped, keeping prediction");
                        report.numeric_failures += 1;
                    }
                    self.advance(i, region, dt, cur_time);
                }
            }
        }

        report.tracks = self.snapshots();
        trace!(
            frame = self.frame_id,
            regions = regions.len(),
            active = report.tracks.len(),
            "frame processed"
        );
        report
    }

    /// Apply the merge tie-break to all trackers claiming `region`.
    ///
    /// Pairs are settled by judgement, then by age under `delete_merged`.
    /// Trackers left standing after an undecided pair share the outline,
    /// split once over all of them.
    fn resolve_merge(
        &mut self,
        region: &Region,
        claimants: &[usize],
        previous: &[Point],
        claims: &mut [Option<usize>],
        virtual_centroids: &mut [Option<Point>],
        report: &mut FrameReport,
    ) {
        let mut undecided = Vec::new();
        for (pos, &a) in claimants.iter().enumerate() {
            for &b in &claimants[pos + 1..] {
                if claims[a].is_none() || claims[b].is_none() {
                    continue;
                }
                let (judge_a, judge_b) = (self.trackers[a].judgement(), self.trackers[b].judgement());
                let (init_a, init_b) = (
                    self.trackers[a].judge.init_time,
                    self.trackers[b].judge.init_time,
                );

                let loser = if judge_a != judge_b {
                    let loser = if judge_a < judge_b { a } else { b };
                    Some((loser, RetireReason::MergedLowerJudgement))
                } else if self.config.delete_merged && init_a != init_b {
                    let loser = if init_a < init_b { a } else { b };
                    Some((loser, RetireReason::MergedOlder))
                } else {
                    None
                };

                match loser {
                    Some((loser, reason)) => {
                        debug!(kept = a + b - loser, retired = loser, ?reason, "merge resolved");
                        claims[loser] = None;
                        retire(&mut self.trackers[loser], reason, &mut report.retired);
                    }
                    None => undecided.extend([a, b]),
                }
            }
        }

        // claimants are sorted, so survivors come out in slot order
        let survivors: Vec<usize> = claimants
            .iter()
            .copied()
            .filter(|&id| undecided.contains(&id) && claims[id].is_some())
            .collect();
        if survivors.len() < 2 {
            return;
        }
        let anchors: Vec<Point> = survivors.iter().map(|&id| previous[id]).collect();
        let centroids = partition_centroids(&region.outline, &anchors);
        debug!(trackers = ?survivors, "merged region split into virtual centroids");
        for (&id, centroid) in survivors.iter().zip(centroids) {
            virtual_centroids[id] = Some(centroid);
        }
    }

    /// Bookkeeping after a successful estimator step.
    fn advance(&mut self, id: usize, region: &Region, dt: i64, cur_time: i64) {
        let config = &self.config;
        let tracker = &mut self.trackers[id];
        let cycles = tracker.work.advance_cycles(dt, config.dt_min_ms);
        tracker.work.last_update = cur_time;

        let measured = tracker.estimator.measured();
        let predicted = tracker.estimator.predicted();
        let corrected = tracker.estimator.corrected();

        let max_dist = tracker.judge.observe_position(corrected);
        tracker.judge.observe_quality(region.quality);
        tracker
            .judge
            .rate(cur_time, config.min_time_ms, config.min_dist);

        let trajectories = &mut tracker.trajectories;
        for (trajectory, point) in [
            (&mut trajectories.measured, measured),
            (&mut trajectories.predicted, predicted),
            (&mut trajectories.corrected, corrected),
        ] {
            trajectory.update(point, cycles);
            trajectory.age_cycles += cycles;
            trajectory.max_excursion = max_dist;
        }
    }
}

fn retire(tracker: &mut Tracker, reason: RetireReason, retired: &mut Vec<(usize, RetireReason)>) {
    debug!(tracker = tracker.id(), ?reason, "tracker retired");
    tracker.retire();
    retired.push((tracker.id(), reason));
}
