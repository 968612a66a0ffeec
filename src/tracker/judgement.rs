//! Confidence scoring from tracked age and travelled distance.

use serde::{Deserialize, Serialize};

use crate::tracker::geometry::Point;

/// Upper bound of the judgement score.
pub const JUDGEMENT_CEILING: f64 = 2.0;

/// Largest effective window of the motion-quality running average.
pub const QUALITY_WINDOW: u32 = 100;

/// Judgement `K * tanh(age / (2 * min_time)) * tanh(max_dist / min_dist)`.
///
/// A zero `min_time_ms` or `min_dist` switches that criterion off: its
/// factor is pinned to 1.
pub fn judgement(age_ms: i64, max_dist: f64, min_time_ms: i64, min_dist: f64) -> f64 {
    let time_factor = if min_time_ms == 0 {
        1.0
    } else {
        (age_ms.max(0) as f64 / (2.0 * min_time_ms as f64)).tanh()
    };
    let dist_factor = if min_dist == 0.0 {
        1.0
    } else {
        (max_dist / min_dist).tanh()
    };
    JUDGEMENT_CEILING * time_factor * dist_factor
}

/// Scoring state of one tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Judge {
    /// Timestamp of the first measurement
    pub init_time: i64,
    /// Position of the first measurement
    pub init_position: Option<Point>,
    /// Largest distance from `init_position` seen so far
    pub max_dist: f64,
    /// Current judgement score
    pub judgement: f64,
    /// Running average of the matched regions' quality
    pub motion_quality: f64,
    samples: u32,
}

impl Judge {
    pub fn start(&mut self, time: i64, position: Point) {
        *self = Self {
            init_time: time,
            init_position: Some(position),
            ..Self::default()
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Elapsed time since `start`.
    pub fn age_ms(&self, now: i64) -> i64 {
        now - self.init_time
    }

    /// Track the excursion of `position` from the seed position.
    pub fn observe_position(&mut self, position: Point) -> f64 {
        if let Some(origin) = self.init_position {
            self.max_dist = self.max_dist.max(nalgebra::distance(&origin, &position));
        }
        self.max_dist
    }

    /// Fold one region quality into the running average.
    pub fn observe_quality(&mut self, quality: f64) {
        self.samples = (self.samples + 1).min(QUALITY_WINDOW);
        self.motion_quality += (quality - self.motion_quality) / self.samples as f64;
    }

    pub fn rate(&mut self, now: i64, min_time_ms: i64, min_dist: f64) -> f64 {
        self.judgement = judgement(self.age_ms(now), self.max_dist, min_time_ms, min_dist);
        self.judgement
    }

    pub fn is_valid(&self, rating_threshold: f64) -> bool {
        self.judgement > rating_threshold
    }
}
