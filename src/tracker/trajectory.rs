//! Bounded polyline history of a tracker.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::tracker::geometry::Point;

/// Maximum number of points kept per trajectory.
pub const MAX_TRAJECTORY_POINTS: usize = 500;

/// Ordered point history with oldest-first eviction.
///
/// `age_cycles` and `max_excursion` are summaries maintained by the pool,
/// the buffer itself never touches them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    points: VecDeque<Point>,
    /// Cycles elapsed since the tracker was seeded
    pub age_cycles: u32,
    /// Largest distance from the seed position seen so far
    pub max_excursion: f64,
}

impl Trajectory {
    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(MAX_TRAJECTORY_POINTS),
            age_cycles: 0,
            max_excursion: 0.0,
        }
    }

    /// Start over with two points collapsed at `point`.
    pub fn init(&mut self, point: Point) {
        self.clear();
        self.points.push_back(point);
        self.points.push_back(point);
    }

    /// Append `cycles` points interpolated linearly from the current last
    /// point to `target`. The final appended point is exactly `target`.
    pub fn update(&mut self, target: Point, cycles: u32) {
        if cycles == 0 {
            return;
        }
        let start = self.points.back().copied().unwrap_or(target);
        let step = (target - start) / cycles as f64;

        let total = self.points.len() + cycles as usize;
        let overflow = total.saturating_sub(MAX_TRAJECTORY_POINTS);
        let evict = overflow.min(self.points.len());
        self.points.drain(..evict);
        let skip = overflow - evict;

        for k in (skip as u32 + 1)..cycles {
            self.points.push_back(start + step * k as f64);
        }
        self.points.push_back(target);
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.age_cycles = 0;
        self.max_excursion = 0.0;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.front().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.back().copied()
    }

    pub fn points(&self) -> impl ExactSizeIterator<Item = &Point> {
        self.points.iter()
    }
}

/// The three histories every tracker keeps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectories {
    pub measured: Trajectory,
    pub predicted: Trajectory,
    pub corrected: Trajectory,
}

impl Trajectories {
    pub fn new() -> Self {
        Self {
            measured: Trajectory::new(),
            predicted: Trajectory::new(),
            corrected: Trajectory::new(),
        }
    }

    pub fn init(&mut self, point: Point) {
        self.measured.init(point);
        self.predicted.init(point);
        self.corrected.init(point);
    }

    pub fn clear(&mut self) {
        self.measured.clear();
        self.predicted.clear();
        self.corrected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_init_collapses_two_points() {
        let mut t = Trajectory::new();
        t.init(Point::new(3.0, 4.0));
        assert_eq!(t.len(), 2);
        assert_eq!(t.first(), t.last());
    }

    #[test]
    fn test_update_interpolates() {
        let mut t = Trajectory::new();
        t.init(Point::new(0.0, 0.0));
        t.update(Point::new(30.0, 0.0), 3);
        let xs: Vec<f64> = t.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_update_zero_cycles_is_noop() {
        let mut t = Trajectory::new();
        t.init(Point::new(1.0, 1.0));
        t.update(Point::new(9.0, 9.0), 0);
        assert_eq!(t.len(), 2);
        assert_eq!(t.last(), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_update_on_empty_starts_at_target() {
        let mut t = Trajectory::new();
        t.update(Point::new(5.0, 5.0), 2);
        assert_eq!(t.len(), 2);
        assert!(t.points().all(|p| *p == Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut t = Trajectory::new();
        t.init(Point::new(0.0, 0.0));
        t.update(Point::new(498.0, 0.0), 498);
        assert_eq!(t.len(), MAX_TRAJECTORY_POINTS);
        assert_eq!(t.first(), Some(Point::new(0.0, 0.0)));

        t.update(Point::new(500.0, 0.0), 2);
        assert_eq!(t.len(), MAX_TRAJECTORY_POINTS);
        assert_eq!(t.first(), Some(Point::new(1.0, 0.0)));
        assert_eq!(t.last(), Some(Point::new(500.0, 0.0)));
    }

    #[test]
    fn test_huge_gap_keeps_interpolated_tail() {
        let mut t = Trajectory::new();
        t.init(Point::new(0.0, 0.0));
        t.update(Point::new(1000.0, 0.0), 1000);
        assert_eq!(t.len(), MAX_TRAJECTORY_POINTS);
        assert_eq!(t.first(), Some(Point::new(501.0, 0.0)));
        assert_eq!(t.last(), Some(Point::new(1000.0, 0.0)));
    }

    #[test]
    fn test_clear_resets_summaries() {
        let mut t = Trajectory::new();
        t.init(Point::new(0.0, 0.0));
        t.age_cycles = 7;
        t.max_excursion = 12.5;
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.age_cycles, 0);
        assert_eq!(t.max_excursion, 0.0);
    }

    proptest! {
        #[test]
        fn prop_bounded_and_last_is_target(
            steps in prop::collection::vec((-1e4f64..1e4, -1e4f64..1e4, 0u32..700), 1..40)
        ) {
            let mut t = Trajectory::new();
            t.init(Point::new(0.0, 0.0));
            for (x, y, cycles) in steps {
                t.update(Point::new(x, y), cycles);
                prop_assert!(t.len() <= MAX_TRAJECTORY_POINTS);
                t.update(Point::new(x, y), 1);
                prop_assert_eq!(t.last(), Some(Point::new(x, y)));
            }
        }
    }
}
