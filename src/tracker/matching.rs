//! Region-to-tracker association.

use std::collections::BTreeMap;

use crate::tracker::geometry::{Point, distance};
use crate::tracker::region::Region;

/// What the matcher needs to know about an active tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerProbe {
    pub id: usize,
    /// Last corrected position
    pub position: Point,
    /// Fallback search position while sharing a merged region
    pub virtual_centroid: Option<Point>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentResult {
    /// `(tracker id, region index)` pairs; a region may appear more than once
    pub matches: Vec<(usize, usize)>,
    pub unmatched_trackers: Vec<usize>,
    /// Regions no tracker claimed, in index order
    pub unclaimed_regions: Vec<usize>,
}

/// Index of the region nearest to `position`, if closer than `max_dist`.
///
/// Ties go to the lowest index.
pub fn nearest_region(regions: &[Region], position: &Point, max_dist: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, region) in regions.iter().enumerate() {
        let d = distance(position, &region.centroid);
        if d >= max_dist {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Greedy nearest-neighbour association.
///
/// Every tracker independently picks its nearest region, so two trackers can
/// claim the same region; see [`find_merges`].
pub fn associate(probes: &[TrackerProbe], regions: &[Region], max_dist: f64) -> AssignmentResult {
    let mut matches = Vec::new();
    let mut unmatched_trackers = Vec::new();
    let mut claimed = vec![false; regions.len()];

    for probe in probes {
        let found = nearest_region(regions, &probe.position, max_dist).or_else(|| {
            probe
                .virtual_centroid
                .and_then(|vc| nearest_region(regions, &vc, max_dist))
        });
        match found {
            Some(idx) => {
                claimed[idx] = true;
                matches.push((probe.id, idx));
            }
            None => unmatched_trackers.push(probe.id),
        }
    }

    let unclaimed_regions = claimed
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| if c { None } else { Some(i) })
        .collect();

    AssignmentResult {
        matches,
        unmatched_trackers,
        unclaimed_regions,
    }
}

/// Regions claimed by more than one tracker, with the claimants in id order.
pub fn find_merges(matches: &[(usize, usize)]) -> Vec<(usize, Vec<usize>)> {
    let mut by_region: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &(tracker, region) in matches {
        by_region.entry(region).or_default().push(tracker);
    }
    by_region
        .into_iter()
        .filter(|(_, trackers)| trackers.len() > 1)
        .map(|(region, mut trackers)| {
            trackers.sort_unstable();
            (region, trackers)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(id: usize, x: f64, y: f64) -> TrackerProbe {
        TrackerProbe {
            id,
            position: Point::new(x, y),
            virtual_centroid: None,
        }
    }

    #[test]
    fn test_nearest_region_respects_tolerance() {
        let regions = vec![Region::new(0.0, 0.0, 1.0), Region::new(50.0, 0.0, 1.0)];
        assert_eq!(nearest_region(&regions, &Point::new(40.0, 0.0), 20.0), Some(1));
        assert_eq!(nearest_region(&regions, &Point::new(25.0, 0.0), 20.0), None);
        // Strictly less than the tolerance.
        assert_eq!(nearest_region(&regions, &Point::new(0.0, 20.0), 20.0), None);
    }

    #[test]
    fn test_nearest_region_tie_goes_to_lowest_index() {
        let regions = vec![Region::new(-10.0, 0.0, 1.0), Region::new(10.0, 0.0, 1.0)];
        assert_eq!(nearest_region(&regions, &Point::new(0.0, 0.0), 50.0), Some(0));
    }

    #[test]
    fn test_associate_reports_unclaimed() {
        let regions = vec![
            Region::new(0.0, 0.0, 1.0),
            Region::new(100.0, 0.0, 1.0),
            Region::new(500.0, 0.0, 1.0),
        ];
        let probes = vec![probe(0, 5.0, 0.0), probe(3, 95.0, 0.0), probe(4, 300.0, 300.0)];
        let result = associate(&probes, &regions, 30.0);
        assert_eq!(result.matches, vec![(0, 0), (3, 1)]);
        assert_eq!(result.unmatched_trackers, vec![4]);
        assert_eq!(result.unclaimed_regions, vec![2]);
    }

    #[test]
    fn test_associate_falls_back_to_virtual_centroid() {
        let regions = vec![Region::new(100.0, 0.0, 1.0)];
        let mut p = probe(1, 0.0, 0.0);
        assert!(associate(&[p], &regions, 30.0).matches.is_empty());

        p.virtual_centroid = Some(Point::new(90.0, 0.0));
        assert_eq!(associate(&[p], &regions, 30.0).matches, vec![(1, 0)]);
    }

    #[test]
    fn test_associate_is_deterministic() {
        let regions: Vec<Region> = (0..6)
            .map(|i| Region::new(i as f64 * 17.0, (i * i) as f64, 1.0))
            .collect();
        let probes: Vec<TrackerProbe> = (0..4).map(|i| probe(i, i as f64 * 20.0, 3.0)).collect();
        let first = associate(&probes, &regions, 25.0);
        let second = associate(&probes, &regions, 25.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_find_merges() {
        let merges = find_merges(&[(2, 0), (0, 1), (1, 0), (3, 1), (4, 2)]);
        assert_eq!(merges, vec![(0, vec![1, 2]), (1, vec![0, 3])]);
    }
}
