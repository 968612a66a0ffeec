//! Trait for upstream region detectors.

use crate::tracker::Region;

/// Regions observed in one video frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Frame timestamp in milliseconds, non-decreasing
    pub timestamp: i64,
    pub regions: Vec<Region>,
}

impl Frame {
    pub fn new(timestamp: i64, regions: Vec<Region>) -> Self {
        Self { timestamp, regions }
    }
}

/// Trait for region detection backends.
///
/// Implement this trait to feed any detector into a [`TrackerPipeline`](super::TrackerPipeline).
///
/// # Example
///
/// ```
/// use regiontrack_rs::{Frame, Region, RegionSource};
///
/// struct Replay {
///     frames: std::vec::IntoIter<Frame>,
/// }
///
/// impl RegionSource for Replay {
///     type Error = std::convert::Infallible;
///
///     fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
///         Ok(self.frames.next())
///     }
/// }
/// ```
pub trait RegionSource {
    /// Error type for detection failures.
    type Error;

    /// Next frame of regions, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error>;
}

/// Helper trait for converting detector-specific outputs to regions.
pub trait IntoRegions {
    fn into_regions(self) -> Vec<Region>;
}

impl IntoRegions for Vec<Region> {
    fn into_regions(self) -> Vec<Region> {
        self
    }
}

impl IntoRegions for Vec<(f64, f64, f64)> {
    /// `(x, y, quality)` centroids without outlines.
    fn into_regions(self) -> Vec<Region> {
        self.into_iter()
            .map(|(x, y, quality)| Region::new(x, y, quality))
            .collect()
    }
}
