//! Region observations handed to the tracker once per frame.

use serde::{Deserialize, Serialize};

use crate::tracker::geometry::{Point, centroid};

/// One detected blob for the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Centroid of the region
    pub centroid: Point,
    /// Detector-supplied quality score
    pub quality: f64,
    /// Number of pixels in the region
    pub pixel_count: i64,
    /// Outline points, used to split merged regions
    pub outline: Vec<Point>,
}

impl Region {
    pub fn new(x: f64, y: f64, quality: f64) -> Self {
        Self {
            centroid: Point::new(x, y),
            quality,
            pixel_count: 0,
            outline: Vec::new(),
        }
    }

    /// Region whose centroid is the mean of its outline.
    ///
    /// Returns `None` for an empty outline.
    pub fn from_outline(outline: Vec<(f64, f64)>, quality: f64) -> Option<Self> {
        let outline: Vec<Point> = outline.into_iter().map(|(x, y)| Point::new(x, y)).collect();
        let centroid = centroid(&outline)?;
        Some(Self {
            centroid,
            quality,
            pixel_count: outline.len() as i64,
            outline,
        })
    }

    pub fn with_pixel_count(mut self, pixel_count: i64) -> Self {
        self.pixel_count = pixel_count;
        self
    }

    pub fn with_outline(mut self, outline: Vec<(f64, f64)>) -> Self {
        self.outline = outline.into_iter().map(|(x, y)| Point::new(x, y)).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outline() {
        let region = Region::from_outline(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)], 0.8)
            .unwrap();
        assert_eq!(region.centroid, Point::new(2.0, 1.0));
        assert_eq!(region.pixel_count, 4);
        assert!(Region::from_outline(vec![], 1.0).is_none());
    }

    #[test]
    fn test_builder_methods() {
        let region = Region::new(5.0, 6.0, 0.9)
            .with_pixel_count(120)
            .with_outline(vec![(1.0, 1.0)]);
        assert_eq!(region.pixel_count, 120);
        assert_eq!(region.outline.len(), 1);
    }
}
