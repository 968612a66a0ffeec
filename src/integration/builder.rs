//! Builder for creating Region objects from detector output.

use crate::tracker::{Point, Region, centroid};

/// Builder for creating `Region` objects.
///
/// The centroid is taken from [`RegionBuilder::centroid`] when set, and
/// otherwise computed as the mean of the outline.
#[derive(Debug, Clone, Default)]
pub struct RegionBuilder {
    centroid: Option<Point>,
    quality: f64,
    pixel_count: Option<i64>,
    outline: Vec<Point>,
}

impl RegionBuilder {
    /// Create a new region builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the centroid explicitly.
    pub fn centroid(mut self, x: f64, y: f64) -> Self {
        self.centroid = Some(Point::new(x, y));
        self
    }

    /// Set the detector quality score.
    pub fn quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    /// Set the pixel count; defaults to the number of outline points.
    pub fn pixel_count(mut self, pixel_count: i64) -> Self {
        self.pixel_count = Some(pixel_count);
        self
    }

    /// Append one outline point.
    pub fn point(mut self, x: f64, y: f64) -> Self {
        self.outline.push(Point::new(x, y));
        self
    }

    /// Append outline points.
    pub fn outline<I>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        self.outline
            .extend(points.into_iter().map(|(x, y)| Point::new(x, y)));
        self
    }

    /// Build the region; `None` without a centroid and without outline points.
    pub fn build(self) -> Option<Region> {
        let centroid = self.centroid.or_else(|| centroid(&self.outline))?;
        Some(Region {
            centroid,
            quality: self.quality,
            pixel_count: self.pixel_count.unwrap_or(self.outline.len() as i64),
            outline: self.outline,
        })
    }
}
