//! TrackerPipeline for driving a tracker pool from a region source.

use crate::error::ConfigError;
use crate::tracker::{FrameReport, TrackerConfig, TrackerPool};

use super::RegionSource;

/// Bundles a [`RegionSource`] with a [`TrackerPool`].
///
/// The pipeline owns the pool, so a host embedding it in a multi-threaded
/// program serialises frames simply by holding `&mut` to the pipeline.
pub struct TrackerPipeline<S: RegionSource> {
    source: S,
    tracker: TrackerPool,
}

impl<S: RegionSource> TrackerPipeline<S> {
    /// Create a new pipeline with the given source and tracker config.
    pub fn new(source: S, config: TrackerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            source,
            tracker: TrackerPool::new(config)?,
        })
    }

    /// Create a new pipeline with the default tracker configuration.
    pub fn with_default_config(source: S) -> Self {
        Self {
            source,
            tracker: TrackerPool::default(),
        }
    }

    /// Pull one frame from the source and track it.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    pub fn process_next(&mut self) -> Result<Option<FrameReport>, S::Error> {
        let Some(frame) = self.source.next_frame()? else {
            return Ok(None);
        };
        Ok(Some(self.tracker.update(&frame.regions, frame.timestamp)))
    }

    /// Drain the source, returning one report per frame.
    pub fn run_to_end(&mut self) -> Result<Vec<FrameReport>, S::Error> {
        let mut reports = Vec::new();
        while let Some(report) = self.process_next()? {
            reports.push(report);
        }
        Ok(reports)
    }

    /// Get a reference to the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the underlying source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Get a reference to the underlying tracker pool.
    pub fn tracker(&self) -> &TrackerPool {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker pool.
    pub fn tracker_mut(&mut self) -> &mut TrackerPool {
        &mut self.tracker
    }
}
