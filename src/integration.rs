//! Glue between an upstream region detector and the tracker pool.
//!
//! Region detection itself (labelling, colour decoding, capture) lives
//! outside this crate; implement [`RegionSource`] to plug it in.

mod builder;
mod pipeline;
mod source;

pub use builder::RegionBuilder;
pub use pipeline::TrackerPipeline;
pub use source::{Frame, IntoRegions, RegionSource};
