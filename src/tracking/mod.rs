//! Tracking of moving objects reported by a polled feed.
//!
//! - [`layer`]: per-object state and the flashes triggered by movement
//! - [`feed`]: the feed client and the poll/draw loop

pub mod feed;
pub mod layer;

// Re-export commonly used types
pub use feed::{run, RunOptions, RunStats, TrainFeed};
pub use layer::{Ingest, IngestSummary, TrackLayer};
