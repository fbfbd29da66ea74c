//! Cache module for tracked features.
//!
//! Provides LRU-based storage for the latest state of moving objects.

pub mod tracks;

// Re-export commonly used types
pub use tracks::TrackCache;
