//! Core types for mapfeed.
//!
//! This module re-exports the data types used throughout the crate:
//! - [`LonLat`] and [`Bbox`]: Geographic coordinates and extents
//! - [`FeaturePage`] and [`Link`]: One page of a paginated feature service
//! - [`Fix`] and [`TrackedFeature`]: Moving-object sightings and their state

mod geo;
mod page;
mod track;

// Re-export all types at the module level
pub use geo::{Bbox, LonLat};
pub use page::{FeaturePage, Link, NEXT_REL};
pub use track::{
    compute_track_id, id_to_string, Fix, TrackedFeature, DEFAULT_TRAIL_LENGTH, SPEED_PROPERTY,
    TIMESTAMP_PROPERTY, TRAIN_NUMBER_PROPERTY,
};
