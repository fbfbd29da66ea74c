//! mapfeed: paginated GeoJSON feature loading and moving-object animation.
//!
//! Feature services that split large collections into pages linked by
//! `rel = "next"` are traversed page by page, either through a callback that
//! decides whether to continue or as a cancellable stream. On top of that sit
//! a viewport-driven feature layer with click inspection and a tracker that
//! animates moving objects between polled positions.
//!
//! # Modules
//!
//! - [`types`]: Core data types (LonLat, Bbox, FeaturePage, Fix, TrackedFeature)
//! - [`fetch`]: Page sources and pagination
//! - [`map`]: Feature layer, viewport loading and inspection
//! - [`cache`]: LRU cache of tracked objects
//! - [`animation`]: Flash animation and drawing surface
//! - [`tracking`]: Moving-object feed and tracking loop
//! - [`config`]: Runtime configuration (MapConfig)
//! - [`error`]: Error types and codes (MapError, ErrorCode)
//!
//! # Example
//!
//! ```rust,ignore
//! use mapfeed::{
//!     fetch::{features, FeatureQuery, HttpPageSource},
//!     types::Bbox,
//!     MapConfig,
//! };
//!
//! let config = MapConfig::default();
//! let source = HttpPageSource::from_config(&config)?;
//! let query = FeatureQuery::new()
//!     .with_bbox("24.93,60.16,24.96,60.18".parse::<Bbox>()?)
//!     .with_limit(500);
//!
//! // Read at most three pages
//! let mut seen = 0;
//! features(&source, &config.collections[0].url, "RajamerkinSijaintitiedot", &query, |page| {
//!     seen += 1;
//!     println!("{} features", page.len());
//!     seen < 3
//! })
//! .await?;
//! ```

pub mod animation;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod map;
pub mod tracking;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::{CollectionConfig, MapConfig, TrainFeedConfig};
pub use error::{ErrorCode, MapError, Result};
pub use types::{compute_track_id, Bbox, FeaturePage, Fix, LonLat, TrackedFeature};
