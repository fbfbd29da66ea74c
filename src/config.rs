//! Runtime configuration module.
//!
//! Contains the configuration for mapfeed: which feature collections to
//! load, how to page through them, and how the moving-object feed is
//! polled and animated.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MapError, Result};
use crate::types::DEFAULT_TRAIL_LENGTH;

/// Endpoint of the Maanmittauslaitos cadastral simple-features API.
pub const MML_KIINTEISTO_URL: &str =
    "https://beta-paikkatieto.maanmittauslaitos.fi/kiinteisto-avoin/simple-features/v1";

/// Endpoint of the Digitraffic latest train locations feed.
pub const DIGITRAFFIC_TRAIN_LOCATIONS_URL: &str =
    "https://rata.digitraffic.fi/api/v1/train-locations.geojson/latest/";

/// Name of the optional collections file in the platform config directory.
pub const COLLECTIONS_FILE_NAME: &str = "collections.json";

/// One remote feature collection drawn as a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Short API tag, prefixed to feature ids and stored as the `api` property.
    pub api: String,

    /// Service endpoint, without the `/collections/...` path.
    pub url: String,

    /// Collection (feature type) name.
    #[serde(alias = "featType")]
    pub feat_type: String,
}

impl CollectionConfig {
    /// Creates a collection entry.
    pub fn new(api: impl Into<String>, url: impl Into<String>, feat_type: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            url: url.into(),
            feat_type: feat_type.into(),
        }
    }
}

/// Configuration of the moving-object (train) feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainFeedConfig {
    /// API tag used to build track ids.
    pub api: String,

    /// GeoJSON endpoint returning the latest positions.
    pub url: String,

    /// Seconds between polls.
    pub poll_interval_secs: u64,

    /// Length of the flash animation triggered by each update.
    pub flash_duration_ms: u64,

    /// Number of positions kept per trail.
    pub trail_length: usize,

    /// Maximum number of tracked objects before LRU eviction.
    pub max_tracks: usize,

    /// Redraw rate while animations are running.
    pub fps: u32,

    /// Tracks not seen for this many seconds are dropped.
    pub stale_after_secs: u64,
}

impl Default for TrainFeedConfig {
    fn default() -> Self {
        Self {
            api: "rata".to_string(),
            url: DIGITRAFFIC_TRAIN_LOCATIONS_URL.to_string(),
            poll_interval_secs: 10,
            flash_duration_ms: 3000,
            trail_length: DEFAULT_TRAIL_LENGTH,
            max_tracks: 5000,
            fps: 30,
            stale_after_secs: 300,
        }
    }
}

impl TrainFeedConfig {
    /// Returns the poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Returns the flash animation duration.
    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }

    /// Returns how long an unseen track is kept.
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Returns the redraw period.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

/// Runtime configuration for mapfeed.
///
/// This configuration is typically loaded from environment variables at
/// startup and then refined by command-line arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Collections loaded for every viewport.
    pub collections: Vec<CollectionConfig>,

    /// Page size requested from the feature services (`limit`).
    pub batch_size: u32,

    /// Viewports zoomed out further than this load nothing.
    pub min_zoom: f64,

    /// Click tolerance in pixels.
    pub hit_tolerance_px: f64,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Moving-object feed settings.
    pub trains: TrainFeedConfig,
}

impl MapConfig {
    /// Creates a new MapConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a MapConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `MAPFEED_COLLECTIONS` - Path to a JSON file with the collection list
    /// - `MAPFEED_BATCH_SIZE` - Page size requested per request
    /// - `MAPFEED_MIN_ZOOM` - Minimum zoom level that loads features
    /// - `MAPFEED_HIT_TOLERANCE` - Click tolerance in pixels
    /// - `MAPFEED_TIMEOUT` - Request timeout in seconds
    /// - `MAPFEED_TRAIN_URL` - Moving-object feed endpoint
    /// - `MAPFEED_POLL_INTERVAL` - Seconds between feed polls
    /// - `MAPFEED_FLASH_MS` - Flash animation duration in milliseconds
    /// - `MAPFEED_FPS` - Redraw rate while animating
    /// - `MAPFEED_STALE_AFTER` - Seconds before an unseen track is dropped
    ///
    /// Falls back to defaults for unset or invalid variables. When
    /// `MAPFEED_COLLECTIONS` is unset, a `collections.json` in the platform
    /// config directory is used if it exists.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let collections_path = std::env::var("MAPFEED_COLLECTIONS")
            .ok()
            .map(PathBuf::from)
            .or_else(|| default_collections_path().filter(|p| p.exists()));
        if let Some(path) = collections_path {
            match load_collections(&path) {
                Ok(collections) => config.collections = collections,
                Err(e) => tracing::warn!(path = %path.display(), "ignoring collections file: {}", e),
            }
        }

        if let Ok(size_str) = std::env::var("MAPFEED_BATCH_SIZE") {
            if let Ok(size) = size_str.parse::<u32>() {
                if size > 0 {
                    config.batch_size = size;
                }
            }
        }

        if let Ok(zoom_str) = std::env::var("MAPFEED_MIN_ZOOM") {
            if let Ok(zoom) = zoom_str.parse::<f64>() {
                if (0.0..=30.0).contains(&zoom) {
                    config.min_zoom = zoom;
                }
            }
        }

        if let Ok(tolerance_str) = std::env::var("MAPFEED_HIT_TOLERANCE") {
            if let Ok(tolerance) = tolerance_str.parse::<f64>() {
                if tolerance >= 0.0 {
                    config.hit_tolerance_px = tolerance;
                }
            }
        }

        if let Ok(timeout_str) = std::env::var("MAPFEED_TIMEOUT") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                if timeout > 0 {
                    config.request_timeout_secs = timeout;
                }
            }
        }

        if let Ok(url) = std::env::var("MAPFEED_TRAIN_URL") {
            if !url.trim().is_empty() {
                config.trains.url = url;
            }
        }

        if let Ok(interval_str) = std::env::var("MAPFEED_POLL_INTERVAL") {
            if let Ok(interval) = interval_str.parse::<u64>() {
                if interval > 0 {
                    config.trains.poll_interval_secs = interval;
                }
            }
        }

        if let Ok(flash_str) = std::env::var("MAPFEED_FLASH_MS") {
            if let Ok(flash) = flash_str.parse::<u64>() {
                if flash > 0 {
                    config.trains.flash_duration_ms = flash;
                }
            }
        }

        if let Ok(fps_str) = std::env::var("MAPFEED_FPS") {
            if let Ok(fps) = fps_str.parse::<u32>() {
                if (1..=120).contains(&fps) {
                    config.trains.fps = fps;
                }
            }
        }

        if let Ok(stale_str) = std::env::var("MAPFEED_STALE_AFTER") {
            if let Ok(stale) = stale_str.parse::<u64>() {
                if stale > 0 {
                    config.trains.stale_after_secs = stale;
                }
            }
        }

        config
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.batch_size == 0 {
            return Some("batch_size must be > 0".to_string());
        }

        for collection in &self.collections {
            if collection.api.is_empty() {
                return Some(format!(
                    "collection '{}' has an empty api tag",
                    collection.feat_type
                ));
            }
            if collection.feat_type.is_empty() {
                return Some(format!("collection of api '{}' has no feat_type", collection.api));
            }
            if let Err(e) = url::Url::parse(&collection.url) {
                return Some(format!("invalid url '{}': {}", collection.url, e));
            }
        }

        if let Err(e) = url::Url::parse(&self.trains.url) {
            return Some(format!("invalid train feed url '{}': {}", self.trains.url, e));
        }

        if self.trains.trail_length == 0 {
            return Some("trail_length must be > 0".to_string());
        }

        if self.trains.max_tracks == 0 {
            return Some("max_tracks must be > 0".to_string());
        }

        None
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            collections: vec![
                CollectionConfig::new("v1", MML_KIINTEISTO_URL, "RajamerkinSijaintitiedot"),
                CollectionConfig::new("v1", MML_KIINTEISTO_URL, "KiinteistorajanSijaintitiedot"),
            ],
            batch_size: 500,
            min_zoom: 14.0,
            hit_tolerance_px: 5.0,
            request_timeout_secs: 30,
            user_agent: concat!("mapfeed/", env!("CARGO_PKG_VERSION")).to_string(),
            trains: TrainFeedConfig::default(),
        }
    }
}

/// Reads a JSON array of collections.
pub fn load_collections(path: &Path) -> Result<Vec<CollectionConfig>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| MapError::io(format!("Failed to read {}", path.display()), e))?;
    serde_json::from_str(&text).map_err(|e| {
        MapError::invalid_config(format!("Invalid collections file {}: {}", path.display(), e))
    })
}

/// Returns the platform-specific collections file location.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Application Support/mapfeed/collections.json
/// - Linux: ~/.config/mapfeed/collections.json
/// - Windows: C:\Users\<user>\AppData\Roaming\mapfeed\config\collections.json
pub fn default_collections_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mapfeed")
        .map(|dirs| dirs.config_dir().join(COLLECTIONS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = MapConfig::new();
        assert!(config.validate().is_none());
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.min_zoom, 14.0);
        assert_eq!(config.collections.len(), 2);
        assert!(config.collections.iter().all(|c| c.api == "v1"));
    }

    #[test]
    fn config_validation() {
        let mut config = MapConfig::new();
        config.batch_size = 0;
        assert!(config.validate().is_some());

        let mut config = MapConfig::new();
        config.collections[0].url = "not a url".to_string();
        assert!(config.validate().is_some());

        let mut config = MapConfig::new();
        config.trains.trail_length = 0;
        assert!(config.validate().is_some());
    }

    #[test]
    fn train_feed_durations() {
        let trains = TrainFeedConfig::default();
        assert_eq!(trains.flash_duration(), Duration::from_millis(3000));
        assert_eq!(trains.poll_interval(), Duration::from_secs(10));
        assert!(trains.frame_interval() < Duration::from_millis(40));
    }

    #[test]
    fn from_env_defaults() {
        // No MAPFEED_* variables are set in the test environment
        let config = MapConfig::from_env();
        assert_eq!(config.trains.trail_length, DEFAULT_TRAIL_LENGTH);
        assert!(config.hit_tolerance_px > 0.0);
    }

    #[test]
    fn load_collections_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"api":"v2","url":"https://example.com/features","featType":"Buildings"}}]"#
        )
        .unwrap();

        let collections = load_collections(file.path()).unwrap();
        assert_eq!(
            collections,
            vec![CollectionConfig::new("v2", "https://example.com/features", "Buildings")]
        );
    }

    #[test]
    fn load_collections_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{").unwrap();
        let err = load_collections(file.path()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidConfig);
    }

    #[test]
    fn collections_path_ends_with_file_name() {
        if let Some(path) = default_collections_path() {
            assert!(path.ends_with(COLLECTIONS_FILE_NAME));
        }
    }
}
