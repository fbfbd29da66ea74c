//! Track types representing moving point features.
//!
//! A [`Fix`] is one sighting of a moving object as read from a feed page.
//! A [`TrackedFeature`] is the state kept between sightings. Both are
//! identified by a stable track_id computed from the source's own identifier.

use geojson::{feature::Id, Feature, Value};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

use super::geo::LonLat;

/// Property holding the source-provided train number.
pub const TRAIN_NUMBER_PROPERTY: &str = "trainNumber";

/// Property holding the reported speed in km/h.
pub const SPEED_PROPERTY: &str = "speed";

/// Property holding the source's observation timestamp.
pub const TIMESTAMP_PROPERTY: &str = "timestamp";

/// Default number of positions kept in a trail.
pub const DEFAULT_TRAIL_LENGTH: usize = 5;

/// One observed position of a moving object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Stable identifier, see [`compute_track_id`].
    pub track_id: String,

    /// Observed position.
    pub position: LonLat,

    /// Reported speed in km/h, if any.
    pub speed: Option<f64>,

    /// Observation time as reported by the source (ISO 8601 text).
    pub timestamp: Option<String>,
}

impl Fix {
    /// Creates a fix without speed or timestamp.
    pub fn new(track_id: impl Into<String>, position: LonLat) -> Self {
        Self {
            track_id: track_id.into(),
            position,
            speed: None,
            timestamp: None,
        }
    }

    /// Sets the reported speed, returning the fix.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Reads a fix from a point feature.
    ///
    /// The identifier is taken from the `trainNumber` property when present,
    /// otherwise from the feature id. Returns None for features without a
    /// point geometry or without any identifier.
    pub fn from_feature(feature: &Feature, api: &str) -> Option<Self> {
        let position = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(position)) => LonLat::from_position(position)?,
            _ => return None,
        };

        let source_id = feature
            .property(TRAIN_NUMBER_PROPERTY)
            .and_then(json_to_id)
            .or_else(|| feature.id.as_ref().map(id_to_string))?;

        let speed = feature.property(SPEED_PROPERTY).and_then(|v| v.as_f64());
        let timestamp = feature
            .property(TIMESTAMP_PROPERTY)
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Some(Self {
            track_id: compute_track_id(api, &source_id),
            position,
            speed,
            timestamp,
        })
    }
}

/// State kept for a moving object between sightings.
#[derive(Debug, Clone)]
pub struct TrackedFeature {
    /// Stable identifier.
    pub track_id: String,

    /// Most recent position.
    pub position: LonLat,

    /// Position before the most recent update. None until the second sighting.
    pub previous: Option<LonLat>,

    /// Most recent reported speed in km/h.
    pub speed: Option<f64>,

    /// Recent positions, oldest first, newest (== `position`) last.
    pub trail: VecDeque<LonLat>,

    /// Maximum trail length.
    trail_length: usize,

    /// Number of sightings so far.
    pub sightings: u64,

    /// When the last sighting was applied.
    pub updated_at: Instant,
}

impl TrackedFeature {
    /// Creates the state for a first sighting.
    ///
    /// The trail is seeded with the current position.
    pub fn from_first_fix(fix: &Fix, trail_length: usize, now: Instant) -> Self {
        let trail_length = trail_length.max(1);
        let mut trail = VecDeque::with_capacity(trail_length);
        trail.push_back(fix.position);
        Self {
            track_id: fix.track_id.clone(),
            position: fix.position,
            previous: None,
            speed: fix.speed,
            trail,
            trail_length,
            sightings: 1,
            updated_at: now,
        }
    }

    /// Applies a later sighting.
    ///
    /// The current position becomes `previous`, the new position is appended
    /// to the trail and the oldest entries are dropped once the trail exceeds
    /// its maximum length.
    pub fn apply(&mut self, fix: &Fix, now: Instant) {
        self.previous = Some(self.position);
        self.position = fix.position;
        if fix.speed.is_some() {
            self.speed = fix.speed;
        }

        self.trail.push_back(fix.position);
        while self.trail.len() > self.trail_length {
            self.trail.pop_front();
        }

        self.sightings += 1;
        self.updated_at = now;
    }

    /// Returns the maximum trail length.
    pub fn trail_length(&self) -> usize {
        self.trail_length
    }
}

/// Computes the stable track identifier `<api>_<source_id>`.
///
/// Identical source identifiers from the same API always map to the same
/// track, so repeated fetches update one entry instead of adding another.
pub fn compute_track_id(api: &str, source_id: &str) -> String {
    format!("{}_{}", api, source_id)
}

/// Renders a GeoJSON feature id as text.
pub fn id_to_string(id: &Id) -> String {
    match id {
        Id::String(s) => s.clone(),
        Id::Number(n) => n.to_string(),
    }
}

fn json_to_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
