//! Moving-object layer: tracked state plus the flashes it triggers.

use std::time::{Duration, Instant};

use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};

use crate::animation::{Animator, Canvas};
use crate::cache::TrackCache;
use crate::config::TrainFeedConfig;
use crate::types::{Fix, TrackedFeature, SPEED_PROPERTY};

/// What ingesting a fix did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// First sighting; the track was created without animation.
    Created,
    /// Known track moved; a flash was started.
    Updated,
}

/// Counters for a batch of fixes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub created: usize,
    pub updated: usize,
    pub evicted: usize,
}

/// Tracked objects and their running animations.
#[derive(Debug)]
pub struct TrackLayer {
    cache: TrackCache,
    animator: Animator,
    trail_length: usize,
}

impl TrackLayer {
    pub fn new(trail_length: usize, max_tracks: usize, flash_duration: Duration) -> Self {
        Self {
            cache: TrackCache::with_capacity(max_tracks),
            animator: Animator::new(flash_duration),
            trail_length,
        }
    }

    pub fn from_config(config: &TrainFeedConfig) -> Self {
        Self::new(config.trail_length, config.max_tracks, config.flash_duration())
    }

    /// Applies one sighting.
    pub fn ingest(&mut self, fix: &Fix, now: Instant) -> Ingest {
        self.ingest_counted(fix, now).0
    }

    /// Applies a batch of sightings.
    pub fn ingest_all<'a>(&mut self, fixes: impl IntoIterator<Item = &'a Fix>, now: Instant) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for fix in fixes {
            let (outcome, evicted) = self.ingest_counted(fix, now);
            match outcome {
                Ingest::Created => summary.created += 1,
                Ingest::Updated => summary.updated += 1,
            }
            if evicted {
                summary.evicted += 1;
            }
        }
        summary
    }

    fn ingest_counted(&mut self, fix: &Fix, now: Instant) -> (Ingest, bool) {
        if let Some(track) = self.cache.get_mut(&fix.track_id) {
            track.apply(fix, now);
            self.animator.trigger(track, now);
            return (Ingest::Updated, false);
        }

        let track = TrackedFeature::from_first_fix(fix, self.trail_length, now);
        match self.cache.put(track) {
            Some(evicted) => {
                tracing::debug!(track_id = %evicted.track_id, "evicted least recently seen track");
                self.animator.cancel(&evicted.track_id);
                (Ingest::Created, true)
            }
            None => (Ingest::Created, false),
        }
    }

    /// Draws running flashes; finished ones unregister themselves.
    pub fn render<C: Canvas + ?Sized>(&mut self, now: Instant, canvas: &mut C) -> usize {
        self.animator.render(now, canvas)
    }

    /// Drops tracks not seen within `max_age`, returning how many went.
    pub fn prune(&mut self, max_age: Duration, now: Instant) -> usize {
        let removed = self.cache.prune_stale(max_age, now);
        for track_id in &removed {
            self.animator.cancel(track_id);
        }
        removed.len()
    }

    /// Returns a track without refreshing its LRU position.
    pub fn get(&self, track_id: &str) -> Option<&TrackedFeature> {
        self.cache.peek(track_id)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns true when no flash is running.
    pub fn is_idle(&self) -> bool {
        self.animator.is_idle()
    }

    pub fn is_animating(&self, track_id: &str) -> bool {
        self.animator.is_animating(track_id)
    }

    /// Current positions as point features, sorted by track id.
    pub fn snapshot(&self) -> FeatureCollection {
        let mut tracks: Vec<&TrackedFeature> = self.cache.iter().collect();
        tracks.sort_by(|a, b| a.track_id.cmp(&b.track_id));

        let features = tracks
            .into_iter()
            .map(|track| {
                let mut properties = JsonObject::new();
                properties.insert("sightings".into(), track.sightings.into());
                if let Some(speed) = track.speed {
                    properties.insert(SPEED_PROPERTY.into(), speed.into());
                }
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(track.position.to_position()))),
                    id: Some(Id::String(track.track_id.clone())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
