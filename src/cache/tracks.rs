//! Tracked-feature cache with LRU eviction.
//!
//! Holds the latest state of every moving object seen by a feed, keyed by
//! track_id. Bounded by capacity and optionally pruned by age, so an
//! endlessly polled feed cannot grow it without limit.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::TrackedFeature;

/// Maximum number of tracks to keep in cache.
const DEFAULT_MAX_ENTRIES: usize = 5000;

/// Tracked-feature cache with LRU eviction policy.
#[derive(Debug)]
pub struct TrackCache {
    /// Tracks indexed by track_id.
    tracks: HashMap<String, CacheEntry>,
    /// Maximum number of entries to keep.
    max_entries: usize,
}

/// A cached track with access timestamp.
#[derive(Debug)]
struct CacheEntry {
    track: TrackedFeature,
    last_accessed: Instant,
}

impl TrackCache {
    /// Creates a new cache with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Creates a new cache with specified capacity (at least one entry).
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            tracks: HashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Returns the capacity.
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Returns a track by ID, updating its access time.
    pub fn get(&mut self, track_id: &str) -> Option<&TrackedFeature> {
        self.get_mut(track_id).map(|track| &*track)
    }

    /// Returns a mutable track by ID, updating its access time.
    pub fn get_mut(&mut self, track_id: &str) -> Option<&mut TrackedFeature> {
        let entry = self.tracks.get_mut(track_id)?;
        entry.last_accessed = Instant::now();
        Some(&mut entry.track)
    }

    /// Returns a track by ID without touching its access time.
    pub fn peek(&self, track_id: &str) -> Option<&TrackedFeature> {
        self.tracks.get(track_id).map(|entry| &entry.track)
    }

    /// Inserts a track into the cache.
    ///
    /// If the cache is full, the least recently used entry is evicted first
    /// and returned.
    pub fn put(&mut self, track: TrackedFeature) -> Option<TrackedFeature> {
        let evicted = if self.tracks.len() >= self.max_entries
            && !self.tracks.contains_key(&track.track_id)
        {
            self.evict_lru()
        } else {
            None
        };

        self.tracks.insert(
            track.track_id.clone(),
            CacheEntry {
                track,
                last_accessed: Instant::now(),
            },
        );
        evicted
    }

    /// Checks if a track ID exists in the cache.
    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.contains_key(track_id)
    }

    /// Returns the number of tracks in the cache.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Iterates over cached tracks in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedFeature> {
        self.tracks.values().map(|entry| &entry.track)
    }

    /// Evicts the least recently used entry.
    ///
    /// Returns the evicted track if any.
    pub fn evict_lru(&mut self) -> Option<TrackedFeature> {
        let oldest_key = self
            .tracks
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(k, _)| k.clone())?;

        self.tracks.remove(&oldest_key).map(|entry| entry.track)
    }

    /// Removes tracks not updated within `max_age` of `now`.
    ///
    /// Returns the removed track IDs.
    pub fn prune_stale(&mut self, max_age: Duration, now: Instant) -> Vec<String> {
        let stale: Vec<String> = self
            .tracks
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.track.updated_at) > max_age)
            .map(|(k, _)| k.clone())
            .collect();

        for key in &stale {
            self.tracks.remove(key);
        }
        stale
    }

    /// Removes a specific track from the cache.
    pub fn remove(&mut self, track_id: &str) -> Option<TrackedFeature> {
        self.tracks.remove(track_id).map(|entry| entry.track)
    }

    /// Clears all entries from the cache.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

impl Default for TrackCache {
    fn default() -> Self {
        Self::new()
    }
}
