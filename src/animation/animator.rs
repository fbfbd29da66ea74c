//! Registry of running flashes.
//!
//! The render tick draws every running flash and drops the ones that have
//! finished, so once all tracks are quiet the animator goes idle and the
//! caller can stop redrawing.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::types::TrackedFeature;

use super::canvas::Canvas;
use super::flash::{Flash, DEFAULT_FLASH_DURATION};

/// Running flashes, keyed by track_id.
#[derive(Debug)]
pub struct Animator {
    flashes: BTreeMap<String, Flash>,
    duration: Duration,
}

impl Animator {
    /// Creates an animator whose flashes last `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            flashes: BTreeMap::new(),
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Starts a flash for a track that has just moved.
    ///
    /// A running flash for the same track is replaced. Returns false when the
    /// track has no previous position to animate from.
    pub fn trigger(&mut self, track: &TrackedFeature, now: Instant) -> bool {
        let Some(flash) = Flash::new(track, now, self.duration) else {
            return false;
        };
        if self.flashes.insert(track.track_id.clone(), flash).is_some() {
            tracing::trace!(track_id = %track.track_id, "restarting flash");
        }
        true
    }

    /// Draws every running flash and unregisters finished ones.
    ///
    /// Returns the number of flashes drawn.
    pub fn render<C: Canvas + ?Sized>(&mut self, now: Instant, canvas: &mut C) -> usize {
        let mut drawn = 0;
        self.flashes.retain(|_, flash| match flash.frame(now) {
            Some(frame) => {
                frame.draw(&mut *canvas);
                drawn += 1;
                true
            }
            None => false,
        });
        drawn
    }

    /// Returns true if the track has a running flash.
    pub fn is_animating(&self, track_id: &str) -> bool {
        self.flashes.contains_key(track_id)
    }

    /// Stops a track's flash.
    pub fn cancel(&mut self, track_id: &str) -> bool {
        self.flashes.remove(track_id).is_some()
    }

    /// Number of registered flashes.
    pub fn len(&self) -> usize {
        self.flashes.len()
    }

    /// Returns true when nothing is left to draw.
    pub fn is_idle(&self) -> bool {
        self.flashes.is_empty()
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DEFAULT_FLASH_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::canvas::{FrameRecorder, Shape};
    use crate::types::{Fix, LonLat};

    fn track(id: &str, now: Instant, positions: &[(f64, f64)]) -> TrackedFeature {
        let (lon, lat) = positions[0];
        let mut track = TrackedFeature::from_first_fix(&Fix::new(id, LonLat::new(lon, lat)), 5, now);
        for &(lon, lat) in &positions[1..] {
            track.apply(&Fix::new(id, LonLat::new(lon, lat)), now);
        }
        track
    }

    #[test]
    fn new_animator_is_idle() {
        let animator = Animator::default();
        assert!(animator.is_idle());
        assert_eq!(animator.duration(), DEFAULT_FLASH_DURATION);
    }

    #[test]
    fn first_sighting_does_not_animate() {
        let now = Instant::now();
        let mut animator = Animator::default();
        assert!(!animator.trigger(&track("rata_1", now, &[(24.0, 60.0)]), now));
        assert!(animator.is_idle());
    }

    #[test]
    fn flash_unregisters_after_duration() {
        let now = Instant::now();
        let mut animator = Animator::new(Duration::from_millis(100));
        assert!(animator.trigger(&track("rata_1", now, &[(24.0, 60.0), (24.1, 60.1)]), now));

        let mut recorder = FrameRecorder::new();
        assert_eq!(animator.render(now + Duration::from_millis(50), &mut recorder), 1);
        assert!(animator.is_animating("rata_1"));
        assert_eq!(recorder.len(), 3);

        let mut recorder = FrameRecorder::new();
        assert_eq!(animator.render(now + Duration::from_millis(100), &mut recorder), 0);
        assert!(animator.is_idle());
        assert!(recorder.is_empty());
    }

    #[test]
    fn retrigger_restarts_from_new_previous() {
        let now = Instant::now();
        let mut animator = Animator::new(Duration::from_millis(100));
        animator.trigger(&track("rata_1", now, &[(24.0, 60.0), (24.1, 60.1)]), now);

        let later = now + Duration::from_millis(80);
        let moved = track("rata_1", later, &[(24.0, 60.0), (24.1, 60.1), (24.2, 60.2)]);
        animator.trigger(&moved, later);
        assert_eq!(animator.len(), 1);

        let mut recorder = FrameRecorder::new();
        assert_eq!(animator.render(later, &mut recorder), 1);
        match &recorder.shapes()[1] {
            Shape::Point { position, .. } => assert_eq!(*position, LonLat::new(24.1, 60.1)),
            other => panic!("expected point, got {:?}", other),
        }
        assert_eq!(animator.render(now + Duration::from_millis(150), &mut recorder), 1);
    }

    #[test]
    fn flashes_draw_in_track_order() {
        let now = Instant::now();
        let mut animator = Animator::default();
        animator.trigger(&track("rata_2", now, &[(24.0, 60.0), (24.1, 60.1)]), now);
        animator.trigger(&track("rata_1", now, &[(25.0, 61.0), (25.1, 61.1)]), now);

        let mut recorder = FrameRecorder::new();
        assert_eq!(animator.render(now, &mut recorder), 2);
        assert_eq!(recorder.shapes()[0].track_id(), "rata_1");
        assert_eq!(recorder.shapes()[3].track_id(), "rata_2");
    }

    #[test]
    fn cancel_stops_flash() {
        let now = Instant::now();
        let mut animator = Animator::default();
        animator.trigger(&track("rata_1", now, &[(24.0, 60.0), (24.1, 60.1)]), now);
        assert!(animator.cancel("rata_1"));
        assert!(!animator.cancel("rata_1"));
        assert!(animator.is_idle());
    }
}
