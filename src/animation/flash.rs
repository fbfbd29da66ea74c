//! The flash effect shown when a tracked object reports a new position.
//!
//! For the length of the flash the marker glides from the previous fix to
//! the new one while a ring grows around it and fades out.

use std::time::{Duration, Instant};

use crate::types::{LonLat, TrackedFeature};

use super::canvas::Canvas;
use super::easing::ease_out;

/// Default flash length.
pub const DEFAULT_FLASH_DURATION: Duration = Duration::from_millis(3000);

/// Ring radius at the start of a flash, in pixels.
pub const BASE_RADIUS_PX: f64 = 5.0;

/// How much the ring grows over a flash, in pixels.
pub const RADIUS_GROWTH_PX: f64 = 25.0;

/// A running flash for one track.
#[derive(Debug, Clone)]
pub struct Flash {
    track_id: String,
    started: Instant,
    duration: Duration,
    from: LonLat,
    to: LonLat,
    /// Trail at trigger time, newest last.
    trail: Vec<LonLat>,
    speed: Option<f64>,
}

/// What a flash looks like at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashFrame {
    pub track_id: String,
    /// Progress in `[0, 1)`.
    pub t: f64,
    pub position: LonLat,
    pub radius_px: f64,
    pub opacity: f64,
    /// Trail without its newest entry, ending at `position`.
    pub trail: Vec<LonLat>,
    pub speed: Option<f64>,
}

impl Flash {
    /// Starts a flash for a track that has just moved.
    ///
    /// Returns None for a track seen only once, since there is nothing to
    /// interpolate from.
    pub fn new(track: &TrackedFeature, started: Instant, duration: Duration) -> Option<Self> {
        let from = track.previous?;
        Some(Self {
            track_id: track.track_id.clone(),
            started,
            duration,
            from,
            to: track.position,
            trail: track.trail.iter().copied().collect(),
            speed: track.speed,
        })
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Progress at `now`, or None once the flash is over.
    pub fn progress(&self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration {
            return None;
        }
        Some(elapsed.as_secs_f64() / self.duration.as_secs_f64())
    }

    /// Returns true once the flash has run its full duration.
    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now).is_none()
    }

    /// Position at progress `t`: `from` at 0, `to` at 1.
    pub fn position_at(&self, t: f64) -> LonLat {
        self.from.lerp(&self.to, t)
    }

    /// Computes the frame at `now`.
    pub fn frame(&self, now: Instant) -> Option<FlashFrame> {
        let t = self.progress(now)?;
        let position = self.position_at(t);

        let mut trail: Vec<LonLat> = self.trail.iter().copied().collect();
        trail.pop();
        trail.push(position);

        Some(FlashFrame {
            track_id: self.track_id.clone(),
            t,
            position,
            radius_px: BASE_RADIUS_PX + RADIUS_GROWTH_PX * ease_out(t),
            opacity: ease_out(1.0 - t),
            trail,
            speed: self.speed,
        })
    }
}

impl FlashFrame {
    /// Draws the ring, the marker and the trail, in that order.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.ring(&self.track_id, self.position, self.radius_px, self.opacity);
        canvas.point(&self.track_id, self.position, self.speed);
        if self.trail.len() >= 2 {
            canvas.line(&self.track_id, &self.trail);
        }
    }
}
