//! Cubic easing functions over `t` in `[0, 1]`.
//!
//! Inputs outside the unit interval are clamped.

/// Starts slow and speeds up: `t^3`.
pub fn ease_in(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t
}

/// Starts fast and slows down: `1 - (1 - t)^3`.
pub fn ease_out(t: f64) -> f64 {
    1.0 - ease_in(1.0 - t)
}
