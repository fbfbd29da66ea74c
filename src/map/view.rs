//! Viewport geometry on a Web Mercator (EPSG:3857) map.
//!
//! Converts between screen pixels, projected meters and EPSG:4326 degrees so
//! a viewport can be turned into a request bbox and a click into a coordinate.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::types::{Bbox, LonLat};

/// WGS84 semi-major axis used by spherical Web Mercator.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Meters per pixel at zoom 0 for 256 px tiles.
pub const ZOOM0_RESOLUTION: f64 = 2.0 * PI * EARTH_RADIUS_M / 256.0;

/// Latitude limit of Web Mercator.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Projects degrees to Web Mercator meters.
pub fn to_mercator(point: LonLat) -> (f64, f64) {
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS_M * point.lon.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Unprojects Web Mercator meters to degrees.
pub fn from_mercator(x: f64, y: f64) -> LonLat {
    let lon = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    LonLat::new(lon, lat)
}

/// What the map currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Map center.
    pub center: LonLat,
    /// Zoom level, fractional values allowed.
    pub zoom: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    pub fn new(center: LonLat, zoom: f64, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    /// Meters per pixel at this zoom.
    pub fn resolution(&self) -> f64 {
        ZOOM0_RESOLUTION / 2f64.powf(self.zoom)
    }

    /// Visible extent in degrees.
    pub fn bbox(&self) -> Bbox {
        let top_left = self.pixel_to_lonlat(0.0, 0.0);
        let bottom_right = self.pixel_to_lonlat(self.width as f64, self.height as f64);
        Bbox::from_corners(top_left, bottom_right)
    }

    /// Converts a pixel (origin top-left, y down) to degrees.
    pub fn pixel_to_lonlat(&self, px: f64, py: f64) -> LonLat {
        let (cx, cy) = to_mercator(self.center);
        let res = self.resolution();
        let x = cx + (px - self.width as f64 / 2.0) * res;
        let y = cy - (py - self.height as f64 / 2.0) * res;
        from_mercator(x, y)
    }

    /// Converts degrees to a pixel position (may fall outside the viewport).
    pub fn lonlat_to_pixel(&self, point: LonLat) -> (f64, f64) {
        let (cx, cy) = to_mercator(self.center);
        let (x, y) = to_mercator(point);
        let res = self.resolution();
        let px = (x - cx) / res + self.width as f64 / 2.0;
        let py = (cy - y) / res + self.height as f64 / 2.0;
        (px, py)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn mercator_round_trip() {
        let helsinki = LonLat::new(24.9384, 60.1699);
        let (x, y) = to_mercator(helsinki);
        let back = from_mercator(x, y);
        assert!(close(back.lon, helsinki.lon, 1e-9));
        assert!(close(back.lat, helsinki.lat, 1e-9));
    }

    #[test]
    fn mercator_origin() {
        let (x, y) = to_mercator(LonLat::new(0.0, 0.0));
        assert!(close(x, 0.0, 1e-9));
        assert!(close(y, 0.0, 1e-9));
    }

    #[test]
    fn resolution_halves_per_zoom() {
        let v14 = Viewport::new(LonLat::new(0.0, 0.0), 14.0, 256, 256);
        let v15 = Viewport::new(LonLat::new(0.0, 0.0), 15.0, 256, 256);
        assert!(close(v14.resolution(), 2.0 * v15.resolution(), 1e-9));
        assert!(close(
            Viewport::new(LonLat::new(0.0, 0.0), 0.0, 256, 256).resolution(),
            156_543.033_928_040_97,
            1e-6
        ));
    }

    #[test]
    fn center_pixel_is_center() {
        let center = LonLat::new(24.9384, 60.1699);
        let view = Viewport::new(center, 15.0, 800, 600);
        let p = view.pixel_to_lonlat(400.0, 300.0);
        assert!(close(p.lon, center.lon, 1e-9));
        assert!(close(p.lat, center.lat, 1e-9));

        let (px, py) = view.lonlat_to_pixel(center);
        assert!(close(px, 400.0, 1e-6));
        assert!(close(py, 300.0, 1e-6));
    }

    #[test]
    fn bbox_contains_center() {
        let center = LonLat::new(24.9384, 60.1699);
        let view = Viewport::new(center, 14.0, 1024, 768);
        let bbox = view.bbox();
        assert!(bbox.validate().is_none());
        assert!(bbox.contains(center));
        assert!(bbox.min_lon < center.lon && center.lon < bbox.max_lon);
    }

    #[test]
    fn pixel_y_grows_southwards() {
        let view = Viewport::new(LonLat::new(24.9, 60.2), 14.0, 100, 100);
        let north = view.pixel_to_lonlat(50.0, 0.0);
        let south = view.pixel_to_lonlat(50.0, 100.0);
        assert!(north.lat > south.lat);
    }
}
