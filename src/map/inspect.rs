//! Click inspection of the feature layer.
//!
//! Finds the features drawn under a pixel and renders their attributes as
//! pretty-printed JSON for an info panel.

use geo::{Coord, EuclideanDistance, MapCoords, Point};
use geojson::Feature;

use crate::types::LonLat;

use super::layer::FeatureSource;
use super::view::Viewport;

/// Property removed from inspection output.
const GEOMETRY_KEY: &str = "geometry";

/// Returns the features under `pixel`, topmost first.
///
/// A feature is hit when its geometry, drawn in screen space, lies within
/// `tolerance` pixels of the click. Polygons are hit anywhere inside.
pub fn features_at_pixel<'a>(
    source: &'a FeatureSource,
    viewport: &Viewport,
    pixel: (f64, f64),
    tolerance: f64,
) -> Vec<&'a Feature> {
    let cursor = Point::new(pixel.0, pixel.1);
    source
        .iter_topmost()
        .filter(|feature| {
            pixel_distance(feature, viewport, &cursor).is_some_and(|d| d <= tolerance)
        })
        .collect()
}

/// Renders each feature's properties, minus geometry, as pretty JSON.
///
/// Every feature becomes one JSON object followed by a newline, keys in the
/// order the server sent them. No features yield an empty string.
pub fn describe_features<'a>(features: impl IntoIterator<Item = &'a Feature>) -> String {
    let mut out = String::new();
    for feature in features {
        let mut properties = feature.properties.clone().unwrap_or_default();
        properties.shift_remove(GEOMETRY_KEY);

        match serde_json::to_string_pretty(&properties) {
            Ok(text) => {
                out.push_str(&text);
                out.push('\n');
            }
            Err(e) => tracing::warn!("skipping feature with unprintable properties: {}", e),
        }
    }
    out
}

/// Describes the features under `pixel`.
pub fn inspect_at(
    source: &FeatureSource,
    viewport: &Viewport,
    pixel: (f64, f64),
    tolerance: f64,
) -> String {
    describe_features(features_at_pixel(source, viewport, pixel, tolerance))
}

/// Distance in pixels from `cursor` to the feature as drawn.
fn pixel_distance(feature: &Feature, viewport: &Viewport, cursor: &Point<f64>) -> Option<f64> {
    let geometry: geo::Geometry<f64> = feature.geometry.as_ref()?.value.clone().try_into().ok()?;
    let on_screen = geometry.map_coords(|c| {
        let (x, y) = viewport.lonlat_to_pixel(LonLat::new(c.x, c.y));
        Coord { x, y }
    });
    distance_to(cursor, &on_screen)
}

fn distance_to(cursor: &Point<f64>, geometry: &geo::Geometry<f64>) -> Option<f64> {
    use geo::Geometry;

    match geometry {
        Geometry::Point(p) => Some(cursor.euclidean_distance(p)),
        Geometry::Line(l) => Some(cursor.euclidean_distance(l)),
        Geometry::LineString(ls) => Some(cursor.euclidean_distance(ls)),
        Geometry::Polygon(poly) => Some(cursor.euclidean_distance(poly)),
        Geometry::MultiPoint(mp) => Some(cursor.euclidean_distance(mp)),
        Geometry::MultiLineString(mls) => Some(cursor.euclidean_distance(mls)),
        Geometry::MultiPolygon(mpoly) => Some(cursor.euclidean_distance(mpoly)),
        Geometry::Rect(rect) => Some(cursor.euclidean_distance(&rect.to_polygon())),
        Geometry::Triangle(tri) => Some(cursor.euclidean_distance(&tri.to_polygon())),
        Geometry::GeometryCollection(collection) => collection
            .iter()
            .filter_map(|g| distance_to(cursor, g))
            .min_by(|a, b| a.total_cmp(b)),
    }
}
