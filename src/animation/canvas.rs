//! Drawing surface for animation frames.
//!
//! Frames are drawn through the [`Canvas`] trait so rendering stays
//! independent of the output. [`FrameRecorder`] is the canvas used by the
//! CLI: it keeps the shapes and turns each frame into a GeoJSON collection.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;

use crate::types::LonLat;

/// Receives the shapes of one animation frame.
pub trait Canvas {
    /// A fading circle outline around `center`.
    fn ring(&mut self, track_id: &str, center: LonLat, radius_px: f64, opacity: f64);

    /// The marker of a moving object.
    fn point(&mut self, track_id: &str, position: LonLat, speed: Option<f64>);

    /// A trailing path, oldest position first.
    fn line(&mut self, track_id: &str, path: &[LonLat]);
}

/// One recorded shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Ring {
        track_id: String,
        center: LonLat,
        radius_px: f64,
        opacity: f64,
    },
    Point {
        track_id: String,
        position: LonLat,
        speed: Option<f64>,
    },
    Line {
        track_id: String,
        path: Vec<LonLat>,
    },
}

impl Shape {
    /// Returns the track the shape belongs to.
    pub fn track_id(&self) -> &str {
        match self {
            Shape::Ring { track_id, .. } | Shape::Point { track_id, .. } | Shape::Line { track_id, .. } => {
                track_id
            }
        }
    }

    /// Converts the shape to a feature with `kind` and `trackId` properties.
    pub fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        let value = match self {
            Shape::Ring {
                track_id,
                center,
                radius_px,
                opacity,
            } => {
                properties.insert("kind".into(), "ring".into());
                properties.insert("trackId".into(), track_id.as_str().into());
                properties.insert("radius".into(), (*radius_px).into());
                properties.insert("opacity".into(), (*opacity).into());
                Value::Point(center.to_position())
            }
            Shape::Point {
                track_id,
                position,
                speed,
            } => {
                properties.insert("kind".into(), "point".into());
                properties.insert("trackId".into(), track_id.as_str().into());
                if let Some(speed) = speed {
                    properties.insert("speed".into(), (*speed).into());
                }
                Value::Point(position.to_position())
            }
            Shape::Line { track_id, path } => {
                properties.insert("kind".into(), "line".into());
                properties.insert("trackId".into(), track_id.as_str().into());
                Value::LineString(path.iter().map(LonLat::to_position).collect())
            }
        };

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Canvas that records shapes until the frame is taken.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    shapes: Vec<Shape>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes drawn since the last take.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Returns the recorded frame as a feature collection and starts a new one.
    pub fn take_frame(&mut self) -> FeatureCollection {
        let features = self.shapes.drain(..).map(|shape| shape.to_feature()).collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

impl Canvas for FrameRecorder {
    fn ring(&mut self, track_id: &str, center: LonLat, radius_px: f64, opacity: f64) {
        self.shapes.push(Shape::Ring {
            track_id: track_id.to_string(),
            center,
            radius_px,
            opacity,
        });
    }

    fn point(&mut self, track_id: &str, position: LonLat, speed: Option<f64>) {
        self.shapes.push(Shape::Point {
            track_id: track_id.to_string(),
            position,
            speed,
        });
    }

    fn line(&mut self, track_id: &str, path: &[LonLat]) {
        self.shapes.push(Shape::Line {
            track_id: track_id.to_string(),
            path: path.to_vec(),
        });
    }
}
