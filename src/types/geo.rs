//! Geographic primitives: coordinates and bounding boxes.
//!
//! All values are EPSG:4326 degrees. A [`Bbox`] is what the feature
//! services accept as the `bbox` query parameter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MapError;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    /// Creates a new coordinate.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Linearly interpolates between `self` and `other`.
    ///
    /// `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(&self, other: &LonLat, t: f64) -> LonLat {
        LonLat {
            lon: self.lon + t * (other.lon - self.lon),
            lat: self.lat + t * (other.lat - self.lat),
        }
    }

    /// Reads a GeoJSON position (`[lon, lat, ...]`).
    ///
    /// Returns None for positions with fewer than two values.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] => Some(Self::new(*lon, *lat)),
            _ => None,
        }
    }

    /// Returns the coordinate as a GeoJSON position.
    pub fn to_position(&self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}

impl FromStr for LonLat {
    type Err = MapError;

    /// Parses `lon,lat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = parse_numbers(s, 2).map_err(|reason| {
            MapError::invalid_config(format!("Invalid coordinate '{}': {}", s, reason))
        })?;
        Ok(Self::new(values[0], values[1]))
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lon, self.lat)
    }
}

/// A rectangular geographic extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bbox {
    /// Creates a bbox, rejecting non-finite or inverted extents.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> crate::Result<Self> {
        let bbox = Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        };
        if let Some(reason) = bbox.validate() {
            return Err(MapError::invalid_bbox(&bbox.to_string(), reason));
        }
        Ok(bbox)
    }

    /// Creates the smallest bbox containing two corners, in any order.
    pub fn from_corners(a: LonLat, b: LonLat) -> Self {
        Self {
            min_lon: a.lon.min(b.lon),
            min_lat: a.lat.min(b.lat),
            max_lon: a.lon.max(b.lon),
            max_lat: a.lat.max(b.lat),
        }
    }

    /// Validates the extent.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        let values = [self.min_lon, self.min_lat, self.max_lon, self.max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Some("values must be finite".to_string());
        }
        if self.min_lon > self.max_lon {
            return Some(format!(
                "min_lon ({}) is greater than max_lon ({})",
                self.min_lon, self.max_lon
            ));
        }
        if self.min_lat > self.max_lat {
            return Some(format!(
                "min_lat ({}) is greater than max_lat ({})",
                self.min_lat, self.max_lat
            ));
        }
        None
    }

    /// Grows the bbox to include `point`.
    pub fn extend(&mut self, point: LonLat) {
        self.min_lon = self.min_lon.min(point.lon);
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lon = self.max_lon.max(point.lon);
        self.max_lat = self.max_lat.max(point.lat);
    }

    /// Returns the smallest bbox containing both extents.
    pub fn union(&self, other: &Bbox) -> Bbox {
        Bbox {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Returns true if `point` lies inside or on the edge of the bbox.
    pub fn contains(&self, point: LonLat) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }

    /// Returns the value for the `bbox` query parameter.
    pub fn to_query_value(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Bbox {
    type Err = MapError;

    /// Parses `min_lon,min_lat,max_lon,max_lat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = parse_numbers(s, 4).map_err(|reason| MapError::invalid_bbox(s, reason))?;
        Bbox::new(values[0], values[1], values[2], values[3])
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Parses exactly `count` comma-separated floats.
fn parse_numbers(s: &str, count: usize) -> Result<Vec<f64>, String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("not a number: {}", e))?;

    if values.len() != count {
        return Err(format!("expected {} values, got {}", count, values.len()));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn bbox_parse_and_format() {
        let bbox: Bbox = "24.93,60.16,24.96,60.18".parse().unwrap();
        assert_eq!(bbox.min_lon, 24.93);
        assert_eq!(bbox.max_lat, 60.18);
        assert_eq!(bbox.to_query_value(), "24.93,60.16,24.96,60.18");
    }

    #[test]
    fn bbox_rejects_wrong_arity() {
        let err = "1,2,3".parse::<Bbox>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBbox);
        assert!(err.message.contains("expected 4 values"));
    }

    #[test]
    fn bbox_rejects_inverted_extent() {
        let err = "25,60,24,61".parse::<Bbox>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBbox);
    }

    #[test]
    fn bbox_rejects_garbage() {
        assert!("a,b,c,d".parse::<Bbox>().is_err());
        assert!(Bbox::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn bbox_from_corners_orders_values() {
        let bbox = Bbox::from_corners(LonLat::new(25.0, 61.0), LonLat::new(24.0, 60.0));
        assert_eq!(bbox.to_string(), "24,60,25,61");
        assert!(bbox.contains(LonLat::new(24.5, 60.5)));
        assert!(!bbox.contains(LonLat::new(26.0, 60.5)));
    }

    #[test]
    fn lerp_endpoints() {
        let p = LonLat::new(24.0, 60.0);
        let q = LonLat::new(25.0, 61.0);
        assert_eq!(p.lerp(&q, 0.0), p);
        assert_eq!(p.lerp(&q, 1.0), q);
        assert_eq!(p.lerp(&q, 0.5), LonLat::new(24.5, 60.5));
    }

    #[test]
    fn lonlat_from_position() {
        assert_eq!(
            LonLat::from_position(&[24.9, 60.2, 12.0]),
            Some(LonLat::new(24.9, 60.2))
        );
        assert_eq!(LonLat::from_position(&[24.9]), None);
    }

    #[test]
    fn lonlat_parse() {
        let p: LonLat = "24.94, 60.17".parse().unwrap();
        assert_eq!(p, LonLat::new(24.94, 60.17));
    }
}
