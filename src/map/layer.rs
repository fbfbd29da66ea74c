//! In-memory feature layer.
//!
//! Holds the features currently drawn for a viewport, in draw order. The
//! most recently added feature is drawn on top.

use std::collections::HashMap;

use geo::BoundingRect;
use geojson::{Feature, FeatureCollection};

use crate::types::{id_to_string, Bbox};

/// Ordered, id-keyed feature store.
#[derive(Debug, Default)]
pub struct FeatureSource {
    /// Features in draw order.
    features: Vec<Feature>,
    /// Position in `features` by id.
    index: HashMap<String, usize>,
}

impl FeatureSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature.
    ///
    /// A feature whose id is already present is ignored and the first one
    /// stays. Features without an id are always appended.
    ///
    /// Returns true if the feature was added.
    pub fn add_feature(&mut self, feature: Feature) -> bool {
        let Some(id) = feature.id.as_ref().map(id_to_string) else {
            self.features.push(feature);
            return true;
        };

        if self.index.contains_key(&id) {
            tracing::trace!(%id, "feature id already present, keeping the first");
            return false;
        }

        self.index.insert(id, self.features.len());
        self.features.push(feature);
        true
    }

    /// Adds several features, returning how many were new.
    pub fn add_features(&mut self, features: impl IntoIterator<Item = Feature>) -> usize {
        features
            .into_iter()
            .map(|feature| self.add_feature(feature))
            .filter(|added| *added)
            .count()
    }

    /// Returns the feature with the given id.
    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.index.get(id).map(|&position| &self.features[position])
    }

    /// Checks if a feature id exists in the source.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates features in draw order (bottom first).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Feature> {
        self.features.iter()
    }

    /// Iterates features topmost first.
    pub fn iter_topmost(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().rev()
    }

    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if the source is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Removes all features.
    pub fn clear(&mut self) {
        self.features.clear();
        self.index.clear();
    }

    /// Returns the extent of all geometries, or None when nothing has one.
    pub fn extent(&self) -> Option<Bbox> {
        self.features
            .iter()
            .filter_map(feature_bbox)
            .reduce(|acc, bbox| acc.union(&bbox))
    }

    /// Returns a copy of the features as a feature collection.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.clone(),
            foreign_members: None,
        }
    }
}

/// Returns the extent of a feature's geometry.
pub fn feature_bbox(feature: &Feature) -> Option<Bbox> {
    let geometry = feature.geometry.as_ref()?;
    let geometry: geo::Geometry<f64> = geometry.value.clone().try_into().ok()?;
    let rect = geometry.bounding_rect()?;
    Some(Bbox {
        min_lon: rect.min().x,
        min_lat: rect.min().y,
        max_lon: rect.max().x,
        max_lat: rect.max().y,
    })
}
