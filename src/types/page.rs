//! FeaturePage type for one response of a paginated feature service.
//!
//! A page is a GeoJSON feature collection plus the OGC API Features
//! pagination members (`links`, `numberMatched`, `numberReturned`).

use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// Link relation that points at the following page.
pub const NEXT_REL: &str = "next";

/// A hypermedia link attached to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL, absolute or relative to the page URL.
    pub href: String,

    /// Link relation, e.g. "next", "self", "alternate".
    #[serde(default)]
    pub rel: String,

    /// Media type of the target.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// Creates a link with the given relation.
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            media_type: None,
            title: None,
        }
    }
}

/// One page of features returned by a feature service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturePage {
    /// Features on this page, in document order.
    pub features: Vec<Feature>,

    /// Pagination and alternate-format links.
    #[serde(default)]
    pub links: Vec<Link>,

    /// Total number of features matching the query, if reported.
    #[serde(
        rename = "numberMatched",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub number_matched: Option<u64>,

    /// Number of features on this page, if reported.
    #[serde(
        rename = "numberReturned",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub number_returned: Option<u64>,
}

impl FeaturePage {
    /// Creates a page from features with no links.
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            ..Default::default()
        }
    }

    /// Adds a link, returning the page.
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Parses a page from a JSON document.
    ///
    /// The document must be an object with a `features` array. The
    /// `type` member is not checked since some services omit it.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(MapError::invalid_response("document is not a JSON object"));
        }
        if value.get("features").map_or(true, |f| !f.is_array()) {
            return Err(MapError::invalid_response("missing 'features' array"));
        }
        serde_json::from_value(value).map_err(|e| MapError::invalid_response(e.to_string()))
    }

    /// Parses a page from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| MapError::invalid_response(e.to_string()))?;
        Self::from_json(value)
    }

    /// Returns the href of the first `next` link, if any.
    pub fn next_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == NEXT_REL)
            .map(|link| link.href.as_str())
    }

    /// Returns the number of features on this page.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if the page holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Consumes the page, returning a plain feature collection.
    pub fn into_feature_collection(self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features,
            foreign_members: None,
        }
    }
}
