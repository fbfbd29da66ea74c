//! Page sources: where feature pages come from.
//!
//! [`PageSource`] is the seam between pagination and transport. The HTTP
//! implementation talks to OGC API Features style services with `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use url::Url;

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::types::{Bbox, FeaturePage};

/// Media types accepted from feature services.
const ACCEPT_GEOJSON: &str = "application/geo+json, application/json;q=0.9";

/// Fetches a single page of features.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches and parses the page at `url`.
    async fn get_page(&self, url: &Url) -> Result<FeaturePage>;
}

/// Query parameters for the first request of a traversal.
///
/// Follow-up requests use the server's `next` href verbatim, which already
/// carries whatever paging state the server needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureQuery {
    /// Restrict results to this extent.
    pub bbox: Option<Bbox>,

    /// Page size.
    pub limit: Option<u32>,

    /// Additional service-specific parameters.
    pub extra: Vec<(String, String)>,
}

impl FeatureQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bbox, returning the query.
    pub fn with_bbox(mut self, bbox: Bbox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Sets the page size, returning the query.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds a service-specific parameter, returning the query.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Returns the query as ordered key/value pairs.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.extra.len() + 2);
        if let Some(bbox) = &self.bbox {
            pairs.push(("bbox".to_string(), bbox.to_query_value()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs.extend(self.extra.iter().cloned());
        pairs
    }

    /// Appends the query to `url`.
    pub fn apply_to(&self, url: &mut Url) {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return;
        }
        let mut query = url.query_pairs_mut();
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
    }
}

/// Returns `<endpoint>/collections/<feat_type>/items`.
pub fn collection_items_url(endpoint: &str, feat_type: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| MapError::invalid_config(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

    url.path_segments_mut()
        .map_err(|_| {
            MapError::invalid_config(format!("Endpoint '{}' cannot have a path", endpoint))
        })?
        .pop_if_empty()
        .extend(["collections", feat_type, "items"]);

    Ok(url)
}

/// Resolves a `next` href against the URL of the page that carried it.
pub fn resolve_href(base: &Url, href: &str) -> Result<Url> {
    base.join(href)
        .map_err(|e| MapError::invalid_response(format!("invalid next link '{}': {}", href, e)))
}

/// Page source backed by an HTTP client.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    /// Creates a source with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GEOJSON));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                MapError::with_source(
                    crate::error::ErrorCode::InvalidConfig,
                    format!("Failed to create HTTP client: {}", e),
                    e,
                )
            })?;

        Ok(Self { client })
    }

    /// Creates a source from the runtime configuration.
    pub fn from_config(config: &MapConfig) -> Result<Self> {
        Self::new(config.request_timeout(), &config.user_agent)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get_page(&self, url: &Url) -> Result<FeaturePage> {
        tracing::debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MapError::request_failed(url.as_str(), e))?;

        if !response.status().is_success() {
            return Err(MapError::http_status(url.as_str(), response.status()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MapError::invalid_response(format!("{}: {}", url, e)))?;

        FeaturePage::from_json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_url_appends_collection_path() {
        let url = collection_items_url(
            "https://beta-paikkatieto.maanmittauslaitos.fi/kiinteisto-avoin/simple-features/v1",
            "RajamerkinSijaintitiedot",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://beta-paikkatieto.maanmittauslaitos.fi/kiinteisto-avoin/simple-features/v1/collections/RajamerkinSijaintitiedot/items"
        );
    }

    #[test]
    fn items_url_handles_trailing_slash() {
        let url = collection_items_url("https://example.com/api/", "roads").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/collections/roads/items");
    }

    #[test]
    fn items_url_rejects_garbage() {
        assert!(collection_items_url("not a url", "roads").is_err());
    }

    #[test]
    fn query_pairs_order() {
        let bbox: Bbox = "24.9,60.1,25,60.2".parse().unwrap();
        let query = FeatureQuery::new()
            .with_bbox(bbox)
            .with_limit(500)
            .with_param("crs", "http://www.opengis.net/def/crs/OGC/1.3/CRS84");
        let pairs = query.pairs();
        assert_eq!(pairs[0], ("bbox".to_string(), "24.9,60.1,25,60.2".to_string()));
        assert_eq!(pairs[1], ("limit".to_string(), "500".to_string()));
        assert_eq!(pairs[2].0, "crs");
    }

    #[test]
    fn query_is_appended_to_url() {
        let mut url = Url::parse("https://example.com/collections/roads/items").unwrap();
        FeatureQuery::new().with_limit(10).apply_to(&mut url);
        assert_eq!(url.query(), Some("limit=10"));
    }

    #[test]
    fn empty_query_leaves_url_untouched() {
        let mut url = Url::parse("https://example.com/items").unwrap();
        FeatureQuery::new().apply_to(&mut url);
        assert_eq!(url.as_str(), "https://example.com/items");
    }

    #[test]
    fn resolve_relative_href() {
        let base = Url::parse("https://example.com/collections/roads/items?limit=10").unwrap();
        let next = resolve_href(&base, "items?limit=10&offset=10").unwrap();
        assert_eq!(
            next.as_str(),
            "https://example.com/collections/roads/items?limit=10&offset=10"
        );

        let absolute = resolve_href(&base, "https://other.example.com/p2").unwrap();
        assert_eq!(absolute.host_str(), Some("other.example.com"));
    }

    #[test]
    fn http_source_builds() {
        assert!(HttpPageSource::new(Duration::from_secs(5), "mapfeed-test").is_ok());
    }
}
