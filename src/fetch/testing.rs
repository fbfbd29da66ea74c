//! In-memory page source for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use geojson::{feature::Id, Feature, Geometry, Value};
use url::Url;

use crate::error::{MapError, Result};
use crate::types::{FeaturePage, Link};

use super::source::PageSource;

/// Endpoint used by mock pages.
pub const BASE: &str = "https://features.example.com/api";

/// Serves a chain of pages selected by the `page` query parameter.
///
/// URLs without a `page` parameter get page 1. Page `k` links to page `k + 1`
/// until the last page. Every requested URL is recorded.
pub struct MockPageSource {
    pages: usize,
    failing_at: Option<usize>,
    looping: bool,
    delay: Option<Duration>,
    features_per_page: usize,
    next_href: Option<String>,
    requests: Mutex<Vec<Url>>,
}

impl MockPageSource {
    /// A chain of `pages` pages with one feature each.
    pub fn chain(pages: usize) -> Self {
        Self {
            pages,
            failing_at: None,
            looping: false,
            delay: None,
            features_per_page: 1,
            next_href: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Two pages whose next links point at each other.
    pub fn looping() -> Self {
        Self {
            looping: true,
            ..Self::chain(2)
        }
    }

    /// Makes page `page` fail with an HTTP error.
    pub fn failing_at(mut self, page: usize) -> Self {
        self.failing_at = Some(page);
        self
    }

    /// Delays every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the number of features per page.
    pub fn with_features_per_page(mut self, count: usize) -> Self {
        self.features_per_page = count;
        self
    }

    /// Makes every page link to `href` verbatim instead of the next page.
    pub fn with_next_href(mut self, href: &str) -> Self {
        self.next_href = Some(href.to_string());
        self
    }

    /// Returns the URL serving page `page`.
    pub fn page_url(page: usize) -> Url {
        Url::parse(&format!("{}/collections/roads/items?page={}", BASE, page)).unwrap()
    }

    /// Returns the URLs requested so far.
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }

    fn page_number(url: &Url) -> usize {
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(1)
    }

    fn build_page(&self, url: &Url, number: usize) -> FeaturePage {
        let collection = url
            .path_segments()
            .and_then(|segments| segments.rev().nth(1).map(str::to_string))
            .unwrap_or_default();

        let features = (0..self.features_per_page)
            .map(|i| point_feature(&format!("{}-{}-{}", collection, number, i), 24.94, 60.17))
            .collect();

        let mut page = FeaturePage::new(features);
        page.number_returned = Some(number as u64);

        if let Some(href) = &self.next_href {
            page = page.with_link(Link::new("next", href));
        } else if self.looping {
            let target = if number == 1 { 2 } else { 1 };
            page = page.with_link(Link::new("next", Self::page_url(target).as_str()));
        } else if number < self.pages {
            let next = url_with_page(url, number + 1);
            page = page.with_link(Link::new("next", next.as_str()));
        }
        page
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn get_page(&self, url: &Url) -> Result<FeaturePage> {
        self.requests.lock().unwrap().push(url.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let number = Self::page_number(url);
        if self.failing_at == Some(number) {
            return Err(MapError::http_status(
                url.as_str(),
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        Ok(self.build_page(url, number))
    }
}

/// Builds a point feature with a string id and a `name` property.
pub fn point_feature(id: &str, lon: f64, lat: f64) -> Feature {
    let mut feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
        id: Some(Id::String(id.to_string())),
        properties: None,
        foreign_members: None,
    };
    feature.set_property("name", id);
    feature
}

/// Returns `url` with its `page` parameter set to `page`, other params dropped.
fn url_with_page(url: &Url, page: usize) -> Url {
    let mut next = url.clone();
    next.set_query(None);
    next.query_pairs_mut().append_pair("page", &page.to_string());
    next
}
