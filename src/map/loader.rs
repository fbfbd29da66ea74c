//! Viewport-driven loading of the feature layer.
//!
//! Every time the map stops moving, the layer is cleared and, when zoomed
//! in far enough, refilled from all configured collections for the visible
//! bbox. A newer viewport cancels whatever the previous one still had in
//! flight, so stale pages never reach the layer.

use std::sync::Arc;

use futures::stream::{select_all, StreamExt};
use geojson::{feature::Id, Feature};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{CollectionConfig, MapConfig};
use crate::error::Result;
use crate::fetch::{collection_items_url, pages, FeatureQuery, PageSource};
use crate::types::id_to_string;

use super::layer::FeatureSource;
use super::view::Viewport;

/// Property naming the API a feature was loaded from.
pub const API_PROPERTY: &str = "api";

/// Result of handling one viewport change.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Zoomed out too far; the layer was cleared and nothing was requested.
    Skipped { zoom: f64, min_zoom: f64 },
    /// All collections were traversed (some may have failed).
    Loaded(LoadSummary),
    /// A newer viewport cancelled the load before every collection finished.
    Cancelled(LoadSummary),
}

/// Counters for one load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSummary {
    /// Pages received across all collections.
    pub pages: usize,
    /// Features added to the layer.
    pub features: usize,
    /// Collections whose traversal ended with an error, with the message.
    pub failures: Vec<(String, String)>,
}

/// Loads the feature layer for the current viewport.
pub struct ViewportLoader {
    source: Arc<dyn PageSource>,
    collections: Vec<CollectionConfig>,
    batch_size: u32,
    min_zoom: f64,
    layer: FeatureSource,
}

impl ViewportLoader {
    /// Creates a loader for the configured collections.
    pub fn new(source: Arc<dyn PageSource>, config: &MapConfig) -> Self {
        Self {
            source,
            collections: config.collections.clone(),
            batch_size: config.batch_size,
            min_zoom: config.min_zoom,
            layer: FeatureSource::new(),
        }
    }

    /// Returns the feature layer.
    pub fn layer(&self) -> &FeatureSource {
        &self.layer
    }

    /// Returns the configured collections.
    pub fn collections(&self) -> &[CollectionConfig] {
        &self.collections
    }

    /// Handles the end of a map move.
    pub async fn on_move_end(&mut self, viewport: &Viewport) -> Result<LoadOutcome> {
        self.load(viewport, CancellationToken::new()).await
    }

    /// Handles viewport changes until the channel closes.
    ///
    /// A viewport arriving while the previous one is still loading cancels
    /// that load; its requests stop and it ends as [`LoadOutcome::Cancelled`].
    /// Returns the number of loads that were not cancelled.
    pub async fn run(&mut self, mut moves: mpsc::Receiver<Viewport>) -> usize {
        let mut completed = 0;
        let mut pending = moves.recv().await;

        while let Some(viewport) = pending.take() {
            let token = CancellationToken::new();
            let load = self.load(&viewport, token.clone());
            tokio::pin!(load);

            let outcome = tokio::select! {
                outcome = &mut load => {
                    pending = moves.recv().await;
                    outcome
                }
                Some(next) = moves.recv() => {
                    tracing::debug!("viewport changed, cancelling in-flight load");
                    token.cancel();
                    pending = Some(next);
                    (&mut load).await
                }
            };

            match outcome {
                Ok(LoadOutcome::Cancelled(summary)) => {
                    tracing::debug!(pages = summary.pages, "viewport load cancelled");
                }
                Ok(outcome) => {
                    tracing::info!(?outcome, "viewport loaded");
                    completed += 1;
                }
                Err(e) => tracing::error!("viewport load failed: {}", e),
            }
        }

        completed
    }

    async fn load(&mut self, viewport: &Viewport, token: CancellationToken) -> Result<LoadOutcome> {
        self.layer.clear();

        if viewport.zoom < self.min_zoom {
            tracing::debug!(zoom = viewport.zoom, min_zoom = self.min_zoom, "zoomed out, not loading");
            return Ok(LoadOutcome::Skipped {
                zoom: viewport.zoom,
                min_zoom: self.min_zoom,
            });
        }

        let query = FeatureQuery::new()
            .with_bbox(viewport.bbox())
            .with_limit(self.batch_size);

        let source = Arc::clone(&self.source);
        let mut streams = Vec::with_capacity(self.collections.len());
        for collection in &self.collections {
            let mut url = collection_items_url(&collection.url, &collection.feat_type)?;
            query.apply_to(&mut url);

            let api = collection.api.clone();
            let feat_type = collection.feat_type.clone();
            streams.push(Box::pin(pages(&*source, url, token.child_token()).map(
                move |page| (api.clone(), feat_type.clone(), page),
            )));
        }

        let mut summary = LoadSummary::default();
        let mut merged = select_all(streams);
        while let Some((api, feat_type, page)) = merged.next().await {
            match page {
                Ok(page) => {
                    tracing::info!(%api, %feat_type, features = page.len(), "page loaded");
                    summary.pages += 1;
                    let features = page.features.into_iter().map(|mut feature| {
                        tag_feature(&mut feature, &api);
                        feature
                    });
                    summary.features += self.layer.add_features(features);
                }
                Err(e) => {
                    tracing::error!(%api, %feat_type, "collection load failed: {}", e);
                    summary.failures.push((feat_type, e.to_string()));
                }
            }
        }

        if token.is_cancelled() {
            return Ok(LoadOutcome::Cancelled(summary));
        }
        Ok(LoadOutcome::Loaded(summary))
    }
}

/// Prefixes the feature id with `<api>_` and records the API as a property.
pub fn tag_feature(feature: &mut Feature, api: &str) {
    if let Some(id) = feature.id.as_ref().map(id_to_string) {
        feature.id = Some(Id::String(format!("{}_{}", api, id)));
    }
    feature.set_property(API_PROPERTY, api);
}
