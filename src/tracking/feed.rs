//! Polling of a moving-object feed and the tracking loop.
//!
//! The loop interleaves three things on one task: polling the feed, drawing
//! animation frames while flashes are running, and shutdown.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::animation::FrameRecorder;
use crate::config::TrainFeedConfig;
use crate::error::{MapError, Result};
use crate::fetch::{traverse, PageSource};
use crate::types::Fix;

use super::layer::TrackLayer;

/// A GeoJSON endpoint reporting the latest position of moving objects.
pub struct TrainFeed {
    source: Arc<dyn PageSource>,
    url: Url,
    api: String,
}

impl TrainFeed {
    pub fn new(source: Arc<dyn PageSource>, url: Url, api: impl Into<String>) -> Self {
        Self {
            source,
            url,
            api: api.into(),
        }
    }

    /// Creates a feed for the configured endpoint.
    pub fn from_config(source: Arc<dyn PageSource>, config: &TrainFeedConfig) -> Result<Self> {
        let url = Url::parse(&config.url).map_err(|e| {
            MapError::invalid_config(format!("Invalid train feed url '{}': {}", config.url, e))
        })?;
        Ok(Self::new(source, url, config.api.as_str()))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetches every page of the feed and reads the fixes.
    ///
    /// Features without a point geometry or an identifier are skipped.
    pub async fn poll(&self) -> Result<Vec<Fix>> {
        let mut fixes = Vec::new();
        let mut skipped = 0;

        traverse(&*self.source, self.url.clone(), |page| {
            for feature in &page.features {
                match Fix::from_feature(feature, &self.api) {
                    Some(fix) => fixes.push(fix),
                    None => skipped += 1,
                }
            }
            true
        })
        .await?;

        if skipped > 0 {
            tracing::debug!(skipped, "features without position or id");
        }
        Ok(fixes)
    }
}

/// Timing and output settings of the tracking loop.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub poll_interval: Duration,
    pub frame_interval: Duration,
    /// Tracks unseen for longer than this are dropped after each poll.
    pub stale_after: Duration,
    /// Write each drawn frame as one line of GeoJSON.
    pub emit_frames: bool,
}

impl RunOptions {
    pub fn from_config(config: &TrainFeedConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            frame_interval: config.frame_interval(),
            stale_after: config.stale_after(),
            emit_frames: false,
        }
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub polls: usize,
    pub failed_polls: usize,
    pub fixes: usize,
    pub frames: usize,
}

/// Runs the tracking loop until `shutdown` is cancelled.
///
/// A failed poll is logged and retried on the next tick. Frames are only
/// drawn while at least one flash is running.
pub async fn run<W: Write>(
    feed: &TrainFeed,
    layer: &mut TrackLayer,
    options: &RunOptions,
    mut out: W,
    shutdown: CancellationToken,
) -> Result<RunStats> {
    let mut poll_tick = tokio::time::interval(options.poll_interval);
    poll_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut frame_tick = tokio::time::interval(options.frame_interval);
    frame_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut recorder = FrameRecorder::new();
    let mut stats = RunStats::default();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!(?stats, "tracking stopped");
                break;
            }
            _ = poll_tick.tick() => {
                let polled = tokio::select! {
                    _ = shutdown.cancelled() => continue,
                    polled = feed.poll() => polled,
                };
                match polled {
                    Ok(fixes) => {
                        let now = Instant::now();
                        let summary = layer.ingest_all(&fixes, now);
                        let pruned = layer.prune(options.stale_after, now);
                        stats.polls += 1;
                        stats.fixes += fixes.len();
                        tracing::info!(
                            fixes = fixes.len(),
                            created = summary.created,
                            updated = summary.updated,
                            pruned,
                            tracked = layer.len(),
                            "feed polled"
                        );
                    }
                    Err(e) => {
                        stats.failed_polls += 1;
                        tracing::warn!("feed poll failed: {}", e);
                    }
                }
            }
            _ = frame_tick.tick(), if !layer.is_idle() => {
                if layer.render(Instant::now(), &mut recorder) == 0 {
                    continue;
                }
                let frame = recorder.take_frame();
                if options.emit_frames {
                    write_frame(&mut out, &frame)?;
                }
                stats.frames += 1;
            }
        }
    }

    out.flush()
        .map_err(|e| MapError::io("Failed to flush frame output", e))?;
    Ok(stats)
}

fn write_frame<W: Write>(out: &mut W, frame: &geojson::FeatureCollection) -> Result<()> {
    serde_json::to_writer(&mut *out, frame)
        .map_err(|e| MapError::io("Failed to write frame", e.into()))?;
    writeln!(out).map_err(|e| MapError::io("Failed to write frame", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{MockPageSource, BASE};

    fn feed(source: Arc<MockPageSource>) -> TrainFeed {
        let url = Url::parse(&format!("{}/train-locations", BASE)).unwrap();
        TrainFeed::new(source, url, "rata")
    }

    fn options() -> RunOptions {
        RunOptions {
            poll_interval: Duration::from_millis(20),
            frame_interval: Duration::from_millis(5),
            stale_after: Duration::from_secs(60),
            emit_frames: true,
        }
    }

    #[tokio::test]
    async fn poll_reads_fixes_from_every_page() {
        let source = Arc::new(MockPageSource::chain(2).with_features_per_page(3));
        let fixes = feed(source.clone()).poll().await.unwrap();

        assert_eq!(fixes.len(), 6);
        assert!(fixes.iter().all(|f| f.track_id.starts_with("rata_")));
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn poll_propagates_errors() {
        let source = Arc::new(MockPageSource::chain(2).failing_at(2));
        assert!(feed(source).poll().await.is_err());
    }

    #[test]
    fn from_config_rejects_bad_url() {
        let config = TrainFeedConfig {
            url: "::".to_string(),
            ..TrainFeedConfig::default()
        };
        let source = Arc::new(MockPageSource::chain(1));
        assert!(TrainFeed::from_config(source, &config).is_err());
    }

    #[tokio::test]
    async fn run_polls_animates_and_stops() {
        let source = Arc::new(MockPageSource::chain(1).with_features_per_page(2));
        let feed = feed(source);
        let mut layer = TrackLayer::new(5, 100, Duration::from_millis(500));
        let shutdown = CancellationToken::new();

        let stopper = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            stopper.cancel();
        });

        let mut out = Vec::new();
        let stats = run(&feed, &mut layer, &options(), &mut out, shutdown)
            .await
            .unwrap();

        assert!(stats.polls >= 2);
        assert_eq!(stats.failed_polls, 0);
        assert_eq!(layer.len(), 2);
        assert!(stats.frames > 0);

        let text = String::from_utf8(out).unwrap();
        let first = text.lines().next().unwrap();
        let frame: geojson::FeatureCollection = serde_json::from_str(first).unwrap();
        assert_eq!(frame.features.len(), 6);
        assert_eq!(text.lines().count(), stats.frames);
    }

    #[tokio::test]
    async fn failed_polls_keep_the_loop_running() {
        let source = Arc::new(MockPageSource::chain(1).failing_at(1));
        let feed = feed(source);
        let mut layer = TrackLayer::new(5, 100, Duration::from_millis(500));
        let shutdown = CancellationToken::new();

        let stopper = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(70)).await;
            stopper.cancel();
        });

        let stats = run(&feed, &mut layer, &options(), std::io::sink(), shutdown)
            .await
            .unwrap();

        assert_eq!(stats.polls, 0);
        assert!(stats.failed_polls >= 2);
        assert!(layer.is_empty());
    }
}
