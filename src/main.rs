//! mapfeed: paginated GeoJSON feature loader and moving-object animator.
//!
//! This binary runs one of three commands:
//! - fetch: page through collections for a bbox and print the features
//! - view: load a viewport as the map would and inspect a click
//! - track: follow a moving-object feed and animate its updates

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use mapfeed::cli::{Cli, Command, FetchArgs, TrackArgs, ViewArgs};
use mapfeed::config::MapConfig;
use mapfeed::error::{MapError, Result};
use mapfeed::fetch::{features, FeatureQuery, HttpPageSource};
use mapfeed::logging::init_logging;
use mapfeed::map::{inspect_at, tag_feature, FeatureSource, LoadOutcome, ViewportLoader, Viewport};
use mapfeed::tracking::{self, RunOptions, TrackLayer, TrainFeed};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let mut config = MapConfig::from_env();
    if let Command::Track(args) = &cli.command {
        args.apply_to(&mut config);
    }
    if let Some(reason) = config.validate() {
        return Err(MapError::invalid_config(reason));
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| MapError::io("Failed to start async runtime", e))?;

    match &cli.command {
        Command::Fetch(args) => runtime.block_on(run_fetch(&config, args)),
        Command::View(args) => runtime.block_on(run_view(&config, args)),
        Command::Track(args) => runtime.block_on(run_track(&config, args)),
    }
}

/// Fetches every page of the selected collections within the bbox.
async fn run_fetch(config: &MapConfig, args: &FetchArgs) -> Result<()> {
    let source = HttpPageSource::from_config(config)?;
    let query = FeatureQuery::new()
        .with_bbox(args.bbox)
        .with_limit(args.limit.unwrap_or(config.batch_size));

    let mut layer = FeatureSource::new();
    for collection in args.selected_collections(config) {
        let mut seen = 0;
        let pages = features(&source, &collection.url, &collection.feat_type, &query, |page| {
            seen += 1;
            eprintln!("{} {}: page {} with {} features", collection.api, collection.feat_type, seen, page.len());
            layer.add_features(page.features.iter().cloned().map(|mut feature| {
                tag_feature(&mut feature, &collection.api);
                feature
            }));
            args.max_pages.map_or(true, |max| seen < max)
        })
        .await?;
        tracing::info!(feat_type = %collection.feat_type, pages, total = layer.len(), "collection fetched");
    }

    eprintln!("Fetched {} features", layer.len());
    write_geojson(&layer.to_feature_collection(), args.output.as_deref())
}

/// Loads one viewport and prints what is under the clicked pixel.
async fn run_view(config: &MapConfig, args: &ViewArgs) -> Result<()> {
    let source = Arc::new(HttpPageSource::from_config(config)?);
    let mut loader = ViewportLoader::new(source, config);
    let (width, height) = args.size;
    let viewport = Viewport::new(args.center, args.zoom, width, height);

    eprintln!("Viewport bbox: {}", viewport.bbox());
    match loader.on_move_end(&viewport).await? {
        LoadOutcome::Skipped { zoom, min_zoom } => {
            eprintln!("Zoom {} is below {}, nothing loaded", zoom, min_zoom);
        }
        LoadOutcome::Loaded(summary) | LoadOutcome::Cancelled(summary) => {
            eprintln!("Loaded {} features from {} pages", summary.features, summary.pages);
            for (feat_type, message) in &summary.failures {
                eprintln!("  {} failed: {}", feat_type, message);
            }
        }
    }

    if let Some(pixel) = args.click {
        let tolerance = args.tolerance.unwrap_or(config.hit_tolerance_px);
        print!("{}", inspect_at(loader.layer(), &viewport, pixel, tolerance));
    }

    if let Some(path) = &args.output {
        write_geojson(&loader.layer().to_feature_collection(), Some(path.as_path()))?;
    }
    Ok(())
}

/// Follows the moving-object feed until Ctrl-C.
async fn run_track(config: &MapConfig, args: &TrackArgs) -> Result<()> {
    let source = Arc::new(HttpPageSource::from_config(config)?);
    let feed = TrainFeed::from_config(source, &config.trains)?;
    let mut layer = TrackLayer::from_config(&config.trains);

    let mut options = RunOptions::from_config(&config.trains);
    options.emit_frames = args.emit_frames;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal.cancel(),
            Err(e) => tracing::error!("cannot listen for Ctrl-C: {}", e),
        }
    });

    eprintln!("Following {} every {}s (Ctrl-C to stop)", feed.url(), config.trains.poll_interval_secs);
    let stats = tracking::run(&feed, &mut layer, &options, std::io::stdout(), shutdown).await?;

    eprintln!();
    eprintln!("Tracking stopped");
    eprintln!("  Polls: {} ({} failed)", stats.polls, stats.failed_polls);
    eprintln!("  Fixes: {}", stats.fixes);
    eprintln!("  Frames: {}", stats.frames);
    eprintln!("  Tracked: {}", layer.len());

    if let Some(path) = &args.output {
        write_geojson(&layer.snapshot(), Some(path.as_path()))?;
        eprintln!("Saved positions to: {}", path.display());
    }
    Ok(())
}

/// Writes a feature collection to `path`, or to stdout when None.
fn write_geojson(collection: &geojson::FeatureCollection, path: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string(collection)
        .map_err(|e| MapError::io("Failed to serialize features", e.into()))?;

    match path {
        Some(path) => std::fs::write(path, text + "\n")
            .map_err(|e| MapError::io(format!("Failed to write {}", path.display()), e)),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text).map_err(|e| MapError::io("Failed to write stdout", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_geojson_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let collection = FeatureSource::new().to_feature_collection();

        write_geojson(&collection, Some(path.as_path())).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: geojson::FeatureCollection = serde_json::from_str(&text).unwrap();
        assert!(parsed.features.is_empty());
    }
}
