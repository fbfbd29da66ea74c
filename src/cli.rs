//! Command-line interface.
//!
//! Three subcommands share one configuration: `fetch` pages through
//! collections for a bbox, `view` loads a viewport and optionally inspects a
//! click, `track` follows a moving-object feed.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{CollectionConfig, MapConfig};
use crate::types::{Bbox, LonLat};

/// Default viewport size for `view`.
pub const DEFAULT_VIEW_SIZE: &str = "1024x768";

/// mapfeed: load paginated GeoJSON layers and animate moving features
#[derive(Parser, Debug)]
#[command(name = "mapfeed")]
#[command(about = "Paginated GeoJSON feature loader and moving-object track animator")]
#[command(version)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch every page of one or more collections within a bbox
    Fetch(FetchArgs),
    /// Load a viewport and inspect what is under a pixel
    View(ViewArgs),
    /// Follow a moving-object feed and animate position updates
    Track(TrackArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct FetchArgs {
    /// Bounding box as min_lon,min_lat,max_lon,max_lat
    #[arg(short, long, allow_hyphen_values = true)]
    pub bbox: Bbox,

    /// Collection (feature type) to fetch; repeatable, defaults to all configured
    #[arg(short, long = "collection")]
    pub collections: Vec<String>,

    /// Page size requested per request
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Stop after this many pages per collection
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Write the feature collection here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl FetchArgs {
    /// Returns the configured collections selected by `--collection`.
    ///
    /// A name that is not configured is fetched from the first configured
    /// endpoint under its api tag.
    pub fn selected_collections(&self, config: &MapConfig) -> Vec<CollectionConfig> {
        if self.collections.is_empty() {
            return config.collections.clone();
        }

        self.collections
            .iter()
            .filter_map(|name| {
                config
                    .collections
                    .iter()
                    .find(|c| &c.feat_type == name)
                    .cloned()
                    .or_else(|| {
                        config
                            .collections
                            .first()
                            .map(|base| CollectionConfig::new(base.api.as_str(), base.url.as_str(), name.as_str()))
                    })
            })
            .collect()
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ViewArgs {
    /// Map center as lon,lat
    #[arg(long, allow_hyphen_values = true)]
    pub center: LonLat,

    /// Zoom level
    #[arg(short, long)]
    pub zoom: f64,

    /// Viewport size in pixels as WIDTHxHEIGHT
    #[arg(long, default_value = DEFAULT_VIEW_SIZE, value_parser = parse_size)]
    pub size: (u32, u32),

    /// Pixel to inspect as X,Y (origin top-left)
    #[arg(long, value_parser = parse_pixel)]
    pub click: Option<(f64, f64)>,

    /// Click tolerance in pixels
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Write the loaded layer as GeoJSON here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct TrackArgs {
    /// Feed endpoint returning the latest positions
    #[arg(long)]
    pub url: Option<String>,

    /// Seconds between polls
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Redraw rate while animations run
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub fps: Option<u32>,

    /// Flash duration in milliseconds
    #[arg(long)]
    pub flash_ms: Option<u64>,

    /// Print each animation frame to stdout as one line of GeoJSON
    #[arg(long)]
    pub emit_frames: bool,

    /// Write the last known positions here on exit
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl TrackArgs {
    /// Applies the command-line overrides to the feed configuration.
    pub fn apply_to(&self, config: &mut MapConfig) {
        if let Some(url) = &self.url {
            config.trains.url = url.clone();
        }
        if let Some(interval) = self.interval {
            config.trains.poll_interval_secs = interval.max(1);
        }
        if let Some(fps) = self.fps {
            config.trains.fps = fps;
        }
        if let Some(flash_ms) = self.flash_ms {
            config.trains.flash_duration_ms = flash_ms;
        }
    }
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Parses `WIDTHxHEIGHT`.
pub fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    if width == 0 || height == 0 {
        return Err("size must be non-zero".to_string());
    }
    Ok((width, height))
}

/// Parses `X,Y`.
pub fn parse_pixel(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x '{}'", x))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y '{}'", y))?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mapfeed").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_args() {
        let cli = parse(&[
            "fetch",
            "--bbox",
            "24.9,60.1,25.0,60.2",
            "--collection",
            "RajamerkinSijaintitiedot",
            "--limit",
            "100",
        ]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.bbox.to_string(), "24.9,60.1,25,60.2");
        assert_eq!(args.collections, vec!["RajamerkinSijaintitiedot"]);
        assert_eq!(args.limit, Some(100));
        assert!(args.output.is_none());
    }

    #[test]
    fn fetch_rejects_bad_bbox() {
        let result = Cli::try_parse_from(["mapfeed", "fetch", "--bbox", "25,60,24,61"]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = parse(&["view", "--center", "-3.7,40.4", "--zoom", "15"]);
        let Command::View(args) = cli.command else {
            panic!("expected view");
        };
        assert_eq!(args.center, LonLat::new(-3.7, 40.4));
        assert_eq!(args.size, (1024, 768));
        assert!(args.click.is_none());
    }

    #[test]
    fn view_with_click() {
        let cli = parse(&[
            "view", "--center", "24.94,60.17", "--zoom", "16", "--size", "800x600", "--click", "400,300",
        ]);
        let Command::View(args) = cli.command else {
            panic!("expected view");
        };
        assert_eq!(args.size, (800, 600));
        assert_eq!(args.click, Some((400.0, 300.0)));
    }

    #[test]
    fn verbosity_counts() {
        let cli = parse(&["-vv", "track"]);
        assert_eq!(cli.verbose, 2);
        let cli = parse(&["track", "-v"]);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn track_overrides_config() {
        let cli = parse(&["track", "--interval", "5", "--fps", "10", "--emit-frames"]);
        let Command::Track(args) = cli.command else {
            panic!("expected track");
        };
        assert!(args.emit_frames);

        let mut config = MapConfig::new();
        args.apply_to(&mut config);
        assert_eq!(config.trains.poll_interval_secs, 5);
        assert_eq!(config.trains.fps, 10);
        assert_eq!(config.trains.flash_duration_ms, 3000);
    }

    #[test]
    fn track_rejects_zero_fps() {
        assert!(Cli::try_parse_from(["mapfeed", "track", "--fps", "0"]).is_err());
    }

    #[test]
    fn selected_collections_defaults_to_all() {
        let config = MapConfig::new();
        let cli = parse(&["fetch", "--bbox", "24,60,25,61"]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.selected_collections(&config), config.collections);
    }

    #[test]
    fn selected_collections_accepts_unknown_names() {
        let config = MapConfig::new();
        let cli = parse(&["fetch", "--bbox", "24,60,25,61", "-c", "Rakennukset"]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        let selected = args.selected_collections(&config);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].feat_type, "Rakennukset");
        assert_eq!(selected[0].url, config.collections[0].url);
    }

    #[test]
    fn size_parsing() {
        assert_eq!(parse_size("640x480"), Ok((640, 480)));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x480").is_err());
        assert_eq!(parse_pixel("1.5, 2"), Ok((1.5, 2.0)));
        assert!(parse_pixel("1").is_err());
    }
}
