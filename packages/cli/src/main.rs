#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the geofilter pipeline.
//!
//! ```text
//! geofilter photo.jpg                       # location from EXIF GPS
//! geofilter photo.jpg --strategy live --lat 40.758 --lng -73.9855
//! geofilter photo.jpg --zones my_zones.toml --output-dir out --yes --json
//! geofilter --list-zones
//! ```
//!
//! Log output is routed through `indicatif-log-bridge` (see
//! [`logging::init_logger`]) so log lines and the spinner never fight for
//! the terminal. Set `RUST_LOG=debug` to see per-zone distances.

mod logging;
mod status;
mod summary;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use console::style;
use dialoguer::Confirm;
use geofilter_extract::CoordinateExtractor;
use geofilter_extract::metadata::MetadataExtractor;
use geofilter_extract::position::{
    FixedPositionSource, LiveSensorExtractor, PositionOptions, PositionSource,
    UnavailablePositionSource,
};
use geofilter_pipeline::{
    LogStatus, PhotoSubmission, Pipeline, StatusReporter, output_filename, save_rendered,
};
use geofilter_zone::{ZoneMatcher, ZoneRegistry};
use geofilter_zone_models::{GeoCoordinate, ZoneBoundary};

use crate::status::IndicatifStatus;
use crate::summary::Summary;

/// Where a photo's location comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// GPS block embedded in the image file
    Metadata,
    /// The device's current position
    Live,
}

#[derive(Parser)]
#[command(
    name = "geofilter",
    about = "Apply location-based filters to photos taken in special zones"
)]
struct Cli {
    /// Photo to process
    #[arg(required_unless_present = "list_zones")]
    input: Option<PathBuf>,

    /// Where the photo's location comes from
    #[arg(long, value_enum, default_value_t = Strategy::Metadata)]
    strategy: Strategy,

    /// Device latitude for the live strategy (no sensor on this host)
    #[arg(long, env = "GEOFILTER_LAT", allow_hyphen_values = true, requires = "lng")]
    lat: Option<f64>,

    /// Device longitude for the live strategy
    #[arg(long, env = "GEOFILTER_LNG", allow_hyphen_values = true, requires = "lat")]
    lng: Option<f64>,

    /// Seconds to wait for a live position fix
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// TOML zone table replacing the built-in zones
    #[arg(long)]
    zones: Option<PathBuf>,

    /// Directory the filtered photo is saved to
    #[arg(long, env = "GEOFILTER_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Save without asking
    #[arg(long, short)]
    yes: bool,

    /// Print a JSON summary instead of the styled report
    #[arg(long)]
    json: bool,

    /// Print the configured zones and exit
    #[arg(long)]
    list_zones: bool,
}

impl Cli {
    fn device_position(&self) -> Result<Option<GeoCoordinate>, Box<dyn std::error::Error>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Ok(Some(GeoCoordinate::new(lat, lng)?)),
            _ => Ok(None),
        }
    }

    fn extractor(&self) -> Result<Arc<dyn CoordinateExtractor>, Box<dyn std::error::Error>> {
        Ok(match self.strategy {
            Strategy::Metadata => Arc::new(MetadataExtractor),
            Strategy::Live => {
                let source: Arc<dyn PositionSource> = match self.device_position()? {
                    Some(here) => Arc::new(FixedPositionSource::new(here, None)),
                    None => Arc::new(UnavailablePositionSource),
                };
                let options = PositionOptions {
                    timeout: Duration::from_secs(self.timeout_secs),
                    ..PositionOptions::default()
                };
                Arc::new(LiveSensorExtractor::with_options(source, options))
            }
        })
    }

    fn registry(&self) -> Result<ZoneRegistry, Box<dyn std::error::Error>> {
        Ok(match &self.zones {
            Some(path) => ZoneRegistry::from_file(path)?,
            None => ZoneRegistry::builtin(),
        })
    }
}

fn print_zones(registry: &ZoneRegistry) {
    for zone in registry.zones() {
        let shape = match &zone.boundary {
            ZoneBoundary::Circle { center, radius_km } => {
                format!("circle {radius_km} km around {center}")
            }
            ZoneBoundary::Polygon { vertices } => format!("polygon, {} vertices", vertices.len()),
        };
        println!(
            "{}  {}  {} filter",
            style(&zone.name).bold(),
            style(shape).dim(),
            zone.filter.kind
        );
    }
}

fn print_report(submission: &PhotoSubmission) {
    let heading = if submission.is_filtered() {
        style("Filtered Photo").green().bold()
    } else {
        style("Your Photo").bold()
    };
    println!();
    println!("{heading}");
    println!("  Zone: {}", submission.outcome);
    if let Some(coordinate) = submission.coordinate {
        println!("  Coordinates: {coordinate}");
    }
    if let Some((width, height)) = submission.rendered.dimensions {
        println!("  Size: {width}x{height}");
    }
}

fn confirm_save(path: &Path, skip_prompt: bool) -> Result<bool, dialoguer::Error> {
    if skip_prompt {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(format!("Save to {}?", path.display()))
        .default(true)
        .interact()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = logging::init_logger();

    let registry = cli.registry()?;
    log::debug!("Loaded {} zones", registry.len());

    if cli.list_zones {
        print_zones(&registry);
        return Ok(());
    }

    let Some(input) = cli.input.as_deref() else {
        return Err("no input photo given".into());
    };

    let bytes = tokio::fs::read(input).await?;
    if let Err(e) = image::guess_format(&bytes) {
        log::debug!("Format detection failed: {e}");
        return Err(format!("{} is not a recognized image file", input.display()).into());
    }

    let status: Arc<dyn StatusReporter> = if cli.json {
        Arc::new(LogStatus)
    } else {
        Arc::new(IndicatifStatus::new(&multi))
    };
    let matcher = Arc::new(ZoneMatcher::new(Arc::new(registry)));
    let pipeline = Pipeline::new(cli.extractor()?, matcher).with_status(status);

    let original_name = input
        .file_name()
        .map_or_else(|| input.display().to_string(), |n| n.to_string_lossy().into_owned());
    let submission = pipeline.submit(bytes, original_name).await?;

    if !cli.json {
        print_report(&submission);
    }
    if !submission.rendered.is_jpeg() {
        log::warn!(
            "Output is the original {} data, not a re-encoded JPEG",
            submission.rendered.content_type
        );
    }

    let filename = output_filename(&submission.original_name, Utc::now());
    let target = cli.output_dir.join(&filename);
    let saved = if confirm_save(&target, cli.yes)? {
        let path = save_rendered(&submission.rendered, &cli.output_dir, &filename).await?;
        if !cli.json {
            println!("{} Saved {}", style("✓").green(), path.display());
        }
        Some(path)
    } else {
        None
    };

    if cli.json {
        let summary = Summary::new(&submission, pipeline.extractor_name(), saved.as_deref());
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    pipeline.reset()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_metadata_strategy() {
        let cli = Cli::try_parse_from(["geofilter", "photo.jpg"]).unwrap();
        assert_eq!(cli.strategy, Strategy::Metadata);
        assert_eq!(cli.input.as_deref(), Some(Path::new("photo.jpg")));
    }

    #[test]
    fn live_strategy_accepts_negative_longitude() {
        let cli = Cli::try_parse_from([
            "geofilter",
            "photo.jpg",
            "--strategy",
            "live",
            "--lat",
            "40.758",
            "--lng",
            "-73.9855",
        ])
        .unwrap();
        assert_eq!(cli.strategy, Strategy::Live);
        let here = cli.device_position().unwrap().unwrap();
        assert!((here.lng() - -73.9855).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_position_is_rejected() {
        let cli = Cli::try_parse_from(["geofilter", "p.jpg", "--lat", "91", "--lng", "0"]).unwrap();
        assert!(cli.device_position().is_err());
    }

    #[test]
    fn input_is_required_unless_listing() {
        assert!(Cli::try_parse_from(["geofilter"]).is_err());
        assert!(Cli::try_parse_from(["geofilter", "--list-zones"]).is_ok());
    }

    #[test]
    fn skip_prompt_confirms_without_terminal() {
        assert!(confirm_save(Path::new("x.jpg"), true).unwrap());
    }
}
