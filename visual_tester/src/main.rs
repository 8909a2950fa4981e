use anyhow::Context;
use chrono::{Local, Utc};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use env_logger::{Builder, Env};
use ifire_vision::core_modules::utils::image_helper::image_helper;
use ifire_vision::dashboard::{Coordinates, HotspotRegistry, RandomRegionResolver, write_report};
use ifire_vision::upload::validate_upload;
use ifire_vision::{DetectorConfig, FireDetector};
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "visual_tester")]
#[command(about = "Run fire and smoke detection on a single image")]
struct Cli {
    /// Image to analyse (any format the `image` crate decodes)
    image: PathBuf,

    /// Location name recorded on the hotspot and in the report filename
    #[arg(long, default_value = "Unknown location")]
    location: String,

    /// Latitude of the hotspot; a point near Sumatra is drawn when omitted
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the hotspot
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Write a copy of the image with the detected boxes drawn on it
    #[arg(long, value_name = "OUT_PNG")]
    annotate: Option<PathBuf>,

    /// Write a plain-text hotspot report into this directory
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Detector configuration (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run the colour analysis on this thread, without the worker pool
    #[arg(long)]
    sync: bool,

    /// Seed for the fallback coordinate generator
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,
}

fn init_logging(verbosity: &Verbosity<WarnLevel>) {
    // RUST_LOG applies only when no -v/-q flag was given.
    let mut logger = if !verbosity.is_present() && std::env::var_os("RUST_LOG").is_some() {
        Builder::from_env(Env::default())
    } else {
        let mut builder = Builder::new();
        builder.filter_level(verbosity.log_level_filter());
        builder
    };
    logger
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.verbosity);

    let config = match &cli.config {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DetectorConfig::default(),
    };

    let bytes = tokio::fs::read(&cli.image)
        .await
        .with_context(|| format!("reading {}", cli.image.display()))?;
    info!("🔍 Analysing {} ({} bytes)", cli.image.display(), bytes.len());

    let detector = FireDetector::new(config);
    let result = if cli.sync {
        validate_upload(&bytes, None, &detector.config().upload)?;
        detector.detect_blocking(&bytes)?
    } else {
        detector.detect_upload(bytes.clone(), None).await?
    };
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(out) = &cli.annotate {
        let mut canvas = image::load_from_memory(&bytes)?.to_rgba8();
        image_helper::draw_boxes(&mut canvas, &result.bounding_boxes);
        image_helper::save(out, &canvas).with_context(|| format!("writing {}", out.display()))?;
        info!("Annotated image written to {}", out.display());
    }

    if let Some(dir) = &cli.report_dir {
        let resolver = match cli.seed {
            Some(seed) => RandomRegionResolver::seeded(seed),
            None => RandomRegionResolver::new(),
        };
        let coordinates = cli.lat.zip(cli.lon).map(|(lat, lon)| Coordinates::new(lat, lon));
        if coordinates.is_none() {
            warn!("No coordinates given; placing the hotspot at a random point near Sumatra");
        }

        let mut registry = HotspotRegistry::new();
        registry.add_detection(&result, &cli.location, coordinates, &resolver, Utc::now())?;
        let path = write_report(dir, &registry, &Local::now())?;
        println!("Report written to {}", path.display());
    }

    if result.detection_type.is_hazard() {
        warn!("{} detected with {}% confidence", result.detection_type, result.confidence);
    }
    Ok(())
}
