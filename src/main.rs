use clap::{Parser, ValueEnum};
use image::ImageReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use framefind::detection::crop::crop_dynamic;
use framefind::{
    BoundaryDetector, ContourDetector, DebugDirReporter, DetectorConfig, FallbackDetector,
    LineFrameDetector, NullReporter, Reporter,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Morphological line mask with rotation search
    Lines,
    /// Adaptive-threshold contour search
    Contours,
    /// Lines first, contours if that fails
    Auto,
}

#[derive(Parser)]
#[command(name = "framefind")]
#[command(about = "Locate and crop the rectangular frame of a photographed document")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Detection strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::Auto)]
    strategy: Strategy,

    /// JSON file with detector settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the minimum line length (fraction of the axis)
    #[arg(long)]
    min_line_fraction: Option<f64>,

    /// Override the rotation search range in degrees
    #[arg(long)]
    rotation_range: Option<i32>,

    /// Write the cropped frame to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save side-by-side debug images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(args: &Cli) -> anyhow::Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(fraction) = args.min_line_fraction {
        config = config.with_min_line_fraction(fraction);
    }
    if let Some(range) = args.rotation_range {
        config = config.with_rotation_range(range);
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;

    tracing::info!(path = %args.image_path.display(), "Loading image");
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    tracing::info!(width = img.width(), height = img.height(), "Image loaded");

    let reporter: Box<dyn Reporter> = match &args.debug_out {
        Some(dir) => Box::new(DebugDirReporter::new(dir.clone())?),
        None => Box::new(NullReporter),
    };

    let detector: Box<dyn BoundaryDetector> = match args.strategy {
        Strategy::Lines => Box::new(LineFrameDetector::new(config.clone())),
        Strategy::Contours => Box::new(ContourDetector::new(config.clone())),
        Strategy::Auto => Box::new(FallbackDetector::standard(&config)),
    };

    let gray = img.to_luma8();
    let bbox = match detector.detect(&gray, reporter.as_ref()) {
        Ok(bbox) => bbox,
        Err(err) if err.is_recoverable() => {
            println!("Could not find the frame!");
            tracing::debug!(%err, "Detection failed");
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    println!("\n=== Frame Detection Result ===");
    println!("Strategy: {}", detector.name());
    println!("Bounding box: {}", bbox);
    println!("Size: {}x{}", bbox.width(), bbox.height());

    if let Some(output) = &args.output {
        let cropped = crop_dynamic(&img, &bbox)?;
        cropped
            .save(output)
            .map_err(|e| anyhow::anyhow!("Failed to save cropped image: {}", e))?;
        println!("Cropped frame written to {}", output.display());
    }

    Ok(())
}
