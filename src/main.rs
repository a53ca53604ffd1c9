//! Lost-object detection over recorded detector output.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lost_object_tracker::integration::Recording;
use lost_object_tracker::{LostObjectPipeline, Settings};

#[derive(Debug, Parser)]
#[command(name = "lost-object-tracker", version, about = "Lost object detection")]
struct Cli {
    /// Path to the video file
    video_path: PathBuf,

    /// Recorded detector output for the video (JSON)
    #[arg(long)]
    detections: PathBuf,

    /// JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output JSON file; prints to stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Confidence threshold
    #[arg(long)]
    confidence: Option<f32>,

    /// Stationary threshold (minutes)
    #[arg(long = "stationary-time")]
    stationary_time: Option<f64>,
}

impl Cli {
    /// Settings file values, overridden by explicit flags; defaults fill the rest.
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(confidence) = self.confidence {
            settings.confidence_threshold = confidence;
        }
        if let Some(minutes) = self.stationary_time {
            settings.stationary_threshold = minutes;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    let recording = Recording::load(&cli.detections)?;
    let (opener, detector) = recording.into_parts();

    let mut pipeline = LostObjectPipeline::new(detector);
    let result = pipeline
        .process_video(&opener, &cli.video_path, &settings)
        .with_context(|| format!("Error processing video {}", cli.video_path.display()))?;

    let json = result.to_json_pretty()?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Results saved to: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
