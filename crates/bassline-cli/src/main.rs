//! Batch walking-bass generator for MIDI files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bassline::BasslineConfig;
use clap::Parser;
use tracing::info;

mod batch;

/// Add a walking bass track to MIDI files by arpeggiating their chord
/// track beat by beat.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input .mid/.midi file, or a directory of them
    input: PathBuf,

    /// Output directory (defaults to the input directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exact name prefix of the chord track
    #[arg(long)]
    prefix: Option<String>,

    /// Notes per beat: 1 = quarters, 2 = eighths
    #[arg(long)]
    density: Option<u32>,

    /// Lowest bass pitch
    #[arg(long)]
    low: Option<u8>,

    /// Highest bass pitch
    #[arg(long)]
    high: Option<u8>,

    /// GM program for the bass track
    #[arg(long)]
    program: Option<u8>,

    /// Velocity for bass notes (1-127)
    #[arg(long)]
    velocity: Option<u8>,

    /// Velocity scale applied to the chord track (0-1)
    #[arg(long)]
    chord_scale: Option<f64>,

    /// Leave the melody track's program unchanged
    #[arg(long)]
    no_retarget_melody: bool,

    /// Print a JSON summary of the batch to stdout
    #[arg(long)]
    report: bool,
}

impl Args {
    fn build_config(&self) -> Result<BasslineConfig> {
        let mut config = match &self.config {
            Some(path) => BasslineConfig::from_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => BasslineConfig::default(),
        };

        if let Some(prefix) = &self.prefix {
            config.chord_track_prefix = prefix.clone();
        }
        if let Some(density) = self.density {
            config.note_density = density;
        }
        if let Some(low) = self.low {
            config.range_low = low;
        }
        if let Some(high) = self.high {
            config.range_high = high;
        }
        if let Some(program) = self.program {
            config.bass_program = program;
        }
        if let Some(velocity) = self.velocity {
            config.bass_velocity = velocity;
        }
        if let Some(scale) = self.chord_scale {
            config.chord_velocity_scale = scale;
        }
        if self.no_retarget_melody {
            config.retarget_melody = false;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = args.build_config()?;

    let inputs = batch::discover_inputs(&args.input)?;
    if inputs.is_empty() {
        anyhow::bail!("no .mid/.midi files found in {}", args.input.display());
    }

    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None if args.input.is_dir() => args.input.clone(),
        None => args
            .input
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    info!(files = inputs.len(), out_dir = %out_dir.display(), "starting batch");
    let report = batch::run_batch(&inputs, &out_dir, &config);
    info!(
        processed = report.processed,
        failed = report.failed,
        bass_notes = report.total_bass_notes,
        "batch complete"
    );

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
