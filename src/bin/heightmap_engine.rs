//! Heightmap engine: turns one JSON job file into one heightmap artifact.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use map_generator::heightmap::{FaultLineParams, MAX_NOISE_AMPLITUDE};
use map_generator::pipeline::{run_heightmap_stage, HeightmapStageOptions};

#[derive(Parser, Debug)]
#[command(name = "heightmap_engine")]
#[command(about = "Generate a fault-line heightmap artifact from a job file")]
struct Args {
    /// Job descriptor (JSON)
    #[arg(long)]
    job_file: PathBuf,

    /// Where to write the heightmap artifact
    #[arg(long)]
    output_file: PathBuf,

    /// Half-range of seeded micro-noise applied before fault lines (0 = off)
    #[arg(
        long,
        default_value = "0",
        value_parser = clap::value_parser!(i32).range(0..=MAX_NOISE_AMPLITUDE as i64)
    )]
    noise_amplitude: i32,

    /// 3x3 smoothing passes applied after fault lines (0 = off)
    #[arg(long, default_value = "0")]
    smoothing_passes: u32,

    /// Also write normalized heights as a grayscale PNG
    #[arg(long)]
    debug_heights_png: Option<PathBuf>,

    /// Also write terrain layers as a colour PNG
    #[arg(long)]
    debug_layers_png: Option<PathBuf>,
}

fn run(args: Args) -> anyhow::Result<()> {
    let options = HeightmapStageOptions {
        params: FaultLineParams {
            noise_amplitude: args.noise_amplitude,
            smoothing_passes: args.smoothing_passes,
            ..FaultLineParams::default()
        },
        debug_heights_png: args.debug_heights_png,
        debug_layers_png: args.debug_layers_png,
    };

    let summary = run_heightmap_stage(&args.job_file, &args.output_file, &options)
        .with_context(|| format!("heightmap job {:?} failed", args.job_file))?;

    println!(
        "{} -> {} ({} bytes)",
        summary.job_id,
        summary.output_path.display(),
        summary.bytes_written
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
