//! Tiler: turns one heightmap artifact into one `.maptiles` artifact.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use map_generator::pipeline::run_tiler_stage;

#[derive(Parser, Debug)]
#[command(name = "tiler")]
#[command(about = "Resolve adjacency tiles from a heightmap artifact")]
struct Args {
    /// Heightmap artifact to read
    #[arg(long)]
    input: PathBuf,

    /// Existing directory that receives `<input stem>.maptiles`
    #[arg(long)]
    output_dir: PathBuf,

    /// Also write the tile grid as a colour PNG
    #[arg(long)]
    debug_tiles_png: Option<PathBuf>,
}

fn run(args: Args) -> anyhow::Result<()> {
    let summary = run_tiler_stage(&args.input, &args.output_dir, args.debug_tiles_png.as_deref())
        .with_context(|| format!("tiling {:?} failed", args.input))?;

    println!(
        "{} ({}x{} tiles, {} bytes)",
        summary.output_path.display(),
        summary.tile_width,
        summary.tile_height,
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
