//! Stage drivers.
//!
//! Each stage reads one input file, runs the pure core over it and writes one
//! artifact atomically. Debug PNGs are written before the artifact, so a
//! failed stage never leaves an artifact behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::adjacency::FULL_MASK;
use crate::artifact::{self, ArtifactError, TileArtifact};
use crate::export;
use crate::heightmap::{generate_heightmap, FaultLineParams};
use crate::job::{HeightmapJob, JobError};
use crate::terrain::TerrainLayer;
use crate::tiles::{build_tiles, TILE_EXPANSION};

/// Extension of tile artifacts written by the tiler stage.
pub const TILE_ARTIFACT_EXTENSION: &str = "maptiles";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Job(#[from] JobError),
    #[error("{path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write debug image {path:?}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("output directory {0:?} does not exist")]
    MissingOutputDir(PathBuf),
    #[error("input path {0:?} has no file name to derive the output from")]
    NoFileStem(PathBuf),
}

impl PipelineError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn export(path: &Path, source: image::ImageError) -> Self {
        Self::Export {
            path: path.to_path_buf(),
            source,
        }
    }
}

// =============================================================================
// HEIGHTMAP STAGE
// =============================================================================

/// Engine knobs and optional debug outputs for the heightmap stage.
#[derive(Clone, Debug, Default)]
pub struct HeightmapStageOptions {
    pub params: FaultLineParams,
    pub debug_heights_png: Option<PathBuf>,
    pub debug_layers_png: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct HeightmapStageSummary {
    pub job_id: String,
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub layer_counts: [usize; 4],
    pub flat: bool,
}

/// Read a job file, generate its heightmap and write the artifact to `output_path`.
pub fn run_heightmap_stage(
    job_path: &Path,
    output_path: &Path,
    options: &HeightmapStageOptions,
) -> Result<HeightmapStageSummary, PipelineError> {
    let job = HeightmapJob::from_file(job_path)?;
    tracing::info!(
        target: "map_generator::pipeline",
        job_id = %job.job_id,
        width = job.width,
        height = job.height,
        seed = job.seed,
        iterations = job.fault_line_iterations,
        requested_at = ?job.requested_at(),
        "heightmap.stage.start"
    );

    let report = generate_heightmap(&job, &options.params);
    let heightmap = &report.heightmap;

    let layer_counts = heightmap.layer_counts();
    for layer in TerrainLayer::ALL {
        tracing::info!(
            target: "map_generator::pipeline",
            job_id = %job.job_id,
            layer = layer.name(),
            cells = layer_counts[layer.as_u8() as usize],
            "heightmap.layer.count"
        );
    }

    if let Some(path) = &options.debug_heights_png {
        export::export_heights_png(&heightmap.heights, path)
            .map_err(|e| PipelineError::export(path, e))?;
        tracing::debug!(target: "map_generator::pipeline", path = %path.display(), "heightmap.debug.heights_png");
    }
    if let Some(path) = &options.debug_layers_png {
        export::export_layers_png(&heightmap.layers, path)
            .map_err(|e| PipelineError::export(path, e))?;
        tracing::debug!(target: "map_generator::pipeline", path = %path.display(), "heightmap.debug.layers_png");
    }

    let bytes = artifact::encode_heightmap(heightmap);
    artifact::write_atomic(output_path, &bytes).map_err(|e| PipelineError::io(output_path, e))?;
    tracing::info!(
        target: "map_generator::pipeline",
        job_id = %job.job_id,
        path = %output_path.display(),
        bytes = bytes.len(),
        "heightmap.output.written"
    );

    Ok(HeightmapStageSummary {
        job_id: job.job_id,
        output_path: output_path.to_path_buf(),
        bytes_written: bytes.len(),
        layer_counts,
        flat: report.flat,
    })
}

// =============================================================================
// TILER STAGE
// =============================================================================

#[derive(Clone, Debug)]
pub struct TilerStageSummary {
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub tile_width: u32,
    pub tile_height: u32,
    pub seed: u64,
}

/// Where the tiler writes the artifact for `input`: `<output_dir>/<stem>.maptiles`.
pub fn tile_output_path(input: &Path, output_dir: &Path) -> Result<PathBuf, PipelineError> {
    let stem = input
        .file_stem()
        .ok_or_else(|| PipelineError::NoFileStem(input.to_path_buf()))?;
    let mut path = output_dir.join(stem);
    path.set_extension(TILE_ARTIFACT_EXTENSION);
    Ok(path)
}

/// Read a heightmap artifact, resolve its tiles and write the tile artifact
/// into `output_dir`, which must already exist.
pub fn run_tiler_stage(
    input: &Path,
    output_dir: &Path,
    debug_tiles_png: Option<&Path>,
) -> Result<TilerStageSummary, PipelineError> {
    if !output_dir.is_dir() {
        return Err(PipelineError::MissingOutputDir(output_dir.to_path_buf()));
    }
    let output_path = tile_output_path(input, output_dir)?;

    let raw = fs::read(input).map_err(|e| PipelineError::io(input, e))?;
    let artifact_error = |source: ArtifactError| PipelineError::Artifact {
        path: input.to_path_buf(),
        source,
    };
    let heightmap = artifact::decode_heightmap(&raw).map_err(artifact_error)?;
    tracing::info!(
        target: "map_generator::pipeline",
        path = %input.display(),
        width = heightmap.width(),
        height = heightmap.height(),
        seed = heightmap.seed,
        "tiler.stage.start"
    );

    let (tile_width, tile_height, _) = artifact::tile_dims(
        heightmap.width() as u64 * TILE_EXPANSION as u64,
        heightmap.height() as u64 * TILE_EXPANSION as u64,
    )
    .map_err(artifact_error)?;

    let (masks, tiles) = build_tiles(&heightmap.layers);
    let interior = masks.as_slice().iter().filter(|&&m| m == FULL_MASK).count();
    tracing::info!(
        target: "map_generator::pipeline",
        cells = masks.len(),
        interior,
        tiles = tiles.len(),
        "tiler.tiles.resolved"
    );

    if let Some(path) = debug_tiles_png {
        export::export_tiles_png(&tiles, path).map_err(|e| PipelineError::export(path, e))?;
        tracing::debug!(target: "map_generator::pipeline", path = %path.display(), "tiler.debug.tiles_png");
    }

    let tile_artifact = TileArtifact::new(heightmap.seed, tiles);
    let bytes = tile_artifact.encode().map_err(artifact_error)?;
    artifact::write_atomic(&output_path, &bytes).map_err(|e| PipelineError::io(&output_path, e))?;
    tracing::info!(
        target: "map_generator::pipeline",
        path = %output_path.display(),
        bytes = bytes.len(),
        "tiler.output.written"
    );

    Ok(TilerStageSummary {
        output_path,
        bytes_written: bytes.len(),
        tile_width,
        tile_height,
        seed: tile_artifact.seed,
    })
}
