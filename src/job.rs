//! Heightmap job descriptors.
//!
//! Jobs arrive as JSON files written by an external producer. Width, height
//! and seed are never defaulted: a job missing any of them is rejected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Fault-line iterations used when the job does not specify a count.
pub const DEFAULT_FAULT_LINE_ITERATIONS: u32 = 50;

/// A validated heightmap job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightmapJob {
    pub job_id: String,
    pub width: u32,
    pub height: u32,
    pub fault_line_iterations: u32,
    pub seed: u64,
    /// Provenance only. Kept verbatim and never read by generation.
    pub requested_at_utc: Option<String>,
}

/// Wire shape of the job file. Numeric fields are read wide so that
/// out-of-range values can be reported against the field that carried them.
#[derive(Debug, Deserialize)]
struct RawJob {
    job_id: Option<String>,
    map_width_in_cells: Option<i64>,
    map_height_in_cells: Option<i64>,
    fault_line_iteration_count: Option<i64>,
    random_seed: Option<u64>,
    requested_at_utc: Option<String>,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to read job file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse job JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("job is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("job field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("job field `{field}` must be greater than zero (got {value})")]
    NonPositive { field: &'static str, value: i64 },
    #[error("job field `{field}` must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },
    #[error("job field `{field}` is out of range (got {value})")]
    OutOfRange { field: &'static str, value: i64 },
}

impl HeightmapJob {
    /// Load and validate a job file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| JobError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, JobError> {
        let raw: RawJob = serde_json::from_str(contents)?;
        Self::validate(raw)
    }

    fn validate(raw: RawJob) -> Result<Self, JobError> {
        let job_id = raw.job_id.ok_or(JobError::MissingField("job_id"))?;
        if job_id.trim().is_empty() {
            return Err(JobError::EmptyField("job_id"));
        }

        let width = positive_dimension(
            "map_width_in_cells",
            raw.map_width_in_cells
                .ok_or(JobError::MissingField("map_width_in_cells"))?,
        )?;
        let height = positive_dimension(
            "map_height_in_cells",
            raw.map_height_in_cells
                .ok_or(JobError::MissingField("map_height_in_cells"))?,
        )?;
        let seed = raw.random_seed.ok_or(JobError::MissingField("random_seed"))?;

        let fault_line_iterations = match raw.fault_line_iteration_count {
            None => DEFAULT_FAULT_LINE_ITERATIONS,
            Some(value) if value < 0 => {
                return Err(JobError::Negative {
                    field: "fault_line_iteration_count",
                    value,
                })
            }
            Some(value) => u32::try_from(value).map_err(|_| JobError::OutOfRange {
                field: "fault_line_iteration_count",
                value,
            })?,
        };

        Ok(Self {
            job_id,
            width,
            height,
            fault_line_iterations,
            seed,
            requested_at_utc: raw.requested_at_utc,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Parse the provenance timestamp, if present and well formed.
    pub fn requested_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.requested_at_utc.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

fn positive_dimension(field: &'static str, value: i64) -> Result<u32, JobError> {
    if value <= 0 {
        return Err(JobError::NonPositive { field, value });
    }
    u32::try_from(value).map_err(|_| JobError::OutOfRange { field, value })
}
