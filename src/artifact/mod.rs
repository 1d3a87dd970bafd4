//! Binary artifacts passed between pipeline stages.
//!
//! Both formats are little-endian with fixed-width headers. Decoders validate
//! every length against the header and never truncate or pad.

pub mod heightmap;
pub mod tiles;

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

pub use heightmap::{decode_heightmap, encode_heightmap, HEIGHTMAP_HEADER_LEN};
pub use tiles::{tile_dims, TileArtifact, TILE_FORMAT_VERSION, TILE_HEADER_LEN, TILE_MAGIC};

/// Structural problems found while decoding an artifact.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("corrupt artifact: need at least {expected} header bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("corrupt artifact: header declares empty grid {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("grid dimensions {width}x{height} overflow the artifact header")]
    SizeOverflow { width: u64, height: u64 },
    #[error(
        "corrupt artifact: {width}x{height} grid needs {expected} payload bytes, found {actual}"
    )]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: u64,
        actual: u64,
    },
    #[error("corrupt artifact: cell {index} has unknown terrain layer {value}")]
    InvalidTerrainLayer { index: usize, value: u8 },
    #[error("corrupt artifact: bad magic {found:?}")]
    BadMagic { found: [u8; 4] },
    #[error("corrupt artifact: unsupported format version {0}")]
    UnsupportedVersion(u32),
    #[error("corrupt artifact: tile count {count} does not match {width}x{height}")]
    TileCountMismatch { width: u32, height: u32, count: u32 },
    #[error("corrupt artifact: reserved header field is {0}, expected 0")]
    ReservedNonZero(u32),
    #[error("corrupt artifact: tile {index} has invalid id {value:#06x}")]
    InvalidTileId { index: usize, value: u16 },
}

/// Little-endian cursor over an artifact buffer.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    /// Callers check the header length up front, so running short here is a bug.
    pub(crate) fn read_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    pub(crate) fn read_u16(&mut self) -> u16 {
        u16::from_le_bytes(self.read_array())
    }

    pub(crate) fn read_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.read_array())
    }

    pub(crate) fn read_u64(&mut self) -> u64 {
        u64::from_le_bytes(self.read_array())
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory.
///
/// The destination either keeps its previous state or receives the complete
/// buffer; a failed write never leaves a partial file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
