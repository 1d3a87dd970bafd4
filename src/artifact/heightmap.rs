//! Heightmap artifact codec.
//!
//! Layout (little-endian):
//!
//! ```text
//! u32 width_in_cells
//! u32 height_in_cells
//! u64 random_seed
//! u8[width*height] normalized heights (row-major)
//! u8[width*height] terrain layers (row-major, 0..=3)
//! ```

use super::{ArtifactError, ByteReader};
use crate::heightmap::Heightmap;
use crate::terrain::TerrainLayer;
use crate::tilemap::Tilemap;

pub const HEIGHTMAP_HEADER_LEN: usize = 16;

/// Serialize a heightmap into its artifact bytes.
pub fn encode_heightmap(heightmap: &Heightmap) -> Vec<u8> {
    let cells = heightmap.heights.len();
    let mut out = Vec::with_capacity(HEIGHTMAP_HEADER_LEN + cells * 2);

    out.extend_from_slice(&(heightmap.width() as u32).to_le_bytes());
    out.extend_from_slice(&(heightmap.height() as u32).to_le_bytes());
    out.extend_from_slice(&heightmap.seed.to_le_bytes());
    out.extend_from_slice(heightmap.heights.as_slice());
    out.extend(heightmap.layers.as_slice().iter().map(|layer| layer.as_u8()));

    out
}

/// Parse and validate a heightmap artifact.
pub fn decode_heightmap(bytes: &[u8]) -> Result<Heightmap, ArtifactError> {
    if bytes.len() < HEIGHTMAP_HEADER_LEN {
        return Err(ArtifactError::Truncated {
            expected: HEIGHTMAP_HEADER_LEN,
            actual: bytes.len(),
        });
    }

    let mut reader = ByteReader::new(bytes);
    let width = reader.read_u32();
    let height = reader.read_u32();
    let seed = reader.read_u64();

    if width == 0 || height == 0 {
        return Err(ArtifactError::ZeroDimension { width, height });
    }

    let overflow = ArtifactError::SizeOverflow {
        width: u64::from(width),
        height: u64::from(height),
    };
    let cells = (width as u64)
        .checked_mul(height as u64)
        .ok_or(overflow.clone())?;
    let expected = cells.checked_mul(2).ok_or(overflow.clone())?;

    let payload = reader.remaining();
    let mismatch = ArtifactError::LengthMismatch {
        width,
        height,
        expected,
        actual: payload.len() as u64,
    };
    if payload.len() as u64 != expected {
        return Err(mismatch);
    }

    let cells = usize::try_from(cells).map_err(|_| overflow)?;
    let (height_bytes, layer_bytes) = payload.split_at(cells);

    let layers = layer_bytes
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            TerrainLayer::try_from(value)
                .map_err(|_| ArtifactError::InvalidTerrainLayer { index, value })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (width, height) = (width as usize, height as usize);
    let heights = Tilemap::from_vec(width, height, height_bytes.to_vec()).ok_or(mismatch.clone())?;
    let layers = Tilemap::from_vec(width, height, layers).ok_or(mismatch)?;

    Ok(Heightmap { seed, heights, layers })
}
