//! Tile artifact codec.
//!
//! Layout (little-endian):
//!
//! ```text
//! [u8; 4] magic "MTIL"
//! u32     format_version
//! u32     tile_width
//! u32     tile_height
//! u64     deterministic_seed
//! u32     tile_count (tile_width * tile_height)
//! u32     reserved (0)
//! u16[tile_count] tile ids (row-major)
//! ```

use super::{ArtifactError, ByteReader};
use crate::tiles::TileId;
use crate::tilemap::Tilemap;

pub const TILE_MAGIC: [u8; 4] = *b"MTIL";
pub const TILE_FORMAT_VERSION: u32 = 1;
pub const TILE_HEADER_LEN: usize = 32;

/// A resolved tile grid together with its provenance seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileArtifact {
    pub seed: u64,
    pub tiles: Tilemap<TileId>,
}

/// Header `(tile_width, tile_height, tile_count)` for a tile grid, or
/// `SizeOverflow` when any of them does not fit the header's `u32` fields.
pub fn tile_dims(width: u64, height: u64) -> Result<(u32, u32, u32), ArtifactError> {
    let overflow = ArtifactError::SizeOverflow { width, height };
    let tile_width = u32::try_from(width).map_err(|_| overflow.clone())?;
    let tile_height = u32::try_from(height).map_err(|_| overflow.clone())?;
    let count = tile_width.checked_mul(tile_height).ok_or(overflow)?;
    Ok((tile_width, tile_height, count))
}

impl TileArtifact {
    pub fn new(seed: u64, tiles: Tilemap<TileId>) -> Self {
        Self { seed, tiles }
    }

    pub fn tile_width(&self) -> usize {
        self.tiles.width
    }

    pub fn tile_height(&self) -> usize {
        self.tiles.height
    }

    /// Serialize the artifact, refusing grids whose header fields would wrap.
    pub fn encode(&self) -> Result<Vec<u8>, ArtifactError> {
        let (width, height, count) = tile_dims(self.tiles.width as u64, self.tiles.height as u64)?;
        let mut out = Vec::with_capacity(TILE_HEADER_LEN + self.tiles.len() * 2);

        out.extend_from_slice(&TILE_MAGIC);
        out.extend_from_slice(&TILE_FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&self.seed.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        for tile in self.tiles.as_slice() {
            out.extend_from_slice(&tile.raw().to_le_bytes());
        }

        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ArtifactError> {
        if bytes.len() < TILE_HEADER_LEN {
            return Err(ArtifactError::Truncated {
                expected: TILE_HEADER_LEN,
                actual: bytes.len(),
            });
        }

        let mut reader = ByteReader::new(bytes);
        let magic: [u8; 4] = reader.read_array();
        if magic != TILE_MAGIC {
            return Err(ArtifactError::BadMagic { found: magic });
        }
        let version = reader.read_u32();
        if version != TILE_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(version));
        }
        let width = reader.read_u32();
        let height = reader.read_u32();
        let seed = reader.read_u64();
        let count = reader.read_u32();
        let reserved = reader.read_u32();

        if reserved != 0 {
            return Err(ArtifactError::ReservedNonZero(reserved));
        }
        if width == 0 || height == 0 {
            return Err(ArtifactError::ZeroDimension { width, height });
        }
        if (width as u64) * (height as u64) != count as u64 {
            return Err(ArtifactError::TileCountMismatch { width, height, count });
        }

        let payload = reader.remaining();
        let expected = count as u64 * 2;
        if payload.len() as u64 != expected {
            return Err(ArtifactError::LengthMismatch {
                width,
                height,
                expected,
                actual: payload.len() as u64,
            });
        }

        let mut reader = ByteReader::new(payload);
        let tiles = (0..count as usize)
            .map(|index| {
                let value = reader.read_u16();
                TileId::from_raw(value).ok_or(ArtifactError::InvalidTileId { index, value })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let tiles = Tilemap::from_vec(width as usize, height as usize, tiles)
            .ok_or(ArtifactError::SizeOverflow {
                width: u64::from(width),
                height: u64::from(height),
            })?;

        Ok(Self { seed, tiles })
    }
}
