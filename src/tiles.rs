//! Tile-id resolution.
//!
//! A tile id packs the terrain layer into the high byte and the adjacency
//! mask into the low nibble, so consumers can decode it without a table.
//! Every source cell expands into a 2x2 block of identical ids; there is no
//! sub-cell variation yet.

use thiserror::Error;

use crate::adjacency::{compute_adjacency_masks, FULL_MASK};
use crate::terrain::TerrainLayer;
use crate::tilemap::Tilemap;

/// Output tiles per source cell along each axis.
pub const TILE_EXPANSION: usize = 2;

/// Packed `(layer << 8) | mask` identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u16);

impl TileId {
    pub fn new(layer: TerrainLayer, mask: u8) -> Self {
        debug_assert!(mask <= FULL_MASK);
        Self(((layer.as_u8() as u16) << 8) | (mask & FULL_MASK) as u16)
    }

    /// Accept a raw id only if it decodes to a known layer and a 4-bit mask.
    pub fn from_raw(raw: u16) -> Option<Self> {
        let layer = (raw >> 8) as u8;
        let low = (raw & 0xFF) as u8;
        if TerrainLayer::try_from(layer).is_ok() && low <= FULL_MASK {
            Some(Self(raw))
        } else {
            None
        }
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn layer_value(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn layer(self) -> Option<TerrainLayer> {
        TerrainLayer::try_from(self.layer_value()).ok()
    }

    pub fn mask(self) -> u8 {
        (self.0 & FULL_MASK as u16) as u8
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("layer grid is {layers:?} but mask grid is {masks:?}")]
pub struct ShapeMismatch {
    pub layers: (usize, usize),
    pub masks: (usize, usize),
}

/// Combine layers and masks into a tile grid twice as wide and tall.
pub fn resolve_tiles(
    layers: &Tilemap<TerrainLayer>,
    masks: &Tilemap<u8>,
) -> Result<Tilemap<TileId>, ShapeMismatch> {
    if layers.width != masks.width || layers.height != masks.height {
        return Err(ShapeMismatch {
            layers: (layers.width, layers.height),
            masks: (masks.width, masks.height),
        });
    }

    Ok(expand(layers, masks))
}

/// Masks and tiles for a layer grid in one call.
pub fn build_tiles(layers: &Tilemap<TerrainLayer>) -> (Tilemap<u8>, Tilemap<TileId>) {
    let masks = compute_adjacency_masks(layers);
    let tiles = expand(layers, &masks);
    (masks, tiles)
}

fn expand(layers: &Tilemap<TerrainLayer>, masks: &Tilemap<u8>) -> Tilemap<TileId> {
    Tilemap::par_from_fn(
        layers.width * TILE_EXPANSION,
        layers.height * TILE_EXPANSION,
        |tx, ty| {
            let (cx, cy) = (tx / TILE_EXPANSION, ty / TILE_EXPANSION);
            TileId::new(*layers.get(cx, cy), *masks.get(cx, cy))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_layers(width: usize, height: usize, seed: u64) -> Tilemap<TerrainLayer> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let data = (0..width * height)
            .map(|_| TerrainLayer::ALL[rng.gen_range(0..4)])
            .collect();
        Tilemap::from_vec(width, height, data).unwrap()
    }

    #[test]
    fn test_packing_layout() {
        assert_eq!(TileId::new(TerrainLayer::Water, 0).raw(), 0x0000);
        assert_eq!(TileId::new(TerrainLayer::Land, 0).raw(), 256);
        assert_eq!(TileId::new(TerrainLayer::PineMountain, 5).raw(), 0x0205);
        assert_eq!(TileId::new(TerrainLayer::RockMountain, 15).raw(), 0x030F);
    }

    #[test]
    fn test_from_raw_validates() {
        assert_eq!(TileId::from_raw(0x030F), Some(TileId(0x030F)));
        assert_eq!(TileId::from_raw(0x0410), None);
        assert_eq!(TileId::from_raw(0x0400), None);
        assert_eq!(TileId::from_raw(0x0110), None);
    }

    #[test]
    fn test_single_land_cell_expands_to_four_256s() {
        let layers = Tilemap::new_with(1, 1, TerrainLayer::Land);
        let (masks, tiles) = build_tiles(&layers);

        assert_eq!(masks.as_slice(), &[0]);
        assert_eq!((tiles.width, tiles.height), (2, 2));
        assert!(tiles.as_slice().iter().all(|t| t.raw() == 256));
    }

    #[test]
    fn test_ids_decompose_to_layer_and_mask() {
        let layers = random_layers(13, 9, 21);
        let (masks, tiles) = build_tiles(&layers);

        for (tx, ty, tile) in tiles.iter() {
            let (cx, cy) = (tx / 2, ty / 2);
            assert_eq!(tile.layer(), Some(*layers.get(cx, cy)));
            assert_eq!(tile.raw() >> 8, layers.get(cx, cy).as_u8() as u16);
            assert_eq!(tile.mask(), *masks.get(cx, cy));
            assert_eq!((tile.raw() & 0x0F) as u8, *masks.get(cx, cy));
        }
    }

    #[test]
    fn test_each_cell_fills_a_2x2_block() {
        let layers = random_layers(7, 5, 4);
        let (_, tiles) = build_tiles(&layers);

        assert_eq!((tiles.width, tiles.height), (14, 10));
        for cy in 0..5 {
            for cx in 0..7 {
                let id = *tiles.get(2 * cx, 2 * cy);
                assert_eq!(*tiles.get(2 * cx + 1, 2 * cy), id);
                assert_eq!(*tiles.get(2 * cx, 2 * cy + 1), id);
                assert_eq!(*tiles.get(2 * cx + 1, 2 * cy + 1), id);
            }
        }
    }

    #[test]
    fn test_resolve_matches_build() {
        let layers = random_layers(6, 6, 8);
        let masks = compute_adjacency_masks(&layers);
        let resolved = resolve_tiles(&layers, &masks).unwrap();
        let (_, built) = build_tiles(&layers);

        assert_eq!(resolved, built);
    }

    #[test]
    fn test_resolve_rejects_shape_mismatch() {
        let layers = Tilemap::new_with(3, 2, TerrainLayer::Water);
        let masks = Tilemap::new_with(2, 3, 0u8);

        assert_eq!(
            resolve_tiles(&layers, &masks),
            Err(ShapeMismatch { layers: (3, 2), masks: (2, 3) })
        );
    }
}
