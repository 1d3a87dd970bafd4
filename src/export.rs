use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

use crate::terrain::TerrainLayer;
use crate::tilemap::Tilemap;
use crate::tiles::TileId;

/// Debug colour for each terrain layer.
pub fn layer_color(layer: TerrainLayer) -> [u8; 3] {
    match layer {
        TerrainLayer::Water => [30, 80, 180],
        TerrainLayer::Land => [90, 170, 70],
        TerrainLayer::PineMountain => [30, 90, 40],
        TerrainLayer::RockMountain => [130, 130, 130],
    }
}

/// Render normalized heights as 8-bit grayscale, black at 0 and white at 255.
pub fn render_heights(heights: &Tilemap<u8>) -> GrayImage {
    ImageBuffer::from_fn(heights.width as u32, heights.height as u32, |x, y| {
        Luma([*heights.get(x as usize, y as usize)])
    })
}

pub fn render_layers(layers: &Tilemap<TerrainLayer>) -> RgbImage {
    ImageBuffer::from_fn(layers.width as u32, layers.height as u32, |x, y| {
        Rgb(layer_color(*layers.get(x as usize, y as usize)))
    })
}

/// Render tiles coloured by layer, darkened where fewer neighbours match.
///
/// Interior tiles (mask 15) keep the full layer colour; isolated tiles drop
/// to 60% brightness so region borders stand out.
pub fn render_tiles(tiles: &Tilemap<TileId>) -> RgbImage {
    ImageBuffer::from_fn(tiles.width as u32, tiles.height as u32, |x, y| {
        let tile = *tiles.get(x as usize, y as usize);
        let base = tile.layer().map(layer_color).unwrap_or([255, 0, 255]);
        let shade = 0.6 + 0.1 * tile.mask().count_ones() as f32;
        Rgb(base.map(|c| (c as f32 * shade).round().min(255.0) as u8))
    })
}

pub fn export_heights_png(heights: &Tilemap<u8>, path: &Path) -> Result<(), image::ImageError> {
    render_heights(heights).save(path)
}

pub fn export_layers_png(
    layers: &Tilemap<TerrainLayer>,
    path: &Path,
) -> Result<(), image::ImageError> {
    render_layers(layers).save(path)
}

pub fn export_tiles_png(tiles: &Tilemap<TileId>, path: &Path) -> Result<(), image::ImageError> {
    render_tiles(tiles).save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::build_tiles;
    use tempfile::tempdir;

    #[test]
    fn test_heights_map_directly_to_luma() {
        let heights = Tilemap::from_vec(3, 1, vec![0, 128, 255]).unwrap();
        let img = render_heights(&heights);

        assert_eq!(img.dimensions(), (3, 1));
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(1, 0).0, [128]);
        assert_eq!(img.get_pixel(2, 0).0, [255]);
    }

    #[test]
    fn test_layer_colors_are_distinct() {
        for (i, a) in TerrainLayer::ALL.iter().enumerate() {
            for b in &TerrainLayer::ALL[i + 1..] {
                assert_ne!(layer_color(*a), layer_color(*b));
            }
        }
    }

    #[test]
    fn test_tile_shading_tracks_mask() {
        let layers = Tilemap::new_with(3, 3, TerrainLayer::Land);
        let (_, tiles) = build_tiles(&layers);
        let img = render_tiles(&tiles);

        assert_eq!(img.dimensions(), (6, 6));
        // Centre cell has all four neighbours, a corner only two.
        assert_eq!(img.get_pixel(2, 2).0, layer_color(TerrainLayer::Land));
        assert!(img.get_pixel(0, 0).0[1] < img.get_pixel(2, 2).0[1]);
    }

    #[test]
    fn test_export_writes_png_files() {
        let dir = tempdir().unwrap();
        let layers = Tilemap::new_with(4, 2, TerrainLayer::Water);
        let heights = Tilemap::new_with(4, 2, 40u8);
        let (_, tiles) = build_tiles(&layers);

        let heights_path = dir.path().join("heights.png");
        let layers_path = dir.path().join("layers.png");
        let tiles_path = dir.path().join("tiles.png");
        export_heights_png(&heights, &heights_path).unwrap();
        export_layers_png(&layers, &layers_path).unwrap();
        export_tiles_png(&tiles, &tiles_path).unwrap();

        let reloaded = image::open(&tiles_path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (8, 4));
        assert!(heights_path.exists());
        assert!(layers_path.exists());
    }
}
