//! Fault-line heightmap generation.
//!
//! A signed accumulator grid is raised on one side of a random line and
//! lowered on the other, many times over. The result is rescaled into bytes
//! and each byte is classified into a terrain layer.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::job::HeightmapJob;
use crate::terrain::TerrainLayer;
use crate::tilemap::Tilemap;

// =============================================================================
// PARAMETERS
// =============================================================================

/// Height byte written to every cell when the accumulator is perfectly flat.
pub const NEUTRAL_HEIGHT: u8 = 128;

/// Tunables for heightmap generation that do not come from the job.
#[derive(Clone, Debug, PartialEq)]
pub struct FaultLineParams {
    /// Amount added on the positive side of each fault line and subtracted on the other.
    pub displacement: i32,
    /// Lines whose squared length falls below this are skipped.
    pub degenerate_epsilon: f32,
    /// Half-range of the hash noise seeded before fault lines (0 = off).
    pub noise_amplitude: i32,
    /// Number of 3x3 box smoothing passes run after fault lines (0 = off).
    pub smoothing_passes: u32,
}

impl Default for FaultLineParams {
    fn default() -> Self {
        Self {
            displacement: 2,
            degenerate_epsilon: 0.0001,
            noise_amplitude: 0,
            smoothing_passes: 0,
        }
    }
}

/// Counters reported by the fault-line pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaultLineStats {
    pub applied: u32,
    pub skipped_degenerate: u32,
}

// =============================================================================
// OUTPUT
// =============================================================================

/// A generated heightmap: normalized heights plus their terrain layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heightmap {
    pub seed: u64,
    pub heights: Tilemap<u8>,
    pub layers: Tilemap<TerrainLayer>,
}

impl Heightmap {
    /// Build a heightmap from normalized heights, classifying every cell.
    pub fn from_heights(heights: Tilemap<u8>, seed: u64) -> Self {
        let layers = classify_layers(&heights);
        Self { seed, heights, layers }
    }

    pub fn width(&self) -> usize {
        self.heights.width
    }

    pub fn height(&self) -> usize {
        self.heights.height
    }

    /// Number of cells in each layer, indexed by layer discriminant.
    pub fn layer_counts(&self) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for &layer in self.layers.as_slice() {
            counts[layer.as_u8() as usize] += 1;
        }
        counts
    }
}

/// Everything produced by one generation run.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub heightmap: Heightmap,
    pub fault_lines: FaultLineStats,
    /// True when the accumulator had no spread and the neutral height was used.
    pub flat: bool,
}

// =============================================================================
// MAIN GENERATION
// =============================================================================

/// Generate a heightmap for a job.
///
/// The only entropy source is a ChaCha8 generator seeded from `job.seed`, so
/// the same job and params always produce the same bytes.
pub fn generate_heightmap(job: &HeightmapJob, params: &FaultLineParams) -> GenerationReport {
    let width = job.width as usize;
    let height = job.height as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(job.seed);

    let mut accumulator = Tilemap::new_with(width, height, 0i32);

    if params.noise_amplitude > 0 {
        seed_height_noise(&mut accumulator, job.seed, params.noise_amplitude);
    }

    let fault_lines = apply_fault_lines(
        &mut accumulator,
        job.fault_line_iterations,
        params,
        &mut rng,
    );
    tracing::info!(
        target: "map_generator::heightmap",
        applied = fault_lines.applied,
        skipped = fault_lines.skipped_degenerate,
        "heightmap.fault_lines.complete"
    );

    if params.smoothing_passes > 0 {
        smooth_box(&mut accumulator, params.smoothing_passes);
    }

    let (heights, flat) = normalize_heights(&accumulator);
    if flat {
        tracing::warn!(
            target: "map_generator::heightmap",
            neutral = NEUTRAL_HEIGHT,
            "heightmap.normalize.flat_range"
        );
    }

    GenerationReport {
        heightmap: Heightmap::from_heights(heights, job.seed),
        fault_lines,
        flat,
    }
}

// =============================================================================
// FAULT LINES
// =============================================================================

/// Run `iterations` fault lines over the accumulator.
///
/// Iterations are strictly sequential; each one draws four coordinates from
/// `rng` in the order x1, y1, x2, y2 even when the line ends up skipped.
pub fn apply_fault_lines<R: Rng>(
    accumulator: &mut Tilemap<i32>,
    iterations: u32,
    params: &FaultLineParams,
    rng: &mut R,
) -> FaultLineStats {
    let width = accumulator.width;
    let height = accumulator.height;
    let mut stats = FaultLineStats::default();

    if width == 0 || height == 0 {
        return stats;
    }

    let width_f = width as f32;
    let height_f = height as f32;

    for iteration in 0..iterations {
        let x1: f32 = rng.gen_range(0.0..width_f);
        let y1: f32 = rng.gen_range(0.0..height_f);
        let x2: f32 = rng.gen_range(0.0..width_f);
        let y2: f32 = rng.gen_range(0.0..height_f);

        let dx = x2 - x1;
        let dy = y2 - y1;

        if dx * dx + dy * dy < params.degenerate_epsilon {
            tracing::warn!(
                target: "map_generator::heightmap",
                iteration,
                "heightmap.fault_line.degenerate_skipped"
            );
            stats.skipped_degenerate += 1;
            continue;
        }

        for (x, y, value) in accumulator.iter_mut() {
            let cx = x as f32 + 0.5;
            let cy = y as f32 + 0.5;
            let cross = (cx - x1) * dy - (cy - y1) * dx;

            *value = if cross >= 0.0 {
                value.saturating_add(params.displacement)
            } else {
                value.saturating_sub(params.displacement)
            };
        }

        stats.applied += 1;
    }

    stats
}

// =============================================================================
// OPTIONAL SHAPING
// =============================================================================

/// Largest noise amplitude the 16-bit hash can spread evenly over `[-a, a]`.
pub const MAX_NOISE_AMPLITUDE: i32 = 32_767;

/// Add per-cell hash noise in `[-amplitude, amplitude]`.
///
/// The noise is a pure function of position, seed and grid size. It does not
/// touch the RNG, so enabling it never changes which fault lines are drawn.
/// Amplitudes above [`MAX_NOISE_AMPLITUDE`] are clamped to it.
pub fn seed_height_noise(accumulator: &mut Tilemap<i32>, seed: u64, amplitude: i32) {
    if amplitude <= 0 {
        return;
    }
    let amplitude = i64::from(amplitude.min(MAX_NOISE_AMPLITUDE));

    let width = accumulator.width as u32;
    let height = accumulator.height as u32;
    let domain = (seed as u32)
        ^ width.wrapping_mul(0x9E37_79B1)
        ^ height.wrapping_mul(0x85EB_CA77);
    let span = amplitude * 2 + 1;

    for (x, y, value) in accumulator.iter_mut() {
        let mut h = (x as u32).wrapping_mul(374_761_393);
        h ^= (y as u32).wrapping_mul(668_265_263);
        h ^= domain;
        h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
        h ^= h >> 16;

        let noise = i64::from(h & 0xFFFF) % span - amplitude;
        *value = value.saturating_add(noise as i32);
    }
}

/// Apply `passes` rounds of a 3x3 box mean to interior cells.
///
/// Border cells keep their values. Grids smaller than 3x3 have no interior
/// and are returned unchanged.
pub fn smooth_box(accumulator: &mut Tilemap<i32>, passes: u32) {
    let width = accumulator.width;
    let height = accumulator.height;
    if width < 3 || height < 3 {
        return;
    }

    let mut scratch = accumulator.clone();

    for _ in 0..passes {
        {
            let src = accumulator.as_slice();
            let dst = scratch.as_mut_slice();
            for y in 1..height - 1 {
                for x in 1..width - 1 {
                    let idx = y * width + x;
                    let sum: i64 = [
                        idx - width - 1,
                        idx - width,
                        idx - width + 1,
                        idx - 1,
                        idx,
                        idx + 1,
                        idx + width - 1,
                        idx + width,
                        idx + width + 1,
                    ]
                    .iter()
                    .map(|&i| src[i] as i64)
                    .sum();
                    dst[idx] = (sum / 9) as i32;
                }
            }
        }
        std::mem::swap(accumulator, &mut scratch);
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Rescale the accumulator into `0..=255`.
///
/// Rounds half away from zero using exact integer arithmetic. Returns the
/// bytes and whether the flat-range fallback was taken.
pub fn normalize_heights(accumulator: &Tilemap<i32>) -> (Tilemap<u8>, bool) {
    let values = accumulator.as_slice();
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);

    if max == min {
        let flat = Tilemap::new_with(accumulator.width, accumulator.height, NEUTRAL_HEIGHT);
        return (flat, true);
    }

    let min = min as i64;
    let range = max as i64 - min;
    let normalized = accumulator.map(|&value| normalize_value(value as i64 - min, range));
    (normalized, false)
}

/// `round(255 * offset / range)` with halves rounded up, clamped to a byte.
fn normalize_value(offset: i64, range: i64) -> u8 {
    let scaled = (2 * 255 * offset + range) / (2 * range);
    scaled.clamp(0, 255) as u8
}

/// Classify every normalized height into its terrain layer.
pub fn classify_layers(heights: &Tilemap<u8>) -> Tilemap<TerrainLayer> {
    heights.map(|&h| TerrainLayer::classify(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(width: u32, height: u32, iterations: u32, seed: u64) -> HeightmapJob {
        HeightmapJob {
            job_id: "test".to_string(),
            width,
            height,
            fault_line_iterations: iterations,
            seed,
            requested_at_utc: None,
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let params = FaultLineParams::default();
        let a = generate_heightmap(&job(48, 32, 50, 12345), &params);
        let b = generate_heightmap(&job(48, 32, 50, 12345), &params);

        assert_eq!(a.heightmap, b.heightmap);
        assert_eq!(a.fault_lines, b.fault_lines);
    }

    #[test]
    fn test_different_seeds_differ() {
        let params = FaultLineParams::default();
        let a = generate_heightmap(&job(48, 32, 50, 1), &params);
        let b = generate_heightmap(&job(48, 32, 50, 2), &params);

        assert_ne!(a.heightmap.heights, b.heightmap.heights);
    }

    #[test]
    fn test_grid_sizes_match_dimensions() {
        let report = generate_heightmap(&job(17, 9, 20, 3), &FaultLineParams::default());

        assert_eq!(report.heightmap.heights.len(), 17 * 9);
        assert_eq!(report.heightmap.layers.len(), 17 * 9);
        assert_eq!(report.heightmap.width(), 17);
        assert_eq!(report.heightmap.height(), 9);
    }

    #[test]
    fn test_zero_iterations_is_flat_neutral() {
        let report = generate_heightmap(&job(5, 4, 0, 99), &FaultLineParams::default());

        assert!(report.flat);
        assert!(report.heightmap.heights.as_slice().iter().all(|&h| h == NEUTRAL_HEIGHT));
        assert!(report
            .heightmap
            .layers
            .as_slice()
            .iter()
            .all(|&l| l == TerrainLayer::Land));
    }

    #[test]
    fn test_single_cell_is_always_flat() {
        // One cell can only ever hold one value, so min == max.
        let report = generate_heightmap(&job(1, 1, 50, 4242), &FaultLineParams::default());

        assert!(report.flat);
        assert_eq!(report.heightmap.heights.as_slice(), &[NEUTRAL_HEIGHT]);
        assert_eq!(report.heightmap.layers.as_slice(), &[TerrainLayer::Land]);
    }

    #[test]
    fn test_non_flat_output_spans_full_byte_range() {
        let report = generate_heightmap(&job(64, 64, 50, 777), &FaultLineParams::default());
        let heights = report.heightmap.heights.as_slice();

        assert!(!report.flat);
        assert_eq!(heights.iter().copied().min(), Some(0));
        assert_eq!(heights.iter().copied().max(), Some(255));
    }

    #[test]
    fn test_layers_follow_heights() {
        let report = generate_heightmap(&job(32, 32, 40, 5), &FaultLineParams::default());
        let heightmap = &report.heightmap;

        for (x, y, &h) in heightmap.heights.iter() {
            assert_eq!(*heightmap.layers.get(x, y), TerrainLayer::classify(h));
        }
        assert_eq!(heightmap.layer_counts().iter().sum::<usize>(), 32 * 32);
    }

    #[test]
    fn test_fault_line_preserves_total_displacement_parity() {
        // Every applied line moves every cell by exactly +/- displacement.
        let params = FaultLineParams::default();
        let mut acc = Tilemap::new_with(10, 6, 0i32);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let stats = apply_fault_lines(&mut acc, 25, &params, &mut rng);

        assert_eq!(stats.applied + stats.skipped_degenerate, 25);
        let bound = stats.applied as i32 * params.displacement;
        for &value in acc.as_slice() {
            assert!(value.abs() <= bound);
            assert_eq!((value - bound).rem_euclid(2 * params.displacement), 0);
        }
    }

    #[test]
    fn test_degenerate_lines_are_skipped() {
        // An epsilon larger than any possible squared length skips everything.
        let params = FaultLineParams {
            degenerate_epsilon: f32::MAX,
            ..FaultLineParams::default()
        };
        let mut acc = Tilemap::new_with(4, 4, 0i32);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let stats = apply_fault_lines(&mut acc, 10, &params, &mut rng);

        assert_eq!(stats.applied, 0);
        assert_eq!(stats.skipped_degenerate, 10);
        assert!(acc.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_normalize_rounds_half_up() {
        // range 2: offsets 0, 1, 2 map to 0, 127.5 -> 128, 255
        let acc = Tilemap::from_vec(3, 1, vec![-4, -3, -2]).unwrap();
        let (bytes, flat) = normalize_heights(&acc);

        assert!(!flat);
        assert_eq!(bytes.as_slice(), &[0, 128, 255]);
    }

    #[test]
    fn test_normalize_rounds_to_nearest() {
        // range 3: 85.0 and 170.0 exactly
        let acc = Tilemap::from_vec(4, 1, vec![0, 1, 2, 3]).unwrap();
        let (bytes, _) = normalize_heights(&acc);
        assert_eq!(bytes.as_slice(), &[0, 85, 170, 255]);

        // range 7: 255/7 = 36.43 -> 36, 2*255/7 = 72.86 -> 73
        let acc = Tilemap::from_vec(4, 1, vec![0, 1, 2, 7]).unwrap();
        let (bytes, _) = normalize_heights(&acc);
        assert_eq!(bytes.as_slice(), &[0, 36, 73, 255]);
    }

    #[test]
    fn test_normalize_handles_extreme_range() {
        let acc = Tilemap::from_vec(3, 1, vec![i32::MIN, 0, i32::MAX]).unwrap();
        let (bytes, flat) = normalize_heights(&acc);

        assert!(!flat);
        assert_eq!(bytes.as_slice(), &[0, 128, 255]);
    }

    #[test]
    fn test_normalize_flat_non_zero_values() {
        let acc = Tilemap::new_with(3, 3, -42i32);
        let (bytes, flat) = normalize_heights(&acc);

        assert!(flat);
        assert!(bytes.as_slice().iter().all(|&b| b == NEUTRAL_HEIGHT));
    }

    #[test]
    fn test_noise_is_bounded_and_deterministic() {
        let mut a = Tilemap::new_with(16, 16, 0i32);
        let mut b = Tilemap::new_with(16, 16, 0i32);
        seed_height_noise(&mut a, 31, 2);
        seed_height_noise(&mut b, 31, 2);

        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|&v| (-2..=2).contains(&v)));
        assert!(a.as_slice().iter().any(|&v| v != 0));
    }

    #[test]
    fn test_noise_amplitude_is_clamped() {
        let mut huge = Tilemap::new_with(8, 8, 0i32);
        let mut max = Tilemap::new_with(8, 8, 0i32);
        seed_height_noise(&mut huge, 1, i32::MAX);
        seed_height_noise(&mut max, 1, MAX_NOISE_AMPLITUDE);

        assert_eq!(huge, max);
        assert!(max
            .as_slice()
            .iter()
            .all(|v| (-MAX_NOISE_AMPLITUDE..=MAX_NOISE_AMPLITUDE).contains(v)));
    }

    #[test]
    fn test_noise_does_not_shift_fault_lines() {
        let plain = FaultLineParams::default();
        let noisy = FaultLineParams {
            noise_amplitude: 1,
            ..FaultLineParams::default()
        };
        let a = generate_heightmap(&job(20, 20, 30, 9), &plain);
        let b = generate_heightmap(&job(20, 20, 30, 9), &noisy);

        assert_eq!(a.fault_lines, b.fault_lines);
    }

    #[test]
    fn test_smoothing_keeps_border_and_averages_interior() {
        let mut acc = Tilemap::new_with(3, 3, 0i32);
        acc.set(1, 1, 90);
        smooth_box(&mut acc, 1);

        assert_eq!(*acc.get(1, 1), 10);
        assert_eq!(*acc.get(0, 0), 0);
        assert_eq!(*acc.get(2, 1), 0);
    }

    #[test]
    fn test_smoothing_small_grid_is_noop() {
        let mut acc = Tilemap::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
        smooth_box(&mut acc, 3);
        assert_eq!(acc.as_slice(), &[1, 2, 3, 4]);
    }
}
