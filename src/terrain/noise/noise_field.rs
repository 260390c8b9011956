//! Fractal (multi-octave) height field synthesis.
//!
//! Everything here is a pure function of its arguments: the same parameters
//! always give a bit-identical grid, on any thread.

use glam::{DVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::terrain::grid::HeightGrid;
use crate::terrain::noise::noise_parameters::{NoiseParameters, NormalizeMode};
use crate::terrain::noise::noise_utils::create_base_noise_from_params;

/// Range of the per-octave random offsets.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Un-normalized octave sums plus the extremes observed while accumulating.
#[derive(Debug, Clone)]
pub struct RawField {
    pub values: HeightGrid,
    pub min: f32,
    pub max: f32,
}

/// One sampling offset per octave, derived from the seed and global offset.
pub fn octave_offsets(params: &NoiseParameters) -> Vec<DVec2> {
    let mut prng = ChaCha8Rng::seed_from_u64(params.seed as u64);
    (0..params.octaves)
        .map(|_| {
            let x = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 + params.offset.x as f64;
            // Subtracted: grid rows run toward -z in the mesh (`top_left_z - local_y`),
            // so a larger y offset reveals the terrain north of row 0.
            let y = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 - params.offset.y as f64;
            DVec2::new(x, y)
        })
        .collect()
}

/// Accumulate the octaves for every cell without normalizing.
pub fn generate_raw(width: usize, height: usize, params: &NoiseParameters) -> RawField {
    let scale = params.effective_scale() as f64;
    let offsets = octave_offsets(params);
    let noise = create_base_noise_from_params(params);

    let half_width = width as f64 / 2.0;
    let half_height = height as f64 / 2.0;

    let mut min = f32::MAX;
    let mut max = f32::MIN;

    let values = HeightGrid::from_fn(width, height, |x, y| {
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f64;
        let mut noise_height = 0.0f32;

        for offset in &offsets {
            let sample_x = (x as f64 - half_width + offset.x) / scale * frequency;
            let sample_y = (y as f64 - half_height + offset.y) / scale * frequency;

            let value = noise.sample(sample_x, sample_y) * 2.0 - 1.0;
            noise_height += value * amplitude;

            amplitude *= params.persistence;
            frequency *= params.lacunarity as f64;
        }

        min = min.min(noise_height);
        max = max.max(noise_height);
        noise_height
    });

    if width == 0 || height == 0 {
        min = 0.0;
        max = 0.0;
    }

    RawField { values, min, max }
}

/// Map a raw field into the output range selected by `mode`.
pub fn normalize(raw: &RawField, params: &NoiseParameters, mode: NormalizeMode) -> HeightGrid {
    match mode {
        NormalizeMode::Local => {
            let range = raw.max - raw.min;
            raw.values.map(|v| if range > 0.0 { (v - raw.min) / range } else { 0.0 })
        }
        NormalizeMode::Global => {
            let max_amplitude = params.max_possible_amplitude();
            raw.values.map(|v| {
                if max_amplitude > 0.0 {
                    ((v + max_amplitude) / (2.0 * max_amplitude)).max(0.0)
                } else {
                    0.0
                }
            })
        }
    }
}

/// Generate a normalized `width` × `height` height grid.
pub fn generate(width: usize, height: usize, params: &NoiseParameters) -> HeightGrid {
    let raw = generate_raw(width, height, params);
    normalize(&raw, params, params.normalize_mode)
}

/// Generate a square grid centred on `centre`. Streamed tiles go through here
/// with `centre = coordinate * (edge - 1)`.
pub fn generate_at(size: usize, params: &NoiseParameters, centre: Vec2) -> HeightGrid {
    generate(size, size, &params.centred_at(centre))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NoiseParameters {
        NoiseParameters { seed: 42, scale: 27.6, octaves: 5, persistence: 0.45, lacunarity: 2.1, ..Default::default() }
    }

    #[test]
    fn identical_arguments_give_identical_grids() {
        let a = generate(64, 48, &params());
        let b = generate(64, 48, &params());
        assert_eq!(a.width(), 64);
        assert_eq!(a.height(), 48);
        assert!(a.cells().iter().zip(b.cells()).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(32, 32, &params());
        let b = generate(32, 32, &NoiseParameters { seed: 43, ..params() });
        assert_ne!(a, b);
    }

    #[test]
    fn offsets_are_seeded() {
        assert_eq!(octave_offsets(&params()), octave_offsets(&params()));
        assert_eq!(octave_offsets(&params()).len(), 5);
    }

    #[test]
    fn local_mode_spans_unit_interval() {
        let p = NoiseParameters { normalize_mode: NormalizeMode::Local, ..params() };
        let grid = generate(50, 50, &p);
        let (lo, hi) = grid.min_max().unwrap();
        assert!(lo.abs() < 1e-6);
        assert!((hi - 1.0).abs() < 1e-6);
    }

    #[test]
    fn local_mode_flat_field_is_zero() {
        let p = NoiseParameters { normalize_mode: NormalizeMode::Local, octaves: 0, ..params() };
        let grid = generate(8, 8, &p);
        assert!(grid.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn global_mode_is_non_negative_and_clamps_floor() {
        let p = params();
        let raw = generate_raw(40, 40, &p);
        let grid = normalize(&raw, &p, NormalizeMode::Global);
        assert!(grid.iter().all(|v| *v >= 0.0));

        let max_amplitude = p.max_possible_amplitude();
        let floor = RawField {
            values: HeightGrid::from_vec(2, 1, vec![-max_amplitude, -max_amplitude * 3.0]),
            min: -max_amplitude * 3.0,
            max: -max_amplitude,
        };
        let clamped = normalize(&floor, &p, NormalizeMode::Global);
        assert_eq!(clamped.cells(), &[0.0, 0.0]);
    }

    #[test]
    fn zero_scale_does_not_produce_nan() {
        let p = NoiseParameters { scale: 0.0, ..params() };
        let grid = generate(16, 16, &p);
        assert!(grid.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn raising_y_offset_shifts_rows_down() {
        let p = NoiseParameters { normalize_mode: NormalizeMode::Global, ..params() };
        let base = generate(12, 12, &p);
        let mut raised = p.clone();
        raised.offset.y += 1.0;
        let shifted = generate(12, 12, &raised);

        for y in 1..12 {
            for x in 0..12 {
                assert!((shifted.at(x, y) - base.at(x, y - 1)).abs() < 1e-6, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn adjacent_tiles_share_their_edge() {
        // 21-wide logical edge plus one border ring each side
        let edge = 21usize;
        let size = edge + 2;
        let step = (edge - 1) as f32;
        let p = params();

        let left = generate_at(size, &p, Vec2::new(0.0, 0.0));
        let right = generate_at(size, &p, Vec2::new(step, 0.0));
        for y in 0..size {
            let a = left.at(edge, y);
            let b = right.at(1, y);
            assert!((a - b).abs() < 1e-5, "row {y}: {a} vs {b}");
        }

        let up = generate_at(size, &p, Vec2::new(0.0, step));
        for x in 0..size {
            let a = left.at(x, 1);
            let b = up.at(x, edge);
            assert!((a - b).abs() < 1e-5, "column {x}: {a} vs {b}");
        }
    }
}
