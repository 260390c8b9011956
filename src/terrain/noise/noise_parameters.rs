// src/terrain/noise/noise_parameters.rs
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest noise scale the field will sample with; anything at or below zero
/// is replaced by this.
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// Coherent noise used for every octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaseNoiseType {
    #[default]
    Perlin,
    OpenSimplex,
    Value,
}

/// How raw octave sums are mapped into the output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Remap the observed min/max of this grid onto [0, 1]. Neighbouring
    /// grids will not agree on absolute height, so this is for single previews.
    Local,
    /// Remap against the largest amplitude sum the octaves can produce.
    /// Independently generated tiles with the same parameters line up.
    #[default]
    Global,
}

// --- Main Parameter Struct ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParameters {
    pub seed: u32,
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: Vec2,
    pub normalize_mode: NormalizeMode,
    pub noise_type: BaseNoiseType,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 25.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Global,
            noise_type: BaseNoiseType::Perlin,
        }
    }
}

impl NoiseParameters {
    /// The scale actually used for sampling.
    pub fn effective_scale(&self) -> f32 {
        if self.scale <= 0.0 { MIN_NOISE_SCALE } else { self.scale }
    }

    /// Sum of all octave amplitudes, `Σ persistence^i`.
    pub fn max_possible_amplitude(&self) -> f32 {
        let mut amplitude = 1.0;
        let mut total = 0.0;
        for _ in 0..self.octaves {
            total += amplitude;
            amplitude *= self.persistence;
        }
        total
    }

    /// Copy of these parameters re-centred on `centre` (world units before
    /// world scaling). Tiles are sampled this way so their fields stitch.
    pub fn centred_at(&self, centre: Vec2) -> Self {
        Self { offset: self.offset + centre, ..self.clone() }
    }
}
