// src/terrain/noise/noise_utils.rs
use crate::terrain::noise::noise_parameters::{BaseNoiseType, NoiseParameters};
use noise::{NoiseFn, OpenSimplex, Perlin, Value};

/// Single-octave coherent noise sampled in [0, 1].
pub struct BaseNoise {
    source: Box<dyn NoiseFn<f64, 2> + Send + Sync>,
}

impl BaseNoise {
    pub fn new(noise_type: BaseNoiseType, seed: u32) -> Self {
        let source: Box<dyn NoiseFn<f64, 2> + Send + Sync> = match noise_type {
            BaseNoiseType::Perlin => Box::new(Perlin::new(seed)),
            BaseNoiseType::OpenSimplex => Box::new(OpenSimplex::new(seed)),
            BaseNoiseType::Value => Box::new(Value::new(seed)),
        };
        Self { source }
    }

    // noise-rs generators are roughly [-1, 1]; fold into [0, 1]
    #[inline]
    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let raw = self.source.get([x, y]) as f32;
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

// Helper function to create the base noise from parameters
pub fn create_base_noise_from_params(params: &NoiseParameters) -> BaseNoise {
    BaseNoise::new(params.noise_type, params.seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_unit_range() {
        for noise_type in [BaseNoiseType::Perlin, BaseNoiseType::OpenSimplex, BaseNoiseType::Value] {
            let noise = BaseNoise::new(noise_type, 7);
            for i in 0..200 {
                let v = noise.sample(i as f64 * 0.37, i as f64 * -0.71);
                assert!((0.0..=1.0).contains(&v), "{noise_type:?} produced {v}");
            }
        }
    }

    #[test]
    fn same_seed_same_samples() {
        let params = NoiseParameters { seed: 99, ..Default::default() };
        let a = create_base_noise_from_params(&params);
        let b = create_base_noise_from_params(&params);
        assert_eq!(a.sample(12.3, 4.56), b.sample(12.3, 4.56));
    }
}
