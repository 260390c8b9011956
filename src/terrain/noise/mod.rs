pub mod noise_parameters;
pub mod noise_utils;
pub mod noise_field;

pub use noise_parameters::{BaseNoiseType, NoiseParameters, NormalizeMode};
pub use noise_field::{generate, generate_at};
