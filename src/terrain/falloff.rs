// Square island mask: 0 in the middle, rising towards 1 at the map edges.
use serde::{Deserialize, Serialize};

use crate::terrain::grid::HeightGrid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FalloffSettings {
    /// Subtract the mask from preview maps.
    pub use_falloff: bool,
    /// Steepness of the curve.
    pub a: f32,
    /// Where the curve starts to rise.
    pub b: f32,
}

impl Default for FalloffSettings {
    fn default() -> Self {
        Self { use_falloff: false, a: 3.0, b: 2.2 }
    }
}

#[inline]
fn evaluate(value: f32, a: f32, b: f32) -> f32 {
    let rise = value.powf(a);
    rise / (rise + (b - b * value).powf(b))
}

/// `size` × `size` mask.
pub fn generate_falloff_map(size: usize, settings: &FalloffSettings) -> HeightGrid {
    HeightGrid::from_fn(size, size, |i, j| {
        let x = i as f32 / size as f32 * 2.0 - 1.0;
        let y = j as f32 / size as f32 * 2.0 - 1.0;
        evaluate(x.abs().max(y.abs()), settings.a, settings.b)
    })
}

/// `heights - mask`, clamped to [0, 1]. Both grids must have the same size.
pub fn apply_falloff(heights: &HeightGrid, mask: &HeightGrid) -> HeightGrid {
    assert_eq!((heights.width(), heights.height()), (mask.width(), mask.height()));
    HeightGrid::from_fn(heights.width(), heights.height(), |x, y| {
        (heights.at(x, y) - mask.at(x, y)).clamp(0.0, 1.0)
    })
}
