// Flat colour textures derived directly from height / classification grids.
use serde::{Deserialize, Serialize};

use crate::terrain::grid::{ClassificationGrid, HeightGrid};
use crate::terrain::regions::TerrainRegion;

/// 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Linear blend from `self` (t = 0) to `other` (t = 1); t is clamped.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Row-major pixel buffer handed to the display side.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTexture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
}

impl ColorTexture {
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }
}

/// Grayscale preview: 0 is black, 1 (and above) is white.
pub fn from_height_map(heights: &HeightGrid) -> ColorTexture {
    ColorTexture {
        width: heights.width(),
        height: heights.height(),
        pixels: heights.iter().map(|h| Rgba::BLACK.lerp(Rgba::WHITE, *h)).collect(),
    }
}

/// One pixel per cell, coloured by the region the cell was classified into.
/// Ids outside the table render black.
pub fn from_classification(classes: &ClassificationGrid, regions: &[TerrainRegion]) -> ColorTexture {
    ColorTexture {
        width: classes.width(),
        height: classes.height(),
        pixels: classes
            .iter()
            .map(|id| regions.get(*id as usize).map(|r| r.color).unwrap_or(Rgba::BLACK))
            .collect(),
    }
}
