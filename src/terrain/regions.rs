// Height → terrain region lookup.
use serde::{Deserialize, Serialize};

use crate::terrain::grid::{ClassificationGrid, HeightGrid};
use crate::terrain::texture::Rgba;

/// One band of the region table. A cell belongs to the first band (in
/// ascending order) whose `height` it does not exceed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainRegion {
    pub name: String,
    pub height: f32,
    pub color: Rgba,
}

impl TerrainRegion {
    pub fn new(name: impl Into<String>, height: f32, color: Rgba) -> Self {
        Self { name: name.into(), height, color }
    }
}

/// Most regions a table may hold; region ids are stored as `u8`.
pub const MAX_REGIONS: usize = u8::MAX as usize + 1;

/// Region table of the classic island palette.
pub fn default_regions() -> Vec<TerrainRegion> {
    vec![
        TerrainRegion::new("deep_water", 0.3, Rgba::rgb(50, 99, 195)),
        TerrainRegion::new("shallow_water", 0.4, Rgba::rgb(54, 103, 199)),
        TerrainRegion::new("sand", 0.45, Rgba::rgb(210, 208, 125)),
        TerrainRegion::new("grass", 0.55, Rgba::rgb(86, 152, 23)),
        TerrainRegion::new("grass_2", 0.6, Rgba::rgb(62, 107, 18)),
        TerrainRegion::new("rock", 0.7, Rgba::rgb(90, 69, 60)),
        TerrainRegion::new("rock_2", 0.9, Rgba::rgb(75, 60, 53)),
        TerrainRegion::new("snow", 1.0, Rgba::rgb(255, 255, 255)),
    ]
}

/// Index of the region `height` falls into. Heights above every threshold
/// (possible in global normalization) land in the last region.
///
/// `regions` must be non-empty and sorted ascending by `height`.
#[inline]
pub fn region_for(height: f32, regions: &[TerrainRegion]) -> u8 {
    regions
        .iter()
        .position(|region| height <= region.height)
        .unwrap_or(regions.len().saturating_sub(1)) as u8
}

/// Classify every cell of `heights`.
pub fn classify(heights: &HeightGrid, regions: &[TerrainRegion]) -> ClassificationGrid {
    debug_assert!(!regions.is_empty(), "region table must not be empty");
    debug_assert!(regions.len() <= MAX_REGIONS, "{} regions do not fit a u8 id", regions.len());
    heights.map(|h| region_for(*h, regions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<TerrainRegion> {
        vec![
            TerrainRegion::new("a", 0.3, Rgba::rgb(1, 0, 0)),
            TerrainRegion::new("b", 0.6, Rgba::rgb(0, 1, 0)),
            TerrainRegion::new("c", 1.0, Rgba::rgb(0, 0, 1)),
        ]
    }

    #[test]
    fn picks_tightest_band_containing_height() {
        let regions = abc();
        assert_eq!(region_for(0.55, &regions), 1);
        assert_eq!(region_for(0.05, &regions), 0);
        assert_eq!(region_for(0.95, &regions), 2);
    }

    #[test]
    fn threshold_is_inclusive() {
        let regions = abc();
        assert_eq!(region_for(0.3, &regions), 0);
        assert_eq!(region_for(0.6, &regions), 1);
    }

    #[test]
    fn heights_above_table_use_last_region() {
        assert_eq!(region_for(1.7, &abc()), 2);
    }

    #[test]
    fn classify_keeps_grid_shape() {
        let heights = HeightGrid::from_vec(3, 2, vec![0.1, 0.5, 0.9, 0.3, 0.6, 2.0]);
        let classes = classify(&heights, &abc());
        assert_eq!((classes.width(), classes.height()), (3, 2));
        assert_eq!(classes.cells(), &[0, 1, 2, 0, 1, 2]);
    }

    fn banded(count: usize) -> Vec<TerrainRegion> {
        (0..count).map(|i| TerrainRegion::new(format!("band_{i}"), i as f32, Rgba::rgb(0, 0, 0))).collect()
    }

    #[test]
    fn full_table_uses_every_id() {
        let heights = HeightGrid::from_vec(2, 1, vec![0.0, 1000.0]);
        assert_eq!(classify(&heights, &banded(MAX_REGIONS)).cells(), &[0, 255]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "do not fit a u8 id")]
    fn oversized_table_is_refused() {
        let heights = HeightGrid::from_vec(1, 1, vec![1000.0]);
        classify(&heights, &banded(MAX_REGIONS + 1));
    }

    #[test]
    fn default_table_is_ascending() {
        let regions = default_regions();
        assert!(regions.windows(2).all(|w| w[0].height < w[1].height));
    }
}
