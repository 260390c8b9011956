// src/config/terrain_config.rs
use serde::{Deserialize, Serialize};

use crate::config::config_manager::ConfigurationError;
use crate::terrain::falloff::FalloffSettings;
use crate::terrain::mesh::{supports_lod, CurveKeys};
use crate::terrain::noise::NoiseParameters;
use crate::terrain::regions::{default_regions, TerrainRegion, MAX_REGIONS};
use crate::terrain::tile::{max_view_distance, LodThreshold};

/// Tile geometry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    /// Renderable samples along one tile edge. Must be odd so every LOD up to
    /// the table's coarsest divides `edge_size - 1`.
    pub edge_size: usize,
    pub height_multiplier: f32,
    pub height_curve: CurveKeys,
    /// World units per grid step.
    pub world_scale: f32,
    /// LOD used for single-map mesh previews.
    pub preview_lod: u32,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            edge_size: 241,
            height_multiplier: 30.0,
            height_curve: CurveKeys::default(),
            world_scale: 1.0,
            preview_lod: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Viewer travel (world units) that triggers a new visibility sweep.
    pub move_threshold: f32,
    /// Drop tile records further than this from the viewer. `None` keeps
    /// every tile ever seen.
    pub evict_distance: Option<f32>,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self { move_threshold: 25.0, evict_distance: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThreadingSettings {
    /// Generation workers; 0 picks one per logical CPU.
    pub worker_threads: usize,
}

impl ThreadingSettings {
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 { num_cpus::get() } else { self.worker_threads }
    }
}

fn default_lod_table() -> Vec<LodThreshold> {
    vec![LodThreshold::new(0, 200.0), LodThreshold::new(1, 400.0), LodThreshold::new(2, 600.0)]
}

/// Everything needed to generate, preview and stream terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub noise: NoiseParameters,
    pub mesh: MeshSettings,
    pub regions: Vec<TerrainRegion>,
    pub lod: Vec<LodThreshold>,
    pub streaming: StreamingSettings,
    pub threading: ThreadingSettings,
    pub falloff: FalloffSettings,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseParameters::default(),
            mesh: MeshSettings::default(),
            regions: default_regions(),
            lod: default_lod_table(),
            streaming: StreamingSettings::default(),
            threading: ThreadingSettings::default(),
            falloff: FalloffSettings::default(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Invalid { field, reason: reason.into() }
}

impl TerrainConfig {
    /// Width of the height grid generated per tile (edge plus border ring).
    pub fn bordered_size(&self) -> usize {
        self.mesh.edge_size + 2
    }

    /// Side length of one tile in world units.
    pub fn tile_world_size(&self) -> f32 {
        (self.mesh.edge_size - 1) as f32 * self.mesh.world_scale
    }

    pub fn max_view_distance(&self) -> f32 {
        max_view_distance(&self.lod)
    }

    /// Reject settings generation code treats as preconditions.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let noise = &self.noise;
        if !noise.scale.is_finite() {
            return Err(invalid("noise.scale", "must be finite"));
        }
        if !(noise.lacunarity >= 1.0) {
            return Err(invalid("noise.lacunarity", format!("{} is below 1", noise.lacunarity)));
        }
        if !(0.0..=1.0).contains(&noise.persistence) {
            return Err(invalid("noise.persistence", format!("{} is outside [0, 1]", noise.persistence)));
        }

        let edge = self.mesh.edge_size;
        if edge < 3 || edge % 2 == 0 {
            return Err(invalid("mesh.edge_size", format!("{edge} must be odd and at least 3")));
        }
        if !(self.mesh.world_scale > 0.0) {
            return Err(invalid("mesh.world_scale", "must be positive"));
        }
        if !self.mesh.height_multiplier.is_finite() {
            return Err(invalid("mesh.height_multiplier", "must be finite"));
        }
        if !supports_lod(edge, self.mesh.preview_lod) {
            return Err(invalid(
                "mesh.preview_lod",
                format!("lod {} does not divide edge {edge}", self.mesh.preview_lod),
            ));
        }

        if self.lod.is_empty() {
            return Err(invalid("lod", "table is empty"));
        }
        if self.lod.windows(2).any(|pair| !(pair[0].visible_distance < pair[1].visible_distance)) {
            return Err(invalid("lod", "visible distances must be strictly increasing"));
        }
        if self.lod.iter().any(|entry| !(entry.visible_distance >= 0.0)) {
            return Err(invalid("lod", "visible distances must be non-negative"));
        }
        if let Some(entry) = self.lod.iter().find(|entry| !supports_lod(edge, entry.lod)) {
            return Err(invalid("lod", format!("lod {} does not divide edge {edge}", entry.lod)));
        }

        if self.regions.is_empty() {
            return Err(invalid("regions", "table is empty"));
        }
        if self.regions.len() > MAX_REGIONS {
            return Err(invalid("regions", "more than 256 regions"));
        }
        if self.regions.windows(2).any(|pair| pair[0].height > pair[1].height) {
            return Err(invalid("regions", "heights must be ascending"));
        }

        if !(self.streaming.move_threshold >= 0.0) {
            return Err(invalid("streaming.move_threshold", "must be non-negative"));
        }
        if let Some(evict) = self.streaming.evict_distance {
            if !(evict >= self.max_view_distance()) {
                return Err(invalid("streaming.evict_distance", "must not be below the max view distance"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigurationError>) -> &'static str {
        match result {
            Err(ConfigurationError::Invalid { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = TerrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bordered_size(), 243);
        assert_eq!(config.tile_world_size(), 240.0);
        assert_eq!(config.max_view_distance(), 600.0);
        assert_eq!(config.streaming.move_threshold, 25.0);
    }

    #[test]
    fn rejects_bad_noise() {
        let mut config = TerrainConfig::default();
        config.noise.lacunarity = 0.5;
        assert_eq!(field_of(config.validate()), "noise.lacunarity");

        let mut config = TerrainConfig::default();
        config.noise.persistence = 1.5;
        assert_eq!(field_of(config.validate()), "noise.persistence");

        // non-positive scale is clamped at generation time, not rejected
        let mut config = TerrainConfig::default();
        config.noise.scale = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_edges_that_cannot_be_simplified() {
        let mut config = TerrainConfig::default();
        config.mesh.edge_size = 240;
        assert_eq!(field_of(config.validate()), "mesh.edge_size");

        // 9 - 1 = 8 is not divisible by lod 3's increment of 6
        let mut config = TerrainConfig::default();
        config.mesh.edge_size = 9;
        config.lod.push(LodThreshold::new(3, 800.0));
        assert_eq!(field_of(config.validate()), "lod");
    }

    #[test]
    fn rejects_unordered_tables() {
        let mut config = TerrainConfig::default();
        config.lod.swap(0, 1);
        assert_eq!(field_of(config.validate()), "lod");

        let mut config = TerrainConfig::default();
        config.lod.clear();
        assert_eq!(field_of(config.validate()), "lod");

        let mut config = TerrainConfig::default();
        config.regions.reverse();
        assert_eq!(field_of(config.validate()), "regions");
    }

    #[test]
    fn rejects_streaming_settings() {
        let mut config = TerrainConfig::default();
        config.streaming.move_threshold = -1.0;
        assert_eq!(field_of(config.validate()), "streaming.move_threshold");

        let mut config = TerrainConfig::default();
        config.streaming.evict_distance = Some(100.0);
        assert_eq!(field_of(config.validate()), "streaming.evict_distance");

        let mut config = TerrainConfig::default();
        config.mesh.world_scale = 0.0;
        assert_eq!(field_of(config.validate()), "mesh.world_scale");
    }

    #[test]
    fn zero_worker_threads_means_one_per_cpu() {
        assert_eq!(ThreadingSettings::default().resolved_worker_threads(), num_cpus::get());
        assert_eq!(ThreadingSettings { worker_threads: 3 }.resolved_worker_threads(), 3);
    }
}
