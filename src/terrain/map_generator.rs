// src/terrain/map_generator.rs
//
// Height + classification bundles, and the single-map preview that renders
// them to a display.
use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::TerrainConfig;
use crate::terrain::falloff::{apply_falloff, generate_falloff_map};
use crate::terrain::grid::{ClassificationGrid, HeightGrid};
use crate::terrain::mesh::{build_preview, MeshData};
use crate::terrain::noise::generate_at;
use crate::terrain::regions::classify;
use crate::terrain::texture::{self, ColorTexture};

/// Height field of one map together with its region ids.
#[derive(Debug, Clone, PartialEq)]
pub struct MapData {
    pub heights: HeightGrid,
    pub classes: ClassificationGrid,
}

impl MapData {
    pub fn from_heights(heights: HeightGrid, config: &TerrainConfig) -> Self {
        let classes = classify(&heights, &config.regions);
        Self { heights, classes }
    }

    pub fn color_texture(&self, config: &TerrainConfig) -> ColorTexture {
        texture::from_classification(&self.classes, &config.regions)
    }
}

/// Bordered map data for the tile whose noise centre is `centre`.
pub fn generate_map_data(config: &TerrainConfig, centre: Vec2) -> MapData {
    let heights = generate_at(config.bordered_size(), &config.noise, centre);
    MapData::from_heights(heights, config)
}

/// What [`MapPreview::draw`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    NoiseMap,
    ColorMap,
    Mesh,
    FalloffMap,
}

/// Receiver for preview output.
pub trait PreviewDisplay {
    fn draw_texture(&mut self, texture: &ColorTexture);
    fn draw_mesh(&mut self, mesh: &MeshData, texture: &ColorTexture);
}

/// One-off map around the origin, used for tuning parameters.
#[derive(Debug, Clone)]
pub struct MapPreview {
    pub config: TerrainConfig,
    pub draw_mode: DrawMode,
}

impl MapPreview {
    pub fn new(config: TerrainConfig, draw_mode: DrawMode) -> Self {
        Self { config, draw_mode }
    }

    /// Edge-sized map at the origin, with the falloff mask subtracted when
    /// enabled.
    pub fn map_data(&self) -> MapData {
        let size = self.config.mesh.edge_size;
        let mut heights = generate_at(size, &self.config.noise, Vec2::ZERO);
        if self.config.falloff.use_falloff {
            let mask = generate_falloff_map(size, &self.config.falloff);
            heights = apply_falloff(&heights, &mask);
        }
        MapData::from_heights(heights, &self.config)
    }

    pub fn draw(&self, display: &mut dyn PreviewDisplay) {
        debug!("Drawing {:?} preview", self.draw_mode);
        match self.draw_mode {
            DrawMode::NoiseMap => {
                let data = self.map_data();
                display.draw_texture(&texture::from_height_map(&data.heights));
            }
            DrawMode::ColorMap => {
                let data = self.map_data();
                display.draw_texture(&data.color_texture(&self.config));
            }
            DrawMode::Mesh => {
                let data = self.map_data();
                let mesh = build_preview(
                    &data.heights,
                    self.config.mesh.height_multiplier,
                    &self.config.mesh.height_curve,
                    self.config.mesh.preview_lod,
                );
                display.draw_mesh(&mesh, &data.color_texture(&self.config));
            }
            DrawMode::FalloffMap => {
                let mask = generate_falloff_map(self.config.mesh.edge_size, &self.config.falloff);
                display.draw_texture(&texture::from_height_map(&mask));
            }
        }
    }
}
