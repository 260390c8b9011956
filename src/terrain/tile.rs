// src/terrain/tile.rs
use std::collections::hash_map::{self, HashMap};
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::terrain::map_generator::MapData;
use crate::terrain::mesh::MeshData;

/// Integer position of a tile in the tile lattice. Tile (0, 0) is centred on
/// the world origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub x: i32,
    pub y: i32,
}

impl TileCoordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing `position` (world units).
    pub fn containing(position: Vec2, tile_world_size: f32) -> Self {
        let cell = (position / tile_world_size).round();
        Self::new(cell.x as i32, cell.y as i32)
    }

    /// Centre in world units.
    pub fn world_centre(self, tile_world_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * tile_world_size
    }

    /// Noise-space centre for a tile of logical edge `edge`. Adjacent tiles
    /// are `edge - 1` samples apart so they share their edge row.
    pub fn noise_centre(self, edge: usize) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * (edge - 1) as f32
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned square footprint of a tile on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub centre: Vec2,
    pub half_size: f32,
}

impl TileBounds {
    pub fn new(centre: Vec2, size: f32) -> Self {
        Self { centre, half_size: size * 0.5 }
    }

    pub fn for_tile(coordinate: TileCoordinate, tile_world_size: f32) -> Self {
        Self::new(coordinate.world_centre(tile_world_size), tile_world_size)
    }

    /// Distance from `point` to the nearest point of the square; 0 inside.
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let outside = ((point - self.centre).abs() - Vec2::splat(self.half_size)).max(Vec2::ZERO);
        outside.length()
    }
}

/// One row of the LOD table: tiles up to `visible_distance` away use `lod`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodThreshold {
    pub lod: u32,
    pub visible_distance: f32,
}

impl LodThreshold {
    pub const fn new(lod: u32, visible_distance: f32) -> Self {
        Self { lod, visible_distance }
    }
}

/// Furthest distance at which any tile is shown.
pub fn max_view_distance(thresholds: &[LodThreshold]) -> f32 {
    thresholds.last().map_or(0.0, |last| last.visible_distance)
}

/// Index into `thresholds` for a tile `distance` away, or `None` when it is
/// beyond the last entry. A distance exactly on a threshold keeps the finer
/// entry.
pub fn select_lod(distance: f32, thresholds: &[LodThreshold]) -> Option<usize> {
    if thresholds.is_empty() || distance > max_view_distance(thresholds) {
        return None;
    }
    let mut index = 0;
    for threshold in &thresholds[..thresholds.len() - 1] {
        if distance > threshold.visible_distance {
            index += 1;
        } else {
            break;
        }
    }
    Some(index)
}

/// Viewer state handed to tile evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewerContext {
    pub position: Vec2,
}

impl ViewerContext {
    pub fn new(position: Vec2) -> Self {
        Self { position }
    }
}

/// Mesh state for one LOD of one tile. Moves forward only:
/// not requested → requested → has mesh.
#[derive(Debug, Clone, Default)]
pub struct LodSlot {
    mesh: Option<Arc<MeshData>>,
    requested: bool,
}

impl LodSlot {
    pub fn mesh(&self) -> Option<&Arc<MeshData>> {
        self.mesh.as_ref()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Returns true if this call moved the slot into the requested state.
    pub fn mark_requested(&mut self) -> bool {
        if self.requested || self.mesh.is_some() {
            return false;
        }
        self.requested = true;
        true
    }

    /// Store a finished mesh. A slot that already holds one keeps it.
    pub fn store_mesh(&mut self, mesh: Arc<MeshData>) -> bool {
        if self.mesh.is_some() {
            return false;
        }
        self.requested = true;
        self.mesh = Some(mesh);
        true
    }
}

/// Everything the streamer knows about one tile.
#[derive(Debug)]
pub struct TileRecord {
    pub coordinate: TileCoordinate,
    pub bounds: TileBounds,
    /// Index into the LOD table of the mesh currently shown.
    pub applied_lod: Option<usize>,
    pub map_data: Option<Arc<MapData>>,
    pub visible: bool,
    /// Token carried by every request issued for this record.
    pub version: u64,
    pub lod_slots: Vec<LodSlot>,
}

impl TileRecord {
    pub fn new(coordinate: TileCoordinate, tile_world_size: f32, lod_count: usize, version: u64) -> Self {
        Self {
            coordinate,
            bounds: TileBounds::for_tile(coordinate, tile_world_size),
            applied_lod: None,
            map_data: None,
            visible: false,
            version,
            lod_slots: vec![LodSlot::default(); lod_count],
        }
    }

    pub fn has_map_data(&self) -> bool {
        self.map_data.is_some()
    }

    pub fn distance_to_viewer(&self, viewer: &ViewerContext) -> f32 {
        self.bounds.distance_to(viewer.position)
    }

    /// LOD table index this tile should show for `viewer`, `None` if hidden.
    pub fn target_lod(&self, viewer: &ViewerContext, thresholds: &[LodThreshold]) -> Option<usize> {
        select_lod(self.distance_to_viewer(viewer), thresholds)
    }
}

/// Record table keyed by coordinate.
#[derive(Debug, Default)]
pub struct TileCache {
    records: HashMap<TileCoordinate, TileRecord>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, coordinate: TileCoordinate) -> bool {
        self.records.contains_key(&coordinate)
    }

    pub fn get(&self, coordinate: TileCoordinate) -> Option<&TileRecord> {
        self.records.get(&coordinate)
    }

    pub fn get_mut(&mut self, coordinate: TileCoordinate) -> Option<&mut TileRecord> {
        self.records.get_mut(&coordinate)
    }

    pub fn insert(&mut self, record: TileRecord) {
        self.records.insert(record.coordinate, record);
    }

    pub fn remove(&mut self, coordinate: TileCoordinate) -> Option<TileRecord> {
        self.records.remove(&coordinate)
    }

    pub fn iter(&self) -> hash_map::Values<'_, TileCoordinate, TileRecord> {
        self.records.values()
    }

    /// Record with this coordinate and version, if it is still alive.
    pub fn live_record(&mut self, coordinate: TileCoordinate, version: u64) -> Option<&mut TileRecord> {
        self.records.get_mut(&coordinate).filter(|record| record.version == version)
    }

    pub fn slot_for(&self, coordinate: TileCoordinate, lod_index: usize) -> Option<&LodSlot> {
        self.records.get(&coordinate)?.lod_slots.get(lod_index)
    }

    pub fn mark_requested(&mut self, coordinate: TileCoordinate, lod_index: usize) -> bool {
        self.records
            .get_mut(&coordinate)
            .and_then(|record| record.lod_slots.get_mut(lod_index))
            .is_some_and(LodSlot::mark_requested)
    }

    pub fn store_mesh(&mut self, coordinate: TileCoordinate, lod_index: usize, mesh: Arc<MeshData>) -> bool {
        self.records
            .get_mut(&coordinate)
            .and_then(|record| record.lod_slots.get_mut(lod_index))
            .is_some_and(|slot| slot.store_mesh(mesh))
    }
}
