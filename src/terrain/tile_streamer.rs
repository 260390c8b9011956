// src/terrain/tile_streamer.rs
//
// Keeps the tiles around a moving viewer generated, meshed at the right LOD
// and shown. All state lives on the thread that calls `tick`; generation runs
// on an `Executor` and reports back through a completion queue.
use std::sync::Arc;

use glam::Vec2;
use log::{debug, info, trace};

use crate::config::{ConfigurationError, TerrainConfig};
use crate::terrain::map_generator::{generate_map_data, MapData};
use crate::terrain::mesh::{build, HeightCurve, MeshData};
use crate::terrain::texture::ColorTexture;
use crate::terrain::tile::{TileCache, TileCoordinate, TileRecord, ViewerContext};
use crate::threading::{CompletionQueue, Executor};

/// Host-side owner of tile objects.
pub trait TileSurface {
    fn set_tile_visible(&mut self, coordinate: TileCoordinate, visible: bool);
    fn apply_tile_texture(&mut self, coordinate: TileCoordinate, texture: &ColorTexture);
    fn apply_tile_mesh(&mut self, coordinate: TileCoordinate, mesh: &Arc<MeshData>);
}

/// Result of a generation job. `version` is the record version the job was
/// issued for.
#[derive(Debug)]
pub enum TileMessage {
    MapData {
        coordinate: TileCoordinate,
        version: u64,
        data: Arc<MapData>,
        texture: ColorTexture,
    },
    Mesh {
        coordinate: TileCoordinate,
        version: u64,
        lod_index: usize,
        mesh: Arc<MeshData>,
    },
}

impl TileMessage {
    pub fn coordinate(&self) -> TileCoordinate {
        match self {
            TileMessage::MapData { coordinate, .. } | TileMessage::Mesh { coordinate, .. } => *coordinate,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            TileMessage::MapData { version, .. } | TileMessage::Mesh { version, .. } => *version,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamerStats {
    pub tiles: usize,
    pub visible: usize,
    pub pending_requests: usize,
    /// Results dropped because their tile record was gone or re-created.
    pub discarded: u64,
}

pub struct TileStreamer<S: TileSurface> {
    config: Arc<TerrainConfig>,
    height_curve: Arc<dyn HeightCurve>,
    executor: Arc<dyn Executor>,
    surface: S,
    completions: CompletionQueue<TileMessage>,
    cache: TileCache,
    visible: Vec<TileCoordinate>,
    viewer: ViewerContext,
    last_sweep_position: Option<Vec2>,
    next_version: u64,
    pending_requests: usize,
    discarded: u64,
}

impl<S: TileSurface> TileStreamer<S> {
    pub fn new(config: TerrainConfig, executor: Arc<dyn Executor>, surface: S) -> Result<Self, ConfigurationError> {
        config.validate()?;
        info!(
            "Tile streamer: edge {}, tile size {}, view distance {}",
            config.mesh.edge_size,
            config.tile_world_size(),
            config.max_view_distance()
        );
        let height_curve: Arc<dyn HeightCurve> = Arc::new(config.mesh.height_curve.clone());
        Ok(Self {
            config: Arc::new(config),
            height_curve,
            executor,
            surface,
            completions: CompletionQueue::new(),
            cache: TileCache::new(),
            visible: Vec::new(),
            viewer: ViewerContext::default(),
            last_sweep_position: None,
            next_version: 1,
            pending_requests: 0,
            discarded: 0,
        })
    }

    /// Replace the configured keyframe curve, e.g. with a closure.
    pub fn with_height_curve(mut self, curve: Arc<dyn HeightCurve>) -> Self {
        self.height_curve = curve;
        self
    }

    /// Advance one simulation step: sweep visibility if the viewer moved far
    /// enough, then apply every finished job.
    pub fn tick(&mut self, viewer_position: Vec2) {
        self.viewer = ViewerContext::new(viewer_position);

        let threshold = self.config.streaming.move_threshold;
        let moved_enough = match self.last_sweep_position {
            None => true,
            Some(last) => last.distance_squared(viewer_position) > threshold * threshold,
        };
        if moved_enough {
            self.last_sweep_position = Some(viewer_position);
            self.update_visible_tiles();
        }

        self.process_completions();
    }

    /// Apply everything queued so far, oldest first. Returns how many
    /// messages were drained.
    pub fn process_completions(&mut self) -> usize {
        let messages = self.completions.drain();
        let count = messages.len();
        for message in messages {
            self.pending_requests = self.pending_requests.saturating_sub(1);
            let coordinate = message.coordinate();
            trace!("Result for tile ({}, {}) v{}", coordinate.x, coordinate.y, message.version());
            self.apply_message(message);
        }
        count
    }

    fn apply_message(&mut self, message: TileMessage) {
        match message {
            TileMessage::MapData { coordinate, version, data, texture } => {
                let Some(record) = self.cache.live_record(coordinate, version) else {
                    self.discard(coordinate, version, "map data");
                    return;
                };
                record.map_data = Some(data);
                self.surface.apply_tile_texture(coordinate, &texture);
                self.evaluate_tile(coordinate);
            }
            TileMessage::Mesh { coordinate, version, lod_index, mesh } => {
                if self.cache.live_record(coordinate, version).is_none() {
                    self.discard(coordinate, version, "mesh");
                    return;
                }
                self.cache.store_mesh(coordinate, lod_index, mesh);
                self.evaluate_tile(coordinate);
            }
        }
    }

    fn discard(&mut self, coordinate: TileCoordinate, version: u64, what: &str) {
        self.discarded += 1;
        debug!("Discarding stale {} for tile ({}, {}) v{}", what, coordinate.x, coordinate.y, version);
    }

    fn update_visible_tiles(&mut self) {
        for coordinate in std::mem::take(&mut self.visible) {
            if let Some(record) = self.cache.get_mut(coordinate) {
                if record.visible {
                    record.visible = false;
                    self.surface.set_tile_visible(coordinate, false);
                }
            }
        }

        let tile_size = self.config.tile_world_size();
        let radius = (self.config.max_view_distance() / tile_size).ceil() as i32;
        let centre = TileCoordinate::containing(self.viewer.position, tile_size);

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coordinate = centre.offset(dx, dy);
                if self.cache.contains(coordinate) {
                    self.evaluate_tile(coordinate);
                } else {
                    self.create_tile(coordinate);
                }
            }
        }

        if let Some(evict_distance) = self.config.streaming.evict_distance {
            self.evict_tiles(evict_distance);
        }

        debug!(
            "Sweep around ({:.1}, {:.1}): {} visible of {} tiles",
            self.viewer.position.x,
            self.viewer.position.y,
            self.visible.len(),
            self.cache.len()
        );
    }

    fn create_tile(&mut self, coordinate: TileCoordinate) {
        let version = self.next_version;
        self.next_version += 1;
        trace!("Creating tile ({}, {}) v{}", coordinate.x, coordinate.y, version);

        self.cache
            .insert(TileRecord::new(coordinate, self.config.tile_world_size(), self.config.lod.len(), version));
        self.request_map_data(coordinate, version);
    }

    fn evict_tiles(&mut self, evict_distance: f32) {
        let viewer = self.viewer;
        let far: Vec<TileCoordinate> = self
            .cache
            .iter()
            .filter(|record| record.distance_to_viewer(&viewer) > evict_distance)
            .map(|record| record.coordinate)
            .collect();

        for coordinate in &far {
            self.cache.remove(*coordinate);
            self.surface.set_tile_visible(*coordinate, false);
        }
        if !far.is_empty() {
            self.visible.retain(|coordinate| !far.contains(coordinate));
            debug!("Evicted {} tiles beyond {}", far.len(), evict_distance);
        }
    }

    /// Pick the LOD for one tile, apply a cached mesh or request a missing
    /// one, and update its visibility. Tiles without map data are left alone.
    fn evaluate_tile(&mut self, coordinate: TileCoordinate) -> bool {
        let Some(record) = self.cache.get_mut(coordinate) else {
            return false;
        };
        let Some(map_data) = record.map_data.clone() else {
            return false;
        };

        let target = record.target_lod(&self.viewer, &self.config.lod);
        let mut mesh_request = None;
        if let Some(lod_index) = target {
            if record.applied_lod != Some(lod_index) {
                let slot = &mut record.lod_slots[lod_index];
                if let Some(mesh) = slot.mesh() {
                    record.applied_lod = Some(lod_index);
                    self.surface.apply_tile_mesh(coordinate, mesh);
                } else if slot.mark_requested() {
                    mesh_request = Some((lod_index, record.version));
                }
            }
        }

        let visible = target.is_some();
        if record.visible != visible {
            record.visible = visible;
            self.surface.set_tile_visible(coordinate, visible);
        }

        if let Some((lod_index, version)) = mesh_request {
            self.request_mesh(coordinate, version, lod_index, map_data);
        }

        if visible {
            if !self.visible.contains(&coordinate) {
                self.visible.push(coordinate);
            }
        } else {
            self.visible.retain(|c| *c != coordinate);
        }
        visible
    }

    fn request_map_data(&mut self, coordinate: TileCoordinate, version: u64) {
        let config = Arc::clone(&self.config);
        let sender = self.completions.sender();
        self.pending_requests += 1;

        self.executor.execute(Box::new(move || {
            let centre = coordinate.noise_centre(config.mesh.edge_size);
            let data = generate_map_data(&config, centre);
            let texture = data.color_texture(&config);
            sender.push(TileMessage::MapData { coordinate, version, data: Arc::new(data), texture });
        }));
    }

    fn request_mesh(&mut self, coordinate: TileCoordinate, version: u64, lod_index: usize, map_data: Arc<MapData>) {
        let lod = self.config.lod[lod_index].lod;
        let height_multiplier = self.config.mesh.height_multiplier;
        let curve = Arc::clone(&self.height_curve);
        let sender = self.completions.sender();
        self.pending_requests += 1;
        trace!("Requesting lod {} mesh for tile ({}, {})", lod, coordinate.x, coordinate.y);

        self.executor.execute(Box::new(move || {
            let mesh = build(&map_data.heights, height_multiplier, curve.as_ref(), lod);
            sender.push(TileMessage::Mesh { coordinate, version, lod_index, mesh: Arc::new(mesh) });
        }));
    }

    pub fn stats(&self) -> StreamerStats {
        StreamerStats {
            tiles: self.cache.len(),
            visible: self.visible.len(),
            pending_requests: self.pending_requests,
            discarded: self.discarded,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending_requests == 0
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn visible_tiles(&self) -> &[TileCoordinate] {
        &self.visible
    }

    pub fn viewer(&self) -> ViewerContext {
        self.viewer
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::mesh::vertices_per_line;
    use crate::terrain::tile::LodThreshold;
    use crate::threading::{InlineExecutor, Job, ThreadPool};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, PartialEq)]
    enum SurfaceEvent {
        Visible(TileCoordinate, bool),
        Texture(TileCoordinate),
        Mesh(TileCoordinate, usize),
    }

    #[derive(Default)]
    struct RecordingSurface {
        events: Vec<SurfaceEvent>,
    }

    impl TileSurface for RecordingSurface {
        fn set_tile_visible(&mut self, coordinate: TileCoordinate, visible: bool) {
            self.events.push(SurfaceEvent::Visible(coordinate, visible));
        }

        fn apply_tile_texture(&mut self, coordinate: TileCoordinate, _texture: &ColorTexture) {
            self.events.push(SurfaceEvent::Texture(coordinate));
        }

        fn apply_tile_mesh(&mut self, coordinate: TileCoordinate, mesh: &Arc<MeshData>) {
            self.events.push(SurfaceEvent::Mesh(coordinate, mesh.vertices_per_line()));
        }
    }

    impl RecordingSurface {
        fn meshes(&self) -> Vec<(TileCoordinate, usize)> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    SurfaceEvent::Mesh(c, vpl) => Some((*c, *vpl)),
                    _ => None,
                })
                .collect()
        }

        fn textures(&self) -> Vec<TileCoordinate> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    SurfaceEvent::Texture(c) => Some(*c),
                    _ => None,
                })
                .collect()
        }
    }

    /// Holds jobs until the test runs them.
    #[derive(Default)]
    struct DeferredExecutor {
        jobs: Mutex<Vec<Job>>,
    }

    impl Executor for DeferredExecutor {
        fn execute(&self, job: Job) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    impl DeferredExecutor {
        fn take(&self) -> Vec<Job> {
            std::mem::take(&mut *self.jobs.lock().unwrap())
        }
    }

    #[derive(Default)]
    struct CountingExecutor {
        submitted: AtomicUsize,
    }

    impl Executor for CountingExecutor {
        fn execute(&self, job: Job) {
            self.submitted.fetch_add(1, Ordering::SeqCst);
            job();
        }
    }

    /// Edge 25 → 24-unit tiles; LOD 0 within 30, LOD 1 within 60.
    fn small_config() -> TerrainConfig {
        let mut config = TerrainConfig::default();
        config.mesh.edge_size = 25;
        config.noise.seed = 11;
        config.noise.scale = 12.0;
        config.lod = vec![LodThreshold::new(0, 30.0), LodThreshold::new(1, 60.0)];
        config.streaming.move_threshold = 10.0;
        config
    }

    fn inline_streamer(config: TerrainConfig) -> TileStreamer<RecordingSurface> {
        TileStreamer::new(config, Arc::new(InlineExecutor), RecordingSurface::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = small_config();
        config.lod.clear();
        let result = TileStreamer::new(config, Arc::new(InlineExecutor), RecordingSurface::default());
        assert!(matches!(result, Err(ConfigurationError::Invalid { field: "lod", .. })));
    }

    #[test]
    fn first_tick_creates_window_and_shows_tiles_in_range() {
        let mut streamer = inline_streamer(small_config());
        streamer.tick(Vec2::ZERO);

        // radius ceil(60 / 24) = 3
        assert_eq!(streamer.stats().tiles, 49);
        assert_eq!(streamer.surface().textures().len(), 49);

        let viewer = ViewerContext::new(Vec2::ZERO);
        for record in streamer.cache().iter() {
            assert!(record.has_map_data());
            assert_eq!(record.visible, record.distance_to_viewer(&viewer) <= 60.0, "{:?}", record.coordinate);
        }
        assert_eq!(streamer.stats().visible, 29);
        // every visible tile has a mesh in flight, nothing applied yet
        assert_eq!(streamer.stats().pending_requests, 29);
        assert!(streamer.surface().meshes().is_empty());
    }

    #[test]
    fn meshes_arrive_at_selected_lod() {
        let mut streamer = inline_streamer(small_config());
        streamer.tick(Vec2::ZERO);
        streamer.tick(Vec2::ZERO);

        assert!(streamer.is_idle());
        let meshes = streamer.surface().meshes();
        assert_eq!(meshes.len(), 29);

        let viewer = ViewerContext::new(Vec2::ZERO);
        for (coordinate, vpl) in meshes {
            let record = streamer.cache().get(coordinate).unwrap();
            let expected = if record.distance_to_viewer(&viewer) <= 30.0 { 0 } else { 1 };
            assert_eq!(record.applied_lod, Some(expected));
            assert_eq!(vpl, vertices_per_line(25, streamer.config().lod[expected].lod));
        }
        assert_eq!(streamer.cache().get(TileCoordinate::new(0, 0)).unwrap().applied_lod, Some(0));
        assert_eq!(streamer.cache().get(TileCoordinate::new(0, 2)).unwrap().applied_lod, Some(1));
    }

    #[test]
    fn small_moves_do_not_sweep() {
        let mut streamer = inline_streamer(small_config());
        streamer.tick(Vec2::ZERO);
        streamer.tick(Vec2::ZERO);
        let before = streamer.surface().events.len();

        streamer.tick(Vec2::new(6.0, 6.0));
        assert_eq!(streamer.surface().events.len(), before);

        streamer.tick(Vec2::new(11.0, 0.0));
        assert!(streamer.surface().events.len() > before);
    }

    #[test]
    fn finished_meshes_are_reused() {
        let executor = Arc::new(CountingExecutor::default());
        let mut streamer =
            TileStreamer::new(small_config(), executor.clone(), RecordingSurface::default()).unwrap();

        streamer.tick(Vec2::ZERO);
        streamer.tick(Vec2::ZERO);
        assert_eq!(executor.submitted.load(Ordering::SeqCst), 49 + 29);

        streamer.tick(Vec2::new(40.0, 0.0));
        streamer.tick(Vec2::new(40.0, 0.0));
        let after_move = executor.submitted.load(Ordering::SeqCst);
        assert!(after_move > 49 + 29);

        let meshes_before_return = streamer.surface().meshes().len();
        streamer.tick(Vec2::ZERO);
        streamer.tick(Vec2::ZERO);
        assert_eq!(executor.submitted.load(Ordering::SeqCst), after_move);
        // tiles whose LOD changed got their cached mesh back
        assert!(streamer.surface().meshes().len() > meshes_before_return);
        assert!(streamer.is_idle());
    }

    #[test]
    fn completions_apply_in_arrival_order() {
        let executor = Arc::new(DeferredExecutor::default());
        let mut streamer = TileStreamer::new(small_config(), executor.clone(), RecordingSurface::default()).unwrap();
        streamer.tick(Vec2::ZERO);
        assert_eq!(streamer.stats().pending_requests, 49);
        assert!(streamer.surface().textures().is_empty());

        let jobs = executor.take();
        assert_eq!(jobs.len(), 49);
        for job in jobs.into_iter().rev() {
            job();
        }

        assert_eq!(streamer.process_completions(), 49);
        let textures = streamer.surface().textures();
        assert_eq!(textures.len(), 49);
        // last requested finished first
        assert_eq!(textures[0], TileCoordinate::new(3, 3));
        assert_eq!(textures[48], TileCoordinate::new(-3, -3));
        assert_eq!(streamer.process_completions(), 0);
    }

    #[test]
    fn results_for_evicted_tiles_are_discarded() {
        let mut config = small_config();
        config.streaming.evict_distance = Some(100.0);
        let executor = Arc::new(DeferredExecutor::default());
        let mut streamer = TileStreamer::new(config, executor.clone(), RecordingSurface::default()).unwrap();

        streamer.tick(Vec2::ZERO);
        let origin_jobs = executor.take();

        streamer.tick(Vec2::new(1000.0, 0.0));
        assert_eq!(streamer.stats().tiles, 49);
        assert!(streamer.cache().get(TileCoordinate::new(0, 0)).is_none());

        // Come back: the origin records are re-created with fresh versions.
        streamer.tick(Vec2::ZERO);
        let first_version = streamer.cache().iter().map(|r| r.version).min().unwrap();
        assert!(first_version > 98);

        for job in origin_jobs {
            job();
        }
        streamer.process_completions();
        assert_eq!(streamer.stats().discarded, 49);
        assert!(streamer.surface().textures().is_empty());

        for job in executor.take() {
            job();
        }
        streamer.process_completions();
        // the far window was evicted on the way back
        assert_eq!(streamer.stats().discarded, 98);
        assert_eq!(streamer.surface().textures().len(), 49);
    }

    #[test]
    fn sweep_hides_tiles_left_behind() {
        let mut streamer = inline_streamer(small_config());
        streamer.tick(Vec2::ZERO);
        streamer.tick(Vec2::ZERO);
        let shown: Vec<TileCoordinate> = streamer.visible_tiles().to_vec();

        streamer.tick(Vec2::new(500.0, 0.0));
        for coordinate in shown {
            let record = streamer.cache().get(coordinate).unwrap();
            assert!(!record.visible);
            // mesh data survives without eviction
            assert!(record.lod_slots.iter().any(|slot| slot.has_mesh()));
        }
        assert!(streamer.surface().events.contains(&SurfaceEvent::Visible(TileCoordinate::new(0, 0), false)));
        assert_eq!(streamer.stats().tiles, 98);
    }

    #[test]
    fn custom_curve_reaches_meshes() {
        let flat = |_: f32| 0.0;
        let mut streamer = inline_streamer(small_config()).with_height_curve(Arc::new(flat));
        streamer.tick(Vec2::ZERO);
        streamer.tick(Vec2::ZERO);

        let record = streamer.cache().get(TileCoordinate::new(0, 0)).unwrap();
        let mesh = record.lod_slots[0].mesh().unwrap();
        assert!(mesh.vertices().iter().all(|v| v.y == 0.0));
    }

    #[test]
    fn streams_on_a_thread_pool() {
        let mut config = small_config();
        config.threading.worker_threads = 2;
        let pool = Arc::new(ThreadPool::from_settings(&config.threading).unwrap());
        let mut streamer = TileStreamer::new(config, pool, RecordingSurface::default()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(30);
        streamer.tick(Vec2::ZERO);
        while !streamer.is_idle() {
            assert!(Instant::now() < deadline, "streamer never settled: {:?}", streamer.stats());
            std::thread::sleep(Duration::from_millis(5));
            streamer.tick(Vec2::ZERO);
        }

        assert_eq!(streamer.stats().visible, 29);
        assert_eq!(streamer.surface().meshes().len(), 29);
        assert_eq!(streamer.stats().discarded, 0);
    }
}
