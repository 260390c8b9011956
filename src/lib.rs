//! Procedural endless terrain: fractal noise height fields, LOD meshes with
//! seam-free normals, and a tile streamer that follows a moving viewer.
//!
//! Rendering is left to the host through [`TileSurface`] and
//! [`PreviewDisplay`].

pub mod config;
pub mod terrain;
pub mod threading;
pub mod utils;

pub use config::{ConfigurationError, ConfigurationManager, TerrainConfig};
pub use terrain::{
    DrawMode, HeightGrid, LodThreshold, MapPreview, MeshData, PreviewDisplay, StreamerStats, TileCoordinate,
    TileStreamer, TileSurface,
};
pub use threading::{Executor, InlineExecutor, ThreadPool};
