// Terrain generation: noise → heights → regions → meshes, and the streamer
// that keeps tiles around the viewer up to date.
pub mod falloff;
pub mod grid;
pub mod map_generator;
pub mod mesh;
pub mod noise;
pub mod regions;
pub mod texture;
pub mod tile;
pub mod tile_streamer;

pub use grid::{ClassificationGrid, Grid, HeightGrid};
pub use map_generator::{generate_map_data, DrawMode, MapData, MapPreview, PreviewDisplay};
pub use mesh::{HeightCurve, MeshData, VertexIndex};
pub use noise::{NoiseParameters, NormalizeMode};
pub use regions::{classify, TerrainRegion};
pub use texture::{ColorTexture, Rgba};
pub use tile::{LodThreshold, TileCoordinate, ViewerContext};
pub use tile_streamer::{StreamerStats, TileMessage, TileStreamer, TileSurface};
