pub mod height_curve;
pub mod mesh_builder;
pub mod mesh_data;

pub use height_curve::{CurveKey, CurveKeys, HeightCurve, LinearCurve};
pub use mesh_builder::{build, build_preview, simplification_increment, supports_lod, vertices_per_line};
pub use mesh_data::{MeshData, Triangle, VertexIndex};
