pub mod config_manager;
pub mod terrain_config;

pub use config_manager::{ConfigFormat, ConfigurationError, ConfigurationManager};
pub use terrain_config::{MeshSettings, StreamingSettings, TerrainConfig, ThreadingSettings};
