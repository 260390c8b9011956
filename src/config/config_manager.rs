// src/config/config_manager.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use thiserror::Error;

use crate::config::terrain_config::TerrainConfig;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("could not serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("no configuration path set")]
    NoConfigPath,

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// On-disk encodings, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        match extension.to_ascii_lowercase().as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ConfigurationError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn parse(self, text: &str) -> Result<TerrainConfig, ConfigurationError> {
        Ok(match self {
            ConfigFormat::Toml => toml::from_str(text)?,
            ConfigFormat::Json => serde_json::from_str(text)?,
        })
    }

    pub fn render(self, config: &TerrainConfig) -> Result<String, ConfigurationError> {
        Ok(match self {
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        })
    }
}

/// Owns the active [`TerrainConfig`] and the file it came from.
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    current_config: TerrainConfig,
    config_path: Option<PathBuf>,
}

impl ConfigurationManager {
    pub fn with_config(config: TerrainConfig, config_path: Option<PathBuf>) -> Self {
        Self { current_config: config, config_path }
    }

    /// Load and validate a configuration. Missing sections take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        info!("Loading terrain config from {}", path.display());

        let format = ConfigFormat::from_path(path)?;
        let text = fs::read_to_string(path).map_err(|source| ConfigurationError::Io { path: path.to_path_buf(), source })?;
        let config = format.parse(&text).inspect_err(|e| error!("Failed to parse {}: {}", path.display(), e))?;
        config.validate()?;

        Ok(Self { current_config: config, config_path: Some(path.to_path_buf()) })
    }

    /// Load `path`, falling back to defaults (with a warning) when it is
    /// missing or unusable.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(manager) => manager,
            Err(e) => {
                warn!("Using default terrain config; {} could not be loaded: {}", path.display(), e);
                Self::with_config(TerrainConfig::default(), Some(path.to_path_buf()))
            }
        }
    }

    /// Write the current configuration back to the path it was loaded from.
    pub fn save_to_file(&self) -> Result<(), ConfigurationError> {
        match &self.config_path {
            Some(path) => self.save_to(path),
            None => {
                warn!("Cannot save terrain config: no config path set");
                Err(ConfigurationError::NoConfigPath)
            }
        }
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigurationError> {
        let path = path.as_ref();
        info!("Saving terrain config to {}", path.display());
        let text = ConfigFormat::from_path(path)?.render(&self.current_config)?;
        fs::write(path, text).map_err(|source| ConfigurationError::Io { path: path.to_path_buf(), source })
    }

    pub fn set_config_path<P: AsRef<Path>>(&mut self, path: P) {
        self.config_path = Some(path.as_ref().to_path_buf());
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Replace the whole configuration. Invalid configurations are refused and
    /// the current one is kept.
    pub fn update_config(&mut self, updates: TerrainConfig) -> Result<(), ConfigurationError> {
        updates.validate()?;
        self.current_config = updates;
        Ok(())
    }

    pub fn get_config(&self) -> &TerrainConfig {
        &self.current_config
    }

    /// Mutable access; call [`ConfigurationManager::validate`] after editing.
    pub fn get_config_mut(&mut self) -> &mut TerrainConfig {
        &mut self.current_config
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.current_config.validate()
    }
}
