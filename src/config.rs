//! Tool configuration module.
//!
//! Handles loading and validating an optional `config.toml` placed in the
//! input directory. Every knob has a default; a config file only needs the
//! values it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! main_width = 2000         # Longer-edge bound for display images
//! thumb_width = 500         # Longer-edge bound for thumbnails
//! quality = 90              # JPEG quality (1-100)
//!
//! [tiles]
//! size = 256                # Tile edge length in pixels
//! format = "jpg"            # Tile file format
//! program = "vips"          # Deep-zoom tool invoked per view
//!
//! [scan]
//! # max_catalog_id = 10000  # Optional guard; ids above it are skipped
//!
//! [processing]
//! # max_processes = 4       # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Display image and thumbnail settings (bounds, quality).
    pub images: ImagesConfig,
    /// Deep-zoom tile generation settings.
    pub tiles: TilesConfig,
    /// Source discovery settings.
    pub scan: ScanConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.main_width == 0 || self.images.thumb_width == 0 {
            return Err(ConfigError::Validation(
                "images.main_width and images.thumb_width must be non-zero".into(),
            ));
        }
        if self.tiles.size == 0 {
            return Err(ConfigError::Validation("tiles.size must be non-zero".into()));
        }
        if self.tiles.format.is_empty() {
            return Err(ConfigError::Validation(
                "tiles.format must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Display image and thumbnail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Longer-edge pixel bound for display images.
    pub main_width: u32,
    /// Longer-edge pixel bound for thumbnails.
    pub thumb_width: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            main_width: 2000,
            thumb_width: 500,
            quality: 90,
        }
    }
}

/// Deep-zoom tile generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TilesConfig {
    /// Tile edge length in pixels.
    pub size: u32,
    /// Tile file format (extension the tiling tool encodes to).
    pub format: String,
    /// Program invoked to build each tile pyramid.
    pub program: String,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            size: 256,
            format: "jpg".to_string(),
            program: "vips".to_string(),
        }
    }
}

/// Source discovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Optional sanity bound on catalog ids. Files whose id exceeds it are
    /// skipped with a warning. When absent, every observed id is accepted.
    pub max_catalog_id: Option<u32>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Load config from `{root}/config.toml`, or defaults if the file is absent.
pub fn load_config(root: &Path) -> Result<Config, ConfigError> {
    let path = root.join("config.toml");
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
