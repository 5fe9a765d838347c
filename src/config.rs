//! Engine configuration module.
//!
//! Handles loading, validating, and merging `inflex.toml`. Stock defaults are
//! overridden by whatever keys the user file sets; everything else keeps its
//! default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! thumbnail_size = 256      # Bounding box edge for filtered thumbnails
//! preview_size = 500        # Longer edge of previews
//! quality = 90              # JPEG quality (1-100)
//!
//! [analysis]
//! clusters = 5              # Palette size (k)
//! sample_size = 100         # Images are downsampled to fit this box before clustering
//! max_iterations = 300      # k-means iteration cap
//! seed = 0                  # k-means++ seed; same seed, same palette
//!
//! [swatch]
//! size = 100                # Edge of the rendered vibrant-color swatch
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::analysis::AnalysisOptions;
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

/// Engine configuration loaded from `inflex.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Output image sizes and encoding.
    pub images: ImagesConfig,
    /// Dominant-color clustering.
    pub analysis: AnalysisOptions,
    /// Vibrant-color swatch rendering.
    pub swatch: SwatchConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.thumbnail_size == 0 || self.images.preview_size == 0 {
            return Err(ConfigError::Validation(
                "images.thumbnail_size and images.preview_size must be non-zero".into(),
            ));
        }
        if self.analysis.clusters == 0 {
            return Err(ConfigError::Validation(
                "analysis.clusters must be at least 1".into(),
            ));
        }
        if self.analysis.sample_size == 0 {
            return Err(ConfigError::Validation(
                "analysis.sample_size must be non-zero".into(),
            ));
        }
        if self.analysis.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "analysis.max_iterations must be at least 1".into(),
            ));
        }
        if self.swatch.size == 0 {
            return Err(ConfigError::Validation(
                "swatch.size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Output image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Filtered images are stored as thumbnails fitting this square box.
    pub thumbnail_size: u32,
    /// Longer edge of previews.
    pub preview_size: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 256,
            preview_size: 500,
            quality: 90,
        }
    }
}

/// Vibrant-color swatch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwatchConfig {
    /// Edge length of the square swatch image.
    pub size: u32,
}

impl Default for SwatchConfig {
    fn default() -> Self {
        Self { size: 100 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
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
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EngineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file is an error.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `inflex.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Inflex Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output images
# ---------------------------------------------------------------------------
[images]
# Filtered images are stored as thumbnails fitting a square box of this edge.
thumbnail_size = 256

# Longer edge (pixels) of preview images.
preview_size = 500

# JPEG encoding quality (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Dominant-color analysis
# ---------------------------------------------------------------------------
[analysis]
# Number of colors in the palette (k-means cluster count).
clusters = 5

# Images are downsampled to fit this box before clustering.
sample_size = 100

# Upper bound on k-means iterations.
max_iterations = 300

# Seed for centroid initialization. The same seed gives the same palette.
seed = 0

# ---------------------------------------------------------------------------
# Vibrant-color swatch
# ---------------------------------------------------------------------------
[swatch]
# Edge length (pixels) of the square swatch image.
size = 100

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
