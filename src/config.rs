//! Tool configuration.
//!
//! Settings live in an optional `variant-forge.toml`. Values not set in the
//! file keep their stock defaults, and CLI flags override both.
//!
//! ## Config File Location
//!
//! `--config <FILE>` names the file explicitly (it must exist). Without the
//! flag, `variant-forge.toml` in the working directory is used when present.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [transcoder]
//! program = "ffmpeg"        # Executable used for every conversion
//!
//! [encoding]
//! jpeg_qscale = 2           # ffmpeg -q:v for jpg/jpeg (2 = best, 31 = worst)
//! png_compression = 6       # ffmpeg -compression_level for png (0-9)
//! webp_quality = 90         # ffmpeg -quality for webp (0-100)
//!
//! [processing]
//! workers = 1               # 1 = one conversion at a time
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [transcoder]
//! program = "/opt/ffmpeg/bin/ffmpeg"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "variant-forge.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// External transcoder settings.
    pub transcoder: TranscoderConfig,
    /// Per-format encoder flags.
    pub encoding: EncodingConfig,
    /// Batch scheduling.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transcoder.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "transcoder.program must not be empty".into(),
            ));
        }
        if !(2..=31).contains(&self.encoding.jpeg_qscale) {
            return Err(ConfigError::Validation(
                "encoding.jpeg_qscale must be 2-31".into(),
            ));
        }
        if self.encoding.png_compression > 9 {
            return Err(ConfigError::Validation(
                "encoding.png_compression must be 0-9".into(),
            ));
        }
        if self.encoding.webp_quality > 100 {
            return Err(ConfigError::Validation(
                "encoding.webp_quality must be 0-100".into(),
            ));
        }
        if self.processing.workers == 0 {
            return Err(ConfigError::Validation(
                "processing.workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranscoderConfig {
    /// Program name or path. Looked up on `PATH` when not a path.
    pub program: String,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }
}

/// Encoder settings passed as format-specific flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// `-q:v` for jpg/jpeg. Lower is better.
    pub jpeg_qscale: u32,
    /// `-compression_level` for png.
    pub png_compression: u32,
    /// `-quality` for webp.
    pub webp_quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            jpeg_qscale: 2,
            png_compression: 6,
            webp_quality: 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of images converted concurrently. `1` runs every conversion
    /// strictly in sequence.
    pub workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// Resolve the effective worker count.
///
/// Capped at the number of available cores: the user can constrain down,
/// not up. Never less than one.
pub fn effective_workers(requested: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested.clamp(1, cores.max(1))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration.
///
/// - `Some(path)`: the file must exist.
/// - `None`: [`DEFAULT_CONFIG_FILE`] inside `cwd` is used when present,
///   stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<Config, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(load_raw_config(path)?)
        }
        None => {
            let implicit = cwd.join(DEFAULT_CONFIG_FILE);
            if implicit.exists() {
                Some(load_raw_config(&implicit)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# variant-forge configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Save as variant-forge.toml in the working directory, or pass
# --config <FILE>. Command-line flags override these values.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# External transcoder
# ---------------------------------------------------------------------------
[transcoder]
# Program invoked for every conversion. A bare name is looked up on PATH.
program = "ffmpeg"

# ---------------------------------------------------------------------------
# Encoder flags
# ---------------------------------------------------------------------------
[encoding]
# jpg/jpeg: passed as -q:v (2 = best quality, 31 = worst).
jpeg_qscale = 2
# png: passed as -compression_level (0 = fastest, 9 = smallest).
png_compression = 6
# webp: passed as -quality (0-100).
webp_quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Images converted concurrently. 1 runs one conversion at a time and keeps
# progress output in strict submission order. Larger values keep each
# image's variants in order but interleave images. Capped at CPU cores.
workers = 1
"##
}
