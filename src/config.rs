//! Configuration file support.
//!
//! Tool settings are stored as versioned JSON. Every field has a default, so
//! a partial file is accepted; values are clamped to their valid ranges when
//! loaded.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_STEPS, DEFAULT_STROKE_WIDTH, DEFAULT_TENSION, MIN_STEPS, POLYGON_CLOSE_THRESHOLD,
};

/// Log level setting for the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Curve drawing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Catmull-Rom tension in [0, 1]
    #[serde(default = "default_tension")]
    pub tension: f32,

    /// Samples per segment
    #[serde(default = "default_steps")]
    pub steps: usize,

    /// Fill curves as closed regions instead of stroking them
    #[serde(default = "default_closed")]
    pub closed: bool,

    /// Stroke width of open curves, in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
}

fn default_tension() -> f32 {
    DEFAULT_TENSION
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

fn default_closed() -> bool {
    true
}

fn default_stroke_width() -> u32 {
    DEFAULT_STROKE_WIDTH
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            tension: default_tension(),
            steps: default_steps(),
            closed: default_closed(),
            stroke_width: default_stroke_width(),
        }
    }
}

impl CurveConfig {
    /// Copy with every value clamped into range.
    pub fn normalized(&self) -> Self {
        let tension = if self.tension.is_nan() {
            DEFAULT_TENSION
        } else {
            self.tension.clamp(0.0, 1.0)
        };
        Self {
            tension,
            steps: self.steps.max(MIN_STEPS),
            closed: self.closed,
            stroke_width: self.stroke_width.max(1),
        }
    }
}

/// Tool configuration that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Curve drawing settings
    #[serde(default)]
    pub curve: CurveConfig,

    /// Distance from the first vertex that closes a polygon, in pixels
    #[serde(default = "default_close_threshold")]
    pub polygon_close_threshold: f32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_close_threshold() -> f32 {
    POLYGON_CLOSE_THRESHOLD
}

impl ToolConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            curve: CurveConfig::default(),
            polygon_close_threshold: default_close_threshold(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config.normalized())
    }

    /// Copy with every value clamped into range.
    pub fn normalized(&self) -> Self {
        let threshold = if self.polygon_close_threshold.is_finite() {
            self.polygon_close_threshold.max(0.0)
        } else {
            POLYGON_CLOSE_THRESHOLD
        };
        Self {
            version: self.version,
            curve: self.curve.normalized(),
            polygon_close_threshold: threshold,
            log_level: self.log_level,
        }
    }

    /// Get the default filename for a config file.
    pub fn default_filename() -> &'static str {
        "handseg.json"
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
