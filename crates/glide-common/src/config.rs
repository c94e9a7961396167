//! Engine configuration
//!
//! Defaults for tween jobs, drag sessions and logging. Every section and every
//! field is optional in the JSON form; missing values take the built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{GlideError, Result};

/// Top-level Glide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideConfig {
    /// Tween engine defaults
    pub tween: TweenDefaults,

    /// Drag engine defaults
    pub drag: DragDefaults,

    /// Logging settings
    pub logging: LoggingSection,
}

/// Defaults filled into every tween request that leaves a field unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenDefaults {
    /// Total animation time in milliseconds
    pub duration_ms: u64,

    /// Delay between stepped frames in milliseconds
    pub interval_ms: u64,

    /// Easing name ("linear", "ease-in", "ease-out", "ease-in-out", or a native curve)
    pub easing: String,

    /// Apply `display: none` when an animation collapses the element
    pub hide_if_needed: bool,

    /// Allow the native-transition path when the host supports it
    pub allow_native: bool,
}

/// Drag engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragDefaults {
    /// Starting value of the shared z-index counter; the first drag gets base + 1
    pub z_index_base: u64,

    /// Pixels before a drop zone's origin at which it starts matching
    pub tolerance_lead: f64,

    /// Pixels trimmed from a drop zone's far edge
    pub tolerance_tail: f64,
}

/// Logging section, converted with `LogConfig::from_section`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level name ("trace", "debug", "info", ...)
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    pub format: String,

    /// Optional EnvFilter directive string
    pub filter: Option<String>,
}

impl Default for TweenDefaults {
    fn default() -> Self {
        Self {
            duration_ms: 1000,
            interval_ms: 50,
            easing: "linear".to_string(),
            hide_if_needed: true,
            allow_native: true,
        }
    }
}

impl Default for DragDefaults {
    fn default() -> Self {
        Self {
            z_index_base: 99,
            tolerance_lead: 30.0,
            tolerance_tail: 10.0,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            filter: None,
        }
    }
}

impl GlideConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GlideError::config_with_source("invalid configuration JSON", e))
    }

    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded glide configuration");
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GlideError::config_with_source("cannot serialize configuration", e))
    }
}
