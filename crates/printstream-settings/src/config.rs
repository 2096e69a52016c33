//! Printer settings
//!
//! One flat settings struct covering everything the tool-change pipeline
//! consults. Stored values for the per-tool G-code blocks may contain `\n`
//! escape sequences (settings files written by slicers and older hosts store
//! multi-line blocks on one line); the accessors expand them.

use printstream_core::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Printer configuration consulted by the tool-change pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSettings {
    /// Number of physical tools (extruders) on the device
    pub extruder_count: usize,
    /// If a tool's next use is closer than this many seconds, keep its
    /// heater at target instead of cooling it
    pub seconds_to_reheat: f64,
    /// Degrees to subtract from an idle tool's target temperature
    pub inactive_cool_down: f64,
    /// XY travel speed (units per minute) for the recovery move after a
    /// tool switch
    pub travel_speed_xy: f64,
    /// Z travel speed (units per minute) for the recovery move after a
    /// tool switch
    pub travel_speed_z: f64,
    /// Per-tool G-code emitted immediately before the physical tool select
    pub before_toolchange_gcode: Vec<String>,
    /// Per-tool G-code emitted immediately after the physical tool select
    pub toolchange_gcode: Vec<String>,
    /// Extra values available to `[name]` macro expansion in the blocks
    pub macro_values: HashMap<String, String>,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            extruder_count: 1,
            seconds_to_reheat: 30.0,
            inactive_cool_down: 20.0,
            travel_speed_xy: 4800.0,
            travel_speed_z: 720.0,
            before_toolchange_gcode: Vec::new(),
            toolchange_gcode: Vec::new(),
            macro_values: HashMap::new(),
        }
    }
}

impl PrinterSettings {
    /// G-code block run before switching to `tool`, with `\n` escapes
    /// expanded; empty when not configured for that tool
    pub fn before_toolchange_gcode(&self, tool: usize) -> String {
        unescape(self.before_toolchange_gcode.get(tool))
    }

    /// G-code block run after switching to `tool`, with `\n` escapes
    /// expanded; empty when not configured for that tool
    pub fn toolchange_gcode(&self, tool: usize) -> String {
        unescape(self.toolchange_gcode.get(tool))
    }

    /// Validate settings values
    pub fn validate(&self) -> Result<()> {
        if self.extruder_count == 0 {
            return Err(ConfigError::InvalidValue {
                setting: "extruder_count".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        for (name, value) in [
            ("seconds_to_reheat", self.seconds_to_reheat),
            ("inactive_cool_down", self.inactive_cool_down),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    setting: name.to_string(),
                    reason: format!("must be a non-negative number, got {}", value),
                }
                .into());
            }
        }
        for (name, value) in [
            ("travel_speed_xy", self.travel_speed_xy),
            ("travel_speed_z", self.travel_speed_z),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    setting: name.to_string(),
                    reason: format!("must be a positive number, got {}", value),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::from(ConfigError::FileAccess {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;

        let settings: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| {
                Error::from(ConfigError::ParseError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            })?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| {
                Error::from(ConfigError::ParseError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            })?
        } else {
            return Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into());
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize settings: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize settings: {}", e)))?
        } else {
            return Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into());
        };

        std::fs::write(path, content).map_err(|e| {
            Error::from(ConfigError::FileAccess {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(())
    }
}

fn unescape(stored: Option<&String>) -> String {
    stored.map(|s| s.replace("\\n", "\n")).unwrap_or_default()
}
