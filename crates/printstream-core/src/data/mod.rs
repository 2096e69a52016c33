//! Data models for tracked printer motion state
//!
//! This module provides `MoveSnapshot`, the running record of where the
//! printer is believed to be. Every field is independently optional: a
//! G-code program rarely states the full machine state on one line, so the
//! snapshot accumulates knowledge line by line and distinguishes "never
//! seen" from any numeric value, including zero.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A partially-known position/feed-rate snapshot
///
/// Each field is `Some(value)` once a line (or an externally reported
/// position) has stated it, and `None` until then. Merging keeps prior
/// knowledge for fields the update leaves unstated, so a field that has
/// become known stays known until explicitly overwritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveSnapshot {
    /// X-axis position
    pub x: Option<f64>,
    /// Y-axis position
    pub y: Option<f64>,
    /// Z-axis position
    pub z: Option<f64>,
    /// Extrusion register value
    pub e: Option<f64>,
    /// Feed rate (units per minute)
    pub feed_rate: Option<f64>,
}

impl MoveSnapshot {
    /// Create a snapshot with nothing known
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Create a snapshot with the given XYZ position known
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
            ..Self::default()
        }
    }

    /// Merge an update into this snapshot
    ///
    /// Fields the update states replace ours; fields it leaves unstated keep
    /// their prior value.
    pub fn merged_with(&self, update: &MoveSnapshot) -> MoveSnapshot {
        MoveSnapshot {
            x: update.x.or(self.x),
            y: update.y.or(self.y),
            z: update.z.or(self.z),
            e: update.e.or(self.e),
            feed_rate: update.feed_rate.or(self.feed_rate),
        }
    }

    /// Check if both X and Y are known
    pub fn has_xy(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// Check if nothing is known yet
    pub fn is_unknown(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.z.is_none()
            && self.e.is_none()
            && self.feed_rate.is_none()
    }
}

impl fmt::Display for MoveSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn field(v: Option<f64>) -> String {
            v.map(|v| format!("{:.3}", v))
                .unwrap_or_else(|| "?".to_string())
        }
        write!(
            f,
            "X:{} Y:{} Z:{} E:{} F:{}",
            field(self.x),
            field(self.y),
            field(self.z),
            field(self.e),
            field(self.feed_rate)
        )
    }
}
