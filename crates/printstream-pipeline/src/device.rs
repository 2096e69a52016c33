//! Device telemetry and control sink
//!
//! The surrounding communication layer owns the live connection; the
//! pipeline sees it only through this trait: hotend temperatures, the print
//! schedule (when is a tool needed next), and a side door for commands that
//! must bypass the normal stream, such as reheat commands triggered by the
//! clock rather than by program order.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Shared, thread-safe view of the connected device
///
/// Implementations are owned and synchronized by the communication layer;
/// the pipeline holds one behind an `Arc` and never blocks on it.
pub trait DeviceSink: Send + Sync {
    /// Temperature the device is currently commanded to hold for `tool`
    fn target_hotend_temperature(&self, tool: usize) -> f64;

    /// Live measured temperature of `tool`
    fn actual_hotend_temperature(&self, tool: usize) -> f64;

    /// Seconds until `tool` is next scheduled to extrude; `None` when it is
    /// never used again
    fn seconds_to_next_tool_use(&self, tool: usize) -> Option<f64>;

    /// Seconds until the next tool change anywhere in the program; `None`
    /// when there are no more changes
    fn seconds_to_next_tool_change(&self) -> Option<f64>;

    /// Send one raw command line to the device, bypassing the normal stream
    ///
    /// No ordering guarantee relative to lines returned by the pipeline.
    fn queue_line(&self, line: &str);
}

#[derive(Debug, Default)]
struct OfflineState {
    target_temps: HashMap<usize, f64>,
    actual_temps: HashMap<usize, f64>,
    next_tool_use: HashMap<usize, f64>,
    next_tool_change: Option<f64>,
    out_of_band: Vec<String>,
}

/// In-memory `DeviceSink` for offline use
///
/// Backs the CLI front end and tests: telemetry values are set directly and
/// out-of-band commands are recorded instead of transmitted.
#[derive(Debug, Default)]
pub struct OfflineDeviceSink {
    state: Mutex<OfflineState>,
}

impl OfflineDeviceSink {
    /// Create a sink with no telemetry: all temperatures read 0 and no tool
    /// has a scheduled next use
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the commanded target temperature reported for `tool`
    pub fn set_target_temperature(&self, tool: usize, temperature: f64) {
        self.state.lock().target_temps.insert(tool, temperature);
    }

    /// Set the measured temperature reported for `tool`
    pub fn set_actual_temperature(&self, tool: usize, temperature: f64) {
        self.state.lock().actual_temps.insert(tool, temperature);
    }

    /// Set the seconds until `tool` is next scheduled to extrude;
    /// `None` marks it never used again
    pub fn set_next_tool_use(&self, tool: usize, seconds: Option<f64>) {
        let mut state = self.state.lock();
        match seconds {
            Some(s) => state.next_tool_use.insert(tool, s),
            None => state.next_tool_use.remove(&tool),
        };
    }

    /// Set the seconds until the next tool change anywhere in the program
    pub fn set_next_tool_change(&self, seconds: Option<f64>) {
        self.state.lock().next_tool_change = seconds;
    }

    /// Take every out-of-band command recorded since the last drain
    pub fn drain_out_of_band(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().out_of_band)
    }
}

impl DeviceSink for OfflineDeviceSink {
    fn target_hotend_temperature(&self, tool: usize) -> f64 {
        self.state.lock().target_temps.get(&tool).copied().unwrap_or(0.0)
    }

    fn actual_hotend_temperature(&self, tool: usize) -> f64 {
        self.state.lock().actual_temps.get(&tool).copied().unwrap_or(0.0)
    }

    fn seconds_to_next_tool_use(&self, tool: usize) -> Option<f64> {
        self.state.lock().next_tool_use.get(&tool).copied()
    }

    fn seconds_to_next_tool_change(&self) -> Option<f64> {
        self.state.lock().next_tool_change
    }

    fn queue_line(&self, line: &str) {
        tracing::debug!("out-of-band command: {}", line);
        self.state.lock().out_of_band.push(line.to_string());
    }
}
