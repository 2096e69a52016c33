//! The tool-change engine
//!
//! A stream stage that makes extruder switches safe. A naive `T<n>` followed
//! by a move cannot be sent to the device as-is: the incoming tool must be
//! at temperature and at a known position before it is trusted to extrude,
//! and the outgoing tool's heater may need throttling while it idles. The
//! engine therefore holds back the physical tool select until a move forces
//! resolution, wraps it in the configured before/after G-code, and restores
//! position and feed rate on the new tool.
//!
//! State machine:
//!
//! - `Normal` — pass lines through, tracking position.
//! - `WaitingForMove` — a `T<n>` was seen and suppressed; the switch
//!   resolves on the next travel move (or is serviced in place for an
//!   extrusion-only move, which does not complete it).
//! - `SendingBefore` — the before-switch block is queued; the postponed
//!   travel replays after the completion sentinel comes back around.
//!
//! Upstream lines are only pulled while the queue is empty and the sentinel
//! is the final line of the before block, so the engine never sees an
//! upstream line while in `SendingBefore`.

use crate::device::DeviceSink;
use crate::heaters;
use crate::macros::expand_macros;
use crate::queue::CommandQueue;
use crate::stream::GcodeStream;
use printstream_core::{gcode, LineKind, MoveSnapshot};
use printstream_settings::PrinterSettings;
use std::sync::Arc;

/// Sentinel closing every injected before-switch block; its arrival back at
/// the engine promotes the requested tool to active
pub const BEFORE_COMPLETE_MARKER: &str = "; BEFORE_TOOLCHANGE_COMPLETE";

/// Trailing tag on lines the engine re-emitted itself; tagged lines are
/// never rewritten a second time
pub const NO_REPROCESS_MARKER: &str = "; NO_REPROCESS";

/// Trailing tag on lowered idle-heater targets, so the recorded per-tool
/// target temperature is not overwritten by the throttled value
pub const IDLE_COOL_DOWN_MARKER: &str = "; IDLE_COOL_DOWN";

/// Where the engine is in the tool-switch protocol
///
/// Data only valid mid-switch (the postponed line, the pre-switch position)
/// lives in the variant that needs it.
#[derive(Debug)]
enum SendState {
    Normal,
    WaitingForMove {
        requested_tool: usize,
    },
    SendingBefore {
        requested_tool: usize,
        postponed_line: String,
        pre_switch_position: MoveSnapshot,
        pre_switch_feed_rate: Option<f64>,
    },
}

/// Stream stage that rewrites tool changes
///
/// Owns its inner stage, the injected-command queue, and all tool state.
/// Created once per device connection, seeded with the device's reported
/// active tool.
pub struct ToolChangeStream {
    inner: Box<dyn GcodeStream>,
    settings: Arc<PrinterSettings>,
    sink: Arc<dyn DeviceSink>,
    queue: CommandQueue,
    last_destination: MoveSnapshot,
    active_tool: usize,
    /// Tool targeted by the most recent pending switch; equals
    /// `active_tool` exactly when no switch is in flight
    requested_tool: usize,
    /// Recorded commanded target per tool, indexed by tool
    target_temps: Vec<f64>,
    state: SendState,
}

impl ToolChangeStream {
    /// Create the stage around an inner stream
    ///
    /// `active_tool` is the tool the device reports as currently selected.
    pub fn new(
        inner: Box<dyn GcodeStream>,
        settings: Arc<PrinterSettings>,
        sink: Arc<dyn DeviceSink>,
        active_tool: usize,
    ) -> Self {
        let extruder_count = settings.extruder_count;
        debug_assert!(
            active_tool < extruder_count,
            "active tool {} outside configured extruder count {}",
            active_tool,
            extruder_count
        );
        Self {
            inner,
            settings,
            sink,
            queue: CommandQueue::new(),
            last_destination: MoveSnapshot::unknown(),
            active_tool,
            requested_tool: active_tool,
            target_temps: vec![0.0; extruder_count],
            state: SendState::Normal,
        }
    }

    /// Tool currently in effect on the device
    pub fn active_tool(&self) -> usize {
        self.active_tool
    }

    /// Tool targeted by the most recent pending switch
    pub fn requested_tool(&self) -> usize {
        self.requested_tool
    }

    /// Last tracked destination of the device
    pub fn last_destination(&self) -> MoveSnapshot {
        self.last_destination
    }

    /// Emit a line popped off the injected queue
    ///
    /// Queued lines were built by the engine and are not rewritten again;
    /// only the completion sentinel is recognized, and movement lines keep
    /// the tracked position current.
    fn emit_queued(&mut self, line: String) -> String {
        if line == BEFORE_COMPLETE_MARKER {
            self.finish_tool_switch();
        } else if gcode::is_movement(&line) {
            self.last_destination = self.last_destination.merged_with(&gcode::parse_move(&line));
        }
        line
    }

    /// The before block has fully left the engine: the physical select has
    /// been emitted, so the requested tool is now the active one
    fn finish_tool_switch(&mut self) {
        let state = std::mem::replace(&mut self.state, SendState::Normal);
        if let SendState::SendingBefore {
            requested_tool,
            postponed_line,
            pre_switch_position,
            pre_switch_feed_rate,
        } = state
        {
            tracing::debug!("tool switch to T{} complete", requested_tool);
            self.active_tool = requested_tool;
            self.queue_after_gcode(
                requested_tool,
                &postponed_line,
                pre_switch_position,
                pre_switch_feed_rate,
            );
        }
    }

    /// Process one upstream line
    fn process(&mut self, line: String) -> String {
        // Lines the engine replayed itself come back tagged; let them through.
        if line.ends_with(NO_REPROCESS_MARKER) {
            return line;
        }

        let kind = gcode::classify(&line);
        let code = gcode::strip_comment(&line).trim();

        // A temperature command names its tool explicitly, or implicitly
        // targets the tool we are switching to.
        let mut temp_target_tool = None;
        if let LineKind::SetTemperature { wait } = kind {
            let temp = gcode::param_value(code, 'S').unwrap_or(0.0);
            let tool = gcode::param_value(code, 'T')
                .map(|v| v as usize)
                .unwrap_or(self.requested_tool);
            debug_assert!(
                tool < self.settings.extruder_count,
                "temperature command for tool {} outside configured extruder count",
                tool
            );
            // Throttled idle targets are not the tool's desired temperature.
            if !line.contains(IDLE_COOL_DOWN_MARKER) {
                self.target_temps[tool] = temp;
            }
            temp_target_tool = Some((tool, wait));
        }

        // The reheat check runs for every upstream line, whatever the
        // rewrite below decides.
        heaters::manage_reheating(
            &self.settings,
            self.sink.as_ref(),
            &self.target_temps,
            &line,
        );

        if let Some((tool, wait)) = temp_target_tool {
            let mnemonic = if wait { "M109" } else { "M104" };
            if tool != self.active_tool {
                // Some firmwares bind temperature to the selected tool:
                // select the target, set it, select back. active_tool is
                // untouched.
                self.queue
                    .push_line(format!("{} T{} S{}", mnemonic, tool, self.target_temps[tool]));
                self.queue.push_line(format!("T{}", self.active_tool));
                return format!("T{}", tool);
            } else if self.active_tool != self.requested_tool {
                if !code.contains('T') {
                    self.queue.push_line(format!("T{}", self.requested_tool));
                }
                self.queue.push_line(format!("T{}", self.active_tool));
                return line;
            }
            // setting the active tool with no switch pending: plain pass-through
        } else if let LineKind::ToolSelect(tool) = kind {
            debug_assert!(
                tool < self.settings.extruder_count,
                "tool select T{} outside configured extruder count",
                tool
            );
            return self.process_tool_select(tool, line);
        }

        // An extrusion-only move while a switch is pending runs on the
        // requested tool without completing the switch.
        let pending_switch = matches!(self.state, SendState::WaitingForMove { .. })
            && self.active_tool != self.requested_tool;

        if pending_switch
            && kind == LineKind::Move
            && code.contains('E')
            && !code.contains('X')
            && !code.contains('Y')
            && !code.contains('Z')
        {
            if let Some(e_position) = gcode::param_value(code, 'E') {
                self.queue.push_line(format!("T{}", self.requested_tool));
                if let Some(prior_e) = self.last_destination.e {
                    // align per-tool extrusion registers with the shared one
                    self.queue.push_line(format!("G92 E{}", prior_e));
                }
                self.queue
                    .push_line(format!("{} {}", code, NO_REPROCESS_MARKER));
                self.queue.push_line(format!("T{}", self.active_tool));
                self.last_destination.e = Some(e_position);
                self.queue.push_line(format!("G92 E{}", e_position));
                return String::new();
            }
        }

        // A travel move resolves the pending switch: queue the before block
        // and postpone the move until the switch has gone through.
        if pending_switch
            && kind == LineKind::Move
            && (code.contains('X') || code.contains('Y') || code.contains('Z'))
        {
            self.queue_before_gcode(line);
            return String::new();
        }

        if kind == LineKind::Move {
            self.last_destination = self.last_destination.merged_with(&gcode::parse_move(&line));
        }

        line
    }

    fn process_tool_select(&mut self, tool: usize, line: String) -> String {
        if tool == self.active_tool {
            match self.state {
                SendState::WaitingForMove { .. } => {
                    // back on the starting tool without a move in between:
                    // nothing physical ever happened, forget the request
                    let dropped = self.requested_tool;
                    self.state = SendState::Normal;
                    self.requested_tool = tool;
                    tracing::debug!("pending switch to T{} cancelled before any move", dropped);
                    format!("; switch back to T{} without a move, dropping T{}", tool, dropped)
                }
                _ => format!("; T{} already active", tool),
            }
        } else {
            match self.state {
                SendState::Normal => {
                    self.state = SendState::WaitingForMove {
                        requested_tool: tool,
                    };
                    self.requested_tool = tool;
                    format!("; waiting for a move before switching to T{}", tool)
                }
                SendState::WaitingForMove { .. } => {
                    tracing::warn!(
                        "pending switch retargeted from T{} to T{} before any move",
                        self.requested_tool,
                        tool
                    );
                    self.state = SendState::WaitingForMove {
                        requested_tool: tool,
                    };
                    self.requested_tool = tool;
                    format!("; pending switch retargeted to T{}", tool)
                }
                // unreachable while the before block is still queued
                SendState::SendingBefore { .. } => line,
            }
        }
    }

    /// Queue the before-switch block and postpone the travel that forced it
    fn queue_before_gcode(&mut self, postponed_line: String) {
        let requested = self.requested_tool;
        let pre_switch_position = self.last_destination;
        let pre_switch_feed_rate = self.last_destination.feed_rate;

        let mut block = String::new();
        let before = self.settings.before_toolchange_gcode(requested);
        if !before.trim().is_empty() {
            block.push_str(&self.expand(&before, requested));
            if !block.ends_with('\n') {
                block.push('\n');
            }
        }

        heaters::plan_cooldown(
            &self.settings,
            self.sink.as_ref(),
            &self.target_temps,
            self.active_tool,
            requested,
            &mut block,
        );

        // the physical select, then the sentinel that will promote it
        block.push_str(&format!("T{}\n", requested));
        block.push_str(BEFORE_COMPLETE_MARKER);
        block.push('\n');

        tracing::debug!("postponing travel, queueing before block for T{}", requested);
        self.queue.push_block(&block);
        self.state = SendState::SendingBefore {
            requested_tool: requested,
            postponed_line,
            pre_switch_position,
            pre_switch_feed_rate,
        };
    }

    /// Queue the after-switch block: temperature wait, configured G-code,
    /// recovery travel, feed-rate restore, and the postponed line last
    fn queue_after_gcode(
        &mut self,
        new_tool: usize,
        postponed_line: &str,
        pre_switch_position: MoveSnapshot,
        pre_switch_feed_rate: Option<f64>,
    ) {
        let code = gcode::strip_comment(postponed_line);
        let mut target = gcode::parse_move(postponed_line);

        // Without extrusion on the postponed line we can travel straight to
        // its target, falling back to the pre-switch position for any axis
        // it leaves unspecified. With extrusion we must return to exactly
        // the stated coordinates, so no fallback.
        if !code.contains('E') {
            target.x = target.x.or(pre_switch_position.x);
            target.y = target.y.or(pre_switch_position.y);
            target.z = target.z.or(pre_switch_position.z);
        }

        let mut block = String::new();

        // if the new tool is still heating, hold here until it is at target
        let target_temp = self.target_temps[new_tool];
        if self.sink.target_hotend_temperature(new_tool) > 0.0
            && self.sink.actual_hotend_temperature(new_tool) < target_temp - 3.0
        {
            block.push_str(&format!("M109 T{} S{}\n", new_tool, target_temp));
        }

        let after = self.settings.toolchange_gcode(new_tool);
        if !after.trim().is_empty() {
            block.push_str(&self.expand(&after, new_tool));
            if !block.ends_with('\n') {
                block.push('\n');
            }
        }

        if let (Some(x), Some(y)) = (target.x, target.y) {
            block.push_str(&format!(
                "G1 X{} Y{} F{}\n",
                x, y, self.settings.travel_speed_xy
            ));
        }
        if let Some(z) = target.z {
            block.push_str(&format!("G1 Z{} F{}\n", z, self.settings.travel_speed_z));
        }

        if let Some(feed_rate) = pre_switch_feed_rate {
            block.push_str(&format!("G1 F{}\n", feed_rate));
        }

        block.push_str(postponed_line);
        block.push('\n');

        self.queue.push_block(&block);
    }

    /// Expand `[name]` placeholders with live values, then configured ones
    fn expand(&self, template: &str, tool: usize) -> String {
        let settings = Arc::clone(&self.settings);
        let target_temp = self.target_temps.get(tool).copied().unwrap_or(0.0);
        expand_macros(template, &move |name: &str| match name {
            "tool" => Some(tool.to_string()),
            "temperature" => Some(target_temp.to_string()),
            _ => settings.macro_values.get(name).cloned(),
        })
    }
}

impl GcodeStream for ToolChangeStream {
    fn read_line(&mut self) -> Option<String> {
        // injected blocks go out ahead of anything new from upstream
        if let Some(line) = self.queue.pop() {
            return Some(self.emit_queued(line));
        }
        let line = self.inner.read_line()?;
        Some(self.process(line))
    }

    fn set_printer_position(&mut self, position: MoveSnapshot) {
        self.last_destination = self.last_destination.merged_with(&position);
        self.inner.set_printer_position(self.last_destination);
    }
}
