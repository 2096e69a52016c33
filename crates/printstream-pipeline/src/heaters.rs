//! Heater policy around tool changes
//!
//! Two halves of the same bargain: when a tool goes idle its heater is
//! turned down or off depending on when the schedule needs it again
//! (`plan_cooldown`), and when its next use draws near its heater is brought
//! back to target ahead of time (`manage_reheating`). Reheat commands go out
//! of band through the [`DeviceSink`] so they are not gated on the program
//! stream position.

use crate::device::DeviceSink;
use crate::tool_change::IDLE_COOL_DOWN_MARKER;
use printstream_settings::PrinterSettings;

/// Reissue target temperatures for tools whose next use is imminent
///
/// For every tool with a scheduled next use sooner than `seconds_to_reheat`
/// whose commanded target differs from its recorded target, one
/// `M104 T<i> S<target>` is sent through the sink — unless `line`, the line
/// currently being processed, is already exactly that command. At most one
/// out-of-band command per tool per processed line.
pub fn manage_reheating(
    settings: &PrinterSettings,
    sink: &dyn DeviceSink,
    target_temps: &[f64],
    line: &str,
) {
    for tool in 0..settings.extruder_count {
        let Some(seconds_to_use) = sink.seconds_to_next_tool_use(tool) else {
            continue;
        };
        let target = target_temps[tool];
        let set_temp_line = format!("M104 T{} S{}", tool, target);
        if seconds_to_use < settings.seconds_to_reheat
            && sink.target_hotend_temperature(tool) != target
            && line != set_temp_line
        {
            tracing::debug!(
                "tool {} needed in {:.0}s, reheating to {}",
                tool,
                seconds_to_use,
                target
            );
            sink.queue_line(&set_temp_line);
        }
    }
}

/// Append heater-throttling commands for tools going idle
///
/// Called while building the before-switch block, with `requested_tool`
/// about to become active. When the program contains no further tool change
/// at all, every tool that is neither the outgoing nor the incoming one is
/// switched off. Otherwise only the outgoing tool is considered: off if it
/// is never used again, lowered by `inactive_cool_down` (floored at zero) if
/// its next use is far enough away to be worth it. Lowered targets carry the
/// cool-down marker so the reheat check does not treat them as the tool's
/// desired temperature.
pub fn plan_cooldown(
    settings: &PrinterSettings,
    sink: &dyn DeviceSink,
    target_temps: &[f64],
    active_tool: usize,
    requested_tool: usize,
    gcode: &mut String,
) {
    match sink.seconds_to_next_tool_change() {
        None => {
            for tool in 0..settings.extruder_count {
                if tool != requested_tool && tool != active_tool {
                    gcode.push_str(&format!("M104 T{} S0\n", tool));
                }
            }
        }
        Some(_) => match sink.seconds_to_next_tool_use(active_tool) {
            None => {
                gcode.push_str(&format!("M104 T{} S0\n", active_tool));
            }
            Some(seconds_to_use) if seconds_to_use > settings.seconds_to_reheat => {
                let lowered = (target_temps[active_tool] - settings.inactive_cool_down).max(0.0);
                if lowered != sink.target_hotend_temperature(active_tool) {
                    gcode.push_str(&format!(
                        "M104 T{} S{} {}\n",
                        active_tool, lowered, IDLE_COOL_DOWN_MARKER
                    ));
                }
            }
            // needed again soon, leave it at temperature
            Some(_) => {}
        },
    }
}
