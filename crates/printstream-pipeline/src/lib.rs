//! # printstream-pipeline
//!
//! The stream stages that sit between a G-code source and the device
//! connection. Each stage owns its inner stage and is pulled one line at a
//! time; the tool-change stage rewrites the stream so extruder switches are
//! safe to execute.
//!
//! The central piece is [`ToolChangeStream`]: it defers physical `T<n>`
//! selects until a move forces resolution, wraps the switch in configured
//! before/after G-code, manages idle-heater cooldown and scheduled reheat
//! through a [`DeviceSink`], and restores position and feed rate on the new
//! tool.

pub mod device;
pub mod heaters;
pub mod macros;
pub mod queue;
pub mod stream;
pub mod tool_change;

pub use device::{DeviceSink, OfflineDeviceSink};
pub use macros::expand_macros;
pub use queue::CommandQueue;
pub use stream::{GcodeStream, ProgramSource};
pub use tool_change::{
    ToolChangeStream, BEFORE_COMPLETE_MARKER, IDLE_COOL_DOWN_MARKER, NO_REPROCESS_MARKER,
};
