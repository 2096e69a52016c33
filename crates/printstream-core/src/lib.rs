//! # printstream-core
//!
//! Core types for the printstream pipeline.
//! Provides the G-code line model, the tracked-position model,
//! and the shared error types.

pub mod data;
pub mod error;
pub mod gcode;

pub use data::MoveSnapshot;
pub use error::{ConfigError, Error, Result};
pub use gcode::{classify, is_movement, param_value, parse_move, strip_comment, LineKind};
