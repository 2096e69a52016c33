//! # printstream-settings
//!
//! Printer configuration consumed by the pipeline. The pipeline itself
//! treats configuration as an opaque read-only lookup; this crate is where
//! the values live: extruder count, per-tool before/after tool-change
//! G-code, heater policy values, and travel speeds. Files load and save as
//! JSON or TOML.

pub mod config;

pub use config::PrinterSettings;
