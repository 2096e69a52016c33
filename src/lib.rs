//! # printstream
//!
//! A G-code rewriting pipeline for multi-extruder 3D printers. The stream
//! between the instruction source and the device connection is a chain of
//! pull-based stages; the tool-change stage rewrites `T<n>` selects so the
//! device only ever switches tools when the incoming tool is heated and the
//! position can be recovered.
//!
//! ## Architecture
//!
//! The workspace is organized as:
//!
//! 1. **printstream-core** - G-code line model, position tracking, errors
//! 2. **printstream-settings** - printer configuration (extruder count,
//!    tool-change macros, heater policy)
//! 3. **printstream-pipeline** - the stream stages and the tool-change
//!    engine
//! 4. **printstream** - this crate: the command-line front end
//!
//! The binary streams a G-code program through the pipeline against a
//! simulated device and prints the rewritten program; a live host would put
//! its connection behind the same [`printstream_pipeline::DeviceSink`] and
//! [`printstream_pipeline::GcodeStream`] traits.

pub use printstream_core::{data, error, gcode};
pub use printstream_pipeline as pipeline;
pub use printstream_settings::PrinterSettings;

/// Initialize logging with the default configuration
///
/// Sets up structured logging with console output and `RUST_LOG`
/// environment variable support.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
