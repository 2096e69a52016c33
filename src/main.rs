use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};

use printstream::init_logging;
use printstream::PrinterSettings;
use printstream_pipeline::{GcodeStream, OfflineDeviceSink, ProgramSource, ToolChangeStream};

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let mut program: Option<PathBuf> = None;
    let mut settings_path: Option<PathBuf> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" | "-s" => {
                let path = args
                    .next()
                    .context("--settings requires a file argument")?;
                settings_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            _ if program.is_none() => program = Some(PathBuf::from(arg)),
            _ => bail!("Unexpected argument: {}", arg),
        }
    }

    let Some(program) = program else {
        print_usage();
        bail!("No G-code file given");
    };

    let settings = match &settings_path {
        Some(path) => PrinterSettings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => PrinterSettings::default(),
    };
    tracing::info!(
        "rewriting {} for {} extruder(s)",
        program.display(),
        settings.extruder_count
    );

    let text = std::fs::read_to_string(&program)
        .with_context(|| format!("Failed to read {}", program.display()))?;

    let sink = Arc::new(OfflineDeviceSink::new());
    let mut stream = ToolChangeStream::new(
        Box::new(ProgramSource::from_text(&text)),
        Arc::new(settings),
        sink.clone(),
        0,
    );

    while let Some(line) = stream.read_line() {
        if !line.is_empty() {
            println!("{}", line);
        }
        for command in sink.drain_out_of_band() {
            tracing::info!("out-of-band: {}", command);
        }
    }

    Ok(())
}

fn print_usage() {
    eprintln!("Usage: printstream [--settings <printer.json|printer.toml>] <program.gcode>");
    eprintln!();
    eprintln!("Streams the program through the tool-change pipeline against a");
    eprintln!("simulated device and prints the rewritten G-code to stdout.");
}
