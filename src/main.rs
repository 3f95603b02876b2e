use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use umon::app;
use umon::config::{Cli, Config};

/// Install a file subscriber writing to `path`. Without `--trace-file` no
/// subscriber is installed at all.
fn init_tracing(path: &Path) -> Result<(), String> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("invalid trace file path '{}'", path.display()))?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| format!("could not open trace file '{}': {}", path.display(), e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("umon=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let (config, warnings) = Config::from_cli(Cli::parse());
    for warning in &warnings {
        eprintln!("Warning: {}", warning);
    }

    if let Some(path) = &config.trace_file {
        if let Err(e) = init_tracing(path) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let should_quit = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&should_quit)) {
            eprintln!("Error: failed to install signal handler: {}", e);
            return ExitCode::FAILURE;
        }
    }

    match app::run(&config, should_quit) {
        Ok(summary) => {
            println!("\nMonitoring stopped.");
            if let Some(path) = summary.log_path {
                println!("Log saved to: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
