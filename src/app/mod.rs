mod event_loop;

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{info, warn};

use crate::collectors::{default_source, CounterSource};
use crate::config::Config;
use crate::controller::Monitor;
use crate::csvlog::CsvLogger;
use crate::view::Presenter;

pub use event_loop::{wait_until, CycleDriver, QUIT_POLL};

/// Errors that end a run. Source and log-write failures mid-run are not
/// among them: those degrade the output instead.
#[derive(Debug)]
pub enum RunError {
    /// The CSV log could not be created.
    LogFile { path: PathBuf, source: io::Error },
    /// Writing to the terminal failed.
    Terminal(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::LogFile { path, source } => {
                write!(f, "could not open log file '{}': {}", path.display(), source)
            }
            RunError::Terminal(e) => write!(f, "terminal error: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::LogFile { source, .. } => Some(source),
            RunError::Terminal(e) => Some(e),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub cycles: u64,
    /// Set when a log was open at shutdown.
    pub log_path: Option<PathBuf>,
}

/// Switch to the alternate screen and hide the cursor. Monochrome mode draws
/// in the normal screen. On failure the terminal is restored before the error
/// is returned.
pub fn enter_terminal(out: &mut impl Write, monochrome: bool) -> io::Result<()> {
    if monochrome {
        return Ok(());
    }
    if let Err(e) = execute!(out, EnterAlternateScreen, Hide) {
        restore_terminal_on(out, monochrome);
        return Err(e);
    }
    Ok(())
}

/// Restore the terminal to normal mode. Safe to call multiple times.
pub fn restore_terminal(monochrome: bool) {
    restore_terminal_on(&mut io::stdout(), monochrome);
}

fn restore_terminal_on(out: &mut impl Write, monochrome: bool) {
    if !monochrome {
        let _ = execute!(out, Show, LeaveAlternateScreen);
    }
}

/// Run with the platform's counter source until `should_quit` is set.
pub fn run(config: &Config, should_quit: Arc<AtomicBool>) -> Result<RunSummary, RunError> {
    run_with_source(default_source(), config, should_quit)
}

pub fn run_with_source(
    source: Box<dyn CounterSource>,
    config: &Config,
    should_quit: Arc<AtomicBool>,
) -> Result<RunSummary, RunError> {
    let monitor = Monitor::new(source, config);

    let logger = match &config.log_path {
        Some(path) => Some(
            CsvLogger::create(path, config.domains, monitor.core_count()).map_err(|e| RunError::LogFile {
                path: path.clone(),
                source: e,
            })?,
        ),
        None => None,
    };

    info!(
        interval_ms = config.interval.as_millis() as u64,
        cores = monitor.core_count(),
        log = ?config.log_path,
        "monitoring started"
    );

    let mut stdout = io::stdout();
    enter_terminal(&mut stdout, config.monochrome).map_err(RunError::Terminal)?;

    let mut driver = CycleDriver::new(monitor, Presenter::new(config), logger);

    while !should_quit.load(Ordering::Relaxed) {
        let cycle_start = Instant::now();
        if let Err(e) = driver.step(&mut stdout) {
            restore_terminal(config.monochrome);
            return Err(RunError::Terminal(e));
        }
        if wait_until(cycle_start + config.interval, &should_quit) {
            break;
        }
    }

    restore_terminal(config.monochrome);

    let cycles = driver.cycles();
    let logging = driver.is_logging();
    if config.log_path.is_some() && !logging {
        warn!("log was disabled during the run");
    }
    driver.finish();
    info!(cycles, "monitoring stopped");

    Ok(RunSummary {
        cycles,
        log_path: if logging { config.log_path.clone() } else { None },
    })
}
