use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, warn};

use crate::controller::Monitor;
use crate::csvlog::CsvLogger;
use crate::model::{MetricFrame, SampleTime};
use crate::view::Presenter;

/// Longest single sleep while waiting for the next cycle.
pub const QUIT_POLL: Duration = Duration::from_millis(50);

/// Sample, render and log, once per call. Both sinks receive the same frame.
pub struct CycleDriver<W: Write> {
    monitor: Monitor,
    presenter: Presenter,
    logger: Option<CsvLogger<W>>,
    cycles: u64,
}

impl<W: Write> CycleDriver<W> {
    pub fn new(monitor: Monitor, presenter: Presenter, logger: Option<CsvLogger<W>>) -> Self {
        Self {
            monitor,
            presenter,
            logger,
            cycles: 0,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_logging(&self) -> bool {
        self.logger.is_some()
    }

    pub fn step(&mut self, out: &mut impl Write) -> io::Result<MetricFrame> {
        let frame = self.monitor.sample();
        self.publish(out, &frame)?;
        Ok(frame)
    }

    pub fn step_at(&mut self, out: &mut impl Write, now: SampleTime) -> io::Result<MetricFrame> {
        let frame = self.monitor.sample_at(now);
        self.publish(out, &frame)?;
        Ok(frame)
    }

    /// A failed log write stops logging for the rest of the run; the display
    /// keeps going. Render errors are returned.
    fn publish(&mut self, out: &mut impl Write, frame: &MetricFrame) -> io::Result<()> {
        self.cycles += 1;
        self.presenter.render(out, frame)?;
        if let Some(logger) = self.logger.as_mut() {
            if let Err(e) = logger.log(frame) {
                error!("CSV log write failed, logging disabled: {}", e);
                self.logger = None;
            }
        }
        Ok(())
    }

    /// Flush the log and hand back its writer.
    pub fn finish(self) -> Option<W> {
        let mut logger = self.logger?;
        if let Err(e) = logger.flush() {
            warn!("final CSV flush failed: {}", e);
        }
        Some(logger.into_inner())
    }
}

/// Sleep until `deadline` in short slices, returning early once
/// `should_quit` is set. Returns whether a quit was requested.
pub fn wait_until(deadline: Instant, should_quit: &AtomicBool) -> bool {
    loop {
        if should_quit.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep((deadline - now).min(QUIT_POLL));
    }
}
