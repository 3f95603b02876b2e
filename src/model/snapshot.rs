use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Local};

// --- Raw counter snapshots ---

/// Cumulative busy/idle tick counters for one CPU (or the aggregate).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub busy: u64,
    pub idle: u64,
}

impl CpuTicks {
    pub fn new(busy: u64, idle: u64) -> Self {
        Self { busy, idle }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub total: CpuTicks,
    pub per_core: Vec<CpuTicks>,
}

/// Cumulative byte counters for one interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    /// Link speed in bits per second, `None` when the OS does not report one.
    pub link_speed_bps: Option<u64>,
}

/// Interface name → counters. Ordered by name so a single read is
/// deterministic; first-seen ordering across reads is tracked by the engine.
pub type NetSnapshot = BTreeMap<String, NetCounters>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemSnapshot {
    pub total: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilesystemCounters {
    pub device: String,
    pub total: u64,
    pub free: u64,
}

/// Mount point → filesystem block usage.
pub type DiskSnapshot = BTreeMap<String, FilesystemCounters>;

/// Everything read from the counter source in one cycle. `None` means the
/// domain is disabled or its source could not be read this cycle.
#[derive(Clone, Debug, Default)]
pub struct CounterSample {
    pub cpu: Option<CpuSnapshot>,
    pub net: Option<NetSnapshot>,
    pub mem: Option<MemSnapshot>,
    pub disks: Option<DiskSnapshot>,
}

// --- Time ---

/// Wall-clock time for display and logging, paired with a monotonic instant
/// for interval arithmetic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleTime {
    pub wall: DateTime<Local>,
    pub instant: Instant,
}

impl SampleTime {
    pub fn now() -> Self {
        Self {
            wall: Local::now(),
            instant: Instant::now(),
        }
    }

    pub fn at(wall: DateTime<Local>, instant: Instant) -> Self {
        Self { wall, instant }
    }

    /// `YYYY-MM-DD HH:MM:SS`, the CSV timestamp format.
    pub fn log_stamp(&self) -> String {
        self.wall.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// `HH:MM:SS`, shown in the display title.
    pub fn clock(&self) -> String {
        self.wall.format("%H:%M:%S").to_string()
    }
}
