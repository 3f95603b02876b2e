use std::fmt;
use std::io;

use sysinfo::Disks;

use crate::model::{CpuSnapshot, DiskSnapshot, FilesystemCounters, MemSnapshot, NetSnapshot};

pub mod fs;
pub mod linux;
pub mod portable;
pub mod scripted;

pub use fs::{FileSystem, MockFs, RealFs};
pub use linux::ProcfsCollector;
pub use portable::SysinfoCollector;
pub use scripted::ScriptedSource;

/// Error reading one metric domain. Never fatal: the cycle driver drops the
/// domain for that cycle and carries on.
#[derive(Debug)]
pub enum SourceError {
    /// Counter file or API could not be read.
    Io(io::Error),
    /// Counter data was present but malformed.
    Parse(String),
    /// The source has nothing to offer for this domain on this platform.
    Unsupported(&'static str),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "I/O error: {}", e),
            SourceError::Parse(msg) => write!(f, "parse error: {}", msg),
            SourceError::Unsupported(domain) => write!(f, "{} counters not supported", domain),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<io::Error> for SourceError {
    fn from(e: io::Error) -> Self {
        SourceError::Io(e)
    }
}

/// Pull-based access to cumulative OS counters, one snapshot per call.
/// Implementations (ProcfsCollector, SysinfoCollector) handle the platform
/// details; the engine only ever sees the snapshot types.
pub trait CounterSource {
    /// Number of per-core entries every CPU snapshot will carry.
    fn core_count(&self) -> usize;

    /// Aggregate and per-core busy/idle ticks.
    fn read_cpu_counters(&mut self) -> Result<CpuSnapshot, SourceError>;

    /// Per-interface cumulative byte counters and link speed.
    fn read_net_counters(&mut self) -> Result<NetSnapshot, SourceError>;

    fn read_memory(&mut self) -> Result<MemSnapshot, SourceError>;

    /// Block usage of every real mounted filesystem.
    fn read_filesystems(&mut self) -> Result<DiskSnapshot, SourceError>;
}

/// Pick the counter source for the platform we are running on.
pub fn default_source() -> Box<dyn CounterSource> {
    if cfg!(target_os = "linux") {
        Box::new(ProcfsCollector::new(RealFs::new()))
    } else {
        Box::new(SysinfoCollector::new())
    }
}

/// Refresh `disks` and turn the list into a snapshot. Loop devices and
/// zero-sized pseudo filesystems are skipped.
pub(crate) fn collect_filesystems(disks: &mut Disks) -> DiskSnapshot {
    disks.refresh(true);
    let mut snapshot = DiskSnapshot::new();
    for disk in disks.list() {
        let device = disk.name().to_string_lossy().into_owned();
        let total = disk.total_space();
        if total == 0 || device.contains("loop") {
            continue;
        }
        snapshot.insert(
            disk.mount_point().to_string_lossy().into_owned(),
            FilesystemCounters {
                device,
                total,
                free: disk.available_space(),
            },
        );
    }
    snapshot
}
