//! A counter source that replays prepared snapshots, one per read.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{CounterSource, SourceError};
use crate::model::{CounterSample, CpuSnapshot, DiskSnapshot, MemSnapshot, NetSnapshot};

/// How many times each domain has been read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadCounts {
    pub cpu: usize,
    pub net: usize,
    pub mem: usize,
    pub disks: usize,
}

/// Replays one queued [`CounterSample`] per cycle. A `None` domain in a
/// queued sample reads as an outage; an exhausted queue reads as unsupported.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    core_count: usize,
    cpu: VecDeque<Option<CpuSnapshot>>,
    net: VecDeque<Option<NetSnapshot>>,
    mem: VecDeque<Option<MemSnapshot>>,
    disks: VecDeque<Option<DiskSnapshot>>,
    reads: Rc<Cell<ReadCounts>>,
}

impl ScriptedSource {
    pub fn new(core_count: usize) -> Self {
        Self {
            core_count,
            ..Default::default()
        }
    }

    pub fn push_cycle(&mut self, sample: CounterSample) -> &mut Self {
        self.cpu.push_back(sample.cpu);
        self.net.push_back(sample.net);
        self.mem.push_back(sample.mem);
        self.disks.push_back(sample.disks);
        self
    }

    pub fn with_cycles(core_count: usize, cycles: impl IntoIterator<Item = CounterSample>) -> Self {
        let mut source = Self::new(core_count);
        for sample in cycles {
            source.push_cycle(sample);
        }
        source
    }

    pub fn reads(&self) -> ReadCounts {
        self.reads.get()
    }

    /// A handle that keeps reporting read counts after the source has been
    /// boxed and handed to a monitor.
    pub fn read_counter(&self) -> Rc<Cell<ReadCounts>> {
        Rc::clone(&self.reads)
    }

    fn count(&self, bump: impl FnOnce(&mut ReadCounts)) {
        let mut reads = self.reads.get();
        bump(&mut reads);
        self.reads.set(reads);
    }
}

fn next<T>(queue: &mut VecDeque<Option<T>>, domain: &'static str) -> Result<T, SourceError> {
    match queue.pop_front() {
        Some(Some(snapshot)) => Ok(snapshot),
        Some(None) => Err(SourceError::Io(std::io::Error::other(format!(
            "scripted {} outage",
            domain
        )))),
        None => Err(SourceError::Unsupported(domain)),
    }
}

impl CounterSource for ScriptedSource {
    fn core_count(&self) -> usize {
        self.core_count
    }

    fn read_cpu_counters(&mut self) -> Result<CpuSnapshot, SourceError> {
        self.count(|r| r.cpu += 1);
        next(&mut self.cpu, "cpu")
    }

    fn read_net_counters(&mut self) -> Result<NetSnapshot, SourceError> {
        self.count(|r| r.net += 1);
        next(&mut self.net, "net")
    }

    fn read_memory(&mut self) -> Result<MemSnapshot, SourceError> {
        self.count(|r| r.mem += 1);
        next(&mut self.mem, "mem")
    }

    fn read_filesystems(&mut self) -> Result<DiskSnapshot, SourceError> {
        self.count(|r| r.disks += 1);
        next(&mut self.disks, "disks")
    }
}
