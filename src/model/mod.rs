// Re-export all model types from submodules.

pub use frame::{CpuUsage, DiskUsage, InterfaceSample, MetricFrame, NetRate, Usage};
pub use snapshot::{
    CounterSample, CpuSnapshot, CpuTicks, DiskSnapshot, FilesystemCounters, MemSnapshot,
    NetCounters, NetSnapshot, SampleTime,
};

mod frame;
mod snapshot;
