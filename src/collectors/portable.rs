use super::{collect_filesystems, CounterSource, SourceError};
use crate::model::{CpuSnapshot, CpuTicks, DiskSnapshot, MemSnapshot, NetCounters, NetSnapshot};
use sysinfo::{Disks, Networks, System};

/// Ticks credited per read for a fully busy CPU (hundredths of a percent).
const TICKS_PER_READ: u64 = 10_000;

/// Counter source for platforms without procfs, built on `sysinfo`.
///
/// `sysinfo` reports CPU usage as a percentage since its previous refresh
/// rather than raw tick counters, so this collector integrates those
/// percentages into synthetic cumulative busy/idle counters. The delta
/// engine then recovers the same percentage from consecutive snapshots.
pub struct SysinfoCollector {
    sys: System,
    networks: Networks,
    disks: Disks,
    core_count: usize,
    cpu_total: CpuTicks,
    cpu_cores: Vec<CpuTicks>,
}

impl SysinfoCollector {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        let core_count = sys.cpus().len();
        Self {
            sys,
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            core_count,
            cpu_total: CpuTicks::default(),
            cpu_cores: vec![CpuTicks::default(); core_count],
        }
    }
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn accumulate(ticks: &mut CpuTicks, usage_pct: f32) {
    let busy = (f64::from(usage_pct).clamp(0.0, 100.0) * 100.0).round() as u64;
    ticks.busy += busy;
    ticks.idle += TICKS_PER_READ - busy;
}

impl CounterSource for SysinfoCollector {
    fn core_count(&self) -> usize {
        self.core_count
    }

    fn read_cpu_counters(&mut self) -> Result<CpuSnapshot, SourceError> {
        self.sys.refresh_cpu_usage();
        let cpus = self.sys.cpus();
        if cpus.is_empty() {
            return Err(SourceError::Unsupported("cpu"));
        }

        accumulate(&mut self.cpu_total, self.sys.global_cpu_usage());
        for (ticks, cpu) in self.cpu_cores.iter_mut().zip(cpus) {
            accumulate(ticks, cpu.cpu_usage());
        }

        Ok(CpuSnapshot {
            total: self.cpu_total,
            per_core: self.cpu_cores.clone(),
        })
    }

    fn read_net_counters(&mut self) -> Result<NetSnapshot, SourceError> {
        self.networks.refresh(true);
        Ok(self
            .networks
            .iter()
            .map(|(name, data)| {
                (
                    name.clone(),
                    NetCounters {
                        rx_bytes: data.total_received(),
                        tx_bytes: data.total_transmitted(),
                        link_speed_bps: None,
                    },
                )
            })
            .collect())
    }

    fn read_memory(&mut self) -> Result<MemSnapshot, SourceError> {
        self.sys.refresh_memory();
        Ok(MemSnapshot {
            total: self.sys.total_memory(),
            available: self.sys.available_memory(),
            swap_total: self.sys.total_swap(),
            swap_free: self.sys.free_swap(),
        })
    }

    fn read_filesystems(&mut self) -> Result<DiskSnapshot, SourceError> {
        Ok(collect_filesystems(&mut self.disks))
    }
}
