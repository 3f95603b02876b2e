//! Delta engine: turns consecutive absolute counter snapshots into rates and
//! percentages.
//!
//! All previous-sample state lives in [`EngineState`], a plain value owned by
//! the cycle driver. [`EngineState::compute_frame`] is total: zero elapsed
//! time, counter resets and misaligned core lists all resolve to `0.0` or
//! `None` instead of an error.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, warn};

use crate::model::{
    CounterSample, CpuSnapshot, CpuTicks, CpuUsage, DiskSnapshot, DiskUsage, InterfaceSample,
    MemSnapshot, MetricFrame, NetRate, NetSnapshot, SampleTime, Usage,
};

/// Previous-sample cache for the stateful domains (CPU and network).
#[derive(Debug, Default)]
pub struct EngineState {
    previous_cpu: Option<CpuSnapshot>,
    /// Last (rx, tx) per interface. `None` means the interface is known but
    /// has no usable previous counters (not seen last cycle).
    previous_net: HashMap<String, Option<(u64, u64)>>,
    /// Every interface ever seen, in first-seen order. Never shrinks.
    interface_order: Vec<String>,
    previous_sample_time: Option<Instant>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_cpu(&self) -> Option<&CpuSnapshot> {
        self.previous_cpu.as_ref()
    }

    pub fn previous_net(&self, iface: &str) -> Option<(u64, u64)> {
        self.previous_net.get(iface).copied().flatten()
    }

    pub fn previous_sample_time(&self) -> Option<Instant> {
        self.previous_sample_time
    }

    /// All interfaces observed so far, in first-seen order.
    pub fn interfaces(&self) -> &[String] {
        &self.interface_order
    }

    /// Build this cycle's frame from `sample`, then make `sample` the
    /// previous snapshot for the next cycle.
    pub fn compute_frame(&mut self, sample: CounterSample, now: SampleTime) -> MetricFrame {
        let cpu = sample
            .cpu
            .as_ref()
            .and_then(|current| self.previous_cpu.as_ref().map(|prev| cpu_usage(prev, current)));

        let net = sample.net.as_ref().map(|current| self.net_rates(current, now.instant));

        let (mem, swap) = match sample.mem {
            Some(m) => {
                let (mem, swap) = memory_usage(&m);
                (Some(mem), Some(swap))
            }
            None => (None, None),
        };

        let disks = sample.disks.as_ref().map(disk_usage);

        let frame = MetricFrame {
            timestamp: now,
            cpu,
            net,
            mem,
            swap,
            disks,
        };

        self.update(sample, now.instant);
        frame
    }

    fn net_rates(&self, current: &NetSnapshot, now: Instant) -> Vec<InterfaceSample> {
        let dt = self
            .previous_sample_time
            .and_then(|prev| now.checked_duration_since(prev))
            .map(|d| d.as_secs_f64())
            .filter(|dt| *dt > 0.0);

        let rate_for = |name: &str, counters: (u64, u64)| -> Option<NetRate> {
            let dt = dt?;
            let (prev_rx, prev_tx) = self.previous_net.get(name).copied().flatten()?;
            let (rx, tx) = counters;
            if rx < prev_rx || tx < prev_tx {
                debug!(iface = name, "network counter went backwards, treating as reset");
            }
            Some(NetRate {
                rx_bytes_per_sec: rx.saturating_sub(prev_rx) as f64 / dt,
                tx_bytes_per_sec: tx.saturating_sub(prev_tx) as f64 / dt,
            })
        };

        // Known interfaces keep their first-seen position; new ones follow in
        // snapshot order.
        let known = self
            .interface_order
            .iter()
            .filter(|name| current.contains_key(name.as_str()));
        let fresh = current
            .keys()
            .filter(|name| !self.previous_net.contains_key(name.as_str()));

        known
            .chain(fresh)
            .filter_map(|name| {
                let c = current.get(name.as_str())?;
                Some(InterfaceSample {
                    name: name.clone(),
                    rate: rate_for(name, (c.rx_bytes, c.tx_bytes)),
                    link_speed_bps: c.link_speed_bps,
                })
            })
            .collect()
    }

    fn update(&mut self, sample: CounterSample, now: Instant) {
        if sample.cpu.is_none() && self.previous_cpu.is_some() {
            debug!("cpu counters unavailable this cycle, next cycle starts cold");
        }
        self.previous_cpu = sample.cpu;

        match sample.net {
            Some(current) => {
                for counters in self.previous_net.values_mut() {
                    *counters = None;
                }
                for (name, c) in current {
                    if !self.previous_net.contains_key(&name) {
                        self.interface_order.push(name.clone());
                    }
                    self.previous_net.insert(name, Some((c.rx_bytes, c.tx_bytes)));
                }
                self.previous_sample_time = Some(now);
            }
            None => {
                for counters in self.previous_net.values_mut() {
                    *counters = None;
                }
                self.previous_sample_time = None;
            }
        }
    }
}

/// Busy share of the ticks elapsed between two readings, in percent.
pub fn busy_percent(prev: CpuTicks, current: CpuTicks) -> f64 {
    let (Some(busy), Some(idle)) = (
        current.busy.checked_sub(prev.busy),
        current.idle.checked_sub(prev.idle),
    ) else {
        return 0.0;
    };
    let total = busy.saturating_add(idle);
    if total == 0 {
        return 0.0;
    }
    (busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

fn cpu_usage(prev: &CpuSnapshot, current: &CpuSnapshot) -> CpuUsage {
    if prev.per_core.len() != current.per_core.len() {
        warn!(
            previous = prev.per_core.len(),
            current = current.per_core.len(),
            "core count changed between samples"
        );
    }

    let per_core_pct = current
        .per_core
        .iter()
        .enumerate()
        .map(|(idx, cur)| match prev.per_core.get(idx) {
            Some(p) => busy_percent(*p, *cur),
            None => 0.0,
        })
        .collect();

    CpuUsage {
        total_pct: busy_percent(prev.total, current.total),
        per_core_pct,
    }
}

fn memory_usage(m: &MemSnapshot) -> (Usage, Usage) {
    (
        Usage::from_available(m.total, m.available),
        Usage::from_available(m.swap_total, m.swap_free),
    )
}

fn disk_usage(disks: &DiskSnapshot) -> Vec<DiskUsage> {
    disks
        .iter()
        .map(|(mount, fs)| DiskUsage {
            mount: mount.clone(),
            device: fs.device.clone(),
            usage: Usage::from_available(fs.total, fs.free),
        })
        .collect()
}
