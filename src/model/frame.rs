use super::snapshot::SampleTime;

// --- Computed values ---

#[derive(Clone, Debug, PartialEq)]
pub struct CpuUsage {
    pub total_pct: f64,
    pub per_core_pct: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetRate {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceSample {
    pub name: String,
    /// `None` on the interface's first observation.
    pub rate: Option<NetRate>,
    pub link_speed_bps: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Usage {
    pub used: u64,
    pub total: u64,
    pub pct: f64,
}

impl Usage {
    pub fn from_used(used: u64, total: u64) -> Self {
        let used = used.min(total);
        let pct = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        };
        Self { used, total, pct }
    }

    pub fn from_available(total: u64, available: u64) -> Self {
        Self::from_used(total.saturating_sub(available), total)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiskUsage {
    pub mount: String,
    pub device: String,
    pub usage: Usage,
}

// --- Per-cycle output ---

/// The immutable result of one sampling cycle. Every sink receives the same
/// frame by reference; nothing downstream re-reads counters.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricFrame {
    pub timestamp: SampleTime,
    pub cpu: Option<CpuUsage>,
    /// Interfaces present this cycle, in first-seen order.
    pub net: Option<Vec<InterfaceSample>>,
    pub mem: Option<Usage>,
    pub swap: Option<Usage>,
    pub disks: Option<Vec<DiskUsage>>,
}

impl MetricFrame {
    pub fn interface(&self, name: &str) -> Option<&InterfaceSample> {
        self.net.as_ref()?.iter().find(|i| i.name == name)
    }

    pub fn disk(&self, mount: &str) -> Option<&DiskUsage> {
        self.disks.as_ref()?.iter().find(|d| d.mount == mount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_guards_zero_total() {
        let u = Usage::from_available(0, 0);
        assert_eq!(u.pct, 0.0);
        assert_eq!(u.used, 0);
    }

    #[test]
    fn usage_saturates_when_available_exceeds_total() {
        let u = Usage::from_available(1_000, 4_000);
        assert_eq!(u.used, 0);
        assert_eq!(u.pct, 0.0);
    }

    #[test]
    fn usage_half_used() {
        let u = Usage::from_available(16_000_000_000, 8_000_000_000);
        assert_eq!(u.used, 8_000_000_000);
        assert_eq!(u.pct, 50.0);
    }
}
