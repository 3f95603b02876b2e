use super::{collect_filesystems, CounterSource, FileSystem, SourceError};
use crate::model::{CpuSnapshot, CpuTicks, DiskSnapshot, MemSnapshot, NetCounters, NetSnapshot};
use std::path::PathBuf;
use sysinfo::Disks;
use tracing::debug;

/// Counter source backed by `/proc` and `/sys`.
pub struct ProcfsCollector<F: FileSystem> {
    fs: F,
    proc_root: PathBuf,
    sys_root: PathBuf,
    /// Pinned from the first `/proc/stat` read; later reads are padded or
    /// truncated to this length.
    core_count: usize,
    disks: Disks,
}

impl<F: FileSystem> ProcfsCollector<F> {
    pub fn new(fs: F) -> Self {
        Self::with_roots(fs, "/proc", "/sys")
    }

    /// Use alternative proc/sys roots (tests, containers with a bind-mounted
    /// host `/proc`).
    pub fn with_roots(fs: F, proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        let proc_root = proc_root.into();
        let core_count = fs
            .read_to_string(&proc_root.join("stat"))
            .ok()
            .and_then(|content| parse_stat(&content).ok())
            .map(|(_, cores)| cores.len())
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            });
        debug!(core_count, "procfs collector initialised");

        Self {
            fs,
            proc_root,
            sys_root: sys_root.into(),
            core_count,
            disks: Disks::new_with_refreshed_list(),
        }
    }

    /// Link speed from `/sys/class/net/<iface>/speed`, converted from Mbps to
    /// bits per second. Virtual interfaces report -1 or fail to read.
    fn link_speed(&self, iface: &str) -> Option<u64> {
        let path = self.sys_root.join("class/net").join(iface).join("speed");
        let content = self.fs.read_to_string(&path).ok()?;
        parse_link_speed(&content)
    }
}

// ── parsers ─────────────────────────────────────────────────────────────

/// Fold one `cpu*` line of `/proc/stat` into busy/idle ticks.
///
/// Columns after the label: user nice system idle iowait irq softirq steal.
/// Idle time is `idle + iowait`; everything else counts as busy. Guest time is
/// already included in user/nice and is not added again.
fn parse_cpu_line(fields: &[&str]) -> CpuTicks {
    let get = |idx: usize| -> u64 { fields.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };
    let (user, nice, system, idle, iowait, irq, softirq, steal) =
        (get(0), get(1), get(2), get(3), get(4), get(5), get(6), get(7));
    CpuTicks {
        busy: [user, nice, system, irq, softirq, steal]
            .into_iter()
            .fold(0, u64::saturating_add),
        idle: idle.saturating_add(iowait),
    }
}

/// Upper bound on a `cpuN` index accepted from `/proc/stat`.
const MAX_CORE_INDEX: usize = 8191;

/// Parse `/proc/stat` into the aggregate line and the per-core lines, placed
/// by their `cpuN` index. Offline cores have no line and read as zero ticks.
pub fn parse_stat(content: &str) -> Result<(CpuTicks, Vec<CpuTicks>), SourceError> {
    let mut total = None;
    let mut cores = Vec::new();

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else { continue };
        let Some(suffix) = label.strip_prefix("cpu") else {
            continue;
        };
        let fields: Vec<&str> = parts.collect();
        if suffix.is_empty() {
            total = Some(parse_cpu_line(&fields));
        } else if let Some(idx) = suffix.parse::<usize>().ok().filter(|i| *i <= MAX_CORE_INDEX) {
            if idx >= cores.len() {
                cores.resize(idx + 1, CpuTicks::default());
            }
            cores[idx] = parse_cpu_line(&fields);
        }
    }

    total
        .map(|t| (t, cores))
        .ok_or_else(|| SourceError::Parse("no aggregate cpu line in /proc/stat".into()))
}

/// Parse `/proc/net/dev` into interface → (rx_bytes, tx_bytes).
pub fn parse_net_dev(content: &str) -> Vec<(String, u64, u64)> {
    let mut result = Vec::new();
    // First two lines are headers.
    for line in content.lines().skip(2) {
        let Some((iface, rest)) = line.trim().split_once(':') else {
            continue;
        };
        let cols: Vec<&str> = rest.split_whitespace().collect();
        // rx_bytes is col 0, tx_bytes is col 8.
        if cols.len() >= 9 {
            let rx = cols[0].parse::<u64>().unwrap_or(0);
            let tx = cols[8].parse::<u64>().unwrap_or(0);
            result.push((iface.trim().to_string(), rx, tx));
        }
    }
    result
}

/// Parse `/proc/meminfo` (values in kB) into bytes.
pub fn parse_meminfo(content: &str) -> Result<MemSnapshot, SourceError> {
    let mut total = None;
    let mut free = 0u64;
    let mut available = None;
    let mut swap_total = 0u64;
    let mut swap_free = 0u64;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let kb: u64 = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        match key.trim() {
            "MemTotal" => total = Some(kb),
            "MemFree" => free = kb,
            "MemAvailable" => available = Some(kb),
            "SwapTotal" => swap_total = kb,
            "SwapFree" => swap_free = kb,
            _ => {}
        }
    }

    let total = total.ok_or_else(|| SourceError::Parse("MemTotal missing".into()))?;
    // Kernels before 3.14 have no MemAvailable.
    let available = available.filter(|a| *a > 0).unwrap_or(free);

    Ok(MemSnapshot {
        total: total.saturating_mul(1024),
        available: available.saturating_mul(1024),
        swap_total: swap_total.saturating_mul(1024),
        swap_free: swap_free.saturating_mul(1024),
    })
}

pub fn parse_link_speed(content: &str) -> Option<u64> {
    let mbps: i64 = content.trim().parse().ok()?;
    (mbps > 0).then(|| (mbps as u64).saturating_mul(1_000_000))
}

// ── trait implementation ────────────────────────────────────────────────

impl<F: FileSystem> CounterSource for ProcfsCollector<F> {
    fn core_count(&self) -> usize {
        self.core_count
    }

    fn read_cpu_counters(&mut self) -> Result<CpuSnapshot, SourceError> {
        let content = self.fs.read_to_string(&self.proc_root.join("stat"))?;
        let (total, mut per_core) = parse_stat(&content)?;
        per_core.resize(self.core_count, CpuTicks::default());
        Ok(CpuSnapshot { total, per_core })
    }

    fn read_net_counters(&mut self) -> Result<NetSnapshot, SourceError> {
        let content = self.fs.read_to_string(&self.proc_root.join("net/dev"))?;
        Ok(parse_net_dev(&content)
            .into_iter()
            .map(|(name, rx, tx)| {
                let counters = NetCounters {
                    rx_bytes: rx,
                    tx_bytes: tx,
                    link_speed_bps: self.link_speed(&name),
                };
                (name, counters)
            })
            .collect())
    }

    fn read_memory(&mut self) -> Result<MemSnapshot, SourceError> {
        let content = self.fs.read_to_string(&self.proc_root.join("meminfo"))?;
        parse_meminfo(&content)
    }

    fn read_filesystems(&mut self) -> Result<DiskSnapshot, SourceError> {
        Ok(collect_filesystems(&mut self.disks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::MockFs;

    const STAT: &str = "\
cpu  100 0 50 800 50 0 0 0 0 0
cpu0 60 0 20 400 20 0 0 0 0 0
cpu1 40 0 30 400 30 0 0 0 0 0
intr 12345
ctxt 999
btime 1700000000
";

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1000      10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0
  eth0: 123456    100    0    0    0     0          0         0    654321     90    0    0    0     0       0          0
";

    const MEMINFO: &str = "\
MemTotal:       16000000 kB
MemFree:         2000000 kB
MemAvailable:    8000000 kB
Buffers:          100000 kB
SwapTotal:       4000000 kB
SwapFree:        3000000 kB
";

    fn mock() -> MockFs {
        let mut fs = MockFs::new();
        fs.add_file("/proc/stat", STAT);
        fs.add_file("/proc/net/dev", NET_DEV);
        fs.add_file("/proc/meminfo", MEMINFO);
        fs.add_file("/sys/class/net/eth0/speed", "1000\n");
        fs.add_file("/sys/class/net/lo/speed", "-1\n");
        fs
    }

    #[test]
    fn parse_stat_splits_busy_and_idle() {
        let (total, cores) = parse_stat(STAT).unwrap();
        assert_eq!(total, CpuTicks::new(150, 850));
        assert_eq!(cores, vec![CpuTicks::new(80, 420), CpuTicks::new(70, 430)]);
    }

    #[test]
    fn parse_stat_places_cores_by_index() {
        let stat = "\
cpu  30 0 0 30 0 0 0 0
cpu0 10 0 0 10 0 0 0 0
cpu2 20 0 0 20 0 0 0 0
";
        let (_, cores) = parse_stat(stat).unwrap();
        assert_eq!(
            cores,
            vec![CpuTicks::new(10, 10), CpuTicks::default(), CpuTicks::new(20, 20)]
        );
    }

    #[test]
    fn offline_core_keeps_later_cores_in_place() {
        let mut collector = ProcfsCollector::new(mock());
        assert_eq!(collector.core_count(), 2);

        collector.fs.add_file("/proc/stat", "cpu 40 0 30 430 30 0 0 0\ncpu1 40 0 30 400 30 0 0 0\n");
        let cpu = collector.read_cpu_counters().unwrap();
        assert_eq!(cpu.per_core, vec![CpuTicks::default(), CpuTicks::new(70, 430)]);
    }

    #[test]
    fn huge_counters_saturate_instead_of_overflowing() {
        let max = u64::MAX;
        let stat = format!("cpu {max} {max} 0 {max} {max} 0 0 0\n");
        let (total, _) = parse_stat(&stat).unwrap();
        assert_eq!(total, CpuTicks::new(u64::MAX, u64::MAX));

        let mem = parse_meminfo(&format!("MemTotal: {max} kB\nMemAvailable: {max} kB\n")).unwrap();
        assert_eq!(mem.total, u64::MAX);
        assert_eq!(parse_link_speed(&i64::MAX.to_string()), Some(u64::MAX));
    }

    #[test]
    fn parse_stat_without_aggregate_is_error() {
        assert!(matches!(parse_stat("intr 1\n"), Err(SourceError::Parse(_))));
    }

    #[test]
    fn parse_net_dev_reads_rx_and_tx_columns() {
        let ifaces = parse_net_dev(NET_DEV);
        assert_eq!(
            ifaces,
            vec![
                ("lo".to_string(), 1000, 1000),
                ("eth0".to_string(), 123456, 654321),
            ]
        );
    }

    #[test]
    fn parse_meminfo_converts_kb() {
        let m = parse_meminfo(MEMINFO).unwrap();
        assert_eq!(m.total, 16_000_000 * 1024);
        assert_eq!(m.available, 8_000_000 * 1024);
        assert_eq!(m.swap_total, 4_000_000 * 1024);
        assert_eq!(m.swap_free, 3_000_000 * 1024);
    }

    #[test]
    fn parse_meminfo_falls_back_to_memfree() {
        let m = parse_meminfo("MemTotal: 1000 kB\nMemFree: 250 kB\n").unwrap();
        assert_eq!(m.available, 250 * 1024);
    }

    #[test]
    fn parse_link_speed_rejects_unknown() {
        assert_eq!(parse_link_speed("1000\n"), Some(1_000_000_000));
        assert_eq!(parse_link_speed("-1\n"), None);
        assert_eq!(parse_link_speed("garbage"), None);
    }

    #[test]
    fn collector_reads_mock_proc() {
        let mut collector = ProcfsCollector::new(mock());
        assert_eq!(collector.core_count(), 2);

        let cpu = collector.read_cpu_counters().unwrap();
        assert_eq!(cpu.per_core.len(), 2);

        let net = collector.read_net_counters().unwrap();
        assert_eq!(net["eth0"].link_speed_bps, Some(1_000_000_000));
        assert_eq!(net["lo"].link_speed_bps, None);
        assert_eq!(net["eth0"].rx_bytes, 123456);

        let mem = collector.read_memory().unwrap();
        assert_eq!(mem.total, 16_000_000 * 1024);
    }

    #[test]
    fn core_count_stays_pinned() {
        let mut fs = mock();
        let collector_fs = fs.clone();
        let mut collector = ProcfsCollector::new(collector_fs);

        fs.add_file("/proc/stat", "cpu 1 0 0 1 0 0 0 0\ncpu0 1 0 0 1 0 0 0 0\n");
        let mut shrunk = ProcfsCollector::new(&fs);
        assert_eq!(shrunk.core_count(), 1);
        assert_eq!(shrunk.read_cpu_counters().unwrap().per_core.len(), 1);

        // A collector built against the two-core stat keeps two entries.
        assert_eq!(collector.read_cpu_counters().unwrap().per_core.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut fs = mock();
        fs.remove_file("/proc/meminfo");
        let mut collector = ProcfsCollector::new(fs);
        assert!(matches!(collector.read_memory(), Err(SourceError::Io(_))));
    }
}
