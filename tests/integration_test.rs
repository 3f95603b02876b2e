//! End-to-end cycles: scripted counters through the monitor, the delta
//! engine and both sinks.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, TimeZone};

use umon::app::{run_with_source, CycleDriver, RunError};
use umon::collectors::ScriptedSource;
use umon::config::{Config, Domains};
use umon::controller::Monitor;
use umon::csvlog::CsvLogger;
use umon::model::{
    CounterSample, CpuSnapshot, CpuTicks, DiskSnapshot, FilesystemCounters, MemSnapshot,
    NetCounters, NetSnapshot, SampleTime,
};
use umon::view::Presenter;

fn cpu(total: (u64, u64), cores: &[(u64, u64)]) -> CpuSnapshot {
    CpuSnapshot {
        total: CpuTicks::new(total.0, total.1),
        per_core: cores.iter().map(|&(b, i)| CpuTicks::new(b, i)).collect(),
    }
}

fn net(entries: &[(&str, u64, u64)]) -> NetSnapshot {
    entries
        .iter()
        .map(|&(name, rx, tx)| {
            (
                name.to_string(),
                NetCounters {
                    rx_bytes: rx,
                    tx_bytes: tx,
                    link_speed_bps: Some(1_000_000_000),
                },
            )
        })
        .collect()
}

fn root_disk() -> DiskSnapshot {
    let mut disks = DiskSnapshot::new();
    disks.insert(
        "/".to_string(),
        FilesystemCounters {
            device: "/dev/sda1".into(),
            total: 1000,
            free: 250,
        },
    );
    disks
}

fn half_used_memory() -> MemSnapshot {
    MemSnapshot {
        total: 1000,
        available: 500,
        swap_total: 0,
        swap_free: 0,
    }
}

/// Two cycles: cold, then warm with CPU 25% and eth0 moving 1000/500 bytes.
/// `wlan0` first shows up in the second cycle.
fn two_cycles() -> ScriptedSource {
    ScriptedSource::with_cycles(
        2,
        [
            CounterSample {
                cpu: Some(cpu((100, 100), &[(50, 50), (50, 50)])),
                net: Some(net(&[("eth0", 0, 0)])),
                mem: Some(half_used_memory()),
                disks: Some(root_disk()),
            },
            CounterSample {
                cpu: Some(cpu((125, 175), &[(60, 90), (65, 85)])),
                net: Some(net(&[("eth0", 1000, 500), ("wlan0", 7, 7)])),
                mem: Some(half_used_memory()),
                disks: Some(root_disk()),
            },
        ],
    )
}

fn mono_config() -> Config {
    Config {
        monochrome: true,
        ..Config::default()
    }
}

fn times() -> (SampleTime, SampleTime) {
    let wall = Local.with_ymd_and_hms(2026, 1, 21, 10, 30, 0).unwrap();
    let instant = Instant::now();
    (
        SampleTime::at(wall, instant),
        SampleTime::at(
            wall + chrono::Duration::milliseconds(250),
            instant + Duration::from_millis(250),
        ),
    )
}

#[test]
fn each_domain_is_read_once_per_cycle() {
    let source = ScriptedSource::new(2);
    let counter = source.read_counter();
    let config = mono_config();
    let mut monitor = Monitor::new(Box::new(source), &config);

    for _ in 0..3 {
        monitor.sample();
    }

    let reads = counter.get();
    assert_eq!((reads.cpu, reads.net, reads.mem, reads.disks), (3, 3, 3, 3));
}

#[test]
fn disabled_domains_cost_no_reads() {
    let source = ScriptedSource::new(2);
    let counter = source.read_counter();
    let config = Config {
        domains: Domains {
            net: true,
            ..Domains::none()
        },
        ..mono_config()
    };
    let mut monitor = Monitor::new(Box::new(source), &config);
    monitor.sample();
    monitor.sample();

    let reads = counter.get();
    assert_eq!(reads.net, 2);
    assert_eq!(reads.cpu + reads.mem + reads.disks, 0);
}

#[test]
fn warm_cycle_values_reach_both_sinks() {
    let config = mono_config();
    let logger = CsvLogger::new(Vec::new(), config.domains, 2);
    let mut driver = CycleDriver::new(
        Monitor::new(Box::new(two_cycles()), &config),
        Presenter::new(&config),
        Some(logger),
    );
    let (t0, t1) = times();

    let mut cold_screen = Vec::new();
    let cold = driver.step_at(&mut cold_screen, t0).unwrap();
    assert!(cold.cpu.is_none());
    assert!(cold.interface("eth0").unwrap().rate.is_none());
    assert_eq!(cold.mem.map(|m| m.pct), Some(50.0));

    let mut warm_screen = Vec::new();
    let warm = driver.step_at(&mut warm_screen, t1).unwrap();
    let warm_cpu = warm.cpu.as_ref().unwrap();
    assert_eq!(warm_cpu.total_pct, 25.0);
    assert_eq!(warm_cpu.per_core_pct, vec![20.0, 30.0]);
    let eth0 = warm.interface("eth0").unwrap().rate.unwrap();
    assert_eq!(eth0.rx_bytes_per_sec, 4000.0);
    assert_eq!(eth0.tx_bytes_per_sec, 2000.0);
    assert!(warm.interface("wlan0").unwrap().rate.is_none());
    assert_eq!(warm.disk("/").map(|d| d.usage.pct), Some(75.0));

    let cold_text = String::from_utf8(cold_screen).unwrap();
    assert!(cold_text.contains("CPU: waiting for first sample..."));

    let warm_text = String::from_utf8(warm_screen).unwrap();
    assert!(warm_text.contains("] 25.0%"));
    assert!(warm_text.contains("#00:[##--------] 20.0%"));
    assert!(warm_text.contains("#01:[###-------] 30.0%"));
    assert!(warm_text.contains("50.0% 500.0B/1000.0B"));
    assert!(warm_text.contains("/dev/sda1 (/):"));
    assert!(warm_text.contains("NET eth0 (1000 Mbps)"));
    assert!(warm_text.contains("3.9KB/s"));
    assert!(warm_text.contains("NET wlan0 (1000 Mbps)\r\n  waiting for first sample..."));

    let csv = String::from_utf8(driver.finish().unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Timestamp,CPU_Total_Percent,CPU_Core_0_Percent,CPU_Core_1_Percent,\
             RAM_Used_Bytes,RAM_Total_Bytes,RAM_Percent,\
             Swap_Used_Bytes,Swap_Total_Bytes,Swap_Percent,\
             Disk_/_Used_Bytes,Disk_/_Total_Bytes,Disk_/_Percent,\
             Net_eth0_RX_Bps,Net_eth0_TX_Bps",
            "2026-01-21 10:30:00,0,0,0,500,1000,50.00,0,0,0.00,750,1000,75.00,0,0",
            "2026-01-21 10:30:00,25.00,20.00,30.00,500,1000,50.00,0,0,0.00,750,1000,75.00,4000.00,2000.00",
        ]
    );
}

#[test]
fn source_outage_recovers_through_a_cold_cycle() {
    let config = Config {
        domains: Domains {
            cpu: true,
            ..Domains::none()
        },
        ..mono_config()
    };
    let sample = |busy, idle| CounterSample {
        cpu: Some(cpu((busy, idle), &[(busy, idle)])),
        ..Default::default()
    };
    let source = ScriptedSource::with_cycles(
        1,
        [sample(0, 0), sample(50, 50), CounterSample::default(), sample(60, 60), sample(90, 70)],
    );
    let mut monitor = Monitor::new(Box::new(source), &config);

    let totals: Vec<Option<f64>> = (0..5)
        .map(|_| monitor.sample().cpu.map(|c| c.total_pct))
        .collect();
    assert_eq!(totals, vec![None, Some(50.0), None, None, Some(75.0)]);
}

#[test]
fn unwritable_log_path_fails_before_monitoring() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        log_path: Some(dir.path().join("missing").join("out.csv")),
        ..mono_config()
    };
    let quit = Arc::new(AtomicBool::new(true));

    let err = run_with_source(Box::new(ScriptedSource::new(1)), &config, quit).unwrap_err();
    assert!(matches!(err, RunError::LogFile { .. }));
    assert!(err.to_string().contains("out.csv"));
}

#[test]
fn quit_before_first_cycle_creates_empty_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system.csv");
    let config = Config {
        log_path: Some(path.clone()),
        ..mono_config()
    };
    let quit = Arc::new(AtomicBool::new(true));

    let summary = run_with_source(Box::new(ScriptedSource::new(1)), &config, quit).unwrap();
    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.log_path.as_deref(), Some(path.as_path()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}
