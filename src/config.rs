//! Command-line options and the validated runtime configuration built from
//! them.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Default refresh interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 250;
/// Lowest refresh interval we accept; smaller values are raised to this.
pub const MIN_INTERVAL_MS: u64 = 50;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "umon",
    version,
    about = "Live CPU, memory, disk and network monitor with optional CSV logging",
    after_help = "\
Examples:
  umon                       Show CPU, memory, disks and network
  umon --cpu --interval 500  CPU only, refreshed every 500 ms
  umon --net eth0            Network rates for eth0 only
  umon --cpu --mem --log system.csv
                             Log CPU and memory to system.csv while displaying"
)]
pub struct Cli {
    /// Show CPU usage.
    #[arg(long)]
    pub cpu: bool,

    /// Show memory (RAM and swap) usage.
    #[arg(long)]
    pub mem: bool,

    /// Show disk usage for mounted filesystems.
    #[arg(long)]
    pub disks: bool,

    /// Show network rates, optionally for a single INTERFACE only.
    #[arg(long, value_name = "INTERFACE", num_args = 0..=1)]
    pub net: Option<Option<String>>,

    /// Show CPU cores as a list, one bar per line (implies --cpu).
    #[arg(long)]
    pub cpulist: bool,

    /// Monochrome mode: no colors, no alternate screen.
    #[arg(long)]
    pub mono: bool,

    /// Refresh interval in milliseconds (minimum 50).
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval: u64,

    /// Append samples to a CSV file using the same interval.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Write diagnostic traces to FILE (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub trace_file: Option<PathBuf>,
}

/// Which metric domains are sampled, displayed and logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Domains {
    pub cpu: bool,
    pub mem: bool,
    pub disks: bool,
    pub net: bool,
}

impl Domains {
    pub fn all() -> Self {
        Self {
            cpu: true,
            mem: true,
            disks: true,
            net: true,
        }
    }

    pub fn none() -> Self {
        Self {
            cpu: false,
            mem: false,
            disks: false,
            net: false,
        }
    }
}

impl Default for Domains {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoreLayout {
    /// Aggregate bar followed by cores three to a row.
    #[default]
    Grid,
    /// One line per core, no aggregate bar.
    List,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub domains: Domains,
    /// Restrict network sampling to this interface.
    pub interface: Option<String>,
    pub interval: Duration,
    pub core_layout: CoreLayout,
    pub monochrome: bool,
    pub log_path: Option<PathBuf>,
    pub trace_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domains: Domains::all(),
            interface: None,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            core_layout: CoreLayout::Grid,
            monochrome: false,
            log_path: None,
            trace_file: None,
        }
    }
}

impl Config {
    /// Resolve CLI flags into a configuration. Adjustments the user should
    /// know about (such as a raised interval) are returned as warnings.
    pub fn from_cli(cli: Cli) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();

        let any_specific = cli.cpu || cli.mem || cli.disks || cli.net.is_some() || cli.cpulist;
        let domains = if any_specific {
            Domains {
                cpu: cli.cpu || cli.cpulist,
                mem: cli.mem,
                disks: cli.disks,
                net: cli.net.is_some(),
            }
        } else {
            Domains::all()
        };

        let interval_ms = if cli.interval < MIN_INTERVAL_MS {
            warnings.push(format!(
                "interval should be at least {MIN_INTERVAL_MS}ms. Setting to {MIN_INTERVAL_MS}ms."
            ));
            MIN_INTERVAL_MS
        } else {
            cli.interval
        };

        let config = Self {
            domains,
            interface: cli.net.flatten(),
            interval: Duration::from_millis(interval_ms),
            core_layout: if cli.cpulist {
                CoreLayout::List
            } else {
                CoreLayout::Grid
            },
            monochrome: cli.mono,
            log_path: cli.log,
            trace_file: cli.trace_file,
        };
        (config, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (Config, Vec<String>) {
        let cli = Cli::try_parse_from(std::iter::once("umon").chain(args.iter().copied()))
            .expect("arguments should parse");
        Config::from_cli(cli)
    }

    #[test]
    fn no_flags_enables_everything() {
        let (config, warnings) = parse(&[]);
        assert_eq!(config.domains, Domains::all());
        assert_eq!(config.interval, Duration::from_millis(250));
        assert_eq!(config.core_layout, CoreLayout::Grid);
        assert!(warnings.is_empty());
    }

    #[test]
    fn specific_flags_select_only_those_domains() {
        let (config, _) = parse(&["--cpu", "--mem"]);
        assert_eq!(
            config.domains,
            Domains {
                cpu: true,
                mem: true,
                disks: false,
                net: false,
            }
        );
    }

    #[test]
    fn net_with_and_without_interface() {
        let (all, _) = parse(&["--net"]);
        assert!(all.domains.net);
        assert!(!all.domains.cpu);
        assert_eq!(all.interface, None);

        let (one, _) = parse(&["--net", "eth0"]);
        assert!(one.domains.net);
        assert_eq!(one.interface.as_deref(), Some("eth0"));
    }

    #[test]
    fn cpulist_implies_cpu_in_list_layout() {
        let (config, _) = parse(&["--cpulist"]);
        assert!(config.domains.cpu);
        assert!(!config.domains.mem);
        assert_eq!(config.core_layout, CoreLayout::List);
    }

    #[test]
    fn interval_below_floor_is_raised_with_warning() {
        let (config, warnings) = parse(&["--interval", "10"]);
        assert_eq!(config.interval, Duration::from_millis(MIN_INTERVAL_MS));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn non_numeric_interval_is_rejected() {
        assert!(Cli::try_parse_from(["umon", "--interval", "fast"]).is_err());
    }

    #[test]
    fn log_and_mono_flags() {
        let (config, _) = parse(&["--mono", "--log", "out.csv"]);
        assert!(config.monochrome);
        assert_eq!(config.log_path, Some(PathBuf::from("out.csv")));
    }
}
