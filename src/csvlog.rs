//! CSV logging sink.
//!
//! The column set is decided once, from the enabled domains and the entities
//! present in the first frame where every enabled disk and network domain was
//! enumerated, and never changes afterwards. Frames before that are not
//! logged. Interfaces or mounts that show up later are not logged; ones that
//! vanish are written as zeros. Cold values are written as `0`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::config::Domains;
use crate::model::{MetricFrame, Usage};

/// Frozen column layout of a log file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvSchema {
    /// Per-core column count, `None` when CPU logging is off.
    pub cores: Option<usize>,
    pub memory: bool,
    pub mounts: Option<Vec<String>>,
    pub interfaces: Option<Vec<String>>,
}

impl CsvSchema {
    /// Derive the layout from the enabled domains and the entities in
    /// `frame`. Returns `None` while an enabled disk or network domain has
    /// not been enumerated, so a failed read cannot freeze it out.
    pub fn discover(domains: Domains, core_count: usize, frame: &MetricFrame) -> Option<Self> {
        let mounts = match (domains.disks, &frame.disks) {
            (false, _) => None,
            (true, Some(disks)) => Some(disks.iter().map(|d| d.mount.clone()).collect()),
            (true, None) => return None,
        };
        let interfaces = match (domains.net, &frame.net) {
            (false, _) => None,
            (true, Some(net)) => Some(net.iter().map(|i| i.name.clone()).collect()),
            (true, None) => return None,
        };
        Some(Self {
            cores: domains.cpu.then_some(core_count),
            memory: domains.mem,
            mounts,
            interfaces,
        })
    }

    pub fn header(&self) -> Vec<String> {
        let mut cols = vec!["Timestamp".to_string()];
        if let Some(cores) = self.cores {
            cols.push("CPU_Total_Percent".into());
            cols.extend((0..cores).map(|i| format!("CPU_Core_{}_Percent", i)));
        }
        if self.memory {
            cols.extend(
                [
                    "RAM_Used_Bytes",
                    "RAM_Total_Bytes",
                    "RAM_Percent",
                    "Swap_Used_Bytes",
                    "Swap_Total_Bytes",
                    "Swap_Percent",
                ]
                .map(String::from),
            );
        }
        for mount in self.mounts.iter().flatten() {
            cols.push(format!("Disk_{}_Used_Bytes", mount));
            cols.push(format!("Disk_{}_Total_Bytes", mount));
            cols.push(format!("Disk_{}_Percent", mount));
        }
        for iface in self.interfaces.iter().flatten() {
            cols.push(format!("Net_{}_RX_Bps", iface));
            cols.push(format!("Net_{}_TX_Bps", iface));
        }
        cols
    }

    /// Serialize `frame` in header order.
    pub fn row(&self, frame: &MetricFrame) -> Vec<String> {
        let mut fields = vec![frame.timestamp.log_stamp()];

        if let Some(cores) = self.cores {
            match &frame.cpu {
                Some(cpu) => {
                    fields.push(pct(cpu.total_pct));
                    fields.extend((0..cores).map(|i| {
                        cpu.per_core_pct.get(i).copied().map(pct).unwrap_or_else(zero)
                    }));
                }
                None => fields.extend(std::iter::repeat_with(zero).take(cores + 1)),
            }
        }

        if self.memory {
            push_usage(&mut fields, frame.mem.as_ref());
            push_usage(&mut fields, frame.swap.as_ref());
        }

        for mount in self.mounts.iter().flatten() {
            push_usage(&mut fields, frame.disk(mount).map(|d| &d.usage));
        }

        for iface in self.interfaces.iter().flatten() {
            match frame.interface(iface).and_then(|i| i.rate) {
                Some(rate) => {
                    fields.push(pct(rate.rx_bytes_per_sec));
                    fields.push(pct(rate.tx_bytes_per_sec));
                }
                None => {
                    fields.push(zero());
                    fields.push(zero());
                }
            }
        }

        fields
    }
}

fn zero() -> String {
    "0".to_string()
}

/// Two decimals, used for percentages and byte rates alike.
fn pct(v: f64) -> String {
    format!("{:.2}", v)
}

fn push_usage(fields: &mut Vec<String>, usage: Option<&Usage>) {
    match usage {
        Some(u) => {
            fields.push(u.used.to_string());
            fields.push(u.total.to_string());
            fields.push(pct(u.pct));
        }
        None => fields.extend(std::iter::repeat_with(zero).take(3)),
    }
}

/// Quote a field if it contains a separator, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_record(out: &mut impl Write, fields: &[String]) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{}", line)?;
    out.flush()
}

/// Writes one CSV row per frame, preceded by a header derived from the first
/// fully enumerated frame.
pub struct CsvLogger<W: Write> {
    out: W,
    domains: Domains,
    core_count: usize,
    schema: Option<CsvSchema>,
    rows: u64,
}

impl CsvLogger<BufWriter<File>> {
    /// Create (truncate) `path` for logging.
    pub fn create(path: &Path, domains: Domains, core_count: usize) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), domains, core_count))
    }
}

impl<W: Write> CsvLogger<W> {
    pub fn new(out: W, domains: Domains, core_count: usize) -> Self {
        Self {
            out,
            domains,
            core_count,
            schema: None,
            rows: 0,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Append `frame`, writing the header first once the column set is
    /// known. Frames seen before that are skipped. Every write is flushed.
    pub fn log(&mut self, frame: &MetricFrame) -> io::Result<()> {
        if self.schema.is_none() {
            let Some(schema) = CsvSchema::discover(self.domains, self.core_count, frame) else {
                debug!("entity domains not enumerated yet, CSV header deferred");
                return Ok(());
            };
            write_record(&mut self.out, &schema.header())?;
            self.schema = Some(schema);
        }
        if let Some(schema) = &self.schema {
            write_record(&mut self.out, &schema.row(frame))?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
