use crossterm::style::Color;

use crate::config::CoreLayout;
use crate::layout::SectionId;
use crate::model::{CpuUsage, DiskUsage, InterfaceSample, MetricFrame, Usage};
use super::shared::{format_bytes, format_bytes_rate, truncate_str, Palette};

pub const TITLE_WIDTH: usize = 60;
pub const BAR_WIDTH: usize = 30;
pub const CORE_BAR_WIDTH: usize = 10;
pub const CORES_PER_ROW: usize = 3;
/// Assumed capacity when an interface does not report its link speed.
pub const FALLBACK_LINK_CAPACITY: f64 = 100.0 * 1024.0 * 1024.0;

const WAITING: &str = "waiting for first sample...";

pub fn title(lines: &mut Vec<String>, palette: Palette, frame: &MetricFrame) {
    let rule = "=".repeat(TITLE_WIDTH);
    let heading = format!(
        "System Monitor (v{}) {}",
        env!("CARGO_PKG_VERSION"),
        frame.timestamp.clock()
    );
    lines.push(palette.paint(&rule, Color::Blue));
    lines.push(palette.bold(&format!("{:^width$}", heading, width = TITLE_WIDTH), Color::White));
    lines.push(palette.paint(&rule, Color::Blue));
}

pub fn cpu(lines: &mut Vec<String>, palette: Palette, usage: Option<&CpuUsage>, layout: CoreLayout) {
    let Some(usage) = usage else {
        lines.push(format!("{}: {}", SectionId::Cpu, WAITING));
        return;
    };

    match layout {
        CoreLayout::Grid => {
            lines.push(format!(
                "{} {}",
                palette.bold(&format!("CPU ({} cores):", usage.per_core_pct.len()), Color::White),
                palette.bar(usage.total_pct, BAR_WIDTH)
            ));
            for (row, chunk) in usage.per_core_pct.chunks(CORES_PER_ROW).enumerate() {
                let cells: Vec<String> = chunk
                    .iter()
                    .enumerate()
                    .map(|(i, pct)| {
                        format!(
                            "#{:02}:{}",
                            row * CORES_PER_ROW + i,
                            palette.bar(*pct, CORE_BAR_WIDTH)
                        )
                    })
                    .collect();
                lines.push(format!("  {}", cells.join("  ")));
            }
        }
        CoreLayout::List => {
            for (i, pct) in usage.per_core_pct.iter().enumerate() {
                lines.push(format!(
                    "{} {}",
                    palette.bold(&format!("CPU {:02}:", i), Color::White),
                    palette.bar(*pct, BAR_WIDTH)
                ));
            }
        }
    }
}

fn usage_line(palette: Palette, label: &str, usage: &Usage) -> String {
    format!(
        "{} {} {}/{}",
        palette.bold(&format!("{:<6}", label), Color::White),
        palette.bar(usage.pct, BAR_WIDTH),
        format_bytes(usage.used as f64),
        format_bytes(usage.total as f64)
    )
}

pub fn memory(lines: &mut Vec<String>, palette: Palette, mem: Option<&Usage>, swap: Option<&Usage>) {
    let (Some(mem), Some(swap)) = (mem, swap) else {
        lines.push(format!("{}: unavailable", SectionId::Memory));
        return;
    };
    lines.push(usage_line(palette, "RAM:", mem));
    lines.push(usage_line(palette, "SWAP:", swap));
}

pub fn disks(lines: &mut Vec<String>, palette: Palette, disks: Option<&[DiskUsage]>) {
    let Some(disks) = disks else {
        lines.push(format!("{}: unavailable", SectionId::Disks));
        return;
    };
    if disks.is_empty() {
        lines.push(format!("{}: no filesystems found", SectionId::Disks));
        return;
    }
    for disk in disks {
        let label = format!(
            "{} ({}):",
            palette.paint(&truncate_str(&disk.device, 24), Color::Cyan),
            truncate_str(&disk.mount, 24)
        );
        lines.push(format!(
            "{} {} {}/{}",
            label,
            palette.bar(disk.usage.pct, BAR_WIDTH),
            format_bytes(disk.usage.used as f64),
            format_bytes(disk.usage.total as f64)
        ));
    }
}

/// Link capacity in bytes per second.
pub fn link_capacity(link_speed_bps: Option<u64>) -> f64 {
    match link_speed_bps {
        Some(bps) if bps > 0 => bps as f64 / 8.0,
        _ => FALLBACK_LINK_CAPACITY,
    }
}

pub fn utilization_percent(bytes_per_sec: f64, link_speed_bps: Option<u64>) -> f64 {
    bytes_per_sec / link_capacity(link_speed_bps) * 100.0
}

fn interface(lines: &mut Vec<String>, palette: Palette, sample: &InterfaceSample) {
    let speed = match sample.link_speed_bps {
        Some(bps) if bps > 0 => format!("{} Mbps", bps / 1_000_000),
        _ => "unknown speed".to_string(),
    };
    lines.push(format!(
        "{} ({})",
        palette.bold(&format!("NET {}", sample.name), Color::Magenta),
        speed
    ));

    let Some(rate) = sample.rate else {
        lines.push(format!("  {}", WAITING));
        return;
    };
    for (label, value) in [("DN:", rate.rx_bytes_per_sec), ("UP:", rate.tx_bytes_per_sec)] {
        lines.push(format!(
            "  {} {} {}",
            label,
            palette.bar(utilization_percent(value, sample.link_speed_bps), BAR_WIDTH),
            format_bytes_rate(value)
        ));
    }
}

pub fn network(
    lines: &mut Vec<String>,
    palette: Palette,
    net: Option<&[InterfaceSample]>,
    filter: Option<&str>,
) {
    let Some(net) = net else {
        lines.push(format!("{}: unavailable", SectionId::Network));
        return;
    };

    if let Some(name) = filter {
        match net.iter().find(|s| s.name == name) {
            Some(sample) => interface(lines, palette, sample),
            None => lines.push(palette.paint(&format!("Interface '{}' not found.", name), Color::Red)),
        }
        return;
    }

    if net.is_empty() {
        lines.push(format!("{}: no interfaces", SectionId::Network));
    }
    for sample in net {
        interface(lines, palette, sample);
    }
}

pub fn footer(lines: &mut Vec<String>, palette: Palette, log_path: Option<&str>) {
    let mut text = "Press Ctrl+C to quit.".to_string();
    if let Some(path) = log_path {
        text.push_str(&format!(" Logging to: {}", path));
    }
    lines.push(palette.paint(&text, Color::DarkGrey));
}
