use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

/// Write a line with `\r\n` so output stays aligned in any terminal mode.
pub fn writeln(out: &mut impl Write, text: &str) -> io::Result<()> {
    write!(out, "{}\r\n", text)
}

/// Color tier of a percentage bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    pub const MEDIUM_AT: f64 = 33.0;
    pub const HIGH_AT: f64 = 66.0;

    pub fn of(percent: f64) -> Self {
        let percent = clamp_percent(percent);
        if percent < Self::MEDIUM_AT {
            Tier::Low
        } else if percent < Self::HIGH_AT {
            Tier::Medium
        } else {
            Tier::High
        }
    }

    pub fn color(self) -> Color {
        match self {
            Tier::Low => Color::Green,
            Tier::Medium => Color::Yellow,
            Tier::High => Color::Red,
        }
    }
}

/// NaN and out-of-range values collapse into `[0, 100]`.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Emits color escapes unless running monochrome.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub monochrome: bool,
}

impl Palette {
    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.monochrome || text.is_empty() {
            text.to_string()
        } else {
            text.with(color).to_string()
        }
    }

    pub fn bold(&self, text: &str, color: Color) -> String {
        if self.monochrome {
            text.to_string()
        } else {
            text.with(color).bold().to_string()
        }
    }

    /// `[####------] 40.0%` with the filled part colored by tier.
    pub fn bar(&self, percent: f64, width: usize) -> String {
        let percent = clamp_percent(percent);
        let filled = bar_fill(percent, width);
        format!(
            "{}{}{}{} {:.1}%",
            self.paint("[", Color::Cyan),
            self.paint(&"#".repeat(filled), Tier::of(percent).color()),
            self.paint(&"-".repeat(width - filled), Color::White),
            self.paint("]", Color::Cyan),
            percent
        )
    }
}

/// Number of filled cells for `percent` in a bar `width` cells wide.
pub fn bar_fill(percent: f64, width: usize) -> usize {
    let filled = (clamp_percent(percent) / 100.0 * width as f64) as usize;
    filled.min(width)
}

/// Human-readable byte count with 1024 steps: `1.5KB`, `3.2GB`.
pub fn format_bytes(bytes: f64) -> String {
    let mut value = bytes;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.1}{}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}PB", value)
}

pub fn format_bytes_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// Truncate a string to at most `max_len` characters (not bytes), appending "..."
/// if truncated. Safe for multi-byte UTF-8.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else {
        let keep = max_len.saturating_sub(3);
        let truncated: String = s.chars().take(keep).collect();
        format!("{}...", truncated)
    }
}
