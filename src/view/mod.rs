mod shared;
mod system;

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};

use crate::config::{Config, CoreLayout};
use crate::layout::{Layout, SectionId};
use crate::model::MetricFrame;

pub use shared::{bar_fill, format_bytes, format_bytes_rate, truncate_str, Palette, Tier};
pub use system::{link_capacity, utilization_percent, FALLBACK_LINK_CAPACITY};

/// Turns a [`MetricFrame`] into screen lines. Holds only display options;
/// all numbers come from the frame.
pub struct Presenter {
    layout: Layout,
    core_layout: CoreLayout,
    palette: Palette,
    interface: Option<String>,
    log_path: Option<String>,
}

impl Presenter {
    pub fn new(config: &Config) -> Self {
        Self {
            layout: Layout::for_domains(&config.domains),
            core_layout: config.core_layout,
            palette: Palette {
                monochrome: config.monochrome,
            },
            interface: config.interface.clone(),
            log_path: config.log_path.as_ref().map(|p| p.display().to_string()),
        }
    }

    /// Lines for one frame, without cursor movement.
    pub fn compose(&self, frame: &MetricFrame) -> Vec<String> {
        let mut lines = Vec::new();
        system::title(&mut lines, self.palette, frame);

        for section in &self.layout.sections {
            lines.push(String::new());
            match section {
                SectionId::Cpu => {
                    system::cpu(&mut lines, self.palette, frame.cpu.as_ref(), self.core_layout)
                }
                SectionId::Memory => {
                    system::memory(&mut lines, self.palette, frame.mem.as_ref(), frame.swap.as_ref())
                }
                SectionId::Disks => system::disks(&mut lines, self.palette, frame.disks.as_deref()),
                SectionId::Network => system::network(
                    &mut lines,
                    self.palette,
                    frame.net.as_deref(),
                    self.interface.as_deref(),
                ),
            }
        }

        lines.push(String::new());
        system::footer(&mut lines, self.palette, self.log_path.as_deref());
        lines
    }

    /// Redraw the whole screen from the top-left corner.
    pub fn render(&self, out: &mut impl Write, frame: &MetricFrame) -> io::Result<()> {
        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
        for line in self.compose(frame) {
            shared::writeln(out, &line)?;
        }
        out.flush()
    }
}
