//! One sampling cycle: read every enabled domain once, then compute a frame.

use tracing::debug;

use crate::collectors::{CounterSource, SourceError};
use crate::config::{Config, Domains};
use crate::engine::EngineState;
use crate::model::{CounterSample, MetricFrame, SampleTime};

pub struct Monitor {
    source: Box<dyn CounterSource>,
    state: EngineState,
    domains: Domains,
    interface: Option<String>,
}

fn read_domain<T>(
    enabled: bool,
    domain: &str,
    read: impl FnOnce() -> Result<T, SourceError>,
) -> Option<T> {
    if !enabled {
        return None;
    }
    match read() {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            debug!("{} source unavailable: {}", domain, e);
            None
        }
    }
}

impl Monitor {
    pub fn new(source: Box<dyn CounterSource>, config: &Config) -> Self {
        Self {
            source,
            state: EngineState::new(),
            domains: config.domains,
            interface: config.interface.clone(),
        }
    }

    pub fn core_count(&self) -> usize {
        self.source.core_count()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Read each enabled domain exactly once. A failed read leaves that
    /// domain empty for this cycle.
    pub fn read(&mut self) -> CounterSample {
        let source = &mut self.source;
        let mut sample = CounterSample {
            cpu: read_domain(self.domains.cpu, "cpu", || source.read_cpu_counters()),
            net: read_domain(self.domains.net, "net", || source.read_net_counters()),
            mem: read_domain(self.domains.mem, "memory", || source.read_memory()),
            disks: read_domain(self.domains.disks, "disk", || source.read_filesystems()),
        };

        if let (Some(name), Some(net)) = (&self.interface, sample.net.as_mut()) {
            net.retain(|iface, _| iface == name);
        }
        sample
    }

    /// Read all sources and compute this cycle's frame, timestamped after the
    /// reads complete.
    pub fn sample(&mut self) -> MetricFrame {
        let sample = self.read();
        self.state.compute_frame(sample, SampleTime::now())
    }

    /// Like [`Monitor::sample`] with an explicit timestamp.
    pub fn sample_at(&mut self, now: SampleTime) -> MetricFrame {
        let sample = self.read();
        self.state.compute_frame(sample, now)
    }
}
