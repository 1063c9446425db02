// Counter sources: the opaque probes the scheduler pulls once per tick.
//
// `sample()` may block (system calls, locks); the scheduler runs it on the
// blocking pool and bounds it with a timeout.

mod focus;
mod input;
mod system;

pub use focus::{ActiveWindow, ActiveWindowSource, WindowProbe, platform_probe};
pub use input::{InputRecorder, InputSource};
pub use system::{CpuSource, DiskSource, MemorySource, NetworkSource, SystemProbe};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::MetricsConfig;
use crate::error::{Result, SamplerError};
use crate::models::names;

/// One source's contribution to a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceReading {
    pub counters: BTreeMap<String, u64>,
    pub gauges: BTreeMap<String, f64>,
    pub labels: BTreeMap<String, String>,
}

impl SourceReading {
    pub fn counter(mut self, name: &str, value: u64) -> Self {
        self.counters.insert(name.to_string(), value);
        self
    }

    pub fn gauge(mut self, name: &str, value: f64) -> Self {
        self.gauges.insert(name.to_string(), value);
        self
    }

    pub fn label(mut self, name: &str, value: impl Into<String>) -> Self {
        self.labels.insert(name.to_string(), value.into());
        self
    }
}

pub trait CounterSource: Send + Sync {
    fn name(&self) -> &str;

    fn sample(&self) -> Result<SourceReading>;
}

/// Stand-in for a capability missing on this host; always unavailable.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    name: String,
    reason: String,
}

impl UnavailableSource {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl CounterSource for UnavailableSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&self) -> Result<SourceReading> {
        Err(SamplerError::unavailable(&self.name, &self.reason))
    }
}

/// Builds the enabled sources, probing optional capabilities once.
/// Absent capabilities get an `UnavailableSource` under the same name.
pub fn build(
    metrics: &MetricsConfig,
    input: Option<InputRecorder>,
    window_probe: Option<WindowProbe>,
) -> Vec<Arc<dyn CounterSource>> {
    let mut sources: Vec<Arc<dyn CounterSource>> = Vec::new();

    if metrics.input {
        match input {
            Some(recorder) => sources.push(Arc::new(InputSource::new(recorder))),
            None => {
                tracing::warn!(
                    source = names::SOURCE_INPUT,
                    "no input event hook attached; input metrics unavailable"
                );
                sources.push(Arc::new(UnavailableSource::new(
                    names::SOURCE_INPUT,
                    "no input event hook attached",
                )));
            }
        }
    }

    if metrics.cpu || metrics.memory || metrics.network || metrics.disk {
        let probe = SystemProbe::new();
        if metrics.cpu {
            sources.push(Arc::new(probe.cpu()));
        }
        if metrics.memory {
            sources.push(Arc::new(probe.memory()));
        }
        if metrics.network {
            sources.push(Arc::new(probe.network()));
        }
        if metrics.disk {
            sources.push(Arc::new(probe.disk()));
        }
    }

    if metrics.active_window {
        match window_probe.or_else(platform_probe) {
            Some(probe) => sources.push(Arc::new(ActiveWindowSource::new(probe))),
            None => {
                tracing::info!(
                    source = names::SOURCE_ACTIVE_WINDOW,
                    "active window lookup not supported on this platform"
                );
                sources.push(Arc::new(UnavailableSource::new(
                    names::SOURCE_ACTIVE_WINDOW,
                    "active window lookup not supported",
                )));
            }
        }
    }

    sources
}
