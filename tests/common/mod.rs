// Shared test helpers
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use telemetry_sampler::error::{Result, SamplerError};
use telemetry_sampler::models::{MetricsAggregate, Snapshot};
use telemetry_sampler::sources::{CounterSource, SourceReading};
use tokio::time::Instant;

pub fn at(base: Instant, secs: u64) -> Instant {
    base + Duration::from_secs(secs)
}

pub fn snap(base: Instant, secs: u64, counters: &[(&str, u64)]) -> Snapshot {
    Snapshot::from_counters(at(base, secs), counters.iter().map(|(k, v)| (*k, *v)))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub fn aggregate(tick: u64) -> MetricsAggregate {
    MetricsAggregate {
        tick,
        gauges: BTreeMap::new(),
        labels: BTreeMap::new(),
        per_minute_rates: BTreeMap::new(),
        cumulative_totals: BTreeMap::new(),
        unavailable: Default::default(),
        uptime: Duration::from_secs(tick * 10),
        computed_at: Instant::now(),
    }
}

/// Counter that grows by `step` on every sample.
pub struct CountingSource {
    pub name: &'static str,
    pub counter: &'static str,
    pub step: u64,
    pub value: AtomicU64,
}

impl CountingSource {
    pub fn new(name: &'static str, counter: &'static str, step: u64) -> Self {
        Self {
            name,
            counter,
            step,
            value: AtomicU64::new(0),
        }
    }
}

impl CounterSource for CountingSource {
    fn name(&self) -> &str {
        self.name
    }

    fn sample(&self) -> Result<SourceReading> {
        let v = self.value.fetch_add(self.step, Ordering::Relaxed) + self.step;
        Ok(SourceReading::default().counter(self.counter, v))
    }
}

/// Constant gauge.
pub struct GaugeSource {
    pub name: &'static str,
    pub gauge: &'static str,
    pub value: f64,
}

impl CounterSource for GaugeSource {
    fn name(&self) -> &str {
        self.name
    }

    fn sample(&self) -> Result<SourceReading> {
        Ok(SourceReading::default().gauge(self.gauge, self.value))
    }
}

/// Blocks longer than any test budget.
pub struct StallingSource {
    pub name: &'static str,
    pub stall: Duration,
}

impl CounterSource for StallingSource {
    fn name(&self) -> &str {
        self.name
    }

    fn sample(&self) -> Result<SourceReading> {
        std::thread::sleep(self.stall);
        Ok(SourceReading::default())
    }
}

pub struct PanickingSource;

impl CounterSource for PanickingSource {
    fn name(&self) -> &str {
        "panicky"
    }

    fn sample(&self) -> Result<SourceReading> {
        panic!("probe exploded");
    }
}

/// Replays scripted outcomes, then repeats the last one.
pub struct ScriptedSource {
    pub name: &'static str,
    pub script: Mutex<Vec<Result<SourceReading>>>,
}

impl ScriptedSource {
    pub fn new(name: &'static str, mut script: Vec<Result<SourceReading>>) -> Self {
        script.reverse();
        Self {
            name,
            script: Mutex::new(script),
        }
    }
}

impl CounterSource for ScriptedSource {
    fn name(&self) -> &str {
        self.name
    }

    fn sample(&self) -> Result<SourceReading> {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop().unwrap()
        } else {
            script
                .last()
                .cloned()
                .unwrap_or_else(|| Err(SamplerError::unavailable(self.name, "script exhausted")))
        }
    }
}
