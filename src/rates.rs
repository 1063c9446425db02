// Per-minute rates from cumulative counters.
//
// Throughput (network, disk) is measured tick-to-tick so it tracks current load.
// Input activity (keys, clicks, scroll, movement) is smoothed over a span that
// ends at the latest snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::error::{Result, SamplerError};
use crate::models::{Snapshot, names};
use crate::window::SampleWindow;

/// Which pair of snapshots a rate is measured between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePolicy {
    /// Latest snapshot and the closest earlier one carrying the counters.
    TickToTick,
    /// Latest snapshot and the oldest one inside the smoothing span.
    WindowSpan,
}

/// A derived rate: one or more counters merged onto a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSpec {
    pub name: &'static str,
    /// Source that feeds the counters; used to honour enable flags.
    pub source: &'static str,
    pub counters: &'static [&'static str],
    pub policy: RatePolicy,
}

pub const CATALOG: &[RateSpec] = &[
    RateSpec {
        name: names::KEY_RATE,
        source: names::SOURCE_INPUT,
        counters: &[names::KEYS_PRESSED],
        policy: RatePolicy::WindowSpan,
    },
    RateSpec {
        name: names::CLICK_RATE,
        source: names::SOURCE_INPUT,
        counters: &[names::MOUSE_CLICKS],
        policy: RatePolicy::WindowSpan,
    },
    RateSpec {
        name: names::SCROLL_RATE,
        source: names::SOURCE_INPUT,
        counters: &[names::SCROLL_DISTANCE],
        policy: RatePolicy::WindowSpan,
    },
    RateSpec {
        name: names::MOVEMENT_RATE,
        source: names::SOURCE_INPUT,
        counters: &[names::MOUSE_DISTANCE_X, names::MOUSE_DISTANCE_Y],
        policy: RatePolicy::WindowSpan,
    },
    RateSpec {
        name: names::NETWORK_RATE,
        source: names::SOURCE_NETWORK,
        counters: &[names::NET_BYTES_SENT, names::NET_BYTES_RECV],
        policy: RatePolicy::TickToTick,
    },
    RateSpec {
        name: names::DISK_RATE,
        source: names::SOURCE_DISK,
        counters: &[names::DISK_BYTES_READ, names::DISK_BYTES_WRITTEN],
        policy: RatePolicy::TickToTick,
    },
];

/// Counter increase between two snapshots. A decrease means the source
/// restarted from zero, so the new value is the whole delta.
pub fn counter_delta(counter: &str, from: &Snapshot, to: &Snapshot) -> Result<u64> {
    let missing = || SamplerError::MissingCounter(counter.to_string());
    let before = from.counter(counter).ok_or_else(missing)?;
    let after = to.counter(counter).ok_or_else(missing)?;
    Ok(if after >= before { after - before } else { after })
}

fn elapsed_minutes(from: &Snapshot, to: &Snapshot) -> Result<f64> {
    if to.timestamp() <= from.timestamp() {
        return Err(SamplerError::DegenerateInterval);
    }
    let elapsed = to.timestamp().duration_since(from.timestamp());
    Ok(elapsed.as_secs_f64() / 60.0)
}

/// Per-minute rate of one counter.
pub fn rate(counter: &str, from: &Snapshot, to: &Snapshot) -> Result<f64> {
    composite_rate(&[counter], from, to)
}

/// Per-minute rate of several counters summed before dividing.
pub fn composite_rate(counters: &[&str], from: &Snapshot, to: &Snapshot) -> Result<f64> {
    let minutes = elapsed_minutes(from, to)?;
    let mut delta: u64 = 0;
    for counter in counters {
        delta = delta.saturating_add(counter_delta(counter, from, to)?);
    }
    Ok(delta as f64 / minutes)
}

#[derive(Debug, Clone)]
pub struct RateCalculator {
    specs: Vec<RateSpec>,
    /// `None` smooths input rates over the whole window.
    input_span: Option<Duration>,
}

impl Default for RateCalculator {
    fn default() -> Self {
        Self::new(CATALOG.to_vec(), Some(Duration::from_secs(60)))
    }
}

impl RateCalculator {
    pub fn new(specs: Vec<RateSpec>, input_span: Option<Duration>) -> Self {
        Self { specs, input_span }
    }

    /// Catalog entries whose source is enabled.
    pub fn for_sources(enabled: &[&str], input_span: Option<Duration>) -> Self {
        let specs = CATALOG
            .iter()
            .filter(|s| enabled.contains(&s.source))
            .copied()
            .collect();
        Self::new(specs, input_span)
    }

    pub fn specs(&self) -> &[RateSpec] {
        &self.specs
    }

    /// Snapshot pair the rate for `spec` is measured between.
    pub fn baseline<'w>(
        &self,
        spec: &RateSpec,
        window: &'w SampleWindow,
    ) -> Result<(&'w Snapshot, &'w Snapshot)> {
        let latest = window.latest()?;
        if let Some(missing) = spec.counters.iter().find(|c| latest.counter(c).is_none()) {
            return Err(SamplerError::MissingCounter(missing.to_string()));
        }
        let mut earlier = window
            .iter()
            .rev()
            .skip(1)
            .filter(|s| s.has_counters(spec.counters));
        let previous = earlier.next().ok_or(SamplerError::WindowEmpty)?;

        match (spec.policy, self.input_span) {
            (RatePolicy::TickToTick, _) => Ok((previous, latest)),
            (RatePolicy::WindowSpan, None) => Ok((earlier.last().unwrap_or(previous), latest)),
            (RatePolicy::WindowSpan, Some(span)) => {
                let cutoff = latest.timestamp().checked_sub(span);
                let mut from = previous;
                for s in earlier {
                    if cutoff.is_some_and(|c| s.timestamp() < c) {
                        break;
                    }
                    from = s;
                }
                Ok((from, latest))
            }
        }
    }

    /// Rate for one catalog entry over the current window.
    pub fn derive_one(&self, spec: &RateSpec, window: &SampleWindow) -> Result<f64> {
        let (from, to) = self.baseline(spec, window)?;
        composite_rate(spec.counters, from, to)
    }

    /// All rates that can be computed, plus the names of those that cannot.
    pub fn derive(&self, window: &SampleWindow) -> (BTreeMap<String, f64>, BTreeSet<String>) {
        let mut rates = BTreeMap::new();
        let mut unavailable = BTreeSet::new();
        for spec in &self.specs {
            match self.derive_one(spec, window) {
                Ok(r) => {
                    rates.insert(spec.name.to_string(), r);
                }
                Err(e) => {
                    tracing::trace!(rate = spec.name, error = %e, "rate unavailable");
                    unavailable.insert(spec.name.to_string());
                }
            }
        }
        (rates, unavailable)
    }
}

/// Bytes per minute to MiB per second.
pub fn per_minute_to_mib_per_sec(bytes_per_minute: f64) -> f64 {
    bytes_per_minute / 60.0 / (1024.0 * 1024.0)
}
