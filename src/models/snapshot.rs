// One timestamped reading of every enabled counter, gauge and label.

use std::collections::BTreeMap;
use tokio::time::Instant;

/// Immutable once built; the sample window owns it until eviction.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    timestamp: Instant,
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, f64>,
    labels: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn new(
        timestamp: Instant,
        counters: BTreeMap<String, u64>,
        gauges: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            timestamp,
            counters,
            gauges,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Snapshot carrying only counters (tests, replay).
    pub fn from_counters<I, K>(timestamp: Instant, counters: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        Self::new(
            timestamp,
            counters.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            BTreeMap::new(),
        )
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).copied()
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    pub fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    pub fn gauges(&self) -> &BTreeMap<String, f64> {
        &self.gauges
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// True when every named counter is present.
    pub fn has_counters(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.counters.contains_key(*n))
    }
}
