// Published metrics: replaced wholesale every tick, read-only for consumers.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsAggregate {
    /// Monotonic tick sequence number of the producer.
    pub tick: u64,
    pub gauges: BTreeMap<String, f64>,
    pub labels: BTreeMap<String, String>,
    pub per_minute_rates: BTreeMap<String, f64>,
    pub cumulative_totals: BTreeMap<String, u64>,
    /// Sources that failed this tick and derived metrics that could not be computed.
    pub unavailable: BTreeSet<String>,
    pub uptime: Duration,
    pub computed_at: Instant,
}

impl MetricsAggregate {
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).copied()
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    pub fn rate_per_minute(&self, name: &str) -> Option<f64> {
        self.per_minute_rates.get(name).copied()
    }

    pub fn rate_per_second(&self, name: &str) -> Option<f64> {
        self.rate_per_minute(name).map(|r| r / 60.0)
    }

    pub fn total(&self, name: &str) -> Option<u64> {
        self.cumulative_totals.get(name).copied()
    }

    pub fn is_unavailable(&self, name: &str) -> bool {
        self.unavailable.contains(name)
    }

    pub fn uptime_minutes(&self) -> u64 {
        self.uptime.as_secs() / 60
    }

    pub fn view(&self) -> AggregateView {
        AggregateView {
            tick: self.tick,
            uptime_secs: self.uptime.as_secs(),
            gauges: self.gauges.clone(),
            labels: self.labels.clone(),
            per_minute_rates: self.per_minute_rates.clone(),
            cumulative_totals: self.cumulative_totals.clone(),
            unavailable: self.unavailable.iter().cloned().collect(),
        }
    }
}

/// Wire/display form of an aggregate (monotonic instants dropped).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateView {
    pub tick: u64,
    pub uptime_secs: u64,
    pub gauges: BTreeMap<String, f64>,
    pub labels: BTreeMap<String, String>,
    pub per_minute_rates: BTreeMap<String, f64>,
    pub cumulative_totals: BTreeMap<String, u64>,
    pub unavailable: Vec<String>,
}
