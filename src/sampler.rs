// Computing phase of a tick: merge source readings into a snapshot, append it
// to the window and derive the aggregate. Owned by the producer task only.

use std::collections::BTreeSet;
use tokio::time::Instant;

use crate::error::{Result, SamplerError};
use crate::models::{MetricsAggregate, Snapshot};
use crate::rates::RateCalculator;
use crate::sources::SourceReading;
use crate::window::SampleWindow;

/// One source's outcome for a tick.
pub type SourceOutcome = (String, Result<SourceReading>);

#[derive(Debug)]
pub struct Sampler {
    window: SampleWindow,
    calculator: RateCalculator,
    started_at: Instant,
    tick: u64,
}

impl Sampler {
    pub fn new(window_capacity: usize, calculator: RateCalculator, started_at: Instant) -> Self {
        Self {
            window: SampleWindow::new(window_capacity),
            calculator,
            started_at,
            tick: 0,
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Drop all history; rates become unavailable until two new samples exist.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Builds the aggregate for one tick. Never fails: a failed source or an
    /// underivable rate is listed in `unavailable`. The second value is the
    /// window rejection, if the snapshot was out of order.
    pub fn record(
        &mut self,
        timestamp: Instant,
        outcomes: Vec<SourceOutcome>,
    ) -> (MetricsAggregate, Option<SamplerError>) {
        let mut merged = SourceReading::default();
        let mut unavailable = BTreeSet::new();
        for (source, outcome) in outcomes {
            match outcome {
                Ok(reading) => {
                    merged.counters.extend(reading.counters);
                    merged.gauges.extend(reading.gauges);
                    merged.labels.extend(reading.labels);
                }
                Err(e) => {
                    tracing::debug!(source = %source, error = %e, "source unavailable this tick");
                    unavailable.insert(source);
                }
            }
        }

        let snapshot = Snapshot::new(timestamp, merged.counters, merged.gauges)
            .with_labels(merged.labels);
        let gauges = snapshot.gauges().clone();
        let labels = snapshot.labels().clone();
        let cumulative_totals = snapshot.counters().clone();

        let rejected = self.window.push(snapshot).err();
        if let Some(ref e) = rejected {
            tracing::warn!(error = %e, operation = "window_push", "sample dropped");
        }

        let (per_minute_rates, rates_unavailable) = self.calculator.derive(&self.window);
        unavailable.extend(rates_unavailable);

        self.tick += 1;
        let aggregate = MetricsAggregate {
            tick: self.tick,
            gauges,
            labels,
            per_minute_rates,
            cumulative_totals,
            unavailable,
            uptime: timestamp.duration_since(self.started_at),
            computed_at: timestamp,
        };
        (aggregate, rejected)
    }
}
