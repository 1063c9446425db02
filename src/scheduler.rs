// Background sampling loop: Idle -> Sampling -> Computing -> Publishing -> Idle.
// Sources run concurrently on the blocking pool, each bounded by the source
// timeout. Shutdown is observed between ticks; a tick in progress completes.

use futures_util::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::Instrument;

use crate::bridge::PublicationBridge;
use crate::config::AppConfig;
use crate::error::SamplerError;
use crate::rates::RateCalculator;
use crate::sampler::{Sampler, SourceOutcome};
use crate::sources::CounterSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    Sampling = 1,
    Computing = 2,
    Publishing = 3,
}

impl Phase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Phase::Sampling,
            2 => Phase::Computing,
            3 => Phase::Publishing,
            _ => Phase::Idle,
        }
    }
}

/// Counters for the periodic stats log and for tests.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    phase: AtomicU8,
    ticks_published: AtomicU64,
    ticks_paused: AtomicU64,
    source_failures: AtomicU64,
    samples_rejected: AtomicU64,
}

impl SchedulerStats {
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    pub fn ticks_published(&self) -> u64 {
        self.ticks_published.load(Ordering::Relaxed)
    }

    pub fn ticks_paused(&self) -> u64 {
        self.ticks_paused.load(Ordering::Relaxed)
    }

    pub fn source_failures(&self) -> u64 {
        self.source_failures.load(Ordering::Relaxed)
    }

    pub fn samples_rejected(&self) -> u64 {
        self.samples_rejected.load(Ordering::Relaxed)
    }

    fn enter(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Relaxed);
        tracing::trace!(?phase, "scheduler phase");
    }
}

/// Shared pause/reset flags, read by the loop at tick boundaries.
#[derive(Debug, Clone, Default)]
pub struct SchedulerControl {
    paused: Arc<AtomicBool>,
    reset: Arc<AtomicBool>,
    stats: Arc<SchedulerStats>,
}

impl SchedulerControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Clear the sample window at the next tick.
    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::Relaxed);
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    fn take_reset(&self) -> bool {
        self.reset.swap(false, Ordering::Relaxed)
    }
}

/// Sources, bridge, control and shutdown for the scheduler.
pub struct SchedulerDeps {
    pub sources: Vec<Arc<dyn CounterSource>>,
    pub bridge: Arc<PublicationBridge>,
    pub control: SchedulerControl,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Scheduler timing and windowing config.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub sample_interval_ms: u64,
    pub window_capacity: usize,
    pub source_timeout_ms: u64,
    /// `None` smooths input rates over the whole window.
    pub input_rate_span: Option<Duration>,
    /// How often to log sampler stats (real seconds).
    pub stats_log_interval_secs: u64,
}

impl SchedulerConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            sample_interval_ms: config.sampling.interval_ms,
            window_capacity: config.sampling.window_capacity,
            source_timeout_ms: config.sampling.source_timeout().as_millis() as u64,
            input_rate_span: config.sampling.input_rate_span(),
            stats_log_interval_secs: config.monitoring.stats_log_interval_secs,
        }
    }
}

struct SourceSlot {
    source: Arc<dyn CounterSource>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the blocking call returns or unwinds.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs one source on the blocking pool. A source still running from an
/// earlier tick is not called again until it returns.
async fn sample_source(slot: &SourceSlot, budget: Duration) -> SourceOutcome {
    let name = slot.source.name().to_string();
    if slot.in_flight.swap(true, Ordering::AcqRel) {
        let err = SamplerError::unavailable(&name, "previous sample still in flight");
        return (name, Err(err));
    }

    let source = slot.source.clone();
    let guard = InFlightGuard(slot.in_flight.clone());
    let handle = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        source.sample()
    });

    let result = match tokio::time::timeout(budget, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(SamplerError::unavailable(
            &name,
            format!("sampling task failed: {}", e),
        )),
        Err(_) => Err(SamplerError::unavailable(
            &name,
            format!("timed out after {} ms", budget.as_millis()),
        )),
    };
    (name, result)
}

async fn run_tick(
    slots: &[SourceSlot],
    sampler: &mut Sampler,
    bridge: &PublicationBridge,
    stats: &SchedulerStats,
    budget: Duration,
) {
    stats.enter(Phase::Sampling);
    let timestamp = Instant::now();
    let outcomes = join_all(slots.iter().map(|slot| sample_source(slot, budget))).await;
    for (source, outcome) in &outcomes {
        if let Err(e) = outcome {
            stats.source_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                source = %source,
                error = %e,
                operation = "sample",
                "source unavailable"
            );
        }
    }

    stats.enter(Phase::Computing);
    let (aggregate, rejected) = sampler.record(timestamp, outcomes);
    if rejected.is_some() {
        stats.samples_rejected.fetch_add(1, Ordering::Relaxed);
    }

    stats.enter(Phase::Publishing);
    let tick = aggregate.tick;
    bridge.publish(aggregate);
    stats.ticks_published.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(tick, operation = "publish", "aggregate published");

    stats.enter(Phase::Idle);
}

pub fn spawn(deps: SchedulerDeps, config: SchedulerConfig) -> tokio::task::JoinHandle<()> {
    let SchedulerDeps {
        sources,
        bridge,
        control,
        mut shutdown_rx,
    } = deps;
    let SchedulerConfig {
        sample_interval_ms,
        window_capacity,
        source_timeout_ms,
        input_rate_span,
        stats_log_interval_secs,
    } = config;

    let budget = Duration::from_millis(source_timeout_ms);
    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);
    let scheduler_span = tracing::span!(
        tracing::Level::DEBUG,
        "scheduler",
        sample_interval_ms,
        window_capacity
    );

    let task = async move {
        let enabled: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        let calculator = RateCalculator::for_sources(&enabled, input_rate_span);
        let mut sampler = Sampler::new(window_capacity, calculator, Instant::now());
        let slots: Vec<SourceSlot> = sources
            .iter()
            .map(|source| SourceSlot {
                source: source.clone(),
                in_flight: Arc::new(AtomicBool::new(false)),
            })
            .collect();

        let mut tick = interval(Duration::from_millis(sample_interval_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats_log_tick =
            interval_at(Instant::now() + stats_log_interval, stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(sources = ?enabled, "sampling started");

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if control.take_reset() {
                        sampler.reset();
                        tracing::info!(operation = "reset", "sample window cleared");
                    }
                    if control.is_paused() {
                        control.stats.ticks_paused.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    run_tick(&slots, &mut sampler, &bridge, &control.stats, budget).await;
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Scheduler shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let stats = control.stats();
                    tracing::info!(
                        ticks_published = stats.ticks_published(),
                        ticks_paused = stats.ticks_paused(),
                        source_failures = stats.source_failures(),
                        samples_rejected = stats.samples_rejected(),
                        window_len = sampler.window().len(),
                        "sampler stats"
                    );
                }
            }
        }
    };
    tokio::spawn(task.instrument(scheduler_span))
}
