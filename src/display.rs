// Reference presentation: polls the bridge on its own cadence, logs one line
// per new aggregate and keeps the telemetry log. Faster refreshes re-read the
// same aggregate until the producer publishes the next one.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior, interval};

use crate::bridge::PublicationBridge;
use crate::config::DisplayConfig;
use crate::error::SamplerError;
use crate::models::{MetricsAggregate, names};
use crate::rates::per_minute_to_mib_per_sec;
use crate::telemetry_log::TelemetryLog;

const UNAVAILABLE: &str = "-";

fn fmt_value(v: Option<f64>, precision: usize, unit: &str) -> String {
    match v {
        Some(v) => format!("{:.*}{}", precision, v, unit),
        None => UNAVAILABLE.to_string(),
    }
}

/// Human-readable one-line rendering; unavailable metrics show as `-`.
pub fn format_line(aggregate: &MetricsAggregate) -> String {
    let app = aggregate.label(names::APP_NAME).unwrap_or(UNAVAILABLE);
    let title = aggregate.label(names::WINDOW_TITLE).unwrap_or(UNAVAILABLE);
    format!(
        "keys={} movement={} clicks={} scroll={} cpu={} mem={} net={} disk={} app={} title={:?} uptime={}m",
        fmt_value(aggregate.rate_per_minute(names::KEY_RATE), 0, "/min"),
        fmt_value(aggregate.rate_per_minute(names::MOVEMENT_RATE), 0, "px/min"),
        fmt_value(aggregate.rate_per_minute(names::CLICK_RATE), 0, "/min"),
        fmt_value(aggregate.rate_per_minute(names::SCROLL_RATE), 0, "/min"),
        fmt_value(aggregate.gauge(names::CPU_PERCENT), 1, "%"),
        fmt_value(aggregate.gauge(names::MEMORY_PERCENT), 1, "%"),
        fmt_value(
            aggregate
                .rate_per_minute(names::NETWORK_RATE)
                .map(per_minute_to_mib_per_sec),
            2,
            "MB/s"
        ),
        fmt_value(
            aggregate
                .rate_per_minute(names::DISK_RATE)
                .map(per_minute_to_mib_per_sec),
            2,
            "MB/s"
        ),
        app,
        title,
        aggregate.uptime_minutes(),
    )
}

/// Spawns the display consumer. Returns the telemetry log when shut down.
pub fn spawn(
    bridge: Arc<PublicationBridge>,
    config: DisplayConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<TelemetryLog> {
    tokio::spawn(async move {
        let mut log = TelemetryLog::new(
            config.max_log_entries,
            Duration::from_secs(config.log_interval_secs),
        );
        let mut refresh = interval(Duration::from_millis(config.refresh_ms));
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_shown: Option<u64> = None;

        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    let aggregate = match bridge.read_latest() {
                        Ok(a) => a,
                        Err(SamplerError::NotYetAvailable) => {
                            tracing::trace!("waiting for first aggregate");
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "read_latest", "read failed");
                            continue;
                        }
                    };
                    if last_shown == Some(aggregate.tick) {
                        continue;
                    }
                    last_shown = Some(aggregate.tick);

                    if config.json {
                        match serde_json::to_string(&aggregate.view()) {
                            Ok(json) => tracing::info!(target: "display", "{}", json),
                            Err(e) => tracing::warn!(error = %e, "aggregate serialization failed"),
                        }
                    } else {
                        tracing::info!(target: "display", tick = aggregate.tick, "{}", format_line(&aggregate));
                    }
                    log.record(&aggregate, Instant::now(), chrono::Local::now());
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!(log_entries = log.len(), "Display shutting down");
                    break;
                }
            }
        }
        log
    })
}
