// Display consumer: line rendering and decoupled refresh cadence

mod common;

use common::aggregate;
use std::sync::Arc;
use std::time::Duration;
use telemetry_sampler::bridge::PublicationBridge;
use telemetry_sampler::config::DisplayConfig;
use telemetry_sampler::display::{format_line, spawn};
use telemetry_sampler::models::names;
use tokio::sync::oneshot;

#[test]
fn test_format_line_marks_unavailable_metrics() {
    let mut agg = aggregate(3);
    agg.gauges.insert(names::CPU_PERCENT.into(), 12.34);
    agg.per_minute_rates.insert(names::KEY_RATE.into(), 45.0);
    let line = format_line(&agg);
    assert!(line.contains("keys=45/min"), "{line}");
    assert!(line.contains("cpu=12.3%"), "{line}");
    assert!(line.contains("mem=-"), "{line}");
    assert!(line.contains("net=-"), "{line}");
    assert!(line.contains("app=-"), "{line}");
    assert!(line.ends_with("uptime=0m"), "{line}");
}

#[test]
fn test_format_line_shows_throughput_in_mib_per_sec() {
    let mut agg = aggregate(1);
    agg.per_minute_rates
        .insert(names::DISK_RATE.into(), 3.0 * 60.0 * 1024.0 * 1024.0);
    agg.labels.insert(names::WINDOW_TITLE.into(), "No Title".into());
    let line = format_line(&agg);
    assert!(line.contains("disk=3.00MB/s"), "{line}");
    assert!(line.contains("title=\"No Title\""), "{line}");
}

#[tokio::test]
async fn test_display_logs_each_tick_once_despite_fast_refresh() {
    let bridge = Arc::new(PublicationBridge::new());
    let config = DisplayConfig {
        refresh_ms: 5,
        log_interval_secs: 0,
        max_log_entries: 100,
        json: true,
        export_path: None,
    };
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = spawn(bridge.clone(), config, shutdown_rx);

    // nothing published yet: the consumer just waits
    tokio::time::sleep(Duration::from_millis(30)).await;
    bridge.publish(aggregate(1));
    tokio::time::sleep(Duration::from_millis(50)).await;
    bridge.publish(aggregate(2));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let _ = shutdown_tx.send(());
    let log = handle.await.unwrap();
    let ticks: Vec<u64> = log.entries().map(|e| e.tick).collect();
    assert_eq!(ticks, vec![1, 2]);
}
