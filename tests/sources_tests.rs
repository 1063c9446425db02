// Counter sources: input recorder, active window, capability fallbacks

use std::sync::Arc;
use telemetry_sampler::config::MetricsConfig;
use telemetry_sampler::error::SamplerError;
use telemetry_sampler::models::names;
use telemetry_sampler::sources::{
    self, ActiveWindow, ActiveWindowSource, CounterSource, InputRecorder, InputSource,
    SourceReading, SystemProbe, UnavailableSource, WindowProbe,
};

fn only(metrics: impl FnOnce(&mut MetricsConfig)) -> MetricsConfig {
    let mut config = MetricsConfig {
        input: false,
        cpu: false,
        memory: false,
        network: false,
        disk: false,
        active_window: false,
    };
    metrics(&mut config);
    config
}

#[test]
fn test_input_recorder_accumulates_events() {
    let recorder = InputRecorder::new();
    let source = InputSource::new(recorder.clone());
    for _ in 0..5 {
        recorder.record_key();
    }
    recorder.record_click();
    recorder.record_scroll(3);
    recorder.record_scroll(-4);

    let reading = source.sample().unwrap();
    assert_eq!(reading.counters[names::KEYS_PRESSED], 5);
    assert_eq!(reading.counters[names::MOUSE_CLICKS], 1);
    assert_eq!(reading.counters[names::SCROLL_DISTANCE], 7);
    assert_eq!(source.name(), names::SOURCE_INPUT);
}

#[test]
fn test_pointer_distance_sums_absolute_axis_deltas() {
    let recorder = InputRecorder::new();
    let source = InputSource::new(recorder.clone());
    // first position is only the origin
    recorder.record_move(100.0, 100.0);
    recorder.record_move(130.0, 60.0);
    recorder.record_move(110.0, 60.0);

    let reading = source.sample().unwrap();
    assert_eq!(reading.counters[names::MOUSE_DISTANCE_X], 50);
    assert_eq!(reading.counters[names::MOUSE_DISTANCE_Y], 40);
}

#[test]
fn test_recorder_reset_zeroes_counters() {
    let recorder = InputRecorder::new();
    let source = InputSource::new(recorder.clone());
    recorder.record_key();
    recorder.record_move(0.0, 0.0);
    recorder.record_move(10.0, 0.0);
    recorder.reset();
    // origin is forgotten too
    recorder.record_move(500.0, 500.0);

    let reading = source.sample().unwrap();
    assert!(reading.counters.values().all(|v| *v == 0));
}

fn probe(window: Option<ActiveWindow>) -> WindowProbe {
    Arc::new(move || window.clone())
}

#[test]
fn test_active_window_reported_as_labels() {
    let source = ActiveWindowSource::new(probe(Some(ActiveWindow {
        app_name: "terminal".into(),
        window_title: "build".into(),
    })));
    let reading = source.sample().unwrap();
    assert_eq!(reading.labels[names::APP_NAME], "terminal");
    assert_eq!(reading.labels[names::WINDOW_TITLE], "build");
    assert!(reading.counters.is_empty());
}

#[test]
fn test_active_window_empty_title_becomes_no_title() {
    let source = ActiveWindowSource::new(probe(Some(ActiveWindow {
        app_name: "desktop".into(),
        window_title: String::new(),
    })));
    let reading = source.sample().unwrap();
    assert_eq!(reading.labels[names::WINDOW_TITLE], "No Title");
}

#[test]
fn test_no_foreground_window_is_unavailable() {
    let source = ActiveWindowSource::new(probe(None));
    assert!(matches!(
        source.sample(),
        Err(SamplerError::SourceUnavailable { .. })
    ));
}

#[test]
fn test_unavailable_source_always_fails_with_its_reason() {
    let source = UnavailableSource::new("disk", "not supported");
    let err = source.sample().unwrap_err();
    assert_eq!(err, SamplerError::unavailable("disk", "not supported"));
    assert!(err.to_string().contains("not supported"));
}

#[test]
fn test_build_without_input_hook_uses_unavailable_source() {
    let sources = sources::build(&only(|m| m.input = true), None, None);
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].name(), names::SOURCE_INPUT);
    assert!(sources[0].sample().is_err());
}

#[test]
fn test_build_with_hooks_uses_real_sources() {
    let recorder = InputRecorder::new();
    recorder.record_key();
    let sources = sources::build(
        &only(|m| {
            m.input = true;
            m.active_window = true;
        }),
        Some(recorder),
        Some(probe(Some(ActiveWindow {
            app_name: "a".into(),
            window_title: "b".into(),
        }))),
    );
    let got: Vec<&str> = sources.iter().map(|s| s.name()).collect();
    assert_eq!(got, vec![names::SOURCE_INPUT, names::SOURCE_ACTIVE_WINDOW]);
    assert!(sources.iter().all(|s| s.sample().is_ok()));
}

#[test]
fn test_build_skips_disabled_metrics() {
    let sources = sources::build(&only(|m| m.memory = true), None, None);
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].name(), names::SOURCE_MEMORY);
    let reading = sources[0].sample().unwrap();
    assert!(reading.gauges.contains_key(names::MEMORY_PERCENT));
    let total = reading.gauges[names::MEMORY_TOTAL_BYTES];
    assert!(reading.gauges[names::MEMORY_USED_BYTES] <= total);
}

#[test]
fn test_disk_source_reports_cumulative_io_counters() {
    let sources = sources::build(&only(|m| m.disk = true), None, None);
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].name(), names::SOURCE_DISK);

    let first = sources[0].sample().unwrap();
    assert!(first.counters.contains_key(names::DISK_BYTES_READ));
    assert!(first.counters.contains_key(names::DISK_BYTES_WRITTEN));
}

#[test]
fn test_disk_and_network_share_one_system_probe() {
    let probe = SystemProbe::new();
    let disk = probe.disk().sample().unwrap();
    let net = probe.network().sample().unwrap();
    assert_eq!(disk.counters.len(), 2);
    assert!(net.counters.contains_key(names::NET_BYTES_SENT));
}

#[test]
fn test_source_reading_builder() {
    let reading = SourceReading::default()
        .counter("c", 1)
        .gauge("g", 2.5)
        .label("l", "v");
    assert_eq!(reading.counters["c"], 1);
    assert_eq!(reading.gauges["g"], 2.5);
    assert_eq!(reading.labels["l"], "v");
}
