// Bounded in-memory table of display rows, recorded at most once per
// log interval and never twice for the same tick.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

use crate::models::{MetricsAggregate, names};
use crate::rates::per_minute_to_mib_per_sec;

pub const EXPORT_HEADER: [&str; 12] = [
    "Timestamp",
    "App Name",
    "Window Title",
    "Keys/min",
    "Mouse/min",
    "Clicks/min",
    "Scroll/min",
    "CPU %",
    "Memory %",
    "Network MBps",
    "Disk MBps",
    "Uptime (min)",
];

/// One row; `None` marks a metric that was unavailable at that tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub recorded_at: DateTime<Local>,
    pub tick: u64,
    pub app_name: Option<String>,
    pub window_title: Option<String>,
    pub key_rate: Option<f64>,
    pub movement_rate: Option<f64>,
    pub click_rate: Option<f64>,
    pub scroll_rate: Option<f64>,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub network_mbps: Option<f64>,
    pub disk_mbps: Option<f64>,
    pub uptime_minutes: u64,
}

impl LogEntry {
    pub fn from_aggregate(aggregate: &MetricsAggregate, recorded_at: DateTime<Local>) -> Self {
        Self {
            recorded_at,
            tick: aggregate.tick,
            app_name: aggregate.label(names::APP_NAME).map(str::to_string),
            window_title: aggregate.label(names::WINDOW_TITLE).map(str::to_string),
            key_rate: aggregate.rate_per_minute(names::KEY_RATE),
            movement_rate: aggregate.rate_per_minute(names::MOVEMENT_RATE),
            click_rate: aggregate.rate_per_minute(names::CLICK_RATE),
            scroll_rate: aggregate.rate_per_minute(names::SCROLL_RATE),
            cpu_percent: aggregate.gauge(names::CPU_PERCENT),
            memory_percent: aggregate.gauge(names::MEMORY_PERCENT),
            network_mbps: aggregate
                .rate_per_minute(names::NETWORK_RATE)
                .map(per_minute_to_mib_per_sec),
            disk_mbps: aggregate
                .rate_per_minute(names::DISK_RATE)
                .map(per_minute_to_mib_per_sec),
            uptime_minutes: aggregate.uptime_minutes(),
        }
    }

    pub fn export_row(&self) -> Vec<String> {
        let num = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_default();
        vec![
            self.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.app_name.clone().unwrap_or_default(),
            self.window_title.clone().unwrap_or_default(),
            num(self.key_rate),
            num(self.movement_rate),
            num(self.click_rate),
            num(self.scroll_rate),
            num(self.cpu_percent),
            num(self.memory_percent),
            num(self.network_mbps),
            num(self.disk_mbps),
            self.uptime_minutes.to_string(),
        ]
    }
}

#[derive(Debug)]
pub struct TelemetryLog {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
    min_interval: Duration,
    last_recorded: Option<(Instant, u64)>,
}

impl TelemetryLog {
    pub fn new(max_entries: usize, min_interval: Duration) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            min_interval,
            last_recorded: None,
        }
    }

    /// Appends a row unless one was recorded less than `min_interval` ago or
    /// the aggregate's tick is already logged. Returns whether a row was added.
    pub fn record(
        &mut self,
        aggregate: &MetricsAggregate,
        now: Instant,
        wall_clock: DateTime<Local>,
    ) -> bool {
        if let Some((at, tick)) = self.last_recorded
            && (tick == aggregate.tick || now.duration_since(at) < self.min_interval)
        {
            return false;
        }
        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries
            .push_back(LogEntry::from_aggregate(aggregate, wall_clock));
        self.last_recorded = Some((now, aggregate.tick));
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_recorded = None;
    }

    /// Rows formatted for export (two decimals, blanks for unavailable).
    pub fn export_rows(&self) -> Vec<Vec<String>> {
        self.entries.iter().map(LogEntry::export_row).collect()
    }

    /// Writes the header and every row to `path` as CSV, replacing the file.
    /// Returns the number of rows written.
    pub fn export_csv(&self, path: &Path) -> csv::Result<usize> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(EXPORT_HEADER)?;
        for entry in &self.entries {
            writer.write_record(entry.export_row())?;
        }
        writer.flush()?;
        Ok(self.entries.len())
    }
}
