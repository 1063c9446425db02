use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::window::DEFAULT_CAPACITY;

/// Read once at startup; never reloaded while the sampler runs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampling: SamplingConfig,
    pub metrics: MetricsConfig,
    pub display: DisplayConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_ms: u64,
    /// Snapshots of history kept for rate derivation.
    pub window_capacity: usize,
    /// Longest a single source may take before it is reported unavailable.
    /// Defaults to the sampling interval.
    pub source_timeout_ms: Option<u64>,
    /// Smoothing span for input-activity rates; 0 uses the whole window.
    pub input_rate_span_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            window_capacity: DEFAULT_CAPACITY,
            source_timeout_ms: None,
            input_rate_span_secs: 60,
        }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms.unwrap_or(self.interval_ms))
    }

    pub fn input_rate_span(&self) -> Option<Duration> {
        match self.input_rate_span_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Per-metric enable flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub input: bool,
    pub cpu: bool,
    pub memory: bool,
    pub network: bool,
    pub disk: bool,
    pub active_window: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            input: true,
            cpu: true,
            memory: true,
            network: true,
            disk: true,
            active_window: true,
        }
    }
}

impl MetricsConfig {
    fn any_enabled(&self) -> bool {
        self.input || self.cpu || self.memory || self.network || self.disk || self.active_window
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How often the display consumer re-reads the published aggregate.
    pub refresh_ms: u64,
    /// Minimum gap between telemetry log rows.
    pub log_interval_secs: u64,
    pub max_log_entries: usize,
    /// Emit display lines as JSON instead of text.
    pub json: bool,
    /// CSV file the telemetry log is written to on shutdown.
    pub export_path: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 1_000,
            log_interval_secs: 5,
            max_log_entries: 1_000,
            json: false,
            export_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// How often to log sampler stats (ticks, failures) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: 300,
        }
    }
}

impl AppConfig {
    /// Reads `CONFIG_FILE` (or `config.toml`). Defaults apply when the default
    /// file is absent; an explicitly named file must exist.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                let s = std::fs::read_to_string(&path)?;
                Self::load_from_str(&s)
            }
            Err(_) => match std::fs::read_to_string("config.toml") {
                Ok(s) => Self::load_from_str(&s),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::info!("config.toml not found; using defaults");
                    let config = AppConfig::default();
                    config.validate()?;
                    Ok(config)
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.sampling.interval_ms > 0,
            "sampling.interval_ms must be > 0, got {}",
            self.sampling.interval_ms
        );
        anyhow::ensure!(
            self.sampling.window_capacity >= 2,
            "sampling.window_capacity must be >= 2 to derive rates, got {}",
            self.sampling.window_capacity
        );
        if let Some(timeout_ms) = self.sampling.source_timeout_ms {
            anyhow::ensure!(
                timeout_ms > 0,
                "sampling.source_timeout_ms must be > 0, got {}",
                timeout_ms
            );
            anyhow::ensure!(
                timeout_ms <= self.sampling.interval_ms,
                "sampling.source_timeout_ms must not exceed sampling.interval_ms ({} > {})",
                timeout_ms,
                self.sampling.interval_ms
            );
        }
        anyhow::ensure!(
            self.metrics.any_enabled(),
            "metrics: at least one metric must be enabled"
        );
        anyhow::ensure!(
            self.display.refresh_ms > 0,
            "display.refresh_ms must be > 0, got {}",
            self.display.refresh_ms
        );
        anyhow::ensure!(
            self.display.max_log_entries > 0,
            "display.max_log_entries must be > 0, got {}",
            self.display.max_log_entries
        );
        if let Some(path) = &self.display.export_path {
            anyhow::ensure!(
                !path.as_os_str().is_empty(),
                "display.export_path must not be empty"
            );
        }
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
