// Foreground window identity, reported as labels.

use std::sync::Arc;

use super::{CounterSource, SourceReading};
use crate::error::{Result, SamplerError};
use crate::models::names;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWindow {
    pub app_name: String,
    pub window_title: String,
}

/// Platform lookup of the foreground window; `None` when nothing is focused.
pub type WindowProbe = Arc<dyn Fn() -> Option<ActiveWindow> + Send + Sync>;

/// Built-in lookup for this platform. No windowing API is linked, so the
/// caller supplies a probe or the source is reported unavailable.
pub fn platform_probe() -> Option<WindowProbe> {
    None
}

pub struct ActiveWindowSource {
    probe: WindowProbe,
}

impl ActiveWindowSource {
    pub fn new(probe: WindowProbe) -> Self {
        Self { probe }
    }
}

impl CounterSource for ActiveWindowSource {
    fn name(&self) -> &str {
        names::SOURCE_ACTIVE_WINDOW
    }

    fn sample(&self) -> Result<SourceReading> {
        let window = (self.probe)()
            .ok_or_else(|| SamplerError::unavailable(self.name(), "no foreground window"))?;
        let title = if window.window_title.is_empty() {
            "No Title".to_string()
        } else {
            window.window_title
        };
        Ok(SourceReading::default()
            .label(names::APP_NAME, window.app_name)
            .label(names::WINDOW_TITLE, title))
    }
}
