// Keyboard/mouse activity counters.
//
// Raw event delivery is external: whatever hooks the OS event stream calls
// the `record_*` methods. The source only reads the accumulated totals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{CounterSource, SourceReading};
use crate::error::Result;
use crate::models::names;

#[derive(Debug, Default)]
struct Pointer {
    last: Option<(f64, f64)>,
    distance_x: f64,
    distance_y: f64,
}

#[derive(Debug, Default)]
struct Counters {
    keys: AtomicU64,
    clicks: AtomicU64,
    scroll: AtomicU64,
    pointer: Mutex<Pointer>,
}

/// Cloneable handle fed by the event hook. Clones share counters.
#[derive(Debug, Clone, Default)]
pub struct InputRecorder {
    inner: Arc<Counters>,
}

impl InputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_key(&self) {
        self.inner.keys.fetch_add(1, Ordering::Relaxed);
    }

    /// Button presses only; releases are not counted.
    pub fn record_click(&self) {
        self.inner.clicks.fetch_add(1, Ordering::Relaxed);
    }

    /// Scroll distance accumulates the absolute wheel delta.
    pub fn record_scroll(&self, delta: i64) {
        self.inner
            .scroll
            .fetch_add(delta.unsigned_abs(), Ordering::Relaxed);
    }

    /// Pointer moved to (x, y). The first position only sets the origin.
    pub fn record_move(&self, x: f64, y: f64) {
        let mut p = self.pointer();
        if let Some((lx, ly)) = p.last {
            p.distance_x += (x - lx).abs();
            p.distance_y += (y - ly).abs();
        }
        p.last = Some((x, y));
    }

    /// Zero every counter. Rates absorb the drop as a counter reset.
    pub fn reset(&self) {
        self.inner.keys.store(0, Ordering::Relaxed);
        self.inner.clicks.store(0, Ordering::Relaxed);
        self.inner.scroll.store(0, Ordering::Relaxed);
        *self.pointer() = Pointer::default();
    }

    /// Recovers a poisoned lock; every update is a plain field write.
    fn pointer(&self) -> MutexGuard<'_, Pointer> {
        self.inner.pointer.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(
                source = names::SOURCE_INPUT,
                "pointer lock poisoned; recovering"
            );
            poisoned.into_inner()
        })
    }

    fn read(&self) -> SourceReading {
        let (dx, dy) = {
            let p = self.pointer();
            (p.distance_x, p.distance_y)
        };
        SourceReading::default()
            .counter(names::KEYS_PRESSED, self.inner.keys.load(Ordering::Relaxed))
            .counter(names::MOUSE_CLICKS, self.inner.clicks.load(Ordering::Relaxed))
            .counter(names::SCROLL_DISTANCE, self.inner.scroll.load(Ordering::Relaxed))
            .counter(names::MOUSE_DISTANCE_X, dx as u64)
            .counter(names::MOUSE_DISTANCE_Y, dy as u64)
    }
}

pub struct InputSource {
    recorder: InputRecorder,
}

impl InputSource {
    pub fn new(recorder: InputRecorder) -> Self {
        Self { recorder }
    }
}

impl CounterSource for InputSource {
    fn name(&self) -> &str {
        names::SOURCE_INPUT
    }

    fn sample(&self) -> Result<SourceReading> {
        Ok(self.recorder.read())
    }
}
