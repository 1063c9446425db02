// Single-slot handoff of the latest aggregate from the producer to consumers.
// Publish swaps an Arc pointer; readers get the whole previous or whole next
// aggregate, never a mix.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, SamplerError};
use crate::models::MetricsAggregate;

#[derive(Default)]
pub struct PublicationBridge {
    latest: ArcSwapOption<MetricsAggregate>,
    published: AtomicU64,
}

impl PublicationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites whatever is published. Never blocks, never queues.
    pub fn publish(&self, aggregate: MetricsAggregate) {
        self.latest.store(Some(Arc::new(aggregate)));
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Latest aggregate, or `NotYetAvailable` before the first publish.
    pub fn read_latest(&self) -> Result<Arc<MetricsAggregate>> {
        self.latest.load_full().ok_or(SamplerError::NotYetAvailable)
    }

    pub fn publish_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
