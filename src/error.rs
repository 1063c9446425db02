// Sampler error taxonomy. Everything here is recovered inside a tick.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SamplerError {
    /// Snapshot timestamp is not strictly after the latest stored one.
    #[error("out-of-order sample: timestamp is {behind_ms} ms at or before the latest sample")]
    OutOfOrderSample { behind_ms: u64 },

    #[error("sample window is empty")]
    WindowEmpty,

    /// Zero or negative elapsed time between two snapshots.
    #[error("degenerate interval between snapshots")]
    DegenerateInterval,

    #[error("counter {0:?} missing from snapshot")]
    MissingCounter(String),

    #[error("source {source_name:?} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("no aggregate published yet")]
    NotYetAvailable,
}

impl SamplerError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SamplerError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SamplerError>;
