use async_trait::async_trait;
use showreel_model::ProgressRecord;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history service rejected the record: HTTP {status}")]
    Rejected { status: u16 },

    #[error("history service unreachable: {0}")]
    Transport(String),
}

/// Destination for watch-progress checkpoints.
///
/// Delivery is best effort. The session logs failures and never retries.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record_progress(
        &self,
        record: ProgressRecord,
    ) -> Result<(), HistoryError>;
}
