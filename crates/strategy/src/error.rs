use inventory_store::StoreError;
use thiserror::Error;

/// Errors surfaced by a single order submission.
///
/// Each value is attributable to exactly one submission attempt; the
/// harness records them per attempt and never merges them.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Remaining stock cannot cover the requested quantity. This is the
    /// expected terminal condition once stock drains, not a defect.
    #[error("insufficient stock for goods {goods_id}: requested {requested}, remaining {remaining}")]
    InsufficientStock {
        goods_id: String,
        requested: u32,
        remaining: u32,
    },

    /// The conditional update lost the race every time within the retry
    /// budget.
    #[error("conditional update for goods {goods_id} lost the race after {attempts} attempts")]
    Conflict { goods_id: String, attempts: u32 },

    /// The exclusive row lock could not be acquired within the bound.
    /// Surfaced as-is; the strategy does not retry it.
    #[error("row lock timed out for goods {goods_id}")]
    LockTimeout { goods_id: String },

    /// The store could not be reached.
    #[error("inventory store unavailable: {0}")]
    Unavailable(StoreError),
}

impl From<StoreError> for SubmitError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::LockTimeout { goods_id } => SubmitError::LockTimeout { goods_id },
            other => SubmitError::Unavailable(other),
        }
    }
}

impl SubmitError {
    /// Stable label for logs and aggregation.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::InsufficientStock { .. } => "insufficient-stock",
            SubmitError::Conflict { .. } => "conflict",
            SubmitError::LockTimeout { .. } => "lock-timeout",
            SubmitError::Unavailable(_) => "unavailable",
        }
    }
}

/// Result type for submission operations.
pub type Result<T> = std::result::Result<T, SubmitError>;
