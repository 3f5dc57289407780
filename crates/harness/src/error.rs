use inventory_store::StoreError;
use thiserror::Error;

/// Errors raised by the harness itself, as opposed to per-attempt
/// submission failures, which are recorded as outcomes.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Run configuration rejected before any worker started.
    #[error("invalid run parameter: {0}")]
    InvalidParameter(String),

    /// A worker task panicked before finishing its assigned attempts.
    #[error("worker {worker} panicked before completing its submissions")]
    WorkerPanic { worker: usize },
}

pub type Result<T> = std::result::Result<T, HarnessError>;

/// End-state verdicts from the result validator.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("final stock {actual} does not match expected {expected}")]
    StockMismatch { expected: u32, actual: u32 },

    #[error("final sales {actual} does not match expected {expected}")]
    SalesMismatch { expected: u32, actual: u32 },

    /// stock + sales drifted from the seeded sum. No strategy, not even
    /// the unguarded one, is allowed to do this.
    #[error("stock + sales changed from {initial_total} to {final_total}")]
    InvariantViolated {
        initial_total: u64,
        final_total: u64,
    },

    /// The unguarded baseline ended exactly correct, so the run produced
    /// no lost-update evidence.
    #[error("unguarded run ended at the exact expected stock {expected_stock}; lost update not reproduced")]
    LostUpdateNotReproduced { expected_stock: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
