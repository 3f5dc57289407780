use thiserror::Error;

/// Errors raised by inventory store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The goods row does not exist.
    #[error("goods row not found: {0}")]
    RowNotFound(String),

    /// An exclusive row lock could not be acquired within the bound.
    #[error("row lock timed out for goods {goods_id}")]
    LockTimeout { goods_id: String },

    /// The store could not be reached.
    #[error("inventory store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
