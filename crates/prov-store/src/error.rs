//! Store error types.

use thiserror::Error;

/// Errors from document-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional write or scoped lookup targeted a record that does
    /// not exist (or is not visible to the caller).
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Record family ("product", "order", ...).
        entity: &'static str,
        /// The missing key, for diagnostics.
        key: String,
    },

    /// An inventory adjustment would drive the quantity below zero.
    #[error("insufficient inventory: available {available}, requested {requested}")]
    InsufficientInventory {
        available: i64,
        requested: i64,
    },

    /// A stored value could not be decoded into its domain type.
    #[error("corrupt stored record: {0}")]
    Corrupt(String),

    /// The backend itself failed (connection, query, constraint).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
