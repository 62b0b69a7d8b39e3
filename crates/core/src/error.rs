//! Stock computation error model.

use thiserror::Error;

/// Result type used across the stock engine.
pub type StockResult<T> = Result<T, StockError>;

/// Engine-level error.
///
/// Degenerate inputs (empty ledgers, records without timestamps) are not errors:
/// they degrade to empty or partial series. Only failures that would silently
/// change the computed stock are reported here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A movement kind has no wagon-status mapping while the stock is split by
    /// status. Defaulting it would change which corrections apply.
    #[error("movement kind '{kind}' of train {train_id} has no wagon status mapping")]
    UnmappedMovementKind { train_id: String, kind: String },

    /// A value failed validation (e.g. an unknown label).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl StockError {
    pub fn unmapped_kind(train_id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnmappedMovementKind {
            train_id: train_id.into(),
            kind: kind.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// True for errors that point at bad ledger data rather than bad caller input.
    pub fn is_data_quality(&self) -> bool {
        matches!(self, Self::UnmappedMovementKind { .. })
    }
}
