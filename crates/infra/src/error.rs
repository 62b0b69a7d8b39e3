use thiserror::Error;

use railstock_core::StockError;

use crate::sources::SourceError;

/// Failure of an engine call: either the data itself or a collaborator.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl EngineError {
    /// True when the ledger content, not the storage, caused the failure.
    pub fn is_data_quality(&self) -> bool {
        match self {
            EngineError::Stock(err) => err.is_data_quality(),
            EngineError::Source(_) => false,
        }
    }
}
