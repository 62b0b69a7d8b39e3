use std::sync::Arc;

use thiserror::Error;

use railstock_core::{Location, SimulationId};
use railstock_ledger::{CorrectionEvent, MovementRecord, SimulationEvent};

/// Collaborator (storage) failure.
///
/// These are **infrastructure errors**, as opposed to the data-quality errors
/// reported by the stock engine itself. Retrying is the caller's decision.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl SourceError {
    pub(crate) fn poisoned() -> Self {
        SourceError::Unavailable("lock poisoned".to_string())
    }
}

/// Read access to the movement ledger.
///
/// With a location, returns only runs departing from or arriving at it.
pub trait MovementSource: Send + Sync {
    fn fetch_movements(&self, location: Option<&Location>) -> Result<Vec<MovementRecord>, SourceError>;
}

/// Read access to manual corrections.
pub trait CorrectionStore: Send + Sync {
    /// Corrections, optionally for one location only (any order).
    fn fetch_corrections(&self, location: Option<&Location>) -> Result<Vec<CorrectionEvent>, SourceError>;

    /// Monotonic revision of the correction set, bumped on every write.
    fn version(&self) -> u64;
}

/// Read access to simulation overlays.
pub trait SimulationStore: Send + Sync {
    /// Events of one simulation, in the order they were recorded.
    fn fetch_simulation_events(&self, simulation_id: SimulationId) -> Result<Vec<SimulationEvent>, SourceError>;
}

impl<S> MovementSource for Arc<S>
where
    S: MovementSource + ?Sized,
{
    fn fetch_movements(&self, location: Option<&Location>) -> Result<Vec<MovementRecord>, SourceError> {
        (**self).fetch_movements(location)
    }
}

impl<S> CorrectionStore for Arc<S>
where
    S: CorrectionStore + ?Sized,
{
    fn fetch_corrections(&self, location: Option<&Location>) -> Result<Vec<CorrectionEvent>, SourceError> {
        (**self).fetch_corrections(location)
    }

    fn version(&self) -> u64 {
        (**self).version()
    }
}

impl<S> SimulationStore for Arc<S>
where
    S: SimulationStore + ?Sized,
{
    fn fetch_simulation_events(&self, simulation_id: SimulationId) -> Result<Vec<SimulationEvent>, SourceError> {
        (**self).fetch_simulation_events(simulation_id)
    }
}
