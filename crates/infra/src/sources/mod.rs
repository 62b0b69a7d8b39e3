//! Collaborator boundary: where the engine's inputs come from.
//!
//! The engine only reads through these traits. Writing (imports, correction
//! forms, simulation editing) belongs to the concrete stores.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryCorrectionStore, InMemoryLedger, InMemorySimulationStore};
pub use r#trait::{CorrectionStore, MovementSource, SimulationStore, SourceError};
