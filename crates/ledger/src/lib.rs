//! Ledger records exchanged with the stock engine.
//!
//! Movement records, corrections and simulation events are owned by external
//! collaborators (storage, import, forms). This crate defines their shape and a
//! few pure helpers over them; it performs no IO.

pub mod correction;
pub mod movement;
pub mod query;
pub mod resolution;
pub mod simulation;
pub mod status;

pub use correction::{CorrectionEvent, NewCorrection};
pub use movement::{MovementKind, MovementRecord};
pub use resolution::{LedgerRow, LocationAliases};
pub use simulation::{ModificationType, Simulation, SimulationEvent, SimulationSummary};
pub use status::WagonStatus;
