//! `railstock-core`: shared building blocks for the wagon stock engine.
//!
//! This crate contains **pure** primitives (identifiers, location labels, the
//! error model). No storage or logging concerns live here.

pub mod error;
pub mod id;
pub mod location;

pub use error::{StockError, StockResult};
pub use id::{CorrectionId, SimulationId, TrainId};
pub use location::Location;
