//! Infrastructure layer: collaborators, engine wiring, cache, config.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod sources;


pub use cache::CachedStockEngine;
pub use config::EngineConfig;
pub use engine::{SimulationOverlay, StockComparison, StockEngine, StockQuery};
pub use error::EngineError;
