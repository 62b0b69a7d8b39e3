//! Wagon stock computation engine.
//!
//! Pure, deterministic transformations (no IO, no storage):
//!
//! 1. [`normalizer`]: movement records → deduplicated signed stock events
//! 2. [`accumulator`]: stock events → cumulative series per partition
//! 3. [`corrections`]: manual corrections overlaid with forward propagation
//! 4. [`simulation`]: what-if ledger edits replayed before recomputation
//!
//! Every call works on its own copies; callers' collections are never mutated.

pub mod accumulator;
pub mod corrections;
pub mod event;
pub mod normalizer;
pub mod partition;
pub mod pipeline;
pub mod series;
pub mod simulation;

pub use accumulator::{PointOrigin, StockPoint, accumulate};
pub use corrections::apply_corrections;
pub use event::{Direction, StockEvent};
pub use normalizer::{Normalizer, dedup, normalize};
pub use partition::{ArrivalStatusPolicy, PartitionKey, PartitionScheme};
pub use pipeline::{StockSettings, compute_base_stock, compute_corrected_stock};
pub use simulation::{replay_simulation, synthetic_train_id};
