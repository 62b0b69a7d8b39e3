use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use railstock_core::{Location, SimulationId, StockError, TrainId};

/// What a simulation event does to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationType {
    Added,
    Modified,
    Deleted,
}

impl FromStr for ModificationType {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "added" => Ok(ModificationType::Added),
            "modified" => Ok(ModificationType::Modified),
            "deleted" => Ok(ModificationType::Deleted),
            other => Err(StockError::validation(format!("unknown modification type '{other}'"))),
        }
    }
}

/// One hypothetical ledger edit within a simulation.
///
/// `train_id` is absent for `Added` (the replay synthesizes one) and references
/// an existing ledger train for `Modified` / `Deleted`. Deleted events still
/// carry the removed train's fields for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub simulation_id: SimulationId,
    pub modification_type: ModificationType,
    pub train_id: Option<TrainId>,
    pub departure_point: Option<Location>,
    pub arrival_point: Option<Location>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub wagon_count: Option<i64>,
    pub is_empty: bool,
}

/// Simulation header (the events live in their own ordered list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub id: SimulationId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

/// Counts of edits per modification type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl SimulationSummary {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a SimulationEvent>) -> Self {
        events
            .into_iter()
            .fold(Self::default(), |mut acc, e| {
                match e.modification_type {
                    ModificationType::Added => acc.added += 1,
                    ModificationType::Modified => acc.modified += 1,
                    ModificationType::Deleted => acc.deleted += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted
    }
}
