use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use railstock_core::{Location, TrainId};
use railstock_ledger::WagonStatus;

use crate::partition::PartitionKey;

/// Which end of a run produced a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Departure,
    Arrival,
}

/// Signed stock change at one location, derived from one end of a run.
///
/// Departures carry `-wagon_count`, arrivals `+wagon_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEvent {
    pub timestamp: DateTime<Utc>,
    pub location: Location,
    pub status: Option<WagonStatus>,
    pub train_id: TrainId,
    pub direction: Direction,
    pub delta: i64,
}

/// Identity of a stock event; two events with the same key are duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    timestamp: DateTime<Utc>,
    location: Location,
    train_id: TrainId,
    direction: Direction,
    status: Option<WagonStatus>,
}

impl StockEvent {
    pub fn key(&self) -> EventKey {
        EventKey {
            timestamp: self.timestamp,
            location: self.location.clone(),
            train_id: self.train_id.clone(),
            direction: self.direction,
            status: self.status,
        }
    }

    pub fn partition(&self) -> PartitionKey {
        PartitionKey {
            location: self.location.clone(),
            status: self.status,
        }
    }
}
