//! Resolution of planning rows into movement records.
//!
//! Planning exports carry up to three generations of each value: the
//! theoretical plan, a rescheduled plan and the realised value. The ledger keeps
//! only the most reliable one: actual, then rescheduled, then scheduled.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use railstock_core::{Location, TrainId};

use crate::movement::{MovementKind, MovementRecord};

/// A raw planning row, before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub train_id: String,
    pub departure_point: String,
    pub arrival_point: String,
    pub scheduled_departure: Option<DateTime<Utc>>,
    pub rescheduled_departure: Option<DateTime<Utc>>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub scheduled_arrival: Option<DateTime<Utc>>,
    pub rescheduled_arrival: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub theoretical_wagons: Option<i64>,
    pub committed_wagons: Option<i64>,
    pub actual_wagons: Option<i64>,
    /// Sheet label ("Chargés", "Vides", "Appro", "Evac").
    pub kind: String,
}

impl LedgerRow {
    pub fn departure_time(&self) -> Option<DateTime<Utc>> {
        self.actual_departure
            .or(self.rescheduled_departure)
            .or(self.scheduled_departure)
    }

    pub fn arrival_time(&self) -> Option<DateTime<Utc>> {
        self.actual_arrival
            .or(self.rescheduled_arrival)
            .or(self.scheduled_arrival)
    }

    /// Actual, then committed, then theoretical wagon count (0 when unknown).
    pub fn wagon_count(&self) -> i64 {
        self.actual_wagons
            .or(self.committed_wagons)
            .or(self.theoretical_wagons)
            .unwrap_or(0)
    }

    pub fn resolve(&self, aliases: &LocationAliases) -> MovementRecord {
        MovementRecord {
            train_id: TrainId::new(self.train_id.trim()),
            departure_point: aliases.canonical(&self.departure_point),
            arrival_point: aliases.canonical(&self.arrival_point),
            departure_time: self.departure_time(),
            arrival_time: self.arrival_time(),
            wagon_count: self.wagon_count(),
            movement_kind: MovementKind::from_label(&self.kind),
        }
    }
}

/// Folds site codes that are operated as one yard into a single location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationAliases(BTreeMap<String, Location>);

impl LocationAliases {
    pub fn none() -> Self {
        Self(BTreeMap::new())
    }

    /// Map every code in `codes` to `group`.
    pub fn with_group(mut self, group: &str, codes: &[&str]) -> Self {
        for code in codes {
            self.0.insert((*code).to_string(), Location::new(group));
        }
        self
    }

    pub fn canonical(&self, label: &str) -> Location {
        let label = label.trim();
        self.0
            .get(label)
            .cloned()
            .unwrap_or_else(|| Location::new(label))
    }
}

impl Default for LocationAliases {
    fn default() -> Self {
        Self::none().with_group("VO-GRA-RIO", &["VO", "GRA", "RIO"])
    }
}
