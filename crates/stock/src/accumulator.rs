//! Stock events → cumulative stock series.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use railstock_core::Location;
use railstock_ledger::WagonStatus;

use crate::event::StockEvent;
use crate::partition::PartitionKey;

/// Where a stock point comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointOrigin {
    /// A departure or arrival from the ledger.
    Movement,
    /// Synthesized by a manual correction.
    Correction,
}

/// Cumulative wagon count of one series after one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPoint {
    pub timestamp: DateTime<Utc>,
    pub location: Location,
    pub status: Option<WagonStatus>,
    pub count: i64,
    pub origin: PointOrigin,
}

impl StockPoint {
    pub fn partition(&self) -> PartitionKey {
        PartitionKey {
            location: self.location.clone(),
            status: self.status,
        }
    }
}

/// Running sum of `events` per partition.
///
/// One point is emitted per event. Within a partition events are ordered by
/// timestamp, ties keeping input order, so only the stepwise trace at a shared
/// timestamp depends on input order. Output is ordered by
/// `(location, status, timestamp)`. With `location` set, only that location's
/// series are returned. Counts are not clamped at zero.
pub fn accumulate(events: &[StockEvent], location: Option<&Location>) -> Vec<StockPoint> {
    let mut partitions: BTreeMap<PartitionKey, Vec<&StockEvent>> = BTreeMap::new();
    for event in events {
        if location.is_some_and(|l| &event.location != l) {
            continue;
        }
        partitions.entry(event.partition()).or_default().push(event);
    }

    let mut points = Vec::with_capacity(partitions.values().map(Vec::len).sum());
    for (key, mut series) in partitions {
        series.sort_by_key(|e| e.timestamp);

        let mut running = 0i64;
        for event in series {
            running += event.delta;
            points.push(StockPoint {
                timestamp: event.timestamp,
                location: key.location.clone(),
                status: key.status,
                count: running,
                origin: PointOrigin::Movement,
            });
        }
    }

    points
}
