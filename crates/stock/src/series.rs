//! Queries over computed stock series.
//!
//! Series are step functions: the stock holds its last value until the next
//! point. All helpers expect points ordered by time within each partition, as
//! produced by [`accumulate`](crate::accumulate) and
//! [`apply_corrections`](crate::apply_corrections).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::accumulator::StockPoint;
use crate::partition::PartitionKey;

/// Stock of one partition at instant `t` (0 before its first point).
pub fn value_at(points: &[StockPoint], key: &PartitionKey, t: DateTime<Utc>) -> i64 {
    points
        .iter()
        .filter(|p| p.timestamp <= t && p.location == key.location && p.status == key.status)
        .last()
        .map(|p| p.count)
        .unwrap_or(0)
}

/// Points with `from <= timestamp <= to`.
pub fn within(points: &[StockPoint], from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<StockPoint> {
    points
        .iter()
        .filter(|p| p.timestamp >= from && p.timestamp <= to)
        .cloned()
        .collect()
}

/// Final stock of every partition.
pub fn latest_by_partition(points: &[StockPoint]) -> BTreeMap<PartitionKey, i64> {
    points.iter().map(|p| (p.partition(), p.count)).collect()
}

/// Distinct partitions present in `points`.
pub fn partitions(points: &[StockPoint]) -> BTreeSet<PartitionKey> {
    points.iter().map(StockPoint::partition).collect()
}
