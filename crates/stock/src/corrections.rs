//! Manual corrections overlaid on a stock series.

use std::collections::BTreeMap;

use railstock_ledger::CorrectionEvent;

use crate::accumulator::{PointOrigin, StockPoint};
use crate::partition::{PartitionKey, PartitionScheme};

/// Overlay `corrections` on `base`, returning a new series.
///
/// Corrections are routed to series by `scheme` and applied per series in
/// chronological order. Each one reads the stock just before its timestamp
/// (including earlier corrections), shifts every later point, and adds a
/// synthetic point carrying the corrected value. Series without corrections
/// come back unchanged; corrections on a series with no points start from 0.
///
/// The result is ordered by `(location, timestamp)`; a synthetic point comes
/// after earlier corrections and before ledger points sharing its timestamp.
pub fn apply_corrections(
    base: &[StockPoint],
    corrections: &[CorrectionEvent],
    scheme: PartitionScheme,
) -> Vec<StockPoint> {
    let mut series: BTreeMap<PartitionKey, Vec<StockPoint>> = BTreeMap::new();
    for point in base {
        series.entry(point.partition()).or_default().push(point.clone());
    }
    for points in series.values_mut() {
        points.sort_by_key(|p| p.timestamp);
    }

    let mut routed: BTreeMap<PartitionKey, Vec<&CorrectionEvent>> = BTreeMap::new();
    for correction in corrections {
        match scheme.correction_key(correction) {
            Some(key) => routed.entry(key).or_default().push(correction),
            None => tracing::warn!(
                correction_id = %correction.id,
                location = %correction.location,
                "correction has no wagon status for a status-split location; skipped"
            ),
        }
    }

    let mut applied = 0usize;
    for (key, mut pending) in routed {
        pending.sort_by_key(|c| c.event_time);
        let points = series.entry(key.clone()).or_default();
        for correction in pending {
            apply_one(points, &key, correction);
            applied += 1;
        }
    }
    tracing::debug!(applied, "applied stock corrections");

    let mut out: Vec<StockPoint> = series.into_values().flatten().collect();
    out.sort_by(|a, b| (&a.location, a.timestamp).cmp(&(&b.location, b.timestamp)));
    out
}

fn apply_one(points: &mut Vec<StockPoint>, key: &PartitionKey, correction: &CorrectionEvent) {
    // Earlier corrections at the same instant sit ahead of ledger points there.
    let mut split = points.partition_point(|p| p.timestamp < correction.event_time);
    while points
        .get(split)
        .is_some_and(|p| p.timestamp == correction.event_time && p.origin == PointOrigin::Correction)
    {
        split += 1;
    }
    let before = split.checked_sub(1).map(|i| points[i].count).unwrap_or(0);

    let (corrected, shift) = if correction.relative {
        (before + correction.wagon_delta, correction.wagon_delta)
    } else {
        (correction.wagon_delta, correction.wagon_delta - before)
    };

    for point in &mut points[split..] {
        point.count += shift;
    }

    points.insert(
        split,
        StockPoint {
            timestamp: correction.event_time,
            location: key.location.clone(),
            status: key.status,
            count: corrected,
            origin: PointOrigin::Correction,
        },
    );
}
