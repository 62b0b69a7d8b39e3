//! Read-only helpers over a materialized movement ledger.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use railstock_core::Location;

use crate::movement::MovementRecord;

/// Distinct departure and arrival points, sorted.
pub fn locations(records: &[MovementRecord]) -> Vec<Location> {
    records
        .iter()
        .flat_map(|r| [&r.departure_point, &r.arrival_point])
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Span covered by the ledger: earliest departure and latest arrival.
///
/// `None` when the ledger has no departure or no arrival at all.
pub fn date_range(records: &[MovementRecord]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = records.iter().filter_map(|r| r.departure_time).min()?;
    let last = records.iter().filter_map(|r| r.arrival_time).max()?;
    Some((first, last))
}

/// Records departing or arriving within `[from, to]`.
pub fn touching_window(
    records: &[MovementRecord],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<MovementRecord> {
    let within = |t: Option<DateTime<Utc>>| t.is_some_and(|t| t >= from && t <= to);
    records
        .iter()
        .filter(|r| within(r.departure_time) || within(r.arrival_time))
        .cloned()
        .collect()
}

/// Records departing from or arriving at `location`.
pub fn involving(records: &[MovementRecord], location: &Location) -> Vec<MovementRecord> {
    records.iter().filter(|r| r.touches(location)).cloned().collect()
}
