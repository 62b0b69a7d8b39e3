//! Replay of simulation events over a movement ledger.

use railstock_core::{Location, TrainId};
use railstock_ledger::{ModificationType, MovementKind, MovementRecord, SimulationEvent};

/// Train id given to a run added by a simulation.
///
/// Derived from the route and departure date only, so replaying the same
/// simulation always yields the same ids.
pub fn synthetic_train_id(event: &SimulationEvent) -> TrainId {
    let date = event
        .departure_time
        .map(|t| t.format("%Y%m%d").to_string())
        .unwrap_or_else(|| "nodate".to_string());
    let point = |p: &Option<Location>| p.as_ref().map(Location::as_str).unwrap_or("?").to_string();
    TrainId::new(format!(
        "SIM-{}-{}-{}",
        point(&event.departure_point),
        point(&event.arrival_point),
        date
    ))
}

/// Apply `events`, in order, to a copy of `movements`.
///
/// - `Added` appends a synthesized run.
/// - `Deleted` removes every run with the event's train id.
/// - `Modified` overwrites route, times, wagon count and kind of every run
///   with the event's train id.
///
/// The result is sorted by departure time (runs without one last) and, when
/// `location` is set, restricted to runs touching it. Without events the
/// ledger order is kept.
pub fn replay_simulation(
    movements: &[MovementRecord],
    location: Option<&Location>,
    events: &[SimulationEvent],
) -> Vec<MovementRecord> {
    let mut ledger = movements.to_vec();

    for event in events {
        match event.modification_type {
            ModificationType::Added => match synthesize(event) {
                Some(record) => ledger.push(record),
                None => tracing::warn!(
                    simulation_id = %event.simulation_id,
                    "added run lacks a route or wagon count; skipped"
                ),
            },
            ModificationType::Deleted => match &event.train_id {
                Some(train_id) => ledger.retain(|r| &r.train_id != train_id),
                None => tracing::warn!(
                    simulation_id = %event.simulation_id,
                    "deletion without train id; skipped"
                ),
            },
            ModificationType::Modified => match &event.train_id {
                Some(train_id) => {
                    for record in ledger.iter_mut().filter(|r| &r.train_id == train_id) {
                        overwrite(record, event);
                    }
                }
                None => tracing::warn!(
                    simulation_id = %event.simulation_id,
                    "modification without train id; skipped"
                ),
            },
        }
    }

    if !events.is_empty() {
        ledger.sort_by_key(|r| (r.departure_time.is_none(), r.departure_time));
    }

    if let Some(location) = location {
        ledger.retain(|r| r.touches(location));
    }

    tracing::debug!(
        events = events.len(),
        records = ledger.len(),
        "replayed simulation"
    );
    ledger
}

fn synthesize(event: &SimulationEvent) -> Option<MovementRecord> {
    Some(MovementRecord {
        train_id: synthetic_train_id(event),
        departure_point: event.departure_point.clone()?,
        arrival_point: event.arrival_point.clone()?,
        departure_time: event.departure_time,
        arrival_time: event.arrival_time,
        wagon_count: event.wagon_count?,
        movement_kind: MovementKind::from_empty_flag(event.is_empty),
    })
}

fn overwrite(record: &mut MovementRecord, event: &SimulationEvent) {
    if let Some(point) = &event.departure_point {
        record.departure_point = point.clone();
    }
    if let Some(point) = &event.arrival_point {
        record.arrival_point = point.clone();
    }
    record.departure_time = event.departure_time;
    record.arrival_time = event.arrival_time;
    if let Some(count) = event.wagon_count {
        record.wagon_count = count;
    }
    record.movement_kind = MovementKind::from_empty_flag(event.is_empty);
}
