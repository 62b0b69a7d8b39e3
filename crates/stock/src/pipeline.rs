//! End-to-end computations over already materialized inputs.

use std::collections::BTreeSet;

use railstock_core::{Location, StockResult};
use railstock_ledger::{CorrectionEvent, MovementRecord};

use crate::accumulator::{StockPoint, accumulate};
use crate::corrections::apply_corrections;
use crate::normalizer::{DEFAULT_BATCH_SIZE, Normalizer};
use crate::partition::{ArrivalStatusPolicy, PartitionScheme};

/// Knobs shared by every computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSettings {
    /// Locations whose stock is split into empty and full wagons.
    pub partitioned_locations: BTreeSet<Location>,
    pub arrival_policy: ArrivalStatusPolicy,
    pub batch_size: usize,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            partitioned_locations: [Location::new("AMB")].into_iter().collect(),
            arrival_policy: ArrivalStatusPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl StockSettings {
    pub fn scheme_for(&self, target: Option<&Location>) -> PartitionScheme {
        PartitionScheme::for_target(target, &self.partitioned_locations, self.arrival_policy)
    }
}

/// Base stock series from a movement ledger.
///
/// With `location` set, runs that do not touch it are ignored.
pub fn compute_base_stock(
    movements: &[MovementRecord],
    location: Option<&Location>,
    settings: &StockSettings,
) -> StockResult<Vec<StockPoint>> {
    let scheme = settings.scheme_for(location);
    let mut normalizer = Normalizer::new(scheme).with_batch_size(settings.batch_size);
    normalizer.extend(movements.iter().filter(|r| location.is_none_or(|l| r.touches(l))))?;
    let events = normalizer.finish();
    Ok(accumulate(&events, location))
}

/// Base stock with `corrections` overlaid.
pub fn compute_corrected_stock(
    movements: &[MovementRecord],
    corrections: &[CorrectionEvent],
    location: Option<&Location>,
    settings: &StockSettings,
) -> StockResult<Vec<StockPoint>> {
    let base = compute_base_stock(movements, location, settings)?;
    let relevant: Vec<CorrectionEvent> = corrections
        .iter()
        .filter(|c| location.is_none_or(|l| &c.location == l))
        .cloned()
        .collect();
    Ok(apply_corrections(&base, &relevant, settings.scheme_for(location)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::PointOrigin;
    use chrono::{DateTime, TimeZone, Utc};
    use railstock_core::{CorrectionId, TrainId};
    use railstock_ledger::{MovementKind, WagonStatus};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, h, 0, 0).unwrap()
    }

    fn ledger() -> Vec<MovementRecord> {
        vec![
            MovementRecord {
                train_id: TrainId::new("A"),
                departure_point: Location::new("X"),
                arrival_point: Location::new("AMB"),
                departure_time: Some(at(8)),
                arrival_time: Some(at(10)),
                wagon_count: 5,
                movement_kind: MovementKind::EmptyEvac,
            },
            MovementRecord {
                train_id: TrainId::new("B"),
                departure_point: Location::new("AMB"),
                arrival_point: Location::new("X"),
                departure_time: Some(at(14)),
                arrival_time: None,
                wagon_count: 3,
                movement_kind: MovementKind::Full,
            },
        ]
    }

    #[test]
    fn base_stock_for_plain_location_is_flat() {
        let x = Location::new("X");
        let points = compute_base_stock(&ledger(), Some(&x), &StockSettings::default()).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!((points[0].timestamp, points[0].count, points[0].status), (at(8), -5, None));
    }

    #[test]
    fn base_stock_for_partitioned_location_is_split() {
        let amb = Location::new("AMB");
        let points = compute_base_stock(&ledger(), Some(&amb), &StockSettings::default()).unwrap();
        let full: Vec<_> = points
            .iter()
            .filter(|p| p.status == Some(WagonStatus::Full))
            .map(|p| p.count)
            .collect();
        assert_eq!(full, vec![5, 2]);
    }

    #[test]
    fn unrelated_unmapped_run_does_not_fail_partitioned_location() {
        let amb = Location::new("AMB");
        let mut records = ledger();
        records.push(MovementRecord {
            train_id: TrainId::new("N"),
            departure_point: Location::new("X"),
            arrival_point: Location::new("Y"),
            departure_time: Some(at(9)),
            arrival_time: Some(at(11)),
            wagon_count: 4,
            movement_kind: MovementKind::Unrecognized("Navette".into()),
        });

        let points = compute_base_stock(&records, Some(&amb), &StockSettings::default()).unwrap();
        assert!(points.iter().all(|p| p.location == amb));
        assert!(compute_base_stock(&records, None, &StockSettings::default()).is_ok());

        records[0].movement_kind = MovementKind::Unrecognized("Navette".into());
        assert!(compute_base_stock(&records, Some(&amb), &StockSettings::default()).is_err());
    }

    #[test]
    fn corrections_for_other_locations_are_ignored_when_filtered() {
        let x = Location::new("X");
        let elsewhere = CorrectionEvent {
            id: CorrectionId::new(),
            location: Location::new("Y"),
            event_time: at(9),
            wagon_delta: 50,
            relative: true,
            comment: "recount".into(),
            wagon_status: None,
        };
        let points = compute_corrected_stock(&ledger(), &[elsewhere], Some(&x), &StockSettings::default()).unwrap();
        assert!(points.iter().all(|p| p.origin == PointOrigin::Movement));
        assert!(points.iter().all(|p| p.location == x));
    }
}
