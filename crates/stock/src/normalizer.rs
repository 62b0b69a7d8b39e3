//! Movement records → deduplicated stock events.

use std::collections::HashSet;

use railstock_core::StockResult;
use railstock_ledger::MovementRecord;

use crate::event::{Direction, EventKey, StockEvent};
use crate::partition::PartitionScheme;

/// Default number of records converted per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Incremental normalizer.
///
/// Records are converted in batches of `batch_size`; each batch is merged into
/// the output with first-occurrence deduplication. Batch size bounds the
/// transient buffer only and never changes the output.
#[derive(Debug)]
pub struct Normalizer {
    scheme: PartitionScheme,
    batch_size: usize,
    seen: HashSet<EventKey>,
    events: Vec<StockEvent>,
    duplicates: usize,
}

impl Normalizer {
    pub fn new(scheme: PartitionScheme) -> Self {
        Self {
            scheme,
            batch_size: DEFAULT_BATCH_SIZE,
            seen: HashSet::new(),
            events: Vec::new(),
            duplicates: 0,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Convert and merge records.
    ///
    /// Stops at the first record whose kind cannot be mapped under the scheme;
    /// events already merged are kept.
    pub fn extend<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a MovementRecord>,
    ) -> StockResult<()> {
        let mut batch = Vec::with_capacity(self.batch_size.saturating_mul(2));
        let mut in_batch = 0usize;

        for record in records {
            emit(record, self.scheme, &mut batch)?;
            in_batch += 1;
            if in_batch == self.batch_size {
                self.merge(&mut batch);
                in_batch = 0;
            }
        }
        self.merge(&mut batch);
        Ok(())
    }

    /// Number of duplicate events dropped so far.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn finish(self) -> Vec<StockEvent> {
        tracing::debug!(
            events = self.events.len(),
            duplicates = self.duplicates,
            "normalized movement records"
        );
        self.events
    }

    fn merge(&mut self, batch: &mut Vec<StockEvent>) {
        for event in batch.drain(..) {
            if self.seen.insert(event.key()) {
                self.events.push(event);
            } else {
                self.duplicates += 1;
            }
        }
    }
}

/// Convert records into deduplicated stock events.
pub fn normalize(records: &[MovementRecord], scheme: PartitionScheme) -> StockResult<Vec<StockEvent>> {
    let mut normalizer = Normalizer::new(scheme);
    normalizer.extend(records)?;
    Ok(normalizer.finish())
}

/// Drop events whose key was already seen, keeping the first occurrence.
pub fn dedup(events: impl IntoIterator<Item = StockEvent>) -> Vec<StockEvent> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|e| seen.insert(e.key()))
        .collect()
}

fn emit(record: &MovementRecord, scheme: PartitionScheme, out: &mut Vec<StockEvent>) -> StockResult<()> {
    if let Some(timestamp) = record.departure_time {
        out.push(StockEvent {
            timestamp,
            location: record.departure_point.clone(),
            status: scheme.departure_status(record)?,
            train_id: record.train_id.clone(),
            direction: Direction::Departure,
            delta: -record.wagon_count,
        });
    }

    if let Some(timestamp) = record.arrival_time {
        out.push(StockEvent {
            timestamp,
            location: record.arrival_point.clone(),
            status: scheme.arrival_status(record)?,
            train_id: record.train_id.clone(),
            direction: Direction::Arrival,
            delta: record.wagon_count,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::ArrivalStatusPolicy;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use railstock_core::{Location, TrainId};
    use railstock_ledger::{MovementKind, WagonStatus};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, h, m, 0).unwrap()
    }

    fn run(id: &str, from: &str, to: &str, dep: Option<DateTime<Utc>>, arr: Option<DateTime<Utc>>, n: i64) -> MovementRecord {
        MovementRecord {
            train_id: TrainId::new(id),
            departure_point: Location::new(from),
            arrival_point: Location::new(to),
            departure_time: dep,
            arrival_time: arr,
            wagon_count: n,
            movement_kind: MovementKind::Full,
        }
    }

    #[test]
    fn departure_and_arrival_produce_signed_events() {
        let records = vec![run("A", "X", "Y", Some(at(8, 0)), Some(at(10, 0)), 5)];
        let events = normalize(&records, PartitionScheme::Flat).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].direction, Direction::Departure);
        assert_eq!(events[0].location, "X");
        assert_eq!(events[0].delta, -5);
        assert_eq!(events[1].direction, Direction::Arrival);
        assert_eq!(events[1].location, "Y");
        assert_eq!(events[1].delta, 5);
        assert!(events.iter().all(|e| e.status.is_none()));
    }

    #[test]
    fn record_without_timestamps_contributes_nothing() {
        let records = vec![run("A", "X", "Y", None, None, 5)];
        assert!(normalize(&records, PartitionScheme::Flat).unwrap().is_empty());
    }

    #[test]
    fn identical_departures_collapse_to_one_event() {
        let records = vec![
            run("A", "X", "Y", Some(at(8, 0)), None, 5),
            run("A", "X", "Z", Some(at(8, 0)), None, 7),
        ];
        let mut normalizer = Normalizer::new(PartitionScheme::Flat);
        normalizer.extend(&records).unwrap();
        assert_eq!(normalizer.duplicates(), 1);

        let events = normalizer.finish();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].delta, -5);
    }

    #[test]
    fn negative_wagon_count_passes_through() {
        let records = vec![run("A", "X", "Y", Some(at(8, 0)), None, -3)];
        let events = normalize(&records, PartitionScheme::Flat).unwrap();
        assert_eq!(events[0].delta, 3);
    }

    #[test]
    fn partitioned_events_carry_status() {
        let mut evac = run("E", "GRA", "AMB", Some(at(6, 0)), Some(at(9, 0)), 20);
        evac.movement_kind = MovementKind::EmptyEvac;
        let events = normalize(&[evac], PartitionScheme::ByStatus(ArrivalStatusPolicy::EvacOnly)).unwrap();
        assert_eq!(events[0].status, Some(WagonStatus::Empty));
        assert_eq!(events[1].status, Some(WagonStatus::Full));
    }

    #[test]
    fn unmapped_kind_is_reported_when_partitioned() {
        let mut odd = run("Q", "AMB", "X", Some(at(6, 0)), None, 4);
        odd.movement_kind = MovementKind::Unrecognized("Navette".into());

        assert!(normalize(std::slice::from_ref(&odd), PartitionScheme::Flat).is_ok());
        let err = normalize(&[odd], PartitionScheme::ByStatus(ArrivalStatusPolicy::EvacOnly)).unwrap_err();
        assert!(err.is_data_quality());
    }

    #[test]
    fn batch_size_does_not_change_output() {
        let records: Vec<_> = (0..25)
            .map(|i| run(&format!("T{}", i % 7), "X", "Y", Some(at(8, i % 3)), Some(at(12, i % 5)), i as i64))
            .collect();

        let whole = normalize(&records, PartitionScheme::Flat).unwrap();
        for size in [1, 2, 7, 1000] {
            let mut normalizer = Normalizer::new(PartitionScheme::Flat).with_batch_size(size);
            normalizer.extend(&records).unwrap();
            assert_eq!(normalizer.finish(), whole, "batch size {size}");
        }
    }

    fn arb_record() -> impl Strategy<Value = MovementRecord> {
        (
            0u8..4,
            prop::sample::select(vec!["X", "Y", "AMB"]),
            prop::sample::select(vec!["X", "Y", "AMB"]),
            prop::option::of(0u32..6),
            prop::option::of(0u32..6),
            0i64..40,
        )
            .prop_map(|(id, from, to, dep, arr, n)| {
                run(&format!("T{id}"), from, to, dep.map(|h| at(h, 0)), arr.map(|h| at(h + 6, 0)), n)
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Deduplicating an already normalized stream changes nothing, and
        /// normalizing the ledger twice over yields the same event set.
        #[test]
        fn dedup_is_idempotent(records in prop::collection::vec(arb_record(), 0..30)) {
            let once = normalize(&records, PartitionScheme::Flat).unwrap();
            prop_assert_eq!(dedup(once.clone()), once.clone());

            let doubled: Vec<_> = records.iter().chain(records.iter()).cloned().collect();
            prop_assert_eq!(normalize(&doubled, PartitionScheme::Flat).unwrap(), once);
        }
    }
}
