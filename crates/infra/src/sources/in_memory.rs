//! In-memory collaborators.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use railstock_core::{CorrectionId, Location, SimulationId};
use railstock_ledger::{
    CorrectionEvent, LedgerRow, LocationAliases, MovementRecord, NewCorrection, Simulation,
    SimulationEvent, SimulationSummary,
};

use super::r#trait::{CorrectionStore, MovementSource, SimulationStore, SourceError};

/// In-memory movement ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: RwLock<Vec<MovementRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MovementRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Load a batch of runs, replacing the days it covers.
    ///
    /// Every stored run whose departure falls within the batch's departure span
    /// is dropped first, then the batch is appended. Returns the number of
    /// runs removed.
    pub fn replace_window(&self, batch: Vec<MovementRecord>) -> Result<usize, SourceError> {
        let span = batch
            .iter()
            .filter_map(|r| r.departure_time)
            .fold(None, |acc: Option<(_, _)>, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            });

        let mut records = self.records.write().map_err(|_| SourceError::poisoned())?;
        let before = records.len();
        if let Some((lo, hi)) = span {
            records.retain(|r| !r.departure_time.is_some_and(|t| t >= lo && t <= hi));
        }
        let removed = before - records.len();
        records.extend(batch);

        tracing::info!(removed, total = records.len(), "ledger window replaced");
        Ok(removed)
    }

    /// Resolve planning rows and load them with [`replace_window`](Self::replace_window).
    pub fn import_rows(&self, rows: &[LedgerRow], aliases: &LocationAliases) -> Result<usize, SourceError> {
        if let Some(row) = rows.iter().find(|r| r.train_id.trim().is_empty()) {
            return Err(SourceError::InvalidRecord(format!(
                "row without train id ({} -> {})",
                row.departure_point, row.arrival_point
            )));
        }
        let batch = rows.iter().map(|r| r.resolve(aliases)).collect();
        self.replace_window(batch)
    }

    pub fn records(&self) -> Result<Vec<MovementRecord>, SourceError> {
        Ok(self.records.read().map_err(|_| SourceError::poisoned())?.clone())
    }
}

impl MovementSource for InMemoryLedger {
    fn fetch_movements(&self, location: Option<&Location>) -> Result<Vec<MovementRecord>, SourceError> {
        let records = self.records.read().map_err(|_| SourceError::poisoned())?;
        Ok(match location {
            Some(location) => records.iter().filter(|r| r.touches(location)).cloned().collect(),
            None => records.clone(),
        })
    }
}

/// In-memory correction store with a write revision counter.
#[derive(Debug, Default)]
pub struct InMemoryCorrectionStore {
    corrections: RwLock<Vec<CorrectionEvent>>,
    version: AtomicU64,
}

impl InMemoryCorrectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, correction: NewCorrection) -> Result<CorrectionId, SourceError> {
        let id = CorrectionId::new();
        let mut corrections = self.corrections.write().map_err(|_| SourceError::poisoned())?;
        corrections.push(correction.into_event(id));
        self.bump();
        Ok(id)
    }

    pub fn update(&self, id: CorrectionId, correction: NewCorrection) -> Result<(), SourceError> {
        let mut corrections = self.corrections.write().map_err(|_| SourceError::poisoned())?;
        let slot = corrections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| SourceError::NotFound(format!("correction {id}")))?;
        *slot = correction.into_event(id);
        self.bump();
        Ok(())
    }

    pub fn delete(&self, id: CorrectionId) -> Result<(), SourceError> {
        let mut corrections = self.corrections.write().map_err(|_| SourceError::poisoned())?;
        let before = corrections.len();
        corrections.retain(|c| c.id != id);
        if corrections.len() == before {
            return Err(SourceError::NotFound(format!("correction {id}")));
        }
        self.bump();
        Ok(())
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }
}

impl CorrectionStore for InMemoryCorrectionStore {
    fn fetch_corrections(&self, location: Option<&Location>) -> Result<Vec<CorrectionEvent>, SourceError> {
        let corrections = self.corrections.read().map_err(|_| SourceError::poisoned())?;
        let mut out: Vec<_> = corrections
            .iter()
            .filter(|c| location.is_none_or(|l| &c.location == l))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.event_time);
        Ok(out)
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct SimulationState {
    simulations: BTreeMap<SimulationId, Simulation>,
    events: HashMap<SimulationId, Vec<SimulationEvent>>,
}

/// In-memory simulation store.
#[derive(Debug, Default)]
pub struct InMemorySimulationStore {
    state: RwLock<SimulationState>,
}

impl InMemorySimulationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, name: impl Into<String>) -> Result<SimulationId, SourceError> {
        let id = SimulationId::new();
        let now = Utc::now();
        let mut state = self.state.write().map_err(|_| SourceError::poisoned())?;
        state.simulations.insert(
            id,
            Simulation {
                id,
                name: name.into(),
                created_at: now,
                last_modified_at: now,
            },
        );
        state.events.insert(id, Vec::new());
        Ok(id)
    }

    /// Delete a simulation together with its events.
    pub fn delete(&self, id: SimulationId) -> Result<(), SourceError> {
        let mut state = self.state.write().map_err(|_| SourceError::poisoned())?;
        state
            .simulations
            .remove(&id)
            .ok_or_else(|| SourceError::NotFound(format!("simulation {id}")))?;
        state.events.remove(&id);
        Ok(())
    }

    pub fn append_event(&self, event: SimulationEvent) -> Result<(), SourceError> {
        let mut state = self.state.write().map_err(|_| SourceError::poisoned())?;
        let id = event.simulation_id;
        let simulation = state
            .simulations
            .get_mut(&id)
            .ok_or_else(|| SourceError::NotFound(format!("simulation {id}")))?;
        simulation.last_modified_at = Utc::now();
        state.events.entry(id).or_default().push(event);
        Ok(())
    }

    /// Remove the first event equal to `event`. Returns whether one was found.
    pub fn remove_event(&self, event: &SimulationEvent) -> Result<bool, SourceError> {
        let mut state = self.state.write().map_err(|_| SourceError::poisoned())?;
        let id = event.simulation_id;
        let Some(events) = state.events.get_mut(&id) else {
            return Err(SourceError::NotFound(format!("simulation {id}")));
        };
        let Some(pos) = events.iter().position(|e| e == event) else {
            return Ok(false);
        };
        events.remove(pos);
        if let Some(simulation) = state.simulations.get_mut(&id) {
            simulation.last_modified_at = Utc::now();
        }
        Ok(true)
    }

    /// All simulations with their edit counts, most recently modified first.
    pub fn summaries(&self) -> Result<Vec<(Simulation, SimulationSummary)>, SourceError> {
        let state = self.state.read().map_err(|_| SourceError::poisoned())?;
        let mut out: Vec<_> = state
            .simulations
            .values()
            .map(|sim| {
                let summary = state
                    .events
                    .get(&sim.id)
                    .map(|events| SimulationSummary::from_events(events))
                    .unwrap_or_default();
                (sim.clone(), summary)
            })
            .collect();
        out.sort_by(|a, b| b.0.last_modified_at.cmp(&a.0.last_modified_at));
        Ok(out)
    }
}

impl SimulationStore for InMemorySimulationStore {
    fn fetch_simulation_events(&self, simulation_id: SimulationId) -> Result<Vec<SimulationEvent>, SourceError> {
        let state = self.state.read().map_err(|_| SourceError::poisoned())?;
        state
            .events
            .get(&simulation_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("simulation {simulation_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use railstock_core::TrainId;
    use railstock_ledger::{ModificationType, MovementKind};

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, h, 0, 0).unwrap()
    }

    fn run(id: &str, dep: Option<DateTime<Utc>>) -> MovementRecord {
        MovementRecord {
            train_id: TrainId::new(id),
            departure_point: Location::new("AMB"),
            arrival_point: Location::new("X"),
            departure_time: dep,
            arrival_time: None,
            wagon_count: 10,
            movement_kind: MovementKind::Full,
        }
    }

    fn fix(location: &str, h: u32) -> NewCorrection {
        NewCorrection {
            location: Location::new(location),
            event_time: at(20, h),
            wagon_delta: 3,
            relative: true,
            comment: "recount".into(),
            wagon_status: None,
        }
    }

    #[test]
    fn replace_window_drops_overlapping_days_only() {
        let ledger = InMemoryLedger::with_records(vec![
            run("OLD1", Some(at(19, 8))),
            run("OLD2", Some(at(20, 9))),
            run("UNDATED", None),
        ]);
        let removed = ledger
            .replace_window(vec![run("NEW1", Some(at(20, 6))), run("NEW2", Some(at(20, 18)))])
            .unwrap();
        assert_eq!(removed, 1);

        let ids: Vec<_> = ledger.records().unwrap().into_iter().map(|r| r.train_id).collect();
        assert_eq!(
            ids,
            vec![TrainId::new("OLD1"), TrainId::new("UNDATED"), TrainId::new("NEW1"), TrainId::new("NEW2")]
        );
    }

    #[test]
    fn import_rejects_rows_without_train_id() {
        let ledger = InMemoryLedger::new();
        let rows = vec![LedgerRow {
            departure_point: "AMB".into(),
            kind: "Evac".into(),
            ..LedgerRow::default()
        }];
        let err = ledger.import_rows(&rows, &LocationAliases::default()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidRecord(_)));
    }

    #[test]
    fn fetch_movements_filters_by_location() {
        let ledger = InMemoryLedger::with_records(vec![run("A", None)]);
        assert_eq!(ledger.fetch_movements(Some(&Location::new("X"))).unwrap().len(), 1);
        assert!(ledger.fetch_movements(Some(&Location::new("Y"))).unwrap().is_empty());
    }

    #[test]
    fn correction_writes_bump_version() {
        let store = InMemoryCorrectionStore::new();
        assert_eq!(store.version(), 0);

        let id = store.add(fix("AMB", 9)).unwrap();
        store.add(fix("X", 7)).unwrap();
        assert_eq!(store.version(), 2);

        let mut edited = fix("AMB", 10);
        edited.wagon_delta = -1;
        store.update(id, edited).unwrap();
        assert_eq!(store.version(), 3);

        let amb = store.fetch_corrections(Some(&Location::new("AMB"))).unwrap();
        assert_eq!(amb.len(), 1);
        assert_eq!(amb[0].wagon_delta, -1);

        store.delete(id).unwrap();
        assert_eq!(store.version(), 4);
        assert!(matches!(store.delete(id), Err(SourceError::NotFound(_))));
        assert_eq!(store.version(), 4);
    }

    #[test]
    fn corrections_are_returned_in_time_order() {
        let store = InMemoryCorrectionStore::new();
        store.add(fix("X", 12)).unwrap();
        store.add(fix("X", 8)).unwrap();
        let times: Vec<_> = store
            .fetch_corrections(None)
            .unwrap()
            .into_iter()
            .map(|c| c.event_time)
            .collect();
        assert_eq!(times, vec![at(20, 8), at(20, 12)]);
    }

    fn deletion(simulation_id: SimulationId, train: &str) -> SimulationEvent {
        SimulationEvent {
            simulation_id,
            modification_type: ModificationType::Deleted,
            train_id: Some(TrainId::new(train)),
            departure_point: None,
            arrival_point: None,
            departure_time: None,
            arrival_time: None,
            wagon_count: None,
            is_empty: false,
        }
    }

    #[test]
    fn simulation_events_keep_insertion_order() {
        let store = InMemorySimulationStore::new();
        let sim = store.create("fewer evac runs").unwrap();
        store.append_event(deletion(sim, "B")).unwrap();
        store.append_event(deletion(sim, "A")).unwrap();

        let events = store.fetch_simulation_events(sim).unwrap();
        let ids: Vec<_> = events.iter().filter_map(|e| e.train_id.clone()).collect();
        assert_eq!(ids, vec![TrainId::new("B"), TrainId::new("A")]);

        let summaries = store.summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].1.deleted, 2);
    }

    #[test]
    fn removing_and_deleting_simulations() {
        let store = InMemorySimulationStore::new();
        let sim = store.create("draft").unwrap();
        let event = deletion(sim, "A");
        store.append_event(event.clone()).unwrap();

        assert!(store.remove_event(&event).unwrap());
        assert!(!store.remove_event(&event).unwrap());

        store.delete(sim).unwrap();
        assert!(matches!(store.fetch_simulation_events(sim), Err(SourceError::NotFound(_))));
        assert!(matches!(store.append_event(event), Err(SourceError::NotFound(_))));
    }
}
