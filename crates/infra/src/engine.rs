//! Stock engine: collaborators in, stock series out.
//!
//! `StockEngine` composes the three read-only collaborator traits with the pure
//! computations of `railstock-stock`:
//!
//! ```text
//! MovementSource ──┐
//!                  ├─ (replay simulation) → normalize → accumulate → overlay corrections
//! SimulationStore ─┘                                                    ↑
//!                                                          CorrectionStore
//! ```
//!
//! The engine holds no state besides its collaborators and settings. Every call
//! fetches fresh inputs, so two calls with unchanged collaborators return the
//! same series. Memoization lives in [`crate::cache`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use railstock_core::{Location, SimulationId};
use railstock_ledger::{MovementRecord, SimulationEvent};
use railstock_stock::{PartitionKey, StockPoint, StockSettings, series};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::sources::{CorrectionStore, MovementSource, SimulationStore};

/// What-if edits to replay before computing stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationOverlay {
    /// A simulation persisted in the [`SimulationStore`].
    Stored(SimulationId),
    /// Edits not yet saved, passed inline.
    Draft {
        simulation_id: Option<SimulationId>,
        events: Vec<SimulationEvent>,
    },
}

impl SimulationOverlay {
    pub fn simulation_id(&self) -> Option<SimulationId> {
        match self {
            SimulationOverlay::Stored(id) => Some(*id),
            SimulationOverlay::Draft { simulation_id, .. } => *simulation_id,
        }
    }
}

/// One stock request: which location, and under which simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockQuery {
    pub location: Option<Location>,
    pub simulation: Option<SimulationOverlay>,
}

impl StockQuery {
    /// Every location, no simulation.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn at(location: impl Into<Location>) -> Self {
        Self {
            location: Some(location.into()),
            simulation: None,
        }
    }

    pub fn with_simulation(mut self, overlay: SimulationOverlay) -> Self {
        self.simulation = Some(overlay);
        self
    }
}

/// Actual and simulated series for the same location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockComparison {
    pub actual: Vec<StockPoint>,
    pub simulated: Vec<StockPoint>,
}

impl StockComparison {
    /// Final simulated stock minus final actual stock, per partition.
    ///
    /// A partition present on one side only counts as 0 on the other.
    pub fn divergence(&self) -> BTreeMap<PartitionKey, i64> {
        let actual = series::latest_by_partition(&self.actual);
        let simulated = series::latest_by_partition(&self.simulated);

        let mut out: BTreeMap<PartitionKey, i64> = actual
            .iter()
            .map(|(key, count)| (key.clone(), simulated.get(key).copied().unwrap_or(0) - count))
            .collect();
        for (key, count) in simulated {
            out.entry(key).or_insert(count);
        }
        out
    }
}

/// Stock computation over injected collaborators.
///
/// ## Generic Parameters
///
/// - `M`: movement ledger ([`MovementSource`])
/// - `C`: manual corrections ([`CorrectionStore`])
/// - `S`: simulation overlays ([`SimulationStore`])
///
/// ## Error Semantics
///
/// - collaborator failures surface as [`EngineError::Source`]
/// - a movement kind without status mapping at a partitioned location surfaces
///   as [`EngineError::Stock`]
#[derive(Debug)]
pub struct StockEngine<M, C, S> {
    movements: M,
    corrections: C,
    simulations: S,
    settings: StockSettings,
    corrections_in_simulation: bool,
}

impl<M, C, S> StockEngine<M, C, S> {
    pub fn new(movements: M, corrections: C, simulations: S, settings: StockSettings) -> Self {
        Self {
            movements,
            corrections,
            simulations,
            settings,
            corrections_in_simulation: false,
        }
    }

    pub fn from_config(movements: M, corrections: C, simulations: S, config: &EngineConfig) -> Self {
        Self::new(movements, corrections, simulations, config.settings())
            .with_corrections_in_simulation(config.simulation.apply_corrections)
    }

    /// Overlay manual corrections on simulated series too (off by default).
    pub fn with_corrections_in_simulation(mut self, enabled: bool) -> Self {
        self.corrections_in_simulation = enabled;
        self
    }

    pub fn settings(&self) -> &StockSettings {
        &self.settings
    }

    pub fn corrections_in_simulation(&self) -> bool {
        self.corrections_in_simulation
    }

    pub fn into_parts(self) -> (M, C, S) {
        (self.movements, self.corrections, self.simulations)
    }
}

impl<M, C, S> StockEngine<M, C, S>
where
    M: MovementSource,
    C: CorrectionStore,
    S: SimulationStore,
{
    /// Current revision of the correction set.
    pub fn corrections_version(&self) -> u64 {
        self.corrections.version()
    }

    /// Stock series from the ledger alone.
    pub fn compute_base_stock(&self, location: Option<&Location>) -> Result<Vec<StockPoint>, EngineError> {
        let movements = self.movements.fetch_movements(location)?;
        let points = railstock_stock::compute_base_stock(&movements, location, &self.settings)?;
        tracing::debug!(
            location = location.map(Location::as_str),
            movements = movements.len(),
            points = points.len(),
            "base stock computed"
        );
        Ok(points)
    }

    /// Stock series with corrections, optionally under a simulation.
    ///
    /// Under a simulation the whole ledger is replayed, since an edit may move a
    /// run onto or off `location`. Corrections are then only overlaid when
    /// [`with_corrections_in_simulation`](Self::with_corrections_in_simulation)
    /// is set.
    pub fn compute_corrected_stock(
        &self,
        location: Option<&Location>,
        simulation: Option<&SimulationOverlay>,
    ) -> Result<Vec<StockPoint>, EngineError> {
        let Some(overlay) = simulation else {
            let movements = self.movements.fetch_movements(location)?;
            let corrections = self.corrections.fetch_corrections(location)?;
            let points = railstock_stock::compute_corrected_stock(&movements, &corrections, location, &self.settings)?;
            tracing::debug!(
                location = location.map(Location::as_str),
                corrections = corrections.len(),
                points = points.len(),
                "corrected stock computed"
            );
            return Ok(points);
        };

        let events = self.overlay_events(overlay)?;
        let ledger = self.movements.fetch_movements(None)?;
        let movements = self.replay_simulation(&ledger, location, &events);

        let points = if self.corrections_in_simulation {
            let corrections = self.corrections.fetch_corrections(location)?;
            railstock_stock::compute_corrected_stock(&movements, &corrections, location, &self.settings)?
        } else {
            railstock_stock::compute_base_stock(&movements, location, &self.settings)?
        };

        tracing::info!(
            location = location.map(Location::as_str),
            simulation_id = ?overlay.simulation_id(),
            events = events.len(),
            points = points.len(),
            "simulated stock computed"
        );
        Ok(points)
    }

    /// [`compute_corrected_stock`](Self::compute_corrected_stock) for a request payload.
    pub fn query(&self, query: &StockQuery) -> Result<Vec<StockPoint>, EngineError> {
        self.compute_corrected_stock(query.location.as_ref(), query.simulation.as_ref())
    }

    /// Apply simulation events to a copy of `movements`.
    pub fn replay_simulation(
        &self,
        movements: &[MovementRecord],
        location: Option<&Location>,
        events: &[SimulationEvent],
    ) -> Vec<MovementRecord> {
        railstock_stock::replay_simulation(movements, location, events)
    }

    /// Actual and simulated stock for `location`, side by side.
    pub fn compare(
        &self,
        location: Option<&Location>,
        overlay: &SimulationOverlay,
    ) -> Result<StockComparison, EngineError> {
        Ok(StockComparison {
            actual: self.compute_corrected_stock(location, None)?,
            simulated: self.compute_corrected_stock(location, Some(overlay))?,
        })
    }

    fn overlay_events(&self, overlay: &SimulationOverlay) -> Result<Vec<SimulationEvent>, EngineError> {
        match overlay {
            SimulationOverlay::Stored(id) => Ok(self.simulations.fetch_simulation_events(*id)?),
            SimulationOverlay::Draft { events, .. } => Ok(events.clone()),
        }
    }
}
