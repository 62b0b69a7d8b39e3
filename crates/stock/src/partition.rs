//! Partitioning of stock series.
//!
//! A call selects one [`PartitionScheme`] up front; everything downstream
//! (event tagging, accumulation, correction routing) asks the scheme instead of
//! branching on particular locations.

use std::collections::BTreeSet;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use railstock_core::{Location, StockError, StockResult};
use railstock_ledger::{CorrectionEvent, MovementKind, MovementRecord, WagonStatus};

/// Which arriving runs count as bringing full wagons into a split location.
///
/// Two ledger policies have been in use; the choice is a configuration
/// decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalStatusPolicy {
    /// Only evacuation arrivals are full.
    #[default]
    EvacOnly,
    /// Evacuation and loaded arrivals are full.
    EvacOrLoaded,
}

impl ArrivalStatusPolicy {
    fn arrives_full(self, kind: &MovementKind) -> bool {
        match self {
            ArrivalStatusPolicy::EvacOnly => matches!(kind, MovementKind::EmptyEvac),
            ArrivalStatusPolicy::EvacOrLoaded => {
                matches!(kind, MovementKind::EmptyEvac | MovementKind::Full)
            }
        }
    }
}

impl FromStr for ArrivalStatusPolicy {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evac_only" => Ok(ArrivalStatusPolicy::EvacOnly),
            "evac_or_loaded" => Ok(ArrivalStatusPolicy::EvacOrLoaded),
            other => Err(StockError::validation(format!("unknown arrival policy '{other}'"))),
        }
    }
}

/// Key of one independent stock series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub location: Location,
    pub status: Option<WagonStatus>,
}

impl PartitionKey {
    pub fn location(location: Location) -> Self {
        Self {
            location,
            status: None,
        }
    }

    pub fn with_status(location: Location, status: WagonStatus) -> Self {
        Self {
            location,
            status: Some(status),
        }
    }
}

impl core::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}/{}", self.location, status),
            None => write!(f, "{}", self.location),
        }
    }
}

/// How stock events are split into series for one computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionScheme {
    /// One series per location.
    Flat,
    /// One series per (location, wagon status).
    ByStatus(ArrivalStatusPolicy),
}

impl PartitionScheme {
    /// Select the scheme for a query: split by status only when the target
    /// location is one of the `partitioned` locations.
    pub fn for_target(
        target: Option<&Location>,
        partitioned: &BTreeSet<Location>,
        policy: ArrivalStatusPolicy,
    ) -> Self {
        match target {
            Some(location) if partitioned.contains(location) => PartitionScheme::ByStatus(policy),
            _ => PartitionScheme::Flat,
        }
    }

    pub fn is_partitioned(&self) -> bool {
        matches!(self, PartitionScheme::ByStatus(_))
    }

    /// Status of the wagons leaving with `record`.
    pub fn departure_status(&self, record: &MovementRecord) -> StockResult<Option<WagonStatus>> {
        match self {
            PartitionScheme::Flat => Ok(None),
            PartitionScheme::ByStatus(_) => {
                ensure_mapped(record)?;
                Ok(Some(if record.movement_kind == MovementKind::Full {
                    WagonStatus::Full
                } else {
                    WagonStatus::Empty
                }))
            }
        }
    }

    /// Status of the wagons arriving with `record`.
    pub fn arrival_status(&self, record: &MovementRecord) -> StockResult<Option<WagonStatus>> {
        match self {
            PartitionScheme::Flat => Ok(None),
            PartitionScheme::ByStatus(policy) => {
                ensure_mapped(record)?;
                Ok(Some(if policy.arrives_full(&record.movement_kind) {
                    WagonStatus::Full
                } else {
                    WagonStatus::Empty
                }))
            }
        }
    }

    /// Series a correction applies to, if any.
    ///
    /// Under `ByStatus` a correction without a wagon status cannot be routed.
    pub fn correction_key(&self, correction: &CorrectionEvent) -> Option<PartitionKey> {
        match self {
            PartitionScheme::Flat => Some(PartitionKey::location(correction.location.clone())),
            PartitionScheme::ByStatus(_) => correction
                .wagon_status
                .map(|status| PartitionKey::with_status(correction.location.clone(), status)),
        }
    }
}

fn ensure_mapped(record: &MovementRecord) -> StockResult<()> {
    if record.movement_kind.is_recognized() {
        Ok(())
    } else {
        Err(StockError::unmapped_kind(
            record.train_id.as_str(),
            record.movement_kind.label(),
        ))
    }
}
