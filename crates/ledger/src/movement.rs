use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use railstock_core::{Location, TrainId};

/// Kind of train run, as labelled by the ledger.
///
/// The ledger is fed from four planning sheets; their labels map to the known
/// variants. Any other label is kept verbatim in `Unrecognized` so that callers
/// that need a wagon status for it can report it instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MovementKind {
    /// Loaded train ("Chargés").
    Full,
    /// Empty run ("Vides").
    Empty,
    /// Empty supply run towards a loading site ("Appro").
    EmptyAppro,
    /// Empty evacuation run ("Evac").
    EmptyEvac,
    Unrecognized(String),
}

impl MovementKind {
    pub fn label(&self) -> &str {
        match self {
            MovementKind::Full => "Chargés",
            MovementKind::Empty => "Vides",
            MovementKind::EmptyAppro => "Appro",
            MovementKind::EmptyEvac => "Evac",
            MovementKind::Unrecognized(label) => label,
        }
    }

    /// Parse a ledger label. Accepts the sheet labels and the upper-case enum
    /// spellings used by some exports.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Chargés" | "Charges" | "FULL" => MovementKind::Full,
            "Vides" | "EMPTY" => MovementKind::Empty,
            "Appro" | "EMPTY_APPRO" => MovementKind::EmptyAppro,
            "Evac" | "EMPTY_EVAC" => MovementKind::EmptyEvac,
            other => MovementKind::Unrecognized(other.to_string()),
        }
    }

    /// Kind used for synthesized runs, which only know whether wagons are empty.
    pub fn from_empty_flag(is_empty: bool) -> Self {
        if is_empty {
            MovementKind::Empty
        } else {
            MovementKind::Full
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, MovementKind::Unrecognized(_))
    }
}

impl From<String> for MovementKind {
    fn from(value: String) -> Self {
        MovementKind::from_label(&value)
    }
}

impl From<MovementKind> for String {
    fn from(value: MovementKind) -> Self {
        match value {
            MovementKind::Unrecognized(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// One train run from the movement ledger.
///
/// A record may carry only a departure, only an arrival, or both. The wagon
/// count is the same at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub train_id: TrainId,
    pub departure_point: Location,
    pub arrival_point: Location,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub wagon_count: i64,
    pub movement_kind: MovementKind,
}

impl MovementRecord {
    /// True if the run departs from or arrives at `location`.
    pub fn touches(&self, location: &Location) -> bool {
        &self.departure_point == location || &self.arrival_point == location
    }
}
