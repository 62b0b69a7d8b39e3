use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use railstock_core::{CorrectionId, Location};

use crate::status::WagonStatus;

/// A manually entered stock correction anchored at `event_time`.
///
/// - `relative = true`: `wagon_delta` is added to the stock from `event_time` on.
/// - `relative = false`: `wagon_delta` is the absolute stock at `event_time`
///   (inventory reset); later points move by the resulting difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionEvent {
    pub id: CorrectionId,
    pub location: Location,
    pub event_time: DateTime<Utc>,
    pub wagon_delta: i64,
    pub relative: bool,
    pub comment: String,
    /// Only consulted when the location's stock is split by wagon status.
    pub wagon_status: Option<WagonStatus>,
}

/// Payload for creating or editing a correction (the store assigns the id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCorrection {
    pub location: Location,
    pub event_time: DateTime<Utc>,
    pub wagon_delta: i64,
    pub relative: bool,
    pub comment: String,
    pub wagon_status: Option<WagonStatus>,
}

impl NewCorrection {
    pub fn into_event(self, id: CorrectionId) -> CorrectionEvent {
        CorrectionEvent {
            id,
            location: self.location,
            event_time: self.event_time,
            wagon_delta: self.wagon_delta,
            relative: self.relative,
            comment: self.comment,
            wagon_status: self.wagon_status,
        }
    }
}
