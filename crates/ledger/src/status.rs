use core::str::FromStr;

use serde::{Deserialize, Serialize};

use railstock_core::StockError;

/// Load state of the wagons counted in a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagonStatus {
    Empty,
    Full,
}

impl WagonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagonStatus::Empty => "empty",
            WagonStatus::Full => "full",
        }
    }
}

impl core::fmt::Display for WagonStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WagonStatus {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(WagonStatus::Empty),
            "full" => Ok(WagonStatus::Full),
            other => Err(StockError::validation(format!("unknown wagon status '{other}'"))),
        }
    }
}
