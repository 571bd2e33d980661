//! Metered account records as held by the account store.

use crate::types::{AccountId, ReviewStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Monthly consumption history. The store hands it over either as a plain
/// chronological list or as a period → reading mapping in chronological
/// insertion order. Entries are kept as raw JSON so that one bad reading
/// disqualifies its account at extraction instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConsumptionHistory {
    Readings(Vec<Value>),
    Periods(Map<String, Value>),
    /// Anything else the store holds in the consumption column.
    Unrecognized(Value),
}

impl ConsumptionHistory {
    pub fn from_readings(readings: &[f64]) -> Self {
        Self::Readings(readings.iter().map(|&r| Value::from(r)).collect())
    }

    /// Flatten to an ordered list of readings.
    /// Returns None if any entry is not a number, or the shape is unknown.
    pub fn readings(&self) -> Option<Vec<f64>> {
        match self {
            Self::Readings(values) => values.iter().map(Value::as_f64).collect(),
            Self::Periods(map) => map.values().map(Value::as_f64).collect(),
            Self::Unrecognized(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(alias = "accountId")]
    pub account_id: AccountId,
    #[serde(default, alias = "isChecked")]
    pub is_checked: Option<ReviewStatus>,
    #[serde(default, alias = "isCommercial")]
    pub is_commercial: Option<bool>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "buildingType")]
    pub building_type: Option<String>,
    #[serde(default, alias = "roomsCount")]
    pub rooms_count: Option<i64>,
    #[serde(default, alias = "residentsCount")]
    pub residents_count: Option<i64>,
    #[serde(default, alias = "totalArea")]
    pub total_area: Option<f64>,
    #[serde(default)]
    pub consumption: Option<ConsumptionHistory>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl AccountRecord {
    /// A bare record with only the identifier set.
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            is_checked: None,
            is_commercial: None,
            address: None,
            building_type: None,
            rooms_count: None,
            residents_count: None,
            total_area: None,
            consumption: None,
            priority: None,
        }
    }

    pub fn is_commercial(&self) -> bool {
        self.is_commercial.unwrap_or(false)
    }

    pub fn address_or_empty(&self) -> &str {
        self.address.as_deref().unwrap_or("")
    }
}

/// Read side of the account store.
pub trait AccountSource {
    fn load_accounts(&self) -> crate::error::DetectorResult<Vec<AccountRecord>>;
}
