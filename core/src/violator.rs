//! Violator records: the published output of the pipeline.

use crate::{
    error::DetectorResult,
    types::{AccountId, Priority},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolatorRecord {
    pub account_id: AccountId,
    pub address: String,
    pub priority: Priority,
    pub is_checked: String,
    #[serde(rename = "avgConsumption6m")]
    pub avg_consumption_6m: f64,
}

/// Write side of the flagged-account store.
pub trait ViolatorSink {
    /// Remove every previously published violator.
    fn delete_all_violators(&self) -> DetectorResult<usize>;

    /// Insert a batch of violators.
    fn insert_violators(&self, violators: &[ViolatorRecord]) -> DetectorResult<usize>;
}
