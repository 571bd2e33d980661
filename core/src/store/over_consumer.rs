use super::{FieldKind, Store};
use crate::{
    error::{DetectorError, DetectorResult},
    types::AccountId,
    violator::{ViolatorRecord, ViolatorSink},
};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row of the over-consumer table. Rows written by operators may leave
/// any column empty; rows written by the detector always fill them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverConsumerRecord {
    pub account_id: AccountId,
    #[serde(default)]
    pub is_checked: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, rename = "avgConsumption6m")]
    pub avg_consumption_6m: Option<f64>,
}

impl From<&ViolatorRecord> for OverConsumerRecord {
    fn from(v: &ViolatorRecord) -> Self {
        Self {
            account_id: v.account_id,
            is_checked: Some(v.is_checked.clone()),
            address: Some(v.address.clone()),
            priority: Some(v.priority.as_str().to_string()),
            avg_consumption_6m: Some(v.avg_consumption_6m),
        }
    }
}

const OVER_CONSUMER_PATCH_FIELDS: &[(&str, &str, FieldKind)] = &[
    ("isChecked",        "is_checked",         FieldKind::Text),
    ("address",          "address",            FieldKind::Text),
    ("priority",         "priority",           FieldKind::Text),
    ("avgConsumption6m", "avg_consumption_6m", FieldKind::Real),
];

fn over_consumer_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<OverConsumerRecord> {
    Ok(OverConsumerRecord {
        account_id: row.get(0)?,
        is_checked: row.get(1)?,
        address: row.get(2)?,
        priority: row.get(3)?,
        avg_consumption_6m: row.get(4)?,
    })
}

impl Store {
    // ── Over-consumers ─────────────────────────────────────────────

    pub fn insert_over_consumer(&self, r: &OverConsumerRecord) -> DetectorResult<()> {
        self.conn.execute(
            "INSERT INTO over_consumers (account_id, is_checked, address, priority, avg_consumption_6m)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                r.account_id,
                r.is_checked.as_deref(),
                r.address.as_deref(),
                r.priority.as_deref(),
                r.avg_consumption_6m,
            ],
        )?;
        Ok(())
    }

    /// Insert all records or none.
    pub fn insert_over_consumers_batch(&self, records: &[OverConsumerRecord]) -> DetectorResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            self.insert_over_consumer(record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn get_over_consumer(&self, account_id: AccountId) -> DetectorResult<Option<OverConsumerRecord>> {
        use rusqlite::OptionalExtension;
        self.conn
            .query_row(
                "SELECT account_id, is_checked, address, priority, avg_consumption_6m
                 FROM over_consumers WHERE account_id = ?1",
                params![account_id],
                over_consumer_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Published rows in insertion order.
    pub fn list_over_consumers(&self) -> DetectorResult<Vec<OverConsumerRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, is_checked, address, priority, avg_consumption_6m
             FROM over_consumers ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map([], over_consumer_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_over_consumer(&self, r: &OverConsumerRecord) -> DetectorResult<()> {
        let changed = self.conn.execute(
            "UPDATE over_consumers SET is_checked = ?2, address = ?3, priority = ?4,
                 avg_consumption_6m = ?5
             WHERE account_id = ?1",
            params![
                r.account_id,
                r.is_checked.as_deref(),
                r.address.as_deref(),
                r.priority.as_deref(),
                r.avg_consumption_6m,
            ],
        )?;
        if changed == 0 {
            return Err(DetectorError::NotFound { entity: "over-consumer", id: r.account_id });
        }
        Ok(())
    }

    pub fn patch_over_consumer(
        &self,
        account_id: AccountId,
        fields: &Map<String, Value>,
    ) -> DetectorResult<OverConsumerRecord> {
        self.patch_row(
            "over_consumers",
            "over-consumer",
            account_id,
            OVER_CONSUMER_PATCH_FIELDS,
            fields,
        )?;
        self.get_over_consumer(account_id)?
            .ok_or(DetectorError::NotFound { entity: "over-consumer", id: account_id })
    }

    pub fn delete_over_consumer(&self, account_id: AccountId) -> DetectorResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM over_consumers WHERE account_id = ?1", params![account_id])?;
        if changed == 0 {
            return Err(DetectorError::NotFound { entity: "over-consumer", id: account_id });
        }
        Ok(())
    }

    pub fn delete_all_over_consumers(&self) -> DetectorResult<usize> {
        Ok(self.conn.execute("DELETE FROM over_consumers", [])?)
    }
}

impl ViolatorSink for Store {
    fn delete_all_violators(&self) -> DetectorResult<usize> {
        self.delete_all_over_consumers()
    }

    fn insert_violators(&self, violators: &[ViolatorRecord]) -> DetectorResult<usize> {
        let records: Vec<OverConsumerRecord> = violators.iter().map(Into::into).collect();
        self.insert_over_consumers_batch(&records)
    }
}
