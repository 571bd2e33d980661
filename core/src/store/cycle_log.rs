use super::Store;
use crate::{error::DetectorResult, types::CycleId};
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Audit row for one scheduler cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleLogEntry {
    pub cycle_id: CycleId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: String,
    pub violators: usize,
    pub failed_stage: Option<String>,
    pub message: Option<String>,
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

impl Store {
    // ── Cycle log ──────────────────────────────────────────────────

    pub fn append_cycle_log(&self, entry: &CycleLogEntry) -> DetectorResult<()> {
        self.conn.execute(
            "INSERT INTO cycle_log (cycle_id, started_at, finished_at, outcome, violators, failed_stage, message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.cycle_id,
                entry.started_at.to_rfc3339(),
                entry.finished_at.to_rfc3339(),
                entry.outcome,
                entry.violators as i64,
                entry.failed_stage.as_deref(),
                entry.message.as_deref(),
            ],
        )?;
        Ok(())
    }

    /// Most recent cycles first.
    pub fn recent_cycle_logs(&self, limit: usize) -> DetectorResult<Vec<CycleLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT cycle_id, started_at, finished_at, outcome, violators, failed_stage, message
             FROM cycle_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(CycleLogEntry {
                cycle_id: row.get(0)?,
                started_at: parse_timestamp(1, row.get(1)?)?,
                finished_at: parse_timestamp(2, row.get(2)?)?,
                outcome: row.get(3)?,
                violators: row.get::<_, i64>(4)? as usize,
                failed_stage: row.get(5)?,
                message: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
