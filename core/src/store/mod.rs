//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Pipeline stages see it through the AccountSource, ComplaintSource and
//! ViolatorSink traits and never execute SQL directly.

use crate::error::{DetectorError, DetectorResult};
use rusqlite::{types::Value as SqlValue, Connection};
use serde_json::{Map, Value};
use std::time::Duration;

mod client;
mod complaint;
mod cycle_log;
mod over_consumer;

pub use cycle_log::CycleLogEntry;
pub use over_consumer::OverConsumerRecord;

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path`. URI paths such as
    /// `file:name?mode=memory&cache=shared` are accepted.
    pub fn open(path: &str, busy_timeout: Duration) -> DetectorResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(busy_timeout)?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open a private in-memory database (used in tests).
    pub fn in_memory() -> DetectorResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to call repeatedly.
    pub fn migrate(&self) -> DetectorResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_clients.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_over_consumers.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_complaints.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_cycle_log.sql"))?;
        Ok(())
    }

    /// Apply a camelCase partial update to one row.
    /// `allowed` maps each accepted field name to its column and kind.
    fn patch_row(
        &self,
        table: &str,
        entity: &'static str,
        id: i64,
        allowed: &[(&str, &str, FieldKind)],
        fields: &Map<String, Value>,
    ) -> DetectorResult<()> {
        if fields.is_empty() {
            return Err(DetectorError::InvalidFields(Vec::new()));
        }
        let unknown: Vec<String> = fields
            .keys()
            .filter(|k| !allowed.iter().any(|(name, _, _)| name == k))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(DetectorError::InvalidFields(unknown));
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut values = Vec::with_capacity(fields.len() + 1);
        let mut mistyped = Vec::new();
        for (name, column, kind) in allowed {
            let Some(value) = fields.get(*name) else { continue };
            match kind.to_sql(value) {
                Some(v) => {
                    values.push(v);
                    assignments.push(format!("{column} = ?{}", values.len()));
                }
                None => mistyped.push((*name).to_string()),
            }
        }
        if !mistyped.is_empty() {
            return Err(DetectorError::InvalidFields(mistyped));
        }

        values.push(SqlValue::Integer(id));
        let sql = format!(
            "UPDATE {table} SET {} WHERE account_id = ?{}",
            assignments.join(", "),
            values.len()
        );
        let changed = self.conn.execute(&sql, rusqlite::params_from_iter(values))?;
        if changed == 0 {
            return Err(DetectorError::NotFound { entity, id });
        }
        Ok(())
    }
}

/// JSON shape accepted for a patchable column. `null` clears any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Bool,
    Integer,
    Real,
    Json,
}

impl FieldKind {
    fn to_sql(self, value: &Value) -> Option<SqlValue> {
        if value.is_null() {
            return Some(SqlValue::Null);
        }
        match self {
            Self::Text    => value.as_str().map(|s| SqlValue::Text(s.to_string())),
            Self::Bool    => value.as_bool().map(|b| SqlValue::Integer(i64::from(b))),
            Self::Integer => value.as_i64().map(SqlValue::Integer),
            Self::Real    => value.as_f64().map(SqlValue::Real),
            Self::Json    => Some(SqlValue::Text(value.to_string())),
        }
    }
}

/// Opens one store session per pipeline cycle.
pub trait StoreConnector {
    type Session: crate::account::AccountSource
        + crate::complaints::ComplaintSource
        + crate::violator::ViolatorSink;

    fn connect(&self) -> DetectorResult<Self::Session>;
}

/// Connects to the SQLite database named in the config. Each session is a
/// fresh connection that closes when the session is dropped.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    pub path: String,
    pub busy_timeout: Duration,
}

impl SqliteConnector {
    pub fn from_config(config: &crate::config::DetectorConfig) -> Self {
        Self {
            path: config.db_path.clone(),
            busy_timeout: config.busy_timeout(),
        }
    }
}

impl StoreConnector for SqliteConnector {
    type Session = Store;

    fn connect(&self) -> DetectorResult<Store> {
        Store::open(&self.path, self.busy_timeout).map_err(|e| DetectorError::SourceUnavailable {
            source_name: "account store",
            reason: e.to_string(),
        })
    }
}
