use super::Store;
use crate::{
    complaints::ComplaintSource,
    error::{DetectorError, DetectorResult},
};
use rusqlite::params;

impl Store {
    // ── Complaints ─────────────────────────────────────────────────

    /// Record a complaint as captured by the intake bot. Returns its id.
    pub fn insert_complaint(
        &self,
        message: &str,
        user_address: Option<&str>,
        complaint_address: Option<&str>,
    ) -> DetectorResult<i64> {
        self.conn.execute(
            "INSERT INTO complaints (message, user_address, complaint_address) VALUES (?1, ?2, ?3)",
            params![message, user_address, complaint_address],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn complaint_count(&self) -> DetectorResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM complaints", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Distinct non-null complaint addresses.
    pub fn distinct_complaint_addresses(&self) -> DetectorResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT complaint_address FROM complaints
             WHERE complaint_address IS NOT NULL
             ORDER BY complaint_address ASC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl ComplaintSource for Store {
    fn complaint_addresses(&self) -> DetectorResult<Vec<String>> {
        self.distinct_complaint_addresses()
            .map_err(|e| DetectorError::SourceUnavailable {
                source_name: "complaint store",
                reason: e.to_string(),
            })
    }
}
