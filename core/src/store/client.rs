use super::{FieldKind, Store};
use crate::{
    account::{AccountRecord, AccountSource, ConsumptionHistory},
    error::{DetectorError, DetectorResult},
    types::{AccountId, ReviewStatus},
};
use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Value};

const CLIENT_COLUMNS: &str = "account_id, is_checked, is_commercial, address, building_type,
     rooms_count, residents_count, total_area, consumption, priority";

const CLIENT_PATCH_FIELDS: &[(&str, &str, FieldKind)] = &[
    ("isChecked",      "is_checked",      FieldKind::Text),
    ("isCommercial",   "is_commercial",   FieldKind::Bool),
    ("address",        "address",         FieldKind::Text),
    ("buildingType",   "building_type",   FieldKind::Text),
    ("roomsCount",     "rooms_count",     FieldKind::Integer),
    ("residentsCount", "residents_count", FieldKind::Integer),
    ("totalArea",      "total_area",      FieldKind::Real),
    ("consumption",    "consumption",     FieldKind::Json),
    ("priority",       "priority",        FieldKind::Text),
];

fn client_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRecord> {
    let account_id: AccountId = row.get(0)?;
    let consumption = row
        .get::<_, Option<String>>(8)?
        .map(|raw| parse_consumption(account_id, raw));
    Ok(AccountRecord {
        account_id,
        is_checked: row.get::<_, Option<String>>(1)?.map(|s| ReviewStatus::parse(&s)),
        is_commercial: row.get::<_, Option<i64>>(2)?.map(|v| v != 0),
        address: row.get(3)?,
        building_type: row.get(4)?,
        rooms_count: row.get(5)?,
        residents_count: row.get(6)?,
        total_area: row.get(7)?,
        consumption,
        priority: row.get(9)?,
    })
}

/// Text that is not JSON at all is kept as an unusable history rather than
/// failing the row.
fn parse_consumption(account_id: AccountId, raw: String) -> ConsumptionHistory {
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!("Account {account_id}: consumption column is not JSON ({e})");
        ConsumptionHistory::Unrecognized(Value::String(raw))
    })
}

fn consumption_json(record: &AccountRecord) -> DetectorResult<Option<String>> {
    record
        .consumption
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

impl Store {
    // ── Clients ────────────────────────────────────────────────────

    pub fn insert_client(&self, c: &AccountRecord) -> DetectorResult<()> {
        self.conn.execute(
            &format!("INSERT INTO clients ({CLIENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                c.account_id,
                c.is_checked.as_ref().map(|s| s.as_str()),
                c.is_commercial,
                c.address.as_deref(),
                c.building_type.as_deref(),
                c.rooms_count,
                c.residents_count,
                c.total_area,
                consumption_json(c)?,
                c.priority.as_deref(),
            ],
        )?;
        Ok(())
    }

    /// Insert all records or none.
    pub fn insert_clients_batch(&self, clients: &[AccountRecord]) -> DetectorResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for client in clients {
            self.insert_client(client)?;
        }
        tx.commit()?;
        Ok(clients.len())
    }

    pub fn get_client(&self, account_id: AccountId) -> DetectorResult<Option<AccountRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE account_id = ?1"),
                params![account_id],
                client_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_clients(&self) -> DetectorResult<Vec<AccountRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY account_id ASC"))?;
        let rows = stmt.query_map([], client_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Replace every column of an existing client.
    pub fn update_client(&self, c: &AccountRecord) -> DetectorResult<()> {
        let changed = self.conn.execute(
            "UPDATE clients SET is_checked = ?2, is_commercial = ?3, address = ?4,
                 building_type = ?5, rooms_count = ?6, residents_count = ?7,
                 total_area = ?8, consumption = ?9, priority = ?10
             WHERE account_id = ?1",
            params![
                c.account_id,
                c.is_checked.as_ref().map(|s| s.as_str()),
                c.is_commercial,
                c.address.as_deref(),
                c.building_type.as_deref(),
                c.rooms_count,
                c.residents_count,
                c.total_area,
                consumption_json(c)?,
                c.priority.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(DetectorError::NotFound { entity: "client", id: c.account_id });
        }
        Ok(())
    }

    /// Partial update from camelCase fields. Returns the updated record.
    pub fn patch_client(
        &self,
        account_id: AccountId,
        fields: &Map<String, Value>,
    ) -> DetectorResult<AccountRecord> {
        self.patch_row("clients", "client", account_id, CLIENT_PATCH_FIELDS, fields)?;
        self.get_client(account_id)?
            .ok_or(DetectorError::NotFound { entity: "client", id: account_id })
    }

    pub fn delete_client(&self, account_id: AccountId) -> DetectorResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM clients WHERE account_id = ?1", params![account_id])?;
        if changed == 0 {
            return Err(DetectorError::NotFound { entity: "client", id: account_id });
        }
        Ok(())
    }

    pub fn delete_all_clients(&self) -> DetectorResult<usize> {
        Ok(self.conn.execute("DELETE FROM clients", [])?)
    }
}

impl AccountSource for Store {
    fn load_accounts(&self) -> DetectorResult<Vec<AccountRecord>> {
        self.list_clients().map_err(|e| DetectorError::SourceUnavailable {
            source_name: "account store",
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_consumption_loads_as_unusable_history() {
        let store = Store::in_memory().unwrap();
        store.migrate().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO clients (account_id, is_checked, consumption) VALUES (9, '', 'n/a')",
                [],
            )
            .unwrap();

        let clients = store.list_clients().unwrap();
        assert_eq!(clients.len(), 1);
        let history = clients[0].consumption.clone().unwrap();
        assert!(matches!(history, ConsumptionHistory::Unrecognized(_)));
        assert!(history.readings().is_none());
        assert!(clients[0].is_checked.as_ref().is_some_and(ReviewStatus::is_blank));
    }
}
