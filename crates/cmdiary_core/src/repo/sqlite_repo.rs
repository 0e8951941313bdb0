//! SQLite-backed persistence port.
//!
//! # Responsibility
//! - Store the diary as one `records` table row per record.
//! - Translate column values to and from untyped field maps.
//!
//! # Invariants
//! - `save_all` replaces the whole table inside one transaction.
//! - Rows are returned in the order they were saved (`position`).
//! - Dates are stored as `dd/mm/yyyy` text; a legacy `'N/A'` due date is null.
//! - Nulls are written as SQL `NULL`, so text columns round-trip verbatim.

use super::port::{PersistError, PersistResult, PersistencePort};
use crate::db::{open_db, open_db_in_memory};
use crate::model::record::RecordAttribute;
use crate::model::value::{format_date, FieldKind, FieldMap, FieldValue};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::path::Path;

const RECORD_SELECT_SQL: &str = "SELECT
    uid,
    item_type,
    subject,
    description,
    due_date,
    priority
FROM records
ORDER BY position ASC";

const RECORD_INSERT_SQL: &str = "INSERT INTO records (
    position,
    uid,
    item_type,
    subject,
    description,
    due_date,
    priority
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);";

const LEGACY_NULL_TEXT: &str = "N/A";

/// Relational diary file.
pub struct SqliteRecordRepository {
    conn: Connection,
}

impl SqliteRecordRepository {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens or creates a diary database file.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn in_memory() -> PersistResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl PersistencePort for SqliteRecordRepository {
    fn load_all(&mut self) -> PersistResult<Vec<FieldMap>> {
        let mut stmt = self.conn.prepare(RECORD_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        info!(
            "event=records_load module=repo backend=sqlite status=ok count={}",
            records.len()
        );
        Ok(records)
    }

    fn save_all(&mut self, records: &[FieldMap]) -> PersistResult<()> {
        let null = FieldValue::Null;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records;", [])?;
        {
            let mut stmt = tx.prepare(RECORD_INSERT_SQL)?;
            for (position, record) in records.iter().enumerate() {
                let position = i64::try_from(position).map_err(|_| {
                    PersistError::InvalidData(format!("record position {position} overflows"))
                })?;
                let mut bind_values = vec![Value::Integer(position)];
                for attribute in RecordAttribute::PERSISTED {
                    let value = record.get(attribute.name()).unwrap_or(&null);
                    bind_values.push(value_to_db(value));
                }
                stmt.execute(params_from_iter(bind_values))?;
            }
        }
        tx.commit()?;

        debug!(
            "event=records_save module=repo backend=sqlite status=ok count={}",
            records.len()
        );
        Ok(())
    }
}

fn parse_record_row(row: &Row<'_>) -> PersistResult<FieldMap> {
    let mut record = FieldMap::new();
    for attribute in RecordAttribute::PERSISTED {
        let raw: Value = row.get(attribute.name())?;
        record.insert(
            attribute.name().to_string(),
            value_from_db(attribute, raw)?,
        );
    }
    Ok(record)
}

fn value_from_db(attribute: RecordAttribute, raw: Value) -> PersistResult<FieldValue> {
    match (attribute.kind(), raw) {
        (_, Value::Null) => Ok(FieldValue::Null),
        (FieldKind::Date, Value::Text(text)) if text == LEGACY_NULL_TEXT => Ok(FieldValue::Null),
        (FieldKind::Bool, Value::Integer(0)) => Ok(FieldValue::Bool(false)),
        (FieldKind::Bool, Value::Integer(1)) => Ok(FieldValue::Bool(true)),
        // Out-of-range flags and mistyped text are left for record
        // validation to reject.
        (_, Value::Integer(value)) => Ok(FieldValue::Int(value)),
        (_, Value::Text(text)) => Ok(FieldValue::Text(text)),
        (_, Value::Real(_)) | (_, Value::Blob(_)) => Err(PersistError::InvalidData(format!(
            "unexpected non-integer, non-text value in records.{}",
            attribute.name()
        ))),
    }
}

fn value_to_db(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(flag) => Value::Integer(bool_to_int(*flag)),
        FieldValue::Int(number) => Value::Integer(*number),
        FieldValue::Text(text) => Value::Text(text.clone()),
        FieldValue::Date(date) => Value::Text(format_date(*date)),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
