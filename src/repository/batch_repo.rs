// ==========================================
// Plant operations - batch traceability repository
// ==========================================
// Tables: batches / batch_events (see db::init_schema)
// No business rules: status and quantity changes are
// decided by the caller.
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::batch::{Batch, BatchEvent, NewBatchEvent};
use crate::domain::types::{BatchEventType, BatchStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const BATCH_COLUMNS: &str = "batch_id, product_type, production_date, initial_quantity_kg, \
     current_quantity_kg, origin_farm, quality_grade, status, created_at, updated_at";

const EVENT_COLUMNS: &str = "event_id, batch_id, event_type, location, timestamp, temperature, \
     quality_metrics, responsible_party, quantity_change_kg";

/// Changes applied to the batch row together with a new event
#[derive(Debug, Clone, Copy)]
pub struct BatchUpdate {
    pub status: Option<BatchStatus>,
    pub quantity_delta_kg: f64,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// BatchRepository
// ==========================================
pub struct BatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BatchRepository {
    /// Open (and if needed create) the traceability database
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Build on an existing connection (schema must exist)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert a batch and its first event in one transaction
    ///
    /// # Returns
    /// - Ok(event_id): id of the initial event
    /// - Err(UniqueConstraintViolation): batch id already taken
    pub fn insert_with_initial_event(
        &self,
        batch: &Batch,
        event: &NewBatchEvent,
        timestamp: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            &format!(
                "INSERT INTO batches ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                BATCH_COLUMNS
            ),
            params![
                batch.batch_id,
                batch.product_type,
                batch.production_date,
                batch.initial_quantity_kg,
                batch.current_quantity_kg,
                batch.origin_farm,
                batch.quality_grade,
                batch.status.to_db_str(),
                batch.created_at,
                batch.updated_at,
            ],
        )?;
        let event_id = insert_event(&tx, &batch.batch_id, event, timestamp)?;

        tx.commit()?;
        Ok(event_id)
    }

    /// Insert an event and apply its effect on the batch row
    pub fn append_event(
        &self,
        batch_id: &str,
        event: &NewBatchEvent,
        timestamp: NaiveDateTime,
        update: BatchUpdate,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let event_id = insert_event(&tx, batch_id, event, timestamp)?;

        let changed = tx.execute(
            r#"
            UPDATE batches
            SET status = COALESCE(?2, status),
                current_quantity_kg = current_quantity_kg + ?3,
                updated_at = ?4
            WHERE batch_id = ?1
            "#,
            params![
                batch_id,
                update.status.map(|s| s.to_db_str()),
                update.quantity_delta_kg,
                update.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Batch".to_string(),
                id: batch_id.to_string(),
            });
        }

        tx.commit()?;
        Ok(event_id)
    }

    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;
        let batch = conn
            .query_row(
                &format!("SELECT {} FROM batches WHERE batch_id = ?1", BATCH_COLUMNS),
                params![batch_id],
                map_batch,
            )
            .optional()?;
        Ok(batch)
    }

    /// Events of a batch, newest first
    pub fn list_events(&self, batch_id: &str) -> RepositoryResult<Vec<BatchEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM batch_events WHERE batch_id = ?1 \
             ORDER BY timestamp DESC, event_id DESC",
            EVENT_COLUMNS
        ))?;

        let events = stmt
            .query_map(params![batch_id], map_event)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(events)
    }

    /// All batches (optionally one status), newest first
    pub fn list(&self, status: Option<BatchStatus>) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM batches WHERE (?1 IS NULL OR status = ?1) \
             ORDER BY created_at DESC, batch_id DESC",
            BATCH_COLUMNS
        ))?;

        let batches = stmt
            .query_map(params![status.map(|s| s.to_db_str())], map_batch)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(batches)
    }
}

fn insert_event(
    conn: &Connection,
    batch_id: &str,
    event: &NewBatchEvent,
    timestamp: NaiveDateTime,
) -> RepositoryResult<i64> {
    let metrics = event
        .quality_metrics
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| RepositoryError::FieldValueError {
            field: "quality_metrics".to_string(),
            message: e.to_string(),
        })?;

    conn.execute(
        r#"
        INSERT INTO batch_events (
            batch_id, event_type, location, timestamp, temperature,
            quality_metrics, responsible_party, quantity_change_kg
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            batch_id,
            event.event_type.to_db_str(),
            event.location,
            timestamp,
            event.temperature,
            metrics,
            event.responsible_party,
            event.quantity_change_kg,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn map_batch(row: &Row<'_>) -> SqliteResult<Batch> {
    let status: String = row.get(7)?;
    Ok(Batch {
        batch_id: row.get(0)?,
        product_type: row.get(1)?,
        production_date: row.get(2)?,
        initial_quantity_kg: row.get(3)?,
        current_quantity_kg: row.get(4)?,
        origin_farm: row.get(5)?,
        quality_grade: row
            .get::<_, Option<String>>(6)?
            .unwrap_or_else(|| "STANDARD".to_string()),
        status: BatchStatus::from_str(&status)
            .ok_or_else(|| conversion_error(7, format!("unknown batch status '{}'", status)))?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn map_event(row: &Row<'_>) -> SqliteResult<BatchEvent> {
    let event_type: String = row.get(2)?;
    let metrics = row
        .get::<_, Option<String>>(6)?
        .map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(|e| conversion_error(6, e.to_string()))?;

    Ok(BatchEvent {
        event_id: row.get(0)?,
        batch_id: row.get(1)?,
        event_type: BatchEventType::from_str(&event_type)
            .ok_or_else(|| conversion_error(2, format!("unknown event type '{}'", event_type)))?,
        location: row.get(3)?,
        timestamp: row.get(4)?,
        temperature: row.get(5)?,
        quality_metrics: metrics,
        responsible_party: row.get(7)?,
        quantity_change_kg: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn repo() -> BatchRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        BatchRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn batch(id: &str, created: NaiveDateTime) -> Batch {
        Batch {
            batch_id: id.to_string(),
            product_type: "BEEF".to_string(),
            production_date: created.date(),
            initial_quantity_kg: 1000.0,
            current_quantity_kg: 1000.0,
            origin_farm: "Farm".to_string(),
            quality_grade: "A".to_string(),
            status: BatchStatus::Production,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = repo();
        let b = batch("BATCH-1", at(1, 8));
        let initial = NewBatchEvent::new(BatchEventType::Production, "Farm");
        repo.insert_with_initial_event(&b, &initial, at(1, 8)).unwrap();

        let found = repo.find_by_id("BATCH-1").unwrap().unwrap();
        assert_eq!(found.production_date, b.production_date);
        assert_eq!(found.status, BatchStatus::Production);
        assert_eq!(repo.list_events("BATCH-1").unwrap().len(), 1);
        assert!(repo.find_by_id("BATCH-2").unwrap().is_none());

        let dup = repo.insert_with_initial_event(&b, &initial, at(1, 9));
        assert!(matches!(dup, Err(RepositoryError::UniqueConstraintViolation(_))));
        // the failed transaction left no extra event behind
        assert_eq!(repo.list_events("BATCH-1").unwrap().len(), 1);
    }

    #[test]
    fn test_append_event_updates_batch() {
        let repo = repo();
        let initial = NewBatchEvent::new(BatchEventType::Production, "Farm");
        repo.insert_with_initial_event(&batch("BATCH-1", at(1, 8)), &initial, at(1, 8))
            .unwrap();

        let mut shipment = NewBatchEvent::new(BatchEventType::Shipment, "Port");
        shipment.quality_metrics = Some(serde_json::json!({"ph": 5.8}));
        repo.append_event(
            "BATCH-1",
            &shipment,
            at(2, 10),
            BatchUpdate {
                status: Some(BatchStatus::InTransit),
                quantity_delta_kg: -50.0,
                updated_at: at(2, 10),
            },
        )
        .unwrap();

        let found = repo.find_by_id("BATCH-1").unwrap().unwrap();
        assert_eq!(found.status, BatchStatus::InTransit);
        assert_eq!(found.current_quantity_kg, 950.0);

        let events = repo.list_events("BATCH-1").unwrap();
        assert_eq!(events[0].event_type, BatchEventType::Shipment);
        assert_eq!(events[0].quality_metrics.as_ref().unwrap()["ph"], 5.8);

        let missing = repo.append_event(
            "BATCH-404",
            &shipment,
            at(2, 11),
            BatchUpdate {
                status: None,
                quantity_delta_kg: 0.0,
                updated_at: at(2, 11),
            },
        );
        assert!(matches!(missing, Err(RepositoryError::ForeignKeyViolation(_))));
    }

    #[test]
    fn test_list_by_status() {
        let repo = repo();
        let initial = NewBatchEvent::new(BatchEventType::Production, "Farm");
        repo.insert_with_initial_event(&batch("BATCH-1", at(1, 8)), &initial, at(1, 8))
            .unwrap();
        repo.insert_with_initial_event(&batch("BATCH-2", at(3, 8)), &initial, at(3, 8))
            .unwrap();
        repo.append_event(
            "BATCH-1",
            &NewBatchEvent::new(BatchEventType::Storage, "Cold store"),
            at(4, 8),
            BatchUpdate {
                status: Some(BatchStatus::InStorage),
                quantity_delta_kg: 0.0,
                updated_at: at(4, 8),
            },
        )
        .unwrap();

        let all = repo.list(None).unwrap();
        assert_eq!(all[0].batch_id, "BATCH-2");
        let stored = repo.list(Some(BatchStatus::InStorage)).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].batch_id, "BATCH-1");
    }
}
