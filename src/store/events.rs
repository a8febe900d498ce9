// src/store/events.rs
//! Event persistence. Events are insert-once: the content hash is the key.

use chrono::Utc;
use rusqlite::{params, params_from_iter, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::categories::ensure_category_in;
use super::hash::event_hash;
use super::{ts_from_sql, ts_to_sql, RecordFilter, Store, StoreError};
use crate::ingest::types::CanonicalRecord;

impl Store {
    /// Insert an event unless one with the same content hash exists.
    /// Returns the new row id, or `None` for a duplicate (including a
    /// duplicate inserted concurrently by another writer).
    pub fn upsert_event(&self, record: &CanonicalRecord) -> Result<Option<i64>, StoreError> {
        let title = record.title.trim();
        if title.is_empty() {
            return Err(StoreError::Invalid("event title cannot be empty".into()));
        }
        let location = record.location.as_deref().unwrap_or_default();
        let hash = event_hash(title, &record.description, &record.category, location);

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM events WHERE content_hash = ?1",
                [&hash],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            debug!(title, "event already stored");
            return Ok(None);
        }

        let category_id = ensure_category_in(&tx, &record.category)?;
        let id: Option<i64> = tx
            .query_row(
                "INSERT INTO events (title, description, event_date, location,
                                     category_id, content_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(content_hash) DO NOTHING
                 RETURNING id",
                params![
                    title,
                    record.description,
                    ts_to_sql(&record.date),
                    location,
                    category_id,
                    hash,
                    ts_to_sql(&Utc::now()),
                ],
                |r| r.get(0),
            )
            .optional()?;
        tx.commit()?;
        Ok(id)
    }

    /// Events newest first.
    pub fn get_events(&self, filter: &RecordFilter) -> Result<Vec<CanonicalRecord>, StoreError> {
        let (clauses, values) = filter.clauses("e.event_date");
        let sql = format!(
            "SELECT e.title, e.description, e.event_date, e.location, c.name, e.content_hash
             FROM events e JOIN categories c ON c.id = e.category_id
             WHERE 1 = 1{clauses}
             ORDER BY e.event_date DESC, e.id DESC"
        );
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |r| {
            let date: String = r.get(2)?;
            let location: String = r.get(3)?;
            Ok(CanonicalRecord {
                title: r.get(0)?,
                description: r.get(1)?,
                date: ts_from_sql(2, &date)?,
                link: None,
                category: r.get(4)?,
                source: None,
                location: Some(location).filter(|l| !l.is_empty()),
                image_url: None,
                content_hash: r.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
