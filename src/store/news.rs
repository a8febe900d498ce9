// src/store/news.rs
//! News persistence. Rows are unique on `(title, source)`; a re-fetch
//! overwrites the mutable columns instead of adding a row. The category of
//! an existing row is never touched, so admin renames and deletes stick.

use chrono::Utc;
use rusqlite::{params, params_from_iter, OptionalExtension, TransactionBehavior};

use super::categories::ensure_category_in;
use super::hash::news_hash;
use super::{ts_from_sql, ts_to_sql, RecordFilter, Store, StoreError};
use crate::ingest::types::CanonicalRecord;

impl Store {
    /// Insert or refresh one news record in its own transaction.
    /// Returns the row id, or `None` if nothing was written.
    pub fn upsert_news(&self, record: &CanonicalRecord) -> Result<Option<i64>, StoreError> {
        let title = record.title.trim();
        if title.is_empty() {
            return Err(StoreError::Invalid("news title cannot be empty".into()));
        }
        let source = record.source.as_deref().unwrap_or_default();
        let hash = news_hash(title, &record.description, &record.category, source);
        let now = ts_to_sql(&Utc::now());

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let category_id = ensure_category_in(&tx, &record.category)?;
        let id: Option<i64> = tx
            .query_row(
                "INSERT INTO news (title, description, publication_date, source, link,
                                   category_id, content_hash, image_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                 ON CONFLICT(title, source) DO UPDATE SET
                     description      = excluded.description,
                     publication_date = excluded.publication_date,
                     link             = excluded.link,
                     content_hash     = excluded.content_hash,
                     image_url        = excluded.image_url,
                     updated_at       = excluded.updated_at
                 RETURNING id",
                params![
                    title,
                    record.description,
                    ts_to_sql(&record.date),
                    source,
                    record.link,
                    category_id,
                    hash,
                    record.image_url,
                    now,
                ],
                |r| r.get(0),
            )
            .optional()?;
        tx.commit()?;
        Ok(id)
    }

    /// News newest first.
    pub fn get_news(&self, filter: &RecordFilter) -> Result<Vec<CanonicalRecord>, StoreError> {
        let (clauses, values) = filter.clauses("n.publication_date");
        let sql = format!(
            "SELECT n.title, n.description, n.publication_date, n.link, c.name,
                    n.source, n.image_url, n.content_hash
             FROM news n JOIN categories c ON c.id = n.category_id
             WHERE 1 = 1{clauses}
             ORDER BY n.publication_date DESC, n.id DESC"
        );
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |r| {
            let date: String = r.get(2)?;
            let source: String = r.get(5)?;
            Ok(CanonicalRecord {
                title: r.get(0)?,
                description: r.get(1)?,
                date: ts_from_sql(2, &date)?,
                link: r.get(3)?,
                category: r.get(4)?,
                source: Some(source).filter(|s| !s.is_empty()),
                location: None,
                image_url: r.get(6)?,
                content_hash: r.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
