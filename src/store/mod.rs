// src/store/mod.rs
//! Persistent store (SQLite).
//!
//! Every operation opens its own connection, so concurrent writers (tasks,
//! threads or other processes) are serialized by SQLite itself; duplicate
//! rows are prevented by uniqueness constraints, not application locks.

pub mod categories;
pub mod events;
pub mod hash;
pub mod news;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;
use tracing::info;

pub use categories::{Category, UNCATEGORIZED};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("category `{0}` already exists")]
    Conflict(String),
    #[error("blocking task failed: {0}")]
    Join(String),
}

impl StoreError {
    fn is_constraint(err: &rusqlite::Error) -> bool {
        matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
    }
}

/// Optional filters for read-back. `category == "All"` means no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

impl RecordFilter {
    /// `AND ...` clauses plus their positional values.
    fn clauses(&self, date_col: &str) -> (String, Vec<String>) {
        let mut sql = String::new();
        let mut values = Vec::new();
        if let Some(start) = &self.start {
            values.push(ts_to_sql(start));
            sql.push_str(&format!(" AND {date_col} >= ?{}", values.len()));
        }
        if let Some(end) = &self.end {
            values.push(ts_to_sql(end));
            sql.push_str(&format!(" AND {date_col} <= ?{}", values.len()));
        }
        if let Some(cat) = self.category.as_deref().filter(|c| *c != "All") {
            values.push(cat.to_string());
            sql.push_str(&format!(" AND c.name = ?{}", values.len()));
        }
        (sql, values)
    }
}

/// Fixed-width UTC text, so lexical order is time order.
pub(crate) fn ts_to_sql(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn ts_from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS events (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    event_date   TEXT NOT NULL,
    location     TEXT NOT NULL DEFAULT '',
    category_id  INTEGER NOT NULL REFERENCES categories(id),
    content_hash TEXT NOT NULL UNIQUE,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS news (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    title            TEXT NOT NULL,
    description      TEXT NOT NULL DEFAULT '',
    publication_date TEXT NOT NULL,
    source           TEXT NOT NULL DEFAULT '',
    link             TEXT,
    category_id      INTEGER NOT NULL REFERENCES categories(id),
    content_hash     TEXT NOT NULL,
    image_url        TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE (title, source)
);

CREATE INDEX IF NOT EXISTS idx_events_date ON events(event_date DESC);
CREATE INDEX IF NOT EXISTS idx_news_publication ON news(publication_date DESC);
CREATE INDEX IF NOT EXISTS idx_news_hash ON news(content_hash);

INSERT OR IGNORE INTO categories (name) VALUES ('Uncategorized');
";

/// Handle to the database file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the database and apply the schema.
    /// Accepts a plain path or a `sqlite://` URL.
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        let raw = database_url.trim();
        let path = raw
            .strip_prefix("sqlite://")
            .or_else(|| raw.strip_prefix("sqlite:"))
            .unwrap_or(raw);
        if path.is_empty() || path == ":memory:" {
            return Err(StoreError::Invalid(
                "database path must name a file shared by all connections".into(),
            ));
        }

        let db_path = PathBuf::from(path);
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self { db_path };
        store.init()?;
        info!(path = %store.db_path.display(), "store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn init(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    /// Run a blocking store call on tokio's blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_utc() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let s = ts_to_sql(&a);
        assert_eq!(s, "2024-01-02T03:04:05.000000Z");
        assert_eq!(ts_from_sql(0, &s).unwrap(), a);
    }

    #[test]
    fn filter_clauses_number_params_in_order() {
        let f = RecordFilter {
            start: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            end: None,
            category: Some("Launch".into()),
        };
        let (sql, values) = f.clauses("n.publication_date");
        assert_eq!(sql, " AND n.publication_date >= ?1 AND c.name = ?2");
        assert_eq!(values.len(), 2);

        let all = RecordFilter {
            category: Some("All".into()),
            ..Default::default()
        };
        assert_eq!(all.clauses("x").0, "");
    }

    #[test]
    fn open_rejects_in_memory_and_accepts_url_form() {
        assert!(matches!(Store::open(":memory:"), Err(StoreError::Invalid(_))));
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("feed.db").display());
        let store = Store::open(&url).unwrap();
        assert!(store.path().ends_with("feed.db"));
    }
}
