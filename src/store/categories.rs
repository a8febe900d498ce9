// src/store/categories.rs
//! Category reference data: ensure-or-create plus admin operations.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use tracing::{debug, info};

use super::{Store, StoreError};

/// Reserved category that receives records of deleted categories.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

fn validated(name: &str) -> Result<&str, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Invalid("category name cannot be empty".into()));
    }
    Ok(name)
}

/// Look up `name`, inserting it first if absent. Racing inserts collapse on
/// the UNIQUE(name) constraint, so every caller ends up with the same id.
pub(crate) fn ensure_category_in(conn: &Connection, name: &str) -> Result<i64, StoreError> {
    let name = validated(name)?;
    let inserted = conn.execute(
        "INSERT INTO categories (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        [name],
    )?;
    if inserted > 0 {
        debug!(category = name, "created category");
    }
    let id = conn.query_row("SELECT id FROM categories WHERE name = ?1", [name], |r| {
        r.get(0)
    })?;
    Ok(id)
}

impl Store {
    pub fn ensure_category(&self, name: &str) -> Result<i64, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = ensure_category_in(&tx, name)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], |r| {
            Ok(Category {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Returns `false` when `old` does not exist.
    pub fn rename_category(&self, old: &str, new: &str) -> Result<bool, StoreError> {
        let old = validated(old)?;
        let new = validated(new)?;
        if old == UNCATEGORIZED {
            return Err(StoreError::Invalid(format!("`{UNCATEGORIZED}` is reserved")));
        }
        let conn = self.connect()?;
        match conn.execute(
            "UPDATE categories SET name = ?1 WHERE name = ?2",
            params![new, old],
        ) {
            Ok(n) => {
                if n > 0 {
                    info!(from = old, to = new, "renamed category");
                }
                Ok(n > 0)
            }
            Err(e) if StoreError::is_constraint(&e) => Err(StoreError::Conflict(new.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete `name`, moving its news and events to `Uncategorized`.
    /// Returns `false` when `name` does not exist.
    pub fn delete_category(&self, name: &str) -> Result<bool, StoreError> {
        let name = validated(name)?;
        if name == UNCATEGORIZED {
            return Err(StoreError::Invalid(format!(
                "`{UNCATEGORIZED}` cannot be deleted"
            )));
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(id): Option<i64> = tx
            .query_row("SELECT id FROM categories WHERE name = ?1", [name], |r| {
                r.get(0)
            })
            .optional()?
        else {
            return Ok(false);
        };
        let fallback = ensure_category_in(&tx, UNCATEGORIZED)?;
        let moved_news = tx.execute(
            "UPDATE news SET category_id = ?1 WHERE category_id = ?2",
            params![fallback, id],
        )?;
        let moved_events = tx.execute(
            "UPDATE events SET category_id = ?1 WHERE category_id = ?2",
            params![fallback, id],
        )?;
        tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
        tx.commit()?;

        info!(
            category = name,
            moved_news, moved_events, "deleted category"
        );
        Ok(true)
    }
}
