use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::entity::WorkOrder;
use crate::error::{Result, WorkshopError};

const CACHE_DB: &str = "cache.db";
const VERSION_KEY: &str = "loro_version";

/// SQLite mirror of the order collection for full-text search and stats
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open `cache.db` in the project directory, creating tables as needed
    pub fn open(project_dir: &Path) -> Result<Self> {
        let cache = Self {
            conn: Connection::open(project_dir.join(CACHE_DB))?,
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS work_orders (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                place TEXT NOT NULL,
                due_date TEXT NOT NULL,
                state TEXT NOT NULL,
                items TEXT,
                notes TEXT,
                created_by TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE VIRTUAL TABLE IF NOT EXISTS work_orders_fts USING fts5(
                id,
                name,
                place,
                notes,
                items,
                content='work_orders',
                content_rowid='rowid'
            )",
            [],
        )?;

        // Keep FTS in sync with work_orders
        self.conn.execute_batch(
            "
            CREATE TRIGGER IF NOT EXISTS work_orders_ai AFTER INSERT ON work_orders BEGIN
                INSERT INTO work_orders_fts(rowid, id, name, place, notes, items)
                VALUES (new.rowid, new.id, new.name, new.place, new.notes, new.items);
            END;

            CREATE TRIGGER IF NOT EXISTS work_orders_ad AFTER DELETE ON work_orders BEGIN
                INSERT INTO work_orders_fts(work_orders_fts, rowid, id, name, place, notes, items)
                VALUES ('delete', old.rowid, old.id, old.name, old.place, old.notes, old.items);
            END;

            CREATE TRIGGER IF NOT EXISTS work_orders_au AFTER UPDATE ON work_orders BEGIN
                INSERT INTO work_orders_fts(work_orders_fts, rowid, id, name, place, notes, items)
                VALUES ('delete', old.rowid, old.id, old.name, old.place, old.notes, old.items);
                INSERT INTO work_orders_fts(rowid, id, name, place, notes, items)
                VALUES (new.rowid, new.id, new.name, new.place, new.notes, new.items);
            END;
            ",
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_work_orders_due ON work_orders(due_date)",
            [],
        )?;

        Ok(())
    }

    fn meta(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Version vector of the document the cache was last built from
    pub fn get_loro_version(&self) -> Result<Option<String>> {
        self.meta(VERSION_KEY)
    }

    pub fn set_loro_version(&self, version: &str) -> Result<()> {
        self.set_meta(VERSION_KEY, version)
    }

    /// Index a work order in the cache
    pub fn index_order(&self, order: &WorkOrder) -> Result<()> {
        let items_str = order
            .items
            .iter()
            .map(|i| i.label())
            .collect::<Vec<_>>()
            .join(", ");

        self.conn.execute(
            "INSERT OR REPLACE INTO work_orders
             (id, name, place, due_date, state, items, notes, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                order.id,
                order.name,
                order.place,
                order.due_date.format("%Y-%m-%d").to_string(),
                order.state.to_string(),
                items_str,
                order.notes,
                order.created_by,
                order.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Drop every cached order and the stored version
    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM work_orders; DELETE FROM meta;")?;
        Ok(())
    }

    /// Full-text search over name, place, notes and items.
    ///
    /// Every whitespace-separated term must match; terms are taken literally,
    /// so FTS5 operators and stray quotes in the input are not interpreted.
    pub fn search_orders(&self, query: &str) -> Result<Vec<OrderSearchResult>> {
        let Some(query) = fts_terms(query) else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(
            "SELECT o.id, o.name, o.place, o.due_date, o.state,
                    snippet(work_orders_fts, -1, '[', ']', '...', 16) as snippet
             FROM work_orders_fts f
             JOIN work_orders o ON o.id = f.id
             WHERE work_orders_fts MATCH ?1
             ORDER BY rank
             LIMIT 50",
        )?;

        let results = stmt
            .query_map([query.as_str()], |row| {
                Ok(OrderSearchResult {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    place: row.get(2)?,
                    due_date: row.get(3)?,
                    state: row.get(4)?,
                    snippet: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }

    /// Order counts by lifecycle state
    pub fn get_stats(&self) -> Result<CacheStats> {
        let count_state = |state: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM work_orders WHERE state = ?1",
                [state],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };

        let order_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM work_orders", [], |row| row.get(0))?;

        Ok(CacheStats {
            order_count: order_count as usize,
            pending: count_state("pending")?,
            in_progress: count_state("in_progress")?,
            done: count_state("done")?,
        })
    }

    /// Rebuild from `orders` unless the cache already matches `loro_version`.
    /// Returns true when it rebuilt.
    pub fn sync_from_loro(&self, orders: &[WorkOrder], loro_version: &str) -> Result<bool> {
        if self.get_loro_version()?.as_deref() == Some(loro_version) {
            return Ok(false);
        }

        // One transaction so an interrupted rebuild leaves the old index
        let tx = self.conn.unchecked_transaction()?;
        self.clear()?;
        for order in orders {
            self.index_order(order)?;
        }
        self.set_loro_version(loro_version)?;
        tx.commit()?;

        Ok(true)
    }
}

/// Quote each term as an FTS5 string. `None` when there is nothing to search.
fn fts_terms(raw: &str) -> Option<String> {
    let terms: Vec<String> = raw
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" "))
}

/// Search result from full-text search
#[derive(Debug, Clone)]
pub struct OrderSearchResult {
    pub id: String,
    pub name: String,
    pub place: String,
    pub due_date: String,
    pub state: String,
    pub snippet: Option<String>,
}

/// Counts reported by [`SqliteCache::get_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub order_count: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl From<rusqlite::Error> for WorkshopError {
    fn from(e: rusqlite::Error) -> Self {
        WorkshopError::Storage(format!("SQLite error: {}", e))
    }
}
