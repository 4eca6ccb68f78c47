//! SQLite-backed workshop store
//!
//! Same contract as the in-memory store: `seq` preserves insertion order and
//! eviction deletes the lowest `seq` values. Migrations are versioned with
//! `PRAGMA user_version`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use super::WorkshopStore;
use crate::error::Result;
use crate::types::{CalendarProvenance, WorkshopRecord};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: workshops table
    r#"
    CREATE TABLE IF NOT EXISTS workshops (
        seq              INTEGER PRIMARY KEY AUTOINCREMENT,
        id               TEXT NOT NULL UNIQUE,
        title            TEXT NOT NULL,
        students         INTEGER NOT NULL DEFAULT 0,
        duration         TEXT NOT NULL,
        rating           REAL NOT NULL DEFAULT 0,
        status           TEXT NOT NULL,
        date             TEXT NOT NULL,
        created_at       DATETIME NOT NULL,
        source           TEXT,
        provenance       JSON
    );

    CREATE INDEX IF NOT EXISTS idx_workshops_date ON workshops(date);
    "#,
];

/// Run all pending migrations
fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Workshop store on a single SQLite connection
pub struct SqliteWorkshopStore {
    conn: Mutex<Connection>,
    capacity: usize,
}

impl SqliteWorkshopStore {
    /// Open or create a store at the given path
    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        Self::from_connection(conn, capacity)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory(capacity: usize) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, capacity)
    }

    fn from_connection(conn: Connection, capacity: usize) -> Result<Self> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            capacity: capacity.max(1),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<WorkshopRecord> {
        let status_str: String = row.get("status")?;
        let date_str: String = row.get("date")?;
        let created_at_str: String = row.get("created_at")?;
        let provenance_str: Option<String> = row.get("provenance")?;
        let students: i64 = row.get("students")?;

        Ok(WorkshopRecord {
            id: row.get("id")?,
            title: row.get("title")?,
            students: u32::try_from(students).unwrap_or(0),
            duration: row.get("duration")?,
            rating: row.get("rating")?,
            status: status_str.parse().unwrap_or_default(),
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .unwrap_or_else(|_| Utc::now().date_naive()),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            source: row.get("source")?,
            provenance: provenance_str
                .and_then(|s| serde_json::from_str::<CalendarProvenance>(&s).ok()),
        })
    }

    fn delete_oldest(conn: &Connection, count: usize) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM workshops WHERE seq IN (SELECT seq FROM workshops ORDER BY seq ASC LIMIT ?1)",
            [count as i64],
        )?;
        Ok(deleted)
    }
}

impl WorkshopStore for SqliteWorkshopStore {
    fn append(&self, record: WorkshopRecord) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let provenance = record
            .provenance
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        tx.execute(
            r#"
            INSERT INTO workshops (id, title, students, duration, rating, status, date, created_at, source, provenance)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.id,
                record.title,
                record.students as i64,
                record.duration,
                record.rating,
                record.status.as_str(),
                record.date.format("%Y-%m-%d").to_string(),
                record.created_at.to_rfc3339(),
                record.source,
                provenance,
            ],
        )?;

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM workshops", [], |r| r.get(0))?;
        let overflow = (count as usize).saturating_sub(self.capacity);
        let evicted = if overflow > 0 {
            Self::delete_oldest(&tx, overflow)?
        } else {
            0
        };

        tx.commit()?;
        if evicted > 0 {
            tracing::debug!(evicted, capacity = self.capacity, "Evicted oldest workshops");
        }
        Ok(evicted)
    }

    fn list(&self) -> Result<Vec<WorkshopRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM workshops ORDER BY seq ASC")?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn evict_oldest(&self, count: usize) -> Result<usize> {
        let conn = self.conn();
        Self::delete_oldest(&conn, count)
    }

    fn len(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM workshops", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
