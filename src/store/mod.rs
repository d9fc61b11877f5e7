//! SQLite-backed request history.

mod model;

pub use model::{ApiCallRecord, ApiCallView, NewApiCall};

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;

/// Repository for API call records.
///
/// Wraps a single SQLite connection behind a mutex; WAL mode keeps readers
/// from blocking the writer. Every operation is a single statement, so each
/// is individually atomic.
pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        // WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS api_calls (
                id INTEGER PRIMARY KEY,
                url TEXT NOT NULL,
                method TEXT NOT NULL,
                headers TEXT,
                body TEXT,
                proxy TEXT,
                response_status INTEGER,
                response_data TEXT,
                response_time REAL,
                timestamp INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        // Index for ordered history listing and the 24h window
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_api_calls_timestamp ON api_calls(timestamp)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|e| AppError::Storage(format!("lock error: {}", e)))
    }

    /// Insert a record, assigning its id and timestamp. Returns the new id.
    pub fn insert(&self, call: NewApiCall) -> Result<i64, AppError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO api_calls
                (url, method, headers, body, proxy,
                 response_status, response_data, response_time, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                call.url,
                call.method,
                call.headers,
                call.body,
                call.proxy,
                call.response_status,
                call.response_data,
                call.response_time,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent records first, at most `limit` of them.
    pub fn list(&self, limit: u32) -> Result<Vec<ApiCallRecord>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, url, method, headers, body, proxy,
                    response_status, response_data, response_time, timestamp
             FROM api_calls ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], row_to_record)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn get(&self, id: i64) -> Result<Option<ApiCallRecord>, AppError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT id, url, method, headers, body, proxy,
                        response_status, response_data, response_time, timestamp
                 FROM api_calls WHERE id = ?1",
                [id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Delete by id; `false` when no such record existed.
    pub fn delete(&self, id: i64) -> Result<bool, AppError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM api_calls WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    pub fn count_all(&self) -> Result<i64, AppError> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM api_calls", [], |row| row.get(0))?)
    }

    pub fn count_by_method(&self, method: &str) -> Result<i64, AppError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM api_calls WHERE method = ?1",
            [method],
            |row| row.get(0),
        )?)
    }

    /// Records created at or after the given UTC unix timestamp.
    pub fn count_since(&self, unix_seconds: i64) -> Result<i64, AppError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM api_calls WHERE timestamp >= ?1",
            [unix_seconds],
            |row| row.get(0),
        )?)
    }

    /// Mean response time over records that have one; `None` with no samples.
    pub fn average_response_time(&self) -> Result<Option<f64>, AppError> {
        let conn = self.lock()?;
        Ok(conn.query_row(
            "SELECT AVG(response_time) FROM api_calls WHERE response_time IS NOT NULL",
            [],
            |row| row.get(0),
        )?)
    }

    /// Trivial round-trip used by the liveness probes.
    pub fn ping(&self) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ApiCallRecord> {
    Ok(ApiCallRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        method: row.get(2)?,
        headers: row.get(3)?,
        body: row.get(4)?,
        proxy: row.get(5)?,
        response_status: row.get(6)?,
        response_data: row.get(7)?,
        response_time: row.get(8)?,
        timestamp: row.get(9)?,
    })
}
