use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::info;

use super::IntakeError;

/// One row of the upload log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileUploadRecord {
    pub filename: String,
    pub uploaded_time: DateTime<Utc>,
    pub file_size: u64,
    pub total_pages: usize,
}

/// Relational log of uploaded files.
pub trait MetadataStore {
    /// Insert a record and return its row id.
    fn log_upload(&self, record: &FileUploadRecord) -> Result<i64, IntakeError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS file_uploads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    uploaded_time TEXT,
    file_size INTEGER,
    total_pages INTEGER
);";

/// SQLite-backed upload log. The table is created on open.
pub struct SqliteMetadataStore {
    conn: Mutex<Connection>,
}

impl SqliteMetadataStore {
    pub fn open(path: &Path) -> Result<Self, IntakeError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, IntakeError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, IntakeError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock still holds a usable connection.
        self.conn.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn get_upload(&self, id: i64) -> Result<Option<FileUploadRecord>, IntakeError> {
        let conn = self.lock();
        let record = conn
            .query_row(
                "SELECT filename, uploaded_time, file_size, total_pages
                 FROM file_uploads WHERE id = ?1",
                params![id],
                |row| {
                    Ok(FileUploadRecord {
                        filename: row.get(0)?,
                        uploaded_time: row.get(1)?,
                        file_size: row.get::<_, i64>(2)? as u64,
                        total_pages: row.get::<_, i64>(3)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn count_uploads(&self) -> Result<i64, IntakeError> {
        let conn = self.lock();
        Ok(conn.query_row("SELECT COUNT(*) FROM file_uploads", [], |row| row.get(0))?)
    }
}

impl MetadataStore for SqliteMetadataStore {
    fn log_upload(&self, record: &FileUploadRecord) -> Result<i64, IntakeError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO file_uploads (filename, uploaded_time, file_size, total_pages)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.filename,
                record.uploaded_time,
                record.file_size as i64,
                record.total_pages as i64,
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(id, filename = %record.filename, "Upload metadata logged");
        Ok(id)
    }
}
