//! Database layer for vet-clinic.

mod schema;
mod appointments;
mod clinical;
mod combinations;
mod owners;
mod patients;
mod resources;

pub use schema::*;
#[allow(unused_imports)]
pub use appointments::*;
#[allow(unused_imports)]
pub use combinations::*;
#[allow(unused_imports)]
pub use resources::*;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Storage format for timestamps. Fixed width so text comparison orders correctly.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Storage format for dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn timestamp_to_sql(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn timestamp_from_sql(s: &str) -> DbResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| DbError::Constraint(format!("Invalid timestamp {:?}: {}", s, e)))
}

pub(crate) fn date_to_sql(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn date_from_sql(s: &str) -> DbResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| DbError::Constraint(format!("Invalid date {:?}: {}", s, e)))
}

pub(crate) fn optional_date_from_sql(s: Option<String>) -> DbResult<Option<NaiveDate>> {
    s.as_deref().map(date_from_sql).transpose()
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a savepoint: released on success, rolled back on error.
    ///
    /// Savepoints nest, so this works both at top level and inside an
    /// enclosing transaction or savepoint.
    pub fn with_savepoint<T, E, F>(&self, name: &'static str, f: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce() -> Result<T, E>,
    {
        self.conn
            .execute_batch(&format!("SAVEPOINT {}", name))
            .map_err(DbError::from)?;

        match f() {
            Ok(value) => {
                self.conn
                    .execute_batch(&format!("RELEASE {}", name))
                    .map_err(DbError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))
                {
                    tracing::warn!(savepoint = name, error = %rollback, "Savepoint rollback failed");
                }
                Err(e)
            }
        }
    }
}
