//! # folio-db
//!
//! Database access layer for the folio settlement pipeline.
//! Manages a single SQLite database holding the consumption inputs and the
//! generated settlement outputs.
//!
//! ## Conventions
//!
//! - WAL mode mandatory, foreign keys enforced
//! - All timestamps are Unix epoch seconds (i64)
//! - All money columns are TEXT holding canonical decimal strings
//! - Settlement months are TEXT `YYYY-MM`
//! - Schema version stored in `PRAGMA user_version`

pub mod migrations;
pub mod queries;
pub mod schema;

use std::path::Path;
use std::str::FromStr;

use rusqlite::Connection;
use rust_decimal::Decimal;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("malformed stored value: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the settlement database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;",
    )?;
    Ok(())
}

/// Parse a TEXT money column back into an exact decimal.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| DbError::Malformed(format!("{column}: {raw:?} is not a decimal: {e}")))
}
