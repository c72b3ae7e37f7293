//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply `ConnectionOptions` before handing the connection out.
//!
//! # Invariants
//! - Returned connections are in autocommit mode.

use super::{ConnectionOptions, DbResult, SqlConnection};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens a SQLite database file.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, options: &ConnectionOptions) -> DbResult<SqlConnection> {
    open_with("file", options, || Connection::open(path))
}

/// Opens a private in-memory SQLite database.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory(options: &ConnectionOptions) -> DbResult<SqlConnection> {
    open_with("memory", options, Connection::open_in_memory)
}

fn open_with(
    mode: &str,
    options: &ConnectionOptions,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<SqlConnection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = configure(&conn, options) {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    info!(
        "event=db_open module=db status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(SqlConnection::new(conn))
}

fn configure(conn: &Connection, options: &ConnectionOptions) -> rusqlite::Result<()> {
    let foreign_keys = if options.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(options.busy_timeout)?;
    Ok(())
}
