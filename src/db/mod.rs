// src/db/mod.rs

//! SQLite persistence for the installed set
//!
//! - `schema`: versioned migrations
//! - `tracker`: `SqliteInstalledSet`, an `InstalledSet` stored in SQLite
//! - `lock`: cross-process execution lock beside the database file

mod lock;
pub mod schema;
mod tracker;

pub use lock::ExecutionLock;
pub use tracker::SqliteInstalledSet;

use crate::error::Result;
use rusqlite::{Connection, Transaction};
use std::fs;
use std::path::Path;
use tracing::info;

/// Create the database file (and parent directories) and apply migrations
pub fn init(db_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    info!("Initializing installed-set database at {}", db_path);
    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(())
}

/// Open an existing database, applying any pending migrations
pub fn open(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// Run `f` inside a SQLite transaction, committing on success
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
