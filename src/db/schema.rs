// src/db/schema.rs

//! Installed-set schema and its migrations
//!
//! `MIGRATIONS` lists every schema step in order. A database records the
//! steps it has applied in `schema_version`; `migrate` applies the rest,
//! each inside its own transaction.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Ordered schema steps: (version, SQL)
const MIGRATIONS: &[(i32, &str)] = &[(
    1,
    "
    CREATE TABLE installed_packages (
        id TEXT PRIMARY KEY,
        version TEXT NOT NULL,
        reason TEXT NOT NULL CHECK(reason IN ('explicit', 'dependency')),
        installed_at TEXT NOT NULL
    );

    CREATE TABLE installed_dependencies (
        package_id TEXT NOT NULL,
        depends_on_id TEXT NOT NULL,
        version_range TEXT NOT NULL,
        position INTEGER NOT NULL,
        PRIMARY KEY (package_id, position),
        FOREIGN KEY (package_id) REFERENCES installed_packages(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_installed_dependencies_target
        ON installed_dependencies(depends_on_id);
    ",
)];

/// Version the newest migration brings a database to
pub const SCHEMA_VERSION: i32 = MIGRATIONS[MIGRATIONS.len() - 1].0;

/// Highest applied version, 0 for a fresh database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )?;

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

/// Bring the database up to `SCHEMA_VERSION`
pub fn migrate(conn: &Connection) -> Result<()> {
    let current = get_schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(Error::Config(format!(
            "database schema version {current} is newer than this build supports ({SCHEMA_VERSION})"
        )));
    }

    let pending: Vec<&(i32, &str)> = MIGRATIONS.iter().filter(|(v, _)| *v > current).collect();
    if pending.is_empty() {
        debug!("Schema is current at version {}", current);
        return Ok(());
    }

    for (version, sql) in pending {
        info!("Applying schema migration {}", version);
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
    }

    info!("Schema now at version {}", SCHEMA_VERSION);
    Ok(())
}
