// src/db/tracker.rs

//! `InstalledSet` persisted in SQLite

use crate::error::{Error, Result};
use crate::installed::{InstalledSet, already_installed, not_installed};
use crate::package::{InstallReason, InstalledPackage, PackageDependency, PackageName};
use crate::version::{PackageVersion, VersionRange};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

/// Installed set stored in the `installed_packages` and
/// `installed_dependencies` tables
pub struct SqliteInstalledSet {
    conn: Connection,
}

impl std::fmt::Debug for SqliteInstalledSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteInstalledSet")
            .field("path", &self.conn.path())
            .finish()
    }
}

/// Raw row before version/reason parsing
struct InstalledRow {
    id: String,
    version: String,
    reason: String,
    installed_at: DateTime<Utc>,
}

impl InstalledRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            version: row.get(1)?,
            reason: row.get(2)?,
            installed_at: row.get(3)?,
        })
    }

    fn into_package(self) -> Result<InstalledPackage> {
        let reason = self
            .reason
            .parse::<InstallReason>()
            .map_err(Error::Config)?;
        Ok(InstalledPackage {
            name: PackageName::new(self.id, PackageVersion::parse(&self.version)?),
            installed_at: self.installed_at,
            reason,
        })
    }
}

impl SqliteInstalledSet {
    /// Wrap an already-migrated connection
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (and migrate) the database at `db_path`
    pub fn open(db_path: &str) -> Result<Self> {
        Ok(Self::new(super::open(db_path)?))
    }

    /// Private in-memory database, mainly for tests
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(super::open_in_memory()?))
    }

    /// Packages whose recorded dependencies name `id`
    pub fn find_dependents(&self, id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT package_id FROM installed_dependencies
             WHERE depends_on_id = ?1 ORDER BY package_id",
        )?;

        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(ids)
    }
}

impl InstalledSet for SqliteInstalledSet {
    fn get_installed(&self) -> Result<Vec<InstalledPackage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, version, reason, installed_at FROM installed_packages ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], InstalledRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(InstalledRow::into_package).collect()
    }

    fn installed_version(&self, id: &str) -> Result<Option<PackageVersion>> {
        let version: Option<String> = self
            .conn
            .query_row(
                "SELECT version FROM installed_packages WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        version.map(|v| PackageVersion::parse(&v)).transpose()
    }

    fn dependencies_of(&self, id: &str) -> Result<Vec<PackageDependency>> {
        let mut stmt = self.conn.prepare(
            "SELECT depends_on_id, version_range FROM installed_dependencies
             WHERE package_id = ?1 ORDER BY position",
        )?;

        let rows = stmt
            .query_map([id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(dep_id, range)| Ok(PackageDependency::new(dep_id, VersionRange::parse(&range)?)))
            .collect()
    }

    fn record_install(
        &mut self,
        name: &PackageName,
        dependencies: &[PackageDependency],
        reason: InstallReason,
    ) -> Result<()> {
        if let Some(existing) = self.installed_version(&name.id)? {
            return Err(already_installed(name, &existing));
        }

        debug!("Recording install of {} ({})", name, reason.as_str());
        super::transaction(&mut self.conn, |tx| {
            tx.execute(
                "INSERT INTO installed_packages (id, version, reason, installed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![&name.id, name.version.to_string(), reason.as_str(), Utc::now()],
            )?;

            for (position, dep) in dependencies.iter().enumerate() {
                tx.execute(
                    "INSERT INTO installed_dependencies (package_id, depends_on_id, version_range, position)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![&name.id, &dep.id, dep.range.to_string(), position as i64],
                )?;
            }

            Ok(())
        })
    }

    fn record_uninstall(&mut self, name: &PackageName) -> Result<()> {
        if !self.is_installed(&name.id, &name.version)? {
            return Err(not_installed(name));
        }

        debug!("Recording uninstall of {}", name);
        super::transaction(&mut self.conn, |tx| {
            tx.execute(
                "DELETE FROM installed_dependencies WHERE package_id = ?1",
                [&name.id],
            )?;
            tx.execute("DELETE FROM installed_packages WHERE id = ?1", [&name.id])?;
            Ok(())
        })
    }
}
