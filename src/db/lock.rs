// src/db/lock.rs

//! Cross-process execution lock
//!
//! The in-process `TrackerHandle` serializes executions within one process.
//! Separate processes sharing one database take this exclusive file lock
//! before executing.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Held exclusive lock on `<db_path>.lock`; released on drop
#[derive(Debug)]
pub struct ExecutionLock {
    file: File,
    path: PathBuf,
}

impl ExecutionLock {
    /// Lock file path for a database path
    pub fn lock_path(db_path: &Path) -> PathBuf {
        let mut name = db_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Try to take the lock without waiting
    ///
    /// Returns `ConcurrentExecution` if another process holds it.
    pub fn try_acquire(db_path: &Path) -> Result<Self> {
        let path = Self::lock_path(db_path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired execution lock {}", path.display());
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                warn!("Execution lock {} is held by another process", path.display());
                Err(Error::ConcurrentExecution)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ExecutionLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release execution lock {}: {}", self.path.display(), e);
        }
    }
}
