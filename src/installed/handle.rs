// src/installed/handle.rs

//! Single-owner handle over an installed set
//!
//! Every reader and writer goes through a `TrackerHandle`. The data sits
//! behind a blocking lock that snapshots and executions both take. A separate
//! execution flag is claimed without waiting by `try_acquire`, so a second
//! execution against the same set fails instead of interleaving, while a
//! reader only ever delays an execution.

use super::{InstalledSet, MemoryInstalledSet};
use crate::error::{Error, Result};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedSet = Box<dyn InstalledSet + Send>;

struct Shared {
    set: Mutex<SharedSet>,
    executing: AtomicBool,
}

/// Cloneable handle to one installed set
#[derive(Clone)]
pub struct TrackerHandle {
    inner: Arc<Shared>,
}

impl std::fmt::Debug for TrackerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerHandle")
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl TrackerHandle {
    pub fn new<T: InstalledSet + Send + 'static>(set: T) -> Self {
        Self {
            inner: Arc::new(Shared {
                set: Mutex::new(Box::new(set)),
                executing: AtomicBool::new(false),
            }),
        }
    }

    /// Take an immutable copy of the current state
    ///
    /// Waits for a running execution to finish its batch.
    pub fn snapshot(&self) -> Result<MemoryInstalledSet> {
        MemoryInstalledSet::snapshot_of(&**self.lock_set())
    }

    /// Acquire exclusive access for an execution
    ///
    /// Returns `ConcurrentExecution` if another execution holds the set. A
    /// snapshot in progress is waited for.
    pub fn try_acquire(&self) -> Result<TrackerGuard<'_>> {
        if self
            .inner
            .executing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::ConcurrentExecution);
        }

        Ok(TrackerGuard {
            guard: self.lock_set(),
            executing: &self.inner.executing,
        })
    }

    /// Whether an execution currently holds the set
    pub fn is_busy(&self) -> bool {
        self.inner.executing.load(Ordering::Acquire)
    }

    // A panic mid-execution leaves committed records in place, which is the
    // same state partial execution would leave.
    fn lock_set(&self) -> MutexGuard<'_, SharedSet> {
        self.inner.set.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access to the installed set for the lifetime of the guard
pub struct TrackerGuard<'a> {
    guard: MutexGuard<'a, SharedSet>,
    executing: &'a AtomicBool,
}

impl Drop for TrackerGuard<'_> {
    fn drop(&mut self) {
        self.executing.store(false, Ordering::Release);
    }
}

impl Deref for TrackerGuard<'_> {
    type Target = dyn InstalledSet + Send;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for TrackerGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}
