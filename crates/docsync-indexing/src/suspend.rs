//! Scoped suspension of index updates.
//!
//! While any [`SuspendGuard`] from a context is alive, bound listeners skip
//! index writes; the record store is still updated. Guards nest: indexing
//! resumes only when the last one is dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Shared suspension state. Clones observe the same depth.
#[derive(Debug, Clone, Default)]
pub struct IndexingContext {
    depth: Arc<AtomicUsize>,
}

impl IndexingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend indexing until the returned guard is dropped.
    pub fn suspend(&self) -> SuspendGuard {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(depth, "Indexing suspended");
        SuspendGuard {
            depth: self.depth.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.depth.load(Ordering::SeqCst) == 0
    }

    /// Number of live guards.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Keeps indexing suspended while alive.
#[must_use = "indexing resumes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SuspendGuard {
    depth: Arc<AtomicUsize>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        let depth = self.depth.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(depth, "Indexing suspension released");
    }
}
