//! Latest published dataset.
//!
//! Readers get an `Arc` to a complete snapshot; publishing swaps the whole
//! `Arc`, so a reader holding the previous snapshot keeps a consistent view
//! and never sees a mix of two cycles.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::LoadError;
use crate::logging::{log_snapshot_summary, ts_now};
use crate::model::ProcessedDataset;
use crate::source::LoadedDataset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Failed { reason: String },
    Ready,
}

#[derive(Debug)]
pub struct Snapshot {
    pub dataset: ProcessedDataset,
    pub digest: String,
    pub loaded_at: String,
    /// Increments on every publish.
    pub generation: u64,
}

#[derive(Debug)]
struct Inner {
    state: LoadState,
    current: Option<Arc<Snapshot>>,
    generation: u64,
}

#[derive(Debug)]
pub struct SnapshotStore {
    inner: RwLock<Inner>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: LoadState::Loading,
                current: None,
                generation: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the current snapshot wholesale.
    pub fn publish(&self, loaded: LoadedDataset) -> Arc<Snapshot> {
        let mut inner = self.write();
        let unchanged = inner
            .current
            .as_ref()
            .map(|s| s.digest == loaded.digest)
            .unwrap_or(false);
        inner.generation += 1;
        let snapshot = Arc::new(Snapshot {
            digest: loaded.digest,
            loaded_at: ts_now(),
            generation: inner.generation,
            dataset: loaded.dataset,
        });
        inner.current = Some(Arc::clone(&snapshot));
        inner.state = LoadState::Ready;
        drop(inner);

        log_snapshot_summary(
            &snapshot.digest,
            snapshot.dataset.orchestrators.len(),
            snapshot.dataset.instance_count(),
            snapshot.dataset.dropped_instances,
            unchanged,
        );
        snapshot
    }

    /// A failed cycle leaves no dataset visible.
    pub fn fail(&self, err: &LoadError) {
        let mut inner = self.write();
        inner.current = None;
        inner.state = LoadState::Failed { reason: err.to_string() };
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.read().current.clone()
    }

    pub fn state(&self) -> LoadState {
        self.read().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.read().state, LoadState::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.read().state, LoadState::Failed { .. })
    }
}
