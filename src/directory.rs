// src/directory.rs

//! Contract with the work-item collaborator.
//!
//! The engine never owns work items. It asks an [`ItemDirectory`] whether an
//! item exists (when an edge is added), what its estimate is (when it is first
//! tracked), and what its workflow status is (when a snapshot is built).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

use tracing::warn;

use crate::types::{ItemId, ItemStatus, Weight};

/// Read-only view of the work-item store.
pub trait ItemDirectory: Send + Sync {
    fn item_exists(&self, id: &ItemId) -> bool;

    /// `None` if the directory does not know the item.
    fn item_status(&self, id: &ItemId) -> Option<ItemStatus>;

    /// Estimated effort; `None` means the default weight applies.
    fn item_estimate(&self, _id: &ItemId) -> Option<Weight> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ItemRecord {
    status: ItemStatus,
    estimate: Option<Weight>,
}

/// Simple thread-safe directory backed by a map.
///
/// Used by the CLI (populated from the graph file) and by tests. Status
/// changes made here are not observed by the engine until
/// `Engine::notify_status_changed` is called.
#[derive(Default)]
pub struct InMemoryDirectory {
    items: RwLock<BTreeMap<ItemId, ItemRecord>>,
}

impl fmt::Debug for InMemoryDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.items.read().map(|items| items.len()).unwrap_or(0);
        f.debug_struct("InMemoryDirectory")
            .field("items", &len)
            .finish()
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    pub fn insert(&self, id: ItemId, status: ItemStatus, estimate: Option<Weight>) {
        match self.items.write() {
            Ok(mut items) => {
                items.insert(id, ItemRecord { status, estimate });
            }
            Err(err) => warn!(item = %id, "directory lock poisoned: {err}"),
        }
    }

    /// Change the status of a known item. Returns `false` if it is unknown.
    pub fn set_status(&self, id: &ItemId, status: ItemStatus) -> bool {
        match self.items.write() {
            Ok(mut items) => match items.get_mut(id) {
                Some(record) => {
                    record.status = status;
                    true
                }
                None => false,
            },
            Err(err) => {
                warn!(item = %id, "directory lock poisoned: {err}");
                false
            }
        }
    }

    pub fn remove(&self, id: &ItemId) -> bool {
        self.items
            .write()
            .map(|mut items| items.remove(id).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, id: &ItemId) -> Option<ItemRecord> {
        self.items.read().ok().and_then(|items| items.get(id).copied())
    }
}

impl ItemDirectory for InMemoryDirectory {
    fn item_exists(&self, id: &ItemId) -> bool {
        self.record(id).is_some()
    }

    fn item_status(&self, id: &ItemId) -> Option<ItemStatus> {
        self.record(id).map(|r| r.status)
    }

    fn item_estimate(&self, id: &ItemId) -> Option<Weight> {
        self.record(id).and_then(|r| r.estimate)
    }
}
