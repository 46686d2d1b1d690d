//! Keyed registry of floating fragments.
//!
//! Every operation takes the registry lock for its whole read-modify-write
//! sequence. Change notifications are emitted after the lock is released, so a
//! subscriber may call back into the registry.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use horizon_overlay_core::Signal;
use horizon_overlay_core::logging::targets;
use parking_lot::Mutex;

use crate::error::{PortalError, PortalResult};
use crate::id::PortalId;
use crate::portal::item::PortalItem;

/// What happened to a portal item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortalChangeKind {
    Added,
    Updated,
    Removed,
}

/// Payload of [`PortalRegistry::on_change`].
#[derive(Debug, Clone)]
pub struct PortalChange {
    pub kind: PortalChangeKind,
    pub id: PortalId,
    /// The stored item after the change; for removals, the item that was removed.
    pub item: PortalItem,
}

/// A thread-safe map from [`PortalId`] to [`PortalItem`].
pub struct PortalRegistry {
    items: Mutex<BTreeMap<PortalId, PortalItem>>,
    len: AtomicUsize,
    disposed: AtomicBool,
    on_change: Signal<PortalChange>,
}

static_assertions::assert_impl_all!(PortalRegistry: Send, Sync);

impl Default for PortalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PortalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalRegistry")
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl PortalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            len: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
            on_change: Signal::new(),
        }
    }

    /// Emitted after every effective add, update and remove.
    pub fn on_change(&self) -> &Signal<PortalChange> {
        &self.on_change
    }

    /// Insert a copy of `item` unless its id is already present.
    ///
    /// Returns whether the item was inserted. Adding to a disposed registry
    /// does nothing.
    pub fn add(&self, item: &PortalItem) -> bool {
        let change = {
            let mut items = self.items.lock();
            if self.is_disposed() || items.contains_key(&item.id) {
                return false;
            }
            items.insert(item.id, item.clone());
            self.len.store(items.len(), Ordering::Release);
            PortalChange {
                kind: PortalChangeKind::Added,
                id: item.id,
                item: item.clone(),
            }
        };
        tracing::debug!(target: targets::PORTAL, id = %item.id, "portal item added");
        self.on_change.emit(change);
        true
    }

    /// Replace the stored item with a copy of `item`.
    ///
    /// Updating an id that was never added is a logic error and fails with
    /// [`PortalError::ItemNotFound`]; it never inserts.
    pub fn update(&self, item: &PortalItem) -> PortalResult<()> {
        let change = {
            let mut items = self.items.lock();
            if self.is_disposed() {
                return Err(PortalError::Disposed);
            }
            let slot = items.get_mut(&item.id).ok_or(PortalError::ItemNotFound(item.id))?;
            *slot = item.clone();
            PortalChange {
                kind: PortalChangeKind::Updated,
                id: item.id,
                item: item.clone(),
            }
        };
        tracing::trace!(target: targets::PORTAL, id = %item.id, "portal item updated");
        self.on_change.emit(change);
        Ok(())
    }

    /// Remove the item with `id`. Returns whether anything was removed.
    pub fn remove(&self, id: PortalId) -> bool {
        if self.len.load(Ordering::Acquire) == 0 {
            return false;
        }
        let change = {
            let mut items = self.items.lock();
            let Some(item) = items.remove(&id) else {
                return false;
            };
            self.len.store(items.len(), Ordering::Release);
            PortalChange {
                kind: PortalChangeKind::Removed,
                id,
                item,
            }
        };
        tracing::debug!(target: targets::PORTAL, %id, "portal item removed");
        self.on_change.emit(change);
        true
    }

    /// A copy of the item with `id`.
    pub fn get_item(&self, id: PortalId) -> Option<PortalItem> {
        self.items.lock().get(&id).cloned()
    }

    /// Whether an item with `id` is present.
    pub fn contains(&self, id: PortalId) -> bool {
        self.items.lock().contains_key(&id)
    }

    /// Copies of all items in id order.
    pub fn items(&self) -> Vec<PortalItem> {
        self.items.lock().values().cloned().collect()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether no item is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Clear the registry and refuse further changes. Idempotent.
    ///
    /// No change notifications are emitted for the cleared items.
    pub fn dispose(&self) {
        let mut items = self.items.lock();
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let cleared = items.len();
        items.clear();
        self.len.store(0, Ordering::Release);
        drop(items);
        self.on_change.disconnect_all();
        tracing::debug!(target: targets::PORTAL, cleared, "portal registry disposed");
    }
}

/// The process-wide registry used when no scoped registry is supplied.
pub fn global_portal_registry() -> Arc<PortalRegistry> {
    static REGISTRY: OnceLock<Arc<PortalRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Arc::new(PortalRegistry::new())).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(registry: &PortalRegistry) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        registry.on_change().connect(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_add_get_remove() {
        let registry = PortalRegistry::new();
        let item = PortalItem::new(PortalId::new());
        assert!(registry.is_empty());
        assert!(registry.add(&item));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(item.id));
        assert_eq!(registry.get_item(item.id).map(|i| i.id), Some(item.id));
        assert!(registry.remove(item.id));
        assert!(registry.get_item(item.id).is_none());
    }

    #[test]
    fn test_remove_on_empty_registry_is_silent() {
        let registry = PortalRegistry::new();
        let count = counting(&registry);
        assert!(!registry.remove(PortalId::new()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_change_kinds() {
        let registry = PortalRegistry::new();
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let seen = kinds.clone();
        registry.on_change().connect(move |change: &PortalChange| seen.lock().push(change.kind));

        let item = PortalItem::new(PortalId::new());
        registry.add(&item);
        registry.update(&item).unwrap();
        registry.remove(item.id);

        assert_eq!(
            *kinds.lock(),
            vec![PortalChangeKind::Added, PortalChangeKind::Updated, PortalChangeKind::Removed]
        );
    }

    #[test]
    fn test_dispose() {
        let registry = PortalRegistry::new();
        let item = PortalItem::new(PortalId::new());
        registry.add(&item);

        registry.dispose();
        registry.dispose();
        assert!(registry.is_disposed());
        assert!(registry.is_empty());
        assert!(!registry.add(&item));
        assert_eq!(registry.update(&item), Err(PortalError::Disposed));
    }

    #[test]
    fn test_global_registry_is_shared() {
        assert!(Arc::ptr_eq(&global_portal_registry(), &global_portal_registry()));
    }
}
