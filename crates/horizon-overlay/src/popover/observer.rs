//! Observers of the popover collection.
//!
//! Observers are held weakly: a dropped observer is pruned on the next
//! notification, as is one whose notification fails. Subscribing returns an
//! [`ObserverSubscription`] that unsubscribes when dropped.

use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use horizon_overlay_core::logging::targets;
use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::ObserverError;
use crate::id::PopoverId;
use crate::popover::handler::PopoverHandler;

new_key_type! {
    /// Identifies one subscription to a popover service.
    pub struct ObserverId;
}

/// What happened to the popover collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopoverOperation {
    /// A handler was created and added to the active set.
    Create,
    /// A handler's visual state changed.
    Update,
    /// A handler was removed from the active set.
    Remove,
}

/// Notification payload: the operation plus a snapshot of the active handlers
/// taken right after it.
#[derive(Clone)]
pub struct PopoverCollectionChange {
    /// The operation that triggered the notification.
    pub operation: PopoverOperation,
    /// The popover the operation applied to.
    pub popover_id: PopoverId,
    /// Active handlers in creation order.
    pub handlers: Vec<Arc<PopoverHandler>>,
}

impl fmt::Debug for PopoverCollectionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopoverCollectionChange")
            .field("operation", &self.operation)
            .field("popover_id", &self.popover_id)
            .field("handlers", &self.handlers.iter().map(|h| h.id()).collect::<Vec<_>>())
            .finish()
    }
}

/// Receives popover collection changes.
#[async_trait]
pub trait PopoverObserver: Send + Sync {
    /// Called after every create, update and remove. Returning an error
    /// unsubscribes the observer.
    async fn popover_collection_updated(&self, change: &PopoverCollectionChange) -> Result<(), ObserverError>;
}

/// The subscriber list of one popover service.
#[derive(Default)]
pub(crate) struct ObserverManager {
    observers: Mutex<SlotMap<ObserverId, Weak<dyn PopoverObserver>>>,
}

impl ObserverManager {
    pub(crate) fn subscribe(&self, observer: &Arc<dyn PopoverObserver>) -> ObserverId {
        self.observers.lock().insert(Arc::downgrade(observer))
    }

    pub(crate) fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.lock().remove(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.observers.lock().clear();
    }

    /// Notify every live observer, in no particular order, pruning dead and
    /// failing ones. Returns the number of observers notified successfully.
    pub(crate) async fn notify(&self, change: &PopoverCollectionChange) -> usize {
        let snapshot: Vec<(ObserverId, Weak<dyn PopoverObserver>)> = self
            .observers
            .lock()
            .iter()
            .map(|(id, observer)| (id, observer.clone()))
            .collect();

        let mut notified = 0;
        for (id, observer) in snapshot {
            let Some(observer) = observer.upgrade() else {
                tracing::debug!(target: targets::POPOVER, ?id, "pruning dropped observer");
                self.unsubscribe(id);
                continue;
            };
            match observer.popover_collection_updated(change).await {
                Ok(()) => notified += 1,
                Err(err) => {
                    tracing::warn!(target: targets::POPOVER, ?id, error = %err, "removing defunct observer");
                    self.unsubscribe(id);
                }
            }
        }
        notified
    }
}

/// Keeps an observer subscribed until dropped.
pub struct ObserverSubscription {
    manager: Weak<ObserverManager>,
    id: ObserverId,
}

impl ObserverSubscription {
    pub(crate) fn new(manager: &Arc<ObserverManager>, id: ObserverId) -> Self {
        Self {
            manager: Arc::downgrade(manager),
            id,
        }
    }

    /// The subscription's id, usable with `PopoverService::unsubscribe`.
    pub fn id(&self) -> ObserverId {
        self.id
    }
}

impl fmt::Debug for ObserverSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSubscription").field("id", &self.id).finish()
    }
}

impl Drop for ObserverSubscription {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.unsubscribe(self.id);
        }
    }
}
