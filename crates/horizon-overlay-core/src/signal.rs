//! Signal/slot notification for Horizon Overlay.
//!
//! A [`Signal`] is an explicit list of subscriber callbacks. Registries and
//! services own their signals and expose them so that providers can react to
//! collection changes without any hidden multicast semantics.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type used for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Re-entrancy
//!
//! Slots are snapshotted under the connection lock and invoked after it has
//! been released. A slot may therefore connect, disconnect or emit on the
//! same signal, and may call back into whatever object owns the signal.
//!
//! # Example
//!
//! ```
//! use horizon_overlay_core::Signal;
//!
//! // Create a signal that passes a string argument
//! let text_changed = Signal::<String>::new();
//!
//! // Connect a slot (closure)
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! // Emit the signal
//! text_changed.emit("Hello, World!".to_string());
//!
//! // Disconnect when done
//! text_changed.disconnect(conn_id);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;
type Connections<Args> = Mutex<SlotMap<ConnectionId, Slot<Args>>>;

/// A type-safe signal that can have multiple connected slots.
///
/// When a signal is emitted, all connected slots are invoked with the provided
/// arguments on the emitting thread. Slots run in no particular order.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync` and can be shared between threads. The
/// connection table is guarded by a mutex that is never held while a slot runs.
pub struct Signal<Args> {
    /// All active connections, shared with outstanding [`ConnectionGuard`]s.
    connections: Arc<Connections<Args>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
    /// Number of emissions that reached at least the blocked check.
    emit_count: AtomicU64,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::Relaxed))
            .finish()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(SlotMap::with_key())),
            blocked: AtomicBool::new(false),
            emit_count: AtomicU64::new(0),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_overlay_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Connect a slot with automatic disconnection when the guard is dropped.
    ///
    /// The guard only holds a weak reference to the connection table, so it
    /// may safely outlive the signal.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            connections: Arc::downgrade(&self.connections),
            id,
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` will do nothing. This is useful
    /// during batch updates to prevent cascading notifications.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Total number of unblocked emissions so far.
    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots.
    ///
    /// If the signal is blocked, this does nothing. Slots connected or
    /// disconnected by another slot during this emission take effect on the
    /// next emission.
    #[tracing::instrument(skip_all, target = "horizon_overlay_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }
        self.emit_count.fetch_add(1, Ordering::SeqCst);

        // Snapshot so no lock is held while slots run.
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<u64>: Send, Sync);

/// A connection guard that automatically disconnects when dropped.
///
/// Created via [`Signal::connect_scoped`].
///
/// # Example
///
/// ```
/// use horizon_overlay_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);  // counter = 42
/// }
/// signal.emit(43);  // Nothing happens - connection was dropped
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard<Args> {
    connections: Weak<Connections<Args>>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<Args> {
    /// Get the connection ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the guarded connection is still present on a live signal.
    pub fn is_connected(&self) -> bool {
        self.connections
            .upgrade()
            .is_some_and(|connections| connections.lock().contains_key(self.id))
    }
}

impl<Args> fmt::Debug for ConnectionGuard<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGuard").field("id", &self.id).finish()
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(connections) = self.connections.upgrade() {
            connections.lock().remove(self.id);
        }
    }
}
