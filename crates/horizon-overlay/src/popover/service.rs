//! The popover service: owns every handler and orchestrates its lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//! create ──► Created (unconnected) ──update──► Connected ──update*──► destroy ──► Detached
//! ```
//!
//! - **Create** stores the initial state and notifies observers. It does not
//!   talk to the host: connection is deferred to the first update so that
//!   overlays which are declared but never opened cost no host round trip.
//! - **Update** replaces the state, bootstraps the host library once per
//!   service, connects the handler on its first update, and notifies.
//! - **Destroy** removes the handler from the active set immediately and
//!   queues it for a batched disconnect that runs `queue_delay` later.
//!
//! Update and destroy on a handler that no longer exists return `Ok(false)` /
//! `false`: UI teardown and in-flight updates race by nature.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::future::join_all;
use horizon_overlay_core::logging::targets;
use horizon_overlay_core::{BatchProcessor, BatchQueue, Signal};
use parking_lot::RwLock;
use tokio::sync::Semaphore;

use crate::error::{PopoverError, PopoverResult};
use crate::id::PopoverId;
use crate::interop::{HostInvoker, PopoverInterop, suppress_benign};
use crate::options::PopoverOptions;
use crate::popover::handler::{Popover, PopoverContent, PopoverHandler};
use crate::popover::observer::{
    ObserverId, ObserverManager, ObserverSubscription, PopoverCollectionChange, PopoverObserver,
    PopoverOperation,
};

/// Disconnects a drained batch of destroyed handlers in one pass.
struct DetachProcessor;

#[async_trait]
impl BatchProcessor<Arc<PopoverHandler>> for DetachProcessor {
    async fn process(&self, batch: Vec<Arc<PopoverHandler>>) {
        let results = join_all(batch.iter().map(|handler| handler.detach())).await;
        for (handler, result) in batch.iter().zip(results) {
            if let Err(err) = result {
                tracing::error!(target: targets::POPOVER, id = %handler.id(), error = %err, "failed to disconnect popover");
            }
        }
    }
}

/// Owns the popover handlers of one scope.
pub struct PopoverService {
    options: PopoverOptions,
    interop: PopoverInterop,
    /// Active handlers; ids are allocated monotonically, so this is creation order.
    handlers: RwLock<BTreeMap<PopoverId, Arc<PopoverHandler>>>,
    observers: Arc<ObserverManager>,
    handler_updated: Arc<Signal<PopoverId>>,
    detach_queue: BatchQueue<Arc<PopoverHandler>>,
    init_lock: Semaphore,
    initialized: AtomicBool,
    disposed: AtomicBool,
    providers: AtomicUsize,
}

static_assertions::assert_impl_all!(PopoverService: Send, Sync);

impl fmt::Debug for PopoverService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopoverService")
            .field("options", &self.options)
            .field("active", &self.handlers.read().len())
            .field("queued", &self.detach_queue.queue_count())
            .field("observers", &self.observers.len())
            .field("initialized", &self.is_initialized())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl PopoverService {
    /// Create a service that talks to the host through `invoker`.
    ///
    /// Fails only if `options` do not validate.
    pub fn new(options: PopoverOptions, invoker: Arc<dyn HostInvoker>) -> PopoverResult<Self> {
        options.validate()?;
        let detach_queue = BatchQueue::new(options.queue_delay, DetachProcessor);
        Ok(Self {
            options,
            interop: PopoverInterop::new(invoker),
            handlers: RwLock::new(BTreeMap::new()),
            observers: Arc::new(ObserverManager::default()),
            handler_updated: Arc::new(Signal::new()),
            detach_queue,
            init_lock: Semaphore::new(1),
            initialized: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            providers: AtomicUsize::new(0),
        })
    }

    /// The options this service was created with.
    pub fn options(&self) -> &PopoverOptions {
        &self.options
    }

    /// Emitted with a handler's id when it is updated while unlocked.
    ///
    /// Providers re-render in response and [`release`](PopoverHandler::release)
    /// the handler afterwards.
    pub fn handler_updated(&self) -> &Signal<PopoverId> {
        &self.handler_updated
    }

    /// Whether the host library has been bootstrapped.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Snapshot of the active handlers in creation order.
    pub fn active_popovers(&self) -> Vec<Arc<PopoverHandler>> {
        self.handlers.read().values().cloned().collect()
    }

    /// Number of active handlers.
    pub fn active_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// The active handler for `id`, if any.
    pub fn handler(&self, id: PopoverId) -> Option<Arc<PopoverHandler>> {
        self.handlers.read().get(&id).cloned()
    }

    /// Destroyed handlers still waiting for their batched disconnect.
    pub fn queue_count(&self) -> usize {
        self.detach_queue.queue_count()
    }

    /// Number of batched disconnect passes run so far.
    pub fn flush_count(&self) -> u64 {
        self.detach_queue.flush_count()
    }

    /// Subscribe an observer to collection changes.
    ///
    /// The service holds the observer weakly; keep the returned subscription
    /// (and the observer) alive for as long as notifications are wanted.
    pub fn subscribe(&self, observer: &Arc<dyn PopoverObserver>) -> ObserverSubscription {
        let id = self.observers.subscribe(observer);
        tracing::debug!(target: targets::POPOVER, ?id, "observer subscribed");
        ObserverSubscription::new(&self.observers, id)
    }

    /// Remove a subscription by id.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Number of subscribed observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Number of providers mounted on this service.
    pub fn provider_count(&self) -> usize {
        self.providers.load(Ordering::SeqCst)
    }

    /// Ask the host how many provider containers are present in the document.
    pub async fn count_host_providers(&self) -> PopoverResult<usize> {
        Ok(self.interop.count_providers().await?)
    }

    pub(crate) fn register_provider(&self) -> PopoverResult<()> {
        let existing = self.providers.fetch_add(1, Ordering::SeqCst);
        if existing > 0 && self.options.throw_on_duplicate_provider {
            self.providers.fetch_sub(1, Ordering::SeqCst);
            return Err(PopoverError::DuplicateProvider { count: existing });
        }
        if existing > 0 {
            tracing::warn!(target: targets::POPOVER, count = existing + 1, "multiple popover providers mounted");
        }
        Ok(())
    }

    pub(crate) fn unregister_provider(&self) {
        self.providers.fetch_sub(1, Ordering::SeqCst);
    }

    /// Register a popover and return its handler.
    ///
    /// The handler starts unconnected with `show_content` taken from
    /// [`Popover::open`]. Registering an id that is already active returns
    /// the existing handler without notifying.
    ///
    /// After [`dispose`](Self::dispose) the returned handler is already
    /// detached and is never added to the active set.
    #[tracing::instrument(skip_all, target = "horizon_overlay::popover", level = "debug", fields(id = %popover.id()))]
    pub async fn create_popover(&self, popover: &dyn Popover) -> Arc<PopoverHandler> {
        let id = popover.id();
        let handler = {
            let mut handlers = self.handlers.write();
            if let Some(existing) = handlers.get(&id) {
                tracing::debug!(target: targets::POPOVER, %id, "popover already registered");
                return existing.clone();
            }
            let signal = self.handler_updated.clone();
            let handler = Arc::new(PopoverHandler::new(
                id,
                PopoverContent::from_popover(popover),
                self.interop.clone(),
                Arc::new(move |id: PopoverId| signal.emit(id)),
            ));
            // Checked under the write lock: dispose sets the flag before
            // draining the map.
            if self.is_disposed() {
                tracing::warn!(target: targets::POPOVER, %id, "popover created on a disposed service");
                handler.mark_detached();
                return handler;
            }
            handlers.insert(id, handler.clone());
            handler
        };

        tracing::debug!(target: targets::POPOVER, %id, "popover created");
        self.notify(PopoverOperation::Create, id).await;
        handler
    }

    /// Push the popover's current state to its handler.
    ///
    /// Returns `Ok(false)` if the handler does not exist, has been
    /// destroyed, or the service is disposed. Benign host failures while bootstrapping or connecting are
    /// suppressed and leave the handler unconnected, to be retried on the
    /// next update; other host failures are returned.
    #[tracing::instrument(skip_all, target = "horizon_overlay::popover", level = "debug", fields(id = %popover.id()))]
    pub async fn update_popover(&self, popover: &dyn Popover) -> PopoverResult<bool> {
        let id = popover.id();
        let Some(handler) = self.handler(id) else {
            tracing::debug!(target: targets::POPOVER, %id, "update for unknown popover ignored");
            return Ok(false);
        };

        {
            let _op = handler.op_lock.lock().await;
            if handler.is_detached() || self.is_disposed() {
                tracing::debug!(target: targets::POPOVER, %id, "update raced with destroy");
                return Ok(false);
            }

            handler.set_content(PopoverContent::from_popover(popover));

            if !handler.is_connected() && self.initialize_if_needed().await? {
                suppress_benign("connect", handler.initialize().await)?;
            }
        }

        if self.options.check_for_popover_provider && self.provider_count() == 0 {
            tracing::warn!(target: targets::POPOVER, %id, "popover updated but no provider is mounted");
        }

        self.notify(PopoverOperation::Update, id).await;
        Ok(true)
    }

    /// Destroy a popover's handler.
    ///
    /// The handler leaves the active set at once; its host disconnect is
    /// queued and runs with the next batch flush. Returns `false` if the
    /// handler does not exist.
    #[tracing::instrument(skip_all, target = "horizon_overlay::popover", level = "debug", fields(id = %popover.id()))]
    pub async fn destroy_popover(&self, popover: &dyn Popover) -> bool {
        let id = popover.id();
        let Some(handler) = self.handlers.write().remove(&id) else {
            tracing::debug!(target: targets::POPOVER, %id, "destroy for unknown popover ignored");
            return false;
        };

        {
            // Wait for an in-flight update so its connect is covered by the disconnect.
            let _op = handler.op_lock.lock().await;
            handler.mark_detached();
            if !self.detach_queue.enqueue(handler.clone()) {
                // Queue closed by dispose: disconnect inline.
                if let Err(err) = handler.detach().await {
                    tracing::error!(target: targets::POPOVER, %id, error = %err, "failed to disconnect popover");
                }
            }
        }

        tracing::debug!(target: targets::POPOVER, %id, queued = self.queue_count(), "popover destroyed");
        self.notify(PopoverOperation::Remove, id).await;
        true
    }

    /// Run the pending batched disconnects now instead of waiting for the delay.
    ///
    /// Returns the number of handlers disconnected.
    pub async fn flush_detached(&self) -> usize {
        self.detach_queue.flush_now().await
    }

    /// Tear the service down.
    ///
    /// Every active handler is detached together with the ones already
    /// queued, the host library is disposed if it was bootstrapped, and all
    /// observers are dropped. Safe to call on a service that never created
    /// anything, and more than once.
    pub async fn dispose(&self) -> PopoverResult<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let handlers = std::mem::take(&mut *self.handlers.write());
        for handler in handlers.into_values() {
            handler.mark_detached();
            self.detach_queue.enqueue(handler);
        }
        let detached = self.detach_queue.close().await;

        let result = if self.is_initialized() {
            suppress_benign("dispose", self.interop.dispose().await).map(drop)
        } else {
            Ok(())
        };
        self.init_lock.close();
        self.observers.clear();
        self.handler_updated.disconnect_all();

        tracing::debug!(target: targets::POPOVER, detached, "popover service disposed");
        result.map_err(PopoverError::from)
    }

    /// Bootstrap the host library once. Concurrent first callers wait on the
    /// semaphore; later callers short-circuit on the flag.
    ///
    /// Returns whether the library is initialized.
    async fn initialize_if_needed(&self) -> PopoverResult<bool> {
        if self.is_disposed() {
            return Ok(false);
        }
        if self.is_initialized() {
            return Ok(true);
        }
        let Ok(_permit) = self.init_lock.acquire().await else {
            // Closed by dispose.
            return Ok(false);
        };
        if self.is_initialized() {
            return Ok(true);
        }

        let result = self
            .interop
            .initialize(&self.options.container_class, self.options.flip_margin)
            .await;
        let initialized = suppress_benign("initialize", result)?;
        if initialized {
            self.initialized.store(true, Ordering::SeqCst);
            tracing::debug!(target: targets::POPOVER, container = %self.options.container_class, "popover host initialized");
        }
        Ok(initialized)
    }

    async fn notify(&self, operation: PopoverOperation, popover_id: PopoverId) {
        let change = PopoverCollectionChange {
            operation,
            popover_id,
            handlers: self.active_popovers(),
        };
        let notified = self.observers.notify(&change).await;
        tracing::trace!(target: targets::POPOVER, ?operation, %popover_id, notified, "observers notified");
    }
}
