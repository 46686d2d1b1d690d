//! The component that renders a popover service's active handlers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use horizon_overlay_core::logging::targets;
use horizon_overlay_core::{ConnectionGuard, Signal};

use crate::error::{ObserverError, PopoverResult};
use crate::id::PopoverId;
use crate::markup::TagBuilder;
use crate::popover::handler::PopoverHandler;
use crate::popover::observer::{ObserverSubscription, PopoverCollectionChange, PopoverObserver};
use crate::popover::service::PopoverService;

/// CSS class of the provider's container element.
pub const PROVIDER_CLASS: &str = "horizon-popover-provider";

/// Element id of a popover's content element.
pub fn popover_element_id(id: PopoverId) -> String {
    format!("popovercontent-{id}")
}

/// Renders every active popover of a service into one container.
///
/// A provider marks itself dirty and emits [`render_requested`](Self::render_requested)
/// whenever the collection changes or a handler asks for a render. Calling
/// [`render`](Self::render) produces the markup and releases the handlers it
/// rendered.
pub struct PopoverProvider {
    service: Arc<PopoverService>,
    render_requested: Signal<()>,
    needs_render: AtomicBool,
    render_count: AtomicU64,
    _updated: ConnectionGuard<PopoverId>,
    subscription: parking_lot::Mutex<Option<ObserverSubscription>>,
}

impl std::fmt::Debug for PopoverProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopoverProvider")
            .field("needs_render", &self.needs_render())
            .field("render_count", &self.render_count())
            .finish_non_exhaustive()
    }
}

impl PopoverProvider {
    /// Mount a provider on `service`.
    ///
    /// Fails with [`PopoverError::DuplicateProvider`](crate::PopoverError::DuplicateProvider)
    /// if another provider is mounted and the service forbids duplicates.
    pub fn new(service: Arc<PopoverService>) -> PopoverResult<Arc<Self>> {
        service.register_provider()?;

        let provider = Arc::new_cyclic(|weak: &Weak<Self>| {
            let listener = weak.clone();
            let updated = service.handler_updated().connect_scoped(move |id| {
                if let Some(provider) = listener.upgrade() {
                    tracing::trace!(target: targets::POPOVER, %id, "handler requested render");
                    provider.request_render();
                }
            });
            Self {
                service: service.clone(),
                render_requested: Signal::new(),
                needs_render: AtomicBool::new(true),
                render_count: AtomicU64::new(0),
                _updated: updated,
                subscription: parking_lot::Mutex::new(None),
            }
        });

        let observer: Arc<dyn PopoverObserver> = provider.clone();
        *provider.subscription.lock() = Some(service.subscribe(&observer));
        tracing::debug!(target: targets::POPOVER, providers = service.provider_count(), "popover provider mounted");
        Ok(provider)
    }

    /// The service this provider renders.
    pub fn service(&self) -> &Arc<PopoverService> {
        &self.service
    }

    /// Emitted whenever the provider has become dirty.
    pub fn render_requested(&self) -> &Signal<()> {
        &self.render_requested
    }

    /// Whether the rendered output is stale.
    pub fn needs_render(&self) -> bool {
        self.needs_render.load(Ordering::SeqCst)
    }

    /// Number of render passes so far.
    pub fn render_count(&self) -> u64 {
        self.render_count.load(Ordering::SeqCst)
    }

    fn request_render(&self) {
        self.needs_render.store(true, Ordering::SeqCst);
        self.render_requested.emit(());
    }

    /// Render the active handlers.
    ///
    /// Content is emitted only for handlers that want it shown and are either
    /// connected or being painted for the first time. Every rendered handler
    /// is stamped and released.
    pub fn render(&self) -> String {
        self.needs_render.store(false, Ordering::SeqCst);
        let handlers = self.service.active_popovers();

        let mut out = TagBuilder::open("div").attr("class", PROVIDER_CLASS).finish();
        for handler in &handlers {
            render_handler(&mut out, handler);
            handler.mark_rendered();
            handler.release();
        }
        out.push_str("</div>");

        self.render_count.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(target: targets::POPOVER, handlers = handlers.len(), "popover provider rendered");
        out
    }
}

fn render_handler(out: &mut String, handler: &PopoverHandler) {
    let content = handler.content();
    let mut tag = TagBuilder::open("div")
        .attr("id", &popover_element_id(handler.id()))
        .attr_if_present("class", &content.class)
        .attr_if_present("style", &content.style);
    for (name, value) in content.user_attributes.iter() {
        tag = tag.attr(name, value);
    }
    out.push_str(&tag.finish());

    let first_paint = handler.last_rendered().is_none();
    if content.show_content
        && (handler.is_connected() || first_paint)
        && let Some(fragment) = &content.fragment
    {
        out.push_str(&fragment());
    }
    out.push_str("</div>");
}

#[async_trait]
impl PopoverObserver for PopoverProvider {
    async fn popover_collection_updated(&self, change: &PopoverCollectionChange) -> Result<(), ObserverError> {
        tracing::trace!(target: targets::POPOVER, operation = ?change.operation, id = %change.popover_id, "collection changed");
        self.request_render();
        Ok(())
    }
}

impl Drop for PopoverProvider {
    fn drop(&mut self) {
        self.subscription.get_mut().take();
        self.service.unregister_provider();
        tracing::debug!(target: targets::POPOVER, "popover provider unmounted");
    }
}
