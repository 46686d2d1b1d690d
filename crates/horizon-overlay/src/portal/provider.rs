//! Renders the items of a portal registry.

use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use horizon_overlay_core::logging::targets;
use horizon_overlay_core::{ConnectionGuard, Signal};
use horizon_overlay_geometry::CssPosition;

use crate::id::PortalId;
use crate::markup::TagBuilder;
use crate::portal::item::PortalItem;
use crate::portal::registry::{PortalChange, PortalRegistry};

/// Element id of a portal item's rendered counterpart.
pub fn portal_element_id(id: PortalId) -> String {
    format!("portal-{id}")
}

/// Materializes a registry's items as positioned elements.
pub struct PortalProvider {
    registry: Arc<PortalRegistry>,
    render_requested: Signal<()>,
    needs_render: AtomicBool,
    render_count: AtomicU64,
    _changes: ConnectionGuard<PortalChange>,
}

impl std::fmt::Debug for PortalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalProvider")
            .field("needs_render", &self.needs_render())
            .field("render_count", &self.render_count())
            .finish_non_exhaustive()
    }
}

impl PortalProvider {
    pub fn new(registry: Arc<PortalRegistry>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let listener = weak.clone();
            let changes = registry.on_change().connect_scoped(move |change: &PortalChange| {
                if let Some(provider) = listener.upgrade() {
                    tracing::trace!(target: targets::PORTAL, id = %change.id, kind = ?change.kind, "portal changed");
                    provider.needs_render.store(true, Ordering::SeqCst);
                    provider.render_requested.emit(());
                }
            });
            Self {
                registry: registry.clone(),
                render_requested: Signal::new(),
                needs_render: AtomicBool::new(true),
                render_count: AtomicU64::new(0),
                _changes: changes,
            }
        })
    }

    pub fn registry(&self) -> &Arc<PortalRegistry> {
        &self.registry
    }

    /// Emitted whenever the registry changes.
    pub fn render_requested(&self) -> &Signal<()> {
        &self.render_requested
    }

    pub fn needs_render(&self) -> bool {
        self.needs_render.load(Ordering::SeqCst)
    }

    pub fn render_count(&self) -> u64 {
        self.render_count.load(Ordering::SeqCst)
    }

    /// Render every item from a fresh snapshot of the registry.
    pub fn render(&self) -> String {
        self.needs_render.store(false, Ordering::SeqCst);
        let items = self.registry.items();
        let mut out = String::new();
        for item in &items {
            render_item(&mut out, item);
        }
        self.render_count.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(target: targets::PORTAL, items = items.len(), "portal provider rendered");
        out
    }
}

/// Inline style placing an item at its (corrected) anchor.
///
/// Fixed items are placed in window coordinates, absolute ones in document
/// coordinates. Unmeasured items only get their position scheme.
pub fn portal_style(item: &PortalItem) -> String {
    let mut style = format!("position:{};", item.css_position);
    if let Some(anchor) = &item.anchor_rect {
        let (top, left) = match item.css_position {
            CssPosition::Fixed => (anchor.top, anchor.left),
            CssPosition::Absolute => (anchor.absolute_top(), anchor.absolute_left()),
        };
        let _ = write!(
            style,
            "top:{top}px;left:{left}px;width:{}px;height:{}px;",
            anchor.width, anchor.height
        );
    }
    style
}

fn render_item(out: &mut String, item: &PortalItem) {
    let tag = TagBuilder::open("div")
        .attr("id", &portal_element_id(item.id))
        .attr("style", &portal_style(item))
        .finish();
    out.push_str(&tag);
    if let Some(fragment) = &item.fragment {
        out.push_str(&fragment());
    }
    out.push_str("</div>");
}
