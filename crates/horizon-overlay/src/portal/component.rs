//! The component-side handle that shows, moves and hides one portal item.

use std::sync::Arc;

use horizon_overlay_core::logging::targets;
use horizon_overlay_geometry::{BoundingRect, CssPosition};

use crate::error::{PortalError, PortalResult};
use crate::id::PortalId;
use crate::popover::RenderFragment;
use crate::portal::item::PortalItem;
use crate::portal::registry::PortalRegistry;

/// A component-side handle on one floating fragment.
///
/// The portal keeps its own [`PortalItem`] and mirrors it into the registry
/// while visible. Each [`show`](Self::show) or [`reposition`](Self::reposition)
/// takes fresh host measurements and flips the anchor if the fragment would
/// leave the window. Dropping the portal removes its item.
pub struct Portal {
    registry: Arc<PortalRegistry>,
    item: PortalItem,
    visible: bool,
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("item", &self.item)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl Portal {
    /// A hidden portal rendering `fragment` through `registry`.
    pub fn new(registry: Arc<PortalRegistry>, fragment: RenderFragment) -> Self {
        Self {
            registry,
            item: PortalItem::new(PortalId::new()).with_fragment(fragment),
            visible: false,
        }
    }

    /// Id of the portal's item in the registry.
    pub fn id(&self) -> PortalId {
        self.item.id
    }

    /// Whether the item is currently in the registry.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The portal's current item, including any boundary correction.
    pub fn item(&self) -> &PortalItem {
        &self.item
    }

    /// Replace the content. Pushed to the registry if visible.
    pub fn set_fragment(&mut self, fragment: RenderFragment) -> PortalResult<()> {
        self.item.fragment = Some(fragment);
        if self.visible {
            self.registry.update(&self.item)?;
        }
        Ok(())
    }

    /// Make the portal visible with the given measurements.
    ///
    /// Adds the item on the first call and updates it afterwards. Fails with
    /// [`PortalError::Disposed`] and stays hidden once the registry is gone.
    pub fn show(
        &mut self,
        anchor: Option<BoundingRect>,
        fragment: Option<BoundingRect>,
        has_fixed_ancestor: bool,
    ) -> PortalResult<()> {
        self.measure(anchor, fragment, has_fixed_ancestor);
        if self.visible && self.registry.contains(self.item.id) {
            self.registry.update(&self.item)?;
            return Ok(());
        }
        if !self.registry.add(&self.item) {
            if self.registry.is_disposed() {
                self.visible = false;
                return Err(PortalError::Disposed);
            }
            self.registry.update(&self.item)?;
        }
        self.visible = true;
        Ok(())
    }

    /// Re-position after the viewport changed. Does nothing while hidden.
    ///
    /// Returns whether the item was updated.
    pub fn reposition(&mut self, anchor: Option<BoundingRect>, fragment: Option<BoundingRect>) -> PortalResult<bool> {
        if !self.visible {
            return Ok(false);
        }
        let has_fixed_ancestor = self.item.css_position == CssPosition::Fixed;
        self.measure(anchor, fragment, has_fixed_ancestor);
        self.registry.update(&self.item)?;
        Ok(true)
    }

    /// Remove the item from the registry. Returns whether it was visible.
    pub fn hide(&mut self) -> bool {
        if !std::mem::replace(&mut self.visible, false) {
            return false;
        }
        self.registry.remove(self.item.id)
    }

    fn measure(&mut self, anchor: Option<BoundingRect>, fragment: Option<BoundingRect>, has_fixed_ancestor: bool) {
        self.item.anchor_rect = anchor;
        self.item.fragment_rect = fragment;
        self.item.css_position = CssPosition::for_anchor(has_fixed_ancestor);
        if let Some(offset) = self.item.correct_anchor_boundaries()
            && !offset.is_zero()
        {
            tracing::debug!(target: targets::PORTAL, id = %self.item.id, dx = offset.x, dy = offset.y, "anchor flipped into view");
        }
    }
}

impl Drop for Portal {
    fn drop(&mut self) {
        self.hide();
    }
}
