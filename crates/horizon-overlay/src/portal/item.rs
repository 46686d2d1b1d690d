//! Portal items: a fragment plus the measurements used to place it.

use std::fmt;

use horizon_overlay_geometry::{BoundingRect, CssPosition, Point, correct_anchor_boundaries};

use crate::id::PortalId;
use crate::popover::RenderFragment;

/// One floating fragment tracked by a [`PortalRegistry`](crate::PortalRegistry).
///
/// Items are values: the registry stores its own copy on every add and
/// update, so a caller can keep mutating its instance between renders.
#[derive(Clone)]
pub struct PortalItem {
    pub id: PortalId,
    pub fragment: Option<RenderFragment>,
    /// Measured anchor, `None` until the host has reported it.
    pub anchor_rect: Option<BoundingRect>,
    /// Measured fragment, `None` until the host has reported it.
    pub fragment_rect: Option<BoundingRect>,
    pub css_position: CssPosition,
}

impl fmt::Debug for PortalItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalItem")
            .field("id", &self.id)
            .field("has_fragment", &self.fragment.is_some())
            .field("anchor_rect", &self.anchor_rect)
            .field("fragment_rect", &self.fragment_rect)
            .field("css_position", &self.css_position)
            .finish()
    }
}

impl PortalItem {
    /// An unmeasured item with the given id.
    pub fn new(id: PortalId) -> Self {
        Self {
            id,
            fragment: None,
            anchor_rect: None,
            fragment_rect: None,
            css_position: CssPosition::default(),
        }
    }

    /// Set the content to render.
    pub fn with_fragment(mut self, fragment: RenderFragment) -> Self {
        self.fragment = Some(fragment);
        self
    }

    /// Set the measured anchor.
    pub fn with_anchor_rect(mut self, rect: BoundingRect) -> Self {
        self.anchor_rect = Some(rect);
        self
    }

    /// Set the measured fragment.
    pub fn with_fragment_rect(mut self, rect: BoundingRect) -> Self {
        self.fragment_rect = Some(rect);
        self
    }

    /// Set how the fragment is positioned against the page.
    pub fn with_css_position(mut self, position: CssPosition) -> Self {
        self.css_position = position;
        self
    }

    /// Whether both rectangles have been measured.
    pub fn is_measured(&self) -> bool {
        self.anchor_rect.is_some() && self.fragment_rect.is_some()
    }

    /// Flip the anchor so the fragment comes back into view.
    ///
    /// The fragment rectangle moves with the anchor, so afterwards it
    /// describes where the fragment will be rendered. A no-op returning
    /// `None` while either rectangle is unmeasured.
    pub fn correct_anchor_boundaries(&mut self) -> Option<Point> {
        let offset = correct_anchor_boundaries(self.anchor_rect.as_mut(), self.fragment_rect.as_ref())?;
        if let Some(fragment) = self.fragment_rect.as_mut() {
            fragment.translate(offset);
        }
        Some(offset)
    }
}
