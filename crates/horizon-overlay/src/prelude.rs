//! Prelude module for Horizon Overlay.
//!
//! ```ignore
//! use horizon_overlay::prelude::*;
//! ```

// ============================================================================
// Host Interop and Configuration
// ============================================================================

pub use crate::interop::{HostError, HostInvoker};
pub use crate::options::PopoverOptions;

// ============================================================================
// Popovers
// ============================================================================

pub use crate::popover::{
    Popover, PopoverHandler, PopoverObserver, PopoverOperation, PopoverProvider, PopoverService, RenderFragment,
    UserAttributes, fragment,
};

// ============================================================================
// Portals
// ============================================================================

pub use crate::portal::{Portal, PortalItem, PortalProvider, PortalRegistry, global_portal_registry};

// ============================================================================
// Identifiers, Errors and Geometry
// ============================================================================

pub use crate::error::{PopoverError, PortalError};
pub use crate::id::{PopoverId, PortalId};
pub use horizon_overlay_geometry::{BoundingRect, CssPosition, Rect, Viewport};
