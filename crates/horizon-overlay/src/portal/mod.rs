//! Portals: floating fragments rendered outside their component's subtree.
//!
//! A [`Portal`] owns one [`PortalItem`] and mirrors it into a
//! [`PortalRegistry`]; a [`PortalProvider`] renders the registry.

mod component;
mod item;
mod provider;
mod registry;

pub use component::Portal;
pub use item::PortalItem;
pub use provider::{PortalProvider, portal_element_id, portal_style};
pub use registry::{PortalChange, PortalChangeKind, PortalRegistry, global_portal_registry};
