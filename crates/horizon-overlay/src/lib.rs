//! Horizon Overlay - lifecycle and positioning for floating UI.
//!
//! This crate manages overlays (dropdowns, menus, tooltips) whose visual
//! artifacts live in a host document reached through an async call boundary:
//!
//! - **Popovers**: a [`PopoverService`] owns one [`PopoverHandler`] per overlay,
//!   connects it to the host lazily on its first update, and batches host
//!   teardown of destroyed overlays on a timer
//! - **Portals**: a [`PortalRegistry`] of floating fragments, kept on screen by
//!   flipping their anchor when they would overflow the window
//! - **Providers**: [`PopoverProvider`] and [`PortalProvider`] render the
//!   active collections as markup
//! - **Host interop**: the [`HostInvoker`] trait is the only thing a host has
//!   to implement
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use horizon_overlay::prelude::*;
//! use serde_json::Value;
//!
//! struct Host;
//!
//! #[async_trait]
//! impl HostInvoker for Host {
//!     async fn invoke(&self, _identifier: &str, _args: Vec<Value>) -> Result<Value, HostError> {
//!         Ok(Value::Null)
//!     }
//! }
//!
//! struct Menu {
//!     id: PopoverId,
//!     open: bool,
//! }
//!
//! impl Popover for Menu {
//!     fn id(&self) -> PopoverId { self.id }
//!     fn open(&self) -> bool { self.open }
//!     fn popover_class(&self) -> String { "menu".into() }
//!     fn popover_styles(&self) -> String { String::new() }
//!     fn child_content(&self) -> Option<RenderFragment> { Some(fragment("<ul></ul>")) }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), PopoverError> {
//! let service = Arc::new(PopoverService::new(PopoverOptions::default(), Arc::new(Host))?);
//! let provider = PopoverProvider::new(service.clone())?;
//!
//! let mut menu = Menu { id: PopoverId::new(), open: false };
//! let handler = service.create_popover(&menu).await;
//! assert!(!handler.is_connected());
//!
//! menu.open = true;
//! assert!(service.update_popover(&menu).await?);
//! assert!(handler.is_connected());
//! assert!(provider.render().contains("<ul></ul>"));
//!
//! service.destroy_popover(&menu).await;
//! assert_eq!(service.active_count(), 0);
//! service.dispose().await
//! # }
//! ```

pub mod error;
pub mod id;
pub mod interop;
pub mod markup;
pub mod options;
pub mod popover;
pub mod portal;
pub mod prelude;

pub use error::{ObserverError, PopoverError, PopoverResult, PortalError, PortalResult};
pub use id::{PopoverId, PortalId};
pub use interop::{HostError, HostInvoker, PopoverInterop};
pub use options::PopoverOptions;
pub use popover::{
    ObserverId, ObserverSubscription, Popover, PopoverCollectionChange, PopoverContent, PopoverHandler,
    PopoverObserver, PopoverOperation, PopoverProvider, PopoverService, PopoverTag, RenderFragment, UserAttributes,
    fragment,
};
pub use portal::{
    Portal, PortalChange, PortalChangeKind, PortalItem, PortalProvider, PortalRegistry, global_portal_registry,
};

/// Overlay geometry.
pub mod geometry {
    pub use horizon_overlay_geometry::*;
}

pub use horizon_overlay_core::{ConnectionGuard, ConnectionId, Signal};
