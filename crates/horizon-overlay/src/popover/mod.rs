//! Popovers: floating overlays whose host artifacts are connected lazily and
//! torn down in batches.
//!
//! - [`PopoverService`] owns the handlers and drives their lifecycle.
//! - [`PopoverHandler`] is one overlay's state and host connection.
//! - [`PopoverProvider`] renders the active handlers.
//! - [`PopoverObserver`] receives create, update and remove notifications.

mod handler;
mod observer;
mod provider;
mod service;

pub use handler::{Popover, PopoverContent, PopoverHandler, PopoverTag, RenderFragment, UserAttributes, fragment};
pub use observer::{ObserverId, ObserverSubscription, PopoverCollectionChange, PopoverObserver, PopoverOperation};
pub use provider::{PROVIDER_CLASS, PopoverProvider, popover_element_id};
pub use service::PopoverService;
