//! Error types for the overlay subsystem.
//!
//! Races between teardown and in-flight updates are not errors: they are
//! reported as `Ok(false)` by the popover service. The types here cover the
//! cases that are.

use thiserror::Error;

use crate::id::PortalId;
use crate::interop::HostError;

/// Errors raised by the popover service and providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PopoverError {
    /// An unclassified host boundary failure.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A second top-level provider was mounted while duplicates are forbidden.
    #[error("duplicate popover provider: {count} providers are already mounted")]
    DuplicateProvider { count: usize },

    /// Invalid popover options.
    #[error("invalid popover options: {0}")]
    Config(String),
}

/// Errors raised by the portal registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    /// `update` was called for an item that was never added.
    #[error("portal item {0} not found")]
    ItemNotFound(PortalId),

    /// The registry has been disposed.
    #[error("portal registry has been disposed")]
    Disposed,
}

/// Failure reported by a popover observer while handling a notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("popover observer failed: {message}")]
pub struct ObserverError {
    message: String,
}

impl ObserverError {
    /// Create an observer error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for popover operations.
pub type PopoverResult<T> = Result<T, PopoverError>;

/// Result type for portal registry operations.
pub type PortalResult<T> = Result<T, PortalError>;
