//! Host boundary interop.
//!
//! Overlays are attached to and detached from the real document by the host
//! runtime. This module defines the one abstraction the subsystem needs from
//! that runtime, [`HostInvoker`], and the typed popover calls built on it.
//!
//! # Implementing a host
//!
//! ```
//! use async_trait::async_trait;
//! use horizon_overlay::interop::{HostError, HostInvoker};
//! use serde_json::Value;
//!
//! struct NullHost;
//!
//! #[async_trait]
//! impl HostInvoker for NullHost {
//!     async fn invoke(&self, _identifier: &str, _args: Vec<Value>) -> Result<Value, HostError> {
//!         Ok(Value::Null)
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use horizon_overlay_core::logging::targets;
use serde_json::{Value, json};

use crate::id::PopoverId;

/// Names of the host-side functions the popover subsystem calls.
pub mod functions {
    /// `initialize(containerClass, flipMargin)`: one-time library bootstrap.
    pub const INITIALIZE: &str = "popover.initialize";
    /// `connect(id)`: attach the host artifact for a popover.
    pub const CONNECT: &str = "popover.connect";
    /// `disconnect(id)`: detach the host artifact for a popover.
    pub const DISCONNECT: &str = "popover.disconnect";
    /// `dispose()`: tear down the host library.
    pub const DISPOSE: &str = "popover.dispose";
    /// `countProviders()`: number of provider containers present in the document.
    pub const COUNT_PROVIDERS: &str = "popover.countProviders";
}

/// Failure of a call across the host boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The host context is gone (page navigated away, circuit closed).
    #[error("host context is disconnected")]
    Disconnected,
    /// The call was cancelled before it completed.
    #[error("host call was cancelled")]
    Cancelled,
    /// Any other failure reported by the host.
    #[error("host call `{identifier}` failed: {message}")]
    Failed {
        /// The function that was invoked.
        identifier: String,
        /// The host's description of the failure.
        message: String,
    },
}

impl HostError {
    /// Create a [`HostError::Failed`].
    pub fn failed(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Disconnection and cancellation happen when the page goes away mid-call
    /// and are not actionable.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Cancelled)
    }
}

/// Invokes named functions in the host runtime.
///
/// Implementations must report a torn-down host as [`HostError::Disconnected`]
/// and an aborted call as [`HostError::Cancelled`]; callers rely on that
/// distinction to decide what to suppress.
#[async_trait]
pub trait HostInvoker: Send + Sync {
    /// Invoke `identifier` with positional arguments and await its result.
    async fn invoke(&self, identifier: &str, args: Vec<Value>) -> Result<Value, HostError>;
}

/// Turns a benign host failure into `Ok(false)`; a completed call is `Ok(true)`.
pub(crate) fn suppress_benign(operation: &str, result: Result<(), HostError>) -> Result<bool, HostError> {
    match result {
        Ok(()) => Ok(true),
        Err(err) if err.is_benign() => {
            tracing::debug!(target: targets::INTEROP, operation, error = %err, "suppressed benign host failure");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Typed popover calls over a [`HostInvoker`].
#[derive(Clone)]
pub struct PopoverInterop {
    invoker: Arc<dyn HostInvoker>,
}

impl fmt::Debug for PopoverInterop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopoverInterop").finish_non_exhaustive()
    }
}

impl PopoverInterop {
    /// Wrap a host invoker.
    pub fn new(invoker: Arc<dyn HostInvoker>) -> Self {
        Self { invoker }
    }

    async fn call(&self, identifier: &str, args: Vec<Value>) -> Result<Value, HostError> {
        tracing::trace!(target: targets::INTEROP, identifier, args = args.len(), "invoking host function");
        self.invoker.invoke(identifier, args).await
    }

    /// Bootstrap the host library.
    pub async fn initialize(&self, container_class: &str, flip_margin: f64) -> Result<(), HostError> {
        self.call(functions::INITIALIZE, vec![json!(container_class), json!(flip_margin)])
            .await
            .map(drop)
    }

    /// Attach the host artifact for `id`.
    pub async fn connect(&self, id: PopoverId) -> Result<(), HostError> {
        self.call(functions::CONNECT, vec![json!(id.to_string())])
            .await
            .map(drop)
    }

    /// Detach the host artifact for `id`.
    pub async fn disconnect(&self, id: PopoverId) -> Result<(), HostError> {
        self.call(functions::DISCONNECT, vec![json!(id.to_string())])
            .await
            .map(drop)
    }

    /// Tear down the host library.
    pub async fn dispose(&self) -> Result<(), HostError> {
        self.call(functions::DISPOSE, Vec::new()).await.map(drop)
    }

    /// Number of provider containers the host can see.
    pub async fn count_providers(&self) -> Result<usize, HostError> {
        let value = self.call(functions::COUNT_PROVIDERS, Vec::new()).await?;
        value
            .as_u64()
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| {
                HostError::failed(
                    functions::COUNT_PROVIDERS,
                    format!("expected a provider count, got {value}"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedHost(Result<Value, HostError>);

    #[async_trait]
    impl HostInvoker for FixedHost {
        async fn invoke(&self, _identifier: &str, _args: Vec<Value>) -> Result<Value, HostError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_benign_classification() {
        assert!(HostError::Disconnected.is_benign());
        assert!(HostError::Cancelled.is_benign());
        assert!(!HostError::failed("x", "boom").is_benign());
    }

    #[test]
    fn test_suppress_benign() {
        assert_eq!(suppress_benign("op", Ok(())), Ok(true));
        assert_eq!(suppress_benign("op", Err(HostError::Cancelled)), Ok(false));
        assert_eq!(
            suppress_benign("op", Err(HostError::failed("x", "boom"))),
            Err(HostError::failed("x", "boom"))
        );
    }

    #[tokio::test]
    async fn test_count_providers_parses_number() {
        let interop = PopoverInterop::new(Arc::new(FixedHost(Ok(json!(2)))));
        assert_eq!(interop.count_providers().await, Ok(2));
    }

    #[tokio::test]
    async fn test_count_providers_rejects_garbage() {
        let interop = PopoverInterop::new(Arc::new(FixedHost(Ok(json!("two")))));
        let err = interop.count_providers().await.unwrap_err();
        assert!(matches!(err, HostError::Failed { .. }));
    }
}
