//! Core primitives for Horizon Overlay.
//!
//! This crate provides the building blocks the overlay subsystem is made of:
//!
//! - **Signal/Slot System**: explicit subscriber lists with RAII disconnection,
//!   safe to re-enter from inside a slot
//! - **Batch Queue**: a coalescing work queue whose flush is scheduled a fixed
//!   delay after the first post of a batch
//! - **Logging**: `tracing` target names for per-subsystem filtering
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_overlay_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```

pub mod batch;
pub mod logging;
pub mod signal;

pub use batch::{BatchProcessor, BatchQueue};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
