//! Logging facilities for Horizon Overlay.
//!
//! Horizon Overlay uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter(EnvFilter::new("horizon_overlay::popover=debug"))
//!         .init();
//! }
//! ```
//!
//! The library never installs a subscriber itself.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_overlay_core::signal";
    /// Batch queue target.
    pub const BATCH: &str = "horizon_overlay_core::batch";
    /// Popover service and handlers target.
    pub const POPOVER: &str = "horizon_overlay::popover";
    /// Portal registry target.
    pub const PORTAL: &str = "horizon_overlay::portal";
    /// Host boundary calls target.
    pub const INTEROP: &str = "horizon_overlay::interop";
}
