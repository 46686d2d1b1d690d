//! Process-unique identifiers for overlays.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

macro_rules! overlay_id {
    ($(#[$meta:meta])* $name:ident, $counter:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        static $counter: AtomicU64 = AtomicU64::new(1);

        impl $name {
            /// Allocate a fresh identifier. Identifiers are never reused
            /// within a process.
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// Get the raw u64 value of this ID.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

overlay_id!(
    /// Identifies one popover for its whole lifetime.
    ///
    /// The id is owned by the component that declares the popover and is
    /// used as the key of its handler in the [`PopoverService`](crate::PopoverService).
    PopoverId,
    NEXT_POPOVER_ID
);

overlay_id!(
    /// Correlates a logical portal item with its rendered counterpart.
    PortalId,
    NEXT_PORTAL_ID
);
