//! Popover service configuration.
//!
//! Options can be built in code or loaded from a TOML fragment:
//!
//! ```
//! use std::time::Duration;
//! use horizon_overlay::PopoverOptions;
//!
//! let options = PopoverOptions::from_toml_str(r#"
//!     container_class = "app-shell"
//!     flip_margin = 8
//!     queue_delay_ms = 250
//! "#).unwrap();
//!
//! assert_eq!(options.container_class, "app-shell");
//! assert_eq!(options.queue_delay, Duration::from_millis(250));
//! assert!(options.throw_on_duplicate_provider);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PopoverError, PopoverResult};

/// Default CSS class of the container overlays attach to.
pub const DEFAULT_CONTAINER_CLASS: &str = "horizon-main-content";

/// Default delay between the first queued teardown and the batch flush.
pub const DEFAULT_QUEUE_DELAY: Duration = Duration::from_millis(500);

/// Configuration consumed by the [`PopoverService`](crate::PopoverService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopoverOptions {
    /// CSS class identifying the DOM container overlays attach to.
    pub container_class: String,
    /// Pixel margin used by the host's boundary flip algorithm.
    pub flip_margin: f64,
    /// Delay before queued disconnects are flushed to the host.
    #[serde(rename = "queue_delay_ms", with = "duration_millis")]
    pub queue_delay: Duration,
    /// Whether mounting a second top-level provider is an error.
    pub throw_on_duplicate_provider: bool,
    /// Whether to warn when popovers are updated with no provider mounted.
    pub check_for_popover_provider: bool,
}

impl Default for PopoverOptions {
    fn default() -> Self {
        Self {
            container_class: DEFAULT_CONTAINER_CLASS.to_string(),
            flip_margin: 0.0,
            queue_delay: DEFAULT_QUEUE_DELAY,
            throw_on_duplicate_provider: true,
            check_for_popover_provider: true,
        }
    }
}

impl PopoverOptions {
    /// Parse options from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> PopoverResult<Self> {
        let options: Self = toml::from_str(source).map_err(|err| PopoverError::Config(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check the options for values the host cannot work with.
    pub fn validate(&self) -> PopoverResult<()> {
        if self.container_class.trim().is_empty() {
            return Err(PopoverError::Config("container_class must not be empty".into()));
        }
        if !self.flip_margin.is_finite() || self.flip_margin < 0.0 {
            return Err(PopoverError::Config(format!(
                "flip_margin must be a non-negative number, got {}",
                self.flip_margin
            )));
        }
        Ok(())
    }

    /// Set the container class.
    pub fn with_container_class(mut self, class: impl Into<String>) -> Self {
        self.container_class = class.into();
        self
    }

    /// Set the flip margin.
    pub fn with_flip_margin(mut self, margin: f64) -> Self {
        self.flip_margin = margin;
        self
    }

    /// Set the batch flush delay.
    pub fn with_queue_delay(mut self, delay: Duration) -> Self {
        self.queue_delay = delay;
        self
    }

    /// Allow or forbid duplicate providers.
    pub fn with_throw_on_duplicate_provider(mut self, throw: bool) -> Self {
        self.throw_on_duplicate_provider = throw;
        self
    }

    /// Enable or disable the missing-provider warning.
    pub fn with_check_for_popover_provider(mut self, check: bool) -> Self {
        self.check_for_popover_provider = check;
        self
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
