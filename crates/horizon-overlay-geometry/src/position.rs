//! CSS positioning scheme for floating content.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a floating element is positioned in the host document.
///
/// Content anchored inside a `position: fixed` ancestor has to be fixed
/// itself, otherwise it scrolls away from its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssPosition {
    /// Positioned relative to the document.
    #[default]
    Absolute,
    /// Positioned relative to the window.
    Fixed,
}

impl CssPosition {
    /// Pick the scheme from whether any ancestor of the anchor is fixed.
    pub fn for_anchor(has_fixed_ancestor: bool) -> Self {
        if has_fixed_ancestor {
            Self::Fixed
        } else {
            Self::Absolute
        }
    }

    /// The CSS keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for CssPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
