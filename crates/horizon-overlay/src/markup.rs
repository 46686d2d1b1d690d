//! Minimal HTML writing for the providers.

use std::fmt::Write;

use horizon_overlay_core::logging::targets;

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Whether `name` can be written as an attribute name as-is.
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

/// Accumulates the attributes of one opening tag.
#[derive(Debug, Default)]
pub(crate) struct TagBuilder {
    out: String,
}

impl TagBuilder {
    pub(crate) fn open(name: &str) -> Self {
        Self { out: format!("<{name}") }
    }

    /// Append `name="value"`. Invalid names are skipped, empty values are kept.
    pub(crate) fn attr(mut self, name: &str, value: &str) -> Self {
        if is_valid_attribute_name(name) {
            let _ = write!(self.out, " {name}=\"{}\"", escape_attribute(value));
        } else {
            tracing::warn!(target: targets::POPOVER, name, "skipping invalid attribute name");
        }
        self
    }

    /// Append `name="value"` unless `value` is empty.
    pub(crate) fn attr_if_present(self, name: &str, value: &str) -> Self {
        if value.is_empty() { self } else { self.attr(name, value) }
    }

    pub(crate) fn finish(mut self) -> String {
        self.out.push('>');
        self.out
    }
}
