//! One popover's rendering state and its bridge to the host.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use horizon_overlay_core::logging::targets;
use parking_lot::{Mutex, RwLock};

use crate::id::PopoverId;
use crate::interop::{HostError, PopoverInterop, suppress_benign};

/// Markup to render inside an overlay.
pub type RenderFragment = Arc<dyn Fn() -> String + Send + Sync>;

/// Opaque caller payload carried alongside a popover.
pub type PopoverTag = Arc<dyn Any + Send + Sync>;

/// Called with the handler's id when an unlocked handler receives new state.
pub(crate) type Updater = Arc<dyn Fn(PopoverId) + Send + Sync>;

/// Build a [`RenderFragment`] that renders fixed markup.
pub fn fragment(markup: impl Into<String>) -> RenderFragment {
    let markup: String = markup.into();
    Arc::new(move || markup.clone())
}

/// Extra attributes splatted onto the rendered overlay element.
///
/// Insertion order is preserved; inserting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAttributes(Vec<(String, String)>);

impl UserAttributes {
    /// Create an empty attribute list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UserAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

/// Anything that can be shown as a popover: the component-side view the
/// [`PopoverService`](crate::PopoverService) reads on create and update.
pub trait Popover: Send + Sync {
    /// The popover's stable identifier.
    fn id(&self) -> PopoverId;

    /// Whether the popover content should be visible.
    fn open(&self) -> bool;

    /// CSS class of the overlay element.
    fn popover_class(&self) -> String;

    /// Inline style of the overlay element.
    fn popover_styles(&self) -> String;

    /// The content to render.
    fn child_content(&self) -> Option<RenderFragment>;

    /// Opaque payload carried for the caller.
    fn tag(&self) -> Option<PopoverTag> {
        None
    }

    /// Extra attributes for the overlay element.
    fn user_attributes(&self) -> UserAttributes {
        UserAttributes::default()
    }
}

/// The visual state of a popover, replaced as a whole on every update.
#[derive(Clone, Default)]
pub struct PopoverContent {
    pub fragment: Option<RenderFragment>,
    pub class: String,
    pub style: String,
    pub show_content: bool,
    pub tag: Option<PopoverTag>,
    pub user_attributes: UserAttributes,
}

impl PopoverContent {
    /// Capture the current state of a popover. Attributes are copied, not shared.
    pub fn from_popover(popover: &dyn Popover) -> Self {
        Self {
            fragment: popover.child_content(),
            class: popover.popover_class(),
            style: popover.popover_styles(),
            show_content: popover.open(),
            tag: popover.tag(),
            user_attributes: popover.user_attributes(),
        }
    }
}

impl fmt::Debug for PopoverContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopoverContent")
            .field("has_fragment", &self.fragment.is_some())
            .field("class", &self.class)
            .field("style", &self.style)
            .field("show_content", &self.show_content)
            .field("has_tag", &self.tag.is_some())
            .field("user_attributes", &self.user_attributes)
            .finish()
    }
}

/// Resets a flag when dropped, whether or not the surrounding future completed.
struct ResetOnDrop<'a>(&'a AtomicBool);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The service-owned record of one popover.
///
/// A handler starts unconnected. The service connects it on the first
/// update, queues it for a batched disconnect on destroy, and drops it once
/// that disconnect has run.
pub struct PopoverHandler {
    id: PopoverId,
    interop: PopoverInterop,
    updater: Updater,
    content: RwLock<PopoverContent>,
    locked: AtomicBool,
    connected: AtomicBool,
    detached: AtomicBool,
    last_rendered: Mutex<Option<Instant>>,
    /// Serializes service operations on this handler.
    pub(crate) op_lock: tokio::sync::Mutex<()>,
}

impl fmt::Debug for PopoverHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopoverHandler")
            .field("id", &self.id)
            .field("content", &*self.content.read())
            .field("locked", &self.is_locked())
            .field("connected", &self.is_connected())
            .field("detached", &self.is_detached())
            .finish()
    }
}

impl PopoverHandler {
    pub(crate) fn new(id: PopoverId, content: PopoverContent, interop: PopoverInterop, updater: Updater) -> Self {
        Self {
            id,
            interop,
            updater,
            content: RwLock::new(content),
            locked: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            detached: AtomicBool::new(false),
            last_rendered: Mutex::new(None),
            op_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The popover this handler belongs to.
    pub fn id(&self) -> PopoverId {
        self.id
    }

    /// A copy of the current visual state.
    pub fn content(&self) -> PopoverContent {
        self.content.read().clone()
    }

    /// The current content fragment.
    pub fn fragment(&self) -> Option<RenderFragment> {
        self.content.read().fragment.clone()
    }

    /// The current CSS class.
    pub fn class(&self) -> String {
        self.content.read().class.clone()
    }

    /// The current inline style.
    pub fn style(&self) -> String {
        self.content.read().style.clone()
    }

    /// Whether the content is meant to be visible.
    pub fn show_content(&self) -> bool {
        self.content.read().show_content
    }

    /// The caller's payload.
    pub fn tag(&self) -> Option<PopoverTag> {
        self.content.read().tag.clone()
    }

    /// The extra element attributes.
    pub fn user_attributes(&self) -> UserAttributes {
        self.content.read().user_attributes.clone()
    }

    /// Whether the host connect call has completed.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether the handler has been destroyed.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Whether an update notification is pending a render.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// When a provider last rendered this handler.
    pub fn last_rendered(&self) -> Option<Instant> {
        *self.last_rendered.lock()
    }

    /// Replace the visible state in one assignment.
    ///
    /// The updater fires only if the handler is not already locked, so any
    /// number of updates between two [`release`](Self::release) calls produce
    /// one notification. The stored state is always the latest one.
    pub fn update_fragment(&self, fragment: Option<RenderFragment>, class: impl Into<String>, style: impl Into<String>, show_content: bool) {
        let (tag, user_attributes) = {
            let current = self.content.read();
            (current.tag.clone(), current.user_attributes.clone())
        };
        self.set_content(PopoverContent {
            fragment,
            class: class.into(),
            style: style.into(),
            show_content,
            tag,
            user_attributes,
        });
    }

    /// Replace the whole state, including tag and attributes.
    pub(crate) fn set_content(&self, content: PopoverContent) {
        *self.content.write() = content;
        if !self.locked.swap(true, Ordering::SeqCst) {
            tracing::trace!(target: targets::POPOVER, id = %self.id, "handler locked, requesting render");
            (self.updater)(self.id);
        }
    }

    /// Unlock the handler after a render pass.
    pub fn release(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }

    /// Record that a provider has just rendered this handler.
    pub fn mark_rendered(&self) {
        *self.last_rendered.lock() = Some(Instant::now());
    }

    /// Connect the host artifact. `is_connected` turns true only once the
    /// call has completed, so a failed call leaves the handler unconnected.
    pub async fn initialize(&self) -> Result<(), HostError> {
        self.interop.connect(self.id).await?;
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!(target: targets::POPOVER, id = %self.id, "popover connected");
        Ok(())
    }

    /// Disconnect the host artifact.
    ///
    /// A handler that was never connected makes no host call. Cancellation
    /// and disconnection of the host are swallowed. The handler is
    /// unconnected afterwards in every case, including when the returned
    /// future is dropped mid-call.
    pub async fn detach(&self) -> Result<(), HostError> {
        let _reset = ResetOnDrop(&self.connected);
        if !self.is_connected() {
            tracing::trace!(target: targets::POPOVER, id = %self.id, "never connected, skipping disconnect");
            return Ok(());
        }
        let result = self.interop.disconnect(self.id).await;
        suppress_benign("disconnect", result).map(|_| {
            tracing::debug!(target: targets::POPOVER, id = %self.id, "popover disconnected");
        })
    }

    pub(crate) fn mark_detached(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }
}
