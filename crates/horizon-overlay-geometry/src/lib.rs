//! Geometry for Horizon Overlay.
//!
//! Pure, side-effect-free helpers used to keep floating overlays on screen:
//!
//! - [`Rect`], [`Point`], [`Size`]: basic geometry in CSS pixels
//! - [`BoundingRect`]: a host measurement carrying the window size it was taken in
//! - [`Viewport`] / [`is_out_of_view`]: viewport containment checks
//! - [`correct_anchor_boundaries`]: flips an anchor so its fragment comes back into view
//! - [`CssPosition`]: `fixed` vs `absolute` placement
//!
//! # Example
//!
//! ```
//! use horizon_overlay_geometry::{BoundingRect, Rect, Viewport, correct_anchor_boundaries};
//!
//! let viewport = Viewport::new(800.0, 600.0);
//! let mut anchor = BoundingRect::new(Rect::new(100.0, 540.0, 50.0, 20.0), viewport);
//! let fragment = BoundingRect::new(Rect::new(100.0, 560.0, 50.0, 100.0), viewport);
//!
//! let offset = correct_anchor_boundaries(Some(&mut anchor), Some(&fragment)).unwrap();
//! assert!(!fragment.translated(offset).is_outside_bottom());
//! ```

mod position;
pub mod repositioning;
mod types;
mod viewport;

pub use position::CssPosition;
pub use repositioning::{correct_anchor_boundaries, flip_offset};
pub use types::{Point, Rect, Size};
pub use viewport::{BoundingRect, Viewport, is_out_of_view};
