//! Boundary correction for anchored overlays.
//!
//! An overlay fragment is positioned relative to an anchor point. When the
//! rendered fragment overflows the window, the anchor is moved so that the
//! fragment lands on the opposite side of the trigger instead of being
//! clamped against the window edge. The fragment keeps the same distance to
//! the trigger it had before the flip.

use crate::types::Point;
use crate::viewport::BoundingRect;

/// Whether the fragment sits entirely above or entirely below the anchor.
fn is_vertically_offset(anchor: &BoundingRect, fragment: &BoundingRect) -> bool {
    fragment.top >= anchor.bottom() || fragment.bottom() <= anchor.top
}

/// Offset to apply to the anchor so that `fragment` flips back into view.
///
/// Vertical overflow mirrors the fragment across the anchor. Horizontal
/// overflow of a fragment placed above or below the anchor shifts it by the
/// amount it sticks out past the anchor's edge, aligning the two edges; a
/// fragment placed beside the anchor is mirrored to the other side.
///
/// Only one vertical and one horizontal correction is applied. A fragment
/// larger than the window overflows both sides of an axis; it is corrected
/// for the bottom or right edge in that case.
pub fn flip_offset(anchor: &BoundingRect, fragment: &BoundingRect) -> Point {
    let mut offset = Point::ZERO;

    if fragment.is_outside_bottom() {
        let gap = fragment.top - anchor.bottom();
        offset.y -= 2.0 * gap + fragment.height + anchor.height;
    } else if fragment.is_outside_top() {
        let gap = anchor.top - fragment.bottom();
        offset.y += 2.0 * gap + fragment.height + anchor.height;
    }

    let vertically_offset = is_vertically_offset(anchor, fragment);
    if fragment.is_outside_right() {
        if vertically_offset {
            offset.x -= (fragment.right() - anchor.right()).max(0.0);
        } else {
            let gap = fragment.left - anchor.right();
            offset.x -= 2.0 * gap + fragment.width + anchor.width;
        }
    } else if fragment.is_outside_left() {
        if vertically_offset {
            offset.x += (anchor.left - fragment.left).max(0.0);
        } else {
            let gap = anchor.left - fragment.right();
            offset.x += 2.0 * gap + fragment.width + anchor.width;
        }
    }

    offset
}

/// Move `anchor` so that `fragment`, re-rendered relative to it, flips back into view.
///
/// Returns the offset applied to the anchor, or `None` without touching
/// anything when either rectangle has not been measured yet.
pub fn correct_anchor_boundaries(
    anchor: Option<&mut BoundingRect>,
    fragment: Option<&BoundingRect>,
) -> Option<Point> {
    let (anchor, fragment) = (anchor?, fragment?);
    let offset = flip_offset(anchor, fragment);
    anchor.translate(offset);
    Some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;
    use crate::viewport::{Viewport, is_out_of_view};

    const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);

    fn measured(x: f64, y: f64, w: f64, h: f64) -> BoundingRect {
        BoundingRect::new(Rect::new(x, y, w, h), VIEWPORT)
    }

    /// Corrects the anchor and returns where the fragment ends up.
    fn corrected(anchor: &mut BoundingRect, fragment: BoundingRect) -> BoundingRect {
        let offset = correct_anchor_boundaries(Some(anchor), Some(&fragment))
            .expect("both rects measured");
        fragment.translated(offset)
    }

    #[test]
    fn test_bottom_overflow_moves_anchor_up() {
        let mut anchor = measured(100.0, 100.0, 50.0, 20.0);
        let fragment = measured(100.0, 650.0, 50.0, 50.0);
        assert!(fragment.is_outside_bottom());

        let moved = corrected(&mut anchor, fragment);
        assert!(!moved.is_outside_bottom());
        assert!(anchor.top < 100.0);
        assert_eq!(anchor.left, 100.0);
    }

    #[test]
    fn test_dropdown_flips_above_trigger() {
        let mut anchor = measured(100.0, 540.0, 50.0, 20.0);
        let fragment = measured(100.0, 560.0, 50.0, 100.0);

        let moved = corrected(&mut anchor, fragment);
        assert_eq!(anchor.top, 420.0);
        assert_eq!(moved.top, 440.0);
        assert_eq!(moved.bottom(), 540.0);
        assert!(!is_out_of_view(&moved));
    }

    #[test]
    fn test_top_overflow_flips_below_trigger() {
        let mut anchor = measured(100.0, 10.0, 50.0, 20.0);
        let fragment = measured(100.0, -90.0, 50.0, 100.0);

        let moved = corrected(&mut anchor, fragment);
        assert_eq!(moved.top, 30.0);
        assert!(!is_out_of_view(&moved));
    }

    #[test]
    fn test_right_overflow_below_anchor_aligns_right_edges() {
        let mut anchor = measured(700.0, 100.0, 80.0, 20.0);
        let fragment = measured(700.0, 120.0, 200.0, 100.0);

        let moved = corrected(&mut anchor, fragment);
        assert_eq!(moved.right(), 780.0);
        assert_eq!(anchor.left, 580.0);
        assert!(!is_out_of_view(&moved));
    }

    #[test]
    fn test_right_overflow_beside_anchor_mirrors() {
        let mut anchor = measured(600.0, 100.0, 50.0, 20.0);
        let fragment = measured(650.0, 100.0, 200.0, 20.0);

        let moved = corrected(&mut anchor, fragment);
        assert_eq!(moved.left, 400.0);
        assert_eq!(moved.right(), 600.0);
        assert!(!is_out_of_view(&moved));
    }

    #[test]
    fn test_left_overflow_beside_anchor_mirrors() {
        let mut anchor = measured(20.0, 100.0, 30.0, 20.0);
        let fragment = measured(-180.0, 100.0, 200.0, 20.0);

        let moved = corrected(&mut anchor, fragment);
        assert_eq!(moved.left, 50.0);
        assert!(!is_out_of_view(&moved));
    }

    #[test]
    fn test_left_overflow_above_anchor_aligns_left_edges() {
        let mut anchor = measured(10.0, 300.0, 40.0, 20.0);
        let fragment = measured(-30.0, 200.0, 100.0, 100.0);

        let moved = corrected(&mut anchor, fragment);
        assert_eq!(moved.left, 10.0);
        assert!(!is_out_of_view(&moved));
    }

    #[test]
    fn test_in_view_fragment_is_untouched() {
        let mut anchor = measured(100.0, 100.0, 50.0, 20.0);
        let fragment = measured(100.0, 120.0, 50.0, 50.0);
        let offset = correct_anchor_boundaries(Some(&mut anchor), Some(&fragment));
        assert_eq!(offset, Some(Point::ZERO));
        assert_eq!(anchor, measured(100.0, 100.0, 50.0, 20.0));
    }

    #[test]
    fn test_unmeasured_rects_are_a_no_op() {
        let mut anchor = measured(100.0, 100.0, 50.0, 20.0);
        assert_eq!(correct_anchor_boundaries(Some(&mut anchor), None), None);
        assert_eq!(anchor.top, 100.0);

        let fragment = measured(100.0, 650.0, 50.0, 50.0);
        assert_eq!(correct_anchor_boundaries(None, Some(&fragment)), None);
    }
}
