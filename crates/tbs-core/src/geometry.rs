//! Box predicates for rectangle selection.
//!
//! Every comparison happens in canvas units. Touch points arrive in surface
//! pixels and are mapped through [`Viewport::to_canvas_rect`] before they
//! meet element bounds, so both sides of a test are normalized the same way.
//!
//! Blocks are picked up by partial overlap because the rectangle sweeps
//! across them piecewise while it grows. Frames must be fully enclosed.
//! Container ("control") blocks are hollow: their C-shaped body wraps other
//! blocks, so only the header band counts (see [`OverlapPolicy`]).

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Canvas → surface transform of the editor.
///
/// `surface = canvas * scale + origin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Zoom factor (1.0 = unscaled).
    pub scale: f64,
    /// Surface position of the canvas origin, in pixels.
    pub origin: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin: Point::ZERO,
        }
    }
}

impl Viewport {
    /// Map a surface point (touch pixels) into canvas units.
    pub fn to_canvas(&self, p: Point) -> Point {
        let scale = self.effective_scale();
        Point::new((p.x - self.origin.x) / scale, (p.y - self.origin.y) / scale)
    }

    /// Map a surface rectangle into canvas units.
    pub fn to_canvas_rect(&self, r: Rect) -> Rect {
        Rect::from_points(
            self.to_canvas(Point::new(r.x0, r.y0)),
            self.to_canvas(Point::new(r.x1, r.y1)),
        )
    }

    /// A zero or negative zoom would collapse the canvas; fall back to 1.0.
    pub fn effective_scale(&self) -> f64 {
        if self.scale > 0.0 && self.scale.is_finite() {
            self.scale
        } else {
            1.0
        }
    }
}

/// Tunable rule for hollow container blocks.
///
/// A container is only hit when the selection rectangle intersects its
/// header band (the top `container_header` canvas units of its box) by at
/// least `min_overlap_px` surface pixels on both axes. Grazing the C-shaped
/// arm or sweeping through the hollow body never selects the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapPolicy {
    /// Height of the header band, in canvas units.
    pub container_header: f64,
    /// Minimum intersection extent on each axis, in surface pixels.
    pub min_overlap_px: f64,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self {
            container_header: 40.0,
            min_overlap_px: 4.0,
        }
    }
}

/// Rectangle spanning two corners given in any order.
pub fn normalize_rect(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

/// Whether an element box counts as hit by the selection rectangle.
///
/// Leaf blocks need a positive-area intersection; touching edges do not
/// count. Containers follow [`OverlapPolicy`], with the pixel threshold
/// converted to canvas units through `scale`.
pub fn overlaps(
    element: Rect,
    selection: Rect,
    is_container: bool,
    scale: f64,
    policy: &OverlapPolicy,
) -> bool {
    if !is_container {
        let hit = element.intersect(selection);
        return hit.width() > 0.0 && hit.height() > 0.0;
    }

    let header_bottom = (element.y0 + policy.container_header).min(element.y1);
    let header = Rect::new(element.x0, element.y0, element.x1, header_bottom);
    let hit = header.intersect(selection);
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let min = policy.min_overlap_px / scale;
    hit.width() > 0.0 && hit.height() > 0.0 && hit.width() >= min && hit.height() >= min
}

/// Strict containment: every edge of `inner` lies strictly inside `outer`.
pub fn fully_contains(inner: Rect, outer: Rect) -> bool {
    inner.x0 > outer.x0 && inner.y0 > outer.y0 && inner.x1 < outer.x1 && inner.y1 < outer.y1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::from_origin_size((x, y), (w, h))
    }

    #[test]
    fn leaf_partial_overlap_hits() {
        let policy = OverlapPolicy::default();
        let block = rect(100.0, 100.0, 80.0, 30.0);
        assert!(overlaps(block, rect(150.0, 120.0, 100.0, 100.0), false, 1.0, &policy));
        assert!(!overlaps(block, rect(300.0, 300.0, 10.0, 10.0), false, 1.0, &policy));
    }

    #[test]
    fn leaf_touching_edge_does_not_hit() {
        let policy = OverlapPolicy::default();
        let block = rect(0.0, 0.0, 50.0, 50.0);
        assert!(!overlaps(block, rect(50.0, 0.0, 20.0, 20.0), false, 1.0, &policy));
    }

    #[test]
    fn container_body_sweep_misses() {
        let policy = OverlapPolicy::default();
        // 200 tall C-block; the selection only clips the lower body.
        let container = rect(0.0, 0.0, 200.0, 200.0);
        let body_only = rect(20.0, 100.0, 50.0, 50.0);
        assert!(!overlaps(container, body_only, true, 1.0, &policy));
        // The same rectangle is a hit for a leaf of the same size.
        assert!(overlaps(container, body_only, false, 1.0, &policy));
    }

    #[test]
    fn container_header_hits() {
        let policy = OverlapPolicy::default();
        let container = rect(0.0, 0.0, 200.0, 200.0);
        assert!(overlaps(container, rect(10.0, 10.0, 50.0, 50.0), true, 1.0, &policy));
    }

    #[test]
    fn container_threshold_scales_with_zoom() {
        let policy = OverlapPolicy::default();
        let container = rect(0.0, 0.0, 200.0, 200.0);
        // 3 canvas units of header overlap: under 4px at 1x, over 4px at 2x.
        let sliver = rect(10.0, 37.0, 50.0, 50.0);
        assert!(!overlaps(container, sliver, true, 1.0, &policy));
        assert!(overlaps(container, sliver, true, 2.0, &policy));
    }

    #[test]
    fn fully_contains_is_strict() {
        let outer = rect(0.0, 0.0, 100.0, 100.0);
        assert!(fully_contains(rect(10.0, 10.0, 20.0, 20.0), outer));
        // Shared edge is not "strictly inside".
        assert!(!fully_contains(rect(0.0, 10.0, 20.0, 20.0), outer));
        // Partial overlap.
        assert!(!fully_contains(rect(90.0, 10.0, 20.0, 20.0), outer));
    }

    #[test]
    fn viewport_maps_surface_to_canvas() {
        let vp = Viewport {
            scale: 2.0,
            origin: Point::new(10.0, 20.0),
        };
        let r = vp.to_canvas_rect(Rect::new(30.0, 60.0, 10.0, 20.0));
        assert_eq!(r, Rect::new(0.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn normalize_rect_any_corner_order() {
        let r = normalize_rect(Point::new(50.0, 10.0), Point::new(20.0, 40.0));
        assert_eq!(r, Rect::new(20.0, 10.0, 50.0, 40.0));
    }
}
