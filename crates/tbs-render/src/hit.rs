//! Hit classification: point → touch target.
//!
//! The binding layer usually knows what was touched from the host's event
//! target. When it only has coordinates, this walks the scene front-to-back
//! the same way the editor paints it: nested blocks before their parents,
//! later stacks before earlier ones, then frames.

use std::collections::HashMap;
use tbs_core::hierarchy::ancestors;
use tbs_core::{ElementId, Mark, Point, Workspace};

/// What a touch landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchTarget {
    /// Bare canvas background.
    Background,
    /// Empty interior of an unselected frame.
    FrameInterior(ElementId),
    /// Highlight region of a selected frame.
    FrameHighlight(ElementId),
    /// A frame's title bar or border.
    Frame(ElementId),
    Block(ElementId),
    /// Context menu or other surface where selection must not start.
    Menu,
    /// Anything else (toolbox, scrollbars, overlays).
    Other,
}

impl TouchTarget {
    /// The element under the touch, if it is a block or frame.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Self::Block(id)
            | Self::Frame(id)
            | Self::FrameInterior(id)
            | Self::FrameHighlight(id) => Some(*id),
            _ => None,
        }
    }
}

/// Classify a canvas-space point.
///
/// `marks` is the engine's current annotation table; a frame carrying
/// [`Mark::FrameHighlight`] reports its highlight region instead of its
/// interior.
pub fn classify(
    ws: &(impl Workspace + ?Sized),
    point: Point,
    marks: &HashMap<ElementId, Mark>,
) -> TouchTarget {
    if let Some(block) = topmost_block(ws, point) {
        return TouchTarget::Block(block);
    }

    for frame in ws.frame_ids().into_iter().rev() {
        let Some(bounds) = ws.frame_bounds(frame) else {
            continue;
        };
        if !bounds.contains(point) {
            continue;
        }
        if marks.get(&frame) == Some(&Mark::FrameHighlight) {
            return TouchTarget::FrameHighlight(frame);
        }
        return TouchTarget::FrameInterior(frame);
    }

    TouchTarget::Background
}

/// Front-most non-shadow block containing `point`.
///
/// Deeper blocks are painted over their parents, so depth wins; ties go to
/// the later block in scene order.
fn topmost_block(ws: &(impl Workspace + ?Sized), point: Point) -> Option<ElementId> {
    let mut best: Option<(usize, ElementId)> = None;
    for id in ws.block_ids() {
        let Some(block) = ws.block(id) else {
            continue;
        };
        if block.shadow {
            continue;
        }
        let Some(bounds) = ws.block_bounds(id) else {
            continue;
        };
        if !bounds.contains(point) {
            continue;
        }
        let depth = ancestors(ws, id).len();
        if best.is_none_or(|(d, _)| depth >= d) {
            best = Some((depth, id));
        }
    }
    best.map(|(_, id)| id)
}
