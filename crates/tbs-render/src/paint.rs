//! Annotation changes → host paint operations.
//!
//! The selection engine never touches rendered elements. It emits
//! [`MarkChange`]s; this module turns them into concrete style updates for
//! the host's [`Painter`].

use smallvec::SmallVec;
use tbs_core::{ElementId, Link, Mark, MarkChange, Workspace};

/// Fill opacity of a highlighted block.
pub const HIGHLIGHT_OPACITY: f32 = 0.4;
/// Fill opacity of a block in its normal state.
pub const NORMAL_OPACITY: f32 = 1.0;

/// A single style update on a rendered element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintOp {
    FillOpacity { id: ElementId, opacity: f32 },
    FrameHighlight { id: ElementId, on: bool },
}

/// Rendering collaborator that applies paint operations.
pub trait Painter {
    fn apply(&mut self, ops: &[PaintOp]);
}

/// Painter that records every operation (tests, headless hosts).
#[derive(Debug, Default)]
pub struct RecordingPainter {
    pub ops: Vec<PaintOp>,
}

impl Painter for RecordingPainter {
    fn apply(&mut self, ops: &[PaintOp]) {
        self.ops.extend_from_slice(ops);
    }
}

impl RecordingPainter {
    /// Last opacity painted on `id`, if any.
    pub fn opacity_of(&self, id: ElementId) -> Option<f32> {
        self.ops.iter().rev().find_map(|op| match op {
            PaintOp::FillOpacity { id: target, opacity } if *target == id => Some(*opacity),
            _ => None,
        })
    }

    /// Last frame highlight state painted on `id`, if any.
    pub fn frame_highlighted(&self, id: ElementId) -> Option<bool> {
        self.ops.iter().rev().find_map(|op| match op {
            PaintOp::FrameHighlight { id: target, on } if *target == id => Some(*on),
            _ => None,
        })
    }
}

/// Paint operations for one annotation change.
///
/// Block highlights also cover the block's shadow children, which render as
/// part of it. Unknown ids produce nothing.
pub fn ops_for(ws: &(impl Workspace + ?Sized), change: &MarkChange) -> SmallVec<[PaintOp; 4]> {
    let mut ops = SmallVec::new();

    if ws.frame(change.id).is_some() {
        let on = change.mark == Some(Mark::FrameHighlight);
        log::trace!("PAINT frame {} highlight={on}", change.id);
        ops.push(PaintOp::FrameHighlight { id: change.id, on });
        return ops;
    }

    if ws.block(change.id).is_none() {
        return ops;
    }

    let opacity = match change.mark {
        Some(Mark::Selected | Mark::HighlightOnly) => HIGHLIGHT_OPACITY,
        Some(Mark::FrameHighlight) | None => NORMAL_OPACITY,
    };
    log::trace!("PAINT block {} opacity={opacity}", change.id);
    ops.push(PaintOp::FillOpacity {
        id: change.id,
        opacity,
    });

    for (child, link) in ws.children(change.id) {
        if link == Link::Input && ws.block(child).is_some_and(|b| b.shadow) {
            ops.push(PaintOp::FillOpacity { id: child, opacity });
        }
    }
    ops
}

/// Paint a batch of changes in order.
pub fn paint_changes(
    ws: &(impl Workspace + ?Sized),
    changes: &[MarkChange],
    painter: &mut (impl Painter + ?Sized),
) {
    if changes.is_empty() {
        return;
    }
    let ops: Vec<PaintOp> = changes.iter().flat_map(|c| ops_for(ws, c)).collect();
    painter.apply(&ops);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tbs_core::{Block, BlockScene, Category, Frame};

    fn id(s: &str) -> ElementId {
        ElementId::intern(s)
    }

    fn scene() -> BlockScene {
        let mut s = BlockScene::new();
        s.add_block(Block::new(id("p_if"), Category::Control), None, None);
        let mut shadow = Block::new(id("p_cond"), Category::parse("operators"));
        shadow.shadow = true;
        s.add_block(shadow, Some((id("p_if"), Link::Input)), None);
        s.add_block(
            Block::new(id("p_body"), Category::parse("motion")),
            Some((id("p_if"), Link::Input)),
            None,
        );
        s.add_frame(Frame::new(id("p_frame")), None);
        s
    }

    #[test]
    fn selected_block_dims_shadow_children_only() {
        let s = scene();
        let ops = ops_for(
            &s,
            &MarkChange {
                id: id("p_if"),
                mark: Some(Mark::Selected),
            },
        );
        assert_eq!(
            ops.as_slice(),
            &[
                PaintOp::FillOpacity {
                    id: id("p_if"),
                    opacity: HIGHLIGHT_OPACITY
                },
                PaintOp::FillOpacity {
                    id: id("p_cond"),
                    opacity: HIGHLIGHT_OPACITY
                },
            ]
        );
    }

    #[test]
    fn cleared_frame_turns_highlight_off() {
        let s = scene();
        let mut painter = RecordingPainter::default();
        paint_changes(
            &s,
            &[
                MarkChange {
                    id: id("p_frame"),
                    mark: Some(Mark::FrameHighlight),
                },
                MarkChange {
                    id: id("p_frame"),
                    mark: None,
                },
            ],
            &mut painter,
        );
        assert_eq!(painter.ops.len(), 2);
        assert_eq!(painter.frame_highlighted(id("p_frame")), Some(false));
    }

    #[test]
    fn unknown_ids_paint_nothing() {
        let s = scene();
        let ops = ops_for(
            &s,
            &MarkChange {
                id: id("p_ghost"),
                mark: Some(Mark::Selected),
            },
        );
        assert!(ops.is_empty());
    }
}
