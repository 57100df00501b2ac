//! Rectangle select: which blocks and frames a drawn rectangle picks up.
//!
//! Runs on every (debounced) rectangle update against an [`ElementCache`]
//! captured once at gesture start, so a drag never re-queries layout.
//!
//! 1. Geometric pass: every selectable block that [`overlaps`] the rectangle
//!    is selected, and its descendants are queued.
//! 2. Propagation pass: queued descendants are selected even when their own
//!    boxes miss the rectangle. This needs the complete first pass, so it
//!    cannot be folded into it.
//! 3. Frames: an unlocked frame fully inside the rectangle is selected and
//!    its member blocks move from the block set to highlight-only.

use std::collections::HashSet;
use tbs_core::hierarchy::{containing_frame, descendant_ids};
use tbs_core::{Block, ElementId, Frame, OverlapPolicy, Rect, Workspace, fully_contains, overlaps};

#[derive(Debug, Clone, PartialEq)]
pub struct CachedBlock {
    pub block: Block,
    /// `None` while the block is not rendered; geometry skips it.
    pub bounds: Option<Rect>,
    pub frame: Option<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedFrame {
    pub frame: Frame,
    pub bounds: Option<Rect>,
}

/// Selectable elements and their boxes, frozen for one gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementCache {
    /// Non-shadow blocks in scene order.
    pub blocks: Vec<CachedBlock>,
    pub frames: Vec<CachedFrame>,
    pub scale: f64,
}

impl ElementCache {
    pub fn capture(ws: &(impl Workspace + ?Sized)) -> Self {
        let blocks: Vec<CachedBlock> = ws
            .block_ids()
            .into_iter()
            .filter_map(|id| ws.block(id))
            .filter(|b| !b.shadow)
            .map(|block| CachedBlock {
                block,
                bounds: ws.block_bounds(block.id),
                frame: containing_frame(ws, block.id),
            })
            .collect();
        let frames: Vec<CachedFrame> = ws
            .frame_ids()
            .into_iter()
            .filter_map(|id| ws.frame(id))
            .map(|frame| CachedFrame {
                frame,
                bounds: ws.frame_bounds(frame.id),
            })
            .collect();
        log::trace!(
            "captured {} blocks, {} frames",
            blocks.len(),
            frames.len()
        );
        Self {
            blocks,
            frames,
            scale: ws.viewport().effective_scale(),
        }
    }
}

/// Outcome of one rectangle pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectSelection {
    pub blocks: Vec<Block>,
    pub frames: Vec<Frame>,
    /// Members of selected frames: highlighted, represented by the frame.
    pub highlight_only: Vec<ElementId>,
}

impl RectSelection {
    pub fn contains_block(&self, id: ElementId) -> bool {
        self.blocks.iter().any(|b| b.id == id)
    }

    pub fn contains_frame(&self, id: ElementId) -> bool {
        self.frames.iter().any(|f| f.id == id)
    }
}

/// Compute the selection for `rect` (canvas units).
pub fn compute(
    ws: &(impl Workspace + ?Sized),
    cache: &ElementCache,
    rect: Rect,
    policy: &OverlapPolicy,
) -> RectSelection {
    let mut selected: HashSet<ElementId> = HashSet::new();
    let mut pending: HashSet<ElementId> = HashSet::new();

    for cached in &cache.blocks {
        let block = &cached.block;
        if !block.selectable {
            continue;
        }
        let Some(bounds) = cached.bounds else {
            continue;
        };
        if overlaps(bounds, rect, block.is_container(), cache.scale, policy) {
            selected.insert(block.id);
            // Already queued by an ancestor: its subtree is queued too.
            if !pending.contains(&block.id) {
                pending.extend(descendant_ids(ws, block.id));
            }
        }
    }

    let mut blocks: Vec<Block> = cache
        .blocks
        .iter()
        .filter(|c| selected.contains(&c.block.id) || pending.contains(&c.block.id))
        .map(|c| c.block)
        .collect();

    let mut frames = Vec::new();
    let mut highlight_only = Vec::new();
    for cached in &cache.frames {
        if cached.frame.locked {
            continue;
        }
        let Some(bounds) = cached.bounds else {
            continue;
        };
        if !fully_contains(bounds, rect) {
            continue;
        }
        let frame_id = cached.frame.id;
        frames.push(cached.frame);
        blocks.retain(|b| {
            let member = cache
                .blocks
                .iter()
                .any(|c| c.block.id == b.id && c.frame == Some(frame_id));
            if member {
                highlight_only.push(b.id);
            }
            !member
        });
    }

    log::trace!(
        "rect pass: {} blocks, {} frames, {} highlight-only",
        blocks.len(),
        frames.len(),
        highlight_only.len()
    );
    RectSelection {
        blocks,
        frames,
        highlight_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tbs_core::{BlockScene, Category, Link};

    fn id(s: &str) -> ElementId {
        ElementId::intern(s)
    }

    fn r(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::from_origin_size((x, y), (w, h))
    }

    /// A container at (100,100) 200×200 with two body children far down
    /// its body, plus a framed stack at (600,100).
    fn scene() -> BlockScene {
        let mut s = BlockScene::new();
        s.add_block(
            Block::new(id("r_loop"), Category::Control),
            None,
            Some(r(100.0, 100.0, 200.0, 200.0)),
        );
        s.add_block(
            Block::new(id("r_c1"), Category::parse("motion")),
            Some((id("r_loop"), Link::Input)),
            Some(r(120.0, 200.0, 100.0, 30.0)),
        );
        s.add_block(
            Block::new(id("r_c2"), Category::parse("motion")),
            Some((id("r_c1"), Link::Next)),
            Some(r(120.0, 230.0, 100.0, 30.0)),
        );
        s.add_frame(Frame::new(id("r_frame")), Some(r(550.0, 50.0, 200.0, 200.0)));
        s.add_block(
            Block::new(id("r_framed"), Category::parse("looks")),
            None,
            Some(r(600.0, 100.0, 80.0, 30.0)),
        );
        s.place_in_frame(id("r_framed"), id("r_frame"));
        s
    }

    fn block_ids(sel: &RectSelection) -> Vec<&str> {
        let mut v: Vec<&str> = sel.blocks.iter().map(|b| b.id.as_str()).collect();
        v.sort();
        v
    }

    #[test]
    fn container_drags_children_along() {
        let s = scene();
        let cache = ElementCache::capture(&s);
        // Clips the container header only; children lie far below.
        let sel = compute(&s, &cache, r(90.0, 90.0, 50.0, 30.0), &OverlapPolicy::default());
        assert_eq!(block_ids(&sel), vec!["r_c1", "r_c2", "r_loop"]);
    }

    #[test]
    fn body_sweep_selects_children_not_container() {
        let s = scene();
        let cache = ElementCache::capture(&s);
        let sel = compute(&s, &cache, r(110.0, 190.0, 30.0, 80.0), &OverlapPolicy::default());
        assert_eq!(block_ids(&sel), vec!["r_c1", "r_c2"]);
    }

    #[test]
    fn frame_partial_overlap_not_selected() {
        let s = scene();
        let cache = ElementCache::capture(&s);
        let sel = compute(&s, &cache, r(500.0, 0.0, 200.0, 400.0), &OverlapPolicy::default());
        assert!(!sel.contains_frame(id("r_frame")));
        assert!(sel.contains_block(id("r_framed")));
        assert!(sel.highlight_only.is_empty());
    }

    #[test]
    fn frame_fully_enclosed_takes_over_members() {
        let s = scene();
        let cache = ElementCache::capture(&s);
        let sel = compute(&s, &cache, r(500.0, 0.0, 400.0, 400.0), &OverlapPolicy::default());
        assert!(sel.contains_frame(id("r_frame")));
        assert!(!sel.contains_block(id("r_framed")));
        assert_eq!(sel.highlight_only, vec![id("r_framed")]);
    }

    #[test]
    fn locked_frame_skipped() {
        let mut s = scene();
        s.get_frame_mut(id("r_frame")).unwrap().locked = true;
        let cache = ElementCache::capture(&s);
        let sel = compute(&s, &cache, r(500.0, 0.0, 400.0, 400.0), &OverlapPolicy::default());
        assert!(sel.frames.is_empty());
        assert!(sel.contains_block(id("r_framed")));
    }

    #[test]
    fn unrendered_block_is_skipped_by_geometry() {
        let mut s = scene();
        s.set_bounds(id("r_framed"), None);
        let cache = ElementCache::capture(&s);
        let sel = compute(&s, &cache, r(590.0, 90.0, 20.0, 20.0), &OverlapPolicy::default());
        assert!(sel.blocks.is_empty());
    }

    #[test]
    fn shadow_and_unselectable_blocks_excluded() {
        let mut s = scene();
        let mut shadow = Block::new(id("r_shadow"), Category::parse("operators"));
        shadow.shadow = true;
        s.add_block(shadow, None, Some(r(0.0, 400.0, 50.0, 50.0)));
        let mut fixed = Block::new(id("r_fixed"), Category::parse("looks"));
        fixed.selectable = false;
        s.add_block(fixed, None, Some(r(60.0, 400.0, 50.0, 50.0)));

        let cache = ElementCache::capture(&s);
        assert!(cache.blocks.iter().all(|c| c.block.id != id("r_shadow")));
        let sel = compute(&s, &cache, r(0.0, 390.0, 200.0, 100.0), &OverlapPolicy::default());
        assert!(sel.blocks.is_empty());
    }
}
