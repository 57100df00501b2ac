//! Structural relationships between blocks and frames.
//!
//! Parent and frame links are weak back-references: they are resolved
//! through the [`Workspace`] on demand and never stored as owners.

use crate::id::ElementId;
use crate::model::{Link, Workspace};
use std::collections::HashSet;

/// Every block nested under `block`, directly or transitively, through both
/// trailing and nested links. Depth-first, connection order, excluding
/// `block` itself.
pub fn descendant_ids(ws: &(impl Workspace + ?Sized), block: ElementId) -> Vec<ElementId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<ElementId> = ws.children(block).iter().rev().map(|(c, _)| *c).collect();
    while let Some(id) = stack.pop() {
        if id == block || !seen.insert(id) {
            continue;
        }
        out.push(id);
        stack.extend(ws.children(id).iter().rev().map(|(c, _)| *c));
    }
    out
}

/// Parent chain of `block`, nearest first.
pub fn ancestors(ws: &(impl Workspace + ?Sized), block: ElementId) -> Vec<(ElementId, Link)> {
    let mut out = Vec::new();
    let mut current = block;
    while let Some((parent, link)) = ws.parent(current) {
        if parent == block || out.iter().any(|(a, _)| *a == parent) {
            log::warn!("cycle in block parents at {parent}");
            break;
        }
        out.push((parent, link));
        current = parent;
    }
    out
}

/// Whether any ancestor of `block` is in `selected`.
pub fn is_descendant_of_selected(
    ws: &(impl Workspace + ?Sized),
    block: ElementId,
    selected: &HashSet<ElementId>,
) -> bool {
    ancestors(ws, block)
        .iter()
        .any(|(ancestor, _)| selected.contains(ancestor))
}

/// Root of the stack `block` belongs to (itself when top-level).
pub fn top_level_of(ws: &(impl Workspace + ?Sized), block: ElementId) -> ElementId {
    ancestors(ws, block)
        .last()
        .map(|(root, _)| *root)
        .unwrap_or(block)
}

/// Frame holding `block`. Nested blocks reach it through their top-level ancestor.
pub fn containing_frame(ws: &(impl Workspace + ?Sized), block: ElementId) -> Option<ElementId> {
    ws.frame_of(top_level_of(ws, block))
}

/// The blocks among `blocks` whose containing frame is `frame`.
pub fn members_of<'a>(
    ws: &(impl Workspace + ?Sized),
    frame: ElementId,
    blocks: impl IntoIterator<Item = &'a ElementId>,
) -> Vec<ElementId> {
    blocks
        .into_iter()
        .copied()
        .filter(|b| containing_frame(ws, *b) == Some(frame))
        .collect()
}

/// Whether `block` hangs off its parent through the trailing connection.
/// Top-level blocks have no parent and answer `false`.
pub fn is_trailing(ws: &(impl Workspace + ?Sized), block: ElementId) -> bool {
    matches!(ws.parent(block), Some((_, Link::Next)))
}
