//! Selection store.
//!
//! The authoritative set of selected blocks and frames, plus the transient
//! mark table that tells the rendering layer what to highlight. Every
//! mutation records [`MarkChange`]s (drained by the caller and painted
//! separately) and emits the resulting [`SelectionSnapshot`] to the
//! listener.
//!
//! Rules kept here:
//!
//! - selecting a block selects everything nested under it;
//! - a selected frame represents its members: they leave the block map and
//!   are only highlighted;
//! - locked frames are never selected;
//! - a block nested inside a selected composite cannot be peeled out on its
//!   own (see [`SelectionStore::can_unselect`]).

use crate::rect_select::RectSelection;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tbs_core::hierarchy::{ancestors, containing_frame, descendant_ids, is_trailing, members_of};
use tbs_core::{Block, ElementId, Frame, Mark, MarkChange, Workspace};

/// The currently selected blocks and frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSnapshot {
    pub blocks: HashMap<ElementId, Block>,
    pub frames: HashMap<ElementId, Frame>,
}

/// Id-only export of a snapshot for the binding layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotIds {
    pub blocks: Vec<ElementId>,
    pub frames: Vec<ElementId>,
}

impl SelectionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.frames.is_empty()
    }

    pub fn contains_block(&self, id: ElementId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn contains_frame(&self, id: ElementId) -> bool {
        self.frames.contains_key(&id)
    }

    /// Selected ids, sorted.
    pub fn ids(&self) -> SnapshotIds {
        let mut blocks: Vec<ElementId> = self.blocks.keys().copied().collect();
        let mut frames: Vec<ElementId> = self.frames.keys().copied().collect();
        blocks.sort();
        frames.sort();
        SnapshotIds { blocks, frames }
    }

    /// `{"blocks":[...],"frames":[...]}` with sorted ids.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.ids()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Callback invoked with the full snapshot after every mutation.
pub type SelectionListener = Box<dyn FnMut(&SelectionSnapshot)>;

#[derive(Default)]
pub struct SelectionStore {
    snapshot: SelectionSnapshot,
    marks: HashMap<ElementId, Mark>,
    /// Annotation diff not yet drained by the painter.
    changes: Vec<MarkChange>,
    /// Bumped on every emitted mutation.
    revision: u64,
    listener: Option<SelectionListener>,
}

impl fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionStore")
            .field("snapshot", &self.snapshot)
            .field("marks", &self.marks)
            .field("changes", &self.changes)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(listener: SelectionListener) -> Self {
        Self {
            listener: Some(listener),
            ..Self::default()
        }
    }

    pub fn set_listener(&mut self, listener: SelectionListener) {
        self.listener = Some(listener);
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        &self.snapshot
    }

    pub fn marks(&self) -> &HashMap<ElementId, Mark> {
        &self.marks
    }

    pub fn mark_of(&self, id: ElementId) -> Option<Mark> {
        self.marks.get(&id).copied()
    }

    /// Whether the block is in the block map ("boxed"), not merely highlighted.
    pub fn is_boxed(&self, id: ElementId) -> bool {
        self.mark_of(id) == Some(Mark::Selected)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drain the annotation diff recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<MarkChange> {
        std::mem::take(&mut self.changes)
    }

    // ─── Blocks ──────────────────────────────────────────────────────────

    /// Select `id` and every block nested under it.
    ///
    /// Refused for members of a selected frame: the frame already represents
    /// them (see [`dissolve_frame`](Self::dissolve_frame) to break it up).
    pub fn select_block(&mut self, ws: &(impl Workspace + ?Sized), id: ElementId) -> bool {
        if containing_frame(ws, id).is_some_and(|f| self.snapshot.contains_frame(f)) {
            log::debug!("select {id} refused: its frame is selected");
            return false;
        }
        if !self.insert_block_tree(ws, id) {
            return false;
        }
        self.emit();
        true
    }

    /// Whether `id` may be removed on its own.
    ///
    /// A block whose selected parent holds it by a nested link is part of
    /// that parent's composite. Walking up through selected ancestors, every
    /// container ancestor must be reached through its trailing connection;
    /// otherwise the block sits inside a selected container's body.
    pub fn can_unselect(&self, ws: &(impl Workspace + ?Sized), id: ElementId) -> bool {
        if let Some((parent, _)) = ws.parent(id)
            && self.is_boxed(parent)
            && !is_trailing(ws, id)
        {
            return false;
        }

        let mut current = id;
        while let Some((parent, _)) = ws.parent(current) {
            if !self.is_boxed(parent) {
                break;
            }
            let container = ws.block(parent).is_some_and(|b| b.is_container());
            if container && !is_trailing(ws, current) {
                return false;
            }
            current = parent;
        }
        true
    }

    /// Unselect `id` and its selected descendants. Refused (no-op) when
    /// [`can_unselect`](Self::can_unselect) fails or `id` is not selected.
    pub fn unselect_block(&mut self, ws: &(impl Workspace + ?Sized), id: ElementId) -> bool {
        if !self.snapshot.contains_block(id) {
            return false;
        }
        if !self.can_unselect(ws, id) {
            log::debug!("unselect {id} refused: nested in a selected composite");
            return false;
        }
        self.snapshot.blocks.remove(&id);
        self.set_mark(id, None);
        for child in descendant_ids(ws, id) {
            if self.snapshot.blocks.remove(&child).is_some() {
                self.set_mark(child, None);
            }
        }
        self.emit();
        true
    }

    // ─── Frames ──────────────────────────────────────────────────────────

    /// Select a frame. Its members leave the block map and stay highlighted.
    pub fn select_frame(&mut self, ws: &(impl Workspace + ?Sized), id: ElementId) -> bool {
        let Some(frame) = ws.frame(id) else {
            return false;
        };
        if frame.locked {
            return false;
        }
        self.snapshot.frames.insert(id, frame);
        let all = ws.block_ids();
        for member in members_of(ws, id, &all) {
            if ws.block(member).is_some_and(|b| b.shadow) {
                continue;
            }
            self.snapshot.blocks.remove(&member);
            self.set_mark(member, Some(Mark::HighlightOnly));
        }
        self.set_mark(id, Some(Mark::FrameHighlight));
        self.emit();
        true
    }

    /// Unselect a frame. With `also_unselect_members` its members are
    /// cleared too; otherwise they keep their current annotation.
    pub fn unselect_frame(
        &mut self,
        ws: &(impl Workspace + ?Sized),
        id: ElementId,
        also_unselect_members: bool,
    ) -> bool {
        if !self.remove_frame(ws, id, also_unselect_members) {
            return false;
        }
        self.emit();
        true
    }

    /// Selecting a block inside a selected frame: the frame is dissolved,
    /// `tapped` and its ancestors are cleared, and every other member is
    /// selected on its own with its descendants.
    ///
    /// Clearing the ancestors keeps a nested `tapped` from coming back in
    /// through its top-level block's subtree.
    pub fn dissolve_frame(
        &mut self,
        ws: &(impl Workspace + ?Sized),
        frame: ElementId,
        tapped: ElementId,
    ) -> bool {
        if !self.snapshot.contains_frame(frame) {
            return false;
        }
        let mut cleared: HashSet<ElementId> =
            ancestors(ws, tapped).into_iter().map(|(a, _)| a).collect();
        cleared.insert(tapped);
        for id in &cleared {
            self.snapshot.blocks.remove(id);
            self.set_mark(*id, None);
        }
        self.remove_frame(ws, frame, false);
        let all = ws.block_ids();
        for member in members_of(ws, frame, &all) {
            if !cleared.contains(&member) {
                self.insert_block_tree(ws, member);
            }
        }
        self.emit();
        true
    }

    // ─── Bulk ────────────────────────────────────────────────────────────

    /// Replace the whole selection with a rectangle-select result.
    pub fn replace(&mut self, result: RectSelection) {
        let mut next: HashMap<ElementId, Mark> = HashMap::new();
        for block in &result.blocks {
            next.insert(block.id, Mark::Selected);
        }
        for id in &result.highlight_only {
            next.insert(*id, Mark::HighlightOnly);
        }
        for frame in &result.frames {
            next.insert(frame.id, Mark::FrameHighlight);
        }

        let stale: Vec<ElementId> = self
            .marks
            .keys()
            .filter(|id| !next.contains_key(id))
            .copied()
            .collect();
        for id in stale {
            self.set_mark(id, None);
        }
        for (id, mark) in next {
            self.set_mark(id, Some(mark));
        }

        self.snapshot = SelectionSnapshot {
            blocks: result.blocks.into_iter().map(|b| (b.id, b)).collect(),
            frames: result.frames.into_iter().map(|f| (f.id, f)).collect(),
        };
        self.emit();
    }

    /// Reset to an empty selection. With `is_deleting` the annotations are
    /// dropped without recording changes: the elements are about to be
    /// destroyed by the editor.
    pub fn clear_all(&mut self, is_deleting: bool) {
        if is_deleting {
            self.marks.clear();
            self.changes.clear();
        } else {
            let marked: Vec<ElementId> = self.marks.keys().copied().collect();
            for id in marked {
                self.set_mark(id, None);
            }
        }
        self.snapshot = SelectionSnapshot::default();
        self.emit();
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn insert_block_tree(&mut self, ws: &(impl Workspace + ?Sized), id: ElementId) -> bool {
        let Some(block) = ws.block(id) else {
            return false;
        };
        if block.shadow {
            return false;
        }
        self.snapshot.blocks.insert(id, block);
        self.set_mark(id, Some(Mark::Selected));
        for child in descendant_ids(ws, id) {
            if let Some(b) = ws.block(child).filter(|b| !b.shadow) {
                self.snapshot.blocks.insert(child, b);
                self.set_mark(child, Some(Mark::Selected));
            }
        }
        true
    }

    fn remove_frame(
        &mut self,
        ws: &(impl Workspace + ?Sized),
        id: ElementId,
        also_unselect_members: bool,
    ) -> bool {
        if self.snapshot.frames.remove(&id).is_none() {
            return false;
        }
        self.set_mark(id, None);
        if also_unselect_members {
            let all = ws.block_ids();
            for member in members_of(ws, id, &all) {
                self.snapshot.blocks.remove(&member);
                self.set_mark(member, None);
            }
        }
        true
    }

    fn set_mark(&mut self, id: ElementId, mark: Option<Mark>) {
        let previous = match mark {
            Some(m) => self.marks.insert(id, m),
            None => self.marks.remove(&id),
        };
        if previous != mark {
            self.changes.push(MarkChange { id, mark });
        }
    }

    fn emit(&mut self) {
        self.revision += 1;
        log::trace!(
            "selection r{}: {} blocks, {} frames",
            self.revision,
            self.snapshot.blocks.len(),
            self.snapshot.frames.len()
        );
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.snapshot);
        }
    }
}
