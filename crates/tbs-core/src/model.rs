//! Block scene model.
//!
//! The editor owns blocks and frames; this crate only reads them through the
//! [`Workspace`] trait. [`BlockScene`] is the in-memory implementation used
//! by tests, fixtures, and hosts that mirror the editor state into Rust.
//!
//! Blocks form a forest: edges go from parent → child, weighted by the
//! [`Link`] that attaches the child (appended after the parent, or nested
//! inside it). Frames group top-level blocks; nested blocks belong to the
//! frame of their top-level ancestor.

use crate::geometry::Viewport;
use crate::id::ElementId;
use kurbo::Rect;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Elements ────────────────────────────────────────────────────────────

/// Block category tag. Only the container category changes selection rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// C-shaped container ("control"), wraps other blocks in its body.
    Control,
    Named(ElementId),
}

impl Category {
    pub fn parse(s: &str) -> Self {
        match s {
            "control" => Self::Control,
            other => Self::Named(ElementId::intern(other)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Control => "control",
            Self::Named(name) => name.as_str(),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Control)
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// How a block is attached to its parent block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    /// Trailing/continuation connection: appended after the parent in sequence.
    Next,
    /// Nested inside the parent's body or one of its input slots.
    Input,
}

/// A placeable program-structure node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: ElementId,
    pub category: Category,
    /// Shadow blocks are rendered as part of their parent and never selected alone.
    #[serde(default)]
    pub shadow: bool,
    #[serde(default = "default_true")]
    pub selectable: bool,
}

impl Block {
    pub fn new(id: ElementId, category: Category) -> Self {
        Self {
            id,
            category,
            shadow: false,
            selectable: true,
        }
    }

    pub fn is_container(&self) -> bool {
        self.category.is_container()
    }
}

/// A rectangular grouping of top-level blocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: ElementId,
    /// Locked frames are never selectable.
    #[serde(default)]
    pub locked: bool,
}

impl Frame {
    pub fn new(id: ElementId) -> Self {
        Self { id, locked: false }
    }
}

fn default_true() -> bool {
    true
}

// ─── Annotations ─────────────────────────────────────────────────────────

/// Transient display annotation written by the selection engine.
/// Display hints only, never part of ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    /// Block is in the snapshot's block map ("boxed").
    Selected,
    /// Block is highlighted but represented by its selected frame.
    HighlightOnly,
    /// Frame is in the snapshot's frame map.
    FrameHighlight,
}

/// One annotation update: `mark: None` clears the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkChange {
    pub id: ElementId,
    pub mark: Option<Mark>,
}

// ─── Workspace queries ───────────────────────────────────────────────────

/// Read-only queries against the editor's scene graph.
///
/// Every query is expected to be O(1) or O(element count). Unknown ids
/// answer `None` / empty instead of failing.
pub trait Workspace {
    /// All blocks on the canvas, in scene order.
    fn block_ids(&self) -> Vec<ElementId>;

    /// All top-level frames on the canvas.
    fn frame_ids(&self) -> Vec<ElementId>;

    fn block(&self, id: ElementId) -> Option<Block>;

    fn frame(&self, id: ElementId) -> Option<Frame>;

    /// Block bounds in canvas units, or `None` while the block is not rendered.
    fn block_bounds(&self, id: ElementId) -> Option<Rect>;

    /// Frame bounds in canvas units.
    fn frame_bounds(&self, id: ElementId) -> Option<Rect>;

    /// The enclosing block and the link that attaches `id` to it.
    fn parent(&self, id: ElementId) -> Option<(ElementId, Link)>;

    /// Direct child blocks with their links, in connection order.
    fn children(&self, id: ElementId) -> SmallVec<[(ElementId, Link); 4]>;

    /// Frame membership test for a top-level block.
    fn frame_of(&self, top_level: ElementId) -> Option<ElementId>;

    fn viewport(&self) -> Viewport;

    /// Editor-wide read-only mode.
    fn is_locked(&self) -> bool;
}

// ─── Block Scene ─────────────────────────────────────────────────────────

/// In-memory [`Workspace`]: a forest of blocks plus frames.
#[derive(Debug, Clone, Default)]
pub struct BlockScene {
    /// Parent → child edges weighted by the attaching [`Link`].
    pub graph: StableDiGraph<Block, Link>,

    /// Index from ElementId → NodeIndex for fast lookup.
    pub id_index: HashMap<ElementId, NodeIndex>,

    /// Block bounds in canvas units. Missing = not rendered yet.
    pub bounds: HashMap<ElementId, Rect>,

    /// Top-level frames in creation order.
    pub frames: Vec<Frame>,

    pub frame_bounds: HashMap<ElementId, Rect>,

    /// Top-level block → frame that contains it.
    pub membership: HashMap<ElementId, ElementId>,

    pub viewport: Viewport,

    pub locked: bool,
}

impl BlockScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block, optionally attached to `parent` via `link`.
    /// Returns `None` when the parent is unknown.
    pub fn add_block(
        &mut self,
        block: Block,
        parent: Option<(ElementId, Link)>,
        bounds: Option<Rect>,
    ) -> Option<NodeIndex> {
        let parent_idx = match parent {
            Some((pid, _)) => Some(self.index_of(pid)?),
            None => None,
        };
        let id = block.id;
        let idx = self.graph.add_node(block);
        if let (Some(pidx), Some((_, link))) = (parent_idx, parent) {
            self.graph.add_edge(pidx, idx, link);
        }
        self.id_index.insert(id, idx);
        if let Some(b) = bounds {
            self.bounds.insert(id, b);
        }
        Some(idx)
    }

    /// Remove a block and everything nested under it.
    pub fn remove_block(&mut self, id: ElementId) -> Vec<Block> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut stack = vec![idx];
        let mut removed = Vec::new();
        while let Some(cur) = stack.pop() {
            stack.extend(
                self.graph
                    .neighbors_directed(cur, petgraph::Direction::Outgoing),
            );
            if let Some(block) = self.graph.remove_node(cur) {
                self.id_index.remove(&block.id);
                self.bounds.remove(&block.id);
                self.membership.remove(&block.id);
                removed.push(block);
            }
        }
        removed
    }

    pub fn add_frame(&mut self, frame: Frame, bounds: Option<Rect>) {
        if let Some(b) = bounds {
            self.frame_bounds.insert(frame.id, b);
        }
        self.frames.retain(|f| f.id != frame.id);
        self.frames.push(frame);
    }

    /// Place a top-level block inside a frame. Nested blocks are refused:
    /// they follow their top-level ancestor.
    pub fn place_in_frame(&mut self, block: ElementId, frame: ElementId) -> bool {
        if self.index_of(block).is_none()
            || self.parent(block).is_some()
            || !self.frames.iter().any(|f| f.id == frame)
        {
            return false;
        }
        self.membership.insert(block, frame);
        true
    }

    pub fn set_bounds(&mut self, id: ElementId, bounds: Option<Rect>) {
        match bounds {
            Some(b) => self.bounds.insert(id, b),
            None => self.bounds.remove(&id),
        };
    }

    pub fn index_of(&self, id: ElementId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn get_frame_mut(&mut self, id: ElementId) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id == id)
    }
}

impl Workspace for BlockScene {
    fn block_ids(&self) -> Vec<ElementId> {
        // Sort by NodeIndex so scene order matches insertion order on every target.
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort();
        indices.into_iter().map(|idx| self.graph[idx].id).collect()
    }

    fn frame_ids(&self) -> Vec<ElementId> {
        self.frames.iter().map(|f| f.id).collect()
    }

    fn block(&self, id: ElementId) -> Option<Block> {
        self.index_of(id).map(|idx| self.graph[idx])
    }

    fn frame(&self, id: ElementId) -> Option<Frame> {
        self.frames.iter().find(|f| f.id == id).copied()
    }

    fn block_bounds(&self, id: ElementId) -> Option<Rect> {
        self.bounds.get(&id).copied()
    }

    fn frame_bounds(&self, id: ElementId) -> Option<Rect> {
        self.frame_bounds.get(&id).copied()
    }

    fn parent(&self, id: ElementId) -> Option<(ElementId, Link)> {
        let idx = self.index_of(id)?;
        let edge = self
            .graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .next()?;
        Some((self.graph[edge.source()].id, *edge.weight()))
    }

    fn children(&self, id: ElementId) -> SmallVec<[(ElementId, Link); 4]> {
        let Some(idx) = self.index_of(id) else {
            return SmallVec::new();
        };
        let mut children: SmallVec<[(NodeIndex, Link); 4]> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .map(|e| (e.target(), *e.weight()))
            .collect();
        children.sort_by_key(|(child, _)| *child);
        children
            .into_iter()
            .map(|(child, link)| (self.graph[child].id, link))
            .collect()
    }

    fn frame_of(&self, top_level: ElementId) -> Option<ElementId> {
        self.membership.get(&top_level).copied()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn is_locked(&self) -> bool {
        self.locked
    }
}

// ─── JSON scene description ──────────────────────────────────────────────

/// Serialized form of a [`BlockScene`], used for fixtures and host mirroring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDoc {
    pub viewport: Viewport,
    pub locked: bool,
    pub blocks: Vec<BlockDoc>,
    pub frames: Vec<FrameDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDoc {
    #[serde(flatten)]
    pub block: Block,
    /// `[x, y, width, height]` in canvas units; absent = not rendered.
    #[serde(default)]
    pub rect: Option<[f64; 4]>,
    #[serde(default)]
    pub parent: Option<ElementId>,
    #[serde(default = "default_link")]
    pub link: Link,
    #[serde(default)]
    pub frame: Option<ElementId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDoc {
    #[serde(flatten)]
    pub frame: Frame,
    pub rect: [f64; 4],
}

fn default_link() -> Link {
    Link::Next
}

fn to_rect([x, y, w, h]: [f64; 4]) -> Rect {
    Rect::from_origin_size((x, y), (w, h))
}

impl BlockScene {
    /// Build a scene from a JSON description.
    ///
    /// Blocks must be listed after their parent; frames are added first so
    /// blocks can reference them.
    ///
    /// # Errors
    ///
    /// Returns a message when the JSON is malformed or references an
    /// unknown parent or frame.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let doc: SceneDoc =
            serde_json::from_str(json).map_err(|e| format!("Error parsing scene: {e}"))?;
        Self::from_doc(doc)
    }

    /// # Errors
    ///
    /// Returns a message on an unknown parent or frame reference.
    pub fn from_doc(doc: SceneDoc) -> Result<Self, String> {
        let mut scene = Self {
            viewport: doc.viewport,
            locked: doc.locked,
            ..Self::default()
        };
        for f in doc.frames {
            scene.add_frame(f.frame, Some(to_rect(f.rect)));
        }
        for b in doc.blocks {
            let id = b.block.id;
            let parent = b.parent.map(|p| (p, b.link));
            scene
                .add_block(b.block, parent, b.rect.map(to_rect))
                .ok_or_else(|| format!("Block \"{id}\" references an unknown parent"))?;
            if let Some(frame) = b.frame
                && !scene.place_in_frame(id, frame)
            {
                return Err(format!(
                    "Block \"{id}\" cannot be placed in frame \"{frame}\""
                ));
            }
        }
        log::debug!(
            "scene loaded: {} blocks, {} frames",
            scene.id_index.len(),
            scene.frames.len()
        );
        Ok(scene)
    }
}
