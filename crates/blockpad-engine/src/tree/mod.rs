//! # Rendered tree
//!
//! The live rendered structure the formatting engine performs surgery on.
//! The host's render substrate mirrors this tree; the engine owns it so the
//! wrapper invariants are enforced in one place:
//!
//! - a decoration wrapper of a given kind never nests inside another wrapper
//!   of the same kind, and
//! - no two adjacent wrappers of identical kind+value exist uncombined.
//!
//! ## Structure
//!
//! - The root node has one child element per document block, in document
//!   order.
//! - Text blocks (paragraph, header) contain text runs and decoration
//!   wrappers, arbitrarily nested across *different* kinds.
//! - Embeddable blocks (image, drawing) contain widget leaves; the resize
//!   controller and the tool view-state machines drive those, not the
//!   formatting engine.
//!
//! Nodes live in an arena indexed by [`NodeId`]. Slots are never reused,
//! so a stale id held across a re-render (a host selection, for one) fails
//! closed: `contains` reports false and validity checks reject it, rather
//! than silently aliasing a newer node. Engine-internal use of a freed id
//! is a bug and panics rather than corrupting the tree.

pub mod range;
pub mod surgery;

pub use range::{Caret, SelectionRange};

use crate::format::Decoration;
use crate::model::{BlockId, ListStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Tree root; children are block elements in document order.
    Root,
    /// Block container element.
    Block { block: BlockId },
    /// Inline decoration wrapper.
    Wrapper(Decoration),
    /// Text run.
    Text(String),
    /// Embedded leaf owned by a block tool.
    Widget(Widget),
    /// Transient boundary marker used during range surgery; never present
    /// outside a surgery call.
    Marker,
}

/// Leaf elements of embeddable blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Image in display mode.
    Image {
        url: String,
        width: Option<f64>,
        height: Option<f64>,
    },
    /// URL-entry affordance shown while an image block has no url.
    UrlInput,
    /// Inline retry affordance shown after an image failed to load.
    RetryPrompt,
    /// Editable image caption.
    Caption { text: String },
    /// Drawing canvas surface.
    Canvas { height: f64 },
    /// Non-inline-formattable list body.
    ListBody { style: ListStyle, items: Vec<String> },
    /// Non-inline-formattable table body.
    TableBody { rows: Vec<Vec<String>> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Root,
        };
        Self {
            slots: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.slots.push(Some(Node {
            parent: None,
            children: Vec::new(),
            data,
        }));
        NodeId(self.slots.len() - 1)
    }

    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn new_wrapper(&mut self, decoration: Decoration) -> NodeId {
        self.alloc(NodeData::Wrapper(decoration))
    }

    pub fn new_block(&mut self, block: BlockId) -> NodeId {
        self.alloc(NodeData::Block { block })
    }

    pub fn new_widget(&mut self, widget: Widget) -> NodeId {
        self.alloc(NodeData::Widget(widget))
    }

    pub(crate) fn new_marker(&mut self) -> NodeId {
        self.alloc(NodeData::Marker)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.get(id.0).is_some_and(|slot| slot.is_some())
    }

    fn node(&self, id: NodeId) -> &Node {
        match self.slots.get(id.0).and_then(|slot| slot.as_ref()) {
            Some(node) => node,
            None => panic!("use of freed node id {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.0).and_then(|slot| slot.as_mut()) {
            Some(node) => node,
            None => panic!("use of freed node id {id:?}"),
        }
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.node_mut(id).data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match self.data_mut(id) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn decoration(&self, id: NodeId) -> Option<&Decoration> {
        match self.data(id) {
            NodeData::Wrapper(decoration) => Some(decoration),
            _ => None,
        }
    }

    pub fn decoration_mut(&mut self, id: NodeId) -> Option<&mut Decoration> {
        match self.data_mut(id) {
            NodeData::Wrapper(decoration) => Some(decoration),
            _ => None,
        }
    }

    pub fn is_wrapper(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Wrapper(_))
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Attach a detached node at `index` within `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none(), "child must be detached");
        let index = index.min(self.children(parent).len());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Detach a node from its parent, keeping its subtree alive.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Detach and free a whole subtree.
    pub fn remove_subtree(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            stack.extend(self.children(next).iter().copied());
            self.slots[next.0] = None;
        }
    }

    /// Block element for `block`, if rendered.
    pub fn find_block(&self, block: BlockId) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|&child| matches!(self.data(child), NodeData::Block { block: b } if *b == block))
    }

    /// Nearest enclosing block element of `id` (inclusive).
    pub fn containing_block(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if matches!(self.data(node), NodeData::Block { .. }) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn block_id(&self, node: NodeId) -> Option<BlockId> {
        match self.data(node) {
            NodeData::Block { block } => Some(*block),
            _ => None,
        }
    }

    /// Search upward from `id` for the nearest wrapper of `kind`, stopping
    /// at the block boundary.
    pub fn ancestor_wrapper(
        &self,
        id: NodeId,
        kind: crate::format::DecorationKind,
    ) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.data(node) {
                NodeData::Block { .. } | NodeData::Root => return None,
                NodeData::Wrapper(decoration) if decoration.kind == kind => return Some(node),
                _ => {}
            }
            current = self.parent(node);
        }
        None
    }

    /// Concatenated text of a subtree, in document order.
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let NodeData::Text(text) = self.data(id) {
            out.push_str(text);
        }
        for &child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Text nodes of a subtree in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_text_nodes(id, &mut out);
        out
    }

    fn collect_text_nodes(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if matches!(self.data(id), NodeData::Text(_)) {
            out.push(id);
        }
        for &child in self.children(id) {
            self.collect_text_nodes(child, out);
        }
    }

    /// Byte offset of a caret within its block's concatenated text.
    pub fn text_offset_of(&self, block_node: NodeId, caret: Caret) -> Option<usize> {
        let mut offset = 0;
        for node in self.text_nodes(block_node) {
            if node == caret.node {
                return Some(offset + caret.offset);
            }
            offset += self.text(node).map_or(0, str::len);
        }
        None
    }

    /// Caret at a byte offset within a block's concatenated text. An offset
    /// on a node boundary resolves to the end of the earlier node.
    pub fn caret_at_offset(&self, block_node: NodeId, offset: usize) -> Option<Caret> {
        let nodes = self.text_nodes(block_node);
        let mut remaining = offset;
        let mut last = None;
        for node in nodes {
            let len = self.text(node).map_or(0, str::len);
            if remaining < len || (remaining == len && len > 0) {
                return Some(Caret::new(node, remaining));
            }
            remaining -= len;
            last = Some(node);
        }
        match last {
            Some(node) if remaining == 0 => {
                Some(Caret::new(node, self.text(node).map_or(0, str::len)))
            }
            _ => None,
        }
    }

    /// Child-index path from the root, for document-order comparisons.
    pub(crate) fn path_from_root(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_in_parent(current)?);
            current = parent;
        }
        if current != self.root {
            return None;
        }
        path.reverse();
        Some(path)
    }

    /// Deepest node that is an ancestor-or-self of both arguments.
    pub(crate) fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain = |mut id: NodeId| {
            let mut nodes = vec![id];
            while let Some(parent) = self.parent(id) {
                nodes.push(parent);
                id = parent;
            }
            nodes
        };
        let chain_a = chain(a);
        let chain_b = chain(b);
        let mut result = None;
        for (x, y) in chain_a.iter().rev().zip(chain_b.iter().rev()) {
            if x == y {
                result = Some(*x);
            } else {
                break;
            }
        }
        result
    }
}
