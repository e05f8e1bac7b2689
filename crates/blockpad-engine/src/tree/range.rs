use crate::tree::{NodeData, NodeId, Tree};

/// A caret position: a text node and a byte offset into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

impl Caret {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Anchor/focus pair describing the user's selection in the rendered tree.
///
/// Anchor and focus may be in either document order (the user can select
/// backwards); [`SelectionRange::normalized`] orders them. A range is only
/// meaningful when both ends sit in text nodes of the same block — anything
/// else is malformed and formatting treats it as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub anchor: Caret,
    pub focus: Caret,
}

impl SelectionRange {
    pub fn new(anchor: Caret, focus: Caret) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(at: Caret) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Validate against the tree and return `(start, end)` in document
    /// order. `None` means the range is malformed: a dangling node, a
    /// non-text node, an offset off a char boundary, or ends in different
    /// blocks.
    pub fn normalized(&self, tree: &Tree) -> Option<(Caret, Caret)> {
        let valid = |caret: &Caret| {
            if !tree.contains(caret.node) {
                return false;
            }
            match tree.data(caret.node) {
                NodeData::Text(text) => {
                    caret.offset <= text.len() && text.is_char_boundary(caret.offset)
                }
                _ => false,
            }
        };
        if !valid(&self.anchor) || !valid(&self.focus) {
            return None;
        }

        let block_a = tree.containing_block(self.anchor.node)?;
        let block_b = tree.containing_block(self.focus.node)?;
        if block_a != block_b {
            return None;
        }

        if self.anchor.node == self.focus.node {
            return if self.anchor.offset <= self.focus.offset {
                Some((self.anchor, self.focus))
            } else {
                Some((self.focus, self.anchor))
            };
        }

        let path_a = tree.path_from_root(self.anchor.node)?;
        let path_b = tree.path_from_root(self.focus.node)?;
        if path_a <= path_b {
            Some((self.anchor, self.focus))
        } else {
            Some((self.focus, self.anchor))
        }
    }
}
