//! Non-destructive range surgery on the rendered tree.
//!
//! The formatting engine needs three structural operations, all of which
//! must preserve every sibling they do not own:
//!
//! - **extract**: lift a selection out of the tree as whole subtrees,
//!   splitting text nodes and partially-covered wrappers at the boundaries
//!   (a wrapper split clones the wrapper, so decoration state outside the
//!   range is untouched);
//! - **unwrap**: replace a wrapper with its children, in place;
//! - **merge**: re-combine adjacent text runs and adjacent wrappers of
//!   identical kind+value after an insertion or unwrap.
//!
//! Extraction works with transient marker nodes: a marker is inserted at
//! each boundary, lifted to the common ancestor by splitting the wrappers it
//! crosses, and the nodes strictly between the markers become the extracted
//! roots. Markers never survive a call.

use thiserror::Error;

use crate::format::DecorationKind;
use crate::tree::{NodeId, SelectionRange, Tree};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurgeryError {
    #[error("range is malformed, collapsed, or crosses a block boundary")]
    InvalidRange,
}

/// A cut point between two children of `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub parent: NodeId,
    pub index: usize,
}

/// Result of [`extract_range`]: detached subtree roots in document order,
/// plus the boundary where they came out.
#[derive(Debug)]
pub struct Extraction {
    pub roots: Vec<NodeId>,
    pub at: Boundary,
}

enum Side {
    Start,
    End,
}

/// Extract the selected content as detached subtrees.
pub fn extract_range(tree: &mut Tree, sel: &SelectionRange) -> Result<Extraction, SurgeryError> {
    let (start, end) = sel.normalized(tree).ok_or(SurgeryError::InvalidRange)?;
    if start == end {
        return Err(SurgeryError::InvalidRange);
    }

    // End marker first: splitting at the end offset leaves the start
    // caret's node and offset valid when both fall in the same text node.
    let end_marker = insert_marker(tree, end.node, end.offset)?;
    let start_marker = insert_marker(tree, start.node, start.offset)?;

    let parent_start = tree.parent(start_marker).ok_or(SurgeryError::InvalidRange)?;
    let parent_end = tree.parent(end_marker).ok_or(SurgeryError::InvalidRange)?;
    let ancestor = tree
        .common_ancestor(parent_start, parent_end)
        .ok_or(SurgeryError::InvalidRange)?;

    lift_marker(tree, start_marker, ancestor, Side::Start)?;
    lift_marker(tree, end_marker, ancestor, Side::End)?;

    let children = tree.children(ancestor);
    let start_index = children
        .iter()
        .position(|&c| c == start_marker)
        .ok_or(SurgeryError::InvalidRange)?;
    let end_index = children
        .iter()
        .position(|&c| c == end_marker)
        .ok_or(SurgeryError::InvalidRange)?;
    let roots: Vec<NodeId> = children[start_index + 1..end_index].to_vec();

    tree.remove_subtree(start_marker);
    tree.remove_subtree(end_marker);

    if roots.is_empty() {
        // Nothing between the boundaries; undo any text splits and bail.
        merge_adjacent(tree, ancestor, None);
        return Err(SurgeryError::InvalidRange);
    }

    for &root in &roots {
        tree.detach(root);
    }

    Ok(Extraction {
        roots,
        at: Boundary {
            parent: ancestor,
            index: start_index,
        },
    })
}

/// Insert a boundary marker at a caret, splitting the text node when the
/// offset falls strictly inside it.
fn insert_marker(tree: &mut Tree, node: NodeId, offset: usize) -> Result<NodeId, SurgeryError> {
    let parent = tree.parent(node).ok_or(SurgeryError::InvalidRange)?;
    let index = tree.index_in_parent(node).ok_or(SurgeryError::InvalidRange)?;
    let len = tree.text(node).ok_or(SurgeryError::InvalidRange)?.len();

    let marker = tree.new_marker();
    if offset == 0 {
        tree.insert_child(parent, index, marker);
    } else if offset == len {
        tree.insert_child(parent, index + 1, marker);
    } else {
        let tail = match tree.text_mut(node) {
            Some(text) => text.split_off(offset),
            None => return Err(SurgeryError::InvalidRange),
        };
        let tail_node = tree.new_text(tail);
        tree.insert_child(parent, index + 1, tail_node);
        tree.insert_child(parent, index + 1, marker);
    }
    Ok(marker)
}

/// Move a marker up until it is a direct child of `ancestor`, splitting each
/// wrapper it crosses. The selected side of every split stays adjacent to
/// the marker; the outside part keeps the original wrapper node so
/// decoration identity outside the range is preserved.
fn lift_marker(
    tree: &mut Tree,
    marker: NodeId,
    ancestor: NodeId,
    side: Side,
) -> Result<(), SurgeryError> {
    loop {
        let parent = tree.parent(marker).ok_or(SurgeryError::InvalidRange)?;
        if parent == ancestor {
            return Ok(());
        }
        // Only wrappers may sit between a text run and its block.
        let decoration = tree
            .decoration(parent)
            .cloned()
            .ok_or(SurgeryError::InvalidRange)?;
        let grandparent = tree.parent(parent).ok_or(SurgeryError::InvalidRange)?;
        let marker_index = tree.index_in_parent(marker).ok_or(SurgeryError::InvalidRange)?;

        let siblings = tree.children(parent).to_vec();
        let moved: Vec<NodeId> = match side {
            Side::Start => siblings[marker_index + 1..].to_vec(),
            Side::End => siblings[..marker_index].to_vec(),
        };

        tree.detach(marker);
        let parent_index = tree.index_in_parent(parent).ok_or(SurgeryError::InvalidRange)?;

        match side {
            Side::Start => {
                // [parent(kept), marker, clone(moved)]
                if !moved.is_empty() {
                    let clone = tree.new_wrapper(decoration);
                    for node in moved {
                        tree.detach(node);
                        tree.append_child(clone, node);
                    }
                    tree.insert_child(grandparent, parent_index + 1, clone);
                }
                tree.insert_child(grandparent, parent_index + 1, marker);
            }
            Side::End => {
                // [clone(moved), marker, parent(kept)]
                let mut at = parent_index;
                if !moved.is_empty() {
                    let clone = tree.new_wrapper(decoration);
                    for node in moved {
                        tree.detach(node);
                        tree.append_child(clone, node);
                    }
                    tree.insert_child(grandparent, at, clone);
                    at += 1;
                }
                tree.insert_child(grandparent, at, marker);
            }
        }

        if tree.children(parent).is_empty() {
            tree.remove_subtree(parent);
        }
    }
}

/// Replace a wrapper with its children at its former position. Returns the
/// wrapper's parent so the caller can run a merge pass there.
pub fn unwrap_wrapper(tree: &mut Tree, wrapper: NodeId) -> Result<NodeId, SurgeryError> {
    if !tree.is_wrapper(wrapper) {
        return Err(SurgeryError::InvalidRange);
    }
    let parent = tree.parent(wrapper).ok_or(SurgeryError::InvalidRange)?;
    let index = tree.index_in_parent(wrapper).ok_or(SurgeryError::InvalidRange)?;

    let children = tree.children(wrapper).to_vec();
    for (offset, child) in children.into_iter().enumerate() {
        tree.detach(child);
        tree.insert_child(parent, index + offset, child);
    }
    tree.remove_subtree(wrapper);
    Ok(parent)
}

/// Unwrap every descendant wrapper of `kind` inside `root` (exclusive), so
/// that wrapping `root` itself never produces same-kind nesting.
pub fn strip_kind(tree: &mut Tree, root: NodeId, kind: DecorationKind) {
    loop {
        let Some(found) = find_wrapper_of_kind(tree, root, kind) else {
            return;
        };
        if unwrap_wrapper(tree, found).is_err() {
            return;
        }
    }
}

fn find_wrapper_of_kind(tree: &Tree, root: NodeId, kind: DecorationKind) -> Option<NodeId> {
    let mut stack: Vec<NodeId> = tree.children(root).to_vec();
    while let Some(node) = stack.pop() {
        if tree.decoration(node).is_some_and(|d| d.kind == kind) {
            return Some(node);
        }
        stack.extend(tree.children(node).iter().copied());
    }
    None
}

/// Coalesce adjacent text runs and adjacent wrappers of identical
/// decoration among `parent`'s children. `track` follows a node of interest
/// through merges and the surviving equivalent is returned.
pub fn merge_adjacent(tree: &mut Tree, parent: NodeId, mut track: Option<NodeId>) -> Option<NodeId> {
    let mut i = 0;
    while i + 1 < tree.children(parent).len() {
        let a = tree.children(parent)[i];
        let b = tree.children(parent)[i + 1];

        let both_text = tree.text(a).is_some() && tree.text(b).is_some();
        let same_decoration = match (tree.decoration(a), tree.decoration(b)) {
            (Some(da), Some(db)) => da == db,
            _ => false,
        };

        if both_text {
            let tail = tree.text(b).map(str::to_owned).unwrap_or_default();
            if let Some(text) = tree.text_mut(a) {
                text.push_str(&tail);
            }
            if track == Some(b) {
                track = Some(a);
            }
            tree.remove_subtree(b);
        } else if same_decoration {
            let moved = tree.children(b).to_vec();
            for child in moved {
                tree.detach(child);
                tree.append_child(a, child);
            }
            if track == Some(b) {
                track = Some(a);
            }
            tree.remove_subtree(b);
            // The junction inside the combined wrapper may itself need
            // merging (text meeting text, wrapper meeting wrapper).
            track = merge_adjacent(tree, a, track);
        } else {
            i += 1;
        }
    }
    track
}
