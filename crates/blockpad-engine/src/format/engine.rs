//! The inline formatting engine: toggle/inspect decorations over a
//! selection.
//!
//! Every entry point is total — malformed input is a silent no-op, never a
//! panic or an error the host has to handle. Formatting must not corrupt
//! the tree, so anything the engine cannot interpret it refuses to touch.

use crate::format::{Decoration, DecorationKind, DecorationValue};
use crate::model::Document;
use crate::tree::surgery::{self, SurgeryError};
use crate::tree::{Caret, NodeId, SelectionRange, Tree};

/// Result of [`check_state`]: whether the nearest ancestor of the kind
/// exists, and its current value for valued kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckState {
    pub active: bool,
    pub value: Option<DecorationValue>,
}

impl CheckState {
    const INACTIVE: CheckState = CheckState {
        active: false,
        value: None,
    };
}

/// Apply or toggle `kind` over the selection.
///
/// - Valueless kinds (bold, italic): an existing ancestor wrapper is
///   unwrapped; otherwise the selection is extracted, wrapped, and the
///   returned selection covers the new wrapper so an immediate re-toggle
///   acts on it.
/// - Valued kinds (color, background): an existing ancestor has its value
///   overwritten in place when a value is supplied, and is unwrapped when
///   none is; with no ancestor, a supplied value wraps the selection.
/// - Block-scoped kinds (alignment, text style) ignore the selection's
///   extent and write to the caret's block payload.
///
/// The returned selection replaces the caller's active selection. On any
/// no-op it is the input selection unchanged.
pub fn apply_or_toggle(
    tree: &mut Tree,
    doc: &mut Document,
    sel: &SelectionRange,
    kind: DecorationKind,
    value: Option<DecorationValue>,
) -> SelectionRange {
    if kind.is_block_scoped() {
        apply_block_scoped(tree, doc, sel, kind, value);
        return *sel;
    }

    let Some((start, _)) = sel.normalized(tree) else {
        return *sel;
    };
    if sel.is_collapsed() {
        // Selection-dependent kinds need a run of text to act on.
        return *sel;
    }

    match tree.ancestor_wrapper(start.node, kind) {
        Some(wrapper) => {
            if kind.takes_value() && value.is_some() {
                if let Some(decoration) = tree.decoration_mut(wrapper) {
                    decoration.value = value;
                }
                *sel
            } else {
                remove_wrapper(tree, wrapper).unwrap_or(*sel)
            }
        }
        None => {
            if kind.takes_value() && value.is_none() {
                // Nothing to remove and nothing to apply.
                return *sel;
            }
            wrap_selection(tree, sel, Decoration { kind, value }).unwrap_or(*sel)
        }
    }
}

/// Unwrap a decoration wrapper and return a selection covering the text run
/// it used to contain.
fn remove_wrapper(tree: &mut Tree, wrapper: NodeId) -> Result<SelectionRange, SurgeryError> {
    let block_node = tree
        .containing_block(wrapper)
        .ok_or(SurgeryError::InvalidRange)?;
    let span = tree
        .text_nodes(wrapper)
        .first()
        .and_then(|&first| tree.text_offset_of(block_node, Caret::new(first, 0)))
        .map(|start| (start, tree.subtree_text(wrapper).len()));

    let parent = surgery::unwrap_wrapper(tree, wrapper)?;
    surgery::merge_adjacent(tree, parent, None);

    let selection = span.and_then(|(start, len)| {
        let from = tree.caret_at_offset(block_node, start)?;
        let to = tree.caret_at_offset(block_node, start + len)?;
        Some(SelectionRange::new(from, to))
    });
    selection.ok_or(SurgeryError::InvalidRange)
}

/// Extract the selection, wrap it, reinsert, and return a selection
/// covering the (possibly merged) wrapper.
fn wrap_selection(
    tree: &mut Tree,
    sel: &SelectionRange,
    decoration: Decoration,
) -> Result<SelectionRange, SurgeryError> {
    let kind = decoration.kind;
    let extraction = surgery::extract_range(tree, sel)?;

    let wrapper = tree.new_wrapper(decoration);
    for root in extraction.roots {
        tree.append_child(wrapper, root);
    }
    // A same-kind wrapper fully inside the selection is not an ancestor of
    // the caret, so it survives extraction; flatten it before inserting.
    surgery::strip_kind(tree, wrapper, kind);
    surgery::merge_adjacent(tree, wrapper, None);

    tree.insert_child(extraction.at.parent, extraction.at.index, wrapper);
    let wrapper = surgery::merge_adjacent(tree, extraction.at.parent, Some(wrapper))
        .unwrap_or(wrapper);

    let texts = tree.text_nodes(wrapper);
    match (texts.first(), texts.last()) {
        (Some(&first), Some(&last)) => {
            let end = tree.text(last).map_or(0, str::len);
            Ok(SelectionRange::new(
                Caret::new(first, 0),
                Caret::new(last, end),
            ))
        }
        _ => Err(SurgeryError::InvalidRange),
    }
}

fn apply_block_scoped(
    tree: &Tree,
    doc: &mut Document,
    sel: &SelectionRange,
    kind: DecorationKind,
    value: Option<DecorationValue>,
) {
    if !tree.contains(sel.anchor.node) {
        return;
    }
    let Some(block_node) = tree.containing_block(sel.anchor.node) else {
        return;
    };
    let Some(block_id) = tree.block_id(block_node) else {
        return;
    };
    let Some(block) = doc.block_mut(block_id) else {
        return;
    };

    let changed = match (kind, value) {
        (DecorationKind::Alignment, Some(DecorationValue::Alignment(alignment))) => {
            block.payload.set_alignment(Some(alignment))
        }
        (DecorationKind::Alignment, None) => block.payload.set_alignment(None),
        (DecorationKind::TextStyle, Some(DecorationValue::Style(style))) => {
            block.payload.set_text_style(Some(style))
        }
        (DecorationKind::TextStyle, None) => block.payload.set_text_style(None),
        // Mismatched value variant: refuse rather than guess.
        _ => false,
    };
    if changed {
        doc.touch();
    }
}

/// Report whether `kind` is active at a caret, and its current value.
///
/// Wrapper color values are canonical hex by construction (host-reported
/// forms are normalized through [`crate::format::HexColor`] on the way in),
/// so picker state stays consistent.
pub fn check_state(tree: &Tree, doc: &Document, at: Caret, kind: DecorationKind) -> CheckState {
    if !tree.contains(at.node) {
        return CheckState::INACTIVE;
    }

    if kind.is_block_scoped() {
        let state = tree
            .containing_block(at.node)
            .and_then(|node| tree.block_id(node))
            .and_then(|id| doc.block(id))
            .map(|block| match kind {
                DecorationKind::Alignment => {
                    block.payload.alignment().map(DecorationValue::Alignment)
                }
                _ => block.payload.text_style().map(DecorationValue::Style),
            });
        return match state {
            Some(value) => CheckState {
                active: value.is_some(),
                value,
            },
            None => CheckState::INACTIVE,
        };
    }

    match tree.ancestor_wrapper(at.node, kind) {
        Some(wrapper) => CheckState {
            active: true,
            value: tree.decoration(wrapper).and_then(|d| d.value),
        },
        None => CheckState::INACTIVE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HexColor;
    use crate::model::{Alignment, Block, BlockPayload, ParagraphData};
    use crate::tree::NodeData;
    use pretty_assertions::assert_eq;

    struct Fixture {
        tree: Tree,
        doc: Document,
        block_node: NodeId,
        text: NodeId,
    }

    fn fixture(text: &str) -> Fixture {
        let mut doc = Document::new();
        let id = doc
            .push(Block::new(BlockPayload::Paragraph(ParagraphData::new(text))))
            .unwrap();
        let mut tree = Tree::new();
        let block_node = tree.new_block(id);
        let root = tree.root();
        tree.append_child(root, block_node);
        let text = tree.new_text(text);
        tree.append_child(block_node, text);
        Fixture {
            tree,
            doc,
            block_node,
            text,
        }
    }

    fn select(f: &Fixture, start: usize, end: usize) -> SelectionRange {
        SelectionRange::new(Caret::new(f.text, start), Caret::new(f.text, end))
    }

    #[test]
    fn test_double_toggle_restores_tree_exactly() {
        let mut f = fixture("Hello World");
        let sel = select(&f, 0, 5);

        let sel = apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Bold, None);
        assert!(f.tree.is_wrapper(f.tree.children(f.block_node)[0]));

        apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Bold, None);

        // Back to a single undecorated text run with identical content
        let children = f.tree.children(f.block_node).to_vec();
        assert_eq!(children.len(), 1);
        assert_eq!(f.tree.text(children[0]), Some("Hello World"));
    }

    #[test]
    fn test_wrap_covers_exactly_the_selection() {
        let mut f = fixture("Hello World");
        let sel = select(&f, 0, 5);

        apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Bold, None);

        let children = f.tree.children(f.block_node).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(f.tree.subtree_text(children[0]), "Hello");
        assert!(f.tree.is_wrapper(children[0]));
        assert_eq!(f.tree.text(children[1]), Some(" World"));
    }

    #[test]
    fn test_collapsed_selection_is_a_noop_for_inline_kinds() {
        let mut f = fixture("Hello");
        let sel = SelectionRange::caret(Caret::new(f.text, 2));
        let before = f.tree.clone();

        let result = apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Bold, None);

        assert_eq!(result, sel);
        assert_eq!(f.tree, before);
    }

    #[test]
    fn test_malformed_range_is_a_noop() {
        let mut f = fixture("Hello");
        // Offset past the end of the text
        let sel = select(&f, 0, 99);
        let before = f.tree.clone();

        apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Bold, None);
        assert_eq!(f.tree, before);
    }

    #[test]
    fn test_color_overwrites_value_in_place() {
        let mut f = fixture("Hello World");
        let sel = select(&f, 0, 5);
        let red = DecorationValue::Color(HexColor::parse("#ff0000").unwrap());
        let blue = DecorationValue::Color(HexColor::parse("#0000ff").unwrap());

        let sel = apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Color, Some(red));
        let wrapper_count = |tree: &Tree, block: NodeId| {
            tree.children(block)
                .iter()
                .filter(|&&c| tree.is_wrapper(c))
                .count()
        };
        assert_eq!(wrapper_count(&f.tree, f.block_node), 1);

        // Re-applying with a new value mutates the existing wrapper
        apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Color, Some(blue));
        assert_eq!(wrapper_count(&f.tree, f.block_node), 1);

        let state = check_state(&f.tree, &f.doc, sel.anchor, DecorationKind::Color);
        assert!(state.active);
        assert_eq!(state.value, Some(blue));
    }

    #[test]
    fn test_color_with_no_value_unwraps() {
        let mut f = fixture("Hello World");
        let sel = select(&f, 0, 5);
        let red = DecorationValue::Color(HexColor::parse("#ff0000").unwrap());

        let sel = apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Color, Some(red));
        apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Color, None);

        let children = f.tree.children(f.block_node).to_vec();
        assert_eq!(children.len(), 1);
        assert_eq!(f.tree.text(children[0]), Some("Hello World"));
    }

    #[test]
    fn test_removing_outer_kind_leaves_inner_kind_intact() {
        // Bold "Hello World", then background "World" inside it, then
        // remove bold: the background wrapper and its value survive.
        let mut f = fixture("Hello World");
        let all = select(&f, 0, 11);
        apply_or_toggle(&mut f.tree, &mut f.doc, &all, DecorationKind::Bold, None);

        let yellow = DecorationValue::Color(HexColor::parse("#ffff00").unwrap());
        let bold_text = f.tree.text_nodes(f.tree.children(f.block_node)[0]);
        let world = SelectionRange::new(
            Caret::new(bold_text[0], 6),
            Caret::new(bold_text[0], 11),
        );
        apply_or_toggle(
            &mut f.tree,
            &mut f.doc,
            &world,
            DecorationKind::Background,
            Some(yellow),
        );

        // The background application split the bold text run, so re-derive
        // a selection inside the bold wrapper (as a host would) to toggle
        // bold off.
        let bold_wrapper = f.tree.children(f.block_node)[0];
        let first_text = f.tree.text_nodes(bold_wrapper)[0];
        let in_bold = SelectionRange::new(Caret::new(first_text, 0), Caret::new(first_text, 3));
        apply_or_toggle(&mut f.tree, &mut f.doc, &in_bold, DecorationKind::Bold, None);

        // No bold remains; exactly one background wrapper around "World"
        let children = f.tree.children(f.block_node).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(f.tree.text(children[0]), Some("Hello "));
        let background = children[1];
        assert_eq!(
            f.tree.decoration(background).map(|d| d.kind),
            Some(DecorationKind::Background)
        );
        assert_eq!(f.tree.subtree_text(background), "World");
        assert_eq!(
            f.tree.decoration(background).and_then(|d| d.value),
            Some(yellow)
        );
    }

    #[test]
    fn test_adjacent_equal_wrappers_are_merged() {
        let mut f = fixture("Hello World");
        let first = select(&f, 0, 5);
        apply_or_toggle(&mut f.tree, &mut f.doc, &first, DecorationKind::Bold, None);

        // Select " World" in the trailing text node and bold it too
        let tail = f.tree.children(f.block_node)[1];
        let rest = SelectionRange::new(Caret::new(tail, 0), Caret::new(tail, 6));
        apply_or_toggle(&mut f.tree, &mut f.doc, &rest, DecorationKind::Bold, None);

        let children = f.tree.children(f.block_node).to_vec();
        assert_eq!(children.len(), 1);
        assert!(f.tree.is_wrapper(children[0]));
        assert_eq!(f.tree.subtree_text(children[0]), "Hello World");
    }

    #[test]
    fn test_wrapping_over_embedded_same_kind_flattens() {
        let mut f = fixture("Hello World");
        let middle = select(&f, 3, 7);
        apply_or_toggle(&mut f.tree, &mut f.doc, &middle, DecorationKind::Bold, None);

        // Select everything: the caret ancestors have no bold, but a bold
        // wrapper sits inside the range.
        let texts = f.tree.text_nodes(f.block_node);
        let sel = SelectionRange::new(
            Caret::new(texts[0], 0),
            Caret::new(*texts.last().unwrap(), f.tree.text(*texts.last().unwrap()).unwrap().len()),
        );
        apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Bold, None);

        // One bold wrapper, no nesting of the same kind inside it
        let children = f.tree.children(f.block_node).to_vec();
        assert_eq!(children.len(), 1);
        let wrapper = children[0];
        assert_eq!(f.tree.subtree_text(wrapper), "Hello World");
        let mut stack = f.tree.children(wrapper).to_vec();
        while let Some(node) = stack.pop() {
            assert!(
                f.tree.decoration(node).is_none_or(|d| d.kind != DecorationKind::Bold),
                "nested bold wrapper survived"
            );
            stack.extend(f.tree.children(node).iter().copied());
        }
    }

    #[test]
    fn test_alignment_targets_block_and_ignores_extent() {
        let mut f = fixture("Hello World");
        // Even a collapsed caret applies alignment
        let caret = SelectionRange::caret(Caret::new(f.text, 3));

        apply_or_toggle(
            &mut f.tree,
            &mut f.doc,
            &caret,
            DecorationKind::Alignment,
            Some(DecorationValue::Alignment(Alignment::Center)),
        );

        let block = &f.doc.blocks()[0];
        assert_eq!(block.payload.alignment(), Some(Alignment::Center));

        let state = check_state(&f.tree, &f.doc, caret.anchor, DecorationKind::Alignment);
        assert!(state.active);
        assert_eq!(
            state.value,
            Some(DecorationValue::Alignment(Alignment::Center))
        );
    }

    #[test]
    fn test_check_state_inactive_outside_wrapper() {
        let f = fixture("Hello");
        let state = check_state(&f.tree, &f.doc, Caret::new(f.text, 2), DecorationKind::Bold);
        assert!(!state.active);
        assert_eq!(state.value, None);
    }

    #[test]
    fn test_unwrap_never_deletes_non_decoration_siblings() {
        let mut f = fixture("AB");
        // Put a widget sibling next to the text inside the block
        let widget = f
            .tree
            .new_widget(crate::tree::Widget::Caption { text: "cap".into() });
        f.tree.append_child(f.block_node, widget);

        let sel = select(&f, 0, 2);
        let sel = apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Bold, None);
        apply_or_toggle(&mut f.tree, &mut f.doc, &sel, DecorationKind::Bold, None);

        let children = f.tree.children(f.block_node).to_vec();
        assert_eq!(children.len(), 2);
        assert!(matches!(f.tree.data(children[1]), NodeData::Widget(_)));
    }
}
