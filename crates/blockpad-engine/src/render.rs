//! Block rendering: payload → rendered tree, and the inverse commit of
//! edited text back into the payload.
//!
//! Text blocks hydrate their markup into decoration wrappers the
//! formatting engine can operate on; embeddable blocks render widget
//! leaves driven by their view state.

use std::collections::HashMap;

use crate::markup;
use crate::model::{Block, BlockId, BlockPayload, Document};
use crate::tools::image::{ImageView, ImageViewState};
use crate::tools::{BlockView, SanitizeRule, ToolKind};
use crate::tree::{NodeId, Tree, Widget};

/// Rebuild the whole tree from the document, in document order.
pub fn render_document(
    tree: &mut Tree,
    doc: &Document,
    views: &HashMap<BlockId, BlockView>,
) {
    let blocks: Vec<NodeId> = tree.children(tree.root()).to_vec();
    for node in blocks {
        tree.remove_subtree(node);
    }
    for block in doc.blocks() {
        render_block(tree, block, views.get(&block.id()));
    }
}

/// Render one block under the root, replacing any previous rendering of the
/// same block (re-render keeps the node position).
pub fn render_block(tree: &mut Tree, block: &Block, view: Option<&BlockView>) -> NodeId {
    let root = tree.root();
    let position = tree
        .find_block(block.id())
        .and_then(|old| {
            let index = tree.index_in_parent(old);
            tree.remove_subtree(old);
            index
        })
        .unwrap_or_else(|| tree.children(root).len());

    let node = tree.new_block(block.id());
    tree.insert_child(root, position, node);

    match &block.payload {
        BlockPayload::Paragraph(data) => render_text(tree, node, &block.payload, &data.text),
        BlockPayload::Header(data) => render_text(tree, node, &block.payload, &data.text),
        BlockPayload::List(data) => {
            let widget = tree.new_widget(Widget::ListBody {
                style: data.style,
                items: data.items.clone(),
            });
            tree.append_child(node, widget);
        }
        BlockPayload::Table(data) => {
            let widget = tree.new_widget(Widget::TableBody {
                rows: data.rows.clone(),
            });
            tree.append_child(node, widget);
        }
        BlockPayload::Image(data) => {
            let state = match view {
                Some(BlockView::Image(view)) => view.state(),
                _ => ImageView::for_data(data).state(),
            };
            let widget = match state {
                ImageViewState::UrlEntry => Widget::UrlInput,
                ImageViewState::Failed => Widget::RetryPrompt,
                ImageViewState::Display => Widget::Image {
                    url: data.url.clone(),
                    width: data.width,
                    height: data.height,
                },
            };
            let widget = tree.new_widget(widget);
            tree.append_child(node, widget);
            if state == ImageViewState::Display {
                let caption = tree.new_widget(Widget::Caption {
                    text: data.caption.clone().unwrap_or_default(),
                });
                tree.append_child(node, caption);
            }
        }
        BlockPayload::Drawing(data) => {
            let widget = tree.new_widget(Widget::Canvas {
                height: data.height,
            });
            tree.append_child(node, widget);
        }
    }
    node
}

fn render_text(tree: &mut Tree, node: NodeId, payload: &BlockPayload, text: &str) {
    let allowed = match ToolKind::for_payload(payload).sanitize_rule() {
        SanitizeRule::Markup(kinds) => kinds,
        SanitizeRule::Fields(_) => &[],
    };
    markup::parse_markup(tree, node, text, allowed);
}

/// Write a text block's rendered content back into its payload. Returns
/// true when the payload changed (and bumps the document version).
pub fn commit_block_text(tree: &Tree, doc: &mut Document, id: BlockId) -> bool {
    let Some(node) = tree.find_block(id) else {
        return false;
    };
    let Some(block) = doc.block_mut(id) else {
        return false;
    };
    if block.payload.text().is_none() {
        return false;
    }

    let text = markup::write_markup(tree, node);
    if block.payload.text() == Some(text.as_str()) {
        return false;
    }
    block.payload.set_text(text);
    doc.touch();
    true
}
