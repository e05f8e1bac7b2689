//! # Inline markup
//!
//! Block payloads persist their decorated text as a closed markup
//! vocabulary:
//!
//! | decoration  | form                          |
//! |-------------|-------------------------------|
//! | bold        | `<b>…</b>`                    |
//! | italic      | `<i>…</i>`                    |
//! | text color  | `<color #rrggbb>…</color>`    |
//! | background  | `<bg #rrggbb>…</bg>`          |
//!
//! Text content is entity-escaped (`&lt;` and friends). Parsing is the
//! sanitize step: tags outside a block's allowed set, unknown tags,
//! mis-nested or unclosed tags, and invalid color values all degrade to
//! literal text — malformed input can produce odd text, never a broken
//! tree. For well-formed markup, `write(parse(t)) == t`.

use crate::format::{Decoration, DecorationKind, DecorationValue, HexColor};
use crate::tree::{NodeData, NodeId, Tree};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Open {
        kind: DecorationKind,
        value: Option<DecorationValue>,
        raw: String,
    },
    Close {
        kind: DecorationKind,
        raw: String,
    },
}

/// Serialize the children of `node` to markup.
pub fn write_markup(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    for &child in tree.children(node) {
        write_node(tree, child, &mut out);
    }
    out
}

fn write_node(tree: &Tree, node: NodeId, out: &mut String) {
    match tree.data(node) {
        NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
        NodeData::Wrapper(decoration) => match tag_for(decoration) {
            Some((open, close)) => {
                out.push_str(&open);
                for &child in tree.children(node) {
                    write_node(tree, child, out);
                }
                out.push_str(close);
            }
            // A wrapper with no writable form contributes its text only.
            None => {
                for &child in tree.children(node) {
                    write_node(tree, child, out);
                }
            }
        },
        // Widgets and nested blocks have no inline-markup form.
        _ => {}
    }
}

fn tag_for(decoration: &Decoration) -> Option<(String, &'static str)> {
    match (decoration.kind, decoration.value) {
        (DecorationKind::Bold, _) => Some(("<b>".to_string(), "</b>")),
        (DecorationKind::Italic, _) => Some(("<i>".to_string(), "</i>")),
        (DecorationKind::Color, Some(DecorationValue::Color(c))) => {
            Some((format!("<color {c}>"), "</color>"))
        }
        (DecorationKind::Background, Some(DecorationValue::Color(c))) => {
            Some((format!("<bg {c}>"), "</bg>"))
        }
        _ => None,
    }
}

/// Parse markup into decoration wrappers and text runs under `parent`.
/// `allowed` is the block's sanitize set; anything else stays literal.
pub fn parse_markup(tree: &mut Tree, parent: NodeId, input: &str, allowed: &[DecorationKind]) {
    let tokens = tokenize(input, allowed);
    let matched = match_pairs(&tokens);

    let mut stack = vec![parent];
    for (index, token) in tokens.into_iter().enumerate() {
        let current = *stack.last().unwrap_or(&parent);
        match token {
            Token::Text(text) => push_text(tree, current, &text),
            Token::Open { kind, value, raw } => {
                if matched[index] {
                    let wrapper = tree.new_wrapper(Decoration { kind, value });
                    tree.append_child(current, wrapper);
                    stack.push(wrapper);
                } else {
                    push_text(tree, current, &raw);
                }
            }
            Token::Close { raw, .. } => {
                if matched[index] {
                    stack.pop();
                } else {
                    push_text(tree, current, &raw);
                }
            }
        }
    }
}

/// Append text, coalescing with a trailing text sibling so literalized
/// tokens never leave fragmented runs.
fn push_text(tree: &mut Tree, parent: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    let last = tree.children(parent).last().copied();
    if let Some(last) = last
        && let Some(existing) = tree.text_mut(last)
    {
        existing.push_str(text);
        return;
    }
    let node = tree.new_text(text);
    tree.append_child(parent, node);
}

fn tokenize(input: &str, allowed: &[DecorationKind]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        literal.push_str(&rest[..lt]);
        rest = &rest[lt..];
        match scan_tag(rest, allowed) {
            Some((token, consumed)) => {
                flush_text(&mut tokens, &mut literal);
                tokens.push(token);
                rest = &rest[consumed..];
            }
            None => {
                literal.push('<');
                rest = &rest[1..];
            }
        }
    }
    literal.push_str(rest);
    flush_text(&mut tokens, &mut literal);
    tokens
}

fn flush_text(tokens: &mut Vec<Token>, literal: &mut String) {
    if !literal.is_empty() {
        let decoded = html_escape::decode_html_entities(literal.as_str()).into_owned();
        tokens.push(Token::Text(decoded));
        literal.clear();
    }
}

/// Try to read one tag at the start of `input` (which begins with `<`).
fn scan_tag(input: &str, allowed: &[DecorationKind]) -> Option<(Token, usize)> {
    let end = input.find('>')?;
    let body = &input[1..end];
    let raw = input[..=end].to_string();
    let consumed = end + 1;

    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (name, value_part) = match body.find(' ') {
        Some(space) => (&body[..space], Some(body[space + 1..].trim())),
        None => (body, None),
    };

    let kind = match name {
        "b" => DecorationKind::Bold,
        "i" => DecorationKind::Italic,
        "color" => DecorationKind::Color,
        "bg" => DecorationKind::Background,
        _ => return None,
    };
    if !allowed.contains(&kind) {
        return None;
    }

    if closing {
        if value_part.is_some() {
            return None;
        }
        return Some((Token::Close { kind, raw }, consumed));
    }

    let value = match (kind.takes_value(), value_part) {
        (false, None) => None,
        (true, Some(v)) => Some(DecorationValue::Color(HexColor::parse(v)?)),
        _ => return None,
    };
    Some((Token::Open { kind, value, raw }, consumed))
}

/// Decide which open/close tokens pair up. Same-kind nesting and stray or
/// unclosed tags are unmatched and fall back to literal text.
fn match_pairs(tokens: &[Token]) -> Vec<bool> {
    let mut matched = vec![false; tokens.len()];
    let mut stack: Vec<(DecorationKind, usize)> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Text(_) => matched[index] = true,
            Token::Open { kind, .. } => {
                if stack.iter().any(|(open, _)| open == kind) {
                    continue;
                }
                stack.push((*kind, index));
            }
            Token::Close { kind, .. } => {
                if let Some(&(open, open_index)) = stack.last()
                    && open == *kind
                {
                    stack.pop();
                    matched[open_index] = true;
                    matched[index] = true;
                }
            }
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockId;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const ALL: &[DecorationKind] = &[
        DecorationKind::Bold,
        DecorationKind::Italic,
        DecorationKind::Color,
        DecorationKind::Background,
    ];

    fn parse(input: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let block = tree.new_block(BlockId::new());
        let root = tree.root();
        tree.append_child(root, block);
        parse_markup(&mut tree, block, input, ALL);
        (tree, block)
    }

    #[rstest]
    #[case("plain text")]
    #[case("Hello <b>World</b>")]
    #[case("<i>all italic</i>")]
    #[case("a<b>b<i>c</i>d</b>e")]
    #[case("x <color #ff0000>red</color> y")]
    #[case("<bg #ffff00>mark</bg>")]
    #[case("<b><color #102030>deep</color></b>")]
    #[case("five &lt; six &amp; seven")]
    fn test_well_formed_markup_round_trips(#[case] input: &str) {
        let (tree, block) = parse(input);
        assert_eq!(write_markup(&tree, block), input);
    }

    #[test]
    fn test_parse_builds_wrapper_structure() {
        let (tree, block) = parse("Hello <b>World</b>");
        let children = tree.children(block);
        assert_eq!(children.len(), 2);
        assert_eq!(tree.text(children[0]), Some("Hello "));
        assert_eq!(
            tree.decoration(children[1]).map(|d| d.kind),
            Some(DecorationKind::Bold)
        );
        assert_eq!(tree.subtree_text(children[1]), "World");
    }

    #[test]
    fn test_color_value_is_normalized() {
        let (tree, block) = parse("<color #FF0000>r</color>");
        let wrapper = tree.children(block)[0];
        let value = tree.decoration(wrapper).and_then(|d| d.value);
        assert_eq!(
            value,
            Some(DecorationValue::Color(HexColor::parse("#ff0000").unwrap()))
        );
        // Writes back in canonical lowercase form
        assert_eq!(write_markup(&tree, block), "<color #ff0000>r</color>");
    }

    #[rstest]
    #[case("<u>underline</u>", "<u>underline</u>")]
    #[case("<b>unclosed", "<b>unclosed")]
    #[case("stray</b>", "stray</b>")]
    #[case("<b><b>nested</b></b>", "<b><b>nested</b></b>")]
    #[case("<color nope>x</color>", "<color nope>x</color>")]
    #[case("a < b", "a < b")]
    fn test_malformed_markup_degrades_to_literal_text(#[case] input: &str, #[case] text: &str) {
        let (tree, block) = parse(input);
        assert_eq!(tree.subtree_text(block), text);
    }

    #[test]
    fn test_disallowed_kind_stays_literal() {
        let mut tree = Tree::new();
        let block = tree.new_block(BlockId::new());
        let root = tree.root();
        tree.append_child(root, block);
        parse_markup(&mut tree, block, "<b>bold</b>", &[DecorationKind::Italic]);

        let children = tree.children(block);
        assert_eq!(children.len(), 1);
        assert_eq!(tree.text(children[0]), Some("<b>bold</b>"));
    }

    #[test]
    fn test_write_escapes_special_characters() {
        let mut tree = Tree::new();
        let block = tree.new_block(BlockId::new());
        let root = tree.root();
        tree.append_child(root, block);
        let text = tree.new_text("a < b & c");
        tree.append_child(block, text);

        let markup = write_markup(&tree, block);
        assert_eq!(markup, "a &lt; b &amp; c");

        // And the escape decodes back on parse
        let (tree2, block2) = parse(&markup);
        assert_eq!(tree2.subtree_text(block2), "a < b & c");
    }
}
