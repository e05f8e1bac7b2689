use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::model::ext::ExtTable;

/// Stable block identifier that survives edits, re-renders, and snapshot
/// round trips. Unique within a document for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for BlockId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A top-level document unit: identity plus a type-tagged payload.
///
/// Serializes as `{"id": ..., "type": ..., "data": {...}}`, the shape the
/// snapshot format and import/export files use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    #[serde(flatten)]
    pub payload: BlockPayload,
}

impl Block {
    pub fn new(payload: BlockPayload) -> Self {
        Self {
            id: BlockId::new(),
            payload,
        }
    }

    /// Rehydrate a block with a known id (snapshot decode path).
    pub fn with_id(id: BlockId, payload: BlockPayload) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }
}

/// Closed set of block payload variants. All dispatch is by this tag; there
/// is no runtime type inspection anywhere in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum BlockPayload {
    Paragraph(ParagraphData),
    Header(HeaderData),
    List(ListData),
    Table(TableData),
    Image(ImageData),
    Drawing(DrawingData),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphData {
    /// Inline markup (see the `markup` module for the vocabulary).
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text_style: Option<TextStyle>,
}

impl ParagraphData {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderData {
    pub text: String,
    pub level: u8,
    pub style: HeaderStyle,
    /// Only rendered when `style` is `Colored`, but kept across style
    /// switches so toggling back restores the picked color.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alignment: Option<Alignment>,
}

impl HeaderData {
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level,
            style: HeaderStyle::Default,
            color: None,
            alignment: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    #[default]
    Default,
    Gradient,
    Outlined,
    Shadowed,
    Colored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListData {
    pub style: ListStyle,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    #[default]
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableData {
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingData {
    pub elements: Vec<Value>,
    pub app_state: AppState,
    pub files: Map<String, Value>,
    pub height: f64,
}

/// Drawing-board state. `collaborators` is keyed by session objects on the
/// canvas side, so it is carried as an [`ExtTable`] rather than a JSON map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppState {
    pub collaborators: ExtTable,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Body1,
    Body2,
    Caption1,
    Caption2,
}

impl BlockPayload {
    /// Structural validity of a decoded payload. Codec rejects blocks that
    /// fail this; in-memory mutation paths keep it true by construction.
    pub fn validate(&self) -> bool {
        match self {
            BlockPayload::Header(h) => (1..=6).contains(&h.level),
            BlockPayload::Drawing(d) => d.height.is_finite() && d.height > 0.0,
            BlockPayload::Image(i) => {
                i.width.is_none_or(|w| w.is_finite() && w > 0.0)
                    && i.height.is_none_or(|h| h.is_finite() && h > 0.0)
            }
            _ => true,
        }
    }

    /// Inline-markup text of the payload, for variants that carry one.
    pub fn text(&self) -> Option<&str> {
        match self {
            BlockPayload::Paragraph(p) => Some(&p.text),
            BlockPayload::Header(h) => Some(&h.text),
            _ => None,
        }
    }

    /// Replace the inline-markup text. Returns false for variants without a
    /// text run.
    pub fn set_text(&mut self, text: String) -> bool {
        match self {
            BlockPayload::Paragraph(p) => {
                p.text = text;
                true
            }
            BlockPayload::Header(h) => {
                h.text = text;
                true
            }
            _ => false,
        }
    }

    pub fn alignment(&self) -> Option<Alignment> {
        match self {
            BlockPayload::Paragraph(p) => p.alignment,
            BlockPayload::Header(h) => h.alignment,
            _ => None,
        }
    }

    /// Returns false when the variant does not support alignment; callers
    /// treat that as a silent no-op.
    pub fn set_alignment(&mut self, alignment: Option<Alignment>) -> bool {
        match self {
            BlockPayload::Paragraph(p) => {
                p.alignment = alignment;
                true
            }
            BlockPayload::Header(h) => {
                h.alignment = alignment;
                true
            }
            _ => false,
        }
    }

    pub fn text_style(&self) -> Option<TextStyle> {
        match self {
            BlockPayload::Paragraph(p) => p.text_style,
            _ => None,
        }
    }

    pub fn set_text_style(&mut self, style: Option<TextStyle>) -> bool {
        match self {
            BlockPayload::Paragraph(p) => {
                p.text_style = style;
                true
            }
            _ => false,
        }
    }

    /// Commit new dimensions from a resize session. Images take both axes;
    /// drawings are height-only and ignore the width. Returns false for
    /// variants that are not resizable.
    pub fn apply_size(&mut self, width: f64, height: f64) -> bool {
        match self {
            BlockPayload::Image(i) => {
                i.width = Some(width);
                i.height = Some(height);
                true
            }
            BlockPayload::Drawing(d) => {
                d.height = height;
                true
            }
            _ => false,
        }
    }

    pub fn size(&self) -> Option<(Option<f64>, Option<f64>)> {
        match self {
            BlockPayload::Image(i) => Some((i.width, i.height)),
            BlockPayload::Drawing(d) => Some((None, Some(d.height))),
            _ => None,
        }
    }
}
