//! # Tool registry
//!
//! The editor's capability surface is a closed set of tools dispatched by
//! tag. Block tools carry `{render, save, validate, destroy, sanitize
//! rule}` semantics (render and save live in `render`/`codec`, validate on
//! the payload, destroy on the view state); inline tools additionally
//! expose `{is_inline, title, shortcut}` for the host toolbar.
//!
//! Registration isolates failures: a tool whose constructor errors is
//! simply unavailable, and the rest of the editor keeps working.

pub mod drawing;
pub mod image;

pub use drawing::DrawingBoard;
pub use image::{ImageView, ImageViewState};

use log::warn;
use thiserror::Error;

use crate::format::DecorationKind;
use crate::model::BlockPayload;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool \"{0}\" failed to initialize: {1}")]
    Init(&'static str, String),
}

/// Tags for the block tool set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Paragraph,
    Header,
    List,
    Table,
    Image,
    Drawing,
}

impl ToolKind {
    pub fn for_payload(payload: &BlockPayload) -> ToolKind {
        match payload {
            BlockPayload::Paragraph(_) => ToolKind::Paragraph,
            BlockPayload::Header(_) => ToolKind::Header,
            BlockPayload::List(_) => ToolKind::List,
            BlockPayload::Table(_) => ToolKind::Table,
            BlockPayload::Image(_) => ToolKind::Image,
            BlockPayload::Drawing(_) => ToolKind::Drawing,
        }
    }

    pub fn sanitize_rule(self) -> SanitizeRule {
        match self {
            ToolKind::Paragraph | ToolKind::Header | ToolKind::List => {
                SanitizeRule::Markup(INLINE_MARKUP)
            }
            ToolKind::Table => SanitizeRule::Markup(&[]),
            ToolKind::Image => {
                SanitizeRule::Fields(&["url", "caption", "alt", "width", "height"])
            }
            ToolKind::Drawing => SanitizeRule::Fields(&["elements", "appState", "files", "height"]),
        }
    }
}

/// The inline decorations text blocks accept.
pub const INLINE_MARKUP: &[DecorationKind] = &[
    DecorationKind::Bold,
    DecorationKind::Italic,
    DecorationKind::Color,
    DecorationKind::Background,
];

/// What survives sanitization for a block kind: either an inline-markup tag
/// set for text payloads, or a pass-through field list for structured ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeRule {
    Markup(&'static [DecorationKind]),
    Fields(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockToolSpec {
    pub kind: ToolKind,
    pub title: &'static str,
    pub read_only_supported: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineToolSpec {
    pub kind: DecorationKind,
    pub is_inline: bool,
    pub title: &'static str,
    pub shortcut: &'static str,
}

/// Per-block runtime state owned by a tool instance. Dropping it releases
/// whatever the tool acquired (a drawing board's canvas hook, for one).
#[derive(Debug)]
pub enum BlockView {
    Image(ImageView),
    Drawing(DrawingBoard),
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    block_tools: Vec<BlockToolSpec>,
    inline_tools: Vec<InlineToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped tool set. Built-in constructors are infallible, so this
    /// always registers everything.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for spec in DEFAULT_BLOCK_TOOLS {
            registry.register_block(|| Ok(*spec));
        }
        for spec in DEFAULT_INLINE_TOOLS {
            registry.register_inline(|| Ok(*spec));
        }
        registry
    }

    /// Run a block tool constructor. On error the tool is unavailable and
    /// everything else keeps working.
    pub fn register_block(
        &mut self,
        construct: impl FnOnce() -> Result<BlockToolSpec, ToolError>,
    ) -> bool {
        match construct() {
            Ok(spec) => {
                self.block_tools.retain(|t| t.kind != spec.kind);
                self.block_tools.push(spec);
                true
            }
            Err(err) => {
                warn!("block tool unavailable: {err}");
                false
            }
        }
    }

    pub fn register_inline(
        &mut self,
        construct: impl FnOnce() -> Result<InlineToolSpec, ToolError>,
    ) -> bool {
        match construct() {
            Ok(spec) => {
                self.inline_tools.retain(|t| t.kind != spec.kind);
                self.inline_tools.push(spec);
                true
            }
            Err(err) => {
                warn!("inline tool unavailable: {err}");
                false
            }
        }
    }

    pub fn block_tool(&self, kind: ToolKind) -> Option<&BlockToolSpec> {
        self.block_tools.iter().find(|t| t.kind == kind)
    }

    pub fn inline_tool(&self, kind: DecorationKind) -> Option<&InlineToolSpec> {
        self.inline_tools.iter().find(|t| t.kind == kind)
    }

    pub fn block_available(&self, kind: ToolKind) -> bool {
        self.block_tool(kind).is_some()
    }

    pub fn inline_available(&self, kind: DecorationKind) -> bool {
        self.inline_tool(kind).is_some()
    }
}

const DEFAULT_BLOCK_TOOLS: &[BlockToolSpec] = &[
    BlockToolSpec {
        kind: ToolKind::Paragraph,
        title: "Text",
        read_only_supported: true,
    },
    BlockToolSpec {
        kind: ToolKind::Header,
        title: "Custom Header",
        read_only_supported: true,
    },
    BlockToolSpec {
        kind: ToolKind::List,
        title: "List",
        read_only_supported: true,
    },
    BlockToolSpec {
        kind: ToolKind::Table,
        title: "Table",
        read_only_supported: true,
    },
    BlockToolSpec {
        kind: ToolKind::Image,
        title: "Image",
        read_only_supported: true,
    },
    BlockToolSpec {
        kind: ToolKind::Drawing,
        title: "Drawing Board",
        read_only_supported: true,
    },
];

const DEFAULT_INLINE_TOOLS: &[InlineToolSpec] = &[
    InlineToolSpec {
        kind: DecorationKind::Bold,
        is_inline: true,
        title: "Bold",
        shortcut: "CMD+B",
    },
    InlineToolSpec {
        kind: DecorationKind::Italic,
        is_inline: true,
        title: "Italic",
        shortcut: "CMD+I",
    },
    InlineToolSpec {
        kind: DecorationKind::Color,
        is_inline: true,
        title: "Text Color",
        shortcut: "CMD+SHIFT+C",
    },
    InlineToolSpec {
        kind: DecorationKind::Background,
        is_inline: true,
        title: "Background Color",
        shortcut: "CMD+SHIFT+H",
    },
    InlineToolSpec {
        kind: DecorationKind::Alignment,
        is_inline: true,
        title: "Text Align",
        shortcut: "CMD+SHIFT+A",
    },
    InlineToolSpec {
        kind: DecorationKind::TextStyle,
        is_inline: true,
        title: "Text Style",
        shortcut: "CMD+SHIFT+T",
    },
];
