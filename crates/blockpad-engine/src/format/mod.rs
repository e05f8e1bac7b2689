pub mod color;
pub mod engine;

pub use color::HexColor;
pub use engine::{CheckState, apply_or_toggle, check_state};

use crate::model::{Alignment, TextStyle};

/// The closed set of inline decoration kinds.
///
/// Bold/Italic/Color/Background are selection-dependent and materialize as
/// wrapper nodes around a text run. Alignment/TextStyle are block-scoped:
/// they ignore the selection's extent and target the caret's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    Bold,
    Italic,
    Color,
    Background,
    Alignment,
    TextStyle,
}

impl DecorationKind {
    /// Kinds that carry a value (everything except bold/italic).
    pub fn takes_value(self) -> bool {
        !matches!(self, DecorationKind::Bold | DecorationKind::Italic)
    }

    /// Kinds that require a non-collapsed selection to apply.
    pub fn is_selection_dependent(self) -> bool {
        !self.is_block_scoped()
    }

    pub fn is_block_scoped(self) -> bool {
        matches!(self, DecorationKind::Alignment | DecorationKind::TextStyle)
    }
}

/// A decoration value. Which variant is legal follows from the kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecorationValue {
    Color(HexColor),
    Alignment(Alignment),
    Style(TextStyle),
}

impl DecorationValue {
    pub fn as_color(&self) -> Option<HexColor> {
        match self {
            DecorationValue::Color(c) => Some(*c),
            _ => None,
        }
    }
}

/// A materialized wrapper decoration: kind plus value for valued kinds.
/// Only selection-dependent kinds ever appear on wrapper nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub value: Option<DecorationValue>,
}

impl Decoration {
    pub fn bold() -> Self {
        Self {
            kind: DecorationKind::Bold,
            value: None,
        }
    }

    pub fn italic() -> Self {
        Self {
            kind: DecorationKind::Italic,
            value: None,
        }
    }

    pub fn color(color: HexColor) -> Self {
        Self {
            kind: DecorationKind::Color,
            value: Some(DecorationValue::Color(color)),
        }
    }

    pub fn background(color: HexColor) -> Self {
        Self {
            kind: DecorationKind::Background,
            value: Some(DecorationValue::Color(color)),
        }
    }
}
