//! Editor-owned style registration.
//!
//! Tools used to inject a global style block guarded by an existence check
//! and leave it behind forever. Instead, sheets register here: registration
//! is idempotent per id, the registry is created with the editor, and
//! teardown removes everything the editor added — no unowned side effects
//! on the hosting page.

use std::collections::BTreeMap;

pub const HEADER_SHEET_ID: &str = "blockpad-header-styles";

pub(crate) const HEADER_SHEET_CSS: &str = "\
.custom-header { margin: 0; padding: 0.5em 0; font-weight: bold; }\n\
.custom-header--gradient { background-clip: text; }\n\
.custom-header--outlined { -webkit-text-stroke: 1px currentColor; }\n\
.custom-header--shadowed { text-shadow: 2px 2px 4px rgba(0, 0, 0, 0.3); }\n";

#[derive(Debug, Default)]
pub struct StyleRegistry {
    sheets: BTreeMap<String, String>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sheet once. Returns false (and leaves the original) when
    /// the id is already present.
    pub fn register(&mut self, id: &str, css: &str) -> bool {
        if self.sheets.contains_key(id) {
            return false;
        }
        self.sheets.insert(id.to_string(), css.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sheets.contains_key(id)
    }

    pub fn css(&self, id: &str) -> Option<&str> {
        self.sheets.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Editor teardown: every registered sheet goes away with the editor.
    pub fn teardown(&mut self) {
        self.sheets.clear();
    }
}
