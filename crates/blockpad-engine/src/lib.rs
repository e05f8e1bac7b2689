pub mod autosave;
pub mod codec;
pub mod editor;
pub mod events;
pub mod format;
pub mod markup;
pub mod model;
pub mod overlay;
pub mod render;
pub mod resize;
pub mod storage;
pub mod style;
pub mod tools;
pub mod tree;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use autosave::AutosaveScheduler;
pub use codec::{ParseError, Snapshot};
pub use editor::{Editor, ExportFile, HeaderUpdate};
pub use events::{EventKind, ListenerGuard, ListenerRegistry};
pub use format::{
    CheckState, Decoration, DecorationKind, DecorationValue, HexColor, apply_or_toggle,
    check_state,
};
pub use model::*;
pub use overlay::{AnchorRect, OverlayChoice, OverlayKind, Placement, PopoverCoordinator};
pub use resize::{AxisMode, PointerPoint, ResizeController};
pub use storage::{FileStore, MemoryStore, SnapshotStore, StorageError};
pub use style::StyleRegistry;
pub use tools::{
    BlockToolSpec, BlockView, InlineToolSpec, SanitizeRule, ToolError, ToolKind, ToolRegistry,
};
pub use tree::{Caret, NodeData, NodeId, SelectionRange, Tree, Widget};
