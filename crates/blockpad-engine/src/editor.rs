//! The editor facade.
//!
//! Owns the document, the rendered tree, and every component with a
//! lifecycle: the resize controller, the popover coordinator, the autosave
//! scheduler, the style registry, and the per-block tool views. Hosts talk
//! to the editor; components never reach around it.
//!
//! Two clocks appear in the API: a monotonic [`Instant`] drives the
//! debounce, and a wall-clock [`DateTime<Utc>`] stamps snapshots and export
//! filenames. The host supplies both, which keeps the engine free of
//! ambient time and makes every timing property testable.
//!
//! Nothing here is fatal: a corrupt snapshot falls back to an empty
//! document, a failed autosave is logged and retried on the next burst, a
//! failed tool leaves the rest of the editor working.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use blockpad_config::Config;

use crate::autosave::AutosaveScheduler;
use crate::codec::{self, ParseError};
use crate::events::ListenerRegistry;
use crate::format::{self, CheckState, DecorationKind, DecorationValue};
use crate::model::{Block, BlockId, BlockPayload, Document, HeaderStyle};
use crate::overlay::{AnchorRect, OverlayChoice, OverlayKind, Placement, PopoverCoordinator};
use crate::render;
use crate::resize::{AxisMode, PointerPoint, ResizeController};
use crate::storage::SnapshotStore;
use crate::style::{HEADER_SHEET_CSS, HEADER_SHEET_ID, StyleRegistry};
use crate::tools::image::ImageView;
use crate::tools::{BlockView, DrawingBoard, ToolRegistry};
use crate::tree::{SelectionRange, Tree};

/// An export payload: the snapshot text plus its date-derived filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

/// Header settings applied from the block settings panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderUpdate {
    pub level: Option<u8>,
    pub style: Option<HeaderStyle>,
    pub color: Option<String>,
}

pub struct Editor {
    config: Config,
    store: Box<dyn SnapshotStore>,
    doc: Document,
    tree: Tree,
    selection: Option<SelectionRange>,
    tools: ToolRegistry,
    views: HashMap<BlockId, BlockView>,
    resize: ResizeController,
    popover: PopoverCoordinator,
    scheduler: AutosaveScheduler,
    styles: StyleRegistry,
    listeners: ListenerRegistry,
    read_only: bool,
    destroyed: bool,
}

impl Editor {
    /// Construct and hydrate from the last stored snapshot. Never fails:
    /// a missing, unreadable, or corrupt snapshot starts an empty document.
    pub fn init(config: Config, store: Box<dyn SnapshotStore>) -> Self {
        let doc = match store.read(&config.storage.content) {
            Ok(Some(text)) => match codec::deserialize(&text) {
                Ok(snapshot) => {
                    debug!("hydrated {} blocks from snapshot", snapshot.document.len());
                    snapshot.document
                }
                Err(err) => {
                    warn!("discarding corrupt snapshot: {err}");
                    Document::new()
                }
            },
            Ok(None) => Document::new(),
            Err(err) => {
                warn!("snapshot store unavailable, starting empty: {err}");
                Document::new()
            }
        };

        let listeners = ListenerRegistry::new();
        let mut styles = StyleRegistry::new();
        styles.register(HEADER_SHEET_ID, HEADER_SHEET_CSS);

        let mut editor = Self {
            resize: ResizeController::new(
                config.image_bounds,
                config.drawing_min_height,
                listeners.clone(),
            ),
            popover: PopoverCoordinator::new(listeners.clone()),
            scheduler: AutosaveScheduler::new(Duration::from_millis(config.autosave_debounce_ms)),
            tools: ToolRegistry::with_defaults(),
            views: HashMap::new(),
            tree: Tree::new(),
            selection: None,
            styles,
            listeners,
            read_only: false,
            destroyed: false,
            config,
            store,
            doc,
        };
        editor.hydrate_drawings();
        editor.rebuild_views();
        render::render_document(&mut editor.tree, &editor.doc, &editor.views);
        editor
    }

    fn hydrate_drawings(&mut self) {
        for block in self.doc.blocks_mut() {
            if let BlockPayload::Drawing(data) = &mut block.payload {
                *data = crate::tools::drawing::hydrate(data.clone());
            }
        }
    }

    fn rebuild_views(&mut self) {
        self.views = self
            .doc
            .blocks()
            .iter()
            .filter_map(|block| {
                let view = match &block.payload {
                    BlockPayload::Image(data) => BlockView::Image(ImageView::for_data(data)),
                    BlockPayload::Drawing(_) => {
                        BlockView::Drawing(DrawingBoard::mount(&self.listeners))
                    }
                    _ => return None,
                };
                Some((block.id(), view))
            })
            .collect();
    }

    fn rerender_block(&mut self, id: BlockId) {
        if let Some(block) = self.doc.block(id) {
            render::render_block(&mut self.tree, block, self.views.get(&id));
        }
    }

    /// Content changed; arm the autosave debounce. Nothing is generated in
    /// read-only mode.
    fn note_change(&mut self, now: Instant) {
        if !self.read_only && !self.destroyed {
            self.scheduler.note_change(now);
        }
    }

    fn mutable(&self) -> bool {
        !self.read_only && !self.destroyed
    }

    // --- selection & formatting ---------------------------------------

    pub fn set_selection(&mut self, selection: Option<SelectionRange>) {
        self.selection = selection;
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    /// Toggle/apply an inline decoration on the current selection. Returns
    /// true when the document changed.
    pub fn apply_format(
        &mut self,
        kind: DecorationKind,
        value: Option<DecorationValue>,
        now: Instant,
    ) -> bool {
        if !self.mutable() || !self.tools.inline_available(kind) {
            return false;
        }
        let Some(sel) = self.selection else {
            return false;
        };

        let before = self.doc.version();
        let new_sel = format::apply_or_toggle(&mut self.tree, &mut self.doc, &sel, kind, value);

        if self.tree.contains(new_sel.anchor.node)
            && let Some(block_node) = self.tree.containing_block(new_sel.anchor.node)
            && let Some(block_id) = self.tree.block_id(block_node)
        {
            render::commit_block_text(&self.tree, &mut self.doc, block_id);
        }
        self.selection = Some(new_sel);

        let changed = self.doc.version() != before;
        if changed {
            self.note_change(now);
        }
        changed
    }

    /// Inline tool state at the current selection (caret is enough).
    pub fn check_format(&self, kind: DecorationKind) -> CheckState {
        match self.selection {
            Some(sel) => format::check_state(&self.tree, &self.doc, sel.anchor, kind),
            None => CheckState {
                active: false,
                value: None,
            },
        }
    }

    // --- block lifecycle ----------------------------------------------

    pub fn insert_block(&mut self, payload: BlockPayload, now: Instant) -> anyhow::Result<BlockId> {
        if !self.mutable() {
            anyhow::bail!("editor is read-only");
        }
        let view = match &payload {
            BlockPayload::Image(data) => Some(BlockView::Image(ImageView::for_data(data))),
            BlockPayload::Drawing(_) => Some(BlockView::Drawing(DrawingBoard::mount(&self.listeners))),
            _ => None,
        };
        let id = self.doc.push(Block::new(payload))?;
        if let Some(view) = view {
            self.views.insert(id, view);
        }
        self.rerender_block(id);
        self.note_change(now);
        Ok(id)
    }

    /// Remove a block, cancelling any drag on it and releasing whatever its
    /// tool view holds.
    pub fn remove_block(&mut self, id: BlockId, now: Instant) -> bool {
        if !self.mutable() {
            return false;
        }
        self.resize.end(id);
        self.views.remove(&id);
        if let Some(node) = self.tree.find_block(id) {
            self.tree.remove_subtree(node);
        }
        let removed = self.doc.remove(id).is_some();
        if removed {
            self.selection = None;
            self.note_change(now);
        }
        removed
    }

    /// Replace a text block's markup wholesale (host typing path) and
    /// re-render it.
    pub fn set_block_text(&mut self, id: BlockId, text: &str, now: Instant) -> bool {
        if !self.mutable() {
            return false;
        }
        let Some(block) = self.doc.block_mut(id) else {
            return false;
        };
        if block.payload.text() == Some(text) {
            return false;
        }
        if !block.payload.set_text(text.to_string()) {
            return false;
        }
        self.doc.touch();
        self.selection = None;
        self.rerender_block(id);
        self.note_change(now);
        true
    }

    pub fn update_header(&mut self, id: BlockId, update: HeaderUpdate, now: Instant) -> bool {
        if !self.mutable() {
            return false;
        }
        if update.level.is_some_and(|level| !(1..=6).contains(&level)) {
            return false;
        }
        let Some(block) = self.doc.block_mut(id) else {
            return false;
        };
        let BlockPayload::Header(data) = &mut block.payload else {
            return false;
        };

        if let Some(level) = update.level {
            data.level = level;
        }
        if let Some(style) = update.style {
            data.style = style;
        }
        if let Some(color) = update.color {
            data.color = Some(color);
        }
        self.doc.touch();
        self.rerender_block(id);
        self.note_change(now);
        true
    }

    // --- image tool ----------------------------------------------------

    pub fn submit_image_url(&mut self, id: BlockId, url: &str, now: Instant) -> bool {
        if !self.mutable() {
            return false;
        }
        let Some(BlockView::Image(view)) = self.views.get_mut(&id) else {
            return false;
        };
        let Some(block) = self.doc.block_mut(id) else {
            return false;
        };
        let BlockPayload::Image(data) = &mut block.payload else {
            return false;
        };
        if !view.submit_url(data, url) {
            return false;
        }
        self.doc.touch();
        self.rerender_block(id);
        self.note_change(now);
        true
    }

    /// Host report: the image resource failed to load. Switches the block
    /// to its retry affordance; the rest of the document is unaffected.
    pub fn image_load_failed(&mut self, id: BlockId) {
        if let Some(BlockView::Image(view)) = self.views.get_mut(&id) {
            view.load_failed();
            self.rerender_block(id);
        }
    }

    /// Retry / edit-url affordance: back to URL entry.
    pub fn edit_image_url(&mut self, id: BlockId, now: Instant) -> bool {
        if !self.mutable() {
            return false;
        }
        let Some(BlockView::Image(view)) = self.views.get_mut(&id) else {
            return false;
        };
        let Some(block) = self.doc.block_mut(id) else {
            return false;
        };
        let BlockPayload::Image(data) = &mut block.payload else {
            return false;
        };
        view.edit_url(data);
        self.doc.touch();
        self.rerender_block(id);
        self.note_change(now);
        true
    }

    pub fn set_image_caption(&mut self, id: BlockId, caption: &str, now: Instant) -> bool {
        if !self.mutable() {
            return false;
        }
        let Some(block) = self.doc.block_mut(id) else {
            return false;
        };
        let BlockPayload::Image(data) = &mut block.payload else {
            return false;
        };
        ImageView::set_caption(data, caption);
        self.doc.touch();
        self.rerender_block(id);
        self.note_change(now);
        true
    }

    // --- resize --------------------------------------------------------

    pub fn begin_resize(
        &mut self,
        id: BlockId,
        mode: AxisMode,
        at: PointerPoint,
        measured: (f64, f64),
    ) -> bool {
        if !self.mutable() {
            return false;
        }
        self.resize.begin(&self.doc, id, mode, at, measured)
    }

    /// Pointer-move during a drag: commits the new size synchronously.
    pub fn update_resize(
        &mut self,
        id: BlockId,
        at: PointerPoint,
        now: Instant,
    ) -> Option<(f64, f64)> {
        if self.destroyed {
            return None;
        }
        let committed = self.resize.update(&mut self.doc, id, at)?;
        self.rerender_block(id);
        self.note_change(now);
        Some(committed)
    }

    /// Pointer-up: close the session.
    pub fn end_resize(&mut self, id: BlockId) {
        self.resize.end(id);
    }

    /// Pointer-cancel (cursor left the window, block deleted mid-drag).
    pub fn cancel_resize(&mut self, id: BlockId) {
        self.resize.end(id);
    }

    pub fn is_resizing(&self, id: BlockId) -> bool {
        self.resize.is_dragging(id)
    }

    // --- overlays -------------------------------------------------------

    pub fn open_overlay(&mut self, kind: OverlayKind, anchor: Option<AnchorRect>) -> Placement {
        self.popover.open(kind, anchor)
    }

    pub fn overlay(&self) -> Option<OverlayKind> {
        self.popover.current()
    }

    pub fn overlay_outside_click(&mut self) {
        self.popover.handle_outside_click();
    }

    pub fn overlay_escape(&mut self) {
        self.popover.handle_escape();
    }

    /// An option was picked inside the open overlay: dismiss it and apply
    /// the choice to the current selection.
    pub fn overlay_choose(&mut self, choice: OverlayChoice, now: Instant) -> bool {
        let open = self.popover.current();
        let Some(choice) = self.popover.choose(choice) else {
            return false;
        };
        match (open, choice) {
            (Some(OverlayKind::ColorPicker { target, .. }), OverlayChoice::Color(color)) => {
                self.apply_format(target, Some(DecorationValue::Color(color)), now)
            }
            (Some(OverlayKind::AlignmentMenu), OverlayChoice::Alignment(alignment)) => self
                .apply_format(
                    DecorationKind::Alignment,
                    Some(DecorationValue::Alignment(alignment)),
                    now,
                ),
            (Some(OverlayKind::StyleMenu), OverlayChoice::Style(style)) => self.apply_format(
                DecorationKind::TextStyle,
                Some(DecorationValue::Style(style)),
                now,
            ),
            _ => false,
        }
    }

    // --- persistence ----------------------------------------------------

    /// Drive the debounce. Fires at most one save per change burst.
    pub fn poll(&mut self, now: Instant, wall: DateTime<Utc>) -> bool {
        if self.destroyed || !self.scheduler.poll(now) {
            return false;
        }
        if let Err(err) = self.save_snapshot(wall) {
            warn!("autosave failed: {err}");
        }
        true
    }

    /// Explicit save: bypasses the debounce and disarms it.
    pub fn save_now(&mut self, wall: DateTime<Utc>) -> anyhow::Result<()> {
        if self.destroyed {
            anyhow::bail!("editor is destroyed");
        }
        self.scheduler.cancel();
        self.save_snapshot(wall)
    }

    fn save_snapshot(&mut self, wall: DateTime<Utc>) -> anyhow::Result<()> {
        let text = codec::serialize(&self.doc, wall)?;
        self.store.write(&self.config.storage.content, &text)?;
        self.store
            .write(&self.config.storage.last_saved, &wall.to_rfc3339())?;
        debug!("snapshot saved ({} blocks)", self.doc.len());
        Ok(())
    }

    /// Export the current document; filename derives from the date.
    pub fn export(&self, wall: DateTime<Utc>) -> anyhow::Result<ExportFile> {
        let contents = codec::serialize(&self.doc, wall)?;
        let filename = format!(
            "{}-{}.json",
            self.config.export_prefix,
            wall.format("%Y-%m-%d")
        );
        Ok(ExportFile { filename, contents })
    }

    /// Import a snapshot file. A payload without a recognizable block list
    /// is rejected with no mutation; the error's message is user-facing.
    pub fn import(&mut self, text: &str, now: Instant) -> Result<(), ParseError> {
        let snapshot = codec::deserialize(text)?;
        self.doc = snapshot.document;
        self.hydrate_drawings();
        self.rebuild_views();
        self.selection = None;
        render::render_document(&mut self.tree, &self.doc, &self.views);
        self.note_change(now);
        Ok(())
    }

    /// Empty the document and drop the stored snapshot.
    pub fn clear(&mut self) -> anyhow::Result<()> {
        if !self.mutable() {
            anyhow::bail!("editor is read-only");
        }
        self.doc.clear();
        self.views.clear();
        self.selection = None;
        render::render_document(&mut self.tree, &self.doc, &self.views);
        self.scheduler.cancel();
        self.store.remove(&self.config.storage.content)?;
        self.store.remove(&self.config.storage.last_saved)?;
        Ok(())
    }

    // --- mode & teardown ------------------------------------------------

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Tear the editor down: cancel the pending autosave, cancel every drag
    /// session, close overlays, drop tool views, and release every style and
    /// listener the editor owns. No timer or listener survives this.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.scheduler.cancel();
        self.resize.cancel_all();
        self.popover.close();
        self.views.clear();
        self.styles.teardown();
        self.selection = None;
        self.tree = Tree::new();
        debug!("editor destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // --- accessors ------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    pub fn autosave_pending(&self) -> bool {
        self.scheduler.pending()
    }
}
