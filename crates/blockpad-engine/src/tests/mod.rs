//! Editor-level tests and shared fixtures.
//!
//! Module-level behavior lives next to each module; what's here exercises
//! the wiring: hydration, change notification, read-only gating, and the
//! teardown contract.

use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};

use blockpad_config::Config;

use crate::editor::Editor;
use crate::model::{BlockPayload, ImageData, ParagraphData};
use crate::storage::{MemoryStore, SnapshotStore};
use crate::tree::{Caret, SelectionRange};

pub fn test_editor() -> Editor {
    Editor::init(Config::default(), Box::new(MemoryStore::new()))
}

pub fn test_editor_with_store(store: MemoryStore) -> Editor {
    Editor::init(Config::default(), Box::new(store))
}

pub fn wall_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Selection over `range` of the block's first text node.
pub fn select_in_block(
    editor: &Editor,
    id: crate::model::BlockId,
    start: usize,
    end: usize,
) -> SelectionRange {
    let node = editor.tree().find_block(id).expect("block rendered");
    let text = editor.tree().text_nodes(node)[0];
    SelectionRange::new(Caret::new(text, start), Caret::new(text, end))
}

mod editor_wiring {
    use super::*;
    use crate::format::DecorationKind;
    use crate::model::BlockId;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_init_from_empty_store_starts_empty() {
        let editor = test_editor();
        assert!(editor.document().is_empty());
        assert!(!editor.autosave_pending());
    }

    #[test]
    fn test_init_survives_corrupt_snapshot() {
        let mut store = MemoryStore::new();
        store
            .write(&Config::default().storage.content, "{ not json !!")
            .unwrap();

        let editor = test_editor_with_store(store);
        assert!(editor.document().is_empty());
    }

    #[test]
    fn test_init_survives_snapshot_without_blocks() {
        let mut store = MemoryStore::new();
        store
            .write(&Config::default().storage.content, r#"{"content": []}"#)
            .unwrap();

        let editor = test_editor_with_store(store);
        assert!(editor.document().is_empty());
    }

    #[test]
    fn test_init_hydrates_previous_snapshot() {
        let mut first = test_editor();
        let now = Instant::now();
        first
            .insert_block(BlockPayload::Paragraph(ParagraphData::new("persisted")), now)
            .unwrap();
        first.save_now(wall_time()).unwrap();
        let saved = first
            .store()
            .read(&Config::default().storage.content)
            .unwrap()
            .unwrap();

        let mut store = MemoryStore::new();
        store
            .write(&Config::default().storage.content, &saved)
            .unwrap();
        let editor = test_editor_with_store(store);

        assert_eq!(editor.document().len(), 1);
        assert_eq!(
            editor.document().blocks()[0].payload.text(),
            Some("persisted")
        );
    }

    #[test]
    fn test_changes_arm_autosave_and_read_only_does_not() {
        let mut editor = test_editor();
        let now = Instant::now();

        editor
            .insert_block(BlockPayload::Paragraph(ParagraphData::new("x")), now)
            .unwrap();
        assert!(editor.autosave_pending());

        editor.save_now(wall_time()).unwrap();
        assert!(!editor.autosave_pending());

        editor.set_read_only(true);
        assert!(
            editor
                .insert_block(BlockPayload::Paragraph(ParagraphData::new("y")), now)
                .is_err()
        );
        assert!(!editor.autosave_pending());
    }

    #[test]
    fn test_apply_format_commits_markup_to_payload() {
        let mut editor = test_editor();
        let now = Instant::now();
        let id = editor
            .insert_block(BlockPayload::Paragraph(ParagraphData::new("Hello World")), now)
            .unwrap();

        editor.set_selection(Some(select_in_block(&editor, id, 0, 5)));
        assert!(editor.apply_format(DecorationKind::Bold, None, now));

        assert_eq!(
            editor.document().block(id).unwrap().payload.text(),
            Some("<b>Hello</b> World")
        );
        // Selection now covers the new wrapper, so a second toggle undoes it
        assert!(editor.apply_format(DecorationKind::Bold, None, now));
        assert_eq!(
            editor.document().block(id).unwrap().payload.text(),
            Some("Hello World")
        );
    }

    #[test]
    fn test_unknown_block_operations_are_refused() {
        let mut editor = test_editor();
        let now = Instant::now();
        let ghost = BlockId::new();

        assert!(!editor.submit_image_url(ghost, "http://x", now));
        assert!(!editor.remove_block(ghost, now));
        assert!(!editor.set_block_text(ghost, "hi", now));
    }

    #[test]
    fn test_remove_block_cancels_drag_and_releases_view() {
        let mut editor = test_editor();
        let now = Instant::now();
        let id = editor
            .insert_block(
                BlockPayload::Image(ImageData {
                    url: "http://x/img.png".into(),
                    ..ImageData::default()
                }),
                now,
            )
            .unwrap();

        editor.begin_resize(
            id,
            crate::resize::AxisMode::Width,
            crate::resize::PointerPoint::new(0.0, 0.0),
            (400.0, 200.0),
        );
        assert!(editor.is_resizing(id));

        editor.remove_block(id, now);
        assert!(!editor.is_resizing(id));
        assert_eq!(editor.listeners().active_count(), 0);
        assert!(editor.tree().find_block(id).is_none());
    }

    #[test]
    fn test_destroy_releases_everything_and_gates_mutation() {
        let mut editor = test_editor();
        let now = Instant::now();
        let id = editor
            .insert_block(
                BlockPayload::Image(ImageData {
                    url: "http://x/img.png".into(),
                    ..ImageData::default()
                }),
                now,
            )
            .unwrap();
        editor
            .insert_block(BlockPayload::Drawing(crate::tools::drawing::new_drawing()), now)
            .unwrap();

        // Leave things mid-flight: a drag, an open overlay, a pending save
        editor.begin_resize(
            id,
            crate::resize::AxisMode::Both,
            crate::resize::PointerPoint::new(0.0, 0.0),
            (400.0, 200.0),
        );
        editor.open_overlay(crate::overlay::OverlayKind::AlignmentMenu, None);
        assert!(editor.autosave_pending());

        editor.destroy();

        assert!(editor.is_destroyed());
        assert_eq!(editor.listeners().active_count(), 0);
        assert!(!editor.autosave_pending());
        // A save can no longer fire
        assert!(!editor.poll(now + Duration::from_secs(60), wall_time()));
        // And mutation is refused
        assert!(
            editor
                .insert_block(BlockPayload::Paragraph(ParagraphData::new("z")), now)
                .is_err()
        );
    }

    #[test]
    fn test_repeated_mount_unmount_cycles_do_not_leak() {
        for _ in 0..20 {
            let mut editor = test_editor();
            let now = Instant::now();
            editor
                .insert_block(BlockPayload::Drawing(crate::tools::drawing::new_drawing()), now)
                .unwrap();
            let registry = editor.listeners().clone();
            editor.destroy();
            assert_eq!(registry.active_count(), 0);
        }
    }

    #[test]
    fn test_clear_empties_document_and_store() {
        let mut editor = test_editor();
        let now = Instant::now();
        editor
            .insert_block(BlockPayload::Paragraph(ParagraphData::new("x")), now)
            .unwrap();
        editor.save_now(wall_time()).unwrap();

        editor.clear().unwrap();
        assert!(editor.document().is_empty());
        assert_eq!(
            editor
                .store()
                .read(&Config::default().storage.content)
                .unwrap(),
            None
        );
        assert!(!editor.autosave_pending());
    }

    #[test]
    fn test_failed_tool_leaves_editor_functional() {
        let mut editor = test_editor();
        let now = Instant::now();
        editor.tools_mut().register_block(|| {
            Err(crate::tools::ToolError::Init(
                "whiteboard",
                "no canvas host".into(),
            ))
        });

        // Everything else still works
        let id = editor
            .insert_block(BlockPayload::Paragraph(ParagraphData::new("fine")), now)
            .unwrap();
        editor.set_selection(Some(select_in_block(&editor, id, 0, 4)));
        assert!(editor.apply_format(DecorationKind::Italic, None, now));
    }
}
