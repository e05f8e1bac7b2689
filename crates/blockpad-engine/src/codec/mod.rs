//! # Persistence codec
//!
//! Serializes a [`Document`] to the snapshot text format and back:
//!
//! ```json
//! {
//!   "time": "2025-01-15T10:30:00.000Z",
//!   "version": 12,
//!   "blocks": [
//!     {"id": "…", "type": "paragraph", "data": {"text": "Hello"}}
//!   ]
//! }
//! ```
//!
//! Payload fields typed as [`ExtTable`](crate::model::ExtTable) emit their
//! `__type`-tagged entry-list form instead of a native JSON mapping, so
//! non-string-keyed tables survive the text round trip.
//!
//! Round-trip law: `serialize(deserialize(serialize(d))) == serialize(d)`
//! for every valid document. The first encode normalizes (struct fields
//! emit in declaration order, free-form object keys sort, absent optionals
//! are omitted, numbers take their canonical form); subsequent cycles are
//! byte-stable. Decoding validates structure — a
//! missing block list, a duplicate id, or an out-of-range payload is a
//! [`ParseError`], which callers must treat as recoverable.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{Block, BlockId, Document, DocumentError};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot has no recognizable block list")]
    MissingBlocks,
    #[error("snapshot contains a duplicate block id: {0}")]
    DuplicateBlockId(BlockId),
    #[error("snapshot block {0} has an invalid payload")]
    InvalidBlock(BlockId),
}

impl From<DocumentError> for ParseError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::DuplicateBlockId(id) => ParseError::DuplicateBlockId(id),
            DocumentError::UnknownBlockId(id) => ParseError::InvalidBlock(id),
        }
    }
}

/// A decoded snapshot: the document plus the timestamp it was taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: DateTime<Utc>,
    pub document: Document,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    time: String,
    version: u64,
    blocks: &'a [Block],
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    version: Option<u64>,
    blocks: Vec<Block>,
}

/// Serialize a document taken at `time`.
pub fn serialize(document: &Document, time: DateTime<Utc>) -> Result<String, ParseError> {
    let envelope = EnvelopeRef {
        time: time.to_rfc3339_opts(SecondsFormat::Millis, true),
        version: document.version(),
        blocks: document.blocks(),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode a snapshot. Anything without a recognizable block list is
/// rejected before any block is interpreted.
pub fn deserialize(text: &str) -> Result<Snapshot, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.get("blocks").is_some_and(Value::is_array) {
        return Err(ParseError::MissingBlocks);
    }

    let envelope: Envelope = serde_json::from_value(value)?;
    for block in &envelope.blocks {
        if !block.payload.validate() {
            return Err(ParseError::InvalidBlock(block.id()));
        }
    }

    let mut document = Document::from_blocks(envelope.blocks)?;
    document.set_version(envelope.version.unwrap_or(0));

    // Foreign files may omit the timestamp; the content is still usable.
    let time = envelope
        .time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH);

    Ok(Snapshot { time, document })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AppState, BlockPayload, DrawingData, ExtTable, HeaderData, ImageData, ParagraphData,
    };
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uuid::Uuid;

    fn time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
    }

    fn roundtrip_stable(document: &Document) {
        let first = serialize(document, time()).unwrap();
        let snapshot = deserialize(&first).unwrap();
        let second = serialize(&snapshot.document, snapshot.time).unwrap();
        assert_eq!(second, first);

        // And a third cycle stays identical
        let again = deserialize(&second).unwrap();
        assert_eq!(serialize(&again.document, again.time).unwrap(), second);
    }

    #[test]
    fn test_roundtrip_plain_document() {
        let mut doc = Document::new();
        doc.push(Block::new(BlockPayload::Paragraph(ParagraphData::new(
            "Hello <b>World</b>",
        ))))
        .unwrap();
        doc.push(Block::new(BlockPayload::Header(HeaderData::new("Title", 2))))
            .unwrap();
        roundtrip_stable(&doc);
    }

    #[test]
    fn test_roundtrip_with_ext_table() {
        let mut collaborators = ExtTable::new();
        collaborators.insert(json!({"session": 7}), json!({"name": "alice"}));

        let mut doc = Document::new();
        doc.push(Block::new(BlockPayload::Drawing(DrawingData {
            elements: vec![json!({"type": "rectangle", "x": 10})],
            app_state: AppState {
                collaborators,
                extra: serde_json::Map::new(),
            },
            files: serde_json::Map::new(),
            height: 500.0,
        })))
        .unwrap();
        roundtrip_stable(&doc);

        // The tagged form is present in the text
        let text = serialize(&doc, time()).unwrap();
        assert!(text.contains(r#""__type":"ExtTable""#));
        assert!(text.contains(r#""value":[[{"session":7},{"name":"alice"}]]"#));
    }

    #[test]
    fn test_snapshot_shape_is_stable() {
        let id = BlockId::from(Uuid::nil());
        let mut doc = Document::new();
        doc.push(Block::with_id(
            id,
            BlockPayload::Paragraph(ParagraphData::new("Hello")),
        ))
        .unwrap();

        let text = serialize(&doc, time()).unwrap();
        insta::assert_snapshot!(
            text,
            @r#"{"time":"2025-01-15T10:30:00.000Z","version":1,"blocks":[{"id":"00000000-0000-0000-0000-000000000000","type":"paragraph","data":{"text":"Hello"}}]}"#
        );
    }

    #[test]
    fn test_image_block_survives_roundtrip() {
        let mut doc = Document::new();
        doc.push(Block::new(BlockPayload::Image(ImageData {
            url: "http://x/img.png".into(),
            caption: Some("a caption".into()),
            alt: None,
            width: Some(425.5),
            height: Some(212.75),
        })))
        .unwrap();

        let text = serialize(&doc, time()).unwrap();
        let snapshot = deserialize(&text).unwrap();
        assert_eq!(snapshot.document.blocks(), doc.blocks());
        roundtrip_stable(&doc);
    }

    #[test]
    fn test_version_and_time_survive() {
        let mut doc = Document::new();
        doc.push(Block::new(BlockPayload::Paragraph(ParagraphData::new("x"))))
            .unwrap();
        doc.touch();
        doc.touch();
        let version = doc.version();

        let text = serialize(&doc, time()).unwrap();
        let snapshot = deserialize(&text).unwrap();
        assert_eq!(snapshot.document.version(), version);
        assert_eq!(snapshot.time, time());
    }

    #[test]
    fn test_not_json_is_a_parse_error() {
        assert!(matches!(deserialize("not json"), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_missing_block_list_is_rejected() {
        for text in [r#"{}"#, r#"{"blocks": 5}"#, r#"{"content": []}"#, r#"[1,2]"#] {
            assert!(
                matches!(deserialize(text), Err(ParseError::MissingBlocks)),
                "accepted {text}"
            );
        }
    }

    #[test]
    fn test_duplicate_block_id_is_rejected() {
        let id = BlockId::from(Uuid::nil());
        let blocks = json!({
            "blocks": [
                {"id": id, "type": "paragraph", "data": {"text": "a"}},
                {"id": id, "type": "paragraph", "data": {"text": "b"}},
            ]
        });
        let result = deserialize(&blocks.to_string());
        assert!(matches!(result, Err(ParseError::DuplicateBlockId(_))));
    }

    #[test]
    fn test_out_of_range_header_level_is_rejected() {
        let blocks = json!({
            "blocks": [
                {"id": Uuid::new_v4(), "type": "header",
                 "data": {"text": "t", "level": 9, "style": "default"}},
            ]
        });
        let result = deserialize(&blocks.to_string());
        assert!(matches!(result, Err(ParseError::InvalidBlock(_))));
    }

    #[test]
    fn test_missing_time_defaults_without_error() {
        let blocks = json!({
            "blocks": [
                {"id": Uuid::new_v4(), "type": "paragraph", "data": {"text": "a"}},
            ]
        });
        let snapshot = deserialize(&blocks.to_string()).unwrap();
        assert_eq!(snapshot.time, DateTime::UNIX_EPOCH);
        assert_eq!(snapshot.document.len(), 1);
    }
}
