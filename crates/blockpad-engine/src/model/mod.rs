pub mod block;
pub mod document;
pub mod ext;

pub use block::{
    Alignment, AppState, Block, BlockId, BlockPayload, DrawingData, HeaderData, HeaderStyle,
    ImageData, ListData, ListStyle, ParagraphData, TableData, TextStyle,
};
pub use document::{Document, DocumentError};
pub use ext::ExtTable;
