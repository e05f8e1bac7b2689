//! Image block behavior.
//!
//! An image block is a small view-state machine around its payload:
//!
//! ```text
//! UrlEntry --submit_url--> Display --load_failed--> Failed
//!    ^                        |                        |
//!    +------- retry/edit -----+------------------------+
//! ```
//!
//! `UrlEntry` renders the URL-entry affordance, `Display` the image itself
//! (with resize handles and caption), `Failed` an inline retry affordance.
//! A load failure never touches the rest of the document.

use crate::model::ImageData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageViewState {
    UrlEntry,
    Display,
    Failed,
}

#[derive(Debug)]
pub struct ImageView {
    state: ImageViewState,
}

impl ImageView {
    /// Initial state follows the payload: no url yet means the entry
    /// affordance.
    pub fn for_data(data: &ImageData) -> Self {
        let state = if data.url.is_empty() {
            ImageViewState::UrlEntry
        } else {
            ImageViewState::Display
        };
        Self { state }
    }

    pub fn state(&self) -> ImageViewState {
        self.state
    }

    /// Submit a URL from the entry affordance. Blank input keeps the
    /// affordance up; anything else commits and switches to display mode.
    pub fn submit_url(&mut self, data: &mut ImageData, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }
        data.url = url.to_string();
        self.state = ImageViewState::Display;
        true
    }

    /// The host reported that the image resource failed to load.
    pub fn load_failed(&mut self) {
        if self.state == ImageViewState::Display {
            self.state = ImageViewState::Failed;
        }
    }

    /// Retry ("try different URL") or the edit affordance: clear the url
    /// and return to entry mode.
    pub fn edit_url(&mut self, data: &mut ImageData) {
        data.url.clear();
        self.state = ImageViewState::UrlEntry;
    }

    /// Caption edits commit to the payload as they happen; a blank caption
    /// is stored as absent.
    pub fn set_caption(data: &mut ImageData, caption: &str) {
        data.caption = if caption.is_empty() {
            None
        } else {
            Some(caption.to_string())
        };
    }
}
