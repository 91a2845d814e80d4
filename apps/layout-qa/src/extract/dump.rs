//! Layout dump — page geometry exported by the extraction step as JSON.
//!
//! ```json
//! {
//!   "pages": [
//!     {
//!       "number": 1, "width": 481.9, "height": 680.3,
//!       "blocks": [{"bbox": [56.7, 60.1, 270.0, 180.4], "text": "..."}],
//!       "words":  [{"bbox": [56.7, 60.1, 80.2, 71.0], "text": "De",
//!                   "block": 0, "line": 0, "size": 10.0}],
//!       "images": [{"bbox": [290.0, 60.0, 425.0, 200.0]}]
//!     }
//!   ],
//!   "bookmarks": [{"level": 1, "title": "1. Inleiding", "page": 3}]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QaError;
use crate::extract::{
    Bookmark, ContentItem, ContentIter, ContentSource, ImageRect, LineKey, TextBlock, Word,
};
use crate::layout::Rect;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDump {
    pub pages: Vec<DumpPage>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpPage {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub blocks: Vec<DumpBlock>,
    #[serde(default)]
    pub words: Vec<DumpWord>,
    #[serde(default)]
    pub images: Vec<DumpImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpBlock {
    pub bbox: Rect,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpWord {
    pub bbox: Rect,
    pub text: String,
    #[serde(default)]
    pub block: u32,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpImage {
    pub bbox: Rect,
}

impl LayoutDump {
    /// Parses a dump and checks that pages are numbered `1..=n` in order.
    pub fn from_json(json: &str) -> Result<Self, QaError> {
        let mut dump: LayoutDump = serde_json::from_str(json)?;
        dump.pages.sort_by_key(|p| p.number);
        for (idx, page) in dump.pages.iter().enumerate() {
            let expected = idx as u32 + 1;
            if page.number != expected {
                return Err(QaError::ContentInvalid(format!(
                    "expected page {expected}, found page {}",
                    page.number
                )));
            }
        }
        Ok(dump)
    }

    pub fn load(path: &Path) -> Result<Self, QaError> {
        let json = std::fs::read_to_string(path)
            .map_err(|_| QaError::ContentUnavailable(path.to_path_buf()))?;
        let dump = Self::from_json(&json)?;
        debug!(
            path = %path.display(),
            pages = dump.pages.len(),
            bookmarks = dump.bookmarks.len(),
            "layout dump loaded"
        );
        Ok(dump)
    }

    fn page(&self, page: u32) -> Result<&DumpPage, QaError> {
        page.checked_sub(1)
            .and_then(|idx| self.pages.get(idx as usize))
            .ok_or(QaError::PageOutOfRange {
                page,
                total: self.page_count(),
            })
    }
}

impl ContentSource for LayoutDump {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<(f64, f64), QaError> {
        let p = self.page(page)?;
        Ok((p.width, p.height))
    }

    fn items(&self, page: u32) -> Result<ContentIter<'_>, QaError> {
        let p = self.page(page)?;
        let blocks = p.blocks.iter().map(|b| {
            ContentItem::TextBlock(TextBlock {
                bbox: b.bbox,
                text: b.text.clone(),
            })
        });
        let words = p.words.iter().map(|w| {
            ContentItem::Word(Word {
                bbox: w.bbox,
                text: w.text.clone(),
                line_key: LineKey {
                    block: w.block,
                    line: w.line,
                },
                font_size: w.size,
            })
        });
        let images = p.images.iter().map(|i| ContentItem::ImageRect(ImageRect { bbox: i.bbox }));
        Ok(Box::new(blocks.chain(words).chain(images)))
    }

    fn bookmarks(&self) -> Vec<Bookmark> {
        self.bookmarks.clone()
    }
}
