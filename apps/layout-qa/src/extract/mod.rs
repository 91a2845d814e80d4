// Content Extractor contract: what the gates read from a rendered PDF.
// The geometry itself is produced upstream; `dump` reads that output, `pdf_text`
// is a text-only fallback straight from the PDF.

pub mod dump;
pub mod pdf_text;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::QaError;
use crate::layout::Rect;

pub use dump::LayoutDump;

// ────────────────────────────────────────────────────────────────────────────
// Content items
// ────────────────────────────────────────────────────────────────────────────

/// Groups words that share one visual line: `(block, line)` as numbered by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub block: u32,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: Rect,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub bbox: Rect,
    pub text: String,
    pub line_key: LineKey,
    /// Font size of the span the word came from, when the extractor knows it.
    pub font_size: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageRect {
    pub bbox: Rect,
}

/// One piece of page content. Read-only and ephemeral: gates never keep these past a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    TextBlock(TextBlock),
    Word(Word),
    ImageRect(ImageRect),
}

/// A document outline entry. `level == 1` is a top-level bookmark (chapter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(default = "top_level")]
    pub level: u32,
    pub title: String,
    pub page: u32,
}

fn top_level() -> u32 {
    1
}

impl Bookmark {
    pub fn is_top_level(&self) -> bool {
        self.level == 1
    }
}

/// A visual line rebuilt from the words sharing one `LineKey`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub key: LineKey,
    pub bbox: Rect,
    /// Words joined by single spaces, left to right.
    pub text: String,
    /// Words sorted by `x0`.
    pub words: Vec<Word>,
    /// Largest known font size on the line; 0 when the extractor gave none.
    pub max_font_size: f64,
}

/// Groups words into lines ordered by `(block, line)`. Blank words are dropped.
pub fn group_lines(words: impl IntoIterator<Item = Word>) -> Vec<TextLine> {
    let mut by_key: BTreeMap<LineKey, Vec<Word>> = BTreeMap::new();
    for word in words {
        if word.text.trim().is_empty() {
            continue;
        }
        by_key.entry(word.line_key).or_default().push(word);
    }

    by_key
        .into_iter()
        .map(|(key, mut words)| {
            words.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            let bbox = words
                .iter()
                .skip(1)
                .fold(words[0].bbox, |acc, w| acc.union(&w.bbox));
            let text = words.iter().map(|w| w.text.trim()).collect::<Vec<_>>().join(" ");
            let max_font_size = words.iter().filter_map(|w| w.font_size).fold(0.0_f64, f64::max);
            TextLine {
                key,
                bbox,
                text,
                words,
                max_font_size,
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Source trait
// ────────────────────────────────────────────────────────────────────────────

pub type ContentIter<'a, T = ContentItem> = Box<dyn Iterator<Item = T> + 'a>;

/// Read-only view of an extracted document. Pages are 1-based.
pub trait ContentSource {
    fn page_count(&self) -> u32;

    /// `(width, height)` in points.
    fn page_size(&self, page: u32) -> Result<(f64, f64), QaError>;

    /// All content on `page`, lazily.
    fn items(&self, page: u32) -> Result<ContentIter<'_>, QaError>;

    fn bookmarks(&self) -> Vec<Bookmark>;

    /// Text blocks whose text is non-empty after trimming.
    fn text_blocks(&self, page: u32) -> Result<ContentIter<'_, TextBlock>, QaError> {
        Ok(Box::new(self.items(page)?.filter_map(|item| match item {
            ContentItem::TextBlock(b) if !b.text.trim().is_empty() => Some(b),
            _ => None,
        })))
    }

    fn words(&self, page: u32) -> Result<ContentIter<'_, Word>, QaError> {
        Ok(Box::new(self.items(page)?.filter_map(|item| match item {
            ContentItem::Word(w) => Some(w),
            _ => None,
        })))
    }

    fn images(&self, page: u32) -> Result<ContentIter<'_, ImageRect>, QaError> {
        Ok(Box::new(self.items(page)?.filter_map(|item| match item {
            ContentItem::ImageRect(i) => Some(i),
            _ => None,
        })))
    }

    /// Lines rebuilt from `words`, in block/line order.
    fn lines(&self, page: u32) -> Result<Vec<TextLine>, QaError> {
        Ok(group_lines(self.words(page)?))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
