//! Plain page text straight from the PDF (pure Rust, no layout geometry).
//!
//! Only the hyphenation-validity check can work from text alone, so it falls
//! back to this when no layout dump exists.

use std::path::Path;

use tracing::debug;

use crate::errors::QaError;

/// Text of every page, one entry per page, in document order.
pub fn page_texts(pdf: &Path) -> Result<Vec<String>, QaError> {
    let pages = pdf_extract::extract_text_by_pages(pdf)
        .map_err(|e| QaError::PdfText(format!("{e:?}")))?;
    debug!(path = %pdf.display(), pages = pages.len(), "PDF text extracted with pdf_extract");
    Ok(pages)
}

/// Non-empty lines of a page's text, in order.
pub fn text_lines(page_text: &str) -> Vec<String> {
    page_text
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.trim().is_empty())
        .collect()
}
