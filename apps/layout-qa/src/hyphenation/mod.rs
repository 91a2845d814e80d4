// Hyphenation-Validity check: line-final hyphens whose break position the
// language's pattern dictionary does not permit.

pub mod dictionary;
pub mod scan;

use std::path::Path;

use tracing::info;

use crate::errors::QaError;
use crate::extract::{pdf_text, ContentSource};
use crate::gates::{IgnorePolicy, IgnoreSet, TitlePattern};

pub use dictionary::HyphenDictionary;
pub use scan::{HyphenationReport, HyphenationScan};

/// Scans the lines of an extracted layout, in block/line order per page.
pub fn scan_source<S>(
    source: &S,
    dict: &HyphenDictionary,
    ignore: &IgnoreSet,
    pdf: &Path,
) -> Result<HyphenationReport, QaError>
where
    S: ContentSource + ?Sized,
{
    let mut scan = HyphenationScan::new();
    for page in 1..=source.page_count() {
        if ignore.contains(page) {
            continue;
        }
        let lines: Vec<String> = source.lines(page)?.into_iter().map(|l| l.text).collect();
        scan.scan_page(dict, page, &lines);
    }
    info!(breaks = scan.total(), "hyphenation scan finished (layout dump)");
    Ok(HyphenationReport::new(pdf.display().to_string(), source.page_count(), scan))
}

/// Scans plain page text pulled from the PDF itself.
///
/// The PDF carries no outline here, so only the front/back counts of `policy` apply.
pub fn scan_pdf_text(
    pdf: &Path,
    dict: &HyphenDictionary,
    policy: &IgnorePolicy,
) -> Result<HyphenationReport, QaError> {
    let pages = pdf_text::page_texts(pdf)?;
    let ignore = IgnoreSet::build(policy, pages.len() as u32, &[], &TitlePattern::numbered());
    let mut scan = HyphenationScan::new();
    for (page, text) in (1u32..).zip(pages.iter()) {
        if ignore.contains(page) {
            continue;
        }
        scan.scan_page(dict, page, &pdf_text::text_lines(text));
    }
    info!(breaks = scan.total(), "hyphenation scan finished (pdf text)");
    Ok(HyphenationReport::new(pdf.display().to_string(), pages.len() as u32, scan))
}
