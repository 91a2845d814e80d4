//! Heading-Hyphenation gate — flags words broken across two heading-sized lines.
//!
//! Headings should only break at word boundaries. This is a typographic rule,
//! so a break is flagged even when it is linguistically valid.
//!
//! # Rule
//! For adjacent lines `(a, b)` of the same block where both have a maximal
//! font size `≥ body_size + delta` (1.5pt): violation iff `a` ends with `-`
//! (trailing whitespace ignored) and `b` starts with a letter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QaError;
use crate::extract::{ContentSource, TextLine};
use crate::gates::{
    require_non_negative, scan_pages, GateKind, IgnoreSet, Violation, ViolationDetail,
};
use crate::layout::{LayoutConfig, PageGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingThresholds {
    /// Points above the body size from which a line counts as heading-sized.
    pub delta_pt: f64,
}

impl Default for HeadingThresholds {
    fn default() -> Self {
        Self { delta_pt: 1.5 }
    }
}

impl HeadingThresholds {
    pub fn validate(&self) -> Result<(), QaError> {
        require_non_negative("--delta-pt", self.delta_pt)
    }

    pub fn heading_size(&self, body_size: f64) -> f64 {
        body_size + self.delta_pt
    }
}

pub fn ends_with_hyphen(text: &str) -> bool {
    text.trim_end().ends_with('-')
}

pub fn starts_with_letter(text: &str) -> bool {
    text.trim_start().chars().next().is_some_and(char::is_alphabetic)
}

/// Violations among `lines` (ordered by block, then line) for one page.
pub fn check_lines(page: u32, lines: &[TextLine], min_size: f64) -> Vec<Violation> {
    lines
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            if a.key.block != b.key.block {
                return None;
            }
            if a.max_font_size < min_size || b.max_font_size < min_size {
                return None;
            }
            if !ends_with_hyphen(&a.text) || !starts_with_letter(&b.text) {
                return None;
            }
            let size_pt = a.max_font_size.max(b.max_font_size);
            let (line1, line2) = (a.text.trim().to_string(), b.text.trim().to_string());
            Some(Violation {
                page,
                gate: GateKind::HeadingHyphenation,
                reason: format!("(size~{size_pt:.2}pt): \"{line1}\" + \"{line2}\""),
                detail: ViolationDetail::HeadingHyphenation {
                    line1,
                    line2,
                    size_pt: (size_pt * 100.0).round() / 100.0,
                },
            })
        })
        .collect()
}

pub fn check_page<S>(
    source: &S,
    geometry: &PageGeometry,
    min_size: f64,
) -> Result<Vec<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    let lines = source.lines(geometry.page_number)?;
    let found = check_lines(geometry.page_number, &lines, min_size);
    if !found.is_empty() {
        debug!(page = geometry.page_number, count = found.len(), "hyphenated heading lines");
    }
    Ok(found)
}

pub fn run<S>(
    source: &S,
    config: &LayoutConfig,
    ignore: &IgnoreSet,
    thresholds: &HeadingThresholds,
) -> Result<Vec<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    thresholds.validate()?;
    let min_size = thresholds.heading_size(config.body_size);
    scan_pages(source, config, ignore, |g| check_page(source, g, min_size))
}
