// Layout gates: independent, stateless checks over page geometry + extracted content.
// Each gate folds pages in order and returns its violations; nothing carries across pages.

pub mod bullet_orphans;
pub mod column_balance;
pub mod heading_hyphenation;
pub mod ignore;
pub mod justify_gaps;
pub mod page_fill;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QaError;
use crate::extract::ContentSource;
use crate::layout::{Column, LayoutConfig, PageGeometry};

pub use ignore::{IgnorePolicy, IgnoreSet, TitlePattern};

/// Text blocks smaller than this (pt²) are stray marks, not content.
pub const MIN_BLOCK_AREA: f64 = 200.0;

/// Bullet glyph used by the template's lists.
pub const BULLET: char = '•';

// ────────────────────────────────────────────────────────────────────────────
// Violations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateKind {
    PageFill,
    ColumnBalance,
    JustifyGap,
    HeadingHyphenation,
    BulletOrphanSplit,
    HyphenationValidity,
}

impl GateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::PageFill => "page-fill",
            GateKind::ColumnBalance => "column-balance",
            GateKind::JustifyGap => "justify-gap",
            GateKind::HeadingHyphenation => "heading-hyphenation",
            GateKind::BulletOrphanSplit => "bullet-orphan-split",
            GateKind::HyphenationValidity => "hyphenation-validity",
        }
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate-specific measurements behind a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViolationDetail {
    PageFill {
        used_ratio: f64,
        y_max: f64,
        body_y0: f64,
        body_y1: f64,
    },
    ColumnBalance {
        full_side: Column,
        left_coverage: f64,
        right_coverage: f64,
        left_blocks: usize,
        right_blocks: usize,
    },
    JustifyGap {
        column: Column,
        max_gap_pt: f64,
        span_ratio: f64,
        limit_pt: f64,
        box_line: bool,
        line: String,
    },
    HeadingHyphenation {
        line1: String,
        line2: String,
        size_pt: f64,
    },
    BulletOrphanSplit {
        left_bullets: usize,
        right_bullets: usize,
        singleton: Column,
        singleton_bottom_ratio: f64,
        other_top_ratio: f64,
    },
}

/// One failed check on one page. Write-once: produced by a gate, read by the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub page: u32,
    pub gate: GateKind,
    pub detail: ViolationDetail,
    pub reason: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Page iteration
// ────────────────────────────────────────────────────────────────────────────

/// Runs `check` on every non-ignored page in page order, concatenating the results.
///
/// Pages without a positive size are skipped (nothing to measure against).
pub fn scan_pages<S, F>(
    source: &S,
    config: &LayoutConfig,
    ignore: &IgnoreSet,
    mut check: F,
) -> Result<Vec<Violation>, QaError>
where
    S: ContentSource + ?Sized,
    F: FnMut(&PageGeometry) -> Result<Vec<Violation>, QaError>,
{
    let mut violations = Vec::new();
    for page in 1..=source.page_count() {
        if ignore.contains(page) {
            continue;
        }
        let Some(geometry) = page_geometry(source, page, config)? else {
            debug!(page, "page has no area, skipped");
            continue;
        };
        violations.extend(check(&geometry)?);
    }
    Ok(violations)
}

/// Geometry of `page`, or `None` when the page reports a non-positive size.
pub fn page_geometry<S>(
    source: &S,
    page: u32,
    config: &LayoutConfig,
) -> Result<Option<PageGeometry>, QaError>
where
    S: ContentSource + ?Sized,
{
    let (width, height) = source.page_size(page)?;
    if width <= 0.0 || height <= 0.0 {
        return Ok(None);
    }
    Ok(Some(PageGeometry::compute(page, width, height, config)))
}

/// Errors unless `value` lies in `(0, 1]`.
pub fn require_unit_ratio(name: &str, value: f64) -> Result<(), QaError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(QaError::InvalidThreshold(format!("{name} must be in (0, 1], got {value}")))
    }
}

/// Errors unless `value` is finite and not negative.
pub fn require_non_negative(name: &str, value: f64) -> Result<(), QaError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(QaError::InvalidThreshold(format!("{name} must be >= 0, got {value}")))
    }
}

/// Rounds to 3 decimals for stable reporting.
pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Rounds to 1 decimal for stable reporting.
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ────────────────────────────────────────────────────────────────────────────
// Test fixtures
// ────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_scan_pages_skips_ignored_and_empty_pages() {
        let mut zero = page(2);
        zero.width = 0.0;
        let d = doc(vec![page(1), zero, page(3)]);
        let ignore = IgnoreSet::build(
            &IgnorePolicy {
                first: 1,
                ..Default::default()
            },
            3,
            &[],
            &TitlePattern::numbered(),
        );
        let mut seen = Vec::new();
        scan_pages(&d, &config(), &ignore, |g| {
            seen.push(g.page_number);
            Ok(vec![])
        })
        .unwrap();
        assert_eq!(seen, vec![3]);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(require_unit_ratio("--min-used", 0.6).is_ok());
        assert!(require_unit_ratio("--min-used", 1.0).is_ok());
        assert!(require_unit_ratio("--min-used", 0.0).is_err());
        assert!(require_unit_ratio("--min-used", 1.5).is_err());
        assert!(require_non_negative("--max-gap-pt", -1.0).is_err());
        assert!(require_non_negative("--max-gap-pt", f64::NAN).is_err());
    }

    #[test]
    fn test_gate_kind_serializes_kebab() {
        assert_eq!(
            serde_json::to_string(&GateKind::BulletOrphanSplit).unwrap(),
            "\"bullet-orphan-split\""
        );
        assert_eq!(GateKind::PageFill.to_string(), "page-fill");
    }
}
