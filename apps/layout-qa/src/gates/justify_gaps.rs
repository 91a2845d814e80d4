//! Justification-Gap gate — flags justified lines with extreme inter-word spacing.
//!
//! Full justification can spread a line with few break opportunities into
//! "rivers" of white space. Only near-full lines are inspected; a short final
//! line of a paragraph is never stretched, so it is excluded by construction.
//!
//! # Rule
//! Per column, words are grouped into lines by `(block, line)`. A line is
//! inspected iff it has ≥ 2 words and spans `≥ min_span_ratio` (0.85) of the
//! column width. The gap after a leading list marker (`•`, dash, step number)
//! is skipped. Violation iff the largest positive adjacent gap exceeds
//! `max_gap_pt` (18pt), or `box_max_gap_pt` (12pt) on the opening line of a
//! "praktijk"/"verdieping" call-out box.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QaError;
use crate::extract::{ContentSource, LineKey, Word};
use crate::gates::{
    require_non_negative, require_unit_ratio, round1, round3, scan_pages, GateKind, IgnoreSet,
    Violation, ViolationDetail, BULLET,
};
use crate::layout::{Column, LayoutConfig, PageGeometry};

/// Tokens that open a call-out box line, compared case-insensitively.
const BOX_LABELS: [&str; 2] = ["praktijk:", "verdieping:"];

/// Longest line text kept in a violation.
const MAX_LINE_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JustifyThresholds {
    pub max_gap_pt: f64,
    pub box_max_gap_pt: f64,
    pub min_span_ratio: f64,
}

impl Default for JustifyThresholds {
    fn default() -> Self {
        Self {
            max_gap_pt: 18.0,
            box_max_gap_pt: 12.0,
            min_span_ratio: 0.85,
        }
    }
}

impl JustifyThresholds {
    pub fn validate(&self) -> Result<(), QaError> {
        require_non_negative("--max-gap-pt", self.max_gap_pt)?;
        require_non_negative("--box-max-gap-pt", self.box_max_gap_pt)?;
        require_unit_ratio("--min-span-ratio", self.min_span_ratio)
    }
}

/// List bullet, dash, or a bare step number.
pub fn is_marker_token(token: &str) -> bool {
    let t = token.trim();
    if t.is_empty() {
        return false;
    }
    let mut chars = t.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c == BULLET || matches!(c, '-' | '–' | '—') {
            return true;
        }
    }
    t.chars().all(|c| c.is_ascii_digit())
}

pub fn is_box_line(tokens: &[&str]) -> bool {
    tokens
        .iter()
        .any(|t| BOX_LABELS.iter().any(|label| t.trim().eq_ignore_ascii_case(label)))
}

/// Measured spacing of one inspected line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGaps {
    pub span_ratio: f64,
    /// `None` when no positive gap remains after marker skipping.
    pub max_gap: Option<f64>,
    pub box_line: bool,
}

/// Measures a line of words sorted by `x0`. Returns `None` for lines that are not inspected.
pub fn measure_line(words: &[Word], column_width: f64, min_span_ratio: f64) -> Option<LineGaps> {
    if words.len() < 2 || column_width <= 0.0 {
        return None;
    }
    let first = words.first()?;
    let last = words.last()?;
    let span_ratio = (last.bbox.x1 - first.bbox.x0) / column_width;
    if span_ratio < min_span_ratio {
        return None;
    }

    let tokens: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
    let box_line = is_box_line(&tokens);
    let start = if !box_line && is_marker_token(tokens[0]) { 1 } else { 0 };

    let max_gap = words
        .windows(2)
        .skip(start)
        .map(|pair| pair[1].bbox.x0 - pair[0].bbox.x1)
        .filter(|g| *g > 0.0)
        .reduce(f64::max);

    Some(LineGaps {
        span_ratio,
        max_gap,
        box_line,
    })
}

pub fn check_page<S>(
    source: &S,
    geometry: &PageGeometry,
    thresholds: &JustifyThresholds,
) -> Result<Vec<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    let mut lines: BTreeMap<(Column, LineKey), Vec<Word>> = BTreeMap::new();
    for word in source.words(geometry.page_number)? {
        if word.text.trim().is_empty() || !geometry.in_body(&word.bbox) {
            continue;
        }
        let Some(column) = geometry.column_at(word.bbox.center_x()) else {
            continue;
        };
        lines.entry((column, word.line_key)).or_default().push(word);
    }

    let mut violations = Vec::new();
    for ((column, _key), mut words) in lines {
        words.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        let Some(gaps) = measure_line(&words, geometry.column_width, thresholds.min_span_ratio)
        else {
            continue;
        };
        let Some(max_gap) = gaps.max_gap else {
            continue;
        };
        let limit = if gaps.box_line {
            thresholds.box_max_gap_pt
        } else {
            thresholds.max_gap_pt
        };
        if max_gap <= limit {
            continue;
        }

        let line: String = words
            .iter()
            .map(|w| w.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(MAX_LINE_CHARS)
            .collect();
        debug!(
            page = geometry.page_number,
            col = column.label(),
            max_gap,
            "wide justification gap"
        );
        violations.push(Violation {
            page: geometry.page_number,
            gate: GateKind::JustifyGap,
            reason: format!(
                "col={} span={:.3} max_gap={:.1} :: {}",
                column.label(),
                gaps.span_ratio,
                max_gap,
                line
            ),
            detail: ViolationDetail::JustifyGap {
                column,
                max_gap_pt: round1(max_gap),
                span_ratio: round3(gaps.span_ratio),
                limit_pt: limit,
                box_line: gaps.box_line,
                line,
            },
        });
    }
    Ok(violations)
}

pub fn run<S>(
    source: &S,
    config: &LayoutConfig,
    ignore: &IgnoreSet,
    thresholds: &JustifyThresholds,
) -> Result<Vec<Violation>, QaError>
where
    S: ContentSource + ?Sized,
{
    thresholds.validate()?;
    scan_pages(source, config, ignore, |g| check_page(source, g, thresholds))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::dump::{DumpPage, DumpWord};
    use crate::gates::fixtures::*;
    use proptest::prelude::*;

    // Left column [30,290], width 260 → a line must span ≥ 221pt.

    /// Lays out `tokens` left to right on one line starting at `x0`, each 30pt wide,
    /// separated by `gaps` (one per adjacent pair).
    fn line_words(x0: f64, tokens: &[&str], gaps: &[f64], line: u32) -> Vec<DumpWord> {
        let mut x = x0;
        let mut out = Vec::new();
        for (i, t) in tokens.iter().enumerate() {
            out.push(word(x, x + 30.0, 100.0 + line as f64 * 12.0, t, 0, line, Some(10.0)));
            x += 30.0 + gaps.get(i).copied().unwrap_or(0.0);
        }
        out
    }

    fn check(words: Vec<DumpWord>) -> Vec<Violation> {
        let mut p: DumpPage = page(1);
        p.words = words;
        let d = doc(vec![p]);
        let g = PageGeometry::compute(1, 600.0, 800.0, &config());
        check_page(&d, &g, &JustifyThresholds::default()).unwrap()
    }

    #[test]
    fn test_wide_gap_on_full_line_flagged() {
        // 5 words × 30 + gaps 4+4+60+4 = 222 → span 0.854
        let words =
            line_words(35.0, &["De", "zorg", "voor", "de", "patiënt"], &[4.0, 4.0, 60.0, 4.0], 0);
        let v = check(words);
        assert_eq!(v.len(), 1);
        match &v[0].detail {
            ViolationDetail::JustifyGap {
                column,
                max_gap_pt,
                box_line,
                ..
            } => {
                assert_eq!(*column, Column::Left);
                assert_eq!(*max_gap_pt, 60.0);
                assert!(!box_line);
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_tight_full_line_passes() {
        let words = line_words(35.0, &["a", "b", "c", "d", "e", "f", "g"], &[6.0; 6], 0);
        assert!(check(words).is_empty());
    }

    #[test]
    fn test_short_last_line_ignored() {
        // span (30+40+30)/260 < 0.85 even with a 40pt gap
        let words = line_words(35.0, &["einde", "zin"], &[40.0], 0);
        assert!(check(words).is_empty());
    }

    #[test]
    fn test_bullet_marker_gap_skipped() {
        let words = line_words(
            35.0,
            &["•", "De", "zorg", "voor", "de", "patiënt"],
            &[30.0, 4.0, 4.0, 4.0, 4.0],
            0,
        );
        assert!(check(words).is_empty());
    }

    #[test]
    fn test_step_number_marker_gap_skipped() {
        let words = line_words(
            35.0,
            &["12", "Meet", "de", "bloeddruk", "heel", "goed"],
            &[45.0, 5.0, 5.0, 5.0, 5.0],
            0,
        );
        assert!(check(words).is_empty());
    }

    #[test]
    fn test_box_line_uses_stricter_limit() {
        // max gap 15: within 18pt but over the 12pt box limit
        let words = line_words(
            35.0,
            &["In", "de", "Praktijk:", "Bij", "een", "cliënt"],
            &[8.0, 8.0, 15.0, 8.0, 8.0],
            0,
        );
        let v = check(words);
        assert_eq!(v.len(), 1);
        match &v[0].detail {
            ViolationDetail::JustifyGap { box_line, limit_pt, .. } => {
                assert!(*box_line);
                assert_eq!(*limit_pt, 12.0);
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_box_line_does_not_skip_marker_gap() {
        let words = line_words(
            35.0,
            &["•", "verdieping:", "de", "long", "en", "hart"],
            &[14.0, 8.0, 8.0, 8.0, 8.0],
            0,
        );
        assert_eq!(check(words).len(), 1);
    }

    #[test]
    fn test_overlapping_words_have_no_positive_gap() {
        // 8 words, 30pt wide, each starting 28pt after the previous: span 226
        let words: Vec<Word> = (0..8)
            .map(|i| {
                let x0 = 35.0 + 28.0 * i as f64;
                Word {
                    bbox: crate::layout::Rect::new(x0, 100.0, x0 + 30.0, 110.0),
                    text: "w".into(),
                    line_key: LineKey { block: 0, line: 0 },
                    font_size: None,
                }
            })
            .collect();
        let gaps = measure_line(&words, 260.0, 0.85).unwrap();
        assert_eq!(gaps.max_gap, None);
    }

    #[test]
    fn test_words_in_gutter_and_footer_ignored() {
        let mut words =
            line_words(35.0, &["De", "zorg", "voor", "de", "patiënt"], &[4.0, 4.0, 60.0, 4.0], 0);
        for w in &mut words {
            w.bbox.y0 = 770.0;
            w.bbox.y1 = 780.0;
        }
        assert!(check(words).is_empty());
    }

    #[test]
    fn test_marker_tokens() {
        for t in ["•", "-", "–", "—", "3", "12"] {
            assert!(is_marker_token(t), "{t}");
        }
        for t in ["", "a", "1.", "--", "•x"] {
            assert!(!is_marker_token(t), "{t}");
        }
    }

    proptest! {
        #[test]
        fn prop_short_lines_never_flagged(
            gaps in proptest::collection::vec(0.0f64..30.0, 1..6),
            width in 5.0f64..10.0,
        ) {
            // at most 6×10 + 5×30 = 210pt, below 0.85 × 260
            let mut x = 35.0;
            let mut ws = Vec::new();
            for i in 0..=gaps.len() {
                ws.push(Word {
                    bbox: crate::layout::Rect::new(x, 100.0, x + width, 110.0),
                    text: "w".into(),
                    line_key: LineKey { block: 0, line: 0 },
                    font_size: None,
                });
                x += width + gaps.get(i).copied().unwrap_or(0.0);
            }
            prop_assert!(measure_line(&ws, 260.0, 0.85).is_none());
        }
    }
}
