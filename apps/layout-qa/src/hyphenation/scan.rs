//! Line-break hyphenation scan.
//!
//! Finds every word hyphenated across a line break and checks the break
//! position against the dictionary. Reporting-only unless the caller
//! escalates it.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hyphenation::dictionary::HyphenDictionary;

/// Shortest fragment (in chars) on either side of a break worth checking.
const MIN_FRAGMENT: usize = 2;

fn left_fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^\W_]+)-\s*$").expect("static regex"))
}

fn right_fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([^\W_]+)").expect("static regex"))
}

/// One hyphenated line break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyphenBreak {
    pub page: u32,
    pub left: String,
    pub right: String,
    pub full: String,
    /// Char offset of the break within `full`.
    pub break_pos: usize,
    /// `full` with `-` at every permitted break.
    pub allowed: String,
}

/// Fragments of a word broken between `line` and `next`, if any.
pub fn split_fragments(line: &str, next: &str) -> Option<(String, String)> {
    let left = left_fragment_re().captures(line)?.get(1)?.as_str();
    let right = right_fragment_re().captures(next)?.get(1)?.as_str();
    if left.chars().count() < MIN_FRAGMENT || right.chars().count() < MIN_FRAGMENT {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

/// Accumulates breaks page by page.
#[derive(Debug, Default)]
pub struct HyphenationScan {
    total: usize,
    invalid: Vec<HyphenBreak>,
}

impl HyphenationScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans one page's lines in reading order.
    pub fn scan_page<L: AsRef<str>>(&mut self, dict: &HyphenDictionary, page: u32, lines: &[L]) {
        for pair in lines.windows(2) {
            let Some((left, right)) = split_fragments(pair[0].as_ref(), pair[1].as_ref()) else {
                continue;
            };
            let full = format!("{left}{right}");
            let break_pos = left.chars().count();
            let allowed_positions = dict.break_positions(&full);
            self.total += 1;
            if allowed_positions.contains(&break_pos) {
                continue;
            }
            debug!(page, word = %full, break_pos, "hyphenation break not in dictionary");
            self.invalid.push(HyphenBreak {
                page,
                allowed: dict.inserted(&full),
                left,
                right,
                full,
                break_pos,
            });
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Invalid breaks, de-duplicated by `(lowercase word, break position)`, earliest page kept.
    pub fn finish(self) -> (usize, Vec<HyphenBreak>) {
        let mut invalid = self.invalid;
        invalid.sort_by(|a, b| {
            let ka = (a.page, a.full.to_lowercase(), a.break_pos);
            ka.cmp(&(b.page, b.full.to_lowercase(), b.break_pos))
        });
        let mut seen = HashSet::new();
        invalid.retain(|b| seen.insert((b.full.to_lowercase(), b.break_pos)));
        (self.total, invalid)
    }
}

/// Serialisable result of a hyphenation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyphenationReport {
    pub pdf: String,
    pub pages: u32,
    pub hyphenated_linebreaks: usize,
    pub invalid_count: usize,
    pub invalid: Vec<HyphenBreak>,
}

impl HyphenationReport {
    pub fn new(pdf: String, pages: u32, scan: HyphenationScan) -> Self {
        let (hyphenated_linebreaks, invalid) = scan.finish();
        Self {
            pdf,
            pages,
            hyphenated_linebreaks,
            invalid_count: invalid.len(),
            invalid,
        }
    }
}
