//! Pages excluded from gating on one run.
//!
//! Combines a fixed front/back count with bookmark heuristics. Bookmark
//! problems never abort: no outline simply means nothing extra is ignored.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QaError;
use crate::extract::Bookmark;

pub const DEFAULT_CHAPTER_PATTERN: &str = r"^[0-9]+\.";

/// Decides whether a top-level bookmark title opens a numbered chapter.
///
/// Table-of-contents conventions differ per book series, so this is a seam.
pub trait ChapterMatcher {
    fn is_chapter(&self, title: &str) -> bool;
}

/// Matches titles against a regex; the default accepts `"1. Inleiding"`.
#[derive(Debug, Clone)]
pub struct TitlePattern {
    re: Regex,
}

impl TitlePattern {
    pub fn new(pattern: &str) -> Result<Self, QaError> {
        Ok(Self { re: Regex::new(pattern)? })
    }

    pub fn numbered() -> Self {
        Self {
            re: Regex::new(DEFAULT_CHAPTER_PATTERN).expect("static regex"),
        }
    }
}

impl ChapterMatcher for TitlePattern {
    fn is_chapter(&self, title: &str) -> bool {
        self.re.is_match(title.trim())
    }
}

/// What to ignore, as requested on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnorePolicy {
    pub first: u32,
    pub last: u32,
    /// Ignore the page right before every top-level bookmark (short chapter endings).
    pub before_level1: bool,
    /// Ignore every page before the first numbered chapter (front matter).
    pub before_first_chapter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IgnoreSet {
    pages: BTreeSet<u32>,
}

impl IgnoreSet {
    pub fn build(
        policy: &IgnorePolicy,
        page_count: u32,
        bookmarks: &[Bookmark],
        matcher: &dyn ChapterMatcher,
    ) -> Self {
        let mut pages = BTreeSet::new();

        pages.extend(1..=policy.first.min(page_count));
        if policy.last > 0 {
            let start = page_count.saturating_sub(policy.last) + 1;
            pages.extend(start..=page_count);
        }

        if policy.before_first_chapter {
            let first_chapter = bookmarks
                .iter()
                .filter(|b| b.is_top_level())
                .find(|b| matcher.is_chapter(&b.title))
                .map(|b| b.page);
            match first_chapter {
                Some(page) if page > 1 => pages.extend(1..page.min(page_count + 1)),
                Some(_) => {}
                None => debug!("no numbered chapter bookmark found; front matter not ignored"),
            }
        }

        if policy.before_level1 {
            pages.extend(
                bookmarks
                    .iter()
                    .filter(|b| b.is_top_level() && b.page > 1 && b.page <= page_count + 1)
                    .map(|b| b.page - 1),
            );
        }

        Self { pages }
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }
}
