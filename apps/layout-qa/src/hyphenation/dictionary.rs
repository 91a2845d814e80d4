//! Liang hyphenation patterns in the LibreOffice/pyphen `.dic` format.
//!
//! ```text
//! ISO8859-1
//! LEFTHYPHENMIN 2
//! RIGHTHYPHENMIN 2
//! % comment
//! .aan5
//! 2b1l
//! ```
//!
//! The first line names the charset. A pattern interleaves letters with
//! priority digits; odd priorities allow a break, even ones forbid it, and the
//! highest priority at a position wins. Non-standard patterns (`/` suffix with
//! replacement rules) are reduced to their standard part.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::QaError;

const DEFAULT_LEFT_MIN: usize = 2;
const DEFAULT_RIGHT_MIN: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct HyphenDictionary {
    /// Pattern letters → priority per inter-letter position (`letters + 1` entries).
    patterns: HashMap<String, Vec<u8>>,
    /// Longest pattern, in chars.
    max_len: usize,
    pub left_min: usize,
    pub right_min: usize,
}

impl HyphenDictionary {
    pub fn parse(text: &str) -> Self {
        let mut dict = Self {
            patterns: HashMap::new(),
            max_len: 0,
            left_min: DEFAULT_LEFT_MIN,
            right_min: DEFAULT_RIGHT_MIN,
        };

        // first line is the charset name
        for line in text.lines().skip(1) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("LEFTHYPHENMIN") => {
                    dict.left_min = parse_min(parts.next(), "LEFTHYPHENMIN", DEFAULT_LEFT_MIN);
                    continue;
                }
                Some("RIGHTHYPHENMIN") => {
                    dict.right_min = parse_min(parts.next(), "RIGHTHYPHENMIN", DEFAULT_RIGHT_MIN);
                    continue;
                }
                Some(d) if d.chars().all(|c| c.is_ascii_uppercase() || c == '-') => {
                    // COMPOUNDLEFTHYPHENMIN, NOHYPHEN, NEXTLEVEL, ...
                    continue;
                }
                _ => {}
            }
            for token in line.split_whitespace() {
                let standard = token.split('/').next().unwrap_or_default();
                dict.insert_pattern(standard);
            }
        }
        dict
    }

    /// Loads a `.dic` file. ISO8859-1 files are decoded byte-per-char; anything else as UTF-8.
    pub fn load(path: &Path) -> Result<Self, QaError> {
        let bytes =
            std::fs::read(path).map_err(|e| {
                QaError::DictionaryUnavailable(format!("{}: {e}", path.display()))
            })?;
        let charset_end = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
        let charset = String::from_utf8_lossy(&bytes[..charset_end]).trim().to_ascii_uppercase();

        let text = if charset == "ISO8859-1" || charset == "ISO-8859-1" {
            bytes.iter().map(|&b| b as char).collect::<String>()
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };

        let dict = Self::parse(&text);
        if dict.is_empty() {
            return Err(QaError::DictionaryUnavailable(format!(
                "{}: no hyphenation patterns found",
                path.display()
            )));
        }
        debug!(
            path = %path.display(),
            charset = %charset,
            patterns = dict.len(),
            left_min = dict.left_min,
            right_min = dict.right_min,
            "hyphenation dictionary loaded"
        );
        Ok(dict)
    }

    fn insert_pattern(&mut self, pattern: &str) {
        let mut letters = String::new();
        let mut values = vec![0u8];
        for c in pattern.chars() {
            if let Some(d) = c.to_digit(10) {
                if let Some(last) = values.last_mut() {
                    *last = d as u8;
                }
            } else {
                letters.extend(c.to_lowercase());
                values.push(0);
            }
        }
        if letters.is_empty() {
            return;
        }
        self.max_len = self.max_len.max(letters.chars().count());
        self.patterns.insert(letters, values);
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Permitted break positions in `word`, as char offsets (a break at `p` splits
    /// the word into `word[..p]` and `word[p..]`), ascending.
    pub fn break_positions(&self, word: &str) -> Vec<usize> {
        let chars: Vec<char> = word.chars().collect();
        let n = chars.len();
        if n < self.left_min + self.right_min || self.is_empty() {
            return Vec::new();
        }

        // Lowercase char-by-char so offsets stay aligned with `word`.
        let mut padded = vec!['.'];
        padded.extend(chars.iter().map(|c| c.to_lowercase().next().unwrap_or(*c)));
        padded.push('.');

        let mut points = vec![0u8; padded.len() + 1];
        let mut key = String::new();
        for start in 0..padded.len() {
            key.clear();
            for end in start..padded.len().min(start + self.max_len) {
                key.push(padded[end]);
                if let Some(values) = self.patterns.get(&key) {
                    for (k, v) in values.iter().enumerate() {
                        let slot = &mut points[start + k];
                        *slot = (*slot).max(*v);
                    }
                }
            }
        }

        // break before word char `p` sits at padded position `p + 1`
        (self.left_min.max(1)..=n.saturating_sub(self.right_min.max(1)))
            .filter(|p| points[p + 1] % 2 == 1)
            .collect()
    }

    /// `word` with `-` inserted at every permitted break, e.g. `"ver-pleeg-kun-di-ge"`.
    pub fn inserted(&self, word: &str) -> String {
        let breaks = self.break_positions(word);
        let mut out = String::with_capacity(word.len() + breaks.len());
        for (i, c) in word.chars().enumerate() {
            if breaks.binary_search(&i).is_ok() {
                out.push('-');
            }
            out.push(c);
        }
        out
    }
}

fn parse_min(value: Option<&str>, name: &str, default: usize) -> usize {
    match value.map(str::parse::<usize>) {
        Some(Ok(v)) => v,
        _ => {
            warn!(
                directive = name,
                value = ?value,
                default,
                "malformed hyphen minimum, using default"
            );
            default
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Classic Liang example patterns for "hyphenation".
    const EN_SAMPLE: &str = "UTF-8
LEFTHYPHENMIN 2
RIGHTHYPHENMIN 3
% sample
hy3ph
he2n
hena4
hen5at
1na
n2at
1tio
2io
o2n
";

    // ── parsing ──

    #[test]
    fn test_parse_reads_minimums_and_patterns() {
        let d = HyphenDictionary::parse(EN_SAMPLE);
        assert_eq!(d.left_min, 2);
        assert_eq!(d.right_min, 3);
        assert_eq!(d.len(), 9);
    }

    #[test]
    fn test_defaults_when_minimums_absent() {
        let d = HyphenDictionary::parse("UTF-8\na1b\n");
        assert_eq!((d.left_min, d.right_min), (2, 2));
    }

    #[test]
    fn test_nonstandard_suffix_and_directives_ignored() {
        let d =
            HyphenDictionary::parse("UTF-8\nNOHYPHEN -,'\nCOMPOUNDLEFTHYPHENMIN 2\nc1k/k=k,1,2\n");
        assert_eq!(d.len(), 1);
        assert_eq!(d.inserted("acka"), "ac-ka");
    }

    #[test]
    fn test_malformed_minimum_falls_back() {
        let d = HyphenDictionary::parse("UTF-8\nLEFTHYPHENMIN x\n");
        assert_eq!(d.left_min, 2);
    }

    // ── breaking ──

    #[test]
    fn test_liang_hyphenation_example() {
        let d = HyphenDictionary::parse(EN_SAMPLE);
        assert_eq!(d.inserted("hyphenation"), "hy-phen-ation");
        assert_eq!(d.break_positions("hyphenation"), vec![2, 6]);
    }

    #[test]
    fn test_case_preserved_in_inserted() {
        let d = HyphenDictionary::parse(EN_SAMPLE);
        assert_eq!(d.inserted("Hyphenation"), "Hy-phen-ation");
    }

    #[test]
    fn test_minimums_suppress_edge_breaks() {
        let d = HyphenDictionary::parse("UTF-8\nLEFTHYPHENMIN 2\nRIGHTHYPHENMIN 2\n1b\n1c\n1d\n");
        // every letter but a allows a break before it; only "ab-cd" respects 2/2
        assert_eq!(d.inserted("abcd"), "ab-cd");
        assert!(d.break_positions("abc").is_empty());
    }

    #[test]
    fn test_even_priority_wins_over_odd() {
        let d = HyphenDictionary::parse("UTF-8\n1b\na2b\n");
        assert!(d.break_positions("aabb").is_empty());
    }

    #[test]
    fn test_multibyte_letters() {
        let d = HyphenDictionary::parse("UTF-8\n1ë\n");
        assert_eq!(d.inserted("poëzie"), "po-ëzie");
    }

    // ── loading ──

    #[test]
    fn test_load_latin1_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"ISO8859-1\n1\xeb\n").unwrap();
        let d = HyphenDictionary::load(f.path()).unwrap();
        assert_eq!(d.inserted("poëzie"), "po-ëzie");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = HyphenDictionary::load(&dir.path().join("nl_NL.dic")).unwrap_err();
        assert!(matches!(err, QaError::DictionaryUnavailable(_)));
    }

    #[test]
    fn test_load_file_without_patterns() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"UTF-8\n% nothing here\n").unwrap();
        assert!(matches!(
            HyphenDictionary::load(f.path()),
            Err(QaError::DictionaryUnavailable(_))
        ));
    }
}
