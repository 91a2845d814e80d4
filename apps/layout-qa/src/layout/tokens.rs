//! Layout Configuration Loader — reads the template's design tokens.
//!
//! The print template publishes its geometry as CSS custom properties in a
//! root block:
//!
//! ```text
//! :root {
//!   --margin-top: 20mm;
//!   --col-gap: 9mm;
//!   --body-size: 10pt;
//! }
//! ```
//!
//! Only `mm` and `pt` lengths are understood. Anything else is skipped with a
//! warning and the consumer falls back to its own default for that variable.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::QaError;

pub const PT_PER_MM: f64 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

fn root_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":root\s*\{([\s\S]*?)\}").expect("static regex"))
}

fn declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(--[A-Za-z0-9_-]+)\s*:\s*([^;]+);").expect("static regex"))
}

fn length_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9.]+)\s*(mm|pt)$").expect("static regex"))
}

// ────────────────────────────────────────────────────────────────────────────
// Token map
// ────────────────────────────────────────────────────────────────────────────

/// Variable name (with its leading `--`) → length in points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutTokens {
    lengths: HashMap<String, f64>,
}

impl LayoutTokens {
    /// Parses tokens CSS. Missing root block → empty map; bad entries are skipped.
    pub fn parse(css: &str) -> Self {
        let Some(inner) = root_block_re().captures(css).and_then(|c| c.get(1)) else {
            debug!("tokens: no :root block found");
            return Self::default();
        };

        let mut lengths = HashMap::new();
        for cap in declaration_re().captures_iter(inner.as_str()) {
            let name = cap[1].trim().to_string();
            let raw = cap[2].trim();
            match parse_length_pt(raw) {
                Some(pt) => {
                    lengths.insert(name, pt);
                }
                None => {
                    warn!(
                        variable = %name,
                        value = raw,
                        "tokens: not an mm/pt length, using default"
                    );
                }
            }
        }
        Self { lengths }
    }

    /// Reads and parses a tokens file. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, QaError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Self::parse(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "tokens file missing, using built-in defaults");
                Ok(Self::default())
            }
            Err(e) => Err(QaError::TokensUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.lengths.get(name).copied()
    }

    /// Length for `name`, or `default_pt` when absent or malformed.
    pub fn length_or(&self, name: &str, default_pt: f64) -> f64 {
        self.get(name).unwrap_or(default_pt)
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// Converts `"20mm"` / `"10pt"` to points. Returns `None` for any other form.
pub fn parse_length_pt(value: &str) -> Option<f64> {
    let cap = length_re().captures(value.trim())?;
    let n: f64 = cap[1].parse().ok()?;
    match &cap[2] {
        "mm" => Some(mm_to_pt(n)),
        "pt" => Some(n),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LayoutConfig
// ────────────────────────────────────────────────────────────────────────────

/// Physical layout parameters of the two-column template, all in points.
///
/// Built once per run and passed by value; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_inner: f64,
    pub margin_outer: f64,
    pub column_gap: f64,
    /// Body text size; headings are detected relative to it.
    pub body_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_top: mm_to_pt(20.0),
            margin_bottom: mm_to_pt(20.0),
            margin_inner: mm_to_pt(15.0),
            margin_outer: mm_to_pt(15.0),
            column_gap: mm_to_pt(9.0),
            body_size: 10.0,
        }
    }
}

impl LayoutConfig {
    /// Resolves each variable individually against its built-in default.
    pub fn from_tokens(tokens: &LayoutTokens) -> Self {
        let d = Self::default();
        Self {
            margin_top: tokens.length_or("--margin-top", d.margin_top),
            margin_bottom: tokens.length_or("--margin-bottom", d.margin_bottom),
            margin_inner: tokens.length_or("--margin-inner", d.margin_inner),
            margin_outer: tokens.length_or("--margin-outer", d.margin_outer),
            column_gap: tokens.length_or("--col-gap", d.column_gap),
            body_size: tokens.length_or("--body-size", d.body_size),
        }
    }

    pub fn load(path: &Path) -> Result<Self, QaError> {
        let tokens = LayoutTokens::load(path)?;
        if tokens.is_empty() {
            warn!(path = %path.display(), "no layout tokens resolved, using built-in geometry");
        }
        let config = Self::from_tokens(&tokens);
        debug!(
            path = %path.display(),
            resolved = tokens.len(),
            margin_top = config.margin_top,
            margin_inner = config.margin_inner,
            margin_outer = config.margin_outer,
            column_gap = config.column_gap,
            "layout config loaded"
        );
        Ok(config)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOKENS: &str = r#"
/* generated */
body { color: black; }
:root {
  --margin-top: 18mm;
  --margin-bottom: 22mm;
  --margin-inner: 40pt;
  --margin-outer: 12.5mm;
  --col-gap: 9mm;
  --body-size: 9.5pt;
  --accent: #c00;
}
"#;

    #[test]
    fn test_parse_reads_mm_and_pt() {
        let tokens = LayoutTokens::parse(TOKENS);
        assert!((tokens.get("--margin-top").unwrap() - 18.0 * PT_PER_MM).abs() < 1e-9);
        assert_eq!(tokens.get("--margin-inner"), Some(40.0));
        assert_eq!(tokens.get("--body-size"), Some(9.5));
    }

    #[test]
    fn test_non_length_entry_is_skipped() {
        let tokens = LayoutTokens::parse(TOKENS);
        assert_eq!(tokens.get("--accent"), None);
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_no_root_block_is_empty() {
        assert!(LayoutTokens::parse("body { --margin-top: 20mm; }").is_empty());
        assert!(LayoutTokens::parse("").is_empty());
    }

    #[test]
    fn test_malformed_entry_does_not_abort_parse() {
        let css = ":root {\n --margin-top: 1.2.3mm;\n --margin-bottom: 30pt;\n --col-gap: 4em;\n}";
        let tokens = LayoutTokens::parse(css);
        assert_eq!(tokens.get("--margin-top"), None);
        assert_eq!(tokens.get("--margin-bottom"), Some(30.0));
        assert_eq!(tokens.get("--col-gap"), None);
    }

    #[test]
    fn test_multiple_declarations_on_one_line() {
        let tokens = LayoutTokens::parse(":root { --margin-top: 10pt; --margin-bottom: 12pt; }");
        assert_eq!(tokens.get("--margin-top"), Some(10.0));
        assert_eq!(tokens.get("--margin-bottom"), Some(12.0));
    }

    #[test]
    fn test_parse_length_pt_variants() {
        assert_eq!(parse_length_pt("10pt"), Some(10.0));
        assert_eq!(parse_length_pt(" 10 pt "), Some(10.0));
        assert!((parse_length_pt("25.4mm").unwrap() - 72.0).abs() < 1e-9);
        assert_eq!(parse_length_pt("-3pt"), None);
        assert_eq!(parse_length_pt("3px"), None);
        assert_eq!(parse_length_pt("pt"), None);
    }

    #[test]
    fn test_config_falls_back_per_variable() {
        let tokens = LayoutTokens::parse(":root { --margin-inner: 40pt; --col-gap: wide; }");
        let config = LayoutConfig::from_tokens(&tokens);
        let d = LayoutConfig::default();
        assert_eq!(config.margin_inner, 40.0);
        assert_eq!(config.column_gap, d.column_gap);
        assert_eq!(config.margin_top, d.margin_top);
        assert_eq!(config.body_size, 10.0);
    }

    #[test]
    fn test_missing_and_empty_file_give_identical_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = LayoutConfig::load(&dir.path().join("nope.css")).unwrap();

        let empty_path = dir.path().join("empty.css");
        std::fs::File::create(&empty_path).unwrap().write_all(b"").unwrap();
        let empty = LayoutConfig::load(&empty_path).unwrap();

        assert_eq!(missing, empty);
        assert_eq!(missing, LayoutConfig::default());
    }

    #[test]
    fn test_directory_path_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = LayoutConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, QaError::TokensUnreadable { .. }));
    }
}
