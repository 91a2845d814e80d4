use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_TOKENS_PATH: &str = "templates/prince-af-two-column.tokens.css";

/// Process configuration loaded from environment variables (and an optional `.env`).
///
/// Nothing here is required: every field has a default, and CLI flags override
/// the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Layout tokens file (`:root { --margin-top: 20mm; ... }`).
    pub tokens_path: PathBuf,
    /// Hyphenation pattern file for the hyphenation-validity check.
    pub hyphen_dict: Option<PathBuf>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            tokens_path: optional_env("LAYOUT_TOKENS")?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKENS_PATH)),
            hyphen_dict: optional_env("HYPHEN_DICT")?.map(PathBuf::from),
            rust_log: optional_env("RUST_LOG")?.unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Reads an optional variable; an unset or empty variable is `None`, a
/// non-unicode value is an error.
fn optional_env(key: &str) -> Result<Option<String>> {
    match std::env::var(key) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => {
            Err(e).with_context(|| format!("Environment variable '{key}' is not valid unicode"))
        }
    }
}
