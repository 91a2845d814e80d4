use std::path::PathBuf;

use thiserror::Error;

/// Usage/dependency failures. Every variant aborts the run with exit code 1.
///
/// Gate violations are NOT errors; they travel as `Vec<Violation>` and are
/// mapped to exit code 2 by the reporting layer.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("PDF not found: {0}")]
    PdfNotFound(PathBuf),

    #[error("Content dump not found: {0} (run the extraction step first or pass --content)")]
    ContentUnavailable(PathBuf),

    #[error("Content dump is not valid layout JSON: {0}")]
    ContentParse(#[from] serde_json::Error),

    #[error("Content dump is inconsistent: {0}")]
    ContentInvalid(String),

    #[error("Layout tokens file unreadable: {path}: {reason}")]
    TokensUnreadable { path: PathBuf, reason: String },

    #[error("Hyphenation dictionary unavailable: {0}")]
    DictionaryUnavailable(String),

    #[error("Page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Invalid chapter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("PDF text extraction failed: {0}")]
    PdfText(String),

    #[error("Report write failed: {0}")]
    ReportWrite(#[from] std::io::Error),

    #[error("TSV report write failed: {0}")]
    TsvWrite(#[from] csv::Error),
}

impl QaError {
    /// Process exit code for this error. Exit code 2 is reserved for violations.
    pub fn exit_code(&self) -> u8 {
        match self {
            QaError::PdfNotFound(_)
            | QaError::ContentUnavailable(_)
            | QaError::ContentParse(_)
            | QaError::ContentInvalid(_)
            | QaError::TokensUnreadable { .. }
            | QaError::DictionaryUnavailable(_)
            | QaError::PageOutOfRange { .. }
            | QaError::InvalidThreshold(_)
            | QaError::InvalidPattern(_)
            | QaError::PdfText(_)
            | QaError::ReportWrite(_)
            | QaError::TsvWrite(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_errors_exit_one() {
        let errs = [
            QaError::PdfNotFound(PathBuf::from("book.pdf")),
            QaError::ContentUnavailable(PathBuf::from("book.layout.json")),
            QaError::InvalidThreshold("--min-used must be in (0, 1]".to_string()),
            QaError::PageOutOfRange { page: 9, total: 4 },
        ];
        for e in &errs {
            assert_eq!(e.exit_code(), 1, "{e} should be a usage error");
        }
    }

    #[test]
    fn test_error_messages_name_the_path() {
        let e = QaError::PdfNotFound(PathBuf::from("/tmp/missing.pdf"));
        assert!(e.to_string().contains("/tmp/missing.pdf"));
    }
}
