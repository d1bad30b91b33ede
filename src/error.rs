//! Structured error types for the converter.
//!
//! `ConvertError` covers the low-level failures (XML, zip, legacy workbook,
//! I/O, configuration, HTTP). The pipeline stages wrap it in their own
//! domain errors, each of which renders to a [`UserMessage`].

use serde::Serialize;

/// Low-level failures shared by every stage.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Legacy `.xls` read error.
    #[error("XLS workbook: {0}")]
    Xls(#[from] calamine::XlsError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be decoded.
    #[error("Configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration decoded but holds an unusable value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// HTTP request failure.
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// What the caller shows to a person: a short category sentence plus an
/// optional detail line. Raw internal error text only ever goes in `detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl UserMessage {
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for UserMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary)
    }
}
