//! Validation gate: decides whether an upload may enter the pipeline.
//!
//! Checks run in a fixed order and stop at the first failure. Size and
//! extension are checked before any byte of the payload is parsed.

use serde::Serialize;
use std::path::Path;

use crate::config::{ConverterConfig, SecurityMode};
use crate::error::UserMessage;
use crate::parser;
use crate::types::{SourceFormat, Workbook};

/// One uploaded file as the caller received it.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    /// Declared original filename, e.g. `"Sample File.xlsx"`.
    pub filename: &'a str,
    pub bytes: &'a [u8],
    /// Size the uploader claimed, in bytes.
    pub declared_size: u64,
}

impl<'a> Upload<'a> {
    /// An upload whose declared size is its actual length.
    #[must_use]
    pub fn new(filename: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            filename,
            bytes,
            declared_size: byte_len(bytes),
        }
    }

    #[must_use]
    pub fn with_declared_size(mut self, declared_size: u64) -> Self {
        self.declared_size = declared_size;
        self
    }

    /// Lowercase extension with leading dot, or `""` when there is none.
    #[must_use]
    pub fn extension(&self) -> String {
        extension_of(self.filename)
    }
}

fn byte_len(bytes: &[u8]) -> u64 {
    u64::try_from(bytes.len()).unwrap_or(u64::MAX)
}

/// Lowercase extension of `filename` with its leading dot.
#[must_use]
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Why an upload was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("file is empty")]
    EmptyFile,

    #[error("file is {size_bytes} bytes, limit is {max_mb} MB")]
    TooLarge { size_bytes: u64, max_mb: u64 },

    #[error("unsupported file type {extension:?}")]
    UnsupportedExtension {
        extension: String,
        accepted: Vec<String>,
    },

    #[error("declared size {declared} does not match actual size {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("content of a {extension} file looks like {detected}")]
    SignatureMismatch { extension: String, detected: String },

    #[error("workbook cannot be read: {reason}")]
    Unreadable { reason: String },

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("workbook has {count} sheets, limit is {max}")]
    TooManySheets { count: usize, max: usize },
}

impl ValidationError {
    /// Message suitable for showing to the person who uploaded the file.
    #[must_use]
    pub fn user_message(&self) -> UserMessage {
        match self {
            Self::EmptyFile => UserMessage::new("File is empty"),
            Self::TooLarge { size_bytes, max_mb } => UserMessage::new(format!(
                "File too large ({}). Maximum allowed: {max_mb}MB",
                crate::archive::format_size(*size_bytes)
            )),
            Self::UnsupportedExtension {
                extension,
                accepted,
            } => {
                let shown = if extension.is_empty() {
                    "(none)"
                } else {
                    extension.as_str()
                };
                UserMessage::new(format!(
                    "Unsupported file type '{shown}'. Supported: {}",
                    accepted.join(", ")
                ))
            }
            Self::SizeMismatch { .. } | Self::SignatureMismatch { .. } => {
                UserMessage::new("File failed integrity checks").with_detail(self.to_string())
            }
            Self::Unreadable { reason } => {
                UserMessage::new("Invalid Excel file format").with_detail(reason.clone())
            }
            Self::NoSheets => UserMessage::new("No sheets found in Excel file"),
            Self::TooManySheets { count, max } => UserMessage::new(format!(
                "Too many sheets ({count}). Maximum allowed: {max}"
            )),
        }
    }
}

/// Validation gate bound to one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Gate<'c> {
    config: &'c ConverterConfig,
}

impl<'c> Gate<'c> {
    #[must_use]
    pub fn new(config: &'c ConverterConfig) -> Self {
        Self { config }
    }

    /// Run every check and, on success, return the parsed workbook.
    pub fn admit(&self, upload: &Upload<'_>) -> Result<Workbook, ValidationError> {
        let result = self.check(upload);
        match &result {
            Ok(workbook) => tracing::info!(
                file = upload.filename,
                format = %workbook.format,
                sheets = workbook.sheets.len(),
                "upload admitted"
            ),
            Err(err) => tracing::warn!(file = upload.filename, error = %err, "upload rejected"),
        }
        result
    }

    fn check(&self, upload: &Upload<'_>) -> Result<Workbook, ValidationError> {
        let actual = byte_len(upload.bytes);

        if upload.declared_size == 0 || actual == 0 {
            return Err(ValidationError::EmptyFile);
        }

        let size_bytes = upload.declared_size.max(actual);
        if size_bytes > self.config.max_upload_bytes() {
            return Err(ValidationError::TooLarge {
                size_bytes,
                max_mb: self.config.max_upload_mb,
            });
        }

        let extension = upload.extension();
        if !self.config.accepts_extension(&extension) {
            return Err(ValidationError::UnsupportedExtension {
                extension,
                accepted: self.config.accepted_extensions.clone(),
            });
        }

        let sniffed = SourceFormat::sniff(upload.bytes);
        let by_extension = SourceFormat::from_extension(&extension);

        let format = match self.config.security_mode {
            SecurityMode::Strict => {
                if upload.declared_size != actual {
                    return Err(ValidationError::SizeMismatch {
                        declared: upload.declared_size,
                        actual,
                    });
                }
                match (by_extension, sniffed) {
                    (Some(expected), Some(found)) if expected == found => expected,
                    (_, found) => {
                        return Err(ValidationError::SignatureMismatch {
                            extension,
                            detected: found
                                .map_or_else(|| "unknown content".to_string(), |f| f.to_string()),
                        });
                    }
                }
            }
            SecurityMode::Lenient => {
                sniffed
                    .or(by_extension)
                    .ok_or_else(|| ValidationError::Unreadable {
                        reason: format!("no workbook reader for {extension} files"),
                    })?
            }
        };

        let workbook = parser::parse_as(upload.bytes, upload.filename, format).map_err(|err| {
            ValidationError::Unreadable {
                reason: err.to_string(),
            }
        })?;

        match workbook.sheets.len() {
            0 => Err(ValidationError::NoSheets),
            count if count > self.config.max_sheets => Err(ValidationError::TooManySheets {
                count,
                max: self.config.max_sheets,
            }),
            _ => Ok(workbook),
        }
    }
}
