//! Archive packaging: all templates of one upload in a single ZIP.

use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::ZipWriter;

use crate::error::{ConvertError, UserMessage};
use crate::export::package::entry_options;
use crate::template::TemplateFile;

const ARCHIVE_SUFFIX: &str = "_Step1_Templates.zip";

/// The bundled download for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveBundle {
    pub file_name: String,
    /// Member names in insertion order.
    pub members: Vec<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Packaging failed; nothing was produced.
#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    #[error("no templates to package")]
    Empty,

    #[error("duplicate archive member {0:?}")]
    DuplicateMember(String),

    #[error("archive could not be written: {0}")]
    Write(#[from] ConvertError),
}

impl From<zip::result::ZipError> for PackagingError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Write(err.into())
    }
}

impl From<std::io::Error> for PackagingError {
    fn from(err: std::io::Error) -> Self {
        Self::Write(err.into())
    }
}

impl PackagingError {
    #[must_use]
    pub fn user_message(&self) -> UserMessage {
        UserMessage::new("Could not create the download archive").with_detail(self.to_string())
    }
}

/// `"<original-base-name>_Step1_Templates.zip"`.
#[must_use]
pub fn archive_file_name(original_filename: &str) -> String {
    let stem = Path::new(original_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("templates");
    format!("{stem}{ARCHIVE_SUFFIX}")
}

/// Deflate every template into one archive, flat, under its own file name.
///
/// Either every template goes in or no archive is returned.
pub fn package(
    templates: &[TemplateFile],
    original_filename: &str,
) -> Result<ArchiveBundle, PackagingError> {
    if templates.is_empty() {
        return Err(PackagingError::Empty);
    }

    let mut seen = HashSet::with_capacity(templates.len());
    for template in templates {
        if !seen.insert(template.file_name.as_str()) {
            return Err(PackagingError::DuplicateMember(template.file_name.clone()));
        }
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = entry_options();
    for template in templates {
        zip.start_file(template.file_name.as_str(), options)?;
        zip.write_all(&template.bytes)?;
    }
    let bytes = zip.finish()?.into_inner();

    let bundle = ArchiveBundle {
        file_name: archive_file_name(original_filename),
        members: templates.iter().map(|t| t.file_name.clone()).collect(),
        bytes,
    };
    tracing::info!(
        archive = %bundle.file_name,
        members = bundle.members.len(),
        bytes = bundle.bytes.len(),
        "archive packaged"
    );
    Ok(bundle)
}

/// Human-readable size: bytes below 1 KiB, then KB, MB, GB with one decimal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    let size = size_bytes as f64;
    if size_bytes < KB {
        format!("{size_bytes} B")
    } else if size_bytes < MB {
        format!("{:.1} KB", size / KB as f64)
    } else if size_bytes < GB {
        format!("{:.1} MB", size / MB as f64)
    } else {
        format!("{:.1} GB", size / GB as f64)
    }
}

/// One line of a [`DownloadSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadEntry {
    pub file_name: String,
    pub sheet_name: String,
    pub size_bytes: u64,
    pub size: String,
}

/// What is ready for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub total_size: String,
    pub files: Vec<DownloadEntry>,
}

impl DownloadSummary {
    #[must_use]
    pub fn new(templates: &[TemplateFile]) -> Self {
        let files: Vec<DownloadEntry> = templates
            .iter()
            .map(|t| {
                let size_bytes = u64::try_from(t.bytes.len()).unwrap_or(u64::MAX);
                DownloadEntry {
                    file_name: t.file_name.clone(),
                    sheet_name: t.sheet_name.clone(),
                    size_bytes,
                    size: format_size(size_bytes),
                }
            })
            .collect();
        let total_size_bytes = files
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(f.size_bytes));

        Self {
            total_files: files.len(),
            total_size_bytes,
            total_size: format_size(total_size_bytes),
            files,
        }
    }
}
