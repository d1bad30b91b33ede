//! Step 1 template construction.
//!
//! A template is a fresh single-sheet workbook holding only the fixed header
//! block: the article rows (A1, A2) and the 17 column headers in row 3. It
//! is built as an in-memory [`Workbook`] and serialized by [`crate::export`].

mod inspect;

pub use inspect::inspect_template;

use serde::Serialize;
use std::collections::HashSet;

use crate::config::{ConverterConfig, TemplateStyle};
use crate::error::{ConvertError, UserMessage};
use crate::export::write_xlsx;
use crate::types::{
    CellAlignment, CellData, CellValue, CellXf, ColWidth, RawFill, RawFont, Sheet, SourceFormat,
    StyleSheet, Workbook,
};

/// Labels of A1 and A2.
pub const ARTICLE_LABELS: [&str; 2] = ["Article name", "Article number"];

/// Row 3 column headers, A through Q.
pub const COLUMN_HEADERS: [&str; 17] = [
    "Combination",
    "General Type Component(Type)",
    "Sub-Type Component Identity Process Name",
    "Material Designation",
    "Material Distributor",
    "Producer",
    "Material Type In Process",
    "Document type",
    "Requirement Source/TED",
    "Sub-type",
    "Regulation or substances",
    "Limit",
    "Test method",
    "Frequency",
    "Level",
    "Warning Limit",
    "Additional Information",
];

/// Title of the only worksheet in a template.
pub const TEMPLATE_SHEET_TITLE: &str = "Template";

/// 0-based row holding the column headers.
pub const HEADER_ROW: u32 = 2;

pub const MAX_SHEET_NAME_CHARS: usize = 100;

const FILE_NAME_SUFFIX: &str = " - Step1.xlsx";
const ILLEGAL_FILE_NAME_CHARS: [char; 9] = ['/', '\\', '?', '*', ':', '|', '"', '<', '>'];

// cellXfs indices written into every template
const XF_ARTICLE: u32 = 1;
const XF_COLUMN_HEADER: u32 = 2;

/// Number of template columns (A-Q).
#[must_use]
pub fn column_count() -> u32 {
    u32::try_from(COLUMN_HEADERS.len()).unwrap_or(u32::MAX)
}

/// One generated template workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateFile {
    /// Source sheet the template was made for.
    pub sheet_name: String,
    /// Name used for download and as the archive member name.
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// What went wrong while building one template.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionFault {
    #[error("invalid sheet name: {reason}")]
    InvalidSheetName { reason: String },

    #[error("template could not be written: {0}")]
    Write(#[from] ConvertError),

    #[error("generated template failed verification: {}", .0.join("; "))]
    Verification(Vec<String>),
}

/// A template that could not be built, tagged with its sheet.
#[derive(Debug, thiserror::Error)]
#[error("sheet {sheet_name:?}: {fault}")]
pub struct ConstructionError {
    pub sheet_name: String,
    #[source]
    pub fault: ConstructionFault,
}

impl ConstructionError {
    #[must_use]
    pub fn user_message(&self) -> UserMessage {
        UserMessage::new(format!(
            "Could not create a template for sheet '{}'",
            self.sheet_name
        ))
        .with_detail(self.fault.to_string())
    }
}

/// Replace characters that are not allowed in file names with `_`.
#[must_use]
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if ILLEGAL_FILE_NAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// `"<SheetName> - Step1.xlsx"`, with illegal characters replaced.
#[must_use]
pub fn template_file_name(sheet_name: &str) -> String {
    format!("{}{FILE_NAME_SUFFIX}", sanitize_file_stem(sheet_name))
}

/// Hands out template file names, suffixing ` (2)`, ` (3)`, ... when two
/// sheets would otherwise share one. Names compare case-insensitively.
#[derive(Debug, Default)]
pub struct FileNames {
    taken: HashSet<String>,
}

impl FileNames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve and return the file name for `sheet_name`.
    pub fn claim(&mut self, sheet_name: &str) -> String {
        let stem = sanitize_file_stem(sheet_name);
        let mut candidate = format!("{stem}{FILE_NAME_SUFFIX}");
        let mut n = 2u32;
        while !self.taken.insert(candidate.to_lowercase()) {
            candidate = format!("{stem} ({n}){FILE_NAME_SUFFIX}");
            n = n.saturating_add(1);
        }
        candidate
    }
}

fn check_sheet_name(sheet_name: &str) -> Result<(), ConstructionFault> {
    if sheet_name.trim().is_empty() {
        return Err(ConstructionFault::InvalidSheetName {
            reason: "name is empty".to_string(),
        });
    }
    let length = sheet_name.chars().count();
    if length > MAX_SHEET_NAME_CHARS {
        return Err(ConstructionFault::InvalidSheetName {
            reason: format!("name is {length} characters, limit is {MAX_SHEET_NAME_CHARS}"),
        });
    }
    Ok(())
}

/// The template stylesheet: default look at xf 0, article band at xf 1,
/// column header band at xf 2.
fn template_styles(style: &TemplateStyle) -> StyleSheet {
    let bold_black = RawFont {
        name: Some("Calibri".to_string()),
        size: Some(11.0),
        color: Some("000000".to_string()),
        bold: true,
    };
    let solid = |color: &str| RawFill {
        pattern_type: Some("solid".to_string()),
        fg_color: Some(color.to_string()),
    };
    let wrapped = |horizontal: &str| CellAlignment {
        horizontal: Some(horizontal.to_string()),
        vertical: Some("center".to_string()),
        wrap_text: true,
    };

    StyleSheet {
        fonts: vec![
            RawFont {
                name: Some("Calibri".to_string()),
                size: Some(11.0),
                color: None,
                bold: false,
            },
            bold_black,
        ],
        fills: vec![
            RawFill {
                pattern_type: Some("none".to_string()),
                fg_color: None,
            },
            RawFill {
                pattern_type: Some("gray125".to_string()),
                fg_color: None,
            },
            solid(style.header_fill.rgb()),
            solid(style.column_header_fill.rgb()),
        ],
        cell_xfs: vec![
            CellXf::default(),
            CellXf {
                font_id: Some(1),
                fill_id: Some(2),
                alignment: Some(wrapped("left")),
            },
            CellXf {
                font_id: Some(1),
                fill_id: Some(3),
                alignment: Some(wrapped("center")),
            },
        ],
    }
}

fn label(r: u32, c: u32, text: &str, style_idx: u32) -> CellData {
    CellData {
        r,
        c,
        value: CellValue::String(text.to_string()),
        style_idx: Some(style_idx),
    }
}

/// The template as an in-memory workbook.
#[must_use]
pub fn template_workbook(file_name: &str, style: &TemplateStyle) -> Workbook {
    let mut sheet = Sheet::new(TEMPLATE_SHEET_TITLE);

    for (row, text) in (0u32..).zip(ARTICLE_LABELS) {
        sheet.push_cell(label(row, 0, text, XF_ARTICLE));
    }
    for (col, text) in (0u32..).zip(COLUMN_HEADERS) {
        sheet.push_cell(label(HEADER_ROW, col, text, XF_COLUMN_HEADER));
    }
    sheet.col_widths = (0..column_count())
        .map(|col| ColWidth {
            col,
            width: style.column_width,
        })
        .collect();

    Workbook {
        source_name: file_name.to_string(),
        format: SourceFormat::Xlsx,
        sheets: vec![sheet],
        styles: template_styles(style),
    }
}

/// Builds templates with one configuration.
#[derive(Debug, Clone, Copy)]
pub struct TemplateBuilder<'c> {
    config: &'c ConverterConfig,
}

impl<'c> TemplateBuilder<'c> {
    #[must_use]
    pub fn new(config: &'c ConverterConfig) -> Self {
        Self { config }
    }

    /// Build the template for `sheet_name`, named by [`template_file_name`].
    ///
    /// The same sheet name and configuration always produce the same bytes.
    pub fn build(&self, sheet_name: &str) -> Result<TemplateFile, ConstructionError> {
        self.build_inner(sheet_name).map_err(|fault| {
            tracing::warn!(sheet = sheet_name, error = %fault, "template construction failed");
            ConstructionError {
                sheet_name: sheet_name.to_string(),
                fault,
            }
        })
    }

    fn build_inner(&self, sheet_name: &str) -> Result<TemplateFile, ConstructionFault> {
        check_sheet_name(sheet_name)?;

        let style = &self.config.template;
        let file_name = template_file_name(sheet_name);
        let bytes = write_xlsx(&template_workbook(&file_name, style))?;

        if self.config.verify_templates {
            let defects = inspect_template(&bytes, style);
            if !defects.is_empty() {
                return Err(ConstructionFault::Verification(defects));
            }
        }

        tracing::debug!(
            sheet = sheet_name,
            file = %file_name,
            bytes = bytes.len(),
            "template built"
        );
        Ok(TemplateFile {
            sheet_name: sheet_name.to_string(),
            file_name,
            bytes,
        })
    }
}
