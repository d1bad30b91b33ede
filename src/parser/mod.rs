//! Workbook reader
//!
//! Orchestrates the parsing of an uploaded workbook into the in-memory
//! [`Workbook`] model. `.xlsx` packages are read part by part from the ZIP
//! archive; legacy `.xls` files go through calamine.

mod relationships;
pub(crate) mod styles;
mod worksheet;
mod xls;

use std::io::Cursor;
use zip::ZipArchive;

use crate::error::{ConvertError, Result};
use crate::types::{SourceFormat, Workbook};

use relationships::{
    get_sheet_info, parse_shared_strings, parse_stylesheet, parse_workbook_relationships,
};
use worksheet::parse_sheet;

/// Parse workbook bytes, detecting the container from its signature.
///
/// # Errors
/// Returns an error if the bytes are neither a ZIP package nor an OLE
/// compound file, or if the detected container cannot be read.
pub fn parse(data: &[u8], source_name: &str) -> Result<Workbook> {
    let format = SourceFormat::sniff(data).ok_or_else(|| {
        ConvertError::Parse("not an Excel workbook (unrecognised file signature)".to_string())
    })?;
    parse_as(data, source_name, format)
}

/// Parse workbook bytes as a specific container format.
///
/// # Errors
/// Returns an error if the bytes cannot be read as `format`.
pub fn parse_as(data: &[u8], source_name: &str, format: SourceFormat) -> Result<Workbook> {
    let workbook = match format {
        SourceFormat::Xlsx => parse_xlsx(data, source_name)?,
        SourceFormat::Xls => xls::parse_xls(data, source_name)?,
    };

    tracing::debug!(
        source = source_name,
        %format,
        sheets = workbook.sheets.len(),
        "workbook parsed"
    );
    Ok(workbook)
}

fn parse_xlsx(data: &[u8], source_name: &str) -> Result<Workbook> {
    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)?;

    let relationships = parse_workbook_relationships(&mut archive);
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let styles = parse_stylesheet(&mut archive, relationships.styles.as_deref())?;
    let sheet_info = get_sheet_info(&mut archive, &relationships)?;

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in &sheet_info {
        sheets.push(parse_sheet(&mut archive, info, &shared_strings)?);
    }

    Ok(Workbook {
        source_name: source_name.to_string(),
        format: SourceFormat::Xlsx,
        sheets,
        styles,
    })
}
