//! XLSX export.
//!
//! Serializes an in-memory [`Workbook`] into a fresh XLSX package: one
//! worksheet part per sheet, one stylesheet, inline strings throughout.

pub(crate) mod package;
pub(crate) mod sheet_writer;
pub(crate) mod styles_writer;

use crate::error::Result;
use crate::types::Workbook;

use package::{content_types_xml, root_rels_xml, workbook_rels_xml, workbook_xml, zip_parts};
use sheet_writer::write_sheet_xml;
use styles_writer::write_styles_xml;

/// Save a workbook to XLSX bytes.
///
/// The output is deterministic: the same workbook always yields the same
/// bytes.
///
/// # Errors
/// Returns an error if the ZIP container cannot be written.
pub fn write_xlsx(workbook: &Workbook) -> Result<Vec<u8>> {
    let sheet_count = workbook.sheets.len();

    let mut parts: Vec<(String, String)> = Vec::with_capacity(sheet_count + 5);
    parts.push((
        "[Content_Types].xml".to_string(),
        content_types_xml(sheet_count),
    ));
    parts.push(("_rels/.rels".to_string(), root_rels_xml()));
    parts.push(("xl/workbook.xml".to_string(), workbook_xml(workbook.sheet_names())));
    parts.push((
        "xl/_rels/workbook.xml.rels".to_string(),
        workbook_rels_xml(sheet_count),
    ));
    parts.push(("xl/styles.xml".to_string(), write_styles_xml(&workbook.styles)));
    for (idx, sheet) in workbook.sheets.iter().enumerate() {
        parts.push((
            format!("xl/worksheets/sheet{}.xml", idx + 1),
            write_sheet_xml(sheet),
        ));
    }

    zip_parts(
        parts
            .iter()
            .map(|(name, xml)| (name.as_str(), xml.as_bytes())),
    )
}
