//! Common test utilities and assertion helpers.
//!
//! Helpers here read generated templates and archives back so tests can
//! assert on cells, styles and archive members.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::io::{Cursor, Read};

use tss_converter::cell_ref::parse_cell_ref;
// Aliased so the fixtures' `CellValue` is the one re-exported below
use tss_converter::types::{CellValue as ModelValue, Sheet, Workbook};

// Re-export fixtures for convenience
pub use super::fixtures::*;

/// Parse workbook bytes, panicking with the parser error on failure.
#[must_use]
pub fn parse_workbook(data: &[u8]) -> Workbook {
    tss_converter::parser::parse(data, "test.xlsx").expect("workbook should parse")
}

/// A BIFF8 workbook saved as `.xls`: "Data" (A1, B2 and J500 filled),
/// "Empty", and "Offset" whose first value sits at C5.
#[must_use]
pub fn legacy_xls() -> Vec<u8> {
    std::fs::read("tests/data/legacy.xls").expect("Failed to read test file")
}

/// The only sheet of a workbook.
#[must_use]
pub fn only_sheet(workbook: &Workbook) -> &Sheet {
    assert_eq!(workbook.sheets.len(), 1, "expected a single sheet");
    &workbook.sheets[0]
}

/// Text of the cell at an A1-style reference.
#[must_use]
pub fn cell_text<'a>(sheet: &'a Sheet, reference: &str) -> Option<&'a str> {
    let (col, row) = parse_cell_ref(reference).expect("valid cell reference");
    sheet
        .cell_at(row, col)
        .and_then(|cell| cell.value.as_str())
}

/// Value of the cell at an A1-style reference.
#[must_use]
pub fn cell_value<'a>(sheet: &'a Sheet, reference: &str) -> Option<&'a ModelValue> {
    let (col, row) = parse_cell_ref(reference).expect("valid cell reference");
    sheet.cell_at(row, col).map(|cell| &cell.value)
}

/// Assert a cell's text.
pub fn assert_cell_text(sheet: &Sheet, reference: &str, expected: &str) {
    assert_eq!(
        cell_text(sheet, reference),
        Some(expected),
        "unexpected text at {reference}"
    );
}

/// Assert a cell is bold and filled with `fill` (`RRGGBB`).
pub fn assert_cell_look(workbook: &Workbook, sheet: &Sheet, reference: &str, fill: &str) {
    let (col, row) = parse_cell_ref(reference).expect("valid cell reference");
    let cell = sheet
        .cell_at(row, col)
        .unwrap_or_else(|| panic!("no cell at {reference}"));
    let look = workbook.styles.resolve(cell.style_idx);
    assert!(look.bold, "{reference} should be bold");
    assert_eq!(look.fill.as_deref(), Some(fill), "fill of {reference}");
}

/// Member names of a ZIP archive, in stored order.
#[must_use]
pub fn zip_member_names(data: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("valid zip");
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Bytes of one ZIP member.
#[must_use]
pub fn read_zip_member(data: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).expect("valid zip");
    let mut file = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("archive has no member {name}"));
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}
