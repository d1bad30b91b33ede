//! Generates worksheet XML from a `Sheet` struct.
//!
//! Text is written as inline strings (`t="inlineStr"`), so a package never
//! needs a shared string table.

use crate::cell_ref::cell_ref;
use crate::types::{CellData, CellValue, Sheet};
use crate::xml_helpers::xml_escape;

/// Default column width written to `<sheetFormatPr>` when no `<col>` applies.
const DEFAULT_COL_WIDTH: f64 = 8.43;
const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Write a complete worksheet XML string from a `Sheet`.
///
/// Cells must be in row-major order; cells of one row are grouped into a
/// single `<row>`.
pub(crate) fn write_sheet_xml(sheet: &Sheet) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push('\n');

    // <dimension>
    if sheet.max_row > 0 && sheet.max_col > 0 {
        let end = cell_ref(sheet.max_col - 1, sheet.max_row - 1);
        out.push_str(&format!("<dimension ref=\"A1:{end}\"/>\n"));
    } else {
        out.push_str("<dimension ref=\"A1\"/>\n");
    }

    // <sheetFormatPr>
    out.push_str(&format!(
        "<sheetFormatPr defaultRowHeight=\"{DEFAULT_ROW_HEIGHT:.2}\" defaultColWidth=\"{DEFAULT_COL_WIDTH:.4}\"/>\n"
    ));

    // <cols>
    if !sheet.col_widths.is_empty() {
        out.push_str("<cols>\n");
        for cw in &sheet.col_widths {
            let col1 = cw.col + 1; // XLSX is 1-based
            out.push_str(&format!(
                "<col min=\"{col1}\" max=\"{col1}\" width=\"{:.4}\" customWidth=\"1\"/>\n",
                cw.width
            ));
        }
        out.push_str("</cols>\n");
    }

    // <sheetData>
    if sheet.cells.is_empty() {
        out.push_str("<sheetData/>\n");
    } else {
        out.push_str("<sheetData>\n");
        write_sheet_data(&mut out, &sheet.cells);
        out.push_str("</sheetData>\n");
    }

    out.push_str("</worksheet>");
    out
}

/// Write all cell rows into `<sheetData>`.
fn write_sheet_data(out: &mut String, cells: &[CellData]) {
    let mut current_row: Option<u32> = None;

    for cd in cells {
        if current_row != Some(cd.r) {
            if current_row.is_some() {
                out.push_str("</row>\n");
            }
            let span_end = cells
                .iter()
                .filter(|other| other.r == cd.r)
                .map(|other| other.c + 1)
                .max()
                .unwrap_or(1);
            out.push_str(&format!(
                "<row r=\"{}\" spans=\"1:{span_end}\">",
                u64::from(cd.r) + 1
            ));
            current_row = Some(cd.r);
        }
        write_cell(out, cd);
    }

    if current_row.is_some() {
        out.push_str("</row>\n");
    }
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, cd: &CellData) {
    out.push_str(&format!("<c r=\"{}\"", cell_ref(cd.c, cd.r)));

    if let Some(si) = cd.style_idx {
        out.push_str(&format!(" s=\"{si}\""));
    }

    match &cd.value {
        CellValue::Empty => out.push_str("/>"),
        CellValue::String(text) => {
            out.push_str(" t=\"inlineStr\"><is>");
            if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
                out.push_str("<t xml:space=\"preserve\">");
            } else {
                out.push_str("<t>");
            }
            out.push_str(&xml_escape(text));
            out.push_str("</t></is></c>");
        }
        CellValue::Number(n) => {
            out.push_str(&format!("><v>{n}</v></c>"));
        }
        CellValue::Boolean(b) => {
            out.push_str(&format!(" t=\"b\"><v>{}</v></c>", u8::from(*b)));
        }
        CellValue::Error(e) => {
            out.push_str(&format!(" t=\"e\"><v>{}</v></c>", xml_escape(e)));
        }
    }
}
