//! Reads a generated template back and lists how it deviates from the
//! required header block.

use crate::cell_ref::cell_ref;
use crate::config::{HexColor, TemplateStyle};
use crate::parser;
use crate::types::{Sheet, StyleSheet};

use super::{column_count, ARTICLE_LABELS, COLUMN_HEADERS, HEADER_ROW, TEMPLATE_SHEET_TITLE};

const WIDTH_TOLERANCE: f64 = 1e-6;

/// Every defect found in `bytes`; an empty list means the template is valid.
#[must_use]
pub fn inspect_template(bytes: &[u8], style: &TemplateStyle) -> Vec<String> {
    let workbook = match parser::parse(bytes, "template.xlsx") {
        Ok(workbook) => workbook,
        Err(err) => return vec![format!("template cannot be read: {err}")],
    };

    let mut defects = Vec::new();

    if workbook.sheets.len() != 1 {
        defects.push(format!(
            "expected exactly one sheet, found {}",
            workbook.sheets.len()
        ));
    }
    let Some(sheet) = workbook.sheets.first() else {
        return defects;
    };
    if sheet.name != TEMPLATE_SHEET_TITLE {
        defects.push(format!(
            "sheet is titled {:?}, expected {TEMPLATE_SHEET_TITLE:?}",
            sheet.name
        ));
    }

    let styles = &workbook.styles;
    for (row, text) in (0u32..).zip(ARTICLE_LABELS) {
        check_label(sheet, styles, row, 0, text, &style.header_fill, &mut defects);
    }
    for (col, text) in (0u32..).zip(COLUMN_HEADERS) {
        check_label(
            sheet,
            styles,
            HEADER_ROW,
            col,
            text,
            &style.column_header_fill,
            &mut defects,
        );
    }

    for cell in &sheet.cells {
        if cell.value.is_blank() {
            continue;
        }
        let inside_block = match cell.r {
            0 | 1 => cell.c == 0,
            HEADER_ROW => cell.c < column_count(),
            _ => false,
        };
        if !inside_block {
            defects.push(format!(
                "unexpected value at {} outside the header block",
                cell_ref(cell.c, cell.r)
            ));
        }
    }

    for col in 0..column_count() {
        match sheet.col_width(col) {
            Some(width) if (width - style.column_width).abs() < WIDTH_TOLERANCE => {}
            Some(width) => defects.push(format!(
                "column {} is {width} wide, expected {}",
                crate::cell_ref::col_to_letter(col),
                style.column_width
            )),
            None => defects.push(format!(
                "column {} has no width set",
                crate::cell_ref::col_to_letter(col)
            )),
        }
    }

    defects
}

fn check_label(
    sheet: &Sheet,
    styles: &StyleSheet,
    row: u32,
    col: u32,
    expected: &str,
    fill: &HexColor,
    defects: &mut Vec<String>,
) {
    let at = cell_ref(col, row);
    let Some(cell) = sheet.cell_at(row, col) else {
        defects.push(format!("{at} is missing, expected {expected:?}"));
        return;
    };

    if cell.value.as_str() != Some(expected) {
        defects.push(format!("{at} holds {:?}, expected {expected:?}", cell.value));
    }

    let look = styles.resolve(cell.style_idx);
    if !look.bold {
        defects.push(format!("{at} is not bold"));
    }
    if look.fill.as_deref() != Some(fill.rgb()) {
        defects.push(format!(
            "{at} fill is {}, expected {fill}",
            look.fill.as_deref().unwrap_or("none")
        ));
    }
}
