//! Legacy `.xls` (BIFF8) workbooks, read through calamine.
//!
//! calamine exposes values only, so sheets read this way carry no style
//! indices and the workbook's [`StyleSheet`] stays empty.

use calamine::{Data, Reader, Xls};
use std::io::Cursor;

use crate::error::Result;
use crate::types::{CellData, CellValue, Sheet, SourceFormat, StyleSheet, Workbook};

pub(super) fn parse_xls(data: &[u8], source_name: &str) -> Result<Workbook> {
    let mut workbook: Xls<_> = Xls::new(Cursor::new(data))?;
    let sheet_names = workbook.sheet_names().to_owned();

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name)?;
        // used_cells() positions are relative to the range's first cell
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        let mut sheet = Sheet::new(sheet_name);
        for (row, col, value) in range.used_cells() {
            let (Ok(row), Ok(col)) = (u32::try_from(row), u32::try_from(col)) else {
                continue;
            };
            let value = convert_value(value);
            if value == CellValue::Empty {
                continue;
            }
            sheet.push_cell(CellData {
                r: start_row.saturating_add(row),
                c: start_col.saturating_add(col),
                value,
                style_idx: None,
            });
        }
        sheets.push(sheet);
    }

    Ok(Workbook {
        source_name: source_name.to_string(),
        format: SourceFormat::Xls,
        sheets,
        styles: StyleSheet::default(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn convert_value(value: &Data) -> CellValue {
    match value {
        Data::Empty => CellValue::Empty,
        Data::Bool(v) => CellValue::Boolean(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Float(v) => CellValue::Number(*v),
        Data::String(v) => CellValue::String(v.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::DateTime(v) => CellValue::Number(v.as_f64()),
        Data::DateTimeIso(v) | Data::DurationIso(v) => CellValue::String(v.clone()),
    }
}
