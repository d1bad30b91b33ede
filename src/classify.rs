//! Sheet classification: which sheets hold any data at all.

use crate::types::{Sheet, Workbook};

/// Whether any cell of `sheet` holds a non-blank value.
#[must_use]
pub fn sheet_has_data(sheet: &Sheet) -> bool {
    sheet.cells.iter().any(|cell| !cell.value.is_blank())
}

/// Names of the sheets that contain at least one non-blank cell, in
/// workbook order.
#[must_use]
pub fn qualifying_sheets(workbook: &Workbook) -> Vec<String> {
    workbook
        .sheets
        .iter()
        .filter(|sheet| {
            let qualifies = sheet_has_data(sheet);
            tracing::debug!(
                sheet = %sheet.name,
                cells = sheet.cells.len(),
                qualifies,
                "classified sheet"
            );
            qualifies
        })
        .map(|sheet| sheet.name.clone())
        .collect()
}
