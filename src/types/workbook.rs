use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CellData, StyleSheet};

/// Container format a workbook was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Office Open XML package (zip)
    Xlsx,
    /// Legacy BIFF8 workbook inside an OLE compound file
    Xls,
}

impl SourceFormat {
    /// Detect the container from its leading bytes.
    #[must_use]
    pub fn sniff(data: &[u8]) -> Option<Self> {
        const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
        const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

        if data.starts_with(ZIP_MAGIC) {
            Some(Self::Xlsx)
        } else if data.starts_with(OLE_MAGIC) {
            Some(Self::Xls)
        } else {
            None
        }
    }

    /// Map a lowercase extension (with leading dot) to a format.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".xlsx" | ".xlsm" => Some(Self::Xlsx),
            ".xls" => Some(Self::Xls),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xlsx => f.write_str("xlsx"),
            Self::Xls => f.write_str("xls"),
        }
    }
}

/// A complete Excel workbook, immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    /// Declared filename of the upload this workbook was read from
    pub source_name: String,
    pub format: SourceFormat,
    pub sheets: Vec<Sheet>,
    #[serde(skip_serializing_if = "is_default_styles")]
    pub styles: StyleSheet,
}

fn is_default_styles(styles: &StyleSheet) -> bool {
    styles.cell_xfs.is_empty() && styles.fonts.is_empty() && styles.fills.is_empty()
}

impl Workbook {
    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

/// Column width in Excel character units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColWidth {
    pub col: u32, // 0-indexed
    pub width: f64,
}

/// A worksheet: a sparse grid of cells in row-major document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    pub cells: Vec<CellData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub col_widths: Vec<ColWidth>,
    /// One past the last used row (0 for an empty sheet)
    pub max_row: u32,
    /// One past the last used column (0 for an empty sheet)
    pub max_col: u32,
}

impl Sheet {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Cell at 0-indexed `(row, col)`, if the sheet stores one there.
    #[must_use]
    pub fn cell_at(&self, row: u32, col: u32) -> Option<&CellData> {
        self.cells.iter().find(|cd| cd.r == row && cd.c == col)
    }

    /// Width recorded for a 0-indexed column.
    #[must_use]
    pub fn col_width(&self, col: u32) -> Option<f64> {
        self.col_widths
            .iter()
            .find(|cw| cw.col == col)
            .map(|cw| cw.width)
    }

    /// Append a cell and grow the used range to cover it.
    pub fn push_cell(&mut self, cell: CellData) {
        self.max_row = self.max_row.max(cell.r.saturating_add(1));
        self.max_col = self.max_col.max(cell.c.saturating_add(1));
        self.cells.push(cell);
    }
}
