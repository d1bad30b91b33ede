use serde::{Deserialize, Serialize};

/// Cell with position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub r: u32, // row (0-indexed)
    pub c: u32, // col (0-indexed)
    pub value: CellValue,
    /// Index into the workbook's `cellXfs` table, if the cell carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_idx: Option<u32>,
}

/// A resolved cell value.
///
/// Shared-string references are resolved at parse time, so `String` always
/// holds the final text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "camelCase")]
pub enum CellValue {
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
    Error(String),
}

impl CellValue {
    /// True when the value carries no data: no value at all, or text made
    /// only of whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::String(s) => s.trim().is_empty(),
            Self::Number(_) | Self::Boolean(_) | Self::Error(_) => false,
        }
    }

    /// The value as text, when it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}
