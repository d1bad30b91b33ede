use serde::{Deserialize, Serialize};

/// Font entry from `<fonts>`, reduced to what template checks need.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFont {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// `RRGGBB`, alpha stripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub bold: bool,
}

/// Fill entry from `<fills>`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFill {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_type: Option<String>,
    /// `RRGGBB`, alpha stripped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<String>,
}

/// `<alignment>` child of a cell format.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellAlignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
    pub wrap_text: bool,
}

/// Cell format record from `<cellXfs>`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellXf {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<CellAlignment>,
}

/// The subset of `xl/styles.xml` the converter reads.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSheet {
    pub fonts: Vec<RawFont>,
    pub fills: Vec<RawFill>,
    pub cell_xfs: Vec<CellXf>,
}

/// Effective look of one cell.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub bold: bool,
    /// Solid fill colour as `RRGGBB`; `None` when the cell is unfilled.
    pub fill: Option<String>,
}

impl StyleSheet {
    /// Resolve a `cellXfs` index into the effective bold flag and solid fill.
    ///
    /// Unknown indices and missing font/fill entries resolve to the default
    /// (non-bold, unfilled) look.
    #[must_use]
    pub fn resolve(&self, style_idx: Option<u32>) -> ResolvedStyle {
        let Some(xf) = style_idx.and_then(|idx| self.cell_xfs.get(idx as usize)) else {
            return ResolvedStyle::default();
        };

        let bold = xf
            .font_id
            .and_then(|id| self.fonts.get(id as usize))
            .is_some_and(|font| font.bold);

        let fill = xf
            .fill_id
            .and_then(|id| self.fills.get(id as usize))
            .filter(|fill| fill.pattern_type.as_deref() == Some("solid"))
            .and_then(|fill| fill.fg_color.clone());

        ResolvedStyle { bold, fill }
    }
}
