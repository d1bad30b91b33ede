//! Test fixtures for generating upload workbooks in memory.
//!
//! The builders here write `.xlsx` packages directly with `zip`, independent
//! of the crate's own writer, so the parser and pipeline are tested against
//! input they did not produce themselves.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{XlsxBuilder, StyleBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .add_sheet("44x53")
//!     .add_cell("A1", "Article", Some(StyleBuilder::new().bold()))
//!     .add_cell("B1", 42.0, None)
//!     .build();
//!
//! let workbook = tss_converter::parser::parse(&xlsx, "book.xlsx").unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Style Builder
// ============================================================================

/// Builder for the few style properties the fixtures need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    pub bold: bool,
    pub bg_color: Option<String>,
    pub pattern_type: Option<String>,
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the font bold.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Set a solid background fill as #RRGGBB or AARRGGBB.
    #[must_use]
    pub fn bg_color(mut self, color: &str) -> Self {
        self.bg_color = Some(normalize_color(color));
        self.pattern_type = Some("solid".to_string());
        self
    }

    /// Set the fill pattern type.
    #[must_use]
    pub fn pattern(mut self, pattern_type: &str) -> Self {
        self.pattern_type = Some(pattern_type.to_string());
        self
    }
}

// ============================================================================
// Cell Values
// ============================================================================

/// A value as it is stored in the sheet XML.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// A shared string.
    String(String),
    /// An inline string (`t="inlineStr"`).
    InlineString(String),
    Number(f64),
    Boolean(bool),
    /// An error value (e.g., "#DIV/0!").
    Error(String),
    /// A formula with no cached result.
    Formula(String),
    /// A style-only cell.
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// A cell in the sheet.
#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<StyleBuilder>,
}

/// A column width definition (1-indexed, inclusive).
#[derive(Debug, Clone)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: f64,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub col_widths: Vec<ColumnWidth>,
    /// Written as a chart sheet under `xl/chartsheets/` instead of a worksheet
    pub chart: bool,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// A chart sheet: a tab with no cell grid.
    #[must_use]
    pub fn chart(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chart: true,
            ..Self::default()
        }
    }

    /// Add a cell with a value and optional style.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    /// Add an empty cell with only a style.
    #[must_use]
    pub fn styled_cell(mut self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Empty,
            style: Some(style),
        });
        self
    }

    /// Add a formula cell that has never been calculated.
    #[must_use]
    pub fn formula(mut self, cell_ref: &str, formula: &str) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Formula(formula.to_string()),
            style: None,
        });
        self
    }

    /// Fill `rows` x `cols` cells starting at A1 with numbers.
    #[must_use]
    pub fn grid(mut self, rows: u32, cols: u32) -> Self {
        for row in 1..=rows {
            for col in 1..=cols {
                let cell_ref = format!("{}{row}", col_num_to_letter(col));
                self = self.cell(&cell_ref, f64::from(row * 1000 + col), None);
            }
        }
        self
    }

    /// Set column width for a range of columns.
    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push(ColumnWidth { min, max, width });
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    omit_workbook_rels: bool,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Leave out `xl/_rels/workbook.xml.rels`, as some minimal writers do.
    #[must_use]
    pub fn without_workbook_rels(mut self) -> Self {
        self.omit_workbook_rels = true;
        self
    }

    /// Add a simple sheet by name (returns a builder for chaining).
    #[must_use]
    pub fn add_sheet(self, name: &str) -> XlsxSheetAdder {
        XlsxSheetAdder {
            builder: self,
            sheet: SheetBuilder::new(name),
        }
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut styles = StylesCollector::default();
        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Some(ref style) = cell.style {
                    styles.add_style(style);
                }
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut put = |path: &str, body: &str| {
            zip.start_file(path, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        let parts = sheet_parts(&self.sheets);

        put("[Content_Types].xml", &generate_content_types(&parts));
        put("_rels/.rels", &generate_rels());
        if !self.omit_workbook_rels {
            put("xl/_rels/workbook.xml.rels", &generate_workbook_rels(&parts));
        }
        put("xl/workbook.xml", &generate_workbook(&self.sheets));
        put("xl/styles.xml", &styles.generate_styles_xml());
        if !shared_strings.is_empty() {
            put("xl/sharedStrings.xml", &generate_shared_strings(&shared_strings));
        }
        for (sheet, part) in self.sheets.iter().zip(&parts) {
            let body = if sheet.chart {
                generate_chartsheet_xml()
            } else {
                generate_sheet_xml(sheet, &shared_strings, &styles)
            };
            put(&format!("xl/{}", part.target), &body);
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

/// Helper for fluent sheet building within `XlsxBuilder`.
pub struct XlsxSheetAdder {
    builder: XlsxBuilder,
    sheet: SheetBuilder,
}

impl XlsxSheetAdder {
    #[must_use]
    pub fn add_cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.sheet = self.sheet.cell(cell_ref, value, style);
        self
    }

    /// Finish the current sheet and return the builder.
    #[must_use]
    pub fn done(mut self) -> XlsxBuilder {
        self.builder.sheets.push(self.sheet);
        self.builder
    }

    /// Build the XLSX directly (finishes the current sheet automatically).
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.done().build()
    }
}

// ============================================================================
// Styles Collector
// ============================================================================

/// Deduplicates styles; xf 0 is always the default look.
#[derive(Debug, Default)]
struct StylesCollector {
    styles: Vec<StyleBuilder>,
}

impl StylesCollector {
    fn add_style(&mut self, style: &StyleBuilder) {
        if !self.styles.contains(style) {
            self.styles.push(style.clone());
        }
    }

    fn style_index(&self, style: &StyleBuilder) -> u32 {
        self.styles
            .iter()
            .position(|s| s == style)
            .map_or(0, |i| i as u32 + 1)
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        // one font and one fill per style, after the two defaults
        xml.push_str(&format!(r#"<fonts count="{}">"#, self.styles.len() + 1));
        xml.push_str(r#"<font><sz val="11"/><name val="Calibri"/></font>"#);
        for style in &self.styles {
            let bold = if style.bold { "<b/>" } else { "" };
            xml.push_str(&format!(
                r#"<font>{bold}<sz val="11"/><name val="Calibri"/></font>"#
            ));
        }
        xml.push_str("</fonts>");

        xml.push_str(&format!(r#"<fills count="{}">"#, self.styles.len() + 2));
        xml.push_str(r#"<fill><patternFill patternType="none"/></fill>"#);
        xml.push_str(r#"<fill><patternFill patternType="gray125"/></fill>"#);
        for style in &self.styles {
            let pattern = style.pattern_type.as_deref().unwrap_or("none");
            match &style.bg_color {
                Some(color) => xml.push_str(&format!(
                    r#"<fill><patternFill patternType="{pattern}"><fgColor rgb="{color}"/></patternFill></fill>"#
                )),
                None => xml.push_str(&format!(
                    r#"<fill><patternFill patternType="{pattern}"/></fill>"#
                )),
            }
        }
        xml.push_str("</fills>");

        xml.push_str(r#"<borders count="1"><border/></borders>"#);
        xml.push_str(&format!(r#"<cellXfs count="{}">"#, self.styles.len() + 1));
        xml.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>"#);
        for (i, _) in self.styles.iter().enumerate() {
            xml.push_str(&format!(
                r#"<xf numFmtId="0" fontId="{}" fillId="{}" borderId="0" applyFont="1" applyFill="1"/>"#,
                i + 1,
                i + 2
            ));
        }
        xml.push_str("</cellXfs>");
        xml.push_str("</styleSheet>");
        xml
    }
}

// ============================================================================
// Package Parts
// ============================================================================

/// Normalize a color to AARRGGBB format.
fn normalize_color(color: &str) -> String {
    let hex = color.trim_start_matches('#');
    if hex.len() == 6 {
        format!("FF{}", hex.to_uppercase())
    } else {
        hex.to_uppercase()
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Where a sheet lives in the package. Worksheets and chart sheets are
/// numbered independently, the way Excel saves them.
struct SheetPart {
    target: String,
    /// `worksheet` or `chartsheet`, used in both the relationship type and
    /// the content type
    kind: &'static str,
}

fn sheet_parts(sheets: &[SheetBuilder]) -> Vec<SheetPart> {
    let mut worksheets = 0;
    let mut charts = 0;
    sheets
        .iter()
        .map(|sheet| {
            if sheet.chart {
                charts += 1;
                SheetPart {
                    target: format!("chartsheets/sheet{charts}.xml"),
                    kind: "chartsheet",
                }
            } else {
                worksheets += 1;
                SheetPart {
                    target: format!("worksheets/sheet{worksheets}.xml"),
                    kind: "worksheet",
                }
            }
        })
        .collect()
}

fn generate_content_types(parts: &[SheetPart]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for part in parts {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/{}" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.{}+xml"/>"#,
            part.target, part.kind
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook_rels(parts: &[SheetPart]) -> String {
    let sheet_count = parts.len();
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, part) in parts.iter().enumerate() {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>"#,
            i + 1,
            part.kind,
            part.target
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 2
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets>");
    xml.push_str("</workbook>");
    xml
}

fn generate_chartsheet_xml() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<chartsheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);
    xml.push_str("</chartsheet>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        strings.len(),
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

/// Convert column number (1-indexed) to letter(s).
pub fn col_num_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    if result.is_empty() {
        result.push('A');
    }
    result
}

/// Row number (1-indexed) of a reference like "B12".
fn row_of(cell_ref: &str) -> u32 {
    cell_ref
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap_or(1)
}

fn generate_sheet_xml(
    sheet: &SheetBuilder,
    shared_strings: &[String],
    styles: &StylesCollector,
) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for col in &sheet.col_widths {
            xml.push_str(&format!(
                r#"<col min="{}" max="{}" width="{}" customWidth="1"/>"#,
                col.min, col.max, col.width
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");

    let mut rows: std::collections::BTreeMap<u32, Vec<&CellEntry>> =
        std::collections::BTreeMap::new();
    for cell in &sheet.cells {
        rows.entry(row_of(&cell.cell_ref)).or_default().push(cell);
    }

    for (row_num, cells) in rows {
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for cell in cells {
            let mut attrs = format!(r#"r="{}""#, cell.cell_ref);
            if let Some(ref style) = cell.style {
                let idx = styles.style_index(style);
                if idx > 0 {
                    attrs.push_str(&format!(r#" s="{idx}""#));
                }
            }

            match &cell.value {
                CellValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c {attrs} t="s"><v>{idx}</v></c>"#));
                }
                CellValue::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c {attrs} t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c {attrs}><v>{n}</v></c>"#));
                }
                CellValue::Boolean(b) => {
                    let v = if *b { "1" } else { "0" };
                    xml.push_str(&format!(r#"<c {attrs} t="b"><v>{v}</v></c>"#));
                }
                CellValue::Error(e) => {
                    xml.push_str(&format!(r#"<c {attrs} t="e"><v>{}</v></c>"#, escape_xml(e)));
                }
                CellValue::Formula(f) => {
                    xml.push_str(&format!(r#"<c {attrs}><f>{}</f></c>"#, escape_xml(f)));
                }
                CellValue::Empty => {
                    xml.push_str(&format!(r#"<c {attrs}/>"#));
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData>");
    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Convenience Functions
// ============================================================================

/// A single empty sheet.
#[must_use]
pub fn minimal_xlsx() -> Vec<u8> {
    XlsxBuilder::new().sheet(SheetBuilder::new("Sheet1")).build()
}

/// One sheet with `text` in A1.
#[must_use]
pub fn xlsx_with_text(text: &str) -> Vec<u8> {
    XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_cell("A1", text, None)
        .build()
}

/// The reference upload: two data sheets and one empty "Notes" sheet.
#[must_use]
pub fn sample_file_xlsx() -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("44x53")
                .cell("A1", "Part", Some(StyleBuilder::new().bold()))
                .cell("B1", "Qty", Some(StyleBuilder::new().bold()))
                .cell("A2", "Bracket", None)
                .cell("B2", 4, None),
        )
        .sheet(
            SheetBuilder::new("65x43")
                .cell("A1", "Steel", None)
                .cell("C7", 12.5, None),
        )
        .sheet(
            SheetBuilder::new("Notes")
                .styled_cell("A1", StyleBuilder::new().bg_color("#FFFF00"))
                .cell("B2", "   ", None),
        )
        .build()
}

/// A workbook whose sheets are all blank: style-only and whitespace cells.
#[must_use]
pub fn blank_sheets_xlsx() -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(SheetBuilder::new("Sheet1"))
        .sheet(
            SheetBuilder::new("Sheet2")
                .styled_cell("B3", StyleBuilder::new().bold())
                .cell("C4", "", None)
                .cell("D5", " \t ", None),
        )
        .build()
}

/// The first eight bytes of an OLE compound file followed by junk.
#[must_use]
pub fn ole_header_only() -> Vec<u8> {
    let mut data = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    data.extend_from_slice(&[0u8; 64]);
    data
}

/// A zip archive that is not a workbook.
#[must_use]
pub fn plain_zip() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("readme.txt", FileOptions::default()).unwrap();
    zip.write_all(b"not a workbook").unwrap();
    zip.finish().unwrap().into_inner()
}
