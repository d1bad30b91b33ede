//! Worksheet parsing - parses individual sheet XML into Sheet structs.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::types::{CellData, CellValue, ColWidth, Sheet};

/// Last column of a worksheet (XFD)
const MAX_COLUMNS: u32 = 16_384;

/// Sheet metadata from workbook.xml
#[derive(Debug, Clone)]
pub(super) struct SheetInfo {
    pub name: String,
    /// Worksheet part to read; `None` for sheets without a cell grid
    pub path: Option<String>,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        // ISO 8601 dates (`t="d"`) are kept as their text
        b"str" | b"d" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Turn the raw `<v>`/`<t>` text of a cell into its value.
pub(super) fn resolve_cell_value(
    raw: Option<&str>,
    tag: CellTypeTag,
    shared_strings: &[String],
) -> CellValue {
    let Some(raw) = raw else {
        return CellValue::Empty;
    };

    match tag {
        CellTypeTag::Shared => parse_u32_bytes(raw.trim().as_bytes())
            .and_then(|idx| shared_strings.get(idx as usize))
            .map_or(CellValue::Empty, |s| CellValue::String(s.clone())),
        CellTypeTag::Inline | CellTypeTag::Str => CellValue::String(raw.to_string()),
        CellTypeTag::Bool => CellValue::Boolean(matches!(raw.trim(), "1" | "true" | "TRUE")),
        CellTypeTag::Error => CellValue::Error(raw.to_string()),
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::String(raw.to_string()),
        },
    }
}

/// Read the text content of the element whose start tag was just consumed,
/// up to its matching end tag.
fn read_text<R: BufRead>(xml: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        buf.clear();
        match xml.read_event_into(buf)? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t)),
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

/// Read an inline string container `<is>...</is>`, concatenating every `<t>`
/// (plain or inside rich-text runs).
fn read_inline_string<R: BufRead>(xml: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<String> {
    let mut text = String::new();
    let mut text_buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"t" => {
                text.push_str(&read_text(xml, &mut text_buf)?);
            }
            Event::End(ref e) if e.local_name().as_ref() == b"is" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

/// Parse a single worksheet. Sheets without a worksheet part come back
/// empty.
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<Sheet> {
    let Some(path) = info.path.as_deref() else {
        return Ok(Sheet::new(info.name.as_str()));
    };
    let file = archive.by_name(path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    parse_sheet_xml(&mut xml, &info.name, shared_strings)
}

/// Parse worksheet XML from any buffered reader.
pub(super) fn parse_sheet_xml<R: BufRead>(
    xml: &mut Reader<R>,
    name: &str,
    shared_strings: &[String],
) -> Result<Sheet> {
    let mut sheet = Sheet::new(name);

    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    let mut text_buf = Vec::new();
    // 1-based row number of the current <row>, and the next column for cells
    // that omit their `r` attribute
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;

    loop {
        buf.clear();
        let event = xml.read_event_into(&mut buf)?;
        let (e, is_start_event) = match event {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::Eof => break,
            _ => continue,
        };

        match e.local_name().as_ref() {
            b"row" => {
                current_row = current_row.saturating_add(1);
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"r" {
                        if let Some(r) = parse_u32_bytes(&attr.value) {
                            current_row = r;
                        }
                    }
                }
                next_col = 0;
            }

            b"c" => {
                let mut position: Option<(u32, u32)> = None;
                let mut cell_type = CellTypeTag::Default;
                let mut style_idx: Option<u32> = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"r" => position = parse_cell_ref_bytes(&attr.value),
                        b"t" => cell_type = parse_cell_type_tag(&attr.value),
                        b"s" => style_idx = parse_u32_bytes(&attr.value),
                        _ => {}
                    }
                }

                let (col, row) =
                    position.unwrap_or((next_col, current_row.saturating_sub(1)));
                next_col = col.saturating_add(1);

                // Empty/self-closing cells like <c r="A1" s="1"/> have no child elements
                let mut value: Option<String> = None;
                if is_start_event {
                    loop {
                        cell_buf.clear();
                        match xml.read_event_into(&mut cell_buf)? {
                            Event::Start(ref inner) => match inner.local_name().as_ref() {
                                b"v" | b"t" => {
                                    value = Some(read_text(xml, &mut text_buf)?);
                                }
                                b"is" => {
                                    value = Some(read_inline_string(xml, &mut text_buf)?);
                                }
                                // Formula text is not a value; cached results live in <v>
                                b"f" => {
                                    read_text(xml, &mut text_buf)?;
                                }
                                _ => {}
                            },
                            Event::End(ref inner) if inner.local_name().as_ref() == b"c" => break,
                            Event::Eof => break,
                            _ => {}
                        }
                    }
                }

                sheet.push_cell(CellData {
                    r: row,
                    c: col,
                    value: resolve_cell_value(value.as_deref(), cell_type, shared_strings),
                    style_idx,
                });
            }

            b"col" => {
                let mut min: u32 = 0;
                let mut max: u32 = 0;
                let mut width: Option<f64> = None;

                for attr in e.attributes().flatten() {
                    let parsed = std::str::from_utf8(&attr.value).ok();
                    match attr.key.as_ref() {
                        b"min" => min = parsed.and_then(|s| s.parse().ok()).unwrap_or(0),
                        b"max" => max = parsed.and_then(|s| s.parse().ok()).unwrap_or(0),
                        b"width" => width = parsed.and_then(|s| s.parse().ok()),
                        _ => {}
                    }
                }

                // A missing max means a single column; ranges past XFD are clipped
                let max = if max == 0 { min } else { max.min(MAX_COLUMNS) };

                // Store the Excel character width directly
                if let Some(width) = width {
                    if min > 0 && min <= max {
                        for col in min..=max {
                            sheet.col_widths.push(ColWidth {
                                col: col - 1,
                                width,
                            });
                        }
                    }
                }
            }

            _ => {}
        }
    }

    Ok(sheet)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn parse_str(xml: &str, shared: &[String]) -> Sheet {
        let mut reader = Reader::from_reader(xml.as_bytes());
        reader.trim_text(false);
        parse_sheet_xml(&mut reader, "Sheet1", shared).unwrap()
    }

    #[test]
    fn resolves_each_cell_type() {
        let shared = vec!["shared text".to_string()];
        let sheet = parse_str(
            r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>42.5</v></c><c r="C1" t="b"><v>1</v></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>inline</t></is></c><c r="B2" t="e"><v>#DIV/0!</v></c></row>
</sheetData></worksheet>"#,
            &shared,
        );

        assert_eq!(sheet.cells.len(), 5);
        assert_eq!(
            sheet.cell_at(0, 0).unwrap().value,
            CellValue::String("shared text".to_string())
        );
        assert_eq!(sheet.cell_at(0, 1).unwrap().value, CellValue::Number(42.5));
        assert_eq!(sheet.cell_at(0, 2).unwrap().value, CellValue::Boolean(true));
        assert_eq!(
            sheet.cell_at(1, 0).unwrap().value,
            CellValue::String("inline".to_string())
        );
        assert_eq!(
            sheet.cell_at(1, 1).unwrap().value,
            CellValue::Error("#DIV/0!".to_string())
        );
    }

    #[test]
    fn style_only_cells_are_empty() {
        let sheet = parse_str(
            r#"<worksheet><sheetData><row r="1"><c r="A1" s="3"/></row></sheetData></worksheet>"#,
            &[],
        );
        let cell = sheet.cell_at(0, 0).unwrap();
        assert_eq!(cell.value, CellValue::Empty);
        assert_eq!(cell.style_idx, Some(3));
    }

    #[test]
    fn formula_without_cached_value_is_empty() {
        let sheet = parse_str(
            r#"<worksheet><sheetData><row r="1"><c r="A1"><f>SUM(B1:B2)</f></c></row></sheetData></worksheet>"#,
            &[],
        );
        assert_eq!(sheet.cell_at(0, 0).unwrap().value, CellValue::Empty);
    }

    #[test]
    fn preserves_whitespace_text() {
        let sheet = parse_str(
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t xml:space="preserve">   </t></is></c></row></sheetData></worksheet>"#,
            &[],
        );
        assert_eq!(
            sheet.cell_at(0, 0).unwrap().value,
            CellValue::String("   ".to_string())
        );
    }

    #[test]
    fn rich_inline_runs_are_concatenated() {
        let sheet = parse_str(
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><r><t>Art</t></r><r><t>icle</t></r></is></c></row></sheetData></worksheet>"#,
            &[],
        );
        assert_eq!(
            sheet.cell_at(0, 0).unwrap().value,
            CellValue::String("Article".to_string())
        );
    }

    #[test]
    fn cells_without_refs_follow_row_position() {
        let sheet = parse_str(
            r#"<worksheet><sheetData><row r="4"><c><v>1</v></c><c><v>2</v></c></row></sheetData></worksheet>"#,
            &[],
        );
        assert_eq!(sheet.cell_at(3, 0).unwrap().value, CellValue::Number(1.0));
        assert_eq!(sheet.cell_at(3, 1).unwrap().value, CellValue::Number(2.0));
    }

    #[test]
    fn far_cell_sets_used_range() {
        let sheet = parse_str(
            r#"<worksheet><sheetData><row r="500"><c r="J500"><v>7</v></c></row></sheetData></worksheet>"#,
            &[],
        );
        assert_eq!(sheet.max_row, 500);
        assert_eq!(sheet.max_col, 10);
    }

    #[test]
    fn column_ranges_expand_to_each_column() {
        let sheet = parse_str(
            r#"<worksheet><cols><col min="1" max="3" width="20" customWidth="1"/></cols><sheetData/></worksheet>"#,
            &[],
        );
        assert_eq!(sheet.col_widths.len(), 3);
        assert_eq!(sheet.col_width(2), Some(20.0));
        assert_eq!(sheet.col_width(3), None);
    }

    #[test]
    fn column_ranges_stop_at_last_column() {
        let sheet = parse_str(
            r#"<worksheet><cols><col min="16380" max="4294967295" width="9"/></cols><sheetData/></worksheet>"#,
            &[],
        );
        assert_eq!(sheet.col_widths.len(), 5);
        assert_eq!(sheet.col_width(16_383), Some(9.0));
    }

    #[test]
    fn inverted_or_out_of_range_columns_are_ignored() {
        let sheet = parse_str(
            r#"<worksheet><cols><col min="5" max="2" width="9"/><col min="20000" max="20001" width="9"/></cols><sheetData/></worksheet>"#,
            &[],
        );
        assert!(sheet.col_widths.is_empty());
    }

    #[test]
    fn column_without_max_is_a_single_column() {
        let sheet = parse_str(
            r#"<worksheet><cols><col min="2" width="11"/></cols><sheetData/></worksheet>"#,
            &[],
        );
        assert_eq!(sheet.col_widths.len(), 1);
        assert_eq!(sheet.col_width(1), Some(11.0));
    }
}
