//! Parsing of xl/styles.xml
//!
//! Only fonts, fills and cell formats (xf) are read; borders, number formats
//! and named styles do not affect anything the converter checks.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;

use crate::error::Result;
use crate::types::{CellAlignment, CellXf, RawFill, RawFont, StyleSheet};
use crate::xml_helpers::{argb_to_rgb, attr_bool, attr_string, attr_u32, attr_val};

/// Parse styles.xml content
pub fn parse_styles<R: BufRead>(reader: R) -> Result<StyleSheet> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut stylesheet = StyleSheet::default();
    let mut buf = Vec::new();

    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_cell_xfs = false;

    let mut current_font: Option<RawFont> = None;
    let mut current_fill: Option<RawFill> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));

                match e.local_name().as_ref() {
                    b"fonts" => in_fonts = !is_empty,
                    b"fills" => in_fills = !is_empty,
                    b"cellXfs" => in_cell_xfs = !is_empty,

                    b"font" if in_fonts => {
                        if is_empty {
                            stylesheet.fonts.push(RawFont::default());
                        } else {
                            current_font = Some(RawFont::default());
                        }
                    }
                    b"sz" => {
                        if let Some(ref mut font) = current_font {
                            font.size = attr_val(e).and_then(|s| s.parse().ok());
                        }
                    }
                    b"name" => {
                        if let Some(ref mut font) = current_font {
                            font.name = attr_val(e);
                        }
                    }
                    // <b/> or <b val="1"/>; <b val="0"/> switches bold off
                    b"b" => {
                        if let Some(ref mut font) = current_font {
                            font.bold = attr_bool(e, b"val").unwrap_or(true);
                        }
                    }
                    b"color" => {
                        if let Some(ref mut font) = current_font {
                            font.color = attr_string(e, b"rgb").and_then(|rgb| argb_to_rgb(&rgb));
                        }
                    }

                    b"fill" if in_fills => {
                        if is_empty {
                            stylesheet.fills.push(RawFill::default());
                        } else {
                            current_fill = Some(RawFill::default());
                        }
                    }
                    b"patternFill" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.pattern_type = attr_string(e, b"patternType");
                        }
                    }
                    b"fgColor" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.fg_color =
                                attr_string(e, b"rgb").and_then(|rgb| argb_to_rgb(&rgb));
                        }
                    }

                    b"xf" if in_cell_xfs => {
                        stylesheet.cell_xfs.push(CellXf {
                            font_id: attr_u32(e, b"fontId"),
                            fill_id: attr_u32(e, b"fillId"),
                            alignment: None,
                        });
                    }
                    b"alignment" if in_cell_xfs => {
                        if let Some(xf) = stylesheet.cell_xfs.last_mut() {
                            xf.alignment = Some(CellAlignment {
                                horizontal: attr_string(e, b"horizontal"),
                                vertical: attr_string(e, b"vertical"),
                                wrap_text: attr_bool(e, b"wrapText").unwrap_or(false),
                            });
                        }
                    }

                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"fonts" => in_fonts = false,
                b"fills" => in_fills = false,
                b"cellXfs" => in_cell_xfs = false,
                b"font" => {
                    if let Some(font) = current_font.take() {
                        stylesheet.fonts.push(font);
                    }
                }
                b"fill" => {
                    if let Some(fill) = current_fill.take() {
                        stylesheet.fills.push(fill);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(stylesheet)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
    <font><b/><sz val="11"/><color rgb="00000000"/><name val="Calibri"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFB8E6B8"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1" applyAlignment="1">
      <alignment horizontal="center" vertical="center" wrapText="1"/>
    </xf>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn reads_fonts_fills_and_cell_xfs() {
        let sheet = parse_styles(STYLES.as_bytes()).unwrap();

        assert_eq!(sheet.fonts.len(), 2);
        assert!(!sheet.fonts[0].bold);
        assert!(sheet.fonts[1].bold);
        assert_eq!(sheet.fonts[1].color.as_deref(), Some("000000"));
        assert_eq!(sheet.fonts[1].name.as_deref(), Some("Calibri"));
        assert_eq!(sheet.fonts[1].size, Some(11.0));

        assert_eq!(sheet.fills.len(), 3);
        assert_eq!(sheet.fills[2].pattern_type.as_deref(), Some("solid"));
        assert_eq!(sheet.fills[2].fg_color.as_deref(), Some("B8E6B8"));

        // cellStyleXfs entries must not leak into cellXfs
        assert_eq!(sheet.cell_xfs.len(), 2);
        let resolved = sheet.resolve(Some(1));
        assert!(resolved.bold);
        assert_eq!(resolved.fill.as_deref(), Some("B8E6B8"));

        let alignment = sheet.cell_xfs[1].alignment.as_ref().unwrap();
        assert_eq!(alignment.horizontal.as_deref(), Some("center"));
        assert!(alignment.wrap_text);
        assert_eq!(sheet.cell_xfs[0].alignment, None);
    }

    #[test]
    fn explicit_bold_off() {
        let xml = r#"<styleSheet><fonts><font><b val="0"/></font></fonts></styleSheet>"#;
        let sheet = parse_styles(xml.as_bytes()).unwrap();
        assert!(!sheet.fonts[0].bold);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let xml = "<styleSheet><fonts><font></fills></styleSheet>";
        assert!(parse_styles(xml.as_bytes()).is_err());
    }
}
