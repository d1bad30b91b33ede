//! Generates `xl/styles.xml` from a `StyleSheet`.
//!
//! Excel reserves fill 0 (`none`) and fill 1 (`gray125`), and needs at least
//! one font, border and cell format; missing defaults are filled in here.

use crate::types::{CellXf, RawFill, RawFont, StyleSheet};
use crate::xml_helpers::xml_escape;

pub(crate) fn write_styles_xml(styles: &StyleSheet) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    out.push('\n');

    // <fonts>
    let default_font = [RawFont::default()];
    let fonts: &[RawFont] = if styles.fonts.is_empty() {
        &default_font
    } else {
        &styles.fonts
    };
    out.push_str(&format!("<fonts count=\"{}\">\n", fonts.len()));
    for font in fonts {
        write_font(&mut out, font);
    }
    out.push_str("</fonts>\n");

    // <fills>
    let reserved = [
        RawFill {
            pattern_type: Some("none".to_string()),
            fg_color: None,
        },
        RawFill {
            pattern_type: Some("gray125".to_string()),
            fg_color: None,
        },
    ];
    let fills: Vec<&RawFill> = if styles.fills.len() >= 2 {
        styles.fills.iter().collect()
    } else {
        reserved.iter().collect()
    };
    out.push_str(&format!("<fills count=\"{}\">\n", fills.len()));
    for fill in fills {
        write_fill(&mut out, fill);
    }
    out.push_str("</fills>\n");

    out.push_str(
        "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\n",
    );
    out.push_str(
        "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\n",
    );

    // <cellXfs>
    let default_xf = [CellXf::default()];
    let xfs: &[CellXf] = if styles.cell_xfs.is_empty() {
        &default_xf
    } else {
        &styles.cell_xfs
    };
    out.push_str(&format!("<cellXfs count=\"{}\">\n", xfs.len()));
    for xf in xfs {
        write_xf(&mut out, xf);
    }
    out.push_str("</cellXfs>\n");

    out.push_str(
        "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\n",
    );
    out.push_str("<dxfs count=\"0\"/>\n");
    out.push_str("</styleSheet>");
    out
}

fn write_font(out: &mut String, font: &RawFont) {
    out.push_str("<font>");
    if font.bold {
        out.push_str("<b/>");
    }
    out.push_str(&format!("<sz val=\"{}\"/>", font.size.unwrap_or(11.0)));
    match &font.color {
        Some(rgb) => out.push_str(&format!("<color rgb=\"FF{rgb}\"/>")),
        None => out.push_str("<color theme=\"1\"/>"),
    }
    out.push_str(&format!(
        "<name val=\"{}\"/><family val=\"2\"/>",
        xml_escape(font.name.as_deref().unwrap_or("Calibri"))
    ));
    out.push_str("</font>\n");
}

fn write_fill(out: &mut String, fill: &RawFill) {
    let pattern = fill.pattern_type.as_deref().unwrap_or("none");
    match &fill.fg_color {
        Some(rgb) => out.push_str(&format!(
            "<fill><patternFill patternType=\"{}\"><fgColor rgb=\"FF{rgb}\"/><bgColor indexed=\"64\"/></patternFill></fill>\n",
            xml_escape(pattern)
        )),
        None => out.push_str(&format!(
            "<fill><patternFill patternType=\"{}\"/></fill>\n",
            xml_escape(pattern)
        )),
    }
}

fn write_xf(out: &mut String, xf: &CellXf) {
    let font_id = xf.font_id.unwrap_or(0);
    let fill_id = xf.fill_id.unwrap_or(0);
    out.push_str(&format!(
        "<xf numFmtId=\"0\" fontId=\"{font_id}\" fillId=\"{fill_id}\" borderId=\"0\" xfId=\"0\""
    ));
    if font_id != 0 {
        out.push_str(" applyFont=\"1\"");
    }
    if fill_id != 0 {
        out.push_str(" applyFill=\"1\"");
    }

    let Some(alignment) = &xf.alignment else {
        out.push_str("/>\n");
        return;
    };
    out.push_str(" applyAlignment=\"1\"><alignment");
    if let Some(h) = &alignment.horizontal {
        out.push_str(&format!(" horizontal=\"{}\"", xml_escape(h)));
    }
    if let Some(v) = &alignment.vertical {
        out.push_str(&format!(" vertical=\"{}\"", xml_escape(v)));
    }
    if alignment.wrap_text {
        out.push_str(" wrapText=\"1\"");
    }
    out.push_str("/></xf>\n");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::styles::parse_styles;
    use crate::types::CellAlignment;

    #[test]
    fn empty_stylesheet_gets_required_defaults() {
        let xml = write_styles_xml(&StyleSheet::default());
        assert!(xml.contains("<fonts count=\"1\">"));
        assert!(xml.contains("<fills count=\"2\">"));
        assert!(xml.contains("patternType=\"gray125\""));
        assert!(xml.contains("<cellXfs count=\"1\">"));
    }

    #[test]
    fn written_styles_read_back() {
        let styles = StyleSheet {
            fonts: vec![
                RawFont::default(),
                RawFont {
                    bold: true,
                    color: Some("000000".to_string()),
                    ..RawFont::default()
                },
            ],
            fills: vec![
                RawFill {
                    pattern_type: Some("none".to_string()),
                    fg_color: None,
                },
                RawFill {
                    pattern_type: Some("gray125".to_string()),
                    fg_color: None,
                },
                RawFill {
                    pattern_type: Some("solid".to_string()),
                    fg_color: Some("FFFF00".to_string()),
                },
            ],
            cell_xfs: vec![
                CellXf::default(),
                CellXf {
                    font_id: Some(1),
                    fill_id: Some(2),
                    alignment: Some(CellAlignment {
                        horizontal: Some("center".to_string()),
                        vertical: Some("center".to_string()),
                        wrap_text: true,
                    }),
                },
            ],
        };

        let parsed = parse_styles(write_styles_xml(&styles).as_bytes()).unwrap();
        let resolved = parsed.resolve(Some(1));
        assert!(resolved.bold);
        assert_eq!(resolved.fill.as_deref(), Some("FFFF00"));
        assert_eq!(parsed.cell_xfs.len(), 2);
        assert_eq!(parsed.cell_xfs.get(1), styles.cell_xfs.get(1));
    }
}
