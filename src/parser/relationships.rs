//! Relationship parsing - workbook relationships, sheet list, shared strings, stylesheet.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::Result;
use crate::types::StyleSheet;

use super::styles::parse_styles;
use super::worksheet::SheetInfo;

/// What a `<sheet>` entry of the workbook points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum SheetKind {
    Worksheet,
    Chartsheet,
    Dialogsheet,
    Macrosheet,
}

impl SheetKind {
    /// Classify a relationship `Type` URI by its last path segment, so both
    /// transitional and strict OOXML namespaces match.
    fn from_rel_type(rel_type: &str) -> Option<Self> {
        match rel_type.rsplit('/').next()? {
            "worksheet" => Some(Self::Worksheet),
            "chartsheet" => Some(Self::Chartsheet),
            "dialogsheet" => Some(Self::Dialogsheet),
            "xlMacrosheet" | "xlIntlMacrosheet" | "macrosheet" => Some(Self::Macrosheet),
            _ => None,
        }
    }
}

/// A sheet relationship target
#[derive(Debug, Clone)]
pub(super) struct SheetPart {
    pub kind: SheetKind,
    /// Full path inside the package, e.g. "xl/worksheets/sheet1.xml"
    pub path: String,
}

/// Workbook relationships parsed from xl/_rels/workbook.xml.rels
///
/// Paths are resolved relative to the xl/ directory and stored as full paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// Whether the relationships part exists at all
    pub present: bool,
    /// Map of rId -> sheet part, for every sheet-like relationship
    pub sheets: HashMap<String, SheetPart>,
    /// Path to shared strings file (e.g., "xl/sharedStrings.xml")
    pub shared_strings: Option<String>,
    /// Path to styles file (e.g., "xl/styles.xml")
    pub styles: Option<String>,
}

impl WorkbookRelationships {
    /// The worksheet part to read for a `<sheet>` entry.
    ///
    /// Chart, dialog and macro sheets have no cell grid and resolve to
    /// `None`, as does an rId the relationships part does not list. The
    /// positional `sheet{n}.xml` guess is only made when the package has
    /// no relationships part to consult.
    fn worksheet_path(&self, name: &str, r_id: &str, position: usize) -> Option<String> {
        if !self.present {
            return Some(format!("xl/worksheets/sheet{position}.xml"));
        }
        match self.sheets.get(r_id) {
            Some(SheetPart {
                kind: SheetKind::Worksheet,
                path,
            }) => Some(path.clone()),
            Some(part) => {
                tracing::debug!(sheet = name, kind = ?part.kind, "sheet has no cell grid");
                None
            }
            None => {
                tracing::warn!(sheet = name, r_id, "sheet relationship not found");
                None
            }
        }
    }
}

fn utf8_attr(value: &[u8]) -> String {
    std::str::from_utf8(value).unwrap_or("").to_string()
}

/// Parse workbook relationships from xl/_rels/workbook.xml.rels
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookRelationships {
    let mut rels = WorkbookRelationships::default();

    let Ok(file) = archive.by_name("xl/_rels/workbook.xml.rels") else {
        return rels; // Relationships file is optional
    };
    rels.present = true;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = String::new();
                    let mut target = String::new();
                    let mut rel_type = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = utf8_attr(&attr.value),
                            b"Target" => target = utf8_attr(&attr.value),
                            b"Type" => rel_type = utf8_attr(&attr.value),
                            _ => {}
                        }
                    }

                    let full_path = if let Some(stripped) = target.strip_prefix('/') {
                        stripped.to_string()
                    } else {
                        format!("xl/{target}")
                    };

                    if let Some(kind) = SheetKind::from_rel_type(&rel_type) {
                        if !id.is_empty() && !target.is_empty() {
                            rels.sheets.insert(
                                id,
                                SheetPart {
                                    kind,
                                    path: full_path,
                                },
                            );
                        }
                    } else if rel_type.contains("sharedStrings") {
                        rels.shared_strings = Some(full_path);
                    } else if rel_type.contains("/styles") {
                        rels.styles = Some(full_path);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Sheet names and part paths from xl/workbook.xml, in workbook order.
///
/// A workbook part that is present but not well-formed is an error; the
/// sheet list is the one thing an upload cannot be read without.
pub(super) fn get_sheet_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &WorkbookRelationships,
) -> Result<Vec<SheetInfo>> {
    let file = archive.by_name("xl/workbook.xml")?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut sheets = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut r_id = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => {
                            name = attr
                                .unescape_value()
                                .map_or_else(|_| utf8_attr(&attr.value), |v| v.into_owned());
                        }
                        // r:id attribute (namespace prefixed)
                        key if key.ends_with(b":id") || key == b"id" => {
                            r_id = utf8_attr(&attr.value);
                        }
                        _ => {}
                    }
                }

                if !name.is_empty() {
                    let path = relationships.worksheet_path(&name, &r_id, sheets.len() + 1);
                    sheets.push(SheetInfo { name, path });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Parse shared strings from shared strings file
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    let Ok(file) = archive.by_name(sst_path) else {
        return Vec::new(); // SharedStrings is optional
    };

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current_string = String::new();
    let mut in_si = false;
    let mut in_t = false;
    // Phonetic runs (<rPh>) carry furigana, not cell text
    let mut in_rph = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current_string.clear();
                }
                b"rPh" => in_rph = true,
                b"t" if in_si && !in_rph => in_t = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current_string.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current_string));
                    in_si = false;
                }
                b"rPh" => in_rph = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    strings
}

/// Parse stylesheet from styles file
pub(super) fn parse_stylesheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<StyleSheet> {
    let styles_path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(styles_path) else {
        return Ok(StyleSheet::default());
    };

    let reader = BufReader::new(file);
    parse_styles(reader)
}
