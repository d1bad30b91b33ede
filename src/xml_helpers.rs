//! Shared XML helpers for reading and writing SpreadsheetML parts.
//!
//! All attribute readers handle UTF-8 conversion safely and return `None`
//! rather than failing on malformed input.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by key.
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return std::str::from_utf8(&attr.value).ok().map(ToString::to_string);
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Returns `None` if missing. Recognizes `"1"`, `"true"` as true; anything else as false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Extract the `val` attribute as a string. Very common in XLSX XML.
pub fn attr_val(e: &BytesStart) -> Option<String> {
    attr_string(e, b"val")
}

/// Normalize an OOXML colour attribute (`AARRGGBB`, `RRGGBB`, optionally
/// `#`-prefixed) to uppercase `RRGGBB`.
pub fn argb_to_rgb(raw: &str) -> Option<String> {
    let hex = raw.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = match hex.len() {
        8 => hex.get(2..)?,
        6 => hex,
        _ => return None,
    };
    Some(rgb.to_ascii_uppercase())
}

/// Minimal XML escaping for attribute/text content.
#[must_use]
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"<sheet name="44x53" sheetId="1" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("44x53".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_numbers() {
        let e = make_start(r#"<col min="1" max="17" width="20.5" />"#);
        assert_eq!(attr_u32(&e, b"max"), Some(17));
        let width = attr_f64(&e, b"width").unwrap();
        assert!((width - 20.5).abs() < f64::EPSILON);
        assert_eq!(attr_u32(&e, b"width"), None);
    }

    #[test]
    fn test_attr_bool() {
        let e = make_start(r#"<b a="1" b="0" c="true" />"#);
        assert_eq!(attr_bool(&e, b"a"), Some(true));
        assert_eq!(attr_bool(&e, b"b"), Some(false));
        assert_eq!(attr_bool(&e, b"c"), Some(true));
        assert_eq!(attr_bool(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_val() {
        let e = make_start(r#"<sz val="11" />"#);
        assert_eq!(attr_val(&e), Some("11".to_string()));
    }

    #[test]
    fn test_argb_to_rgb() {
        assert_eq!(argb_to_rgb("FFB8E6B8"), Some("B8E6B8".to_string()));
        assert_eq!(argb_to_rgb("00ffff00"), Some("FFFF00".to_string()));
        assert_eq!(argb_to_rgb("#b8e6b8"), Some("B8E6B8".to_string()));
        assert_eq!(argb_to_rgb("B8E6"), None);
        assert_eq!(argb_to_rgb("GGGGGG"), None);
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(
            xml_escape(r#"<a & "b">'"#),
            "&lt;a &amp; &quot;b&quot;&gt;&apos;"
        );
        assert_eq!(xml_escape("Requirement Source/TED"), "Requirement Source/TED");
    }
}
