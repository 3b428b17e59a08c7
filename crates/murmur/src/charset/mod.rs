//! Charset detection: BOM sniffing, encoding-label canonicalization and
//! `<meta>` content extraction.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

/// Provenance of the stream's current encoding, in increasing confidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CharsetSource {
    Unknown,
    /// Sniffing fallback; a later `<meta charset>` may still change it.
    Tentative,
    /// Byte-order mark.
    Detected,
    /// `<meta charset>` or `http-equiv` content-type.
    Meta,
    /// Declared out-of-band (e.g. HTTP header) by the embedder.
    DocumentSpecified,
}

/// Outcome of BOM sniffing over the first bytes of the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BomSniff {
    /// BOM found; `usize` is its byte length to skip.
    Found(&'static Encoding, usize),
    /// The available bytes are a strict prefix of a BOM.
    NeedData,
    NotFound,
}

/// Sniff a byte-order mark. With fewer than 3 bytes available and no EOF the
/// answer may still change, so the caller must wait.
pub fn sniff_bom(bytes: &[u8], eof: bool) -> BomSniff {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return BomSniff::Found(UTF_8, 3);
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return BomSniff::Found(UTF_16BE, 2);
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return BomSniff::Found(UTF_16LE, 2);
    }
    let still_prefix = matches!(bytes, [] | [0xEF] | [0xEF, 0xBB] | [0xFE] | [0xFF]);
    if still_prefix && !eof {
        BomSniff::NeedData
    } else {
        BomSniff::NotFound
    }
}

/// Canonicalize an encoding label via the WHATWG registry.
pub fn for_label(label: &[u8]) -> Option<&'static Encoding> {
    Encoding::for_label(label)
}

/// Canonicalize a label declared in document content (`<meta>`).
///
/// UTF-16 declarations are coerced to UTF-8 and x-user-defined to
/// windows-1252, per the change-the-encoding rules.
pub fn for_meta_label(label: &[u8]) -> Option<&'static Encoding> {
    let enc = Encoding::for_label(label)?;
    if enc == UTF_16BE || enc == UTF_16LE {
        return Some(UTF_8);
    }
    if enc.name() == "x-user-defined" {
        return Some(WINDOWS_1252);
    }
    Some(enc)
}

/// The fallback encoding used when nothing was detected or declared.
pub fn fallback() -> &'static Encoding {
    WINDOWS_1252
}

/// Extract a charset from a `content` attribute value of the form
/// `text/html; charset=...` (the "extracting a character encoding from a meta
/// element" algorithm).
pub fn charset_from_content(content: &str) -> Option<&'static Encoding> {
    let bytes = content.as_bytes();
    let mut position = 0;
    loop {
        let rest = &bytes[position..];
        let found = rest
            .windows(7)
            .position(|w| w.eq_ignore_ascii_case(b"charset"))?;
        position += found + 7;

        let mut i = position;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            // "charset" without '='; resume the scan after it.
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        let value = match bytes[i] {
            quote @ (b'"' | b'\'') => {
                let start = i + 1;
                let end = bytes[start..].iter().position(|&b| b == quote)?;
                &bytes[start..start + end]
            }
            _ => {
                let start = i;
                let mut end = start;
                while end < bytes.len() && bytes[end] != b';' && !bytes[end].is_ascii_whitespace() {
                    end += 1;
                }
                &bytes[start..end]
            }
        };
        return for_meta_label(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_sniff_detects_each_family() {
        assert_eq!(
            sniff_bom(&[0xEF, 0xBB, 0xBF, b'x'], false),
            BomSniff::Found(UTF_8, 3)
        );
        assert_eq!(sniff_bom(&[0xFE, 0xFF], false), BomSniff::Found(UTF_16BE, 2));
        assert_eq!(sniff_bom(&[0xFF, 0xFE], false), BomSniff::Found(UTF_16LE, 2));
        assert_eq!(sniff_bom(b"<html>", false), BomSniff::NotFound);
    }

    #[test]
    fn bom_sniff_waits_on_prefixes() {
        assert_eq!(sniff_bom(&[0xEF], false), BomSniff::NeedData);
        assert_eq!(sniff_bom(&[0xEF, 0xBB], false), BomSniff::NeedData);
        assert_eq!(sniff_bom(&[], false), BomSniff::NeedData);
        // EOF resolves the ambiguity.
        assert_eq!(sniff_bom(&[0xEF], true), BomSniff::NotFound);
    }

    #[test]
    fn labels_canonicalize_through_the_registry() {
        assert_eq!(for_label(b"latin1").unwrap().name(), "windows-1252");
        assert_eq!(for_label(b"  UTF-8  ").unwrap().name(), "UTF-8");
        assert!(for_label(b"not-a-charset").is_none());
    }

    #[test]
    fn meta_labels_coerce_utf16_to_utf8() {
        assert_eq!(for_meta_label(b"utf-16").unwrap().name(), "UTF-8");
        assert_eq!(for_meta_label(b"utf-16be").unwrap().name(), "UTF-8");
    }

    #[test]
    fn charset_extracts_from_content_type() {
        assert_eq!(
            charset_from_content("text/html; charset=utf-8").unwrap().name(),
            "UTF-8"
        );
        assert_eq!(
            charset_from_content("text/html; CHARSET=\"koi8-u\"").unwrap().name(),
            "KOI8-U"
        );
        assert_eq!(
            charset_from_content("text/html; charset = 'shift_jis' ;x")
                .unwrap()
                .name(),
            "Shift_JIS"
        );
        assert!(charset_from_content("text/html").is_none());
        assert!(charset_from_content("charset").is_none());
    }
}
