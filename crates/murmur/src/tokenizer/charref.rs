//! Character-reference sub-machine.
//!
//! Runs with the stream cursor on `&`. On any outcome other than
//! `Resolved` the cursor is restored to the ampersand; `NeedData` means the
//! whole reference is retried once more input arrives.

use crate::context::ParseContext;
use crate::errors::{ErrorOrigin, ParseErrorCode};
use crate::stream::InputStream;

use super::entities::{MAX_NAME_LEN, NAMED, c1_override};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum CharRef {
    /// Not a reference; the ampersand is plain text.
    NotARef,
    /// Resolved replacement text; the cursor sits after the reference.
    Resolved(String),
    /// Suspended at a chunk boundary.
    NeedData,
}

pub(super) fn consume(
    stream: &mut InputStream,
    ctx: &mut ParseContext,
    in_attribute: bool,
) -> CharRef {
    debug_assert_eq!(stream.peek(0), Ok('&'));
    let (line, col) = stream.position();
    stream.mark();
    stream.advance(1);

    let first = match stream.peek(0) {
        Ok(ch) => ch,
        Err(crate::stream::StreamStatus::NeedData) => {
            stream.rewind();
            return CharRef::NeedData;
        }
        Err(crate::stream::StreamStatus::Eof) => {
            stream.rewind();
            return CharRef::NotARef;
        }
    };

    let outcome = if first == '#' {
        numeric(stream, ctx, line, col)
    } else if first.is_ascii_alphanumeric() {
        named(stream, ctx, in_attribute, line, col)
    } else {
        stream.rewind();
        CharRef::NotARef
    };
    if matches!(outcome, CharRef::Resolved(_)) {
        stream.clear_mark();
    }
    outcome
}

fn numeric(stream: &mut InputStream, ctx: &mut ParseContext, line: u32, col: u32) -> CharRef {
    stream.advance(1); // '#'
    let mut hex = false;
    match stream.peek(0) {
        Ok('x' | 'X') => {
            hex = true;
            stream.advance(1);
        }
        Ok(_) => {}
        Err(crate::stream::StreamStatus::NeedData) => {
            stream.rewind();
            return CharRef::NeedData;
        }
        Err(crate::stream::StreamStatus::Eof) => {}
    }

    let mut value: u32 = 0;
    let mut digits = 0usize;
    let mut terminated = false;
    loop {
        match stream.peek(0) {
            Ok(ch) => {
                let digit = if hex {
                    ch.to_digit(16)
                } else {
                    ch.to_digit(10)
                };
                match digit {
                    Some(d) => {
                        value = value.saturating_mul(if hex { 16 } else { 10 }).saturating_add(d);
                        digits += 1;
                        stream.advance(1);
                    }
                    None => {
                        if ch == ';' {
                            stream.advance(1);
                            terminated = true;
                        }
                        break;
                    }
                }
            }
            Err(crate::stream::StreamStatus::NeedData) => {
                stream.rewind();
                return CharRef::NeedData;
            }
            Err(crate::stream::StreamStatus::Eof) => break,
        }
    }

    if digits == 0 {
        ctx.record_error(
            ErrorOrigin::Tokenizer,
            ParseErrorCode::InvalidCharacterReference,
            line,
            col,
        );
        stream.rewind();
        return CharRef::NotARef;
    }
    if !terminated {
        ctx.record_error(
            ErrorOrigin::Tokenizer,
            ParseErrorCode::MissingSemicolonAfterCharacterReference,
            line,
            col,
        );
    }

    let ch = match value {
        0 => {
            ctx.record_error(
                ErrorOrigin::Tokenizer,
                ParseErrorCode::InvalidCharacterReference,
                line,
                col,
            );
            '\u{FFFD}'
        }
        0x80..=0x9F => {
            ctx.record_error(
                ErrorOrigin::Tokenizer,
                ParseErrorCode::ControlCharacterReference,
                line,
                col,
            );
            c1_override(value).unwrap_or('\u{FFFD}')
        }
        0xD800..=0xDFFF => {
            ctx.record_error(
                ErrorOrigin::Tokenizer,
                ParseErrorCode::CharacterReferenceOutOfRange,
                line,
                col,
            );
            '\u{FFFD}'
        }
        v if v > 0x10FFFF => {
            ctx.record_error(
                ErrorOrigin::Tokenizer,
                ParseErrorCode::CharacterReferenceOutOfRange,
                line,
                col,
            );
            '\u{FFFD}'
        }
        v => char::from_u32(v).unwrap_or('\u{FFFD}'),
    };
    CharRef::Resolved(ch.to_string())
}

fn named(
    stream: &mut InputStream,
    ctx: &mut ParseContext,
    in_attribute: bool,
    line: u32,
    col: u32,
) -> CharRef {
    let mut buf = String::new();
    let mut last_match: Option<(usize, &'static str)> = None;
    let mut following: Option<char> = None;
    let mut saw_semicolon = false;

    loop {
        match stream.peek(0) {
            Ok(ch) if ch.is_ascii_alphanumeric() && buf.len() < MAX_NAME_LEN => {
                buf.push(ch);
                stream.advance(1);
                if let Some(replacement) = NAMED.get(buf.as_str()) {
                    last_match = Some((buf.len(), replacement));
                }
            }
            Ok(';') => {
                buf.push(';');
                stream.advance(1);
                saw_semicolon = true;
                if let Some(replacement) = NAMED.get(buf.as_str()) {
                    last_match = Some((buf.len(), replacement));
                }
                break;
            }
            Ok(ch) => {
                following = Some(ch);
                break;
            }
            Err(crate::stream::StreamStatus::NeedData) => {
                stream.rewind();
                return CharRef::NeedData;
            }
            Err(crate::stream::StreamStatus::Eof) => break,
        }
    }

    let Some((matched_len, replacement)) = last_match else {
        if saw_semicolon {
            ctx.record_error(
                ErrorOrigin::Tokenizer,
                ParseErrorCode::InvalidCharacterReference,
                line,
                col,
            );
        }
        stream.rewind();
        return CharRef::NotARef;
    };

    let match_has_semicolon = buf.as_bytes().get(matched_len - 1) == Some(&b';');
    if !match_has_semicolon {
        // Legacy carve-out: inside an attribute a semicolonless match
        // followed by `=` or an alphanumeric is not a reference.
        let after = buf[matched_len..].chars().next().or(following);
        if in_attribute && matches!(after, Some(c) if c == '=' || c.is_ascii_alphanumeric()) {
            stream.rewind();
            return CharRef::NotARef;
        }
        ctx.record_error(
            ErrorOrigin::Tokenizer,
            ParseErrorCode::MissingSemicolonAfterCharacterReference,
            line,
            col,
        );
    }

    // Re-position just past the matched name (we may have read further while
    // searching for a longer match).
    stream.rewind();
    stream.advance(1 + matched_len);
    CharRef::Resolved(replacement.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::stream::InputStream;

    fn stream_for(text: &str) -> (InputStream, ParseContext) {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(Some(b"utf-8"));
        stream.append(text.as_bytes(), &mut ctx).unwrap();
        stream.append(&[], &mut ctx).unwrap();
        (stream, ctx)
    }

    #[test]
    fn named_reference_resolves_and_consumes() {
        let (mut stream, mut ctx) = stream_for("&amp;rest");
        let out = consume(&mut stream, &mut ctx, false);
        assert_eq!(out, CharRef::Resolved("&".to_string()));
        assert_eq!(stream.peek(0), Ok('r'));
        assert_eq!(ctx.counters.parse_errors, 0);
    }

    #[test]
    fn longest_match_wins() {
        // "&not" is legacy; "&notin;" is longer and must win.
        let (mut stream, mut ctx) = stream_for("&notin;x");
        let out = consume(&mut stream, &mut ctx, false);
        assert_eq!(out, CharRef::Resolved("\u{2209}".to_string()));
        assert_eq!(stream.peek(0), Ok('x'));
    }

    #[test]
    fn legacy_prefix_survives_failed_longer_match() {
        // "&notit;" is undefined, so the legacy "&not" prefix applies and
        // "it;" stays in the stream.
        let (mut stream, mut ctx) = stream_for("&notit;x");
        let out = consume(&mut stream, &mut ctx, false);
        assert_eq!(out, CharRef::Resolved("\u{AC}".to_string()));
        assert_eq!(stream.peek(0), Ok('i'));
        assert_eq!(ctx.counters.parse_errors, 1, "missing semicolon is an error");
    }

    #[test]
    fn unknown_name_is_not_a_reference() {
        let (mut stream, mut ctx) = stream_for("&nosuch;x");
        let out = consume(&mut stream, &mut ctx, false);
        assert_eq!(out, CharRef::NotARef);
        assert_eq!(stream.peek(0), Ok('&'), "cursor restored to ampersand");
        assert_eq!(ctx.counters.parse_errors, 1, "semicolon-terminated unknown");
    }

    #[test]
    fn attribute_carve_out_for_legacy_without_semicolon() {
        let (mut stream, mut ctx) = stream_for("&not=1");
        let out = consume(&mut stream, &mut ctx, true);
        assert_eq!(out, CharRef::NotARef);
        // Outside attributes the same input resolves.
        let (mut stream, mut ctx2) = stream_for("&not=1");
        let out = consume(&mut stream, &mut ctx2, false);
        assert_eq!(out, CharRef::Resolved("\u{AC}".to_string()));
        assert_eq!(ctx.counters.parse_errors, 0);
    }

    #[test]
    fn decimal_and_hex_numeric_references() {
        let (mut stream, mut ctx) = stream_for("&#215;x");
        assert_eq!(
            consume(&mut stream, &mut ctx, false),
            CharRef::Resolved("×".to_string())
        );
        let (mut stream, mut ctx) = stream_for("&#xD7;x");
        assert_eq!(
            consume(&mut stream, &mut ctx, false),
            CharRef::Resolved("×".to_string())
        );
    }

    #[test]
    fn numeric_applies_windows_1252_overrides() {
        let (mut stream, mut ctx) = stream_for("&#x80;");
        assert_eq!(
            consume(&mut stream, &mut ctx, false),
            CharRef::Resolved("\u{20AC}".to_string())
        );
        assert_eq!(ctx.counters.parse_errors, 1);
    }

    #[test]
    fn numeric_out_of_range_and_surrogates_become_replacement() {
        for input in ["&#x110000;", "&#xD800;", "&#0;"] {
            let (mut stream, mut ctx) = stream_for(input);
            assert_eq!(
                consume(&mut stream, &mut ctx, false),
                CharRef::Resolved("\u{FFFD}".to_string()),
                "input {input}"
            );
        }
    }

    #[test]
    fn numeric_without_digits_is_not_a_reference() {
        let (mut stream, mut ctx) = stream_for("&#;x");
        assert_eq!(consume(&mut stream, &mut ctx, false), CharRef::NotARef);
        assert_eq!(stream.peek(0), Ok('&'));
    }

    #[test]
    fn chunk_boundary_inside_reference_suspends_and_retries() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(Some(b"utf-8"));
        stream.append(b"&am", &mut ctx).unwrap();
        assert_eq!(consume(&mut stream, &mut ctx, false), CharRef::NeedData);
        assert_eq!(stream.peek(0), Ok('&'));
        stream.append(b"p;x", &mut ctx).unwrap();
        assert_eq!(
            consume(&mut stream, &mut ctx, false),
            CharRef::Resolved("&".to_string())
        );
        assert_eq!(stream.peek(0), Ok('x'));
    }

    #[test]
    fn eof_right_after_ampersand_is_literal() {
        let (mut stream, mut ctx) = stream_for("&");
        assert_eq!(consume(&mut stream, &mut ctx, false), CharRef::NotARef);
    }
}
