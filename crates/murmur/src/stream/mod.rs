//! Byte input stream: incremental charset detection and decoding, newline and
//! NUL normalization, and a restartable character cursor with look-ahead.
//!
//! Invariants:
//! - The decoded buffer is append-only while spans are live; committed spans
//!   survive `insert` (which splices at the cursor) and are only invalidated
//!   by `claim_buffer` or an accepted encoding change.
//! - The encoding changes at most twice: once when sniffing resolves, and
//!   once more for a `<meta charset>` seen before any non-ASCII code point
//!   has been consumed.

mod utf8;

use encoding_rs::{Decoder, DecoderResult, Encoding, UTF_8};

use crate::charset::{self, BomSniff, CharsetSource};
use crate::context::ParseContext;
use crate::errors::{ErrorOrigin, ParseErrorCode, ParserError};
use crate::token::Span;

/// Why the stream could not yield a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamStatus {
    /// More bytes may still arrive.
    NeedData,
    /// End of input reached and fully decoded.
    Eof,
}

/// Outcome of a requested encoding change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingChange {
    /// New encoding installed; the stream re-decoded from the start and the
    /// cursor was reset.
    Accepted,
    /// Same encoding as before; only the confidence was upgraded.
    SameEncoding,
    /// Too late (non-ASCII committed, or confidence already final); reported
    /// and otherwise a no-op.
    Refused,
}

/// Look-ahead comparison result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookahead {
    Matched,
    NotMatched,
    NeedData,
}

/// Notified with the buffer contents whenever the decoded buffer's storage
/// moves.
pub type BufferMoveHandler = Box<dyn FnMut(&str)>;

#[derive(Clone, Copy, Debug)]
struct Cursor {
    pos: usize,
    line: u32,
    col: u32,
}

pub struct InputStream {
    bytes: Vec<u8>,
    decode_pos: usize,
    eof: bool,
    finished: bool,
    claimed: bool,

    declared: Option<&'static Encoding>,
    encoding: &'static Encoding,
    source: CharsetSource,
    started: bool,
    changes: u8,
    decoder: Option<Decoder>,
    utf8_carry: Vec<u8>,

    decoded: String,
    last_was_cr: bool,
    nul_passthrough: bool,

    cursor: Cursor,
    committed_non_ascii: bool,
    mark: Option<Cursor>,

    buffer_handler: Option<BufferMoveHandler>,
    last_buffer_ptr: *const u8,
}

impl InputStream {
    /// `declared` is an out-of-band (e.g. HTTP) encoding label, treated as
    /// high confidence when no BOM overrides it.
    pub fn new(declared: Option<&[u8]>) -> Self {
        Self {
            bytes: Vec::new(),
            decode_pos: 0,
            eof: false,
            finished: false,
            claimed: false,
            declared: declared.and_then(charset::for_label),
            encoding: charset::fallback(),
            source: CharsetSource::Unknown,
            started: false,
            changes: 0,
            decoder: None,
            utf8_carry: Vec::new(),
            decoded: String::new(),
            last_was_cr: false,
            nul_passthrough: false,
            cursor: Cursor {
                pos: 0,
                line: 1,
                col: 1,
            },
            committed_non_ascii: false,
            mark: None,
            buffer_handler: None,
            last_buffer_ptr: std::ptr::null(),
        }
    }

    pub fn set_buffer_handler(&mut self, handler: BufferMoveHandler) {
        self.buffer_handler = Some(handler);
    }

    /// Suppress the U+0000 -> U+FFFD conversion for bytes decoded from here
    /// on (CDATA-like content models).
    pub fn set_nul_passthrough(&mut self, on: bool) {
        self.nul_passthrough = on;
    }

    /// Append a chunk of raw bytes. An empty chunk marks end of input.
    pub fn append(&mut self, data: &[u8], ctx: &mut ParseContext) -> Result<(), ParserError> {
        if self.claimed {
            return Err(ParserError::Invalid);
        }
        if data.is_empty() {
            self.eof = true;
        } else {
            if self.eof {
                return Err(ParserError::BadParameter);
            }
            self.bytes.extend_from_slice(data);
        }
        if !self.started {
            self.try_start();
        }
        if self.started {
            self.decode_pending(ctx);
        }
        self.notify_if_moved();
        Ok(())
    }

    /// Splice bytes (already in the document encoding) at the current read
    /// cursor, ahead of all unconsumed content. Committed spans are
    /// unaffected.
    pub fn insert(&mut self, data: &[u8], ctx: &mut ParseContext) -> Result<(), ParserError> {
        if self.claimed {
            return Err(ParserError::Invalid);
        }
        if data.is_empty() {
            return Ok(());
        }
        if !self.started {
            // Nothing consumed yet; an insert degenerates to a front append.
            self.bytes.splice(0..0, data.iter().copied());
            self.try_start();
            if self.started {
                self.decode_pending(ctx);
            }
            self.notify_if_moved();
            return Ok(());
        }

        // Decode the spliced bytes in one shot with a fresh decoder; the
        // streaming decoder's state belongs to the tail of `bytes`.
        let mut scratch = String::new();
        if self.encoding == UTF_8 {
            let mut carry = Vec::new();
            let mut replaced = utf8::decode_chunk(&mut scratch, &mut carry, data);
            replaced += utf8::flush(&mut scratch, &mut carry);
            self.report_replacements(replaced, ctx);
        } else {
            let mut decoder = self.encoding.new_decoder_without_bom_handling();
            self.decode_with(&mut decoder, data, true, &mut scratch, ctx);
        }

        let mut normalized = String::with_capacity(scratch.len());
        let held_cr = self.normalize_into(&scratch, &mut normalized, ctx);
        if held_cr {
            // A trailing CR in inserted data cannot wait for a next chunk.
            normalized.push('\n');
            self.last_was_cr = false;
        }
        self.decoded.insert_str(self.cursor.pos, &normalized);
        self.bytes
            .splice(self.decode_pos..self.decode_pos, data.iter().copied());
        self.decode_pos += data.len();
        self.notify_if_moved();
        Ok(())
    }

    /// Non-destructive look-ahead of the `offset`-th unconsumed character.
    pub fn peek(&self, offset: usize) -> Result<char, StreamStatus> {
        match self.decoded[self.cursor.pos..].chars().nth(offset) {
            Some(ch) => Ok(ch),
            None => {
                if self.finished {
                    Err(StreamStatus::Eof)
                } else {
                    Err(StreamStatus::NeedData)
                }
            }
        }
    }

    /// Commit consumption of `n` characters, updating line/column tracking.
    pub fn advance(&mut self, n: usize) {
        let mut it = self.decoded[self.cursor.pos..].chars();
        for _ in 0..n {
            let Some(ch) = it.next() else {
                debug_assert!(false, "advance past available input");
                return;
            };
            if ch == '\n' {
                self.cursor.line += 1;
                self.cursor.col = 1;
            } else {
                self.cursor.col += 1;
            }
            if !ch.is_ascii() {
                self.committed_non_ascii = true;
            }
            self.cursor.pos += ch.len_utf8();
        }
    }

    /// Snapshot the cursor. A later `rewind` restores it.
    pub fn mark(&mut self) {
        self.mark = Some(self.cursor);
    }

    /// Restore the cursor to the last `mark`.
    pub fn rewind(&mut self) {
        if let Some(saved) = self.mark.take() {
            self.cursor = saved;
        } else {
            debug_assert!(false, "rewind without a mark");
        }
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    /// Compare unconsumed input against `expected` without consuming.
    pub fn lookahead(&self, expected: &str, case_insensitive: bool) -> Lookahead {
        let mut have = self.decoded[self.cursor.pos..].chars();
        for want in expected.chars() {
            match have.next() {
                Some(got) => {
                    let matched = if case_insensitive {
                        got.eq_ignore_ascii_case(&want)
                    } else {
                        got == want
                    };
                    if !matched {
                        return Lookahead::NotMatched;
                    }
                }
                None => {
                    return if self.finished {
                        Lookahead::NotMatched
                    } else {
                        Lookahead::NeedData
                    };
                }
            }
        }
        Lookahead::Matched
    }

    /// Current charset name and how it was determined.
    pub fn read_charset(&self) -> (&'static str, CharsetSource) {
        (self.encoding.name(), self.source)
    }

    /// Install a new encoding discovered in document content.
    ///
    /// Accepted only while the current confidence is tentative and no
    /// non-ASCII character has been consumed; acceptance re-decodes the byte
    /// buffer from the start and resets the cursor.
    pub fn change_encoding(
        &mut self,
        encoding: &'static Encoding,
        ctx: &mut ParseContext,
    ) -> Result<EncodingChange, ParserError> {
        if self.claimed {
            return Err(ParserError::Invalid);
        }
        if self.started && encoding == self.encoding {
            // Confirming the current encoding only upgrades a tentative
            // guess; a BOM-backed detection outranks the meta claim.
            if matches!(
                self.source,
                CharsetSource::Unknown | CharsetSource::Tentative
            ) {
                self.source = CharsetSource::Meta;
            }
            return Ok(EncodingChange::SameEncoding);
        }
        let changeable = matches!(
            self.source,
            CharsetSource::Unknown | CharsetSource::Tentative
        );
        if !changeable || self.committed_non_ascii || self.changes >= 2 {
            ctx.record_error(
                ErrorOrigin::Stream,
                ParseErrorCode::LateEncodingChange,
                self.cursor.line,
                self.cursor.col,
            );
            return Ok(EncodingChange::Refused);
        }

        log::debug!(
            target: "murmur.stream",
            "encoding change {} -> {} (re-decoding {} bytes)",
            self.encoding.name(),
            encoding.name(),
            self.bytes.len()
        );
        self.encoding = encoding;
        self.source = CharsetSource::Meta;
        self.changes += 1;
        self.started = true;
        self.decoder = if encoding == UTF_8 {
            None
        } else {
            Some(encoding.new_decoder_without_bom_handling())
        };
        self.utf8_carry.clear();
        self.decoded.clear();
        self.last_was_cr = false;
        self.finished = false;
        self.decode_pos = 0;
        self.cursor = Cursor {
            pos: 0,
            line: 1,
            col: 1,
        };
        self.committed_non_ascii = false;
        self.mark = None;
        self.decode_pending(ctx);
        self.notify_if_moved();
        Ok(EncodingChange::Accepted)
    }

    /// Transfer ownership of the decoded document buffer to the caller.
    /// Every span handed out so far indexes into the returned string. The
    /// stream is poisoned afterwards.
    pub fn claim_buffer(&mut self) -> Result<String, ParserError> {
        if self.claimed {
            return Err(ParserError::Invalid);
        }
        self.claimed = true;
        self.bytes = Vec::new();
        Ok(std::mem::take(&mut self.decoded))
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// The decoded document seen so far.
    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    /// Byte offset of the cursor into the decoded buffer (used as span
    /// start/end by the tokenizer).
    pub fn cursor_pos(&self) -> usize {
        self.cursor.pos
    }

    /// 1-based (line, column) of the cursor.
    pub fn position(&self) -> (u32, u32) {
        (self.cursor.line, self.cursor.col)
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.decoded[span.start..span.end]
    }

    fn try_start(&mut self) {
        match charset::sniff_bom(&self.bytes, self.eof) {
            BomSniff::NeedData => {}
            BomSniff::Found(enc, skip) => {
                self.install(enc, CharsetSource::Detected, skip);
            }
            BomSniff::NotFound => {
                if let Some(declared) = self.declared {
                    self.install(declared, CharsetSource::DocumentSpecified, 0);
                } else {
                    self.install(charset::fallback(), CharsetSource::Tentative, 0);
                }
            }
        }
    }

    fn install(&mut self, encoding: &'static Encoding, source: CharsetSource, skip: usize) {
        log::debug!(
            target: "murmur.stream",
            "charset {} ({source:?})",
            encoding.name()
        );
        self.encoding = encoding;
        self.source = source;
        self.decode_pos = skip;
        self.started = true;
        self.decoder = if encoding == UTF_8 {
            None
        } else {
            Some(encoding.new_decoder_without_bom_handling())
        };
    }

    fn decode_pending(&mut self, ctx: &mut ParseContext) {
        if self.finished {
            return;
        }
        let pending = self.decode_pos..self.bytes.len();
        let mut scratch = String::new();

        if self.decoder.is_none() {
            // UTF-8 fast path with cross-chunk carry.
            let data = &self.bytes[pending.clone()];
            let mut carry = std::mem::take(&mut self.utf8_carry);
            let mut replaced = utf8::decode_chunk(&mut scratch, &mut carry, data);
            if self.eof {
                replaced += utf8::flush(&mut scratch, &mut carry);
            }
            self.utf8_carry = carry;
            self.report_replacements(replaced, ctx);
        } else {
            let mut decoder = self.decoder.take().expect("decoder present");
            let data: Vec<u8> = self.bytes[pending.clone()].to_vec();
            self.decode_with(&mut decoder, &data, self.eof, &mut scratch, ctx);
            self.decoder = Some(decoder);
        }
        self.decode_pos = pending.end;

        let mut normalized = String::with_capacity(scratch.len());
        let _held_cr = self.normalize_into(&scratch, &mut normalized, ctx);
        self.decoded.push_str(&normalized);

        if self.eof {
            if self.last_was_cr {
                self.last_was_cr = false;
            }
            self.finished = true;
        }
    }

    fn decode_with(
        &mut self,
        decoder: &mut Decoder,
        mut data: &[u8],
        last: bool,
        out: &mut String,
        ctx: &mut ParseContext,
    ) {
        loop {
            let needed = decoder
                .max_utf8_buffer_length_without_replacement(data.len())
                .unwrap_or(8192)
                .clamp(16, 8192);
            out.reserve(needed);
            let (result, read) = decoder.decode_to_string_without_replacement(data, out, last);
            data = &data[read..];
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(_, _) => {
                    out.push('\u{FFFD}');
                    self.report_replacements(1, ctx);
                }
            }
        }
    }

    fn report_replacements(&self, count: u32, ctx: &mut ParseContext) {
        for _ in 0..count {
            ctx.record_error(
                ErrorOrigin::Stream,
                ParseErrorCode::InvalidByteSequence,
                self.cursor.line,
                self.cursor.col,
            );
        }
    }

    /// Newline and NUL normalization. Returns true when the chunk ended on a
    /// CR whose LF-swallowing decision is deferred to the next chunk.
    fn normalize_into(&mut self, input: &str, out: &mut String, ctx: &mut ParseContext) -> bool {
        // Fast path: nothing to normalize in this chunk.
        if !self.last_was_cr && memchr::memchr2(b'\r', b'\0', input.as_bytes()).is_none() {
            out.push_str(input);
            return false;
        }
        for ch in input.chars() {
            if std::mem::replace(&mut self.last_was_cr, false) && ch == '\n' {
                continue;
            }
            match ch {
                '\r' => {
                    out.push('\n');
                    self.last_was_cr = true;
                }
                '\0' if !self.nul_passthrough => {
                    ctx.record_error(
                        ErrorOrigin::Stream,
                        ParseErrorCode::UnexpectedNullCharacter,
                        self.cursor.line,
                        self.cursor.col,
                    );
                    out.push('\u{FFFD}');
                }
                _ => out.push(ch),
            }
        }
        self.last_was_cr
    }

    fn notify_if_moved(&mut self) {
        let ptr = self.decoded.as_ptr();
        if ptr != self.last_buffer_ptr {
            self.last_buffer_ptr = ptr;
            if let Some(handler) = self.buffer_handler.as_mut() {
                handler(&self.decoded);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(stream: &mut InputStream) -> String {
        let mut out = String::new();
        while let Ok(ch) = stream.peek(0) {
            out.push(ch);
            stream.advance(1);
        }
        out
    }

    fn stream_of(chunks: &[&[u8]]) -> (InputStream, ParseContext) {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        for chunk in chunks {
            stream.append(chunk, &mut ctx).expect("append");
        }
        stream.append(&[], &mut ctx).expect("eof");
        (stream, ctx)
    }

    #[test]
    fn ascii_defaults_to_windows_1252_tentative() {
        let (mut stream, _ctx) = stream_of(&[b"hello"]);
        assert_eq!(
            stream.read_charset(),
            ("windows-1252", CharsetSource::Tentative)
        );
        assert_eq!(collect(&mut stream), "hello");
        assert_eq!(stream.peek(0), Err(StreamStatus::Eof));
    }

    #[test]
    fn utf8_bom_is_detected_and_skipped() {
        let (mut stream, _ctx) = stream_of(&[&[0xEF, 0xBB, 0xBF], b"<html>"]);
        assert_eq!(stream.read_charset(), ("UTF-8", CharsetSource::Detected));
        assert_eq!(collect(&mut stream), "<html>");
    }

    #[test]
    fn utf16le_bom_decodes() {
        // "hi" in UTF-16LE behind its BOM.
        let (mut stream, _ctx) = stream_of(&[&[0xFF, 0xFE, b'h', 0x00, b'i', 0x00]]);
        assert_eq!(stream.read_charset(), ("UTF-16LE", CharsetSource::Detected));
        assert_eq!(collect(&mut stream), "hi");
    }

    #[test]
    fn declared_encoding_wins_without_bom() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(Some(b"koi8-u"));
        stream.append(&[0xfc, 0xce], &mut ctx).unwrap();
        stream.append(&[], &mut ctx).unwrap();
        assert_eq!(
            stream.read_charset(),
            ("KOI8-U", CharsetSource::DocumentSpecified)
        );
        assert_eq!(collect(&mut stream), "Эн");
    }

    #[test]
    fn newlines_normalize_across_chunk_boundaries() {
        let (mut stream, _ctx) = stream_of(&[b"a\r", b"\nb\rc\nd"]);
        assert_eq!(collect(&mut stream), "a\nb\nc\nd");
    }

    #[test]
    fn nul_becomes_replacement_character() {
        let (mut stream, ctx) = stream_of(&[b"a\0b"]);
        assert_eq!(collect(&mut stream), "a\u{FFFD}b");
        assert_eq!(ctx.counters.parse_errors, 1);
    }

    #[test]
    fn nul_passthrough_mode_keeps_raw_nul() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        stream.set_nul_passthrough(true);
        stream.append(b"a\0b", &mut ctx).unwrap();
        stream.append(&[], &mut ctx).unwrap();
        assert_eq!(collect(&mut stream), "a\0b");
        assert_eq!(ctx.counters.parse_errors, 0);
    }

    #[test]
    fn multibyte_split_across_appends_yields_one_char() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(Some(b"utf-8"));
        stream.append(&[0xE2, 0x82], &mut ctx).unwrap();
        assert_eq!(stream.peek(0), Err(StreamStatus::NeedData));
        stream.append(&[0xAC], &mut ctx).unwrap();
        assert_eq!(stream.peek(0), Ok('€'));
    }

    #[test]
    fn peek_and_advance_track_line_and_column() {
        let (mut stream, _ctx) = stream_of(&[b"ab\ncd"]);
        assert_eq!(stream.position(), (1, 1));
        stream.advance(3);
        assert_eq!(stream.position(), (2, 1));
        stream.advance(1);
        assert_eq!(stream.position(), (2, 2));
    }

    #[test]
    fn mark_rewind_restores_cursor_and_position() {
        let (mut stream, _ctx) = stream_of(&[b"abcdef"]);
        stream.advance(2);
        stream.mark();
        stream.advance(3);
        assert_eq!(stream.peek(0), Ok('f'));
        stream.rewind();
        assert_eq!(stream.peek(0), Ok('c'));
        assert_eq!(stream.position(), (1, 3));
    }

    #[test]
    fn lookahead_is_case_aware() {
        let (stream, _ctx) = stream_of(&[b"DocType html"]);
        assert_eq!(stream.lookahead("doctype", true), Lookahead::Matched);
        assert_eq!(stream.lookahead("doctype", false), Lookahead::NotMatched);
    }

    #[test]
    fn lookahead_reports_need_data_before_eof() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        stream.append(b"<!-", &mut ctx).unwrap();
        stream.advance(1);
        assert_eq!(stream.lookahead("!--", true), Lookahead::NeedData);
        stream.append(b"-", &mut ctx).unwrap();
        assert_eq!(stream.lookahead("!--", true), Lookahead::Matched);
    }

    #[test]
    fn change_encoding_redecodes_from_buffer_start() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        // windows-1252 tentative; 0xE9 is e-acute there.
        stream.append(b"ab\xE9", &mut ctx).unwrap();
        stream.advance(2);
        let enc = charset::for_label(b"koi8-u").unwrap();
        let outcome = stream.change_encoding(enc, &mut ctx).unwrap();
        assert_eq!(outcome, EncodingChange::Accepted);
        assert_eq!(stream.read_charset(), ("KOI8-U", CharsetSource::Meta));
        assert_eq!(stream.cursor_pos(), 0);
        assert_eq!(stream.peek(0), Ok('a'));
    }

    #[test]
    fn change_encoding_refused_after_non_ascii_committed() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        stream.append(b"\xE9x", &mut ctx).unwrap();
        stream.advance(1); // consume the non-ASCII é
        let enc = charset::for_label(b"utf-8").unwrap();
        let outcome = stream.change_encoding(enc, &mut ctx).unwrap();
        assert_eq!(outcome, EncodingChange::Refused);
        assert_eq!(ctx.counters.parse_errors, 1);
        assert_eq!(stream.read_charset().0, "windows-1252");
    }

    #[test]
    fn change_to_same_encoding_only_upgrades_confidence() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        stream.append(b"hello", &mut ctx).unwrap();
        let enc = charset::for_label(b"windows-1252").unwrap();
        let outcome = stream.change_encoding(enc, &mut ctx).unwrap();
        assert_eq!(outcome, EncodingChange::SameEncoding);
        assert_eq!(
            stream.read_charset(),
            ("windows-1252", CharsetSource::Meta)
        );
    }

    #[test]
    fn insert_splices_at_cursor_without_touching_committed_text() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(Some(b"utf-8"));
        stream.append(b"ab", &mut ctx).unwrap();
        stream.advance(1);
        stream.insert(b"XY", &mut ctx).unwrap();
        assert_eq!(stream.decoded(), "aXYb");
        assert_eq!(stream.peek(0), Ok('X'));
        assert_eq!(&stream.decoded()[..1], "a");
    }

    #[test]
    fn claim_buffer_poisons_the_stream() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        stream.append(b"data", &mut ctx).unwrap();
        let buffer = stream.claim_buffer().unwrap();
        assert_eq!(buffer, "data");
        assert_eq!(stream.claim_buffer(), Err(ParserError::Invalid));
        assert_eq!(stream.append(b"x", &mut ctx), Err(ParserError::Invalid));
    }

    #[test]
    fn append_after_eof_is_a_bad_parameter() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        stream.append(b"x", &mut ctx).unwrap();
        stream.append(&[], &mut ctx).unwrap();
        assert_eq!(stream.append(b"y", &mut ctx), Err(ParserError::BadParameter));
    }

    #[test]
    fn buffer_handler_fires_on_reallocation() {
        use std::cell::Cell;
        use std::rc::Rc;
        let moves = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&moves);
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(None);
        stream.set_buffer_handler(Box::new(move |_| {
            counter.set(counter.get() + 1);
        }));
        stream.append(b"hello", &mut ctx).unwrap();
        assert!(moves.get() >= 1, "first allocation must notify");
    }

    #[test]
    fn malformed_utf8_yields_replacement_and_error() {
        let mut ctx = ParseContext::new();
        let mut stream = InputStream::new(Some(b"utf-8"));
        stream.append(&[b'a', 0xC3, 0x28], &mut ctx).unwrap();
        stream.append(&[], &mut ctx).unwrap();
        assert_eq!(collect(&mut stream), "a\u{FFFD}(");
        assert_eq!(ctx.counters.parse_errors, 1);
    }
}
