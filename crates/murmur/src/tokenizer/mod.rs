//! HTML5 tokenizer.
//!
//! A streaming, explicitly-coded state machine: it pulls characters from the
//! input stream and queues tokens for the driver to collect. The tokenizer is
//! resumable at any chunk boundary.
//!
//! Invariants:
//! - Chunk-equivalence: feeding input in one chunk or many yields the same
//!   token sequence, up to character-token coalescing boundaries.
//! - Consecutive character output coalesces into a single `Character` token
//!   until a non-character token (or EOF) forces a flush.
//! - Suspension preserves all in-flight state: the current token under
//!   construction, the character-reference accumulator and the content model.

mod charref;
mod entities;
mod states;

pub use states::ContentModel;
use states::State;

use std::collections::VecDeque;

use crate::context::ParseContext;
use crate::errors::{ErrorOrigin, ParseErrorCode};
use crate::stream::{InputStream, Lookahead, StreamStatus};
use crate::token::{Attribute, DoctypeData, Namespace, Span, Tag, TextValue, Token};

use charref::CharRef;

/// Result of one `pump` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pumped {
    /// A completed token.
    Token(Token),
    /// The stream ran dry mid-token; call again after more input arrives.
    NeedData,
    /// The final `Eof` token has already been delivered.
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Suspend,
}

/// Accumulates a run of characters as a span while it stays contiguous,
/// switching to an owned buffer when rewritten content appears.
#[derive(Clone, Debug, Default)]
struct RunAcc {
    start: Option<usize>,
    end: usize,
    owned: Option<String>,
}

impl RunAcc {
    fn is_active(&self) -> bool {
        self.start.is_some() || self.owned.is_some()
    }

    fn cover(&mut self, from: usize, to: usize, source: &str) {
        if from == to {
            return;
        }
        match &mut self.owned {
            Some(buf) => buf.push_str(&source[from..to]),
            None => match self.start {
                None => {
                    self.start = Some(from);
                    self.end = to;
                }
                Some(_) if self.end == from => {
                    self.end = to;
                }
                Some(start) => {
                    // Non-contiguous extension; degrade to owned.
                    let mut buf = source[start..self.end].to_string();
                    buf.push_str(&source[from..to]);
                    self.owned = Some(buf);
                    self.start = None;
                }
            },
        }
    }

    fn push_owned(&mut self, s: &str, source: &str) {
        let buf = self.owned.get_or_insert_with(|| match self.start.take() {
            Some(start) => source[start..self.end].to_string(),
            None => String::new(),
        });
        buf.push_str(s);
    }

    fn take(&mut self) -> TextValue {
        let value = match (self.owned.take(), self.start.take()) {
            (Some(buf), _) => TextValue::Owned(buf),
            (None, Some(start)) => TextValue::Span(Span::new(start, self.end)),
            (None, None) => TextValue::Owned(String::new()),
        };
        self.end = 0;
        value
    }

    fn take_opt(&mut self) -> Option<TextValue> {
        if self.is_active() {
            Some(self.take())
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default)]
struct AttrAcc {
    name: RunAcc,
    value: RunAcc,
    has_value: bool,
}

#[derive(Clone, Debug, Default)]
struct TagAcc {
    is_end: bool,
    name: RunAcc,
    attrs: Vec<AttrAcc>,
    cur: Option<AttrAcc>,
    self_closing: bool,
}

#[derive(Clone, Debug, Default)]
struct DoctypeAcc {
    name: Option<RunAcc>,
    public_id: Option<RunAcc>,
    system_id: Option<RunAcc>,
    force_quirks: bool,
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub steps: u64,
    pub tokens_emitted: u64,
}

pub struct Tokenizer {
    state: State,
    content_model: ContentModel,
    pending: VecDeque<Token>,
    text: RunAcc,
    tag: Option<TagAcc>,
    comment_start: usize,
    comment_end: usize,
    doctype: Option<DoctypeAcc>,
    /// Folded name of the last emitted start tag, for appropriate-end-tag
    /// checks in RCDATA/RAWTEXT/script data.
    last_start_tag: Option<String>,
    /// Scratch for end-tag-name and double-escape matching.
    temp: String,
    /// Decoded-buffer position of the `<` that opened the current construct.
    lt_pos: usize,
    /// Whether `<![CDATA[` opens a CDATA section (foreign content only).
    allow_cdata: bool,
    eof_emitted: bool,
    stats: TokenizerStats,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            content_model: ContentModel::Pcdata,
            pending: VecDeque::new(),
            text: RunAcc::default(),
            tag: None,
            comment_start: 0,
            comment_end: 0,
            doctype: None,
            last_start_tag: None,
            temp: String::new(),
            lt_pos: 0,
            allow_cdata: false,
            eof_emitted: false,
            stats: TokenizerStats::default(),
        }
    }

    /// Select the content model for subsequent input. Set by the tree builder
    /// on elements like `<script>`, `<style>`, `<title>`, `<textarea>`.
    pub fn set_content_model(&mut self, model: ContentModel) {
        self.content_model = model;
        self.state = model.initial_state();
    }

    pub fn content_model(&self) -> ContentModel {
        self.content_model
    }

    /// Permit `<![CDATA[` sections (the tree builder enables this while the
    /// adjusted current node is foreign).
    pub fn set_cdata_allowed(&mut self, allowed: bool) {
        self.allow_cdata = allowed;
    }

    /// Seed the appropriate-end-tag name (fragment parsing).
    pub fn set_last_start_tag(&mut self, name: &str) {
        self.last_start_tag = Some(name.to_ascii_lowercase());
    }

    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Advance the machine until a token is ready, input runs out, or the
    /// final EOF has been delivered.
    pub fn pump(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Pumped {
        loop {
            if let Some(token) = self.pending.pop_front() {
                ctx.counters.tokens_emitted = ctx.counters.tokens_emitted.saturating_add(1);
                return Pumped::Token(token);
            }
            if self.eof_emitted {
                return Pumped::Done;
            }
            self.stats.steps = self.stats.steps.saturating_add(1);
            match self.step(stream, ctx) {
                Step::Continue => {}
                Step::Suspend => return Pumped::NeedData,
            }
        }
    }

    fn step(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match self.state {
            State::Data => self.step_data(stream, ctx),
            State::Rcdata => self.step_rcdata(stream, ctx),
            State::Rawtext => self.step_rawtext(stream, ctx),
            State::ScriptData => self.step_script_data(stream, ctx),
            State::Plaintext => self.step_plaintext(stream),
            State::TagOpen => self.step_tag_open(stream, ctx),
            State::EndTagOpen => self.step_end_tag_open(stream, ctx),
            State::TagName => self.step_tag_name(stream, ctx),
            State::RcdataLessThanSign => {
                self.step_raw_less_than(stream, State::Rcdata, State::RcdataEndTagOpen)
            }
            State::RcdataEndTagOpen => {
                self.step_raw_end_tag_open(stream, State::Rcdata, State::RcdataEndTagName)
            }
            State::RcdataEndTagName => self.step_raw_end_tag_name(stream, ctx, State::Rcdata),
            State::RawtextLessThanSign => {
                self.step_raw_less_than(stream, State::Rawtext, State::RawtextEndTagOpen)
            }
            State::RawtextEndTagOpen => {
                self.step_raw_end_tag_open(stream, State::Rawtext, State::RawtextEndTagName)
            }
            State::RawtextEndTagName => self.step_raw_end_tag_name(stream, ctx, State::Rawtext),
            State::ScriptDataLessThanSign => self.step_script_less_than(stream),
            State::ScriptDataEndTagOpen => {
                self.step_raw_end_tag_open(stream, State::ScriptData, State::ScriptDataEndTagName)
            }
            State::ScriptDataEndTagName => {
                self.step_raw_end_tag_name(stream, ctx, State::ScriptData)
            }
            State::ScriptDataEscapeStart => self.step_script_escape_start(stream),
            State::ScriptDataEscapeStartDash => self.step_script_escape_start_dash(stream),
            State::ScriptDataEscaped => self.step_script_escaped(stream, ctx),
            State::ScriptDataEscapedDash => self.step_script_escaped_dash(stream, ctx),
            State::ScriptDataEscapedDashDash => self.step_script_escaped_dash_dash(stream, ctx),
            State::ScriptDataEscapedLessThanSign => self.step_script_escaped_less_than(stream),
            State::ScriptDataEscapedEndTagOpen => self.step_raw_end_tag_open(
                stream,
                State::ScriptDataEscaped,
                State::ScriptDataEscapedEndTagName,
            ),
            State::ScriptDataEscapedEndTagName => {
                self.step_raw_end_tag_name(stream, ctx, State::ScriptDataEscaped)
            }
            State::ScriptDataDoubleEscapeStart => self.step_double_escape(
                stream,
                State::ScriptDataDoubleEscaped,
                State::ScriptDataEscaped,
            ),
            State::ScriptDataDoubleEscaped => self.step_double_escaped(stream, ctx),
            State::ScriptDataDoubleEscapedDash => self.step_double_escaped_dash(stream, ctx),
            State::ScriptDataDoubleEscapedDashDash => {
                self.step_double_escaped_dash_dash(stream, ctx)
            }
            State::ScriptDataDoubleEscapedLessThanSign => {
                self.step_double_escaped_less_than(stream)
            }
            State::ScriptDataDoubleEscapeEnd => self.step_double_escape(
                stream,
                State::ScriptDataEscaped,
                State::ScriptDataDoubleEscaped,
            ),
            State::BeforeAttributeName => self.step_before_attribute_name(stream, ctx),
            State::AttributeName => self.step_attribute_name(stream, ctx),
            State::AfterAttributeName => self.step_after_attribute_name(stream, ctx),
            State::BeforeAttributeValue => self.step_before_attribute_value(stream, ctx),
            State::AttributeValueDoubleQuoted => self.step_attribute_value_quoted(stream, ctx, '"'),
            State::AttributeValueSingleQuoted => {
                self.step_attribute_value_quoted(stream, ctx, '\'')
            }
            State::AttributeValueUnquoted => self.step_attribute_value_unquoted(stream, ctx),
            State::AfterAttributeValueQuoted => self.step_after_attribute_value_quoted(stream, ctx),
            State::SelfClosingStartTag => self.step_self_closing_start_tag(stream, ctx),
            State::BogusComment => self.step_bogus_comment(stream, ctx),
            State::MarkupDeclarationOpen => self.step_markup_declaration_open(stream, ctx),
            State::CommentStart => self.step_comment_start(stream, ctx),
            State::CommentStartDash => self.step_comment_start_dash(stream, ctx),
            State::Comment => self.step_comment(stream, ctx),
            State::CommentLessThanSign => self.step_comment_less_than(stream),
            State::CommentLessThanSignBang => self.step_comment_less_than_bang(stream),
            State::CommentLessThanSignBangDash => self.step_comment_less_than_bang_dash(stream),
            State::CommentLessThanSignBangDashDash => {
                self.step_comment_less_than_bang_dash_dash(stream, ctx)
            }
            State::CommentEndDash => self.step_comment_end_dash(stream, ctx),
            State::CommentEnd => self.step_comment_end(stream, ctx),
            State::CommentEndBang => self.step_comment_end_bang(stream, ctx),
            State::Doctype => self.step_doctype(stream, ctx),
            State::BeforeDoctypeName => self.step_before_doctype_name(stream, ctx),
            State::DoctypeName => self.step_doctype_name(stream, ctx),
            State::AfterDoctypeName => self.step_after_doctype_name(stream, ctx),
            State::AfterDoctypePublicKeyword => {
                self.step_after_doctype_keyword(stream, ctx, true)
            }
            State::AfterDoctypeSystemKeyword => {
                self.step_after_doctype_keyword(stream, ctx, false)
            }
            State::BeforeDoctypePublicIdentifier => {
                self.step_before_doctype_identifier(stream, ctx, true)
            }
            State::BeforeDoctypeSystemIdentifier => {
                self.step_before_doctype_identifier(stream, ctx, false)
            }
            State::DoctypePublicIdentifierDoubleQuoted => {
                self.step_doctype_identifier(stream, ctx, true, '"')
            }
            State::DoctypePublicIdentifierSingleQuoted => {
                self.step_doctype_identifier(stream, ctx, true, '\'')
            }
            State::DoctypeSystemIdentifierDoubleQuoted => {
                self.step_doctype_identifier(stream, ctx, false, '"')
            }
            State::DoctypeSystemIdentifierSingleQuoted => {
                self.step_doctype_identifier(stream, ctx, false, '\'')
            }
            State::AfterDoctypePublicIdentifier => {
                self.step_after_doctype_public_identifier(stream, ctx)
            }
            State::BetweenDoctypePublicAndSystemIdentifiers => {
                self.step_between_doctype_identifiers(stream, ctx)
            }
            State::AfterDoctypeSystemIdentifier => {
                self.step_after_doctype_system_identifier(stream, ctx)
            }
            State::BogusDoctype => self.step_bogus_doctype(stream, ctx),
            State::CdataSection => self.step_cdata_section(stream, ctx),
            State::CdataSectionBracket => self.step_cdata_section_bracket(stream),
            State::CdataSectionEnd => self.step_cdata_section_end(stream),
        }
    }

    fn transition(&mut self, next: State) {
        if self.state != next {
            log::trace!(target: "murmur.tokenizer", "state {:?} -> {next:?}", self.state);
            self.state = next;
        }
    }

    // --- emission helpers ----------------------------------------------

    fn flush_text(&mut self) {
        if let Some(text) = self.text.take_opt() {
            if !text.is_empty() {
                self.push_token(Token::Character(text));
            }
        }
    }

    fn push_token(&mut self, token: Token) {
        log::trace!(target: "murmur.tokenizer", "emit {token:?}");
        self.stats.tokens_emitted = self.stats.tokens_emitted.saturating_add(1);
        self.pending.push_back(token);
    }

    fn emit(&mut self, token: Token) {
        self.flush_text();
        self.push_token(token);
    }

    fn emit_eof(&mut self) -> Step {
        self.flush_text();
        self.push_token(Token::Eof);
        self.eof_emitted = true;
        Step::Continue
    }

    fn error(&mut self, stream: &InputStream, ctx: &mut ParseContext, code: ParseErrorCode) {
        let (line, col) = stream.position();
        ctx.record_error(ErrorOrigin::Tokenizer, code, line, col);
    }

    /// Cover `[cursor, cursor + run)` where the run stops at any of the given
    /// ASCII bytes. Returns true when at least one character was consumed.
    fn cover_until(&mut self, stream: &mut InputStream, stops: &[u8]) -> bool {
        let (start, end, nchars) = {
            let source = stream.decoded();
            let start = stream.cursor_pos();
            let rest = &source.as_bytes()[start..];
            let len = match stops.len() {
                2 => memchr::memchr2(stops[0], stops[1], rest).unwrap_or(rest.len()),
                3 => memchr::memchr3(stops[0], stops[1], stops[2], rest).unwrap_or(rest.len()),
                _ => rest
                    .iter()
                    .position(|b| stops.contains(b))
                    .unwrap_or(rest.len()),
            };
            let run = &source[start..start + len];
            (start, start + len, run.chars().count())
        };
        if start == end {
            return false;
        }
        stream.advance(nchars);
        self.text.cover(start, end, stream.decoded());
        true
    }

    /// Consume one character and append it to the character run.
    fn cover_one(&mut self, stream: &mut InputStream) {
        let start = stream.cursor_pos();
        stream.advance(1);
        let end = stream.cursor_pos();
        self.text.cover(start, end, stream.decoded());
    }

    fn handle_charref(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
        in_attribute: bool,
    ) -> Step {
        match charref::consume(stream, ctx, in_attribute) {
            CharRef::NeedData => Step::Suspend,
            CharRef::NotARef => {
                if in_attribute {
                    self.cover_attr_one(stream);
                } else {
                    self.cover_one(stream);
                }
                Step::Continue
            }
            CharRef::Resolved(s) => {
                if in_attribute {
                    let tag = self.tag.as_mut().expect("attribute outside tag");
                    let attr = tag.cur.as_mut().expect("value outside attribute");
                    attr.value.push_owned(&s, stream.decoded());
                } else {
                    self.text.push_owned(&s, stream.decoded());
                }
                Step::Continue
            }
        }
    }

    // --- tag accumulation ----------------------------------------------

    fn start_tag_acc(&mut self, is_end: bool) {
        self.tag = Some(TagAcc {
            is_end,
            ..TagAcc::default()
        });
    }

    fn begin_attr(&mut self) {
        let tag = self.tag.as_mut().expect("attribute outside tag");
        debug_assert!(tag.cur.is_none(), "attribute already in flight");
        tag.cur = Some(AttrAcc::default());
    }

    fn commit_attr(&mut self) {
        if let Some(tag) = self.tag.as_mut() {
            if let Some(attr) = tag.cur.take() {
                tag.attrs.push(attr);
            }
        }
    }

    /// Cover one character into the current tag-name accumulator.
    fn cover_name_one(&mut self, stream: &mut InputStream) {
        let start = stream.cursor_pos();
        stream.advance(1);
        let end = stream.cursor_pos();
        let tag = self.tag.as_mut().expect("name outside tag");
        tag.name.cover(start, end, stream.decoded());
    }

    fn cover_attr_name_one(&mut self, stream: &mut InputStream) {
        let start = stream.cursor_pos();
        stream.advance(1);
        let end = stream.cursor_pos();
        let tag = self.tag.as_mut().expect("attribute outside tag");
        let attr = tag.cur.as_mut().expect("name outside attribute");
        attr.name.cover(start, end, stream.decoded());
    }

    fn cover_attr_one(&mut self, stream: &mut InputStream) {
        let start = stream.cursor_pos();
        stream.advance(1);
        let end = stream.cursor_pos();
        let tag = self.tag.as_mut().expect("attribute outside tag");
        let attr = tag.cur.as_mut().expect("value outside attribute");
        attr.value.cover(start, end, stream.decoded());
    }

    fn finish_tag(&mut self, stream: &InputStream, ctx: &mut ParseContext) {
        self.commit_attr();
        let mut tag = self.tag.take().expect("finishing a tag that never began");
        let source = stream.decoded();
        let name_value = tag.name.take();
        let name_text = name_value.resolve(source);
        let name = ctx.atoms.intern_ascii_folded(name_text);

        let mut attributes: Vec<Attribute> = Vec::with_capacity(tag.attrs.len());
        for mut acc in tag.attrs.drain(..) {
            let attr_name_value = acc.name.take();
            let attr_name = ctx
                .atoms
                .intern_ascii_folded(attr_name_value.resolve(source));
            if attributes.iter().any(|a| a.name == attr_name) {
                let (line, col) = stream.position();
                ctx.record_error(
                    ErrorOrigin::Tokenizer,
                    ParseErrorCode::DuplicateAttribute,
                    line,
                    col,
                );
                continue;
            }
            let value = if acc.has_value {
                acc.value.take()
            } else {
                TextValue::Owned(String::new())
            };
            attributes.push(Attribute {
                ns: Namespace::Html,
                name: attr_name,
                value,
            });
        }

        let token = if tag.is_end {
            if !attributes.is_empty() {
                let (line, col) = stream.position();
                ctx.record_error(
                    ErrorOrigin::Tokenizer,
                    ParseErrorCode::EndTagWithAttributes,
                    line,
                    col,
                );
            }
            if tag.self_closing {
                let (line, col) = stream.position();
                ctx.record_error(
                    ErrorOrigin::Tokenizer,
                    ParseErrorCode::EndTagWithTrailingSolidus,
                    line,
                    col,
                );
            }
            Token::EndTag(Tag {
                name,
                self_closing: tag.self_closing,
                attributes,
            })
        } else {
            self.last_start_tag = Some(name_text.to_ascii_lowercase());
            Token::StartTag(Tag {
                name,
                self_closing: tag.self_closing,
                attributes,
            })
        };
        self.emit(token);
    }

    fn finish_doctype(&mut self, force_quirks: bool) {
        let mut acc = self.doctype.take().unwrap_or_default();
        let data = DoctypeData {
            name: acc.name.as_mut().map(|r| r.take()),
            public_id: acc.public_id.as_mut().map(|r| r.take()),
            system_id: acc.system_id.as_mut().map(|r| r.take()),
            force_quirks: acc.force_quirks || force_quirks,
        };
        self.emit(Token::Doctype(data));
    }

    fn emit_comment(&mut self) {
        let span = Span::new(self.comment_start, self.comment_end.max(self.comment_start));
        self.emit(Token::Comment(TextValue::Span(span)));
    }

    fn begin_comment(&mut self, at: usize) {
        self.comment_start = at;
        self.comment_end = at;
    }

    /// Extend the comment data over already-consumed characters.
    fn comment_extend(&mut self, bytes: usize) {
        self.comment_end += bytes;
    }

    fn appropriate_end_tag(&self, stream: &InputStream) -> bool {
        let Some(tag) = self.tag.as_ref() else {
            return false;
        };
        let Some(last) = self.last_start_tag.as_deref() else {
            return false;
        };
        let source = stream.decoded();
        match (&tag.name.owned, tag.name.start) {
            (Some(owned), _) => owned.eq_ignore_ascii_case(last),
            (None, Some(start)) => source[start..tag.name.end].eq_ignore_ascii_case(last),
            (None, None) => false,
        }
    }

    // --- data-family states --------------------------------------------

    fn step_data(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => self.emit_eof(),
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                stream.advance(1);
                self.transition(State::TagOpen);
                Step::Continue
            }
            Ok('&') => self.handle_charref(stream, ctx, false),
            Ok(_) => {
                self.cover_until(stream, b"<&");
                Step::Continue
            }
        }
    }

    fn step_rcdata(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => self.emit_eof(),
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                stream.advance(1);
                self.transition(State::RcdataLessThanSign);
                Step::Continue
            }
            Ok('&') => self.handle_charref(stream, ctx, false),
            Ok(_) => {
                self.cover_until(stream, b"<&");
                Step::Continue
            }
        }
    }

    fn step_rawtext(&mut self, stream: &mut InputStream, _ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => self.emit_eof(),
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                stream.advance(1);
                self.transition(State::RawtextLessThanSign);
                Step::Continue
            }
            Ok(_) => {
                self.cover_until(stream, b"<");
                Step::Continue
            }
        }
    }

    fn step_script_data(&mut self, stream: &mut InputStream, _ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => self.emit_eof(),
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                stream.advance(1);
                self.transition(State::ScriptDataLessThanSign);
                Step::Continue
            }
            Ok(_) => {
                self.cover_until(stream, b"<");
                Step::Continue
            }
        }
    }

    fn step_plaintext(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => self.emit_eof(),
            Ok(_) => {
                // No delimiter ever leaves PLAINTEXT.
                self.cover_until(stream, b"");
                Step::Continue
            }
        }
    }

    // --- tag states -----------------------------------------------------

    fn step_tag_open(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.text.cover(self.lt_pos, self.lt_pos + 1, stream.decoded());
                self.emit_eof()
            }
            Ok('!') => {
                stream.advance(1);
                self.transition(State::MarkupDeclarationOpen);
                Step::Continue
            }
            Ok('/') => {
                stream.advance(1);
                self.transition(State::EndTagOpen);
                Step::Continue
            }
            Ok(ch) if ch.is_ascii_alphabetic() => {
                self.start_tag_acc(false);
                self.transition(State::TagName);
                Step::Continue
            }
            Ok('?') => {
                self.error(stream, ctx, ParseErrorCode::UnexpectedCharacter);
                self.begin_comment(stream.cursor_pos());
                self.transition(State::BogusComment);
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::InvalidFirstCharacterOfTagName);
                self.text.cover(self.lt_pos, self.lt_pos + 1, stream.decoded());
                self.transition(State::Data);
                Step::Continue
            }
        }
    }

    fn step_end_tag_open(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.text.cover(self.lt_pos, self.lt_pos + 2, stream.decoded());
                self.emit_eof()
            }
            Ok(ch) if ch.is_ascii_alphabetic() => {
                self.start_tag_acc(true);
                self.transition(State::TagName);
                Step::Continue
            }
            Ok('>') => {
                self.error(stream, ctx, ParseErrorCode::MissingEndTagName);
                stream.advance(1);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::InvalidFirstCharacterOfTagName);
                self.begin_comment(stream.cursor_pos());
                self.transition(State::BogusComment);
                Step::Continue
            }
        }
    }

    fn step_tag_name(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                self.transition(State::BeforeAttributeName);
                Step::Continue
            }
            Ok('/') => {
                stream.advance(1);
                self.transition(State::SelfClosingStartTag);
                Step::Continue
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.cover_name_one(stream);
                Step::Continue
            }
        }
    }

    fn step_before_attribute_name(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                Step::Continue
            }
            Ok('/') => {
                stream.advance(1);
                self.transition(State::SelfClosingStartTag);
                Step::Continue
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            Ok('=') => {
                self.error(
                    stream,
                    ctx,
                    ParseErrorCode::UnexpectedEqualsSignBeforeAttributeName,
                );
                self.begin_attr();
                self.cover_attr_name_one(stream);
                self.transition(State::AttributeName);
                Step::Continue
            }
            Ok(_) => {
                self.begin_attr();
                self.transition(State::AttributeName);
                Step::Continue
            }
        }
    }

    fn step_attribute_name(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                self.transition(State::AfterAttributeName);
                Step::Continue
            }
            Ok('/') => {
                self.commit_attr();
                stream.advance(1);
                self.transition(State::SelfClosingStartTag);
                Step::Continue
            }
            Ok('=') => {
                stream.advance(1);
                self.transition(State::BeforeAttributeValue);
                Step::Continue
            }
            Ok('>') => {
                self.commit_attr();
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(ch) => {
                if matches!(ch, '"' | '\'' | '<') {
                    self.error(
                        stream,
                        ctx,
                        ParseErrorCode::UnexpectedCharacterInAttributeName,
                    );
                }
                self.cover_attr_name_one(stream);
                Step::Continue
            }
        }
    }

    fn step_after_attribute_name(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                Step::Continue
            }
            Ok('/') => {
                self.commit_attr();
                stream.advance(1);
                self.transition(State::SelfClosingStartTag);
                Step::Continue
            }
            Ok('=') => {
                stream.advance(1);
                self.transition(State::BeforeAttributeValue);
                Step::Continue
            }
            Ok('>') => {
                self.commit_attr();
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.commit_attr();
                self.begin_attr();
                self.transition(State::AttributeName);
                Step::Continue
            }
        }
    }

    fn step_before_attribute_value(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        if let Some(tag) = self.tag.as_mut() {
            if let Some(attr) = tag.cur.as_mut() {
                attr.has_value = true;
            }
        }
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                Step::Continue
            }
            Ok('"') => {
                stream.advance(1);
                self.transition(State::AttributeValueDoubleQuoted);
                Step::Continue
            }
            Ok('\'') => {
                stream.advance(1);
                self.transition(State::AttributeValueSingleQuoted);
                Step::Continue
            }
            Ok('>') => {
                self.error(stream, ctx, ParseErrorCode::MissingAttributeValue);
                self.commit_attr();
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.transition(State::AttributeValueUnquoted);
                Step::Continue
            }
        }
    }

    fn step_attribute_value_quoted(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
        quote: char,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok(ch) if ch == quote => {
                stream.advance(1);
                self.commit_attr();
                self.transition(State::AfterAttributeValueQuoted);
                Step::Continue
            }
            Ok('&') => self.handle_charref(stream, ctx, true),
            Ok(_) => {
                let stops: &[u8] = if quote == '"' { b"\"&" } else { b"'&" };
                self.cover_attr_until(stream, stops);
                Step::Continue
            }
        }
    }

    fn step_attribute_value_unquoted(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                self.commit_attr();
                self.transition(State::BeforeAttributeName);
                Step::Continue
            }
            Ok('>') => {
                self.commit_attr();
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            Ok('&') => self.handle_charref(stream, ctx, true),
            Ok(ch) => {
                if matches!(ch, '"' | '\'' | '<' | '=' | '`') {
                    self.error(
                        stream,
                        ctx,
                        ParseErrorCode::UnexpectedCharacterInUnquotedAttributeValue,
                    );
                    self.cover_attr_one(stream);
                } else {
                    self.cover_attr_until(stream, b"\t\n\x0C >&\"'<=`");
                }
                Step::Continue
            }
        }
    }

    fn cover_attr_until(&mut self, stream: &mut InputStream, stops: &[u8]) {
        let (start, end, nchars) = {
            let source = stream.decoded();
            let start = stream.cursor_pos();
            let rest = &source.as_bytes()[start..];
            let len = rest
                .iter()
                .position(|b| stops.contains(b))
                .unwrap_or(rest.len());
            let run = &source[start..start + len];
            (start, start + len, run.chars().count())
        };
        if start == end {
            return;
        }
        stream.advance(nchars);
        let tag = self.tag.as_mut().expect("attribute outside tag");
        let attr = tag.cur.as_mut().expect("value outside attribute");
        attr.value.cover(start, end, stream.decoded());
    }

    fn step_after_attribute_value_quoted(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                self.transition(State::BeforeAttributeName);
                Step::Continue
            }
            Ok('/') => {
                stream.advance(1);
                self.transition(State::SelfClosingStartTag);
                Step::Continue
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::MissingWhitespaceBetweenAttributes);
                self.transition(State::BeforeAttributeName);
                Step::Continue
            }
        }
    }

    fn step_self_closing_start_tag(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInTag);
                self.tag = None;
                self.emit_eof()
            }
            Ok('>') => {
                if let Some(tag) = self.tag.as_mut() {
                    tag.self_closing = true;
                }
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::UnexpectedSolidusInTag);
                self.transition(State::BeforeAttributeName);
                Step::Continue
            }
        }
    }

    // --- raw-text end-tag machinery -------------------------------------

    fn step_raw_less_than(
        &mut self,
        stream: &mut InputStream,
        base: State,
        end_tag_open: State,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('/') => {
                stream.advance(1);
                self.transition(end_tag_open);
                Step::Continue
            }
            _ => {
                self.text.cover(self.lt_pos, self.lt_pos + 1, stream.decoded());
                self.transition(base);
                Step::Continue
            }
        }
    }

    fn step_raw_end_tag_open(
        &mut self,
        stream: &mut InputStream,
        base: State,
        end_tag_name: State,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok(ch) if ch.is_ascii_alphabetic() => {
                self.start_tag_acc(true);
                self.transition(end_tag_name);
                Step::Continue
            }
            _ => {
                self.text.cover(self.lt_pos, self.lt_pos + 2, stream.decoded());
                self.transition(base);
                Step::Continue
            }
        }
    }

    fn step_raw_end_tag_name(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
        base: State,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok(ch) if ch.is_ascii_alphabetic() => {
                self.cover_name_one(stream);
                Step::Continue
            }
            Ok('\t' | '\n' | '\x0C' | ' ') if self.appropriate_end_tag(stream) => {
                stream.advance(1);
                self.transition(State::BeforeAttributeName);
                Step::Continue
            }
            Ok('/') if self.appropriate_end_tag(stream) => {
                stream.advance(1);
                self.transition(State::SelfClosingStartTag);
                Step::Continue
            }
            Ok('>') if self.appropriate_end_tag(stream) => {
                stream.advance(1);
                self.finish_tag(stream, ctx);
                self.transition(State::Data);
                Step::Continue
            }
            _ => {
                // Not the appropriate end tag after all: everything consumed
                // since `<` is character data.
                self.tag = None;
                let end = stream.cursor_pos();
                self.text.cover(self.lt_pos, end, stream.decoded());
                self.transition(base);
                Step::Continue
            }
        }
    }

    // --- script data escapes --------------------------------------------

    fn step_script_less_than(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('/') => {
                stream.advance(1);
                self.transition(State::ScriptDataEndTagOpen);
                Step::Continue
            }
            Ok('!') => {
                stream.advance(1);
                self.text.cover(self.lt_pos, self.lt_pos + 2, stream.decoded());
                self.transition(State::ScriptDataEscapeStart);
                Step::Continue
            }
            _ => {
                self.text.cover(self.lt_pos, self.lt_pos + 1, stream.decoded());
                self.transition(State::ScriptData);
                Step::Continue
            }
        }
    }

    fn step_script_escape_start(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('-') => {
                self.cover_one(stream);
                self.transition(State::ScriptDataEscapeStartDash);
                Step::Continue
            }
            _ => {
                self.transition(State::ScriptData);
                Step::Continue
            }
        }
    }

    fn step_script_escape_start_dash(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('-') => {
                self.cover_one(stream);
                self.transition(State::ScriptDataEscapedDashDash);
                Step::Continue
            }
            _ => {
                self.transition(State::ScriptData);
                Step::Continue
            }
        }
    }

    fn step_script_escaped(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof()
            }
            Ok('-') => {
                self.cover_one(stream);
                self.transition(State::ScriptDataEscapedDash);
                Step::Continue
            }
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                stream.advance(1);
                self.transition(State::ScriptDataEscapedLessThanSign);
                Step::Continue
            }
            Ok(_) => {
                self.cover_until(stream, b"-<");
                Step::Continue
            }
        }
    }

    fn step_script_escaped_dash(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof()
            }
            Ok('-') => {
                self.cover_one(stream);
                self.transition(State::ScriptDataEscapedDashDash);
                Step::Continue
            }
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                stream.advance(1);
                self.transition(State::ScriptDataEscapedLessThanSign);
                Step::Continue
            }
            Ok(_) => {
                self.cover_one(stream);
                self.transition(State::ScriptDataEscaped);
                Step::Continue
            }
        }
    }

    fn step_script_escaped_dash_dash(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof()
            }
            Ok('-') => {
                self.cover_one(stream);
                Step::Continue
            }
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                stream.advance(1);
                self.transition(State::ScriptDataEscapedLessThanSign);
                Step::Continue
            }
            Ok('>') => {
                self.cover_one(stream);
                self.transition(State::ScriptData);
                Step::Continue
            }
            Ok(_) => {
                self.cover_one(stream);
                self.transition(State::ScriptDataEscaped);
                Step::Continue
            }
        }
    }

    fn step_script_escaped_less_than(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('/') => {
                stream.advance(1);
                self.temp.clear();
                self.transition(State::ScriptDataEscapedEndTagOpen);
                Step::Continue
            }
            Ok(ch) if ch.is_ascii_alphabetic() => {
                self.text.cover(self.lt_pos, self.lt_pos + 1, stream.decoded());
                self.temp.clear();
                self.transition(State::ScriptDataDoubleEscapeStart);
                Step::Continue
            }
            _ => {
                self.text.cover(self.lt_pos, self.lt_pos + 1, stream.decoded());
                self.transition(State::ScriptDataEscaped);
                Step::Continue
            }
        }
    }

    /// Shared by DoubleEscapeStart and DoubleEscapeEnd: consume an element
    /// name, emitting it as characters, and pick the next state by whether it
    /// spells "script".
    fn step_double_escape(
        &mut self,
        stream: &mut InputStream,
        on_script: State,
        otherwise: State,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok(ch) if ch.is_ascii_alphabetic() => {
                self.temp.push(ch.to_ascii_lowercase());
                self.cover_one(stream);
                Step::Continue
            }
            Ok('\t' | '\n' | '\x0C' | ' ' | '/' | '>') => {
                let next = if self.temp == "script" {
                    on_script
                } else {
                    otherwise
                };
                self.cover_one(stream);
                self.transition(next);
                Step::Continue
            }
            _ => {
                let back = if self.state == State::ScriptDataDoubleEscapeStart {
                    State::ScriptDataEscaped
                } else {
                    State::ScriptDataDoubleEscaped
                };
                self.transition(back);
                Step::Continue
            }
        }
    }

    fn step_double_escaped(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof()
            }
            Ok('-') => {
                self.cover_one(stream);
                self.transition(State::ScriptDataDoubleEscapedDash);
                Step::Continue
            }
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                self.cover_one(stream);
                self.transition(State::ScriptDataDoubleEscapedLessThanSign);
                Step::Continue
            }
            Ok(_) => {
                self.cover_until(stream, b"-<");
                Step::Continue
            }
        }
    }

    fn step_double_escaped_dash(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof()
            }
            Ok('-') => {
                self.cover_one(stream);
                self.transition(State::ScriptDataDoubleEscapedDashDash);
                Step::Continue
            }
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                self.cover_one(stream);
                self.transition(State::ScriptDataDoubleEscapedLessThanSign);
                Step::Continue
            }
            Ok(_) => {
                self.cover_one(stream);
                self.transition(State::ScriptDataDoubleEscaped);
                Step::Continue
            }
        }
    }

    fn step_double_escaped_dash_dash(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof()
            }
            Ok('-') => {
                self.cover_one(stream);
                Step::Continue
            }
            Ok('<') => {
                self.lt_pos = stream.cursor_pos();
                self.cover_one(stream);
                self.transition(State::ScriptDataDoubleEscapedLessThanSign);
                Step::Continue
            }
            Ok('>') => {
                self.cover_one(stream);
                self.transition(State::ScriptData);
                Step::Continue
            }
            Ok(_) => {
                self.cover_one(stream);
                self.transition(State::ScriptDataDoubleEscaped);
                Step::Continue
            }
        }
    }

    fn step_double_escaped_less_than(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('/') => {
                self.cover_one(stream);
                self.temp.clear();
                self.transition(State::ScriptDataDoubleEscapeEnd);
                Step::Continue
            }
            _ => {
                self.transition(State::ScriptDataDoubleEscaped);
                Step::Continue
            }
        }
    }

    // --- comments --------------------------------------------------------

    fn step_bogus_comment(&mut self, stream: &mut InputStream, _ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.emit_comment();
                self.emit_eof()
            }
            Ok('>') => {
                stream.advance(1);
                self.emit_comment();
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                let start = stream.cursor_pos();
                let (end, nchars) = {
                    let source = stream.decoded();
                    let rest = &source.as_bytes()[start..];
                    let len = memchr::memchr(b'>', rest).unwrap_or(rest.len());
                    (start + len, source[start..start + len].chars().count())
                };
                stream.advance(nchars);
                self.comment_end = end;
                Step::Continue
            }
        }
    }

    fn step_markup_declaration_open(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.lookahead("--", false) {
            Lookahead::NeedData => return Step::Suspend,
            Lookahead::Matched => {
                stream.advance(2);
                self.begin_comment(stream.cursor_pos());
                self.transition(State::CommentStart);
                return Step::Continue;
            }
            Lookahead::NotMatched => {}
        }
        match stream.lookahead("doctype", true) {
            Lookahead::NeedData => return Step::Suspend,
            Lookahead::Matched => {
                stream.advance(7);
                self.transition(State::Doctype);
                return Step::Continue;
            }
            Lookahead::NotMatched => {}
        }
        match stream.lookahead("[CDATA[", false) {
            Lookahead::NeedData => return Step::Suspend,
            Lookahead::Matched => {
                if self.allow_cdata {
                    stream.advance(7);
                    self.transition(State::CdataSection);
                } else {
                    self.error(stream, ctx, ParseErrorCode::CdataInHtmlContent);
                    self.begin_comment(stream.cursor_pos());
                    stream.advance(7);
                    self.comment_end = stream.cursor_pos();
                    self.transition(State::BogusComment);
                }
                return Step::Continue;
            }
            Lookahead::NotMatched => {}
        }
        self.error(stream, ctx, ParseErrorCode::IncorrectlyOpenedComment);
        self.begin_comment(stream.cursor_pos());
        self.transition(State::BogusComment);
        Step::Continue
    }

    fn step_comment_start(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('-') => {
                stream.advance(1);
                self.transition(State::CommentStartDash);
                Step::Continue
            }
            Ok('>') => {
                self.error(stream, ctx, ParseErrorCode::AbruptClosingOfEmptyComment);
                stream.advance(1);
                self.emit_comment();
                self.transition(State::Data);
                Step::Continue
            }
            _ => {
                self.transition(State::Comment);
                Step::Continue
            }
        }
    }

    fn step_comment_start_dash(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof()
            }
            Ok('-') => {
                stream.advance(1);
                self.transition(State::CommentEnd);
                Step::Continue
            }
            Ok('>') => {
                self.error(stream, ctx, ParseErrorCode::AbruptClosingOfEmptyComment);
                stream.advance(1);
                self.emit_comment();
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                // The consumed dash is data after all.
                self.comment_extend(1);
                self.transition(State::Comment);
                Step::Continue
            }
        }
    }

    fn step_comment(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof()
            }
            Ok('-') => {
                stream.advance(1);
                self.transition(State::CommentEndDash);
                Step::Continue
            }
            Ok('<') => {
                stream.advance(1);
                self.comment_extend(1);
                self.transition(State::CommentLessThanSign);
                Step::Continue
            }
            Ok(_) => {
                let start = stream.cursor_pos();
                let (end, nchars) = {
                    let source = stream.decoded();
                    let rest = &source.as_bytes()[start..];
                    let len = memchr::memchr2(b'-', b'<', rest).unwrap_or(rest.len());
                    (start + len, source[start..start + len].chars().count())
                };
                stream.advance(nchars);
                self.comment_end = end;
                Step::Continue
            }
        }
    }

    fn step_comment_less_than(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('!') => {
                stream.advance(1);
                self.comment_extend(1);
                self.transition(State::CommentLessThanSignBang);
                Step::Continue
            }
            Ok('<') => {
                stream.advance(1);
                self.comment_extend(1);
                Step::Continue
            }
            _ => {
                self.transition(State::Comment);
                Step::Continue
            }
        }
    }

    fn step_comment_less_than_bang(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('-') => {
                stream.advance(1);
                self.transition(State::CommentLessThanSignBangDash);
                Step::Continue
            }
            _ => {
                self.transition(State::Comment);
                Step::Continue
            }
        }
    }

    fn step_comment_less_than_bang_dash(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('-') => {
                stream.advance(1);
                self.transition(State::CommentLessThanSignBangDashDash);
                Step::Continue
            }
            _ => {
                self.transition(State::CommentEndDash);
                Step::Continue
            }
        }
    }

    fn step_comment_less_than_bang_dash_dash(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) | Ok('>') => {
                self.transition(State::CommentEnd);
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::NestedComment);
                self.transition(State::CommentEnd);
                Step::Continue
            }
        }
    }

    fn step_comment_end_dash(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof()
            }
            Ok('-') => {
                stream.advance(1);
                self.transition(State::CommentEnd);
                Step::Continue
            }
            Ok(_) => {
                // The consumed dash rejoins the data.
                self.comment_extend(1);
                self.transition(State::Comment);
                Step::Continue
            }
        }
    }

    fn step_comment_end(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof()
            }
            Ok('>') => {
                stream.advance(1);
                self.emit_comment();
                self.transition(State::Data);
                Step::Continue
            }
            Ok('!') => {
                stream.advance(1);
                self.transition(State::CommentEndBang);
                Step::Continue
            }
            Ok('-') => {
                // One of the trailing dashes is data.
                stream.advance(1);
                self.comment_extend(1);
                Step::Continue
            }
            Ok(_) => {
                // Both dashes rejoin the data.
                self.comment_extend(2);
                self.transition(State::Comment);
                Step::Continue
            }
        }
    }

    fn step_comment_end_bang(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof()
            }
            Ok('-') => {
                stream.advance(1);
                self.comment_extend(3);
                self.transition(State::CommentEndDash);
                Step::Continue
            }
            Ok('>') => {
                self.error(stream, ctx, ParseErrorCode::IncorrectlyClosedComment);
                stream.advance(1);
                self.emit_comment();
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.comment_extend(3);
                self.transition(State::Comment);
                Step::Continue
            }
        }
    }

    // --- DOCTYPE ---------------------------------------------------------

    fn step_doctype(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        self.doctype.get_or_insert_with(DoctypeAcc::default);
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                self.transition(State::BeforeDoctypeName);
                Step::Continue
            }
            Ok('>') => {
                self.transition(State::BeforeDoctypeName);
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::MissingWhitespaceBeforeDoctypeName);
                self.transition(State::BeforeDoctypeName);
                Step::Continue
            }
        }
    }

    fn step_before_doctype_name(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                Step::Continue
            }
            Ok('>') => {
                self.error(stream, ctx, ParseErrorCode::MissingDoctypeName);
                stream.advance(1);
                self.finish_doctype(true);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                let acc = self.doctype.get_or_insert_with(DoctypeAcc::default);
                let mut name = RunAcc::default();
                let start = stream.cursor_pos();
                name.start = Some(start);
                name.end = start;
                acc.name = Some(name);
                self.transition(State::DoctypeName);
                Step::Continue
            }
        }
    }

    fn step_doctype_name(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                self.transition(State::AfterDoctypeName);
                Step::Continue
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_doctype(false);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                let start = stream.cursor_pos();
                let (end, nchars) = {
                    let source = stream.decoded();
                    let rest = &source.as_bytes()[start..];
                    let len = rest
                        .iter()
                        .position(|&b| matches!(b, b'\t' | b'\n' | b'\x0C' | b' ' | b'>'))
                        .unwrap_or(rest.len());
                    (start + len, source[start..start + len].chars().count())
                };
                stream.advance(nchars);
                let source = stream.decoded();
                if let Some(acc) = self.doctype.as_mut() {
                    if let Some(name) = acc.name.as_mut() {
                        name.cover(start, end, source);
                    }
                }
                Step::Continue
            }
        }
    }

    fn step_after_doctype_name(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => return Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                return self.emit_eof();
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                return Step::Continue;
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_doctype(false);
                self.transition(State::Data);
                return Step::Continue;
            }
            Ok(_) => {}
        }
        match stream.lookahead("public", true) {
            Lookahead::NeedData => return Step::Suspend,
            Lookahead::Matched => {
                stream.advance(6);
                self.transition(State::AfterDoctypePublicKeyword);
                return Step::Continue;
            }
            Lookahead::NotMatched => {}
        }
        match stream.lookahead("system", true) {
            Lookahead::NeedData => return Step::Suspend,
            Lookahead::Matched => {
                stream.advance(6);
                self.transition(State::AfterDoctypeSystemKeyword);
                return Step::Continue;
            }
            Lookahead::NotMatched => {}
        }
        self.error(stream, ctx, ParseErrorCode::UnexpectedCharacter);
        if let Some(acc) = self.doctype.as_mut() {
            acc.force_quirks = true;
        }
        self.transition(State::BogusDoctype);
        Step::Continue
    }

    fn step_after_doctype_keyword(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
        public: bool,
    ) -> Step {
        let before = if public {
            State::BeforeDoctypePublicIdentifier
        } else {
            State::BeforeDoctypeSystemIdentifier
        };
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                self.transition(before);
                Step::Continue
            }
            Ok(quote @ ('"' | '\'')) => {
                self.error(stream, ctx, ParseErrorCode::UnexpectedCharacter);
                stream.advance(1);
                self.begin_doctype_identifier(stream, public);
                self.transition(identifier_state(public, quote));
                Step::Continue
            }
            Ok('>') => {
                self.error(
                    stream,
                    ctx,
                    if public {
                        ParseErrorCode::MissingDoctypePublicIdentifier
                    } else {
                        ParseErrorCode::MissingDoctypeSystemIdentifier
                    },
                );
                stream.advance(1);
                self.finish_doctype(true);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::MissingQuoteBeforeDoctypeIdentifier);
                if let Some(acc) = self.doctype.as_mut() {
                    acc.force_quirks = true;
                }
                self.transition(State::BogusDoctype);
                Step::Continue
            }
        }
    }

    fn step_before_doctype_identifier(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
        public: bool,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                Step::Continue
            }
            Ok(quote @ ('"' | '\'')) => {
                stream.advance(1);
                self.begin_doctype_identifier(stream, public);
                self.transition(identifier_state(public, quote));
                Step::Continue
            }
            Ok('>') => {
                self.error(
                    stream,
                    ctx,
                    if public {
                        ParseErrorCode::MissingDoctypePublicIdentifier
                    } else {
                        ParseErrorCode::MissingDoctypeSystemIdentifier
                    },
                );
                stream.advance(1);
                self.finish_doctype(true);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::MissingQuoteBeforeDoctypeIdentifier);
                if let Some(acc) = self.doctype.as_mut() {
                    acc.force_quirks = true;
                }
                self.transition(State::BogusDoctype);
                Step::Continue
            }
        }
    }

    fn begin_doctype_identifier(&mut self, stream: &InputStream, public: bool) {
        let acc = self.doctype.get_or_insert_with(DoctypeAcc::default);
        let mut run = RunAcc::default();
        let start = stream.cursor_pos();
        run.start = Some(start);
        run.end = start;
        if public {
            acc.public_id = Some(run);
        } else {
            acc.system_id = Some(run);
        }
    }

    fn step_doctype_identifier(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
        public: bool,
        quote: char,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok(ch) if ch == quote => {
                stream.advance(1);
                self.transition(if public {
                    State::AfterDoctypePublicIdentifier
                } else {
                    State::AfterDoctypeSystemIdentifier
                });
                Step::Continue
            }
            Ok('>') => {
                self.error(stream, ctx, ParseErrorCode::AbruptDoctypeIdentifier);
                stream.advance(1);
                self.finish_doctype(true);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                let start = stream.cursor_pos();
                let (end, nchars) = {
                    let source = stream.decoded();
                    let rest = &source.as_bytes()[start..];
                    let stop = [quote as u8, b'>'];
                    let len = memchr::memchr2(stop[0], stop[1], rest).unwrap_or(rest.len());
                    (start + len, source[start..start + len].chars().count())
                };
                stream.advance(nchars);
                let source = stream.decoded();
                if let Some(acc) = self.doctype.as_mut() {
                    let run = if public {
                        acc.public_id.as_mut()
                    } else {
                        acc.system_id.as_mut()
                    };
                    if let Some(run) = run {
                        run.cover(start, end, source);
                    }
                }
                Step::Continue
            }
        }
    }

    fn step_after_doctype_public_identifier(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                self.transition(State::BetweenDoctypePublicAndSystemIdentifiers);
                Step::Continue
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_doctype(false);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(quote @ ('"' | '\'')) => {
                self.error(stream, ctx, ParseErrorCode::UnexpectedCharacter);
                stream.advance(1);
                self.begin_doctype_identifier(stream, false);
                self.transition(identifier_state(false, quote));
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::MissingQuoteBeforeDoctypeIdentifier);
                if let Some(acc) = self.doctype.as_mut() {
                    acc.force_quirks = true;
                }
                self.transition(State::BogusDoctype);
                Step::Continue
            }
        }
    }

    fn step_between_doctype_identifiers(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                Step::Continue
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_doctype(false);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(quote @ ('"' | '\'')) => {
                stream.advance(1);
                self.begin_doctype_identifier(stream, false);
                self.transition(identifier_state(false, quote));
                Step::Continue
            }
            Ok(_) => {
                self.error(stream, ctx, ParseErrorCode::MissingQuoteBeforeDoctypeIdentifier);
                if let Some(acc) = self.doctype.as_mut() {
                    acc.force_quirks = true;
                }
                self.transition(State::BogusDoctype);
                Step::Continue
            }
        }
    }

    fn step_after_doctype_system_identifier(
        &mut self,
        stream: &mut InputStream,
        ctx: &mut ParseContext,
    ) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInDoctype);
                self.finish_doctype(true);
                self.emit_eof()
            }
            Ok('\t' | '\n' | '\x0C' | ' ') => {
                stream.advance(1);
                Step::Continue
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_doctype(false);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                self.error(
                    stream,
                    ctx,
                    ParseErrorCode::UnexpectedCharacterAfterDoctypeSystemIdentifier,
                );
                // Note: does not force quirks.
                self.transition(State::BogusDoctype);
                Step::Continue
            }
        }
    }

    fn step_bogus_doctype(&mut self, stream: &mut InputStream, _ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.finish_doctype(false);
                self.emit_eof()
            }
            Ok('>') => {
                stream.advance(1);
                self.finish_doctype(false);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(_) => {
                let start = stream.cursor_pos();
                let nchars = {
                    let source = stream.decoded();
                    let rest = &source.as_bytes()[start..];
                    let len = memchr::memchr(b'>', rest).unwrap_or(rest.len());
                    source[start..start + len].chars().count()
                };
                stream.advance(nchars.max(1));
                Step::Continue
            }
        }
    }

    // --- CDATA -----------------------------------------------------------

    fn step_cdata_section(&mut self, stream: &mut InputStream, ctx: &mut ParseContext) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Err(StreamStatus::Eof) => {
                self.error(stream, ctx, ParseErrorCode::EofInCdata);
                self.emit_eof()
            }
            Ok(']') => {
                stream.advance(1);
                self.transition(State::CdataSectionBracket);
                Step::Continue
            }
            Ok(_) => {
                self.cover_until(stream, b"]");
                Step::Continue
            }
        }
    }

    fn step_cdata_section_bracket(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok(']') => {
                stream.advance(1);
                self.transition(State::CdataSectionEnd);
                Step::Continue
            }
            _ => {
                let pos = stream.cursor_pos();
                self.text.cover(pos - 1, pos, stream.decoded());
                self.transition(State::CdataSection);
                Step::Continue
            }
        }
    }

    fn step_cdata_section_end(&mut self, stream: &mut InputStream) -> Step {
        match stream.peek(0) {
            Err(StreamStatus::NeedData) => Step::Suspend,
            Ok('>') => {
                stream.advance(1);
                self.transition(State::Data);
                Step::Continue
            }
            Ok(']') => {
                let pos = stream.cursor_pos();
                self.text.cover(pos - 2, pos - 1, stream.decoded());
                stream.advance(1);
                Step::Continue
            }
            _ => {
                let pos = stream.cursor_pos();
                self.text.cover(pos - 2, pos, stream.decoded());
                self.transition(State::CdataSection);
                Step::Continue
            }
        }
    }
}

fn identifier_state(public: bool, quote: char) -> State {
    match (public, quote) {
        (true, '"') => State::DoctypePublicIdentifierDoubleQuoted,
        (true, _) => State::DoctypePublicIdentifierSingleQuoted,
        (false, '"') => State::DoctypeSystemIdentifierDoubleQuoted,
        (false, _) => State::DoctypeSystemIdentifierSingleQuoted,
    }
}

#[cfg(test)]
mod tests;
