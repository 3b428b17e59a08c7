//! Token model emitted by the tokenizer.

use crate::atom::AtomId;

/// Byte span into the decoded input buffer.
///
/// Invariant: spans lie on UTF-8 boundaries of the decoded buffer and stay
/// valid for the parser's lifetime (the buffer is append-only and pinned
/// until claimed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must be <= end");
        Self { start, end }
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// Text payload: a borrowed span into the decoded buffer, or an owned string
/// for content rewritten during tokenization (character references, NUL
/// replacement).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextValue {
    Span(Span),
    Owned(String),
}

impl TextValue {
    pub fn resolve<'a>(&'a self, source: &'a str) -> &'a str {
        match self {
            TextValue::Span(span) => {
                debug_assert!(
                    source.is_char_boundary(span.start) && source.is_char_boundary(span.end),
                    "span must be on UTF-8 boundaries"
                );
                &source[span.start..span.end]
            }
            TextValue::Owned(s) => s.as_str(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TextValue::Span(span) => span.is_empty(),
            TextValue::Owned(s) => s.is_empty(),
        }
    }
}

/// Element and attribute namespaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Namespace {
    #[default]
    Html,
    MathMl,
    Svg,
    XLink,
    Xml,
    XmlNs,
}

impl Namespace {
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::XmlNs => "http://www.w3.org/2000/xmlns/",
        }
    }
}

/// One attribute on a tag. The first occurrence of a name wins; duplicates
/// are discarded during tokenization with a parse error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub ns: Namespace,
    pub name: AtomId,
    pub value: TextValue,
}

/// A start or end tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub name: AtomId,
    pub self_closing: bool,
    pub attributes: Vec<Attribute>,
}

/// DOCTYPE payload; `None` fields were absent from the source (distinct from
/// present-but-empty).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctypeData {
    pub name: Option<TextValue>,
    pub public_id: Option<TextValue>,
    pub system_id: Option<TextValue>,
    pub force_quirks: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype(DoctypeData),
    StartTag(Tag),
    /// Attributes on an end tag are a parse error but retained.
    EndTag(Tag),
    Comment(TextValue),
    /// A run of consecutive character data; adjacent runs are coalesced by
    /// the emitter.
    Character(TextValue),
    Eof,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_value_resolves_span_and_owned() {
        let source = "hello world";
        let span = TextValue::Span(Span::new(0, 5));
        assert_eq!(span.resolve(source), "hello");
        let owned = TextValue::Owned("bye".to_string());
        assert_eq!(owned.resolve(source), "bye");
    }

    #[test]
    fn namespace_uris_are_distinct() {
        let all = [
            Namespace::Html,
            Namespace::MathMl,
            Namespace::Svg,
            Namespace::XLink,
            Namespace::Xml,
            Namespace::XmlNs,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.uri(), b.uri());
            }
        }
    }
}
