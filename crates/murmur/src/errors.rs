//! Error kinds for the public API and recoverable parse diagnostics.

use std::fmt;

/// Result kind returned by the public parser surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParserError {
    /// A parameter violated the call contract.
    BadParameter,
    /// The embedder's tree handler reported resource exhaustion.
    NoMemory,
    /// A `<meta charset>` forced a re-decode; the embedder may re-drive input.
    EncodingChangeRequired,
    /// The parser is paused waiting for a scripting host.
    Paused,
    /// The instance is poisoned (claimed buffer or fatal handler error).
    Invalid,
    /// The embedder's tree handler failed; parsing of the current token was
    /// aborted.
    Tree(TreeError),
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::BadParameter => f.write_str("bad parameter"),
            ParserError::NoMemory => f.write_str("out of memory"),
            ParserError::EncodingChangeRequired => f.write_str("encoding change required"),
            ParserError::Paused => f.write_str("parser paused"),
            ParserError::Invalid => f.write_str("parser instance is invalid"),
            ParserError::Tree(e) => write!(f, "tree handler error: {e}"),
        }
    }
}

impl std::error::Error for ParserError {}

/// Failure reported by an embedder tree-handler operation.
///
/// Any tree error aborts processing of the current token and is surfaced from
/// the `parse_chunk` call that triggered it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    NoMemory,
    UnknownNode,
    Failed(&'static str),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::NoMemory => f.write_str("handler out of memory"),
            TreeError::UnknownNode => f.write_str("handler does not know this node"),
            TreeError::Failed(what) => write!(f, "handler operation failed: {what}"),
        }
    }
}

impl From<TreeError> for ParserError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::NoMemory => ParserError::NoMemory,
            other => ParserError::Tree(other),
        }
    }
}

/// Where a recoverable parse error was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorOrigin {
    Stream,
    Tokenizer,
    TreeBuilder,
}

/// Closed set of recoverable parse-error identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorCode {
    InvalidByteSequence,
    UnexpectedNullCharacter,
    UnexpectedCharacter,
    UnexpectedEof,
    EofInTag,
    EofInComment,
    EofInDoctype,
    EofInScriptContent,
    EofInCdata,
    InvalidCharacterReference,
    CharacterReferenceOutOfRange,
    ControlCharacterReference,
    MissingSemicolonAfterCharacterReference,
    DuplicateAttribute,
    UnexpectedSolidusInTag,
    UnexpectedEqualsSignBeforeAttributeName,
    UnexpectedCharacterInAttributeName,
    UnexpectedCharacterInUnquotedAttributeValue,
    MissingWhitespaceBetweenAttributes,
    MissingAttributeValue,
    AbruptClosingOfEmptyComment,
    NestedComment,
    IncorrectlyClosedComment,
    IncorrectlyOpenedComment,
    CdataInHtmlContent,
    MissingDoctypeName,
    MissingWhitespaceBeforeDoctypeName,
    MissingDoctypePublicIdentifier,
    MissingDoctypeSystemIdentifier,
    MissingQuoteBeforeDoctypeIdentifier,
    AbruptDoctypeIdentifier,
    UnexpectedCharacterAfterDoctypeSystemIdentifier,
    InvalidFirstCharacterOfTagName,
    MissingEndTagName,
    EndTagWithAttributes,
    EndTagWithTrailingSolidus,
    SelfClosingNonVoidElement,
    UnexpectedDoctype,
    UnexpectedStartTag,
    UnexpectedEndTag,
    UnexpectedTokenInInsertionMode,
    MisnestedTag,
    UnclosedElements,
    UnacknowledgedSelfClosingTag,
    LateEncodingChange,
}

impl ParseErrorCode {
    /// Stable identifier for error-handler callbacks.
    pub fn as_str(self) -> &'static str {
        use ParseErrorCode::*;
        match self {
            InvalidByteSequence => "invalid-byte-sequence",
            UnexpectedNullCharacter => "unexpected-null-character",
            UnexpectedCharacter => "unexpected-character",
            UnexpectedEof => "unexpected-eof",
            EofInTag => "eof-in-tag",
            EofInComment => "eof-in-comment",
            EofInDoctype => "eof-in-doctype",
            EofInScriptContent => "eof-in-script-content",
            EofInCdata => "eof-in-cdata",
            InvalidCharacterReference => "invalid-character-reference",
            CharacterReferenceOutOfRange => "character-reference-out-of-range",
            ControlCharacterReference => "control-character-reference",
            MissingSemicolonAfterCharacterReference => {
                "missing-semicolon-after-character-reference"
            }
            DuplicateAttribute => "duplicate-attribute",
            UnexpectedSolidusInTag => "unexpected-solidus-in-tag",
            UnexpectedEqualsSignBeforeAttributeName => {
                "unexpected-equals-sign-before-attribute-name"
            }
            UnexpectedCharacterInAttributeName => "unexpected-character-in-attribute-name",
            UnexpectedCharacterInUnquotedAttributeValue => {
                "unexpected-character-in-unquoted-attribute-value"
            }
            MissingWhitespaceBetweenAttributes => "missing-whitespace-between-attributes",
            MissingAttributeValue => "missing-attribute-value",
            AbruptClosingOfEmptyComment => "abrupt-closing-of-empty-comment",
            NestedComment => "nested-comment",
            IncorrectlyClosedComment => "incorrectly-closed-comment",
            IncorrectlyOpenedComment => "incorrectly-opened-comment",
            CdataInHtmlContent => "cdata-in-html-content",
            MissingDoctypeName => "missing-doctype-name",
            MissingWhitespaceBeforeDoctypeName => "missing-whitespace-before-doctype-name",
            MissingDoctypePublicIdentifier => "missing-doctype-public-identifier",
            MissingDoctypeSystemIdentifier => "missing-doctype-system-identifier",
            MissingQuoteBeforeDoctypeIdentifier => "missing-quote-before-doctype-identifier",
            AbruptDoctypeIdentifier => "abrupt-doctype-identifier",
            UnexpectedCharacterAfterDoctypeSystemIdentifier => {
                "unexpected-character-after-doctype-system-identifier"
            }
            InvalidFirstCharacterOfTagName => "invalid-first-character-of-tag-name",
            MissingEndTagName => "missing-end-tag-name",
            EndTagWithAttributes => "end-tag-with-attributes",
            EndTagWithTrailingSolidus => "end-tag-with-trailing-solidus",
            SelfClosingNonVoidElement => "self-closing-non-void-element",
            UnexpectedDoctype => "unexpected-doctype",
            UnexpectedStartTag => "unexpected-start-tag",
            UnexpectedEndTag => "unexpected-end-tag",
            UnexpectedTokenInInsertionMode => "unexpected-token-in-insertion-mode",
            MisnestedTag => "misnested-tag",
            UnclosedElements => "unclosed-elements",
            UnacknowledgedSelfClosingTag => "unacknowledged-self-closing-tag",
            LateEncodingChange => "late-encoding-change",
        }
    }
}

/// A recoverable parse diagnostic with its source position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub origin: ErrorOrigin,
    pub code: ParseErrorCode,
    /// 1-based line of the offending code point.
    pub line: u32,
    /// 1-based column of the offending code point.
    pub col: u32,
}

/// Error tracking policy.
#[derive(Clone, Copy, Debug)]
pub struct ErrorPolicy {
    /// Whether to store parse errors on the context.
    pub track: bool,
    /// Maximum number of stored errors (oldest dropped first).
    pub max_stored: usize,
    /// Always increment counters even if storage is disabled.
    pub track_counters: bool,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            track: true,
            max_stored: 128,
            track_counters: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_no_memory_maps_to_parser_no_memory() {
        assert_eq!(ParserError::from(TreeError::NoMemory), ParserError::NoMemory);
        assert_eq!(
            ParserError::from(TreeError::UnknownNode),
            ParserError::Tree(TreeError::UnknownNode)
        );
    }

    #[test]
    fn error_codes_have_stable_identifiers() {
        assert_eq!(
            ParseErrorCode::UnexpectedNullCharacter.as_str(),
            "unexpected-null-character"
        );
        assert_eq!(ParseErrorCode::LateEncodingChange.as_str(), "late-encoding-change");
    }
}
