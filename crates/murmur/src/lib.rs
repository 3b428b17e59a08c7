//! Murmur: an embeddable, streaming HTML5 parser.
//!
//! Bytes go in through [`Parser::parse_chunk`]; tree-mutation calls come out
//! through an embedder-supplied [`TreeHandler`]. The library owns no DOM and
//! makes no assumptions about how the tree is represented.
//!
//! The pipeline has three engines:
//! - the input stream ([`stream::InputStream`]): charset detection and
//!   decoding, newline/NUL normalization, a restartable character cursor;
//! - the tokenizer ([`tokenizer::Tokenizer`]): the HTML5 tokenizer state
//!   machine, resumable at any chunk boundary;
//! - the tree-construction driver ([`treebuilder::TreeBuilder`]): the
//!   insertion-mode state machine driving the tree handler.

pub mod atom;
pub mod charset;
pub mod context;
pub mod elements;
pub mod errors;
pub mod parser;
pub mod stream;
pub mod token;
pub mod tokenizer;
pub mod treebuilder;

pub use atom::{AtomId, AtomTable};
pub use charset::CharsetSource;
pub use context::{Counters, ParseContext};
pub use elements::ElementType;
pub use errors::{ErrorOrigin, ErrorPolicy, ParseError, ParseErrorCode, ParserError, TreeError};
pub use parser::{Parser, ParserOptions, TokenHandler};
pub use token::{Attribute, DoctypeData, Namespace, Span, Tag, TextValue, Token};
pub use tokenizer::ContentModel;
pub use treebuilder::{
    AttributeData, DoctypeDetails, ElementData, FragmentContext, QuirksMode, TreeHandler,
};
