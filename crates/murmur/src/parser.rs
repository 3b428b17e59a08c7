//! The public parser shell: composes the input stream, the tokenizer and the
//! tree-construction driver.

use crate::atom::AtomTable;
use crate::charset::CharsetSource;
use crate::context::{ErrorHandler, ParseContext};
use crate::errors::{ErrorPolicy, ParseError, ParserError};
use crate::stream::{BufferMoveHandler, EncodingChange, InputStream};
use crate::token::Token;
use crate::tokenizer::{ContentModel, Pumped, Tokenizer};
use crate::treebuilder::{FragmentContext, QuirksMode, StepEffects, TreeBuilder, TreeHandler};

/// Callback receiving raw tokens when the tree builder is bypassed.
pub type TokenHandler = Box<dyn FnMut(&Token, &AtomTable, &str)>;

/// Parser construction options.
#[derive(Default)]
pub struct ParserOptions {
    /// Out-of-band (transport-declared) encoding label.
    pub declared_encoding: Option<Vec<u8>>,
    /// Whether scripting is enabled in the embedder (affects `<noscript>`).
    pub scripting: bool,
    /// Force the tokenizer's initial content model.
    pub content_model: Option<ContentModel>,
    /// Recoverable-error tracking policy.
    pub error_policy: ErrorPolicy,
}

pub struct Parser<H: TreeHandler> {
    ctx: ParseContext,
    stream: InputStream,
    tokenizer: Tokenizer,
    builder: Option<TreeBuilder<H>>,
    token_handler: Option<TokenHandler>,
    poisoned: bool,
}

impl<H: TreeHandler> Parser<H> {
    /// Create a parser driving `handler` with the default document setup.
    pub fn new(options: ParserOptions, handler: H) -> Self {
        let mut ctx = ParseContext::new();
        ctx.error_policy = options.error_policy;
        let stream = InputStream::new(options.declared_encoding.as_deref());
        let mut tokenizer = Tokenizer::new();
        if let Some(model) = options.content_model {
            tokenizer.set_content_model(model);
        }
        Self {
            ctx,
            stream,
            tokenizer,
            builder: Some(TreeBuilder::new(handler, options.scripting)),
            token_handler: None,
            poisoned: false,
        }
    }

    /// Create a fragment parser with the given context element. The tokenizer
    /// content model follows the context element the way a full parse would
    /// have left it.
    pub fn fragment(
        options: ParserOptions,
        handler: H,
        context: FragmentContext,
    ) -> Result<Self, ParserError> {
        let mut ctx = ParseContext::new();
        ctx.error_policy = options.error_policy;
        let stream = InputStream::new(options.declared_encoding.as_deref());
        let mut tokenizer = Tokenizer::new();
        let model = match context.name.as_str() {
            "title" | "textarea" => ContentModel::Rcdata,
            "style" | "xmp" | "iframe" | "noembed" | "noframes" => ContentModel::Cdata,
            "script" => ContentModel::ScriptData,
            "plaintext" => ContentModel::Plaintext,
            _ => ContentModel::Pcdata,
        };
        tokenizer.set_content_model(options.content_model.unwrap_or(model));
        tokenizer.set_last_start_tag(&context.name);
        let builder = TreeBuilder::fragment(handler, context, options.scripting)?;
        Ok(Self {
            ctx,
            stream,
            tokenizer,
            builder: Some(builder),
            token_handler: None,
            poisoned: false,
        })
    }

    /// Replace the tree-construction driver with a raw token callback
    /// (`TOKEN_HANDLER`): the tree builder is torn down and every token goes
    /// to the callback instead.
    pub fn set_token_handler(&mut self, handler: TokenHandler) {
        self.builder = None;
        self.token_handler = Some(handler);
    }

    /// Register a recoverable-parse-error callback `(line, col, code)`.
    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.ctx.set_error_handler(handler);
    }

    /// Register a notification for decoded-buffer storage moves.
    pub fn set_buffer_handler(&mut self, handler: BufferMoveHandler) {
        self.stream.set_buffer_handler(handler);
    }

    /// Force the tokenizer content model (`CONTENT_MODEL` option).
    pub fn set_content_model(&mut self, model: ContentModel) {
        self.tokenizer.set_content_model(model);
    }

    /// Feed a chunk of document bytes.
    pub fn parse_chunk(&mut self, data: &[u8]) -> Result<(), ParserError> {
        if self.poisoned {
            return Err(ParserError::Invalid);
        }
        if data.is_empty() {
            return Err(ParserError::BadParameter);
        }
        self.stream.append(data, &mut self.ctx)?;
        self.run()
    }

    /// Splice script-inserted bytes at the current read position; they are
    /// tokenized on this call ahead of the remaining input.
    pub fn parse_extraneous_chunk(&mut self, data: &[u8]) -> Result<(), ParserError> {
        if self.poisoned {
            return Err(ParserError::Invalid);
        }
        if data.is_empty() {
            return Err(ParserError::BadParameter);
        }
        self.stream.insert(data, &mut self.ctx)?;
        self.run()
    }

    /// Signal that the last chunk has been supplied.
    pub fn completed(&mut self) -> Result<(), ParserError> {
        if self.poisoned {
            return Err(ParserError::Invalid);
        }
        self.stream.append(&[], &mut self.ctx)?;
        self.run()
    }

    /// Current charset name and detection source.
    pub fn read_charset(&self) -> (&'static str, CharsetSource) {
        self.stream.read_charset()
    }

    /// Transfer ownership of the decoded document buffer. All spans handed
    /// out index into the returned string; afterwards only drop is legal.
    pub fn claim_buffer(&mut self) -> Result<String, ParserError> {
        let buffer = self.stream.claim_buffer()?;
        self.poisoned = true;
        Ok(buffer)
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.builder
            .as_ref()
            .map(|b| b.quirks_mode())
            .unwrap_or_default()
    }

    pub fn tree_handler(&self) -> Option<&H> {
        self.builder.as_ref().map(|b| b.handler())
    }

    pub fn tree_handler_mut(&mut self) -> Option<&mut H> {
        self.builder.as_mut().map(|b| b.handler_mut())
    }

    /// Stored recoverable parse errors, oldest first.
    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.ctx.errors()
    }

    pub fn counters(&self) -> crate::context::Counters {
        self.ctx.counters
    }

    /// The decoded document seen so far (span resolution for token-handler
    /// clients).
    pub fn document_text(&self) -> &str {
        self.stream.decoded()
    }

    fn run(&mut self) -> Result<(), ParserError> {
        loop {
            match self.tokenizer.pump(&mut self.stream, &mut self.ctx) {
                Pumped::NeedData => return Ok(()),
                Pumped::Done => return Ok(()),
                Pumped::Token(token) => {
                    if let Some(handler) = self.token_handler.as_mut() {
                        handler(&token, &self.ctx.atoms, self.stream.decoded());
                        continue;
                    }
                    let Some(builder) = self.builder.as_mut() else {
                        continue;
                    };
                    let fx = match builder.process_token(&token, self.stream.decoded(), &mut self.ctx)
                    {
                        Ok(fx) => fx,
                        Err(e) => {
                            let err = ParserError::from(e);
                            if err == ParserError::NoMemory {
                                self.poisoned = true;
                            }
                            return Err(err);
                        }
                    };
                    if let Some(restart) = self.apply_effects(fx)? {
                        return Err(restart);
                    }
                }
            }
        }
    }

    /// Apply builder-requested effects. Returns `Some(EncodingChangeRequired)`
    /// when the stream accepted a new encoding and the parse restarted.
    fn apply_effects(&mut self, fx: StepEffects) -> Result<Option<ParserError>, ParserError> {
        if let Some(model) = fx.content_model {
            self.tokenizer.set_content_model(model);
        }
        self.tokenizer.set_cdata_allowed(fx.cdata_allowed);
        if let Some(encoding) = fx.encoding {
            match self.stream.change_encoding(encoding, &mut self.ctx)? {
                EncodingChange::Accepted => {
                    // The stream re-decodes from the start; restart the
                    // engines so the next parse_chunk resumes from scratch.
                    // The advisory tells the embedder to discard content
                    // built under the old encoding.
                    self.tokenizer = Tokenizer::new();
                    if let Some(builder) = self.builder.as_mut() {
                        builder
                            .handler_mut()
                            .encoding_change(encoding.name())?;
                        builder.reset()?;
                    }
                    return Ok(Some(ParserError::EncodingChangeRequired));
                }
                EncodingChange::SameEncoding | EncodingChange::Refused => {}
            }
        }
        Ok(None)
    }
}
