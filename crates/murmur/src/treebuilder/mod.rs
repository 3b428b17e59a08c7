//! HTML5 tree-construction driver.
//!
//! Consumes tokens, maintains the stack of open elements, the list of active
//! formatting elements and the element pointers, and drives the embedder's
//! [`TreeHandler`]. One entry point per token; reprocessing loops until every
//! handler settles.

pub mod handler;

mod body;
mod document;
mod foreign;
mod formatting;
mod head;
mod select;
mod stack;
mod table;

#[cfg(test)]
mod tests;

pub use handler::{AttributeData, DoctypeDetails, ElementData, QuirksMode, TreeHandler};

use encoding_rs::Encoding;

use crate::context::ParseContext;
use crate::elements::{self, ElementType};
use crate::errors::{ErrorOrigin, ParseErrorCode, TreeError};
use crate::token::{Namespace, Tag, Token};
use crate::tokenizer::ContentModel;

use formatting::ActiveFormatting;
use stack::{OpenElement, OpenElements, Scope};

/// Tree-construction insertion mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertionMode {
    #[default]
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
}

/// Side effects the driver asks the parser shell to apply before the next
/// tokenizer pump.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepEffects {
    /// Switch the tokenizer content model (generic raw-text handling).
    pub content_model: Option<ContentModel>,
    /// A `<meta charset>` wants this encoding installed on the stream.
    pub encoding: Option<&'static Encoding>,
    /// Whether `<![CDATA[` currently opens a CDATA section.
    pub cdata_allowed: bool,
}

/// Fragment-parsing context element.
#[derive(Clone, Debug)]
pub struct FragmentContext {
    pub ns: Namespace,
    pub name: String,
}

/// Start/end tag, resolved out of the shared buffer for mode handlers.
#[derive(Clone, Debug)]
pub(crate) struct TagView {
    pub(crate) name: String,
    pub(crate) ty: ElementType,
    pub(crate) self_closing: bool,
    pub(crate) attrs: Vec<AttributeData>,
}

/// Token as seen by the insertion-mode handlers.
#[derive(Clone, Debug)]
pub(crate) enum Tok<'a> {
    Doctype {
        name: Option<&'a str>,
        public_id: Option<&'a str>,
        system_id: Option<&'a str>,
        force_quirks: bool,
    },
    Start(TagView),
    End(TagView),
    Comment(&'a str),
    Chars(&'a str),
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Done,
    Reprocess(InsertionMode),
}

/// Where a comment (or other node) should be attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommentTarget {
    CurrentNode,
    Document,
    HtmlElement,
}

pub struct TreeBuilder<H: TreeHandler> {
    pub(crate) handler: H,
    pub(crate) document: H::Handle,
    pub(crate) mode: InsertionMode,
    pub(crate) orig_mode: Option<InsertionMode>,
    pub(crate) stack: OpenElements<H::Handle>,
    pub(crate) formatting: ActiveFormatting<H::Handle>,
    pub(crate) head: Option<H::Handle>,
    pub(crate) form: Option<H::Handle>,
    pub(crate) quirks: QuirksMode,
    pub(crate) frameset_ok: bool,
    pub(crate) scripting: bool,
    pub(crate) foster_parenting: bool,
    pub(crate) ignore_lf: bool,
    /// (is_whitespace, text) runs buffered by the in-table-text mode.
    pub(crate) pending_table_text: Vec<(bool, String)>,
    pub(crate) fragment: Option<FragmentContext>,
    pub(crate) done: bool,
}

impl<H: TreeHandler> TreeBuilder<H> {
    pub fn new(mut handler: H, scripting: bool) -> Self {
        let document = handler.document();
        Self {
            handler,
            document,
            mode: InsertionMode::Initial,
            orig_mode: None,
            stack: OpenElements::new(),
            formatting: ActiveFormatting::new(),
            head: None,
            form: None,
            quirks: QuirksMode::None,
            frameset_ok: true,
            scripting,
            foster_parenting: false,
            ignore_lf: false,
            pending_table_text: Vec::new(),
            fragment: None,
            done: false,
        }
    }

    /// Set up the fragment case: an `html` root is created under the document
    /// and the insertion mode is reset against the context element.
    pub fn fragment(handler: H, context: FragmentContext, scripting: bool) -> Result<Self, TreeError> {
        let mut builder = Self::new(handler, scripting);
        let root = builder.handler.create_element(&ElementData {
            ns: Namespace::Html,
            name: "html".to_string(),
            attributes: Vec::new(),
        })?;
        let doc = builder.document.clone();
        builder.handler.append_child(&doc, &root)?;
        builder.stack.push(OpenElement {
            ns: Namespace::Html,
            ty: ElementType::Html,
            name: "html".to_string(),
            node: root,
        });
        builder.fragment = Some(context);
        builder.reset_insertion_mode();
        Ok(builder)
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// True once the final EOF token has been processed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn open_element_count(&self) -> usize {
        self.stack.len()
    }

    /// Process one token, driving the tree handler. Returns the effects the
    /// parser shell must apply before the tokenizer runs again.
    pub fn process_token(
        &mut self,
        token: &Token,
        source: &str,
        ctx: &mut ParseContext,
    ) -> Result<StepEffects, TreeError> {
        let mut fx = StepEffects::default();
        if self.done {
            return Ok(fx);
        }

        match token {
            Token::Character(text) => {
                let mut data = text.resolve(source);
                if std::mem::replace(&mut self.ignore_lf, false) {
                    if let Some(rest) = data.strip_prefix('\n') {
                        data = rest;
                    }
                }
                // Split into maximal whitespace / non-whitespace runs so mode
                // handlers can treat the two differently.
                let mut rest = data;
                while !rest.is_empty() {
                    let first_ws = rest.chars().next().is_some_and(is_html_whitespace);
                    let split = rest
                        .find(|c: char| is_html_whitespace(c) != first_ws)
                        .unwrap_or(rest.len());
                    let (run, tail) = rest.split_at(split);
                    rest = tail;
                    self.run_to_completion(&Tok::Chars(run), ctx, &mut fx)?;
                }
            }
            Token::Doctype(d) => {
                let tok = Tok::Doctype {
                    name: d.name.as_ref().map(|v| v.resolve(source)),
                    public_id: d.public_id.as_ref().map(|v| v.resolve(source)),
                    system_id: d.system_id.as_ref().map(|v| v.resolve(source)),
                    force_quirks: d.force_quirks,
                };
                self.ignore_lf = false;
                self.run_to_completion(&tok, ctx, &mut fx)?;
            }
            Token::Comment(text) => {
                self.ignore_lf = false;
                self.run_to_completion(&Tok::Comment(text.resolve(source)), ctx, &mut fx)?;
            }
            Token::StartTag(tag) => {
                self.ignore_lf = false;
                let view = self.tag_view(tag, source, ctx);
                self.run_to_completion(&Tok::Start(view), ctx, &mut fx)?;
            }
            Token::EndTag(tag) => {
                self.ignore_lf = false;
                let view = self.tag_view(tag, source, ctx);
                self.run_to_completion(&Tok::End(view), ctx, &mut fx)?;
            }
            Token::Eof => {
                self.ignore_lf = false;
                self.run_to_completion(&Tok::Eof, ctx, &mut fx)?;
            }
        }

        fx.cdata_allowed = self
            .adjusted_current_ns()
            .map(|ns| ns != Namespace::Html)
            .unwrap_or(false);
        Ok(fx)
    }

    fn tag_view(&self, tag: &Tag, source: &str, ctx: &ParseContext) -> TagView {
        let name = ctx.atoms.resolve(tag.name).to_string();
        let ty = elements::element_type(Namespace::Html, &name);
        let attrs = tag
            .attributes
            .iter()
            .map(|a| AttributeData {
                ns: a.ns,
                name: ctx.atoms.resolve(a.name).to_string(),
                value: a.value.resolve(source).to_string(),
            })
            .collect();
        TagView {
            name,
            ty,
            self_closing: tag.self_closing,
            attrs,
        }
    }

    fn run_to_completion(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<(), TreeError> {
        let mut hops = 0usize;
        loop {
            let flow = if self.needs_foreign_handling(tok) {
                self.handle_foreign(tok, ctx, fx)?
            } else {
                match self.mode {
                    InsertionMode::Initial => self.handle_initial(tok, ctx, fx)?,
                    InsertionMode::BeforeHtml => self.handle_before_html(tok, ctx, fx)?,
                    InsertionMode::BeforeHead => self.handle_before_head(tok, ctx, fx)?,
                    InsertionMode::InHead => self.handle_in_head(tok, ctx, fx)?,
                    InsertionMode::InHeadNoscript => self.handle_in_head_noscript(tok, ctx, fx)?,
                    InsertionMode::AfterHead => self.handle_after_head(tok, ctx, fx)?,
                    InsertionMode::InBody => self.handle_in_body(tok, ctx, fx)?,
                    InsertionMode::Text => self.handle_text(tok, ctx, fx)?,
                    InsertionMode::InTable => self.handle_in_table(tok, ctx, fx)?,
                    InsertionMode::InTableText => self.handle_in_table_text(tok, ctx, fx)?,
                    InsertionMode::InCaption => self.handle_in_caption(tok, ctx, fx)?,
                    InsertionMode::InColumnGroup => self.handle_in_column_group(tok, ctx, fx)?,
                    InsertionMode::InTableBody => self.handle_in_table_body(tok, ctx, fx)?,
                    InsertionMode::InRow => self.handle_in_row(tok, ctx, fx)?,
                    InsertionMode::InCell => self.handle_in_cell(tok, ctx, fx)?,
                    InsertionMode::InSelect => self.handle_in_select(tok, ctx, fx)?,
                    InsertionMode::InSelectInTable => {
                        self.handle_in_select_in_table(tok, ctx, fx)?
                    }
                    InsertionMode::AfterBody => self.handle_after_body(tok, ctx, fx)?,
                    InsertionMode::InFrameset => self.handle_in_frameset(tok, ctx, fx)?,
                    InsertionMode::AfterFrameset => self.handle_after_frameset(tok, ctx, fx)?,
                    InsertionMode::AfterAfterBody => self.handle_after_after_body(tok, ctx, fx)?,
                    InsertionMode::AfterAfterFrameset => {
                        self.handle_after_after_frameset(tok, ctx, fx)?
                    }
                }
            };
            match flow {
                Flow::Done => return Ok(()),
                Flow::Reprocess(mode) => {
                    log::trace!(
                        target: "murmur.treebuilder",
                        "reprocess in {mode:?} (was {:?})",
                        self.mode
                    );
                    self.mode = mode;
                    hops += 1;
                    debug_assert!(hops < 64, "insertion-mode reprocess loop did not settle");
                    if hops >= 64 {
                        return Ok(());
                    }
                }
            }
        }
    }

    // --- foreign-content dispatch ---------------------------------------

    fn adjusted_current(&self) -> Option<(Namespace, ElementType, Option<&FragmentContext>)> {
        if self.stack.is_empty() {
            return None;
        }
        if self.stack.len() == 1 {
            if let Some(frag) = self.fragment.as_ref() {
                let ty = elements::element_type(frag.ns, &frag.name);
                return Some((frag.ns, ty, Some(frag)));
            }
        }
        let frame = self.stack.current().expect("stack non-empty");
        Some((frame.ns, frame.ty, None))
    }

    pub(crate) fn adjusted_current_ns(&self) -> Option<Namespace> {
        self.adjusted_current().map(|(ns, _, _)| ns)
    }

    fn needs_foreign_handling(&self, tok: &Tok<'_>) -> bool {
        let Some((ns, ty, _)) = self.adjusted_current() else {
            return false;
        };
        if ns == Namespace::Html {
            return false;
        }
        if matches!(tok, Tok::Eof) {
            return false;
        }
        let mathml_text_ip = foreign::is_mathml_text_integration_point(ns, ty);
        let html_ip = foreign::is_html_integration_point(ns, ty);
        match tok {
            Tok::Start(tag) => {
                if mathml_text_ip
                    && !matches!(tag.ty, ElementType::Mglyph | ElementType::Malignmark)
                {
                    return false;
                }
                if ns == Namespace::MathMl
                    && ty == ElementType::AnnotationXml
                    && tag.ty == ElementType::Svg
                {
                    return false;
                }
                !html_ip
            }
            Tok::Chars(_) => !(mathml_text_ip || html_ip),
            _ => true,
        }
    }

    // --- error reporting -------------------------------------------------

    pub(crate) fn parse_error(&self, ctx: &mut ParseContext, code: ParseErrorCode) {
        ctx.record_error(ErrorOrigin::TreeBuilder, code, 0, 0);
    }

    // --- node plumbing ---------------------------------------------------

    pub(crate) fn current_type(&self) -> Option<ElementType> {
        self.stack.current().map(|f| f.ty)
    }

    /// The place new content goes, honoring foster parenting around tables.
    fn appropriate_place(&mut self) -> Result<(H::Handle, Option<H::Handle>), TreeError> {
        let current = self
            .stack
            .current()
            .expect("insertion requires an open element")
            .node
            .clone();
        let in_table = self
            .stack
            .current()
            .map(|f| {
                matches!(
                    f.ty,
                    ElementType::Table
                        | ElementType::Tbody
                        | ElementType::Tfoot
                        | ElementType::Thead
                        | ElementType::Tr
                )
            })
            .unwrap_or(false);
        if !self.foster_parenting || !in_table {
            return Ok((current, None));
        }

        let Some(table_idx) = self.stack.position_of_type(ElementType::Table) else {
            // Fragment case: everything goes into the root.
            let root = self.stack.get(0).expect("stack non-empty").node.clone();
            return Ok((root, None));
        };
        let table = self.stack.get(table_idx).expect("index valid").node.clone();
        if let Some(parent) = self.handler.get_parent(&table, true)? {
            Ok((parent, Some(table)))
        } else {
            let below = self
                .stack
                .get(table_idx - 1)
                .expect("table has a frame below it")
                .node
                .clone();
            Ok((below, None))
        }
    }

    pub(crate) fn insert_at_appropriate_place(
        &mut self,
        child: &H::Handle,
    ) -> Result<H::Handle, TreeError> {
        let (parent, before) = self.appropriate_place()?;
        match before {
            Some(before) => self.handler.insert_before(&parent, child, &before),
            None => self.handler.append_child(&parent, child),
        }
    }

    /// Create and insert an element, pushing it on the open-element stack.
    /// The stack frame keeps the creation reference.
    pub(crate) fn insert_element(
        &mut self,
        ns: Namespace,
        tag: &TagView,
    ) -> Result<H::Handle, TreeError> {
        let node = self.create_element(ns, tag)?;
        self.insert_at_appropriate_place(&node)?;
        // Type tags fold case regardless of namespace; the created element's
        // name keeps whatever case adjustment the caller applied.
        let ty = if ns == Namespace::Html {
            tag.ty
        } else {
            elements::element_type(Namespace::Html, &tag.name)
        };
        self.stack.push(OpenElement {
            ns,
            ty,
            name: tag.name.clone(),
            node: node.clone(),
        });
        Ok(node)
    }

    /// Create and insert a void element: appended, never pushed, reference
    /// released immediately.
    pub(crate) fn insert_element_no_push(
        &mut self,
        ns: Namespace,
        tag: &TagView,
    ) -> Result<H::Handle, TreeError> {
        let node = self.create_element(ns, tag)?;
        self.insert_at_appropriate_place(&node)?;
        self.handler.unref_node(&node)?;
        Ok(node)
    }

    pub(crate) fn create_element(
        &mut self,
        ns: Namespace,
        tag: &TagView,
    ) -> Result<H::Handle, TreeError> {
        self.handler.create_element(&ElementData {
            ns,
            name: tag.name.clone(),
            attributes: tag.attrs.clone(),
        })
    }

    pub(crate) fn append_text(&mut self, data: &str) -> Result<(), TreeError> {
        if data.is_empty() {
            return Ok(());
        }
        let text = self.handler.create_text(data)?;
        self.insert_at_appropriate_place(&text)?;
        self.handler.unref_node(&text)?;
        Ok(())
    }

    pub(crate) fn append_comment(
        &mut self,
        data: &str,
        target: CommentTarget,
    ) -> Result<(), TreeError> {
        let node = self.handler.create_comment(data)?;
        match target {
            CommentTarget::Document => {
                let doc = self.document.clone();
                self.handler.append_child(&doc, &node)?;
            }
            CommentTarget::HtmlElement => {
                let html = self.stack.get(0).expect("html element open").node.clone();
                self.handler.append_child(&html, &node)?;
            }
            CommentTarget::CurrentNode => {
                self.insert_at_appropriate_place(&node)?;
            }
        }
        self.handler.unref_node(&node)?;
        Ok(())
    }

    /// Pop the current node and release the stack's reference.
    pub(crate) fn pop_current(&mut self) -> Result<Option<OpenElement<H::Handle>>, TreeError> {
        match self.stack.pop() {
            Some(frame) => {
                self.handler.unref_node(&frame.node)?;
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    /// Pop frames until (and including) the topmost HTML element of `ty`.
    pub(crate) fn pop_until(&mut self, ty: ElementType) -> Result<(), TreeError> {
        while let Some(frame) = self.stack.pop() {
            self.handler.unref_node(&frame.node)?;
            if frame.ns == Namespace::Html && frame.ty == ty {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn pop_until_one_of(&mut self, tys: &[ElementType]) -> Result<(), TreeError> {
        while let Some(frame) = self.stack.pop() {
            self.handler.unref_node(&frame.node)?;
            if frame.ns == Namespace::Html && tys.contains(&frame.ty) {
                break;
            }
        }
        Ok(())
    }

    /// Pop frames above the topmost table/tbody-context boundary ("clear the
    /// stack back to a table context").
    pub(crate) fn clear_stack_to(&mut self, tys: &[ElementType]) -> Result<(), TreeError> {
        while let Some(frame) = self.stack.current() {
            if frame.ns == Namespace::Html && tys.contains(&frame.ty) {
                break;
            }
            if self.stack.len() == 1 {
                break;
            }
            self.pop_current()?;
        }
        Ok(())
    }

    pub(crate) fn generate_implied_end_tags(
        &mut self,
        except: Option<ElementType>,
    ) -> Result<(), TreeError> {
        use ElementType::*;
        while let Some(frame) = self.stack.current() {
            if frame.ns != Namespace::Html {
                break;
            }
            let implied = matches!(frame.ty, Dd | Dt | Li | Option | Optgroup | P | Rp | Rt);
            if !implied || Some(frame.ty) == except {
                break;
            }
            self.pop_current()?;
        }
        Ok(())
    }

    /// Close a `p` element in button scope.
    pub(crate) fn close_p_element(&mut self, ctx: &mut ParseContext) -> Result<(), TreeError> {
        self.generate_implied_end_tags(Some(ElementType::P))?;
        if self.current_type() != Some(ElementType::P) {
            self.parse_error(ctx, ParseErrorCode::UnclosedElements);
        }
        self.pop_until(ElementType::P)
    }

    pub(crate) fn in_scope(&self, ty: ElementType, scope: Scope) -> bool {
        self.stack.in_scope(ty, scope)
    }

    /// Associate a form-associated element with the open form, if any.
    pub(crate) fn associate_form(&mut self, node: &H::Handle) -> Result<(), TreeError> {
        if let Some(form) = self.form.clone() {
            self.handler.form_associate(&form, node)?;
        }
        Ok(())
    }

    /// Set the head pointer, taking an extra reference for it.
    pub(crate) fn set_head(&mut self, node: &H::Handle) -> Result<(), TreeError> {
        self.handler.ref_node(node)?;
        if let Some(old) = self.head.replace(node.clone()) {
            self.handler.unref_node(&old)?;
        }
        Ok(())
    }

    pub(crate) fn set_form(&mut self, node: Option<&H::Handle>) -> Result<(), TreeError> {
        if let Some(node) = node {
            self.handler.ref_node(node)?;
        }
        let old = match node {
            Some(node) => self.form.replace(node.clone()),
            None => self.form.take(),
        };
        if let Some(old) = old {
            self.handler.unref_node(&old)?;
        }
        Ok(())
    }

    /// Generic RCDATA/RAWTEXT/script element handling: insert, switch the
    /// tokenizer, remember where to come back to.
    pub(crate) fn generic_text_element(
        &mut self,
        tag: &TagView,
        model: ContentModel,
        fx: &mut StepEffects,
    ) -> Result<(), TreeError> {
        self.insert_element(Namespace::Html, tag)?;
        fx.content_model = Some(model);
        self.orig_mode = Some(self.mode);
        self.mode = InsertionMode::Text;
        Ok(())
    }

    /// The "reset the insertion mode appropriately" algorithm.
    pub(crate) fn reset_insertion_mode(&mut self) {
        use ElementType::*;
        for idx in (0..self.stack.len()).rev() {
            let last = idx == 0;
            let frame = self.stack.get(idx).expect("index valid");
            let (ns, ty) = if last {
                match self.fragment.as_ref() {
                    Some(frag) => (frag.ns, elements::element_type(frag.ns, &frag.name)),
                    None => (frame.ns, frame.ty),
                }
            } else {
                (frame.ns, frame.ty)
            };
            if ns != Namespace::Html {
                if last {
                    self.mode = InsertionMode::InBody;
                    return;
                }
                continue;
            }
            match ty {
                Select => {
                    let mut in_table = false;
                    for above in (0..idx).rev() {
                        let f = self.stack.get(above).expect("index valid");
                        if f.ns == Namespace::Html && f.ty == Table {
                            in_table = true;
                            break;
                        }
                    }
                    self.mode = if in_table {
                        InsertionMode::InSelectInTable
                    } else {
                        InsertionMode::InSelect
                    };
                    return;
                }
                Td | Th if !last => {
                    self.mode = InsertionMode::InCell;
                    return;
                }
                Tr => {
                    self.mode = InsertionMode::InRow;
                    return;
                }
                Tbody | Thead | Tfoot => {
                    self.mode = InsertionMode::InTableBody;
                    return;
                }
                Caption => {
                    self.mode = InsertionMode::InCaption;
                    return;
                }
                Colgroup => {
                    self.mode = InsertionMode::InColumnGroup;
                    return;
                }
                Table => {
                    self.mode = InsertionMode::InTable;
                    return;
                }
                Head if !last => {
                    self.mode = InsertionMode::InHead;
                    return;
                }
                Body => {
                    self.mode = InsertionMode::InBody;
                    return;
                }
                Frameset => {
                    self.mode = InsertionMode::InFrameset;
                    return;
                }
                Html => {
                    self.mode = if self.head.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    };
                    return;
                }
                _ if last => {
                    self.mode = InsertionMode::InBody;
                    return;
                }
                _ => {}
            }
        }
        self.mode = InsertionMode::InBody;
    }

    /// Stop parsing: empty every owning structure, balancing references.
    pub(crate) fn stop_parsing(&mut self) -> Result<(), TreeError> {
        while let Some(frame) = self.stack.pop() {
            self.handler.unref_node(&frame.node)?;
        }
        let released = self.formatting.clear_all();
        for node in released {
            self.handler.unref_node(&node)?;
        }
        if let Some(head) = self.head.take() {
            self.handler.unref_node(&head)?;
        }
        if let Some(form) = self.form.take() {
            self.handler.unref_node(&form)?;
        }
        self.done = true;
        Ok(())
    }

    /// Teardown path: best-effort release of everything still referenced.
    pub(crate) fn release_all(&mut self) -> Result<(), TreeError> {
        if !self.done {
            self.stop_parsing()?;
        }
        Ok(())
    }

    /// Return to the initial state, releasing every held reference. Used when
    /// a mid-stream encoding change restarts the parse.
    pub fn reset(&mut self) -> Result<(), TreeError> {
        self.release_all()?;
        self.mode = InsertionMode::Initial;
        self.orig_mode = None;
        self.quirks = QuirksMode::None;
        self.frameset_ok = true;
        self.foster_parenting = false;
        self.ignore_lf = false;
        self.pending_table_text.clear();
        self.done = false;
        Ok(())
    }

    // --- text mode -------------------------------------------------------

    fn handle_text(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Chars(data) => {
                self.append_text(data)?;
                Ok(Flow::Done)
            }
            Tok::End(_) => {
                self.pop_current()?;
                self.mode = self.orig_mode.take().unwrap_or(InsertionMode::InBody);
                fx.content_model = Some(ContentModel::Pcdata);
                Ok(Flow::Done)
            }
            Tok::Eof => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEof);
                self.pop_current()?;
                let mode = self.orig_mode.take().unwrap_or(InsertionMode::InBody);
                fx.content_model = Some(ContentModel::Pcdata);
                Ok(Flow::Reprocess(mode))
            }
            _ => {
                // Comments and doctypes cannot reach text mode.
                self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                Ok(Flow::Done)
            }
        }
    }
}

impl<H: TreeHandler> Drop for TreeBuilder<H> {
    fn drop(&mut self) {
        let _ = self.release_all();
    }
}

pub(crate) fn is_html_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

pub(crate) fn is_all_whitespace(s: &str) -> bool {
    s.chars().all(is_html_whitespace)
}
