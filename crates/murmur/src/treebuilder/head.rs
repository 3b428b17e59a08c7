//! Head-family insertion modes: before-head, in-head, in-head-noscript and
//! after-head, including `<meta charset>` discovery.

use crate::charset;
use crate::context::ParseContext;
use crate::elements::ElementType;
use crate::errors::{ParseErrorCode, TreeError};
use crate::token::Namespace;
use crate::tokenizer::ContentModel;

use super::handler::TreeHandler;
use super::{
    CommentTarget, Flow, InsertionMode, StepEffects, TagView, Tok, TreeBuilder, is_all_whitespace,
};

impl<H: TreeHandler> TreeBuilder<H> {
    pub(crate) fn handle_before_head(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Chars(data) if is_all_whitespace(data) => Ok(Flow::Done),
            Tok::Comment(data) => {
                self.append_comment(data, CommentTarget::CurrentNode)?;
                Ok(Flow::Done)
            }
            Tok::Doctype { .. } => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }
            Tok::Start(tag) if tag.ty == ElementType::Html => self.handle_in_body(tok, ctx, fx),
            Tok::Start(tag) if tag.ty == ElementType::Head => {
                let head = self.insert_element(Namespace::Html, tag)?;
                self.set_head(&head)?;
                self.mode = InsertionMode::InHead;
                Ok(Flow::Done)
            }
            Tok::End(tag)
                if !matches!(
                    tag.ty,
                    ElementType::Head | ElementType::Body | ElementType::Html | ElementType::Br
                ) =>
            {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            _ => {
                let synthetic = TagView {
                    name: "head".to_string(),
                    ty: ElementType::Head,
                    self_closing: false,
                    attrs: Vec::new(),
                };
                let head = self.insert_element(Namespace::Html, &synthetic)?;
                self.set_head(&head)?;
                Ok(Flow::Reprocess(InsertionMode::InHead))
            }
        }
    }

    pub(crate) fn handle_in_head(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::Chars(data) if is_all_whitespace(data) => {
                self.append_text(data)?;
                Ok(Flow::Done)
            }
            Tok::Comment(data) => {
                self.append_comment(data, CommentTarget::CurrentNode)?;
                Ok(Flow::Done)
            }
            Tok::Doctype { .. } => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }
            Tok::Start(tag) => match tag.ty {
                Html => self.handle_in_body(tok, ctx, fx),
                Base | Basefont | Bgsound | Command | Link => {
                    self.insert_element_no_push(Namespace::Html, tag)?;
                    Ok(Flow::Done)
                }
                Meta => {
                    self.insert_element_no_push(Namespace::Html, tag)?;
                    self.check_meta_charset(tag, fx)?;
                    Ok(Flow::Done)
                }
                Title => {
                    self.generic_text_element(tag, ContentModel::Rcdata, fx)?;
                    Ok(Flow::Done)
                }
                Noframes | Style => {
                    self.generic_text_element(tag, ContentModel::Cdata, fx)?;
                    Ok(Flow::Done)
                }
                Noscript if self.scripting => {
                    self.generic_text_element(tag, ContentModel::Cdata, fx)?;
                    Ok(Flow::Done)
                }
                Noscript => {
                    self.insert_element(Namespace::Html, tag)?;
                    self.mode = InsertionMode::InHeadNoscript;
                    Ok(Flow::Done)
                }
                Script => {
                    self.generic_text_element(tag, ContentModel::ScriptData, fx)?;
                    Ok(Flow::Done)
                }
                Head => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    Ok(Flow::Done)
                }
                _ => self.leave_head(),
            },
            Tok::End(tag) => match tag.ty {
                Head => {
                    self.pop_current()?;
                    self.mode = InsertionMode::AfterHead;
                    Ok(Flow::Done)
                }
                Body | Html | Br => self.leave_head(),
                _ => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    Ok(Flow::Done)
                }
            },
            _ => self.leave_head(),
        }
    }

    fn leave_head(&mut self) -> Result<Flow, TreeError> {
        self.pop_current()?;
        Ok(Flow::Reprocess(InsertionMode::AfterHead))
    }

    /// `<meta charset>` / `http-equiv` charset discovery. The outcome is an
    /// effect: the parser shell drives the input stream, which decides
    /// whether the change is still possible.
    fn check_meta_charset(&mut self, tag: &TagView, fx: &mut StepEffects) -> Result<(), TreeError> {
        let mut found = None;
        for attr in &tag.attrs {
            if attr.name == "charset" {
                found = charset::for_meta_label(attr.value.trim().as_bytes());
                break;
            }
        }
        if found.is_none() {
            let http_equiv = tag
                .attrs
                .iter()
                .find(|a| a.name == "http-equiv")
                .map(|a| a.value.as_str());
            if http_equiv.is_some_and(|v| v.eq_ignore_ascii_case("content-type")) {
                if let Some(content) = tag.attrs.iter().find(|a| a.name == "content") {
                    found = charset::charset_from_content(&content.value);
                }
            }
        }
        if let Some(encoding) = found {
            log::debug!(
                target: "murmur.treebuilder",
                "meta declared charset {}",
                encoding.name()
            );
            fx.encoding = Some(encoding);
        }
        Ok(())
    }

    pub(crate) fn handle_in_head_noscript(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::Doctype { .. } => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }
            Tok::Start(tag) if tag.ty == Html => self.handle_in_body(tok, ctx, fx),
            Tok::End(tag) if tag.ty == Noscript => {
                self.pop_current()?;
                self.mode = InsertionMode::InHead;
                Ok(Flow::Done)
            }
            Tok::Chars(data) if is_all_whitespace(data) => self.handle_in_head(tok, ctx, fx),
            Tok::Comment(_) => self.handle_in_head(tok, ctx, fx),
            Tok::Start(tag)
                if matches!(tag.ty, Basefont | Bgsound | Link | Meta | Noframes | Style) =>
            {
                self.handle_in_head(tok, ctx, fx)
            }
            Tok::Start(tag) if matches!(tag.ty, Head | Noscript) => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                Ok(Flow::Done)
            }
            Tok::End(tag) if tag.ty != Br => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            _ => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                self.pop_current()?;
                Ok(Flow::Reprocess(InsertionMode::InHead))
            }
        }
    }

    pub(crate) fn handle_after_head(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::Chars(data) if is_all_whitespace(data) => {
                self.append_text(data)?;
                Ok(Flow::Done)
            }
            Tok::Comment(data) => {
                self.append_comment(data, CommentTarget::CurrentNode)?;
                Ok(Flow::Done)
            }
            Tok::Doctype { .. } => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }
            Tok::Start(tag) => match tag.ty {
                Html => self.handle_in_body(tok, ctx, fx),
                Body => {
                    self.insert_element(Namespace::Html, tag)?;
                    self.frameset_ok = false;
                    self.mode = InsertionMode::InBody;
                    Ok(Flow::Done)
                }
                Frameset => {
                    self.insert_element(Namespace::Html, tag)?;
                    self.mode = InsertionMode::InFrameset;
                    Ok(Flow::Done)
                }
                Base | Basefont | Bgsound | Link | Meta | Noframes | Script | Style | Title => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    let head = self
                        .head
                        .clone()
                        .expect("head pointer set before after-head");
                    self.handler.ref_node(&head)?;
                    self.stack.push(super::stack::OpenElement {
                        ns: Namespace::Html,
                        ty: ElementType::Head,
                        name: "head".to_string(),
                        node: head.clone(),
                    });
                    let flow = self.handle_in_head(tok, ctx, fx)?;
                    // In-head handling may have pushed a text element; only
                    // drop the reopened head frame when it is still current.
                    if self
                        .stack
                        .current()
                        .map(|f| f.node == head)
                        .unwrap_or(false)
                    {
                        self.pop_current()?;
                    } else if let Some(idx) = self.stack.position_of(&head) {
                        let frame = self.stack.remove(idx);
                        self.handler.unref_node(&frame.node)?;
                    }
                    Ok(flow)
                }
                Head => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    Ok(Flow::Done)
                }
                _ => self.synthesize_body(),
            },
            Tok::End(tag) if !matches!(tag.ty, Body | Html | Br) => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            _ => self.synthesize_body(),
        }
    }

    fn synthesize_body(&mut self) -> Result<Flow, TreeError> {
        let synthetic = TagView {
            name: "body".to_string(),
            ty: ElementType::Body,
            self_closing: false,
            attrs: Vec::new(),
        };
        self.insert_element(Namespace::Html, &synthetic)?;
        Ok(Flow::Reprocess(InsertionMode::InBody))
    }
}
