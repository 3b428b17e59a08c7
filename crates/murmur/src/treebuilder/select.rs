//! The in-select and in-select-in-table insertion modes.

use crate::context::ParseContext;
use crate::elements::ElementType;
use crate::errors::{ParseErrorCode, TreeError};
use crate::token::Namespace;

use super::handler::TreeHandler;
use super::stack::Scope;
use super::{CommentTarget, Flow, StepEffects, Tok, TreeBuilder};

impl<H: TreeHandler> TreeBuilder<H> {
    pub(crate) fn handle_in_select(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::Chars(data) => {
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
                Option => {
                    if self.current_type() == Some(Option) {
                        self.pop_current()?;
                    }
                    self.insert_element(Namespace::Html, tag)?;
                    Ok(Flow::Done)
                }
                Optgroup => {
                    if self.current_type() == Some(Option) {
                        self.pop_current()?;
                    }
                    if self.current_type() == Some(Optgroup) {
                        self.pop_current()?;
                    }
                    self.insert_element(Namespace::Html, tag)?;
                    Ok(Flow::Done)
                }
                Select => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    if self.in_scope(Select, Scope::Select) {
                        self.pop_until(Select)?;
                        self.reset_insertion_mode();
                    }
                    Ok(Flow::Done)
                }
                Input | Textarea => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    if !self.in_scope(Select, Scope::Select) {
                        // Fragment case.
                        return Ok(Flow::Done);
                    }
                    self.pop_until(Select)?;
                    self.reset_insertion_mode();
                    Ok(Flow::Reprocess(self.mode))
                }
                Script => self.handle_in_head(tok, ctx, fx),
                _ => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    Ok(Flow::Done)
                }
            },
            Tok::End(tag) => match tag.ty {
                Optgroup => {
                    // An option directly inside an optgroup closes with it.
                    if self.current_type() == Some(Option)
                        && self.stack.len() >= 2
                        && self
                            .stack
                            .get(self.stack.len() - 2)
                            .map(|f| f.ty == Optgroup)
                            .unwrap_or(false)
                    {
                        self.pop_current()?;
                    }
                    if self.current_type() == Some(Optgroup) {
                        self.pop_current()?;
                    } else {
                        self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    }
                    Ok(Flow::Done)
                }
                Option => {
                    if self.current_type() == Some(Option) {
                        self.pop_current()?;
                    } else {
                        self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    }
                    Ok(Flow::Done)
                }
                Select => {
                    if !self.in_scope(Select, Scope::Select) {
                        // Fragment case.
                        self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                        return Ok(Flow::Done);
                    }
                    self.pop_until(Select)?;
                    self.reset_insertion_mode();
                    Ok(Flow::Done)
                }
                _ => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    Ok(Flow::Done)
                }
            },
            Tok::Eof => {
                if self.stack.len() != 1 {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEof);
                }
                self.stop_parsing()?;
                Ok(Flow::Done)
            }
        }
    }

    pub(crate) fn handle_in_select_in_table(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::Start(tag)
                if matches!(
                    tag.ty,
                    Caption | Table | Tbody | Tfoot | Thead | Tr | Td | Th
                ) =>
            {
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                self.pop_until(Select)?;
                self.reset_insertion_mode();
                Ok(Flow::Reprocess(self.mode))
            }
            Tok::End(tag)
                if matches!(
                    tag.ty,
                    Caption | Table | Tbody | Tfoot | Thead | Tr | Td | Th
                ) =>
            {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                if !self.in_scope(tag.ty, Scope::Table) {
                    return Ok(Flow::Done);
                }
                self.pop_until(Select)?;
                self.reset_insertion_mode();
                Ok(Flow::Reprocess(self.mode))
            }
            _ => self.handle_in_select(tok, ctx, fx),
        }
    }
}
