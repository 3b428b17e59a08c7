//! Table insertion modes: in-table, in-table-text, in-caption,
//! in-column-group, in-table-body, in-row and in-cell.

use crate::context::ParseContext;
use crate::elements::ElementType;
use crate::errors::{ParseErrorCode, TreeError};
use crate::token::Namespace;

use super::handler::TreeHandler;
use super::stack::Scope;
use super::{
    CommentTarget, Flow, InsertionMode, StepEffects, TagView, Tok, TreeBuilder, is_all_whitespace,
};

const TABLE_CONTEXT: &[ElementType] = &[ElementType::Table, ElementType::Html];
const TBODY_CONTEXT: &[ElementType] = &[
    ElementType::Tbody,
    ElementType::Tfoot,
    ElementType::Thead,
    ElementType::Html,
];
const ROW_CONTEXT: &[ElementType] = &[ElementType::Tr, ElementType::Html];

impl<H: TreeHandler> TreeBuilder<H> {
    pub(crate) fn handle_in_table(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::Chars(_)
                if matches!(
                    self.current_type(),
                    Some(Table | Tbody | Tfoot | Thead | Tr)
                ) =>
            {
                self.pending_table_text.clear();
                self.orig_mode = Some(self.mode);
                self.mode = InsertionMode::InTableText;
                Ok(Flow::Reprocess(InsertionMode::InTableText))
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
                Caption => {
                    self.clear_stack_to(TABLE_CONTEXT)?;
                    self.formatting.push_marker();
                    self.insert_element(Namespace::Html, tag)?;
                    self.mode = InsertionMode::InCaption;
                    Ok(Flow::Done)
                }
                Colgroup => {
                    self.clear_stack_to(TABLE_CONTEXT)?;
                    self.insert_element(Namespace::Html, tag)?;
                    self.mode = InsertionMode::InColumnGroup;
                    Ok(Flow::Done)
                }
                Col => {
                    self.clear_stack_to(TABLE_CONTEXT)?;
                    let synthetic = TagView {
                        name: "colgroup".to_string(),
                        ty: Colgroup,
                        self_closing: false,
                        attrs: Vec::new(),
                    };
                    self.insert_element(Namespace::Html, &synthetic)?;
                    self.mode = InsertionMode::InColumnGroup;
                    Ok(Flow::Reprocess(InsertionMode::InColumnGroup))
                }
                Tbody | Tfoot | Thead => {
                    self.clear_stack_to(TABLE_CONTEXT)?;
                    self.insert_element(Namespace::Html, tag)?;
                    self.mode = InsertionMode::InTableBody;
                    Ok(Flow::Done)
                }
                Td | Th | Tr => {
                    self.clear_stack_to(TABLE_CONTEXT)?;
                    let synthetic = TagView {
                        name: "tbody".to_string(),
                        ty: Tbody,
                        self_closing: false,
                        attrs: Vec::new(),
                    };
                    self.insert_element(Namespace::Html, &synthetic)?;
                    self.mode = InsertionMode::InTableBody;
                    Ok(Flow::Reprocess(InsertionMode::InTableBody))
                }
                Table => {
                    self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                    if !self.in_scope(Table, Scope::Table) {
                        return Ok(Flow::Done);
                    }
                    self.pop_until(Table)?;
                    self.reset_insertion_mode();
                    Ok(Flow::Reprocess(self.mode))
                }
                Style | Script => self.handle_in_head(tok, ctx, fx),
                Input => {
                    let hidden = tag
                        .attrs
                        .iter()
                        .find(|a| a.name == "type")
                        .is_some_and(|a| a.value.eq_ignore_ascii_case("hidden"));
                    if hidden {
                        self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                        let node = self.insert_element_no_push(Namespace::Html, tag)?;
                        self.associate_form(&node)?;
                        Ok(Flow::Done)
                    } else {
                        self.in_table_anything_else(tok, ctx, fx)
                    }
                }
                Form => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    if self.form.is_none() {
                        let node = self.insert_element(Namespace::Html, tag)?;
                        self.set_form(Some(&node))?;
                        self.pop_current()?;
                    }
                    Ok(Flow::Done)
                }
                _ => self.in_table_anything_else(tok, ctx, fx),
            },
            Tok::End(tag) => match tag.ty {
                Table => {
                    if !self.in_scope(Table, Scope::Table) {
                        self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                        return Ok(Flow::Done);
                    }
                    self.pop_until(Table)?;
                    self.reset_insertion_mode();
                    Ok(Flow::Done)
                }
                Body | Caption | Col | Colgroup | Html | Tbody | Td | Tfoot | Th | Thead | Tr => {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    Ok(Flow::Done)
                }
                _ => self.in_table_anything_else(tok, ctx, fx),
            },
            Tok::Eof => self.handle_in_body(tok, ctx, fx),
            Tok::Chars(_) => self.in_table_anything_else(tok, ctx, fx),
        }
    }

    /// Anything-else in a table: foster-parent through the in-body rules.
    fn in_table_anything_else(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
        let saved = self.foster_parenting;
        self.foster_parenting = true;
        let flow = self.handle_in_body(tok, ctx, fx);
        self.foster_parenting = saved;
        flow
    }

    pub(crate) fn handle_in_table_text(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Chars(data) => {
                self.pending_table_text
                    .push((is_all_whitespace(data), data.to_string()));
                Ok(Flow::Done)
            }
            _ => {
                let pending = std::mem::take(&mut self.pending_table_text);
                let any_non_ws = pending.iter().any(|(ws, _)| !ws);
                if any_non_ws {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedCharacter);
                    let saved = self.foster_parenting;
                    self.foster_parenting = true;
                    for (_, text) in &pending {
                        self.handle_in_body(&Tok::Chars(text), ctx, fx)?;
                    }
                    self.foster_parenting = saved;
                } else {
                    for (_, text) in &pending {
                        self.append_text(text)?;
                    }
                }
                let mode = self.orig_mode.take().unwrap_or(InsertionMode::InTable);
                Ok(Flow::Reprocess(mode))
            }
        }
    }

    pub(crate) fn handle_in_caption(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::End(tag) if tag.ty == Caption => {
                if !self.in_scope(Caption, Scope::Table) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.close_caption(ctx)?;
                Ok(Flow::Done)
            }
            Tok::Start(tag)
                if matches!(
                    tag.ty,
                    Caption | Col | Colgroup | Tbody | Td | Tfoot | Th | Thead | Tr
                ) =>
            {
                self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                if !self.in_scope(Caption, Scope::Table) {
                    return Ok(Flow::Done);
                }
                self.close_caption(ctx)?;
                Ok(Flow::Reprocess(InsertionMode::InTable))
            }
            Tok::End(tag) if tag.ty == Table => {
                self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                if !self.in_scope(Caption, Scope::Table) {
                    return Ok(Flow::Done);
                }
                self.close_caption(ctx)?;
                Ok(Flow::Reprocess(InsertionMode::InTable))
            }
            Tok::End(tag)
                if matches!(
                    tag.ty,
                    Body | Col | Colgroup | Html | Tbody | Td | Tfoot | Th | Thead | Tr
                ) =>
            {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            _ => self.handle_in_body(tok, ctx, fx),
        }
    }

    fn close_caption(&mut self, ctx: &mut ParseContext) -> Result<(), TreeError> {
        self.generate_implied_end_tags(None)?;
        if self.current_type() != Some(ElementType::Caption) {
            self.parse_error(ctx, ParseErrorCode::UnclosedElements);
        }
        self.pop_until(ElementType::Caption)?;
        self.clear_formatting_to_marker()?;
        self.mode = InsertionMode::InTable;
        Ok(())
    }

    pub(crate) fn handle_in_column_group(
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
            Tok::Start(tag) if tag.ty == Html => self.handle_in_body(tok, ctx, fx),
            Tok::Start(tag) if tag.ty == Col => {
                self.insert_element_no_push(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Tok::End(tag) if tag.ty == Colgroup => {
                if self.current_type() != Some(Colgroup) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.pop_current()?;
                self.mode = InsertionMode::InTable;
                Ok(Flow::Done)
            }
            Tok::End(tag) if tag.ty == Col => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            Tok::Eof => self.handle_in_body(tok, ctx, fx),
            _ => {
                if self.current_type() != Some(Colgroup) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                    return Ok(Flow::Done);
                }
                self.pop_current()?;
                self.mode = InsertionMode::InTable;
                Ok(Flow::Reprocess(InsertionMode::InTable))
            }
        }
    }

    pub(crate) fn handle_in_table_body(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::Start(tag) if tag.ty == Tr => {
                self.clear_stack_to(TBODY_CONTEXT)?;
                self.insert_element(Namespace::Html, tag)?;
                self.mode = InsertionMode::InRow;
                Ok(Flow::Done)
            }
            Tok::Start(tag) if matches!(tag.ty, Td | Th) => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                self.clear_stack_to(TBODY_CONTEXT)?;
                let synthetic = TagView {
                    name: "tr".to_string(),
                    ty: Tr,
                    self_closing: false,
                    attrs: Vec::new(),
                };
                self.insert_element(Namespace::Html, &synthetic)?;
                self.mode = InsertionMode::InRow;
                Ok(Flow::Reprocess(InsertionMode::InRow))
            }
            Tok::End(tag) if matches!(tag.ty, Tbody | Tfoot | Thead) => {
                if !self.in_scope(tag.ty, Scope::Table) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.clear_stack_to(TBODY_CONTEXT)?;
                self.pop_current()?;
                self.mode = InsertionMode::InTable;
                Ok(Flow::Done)
            }
            Tok::Start(tag)
                if matches!(tag.ty, Caption | Col | Colgroup | Tbody | Tfoot | Thead) =>
            {
                self.leave_table_body(ctx)
            }
            Tok::End(tag) if tag.ty == Table => self.leave_table_body(ctx),
            Tok::End(tag)
                if matches!(tag.ty, Body | Caption | Col | Colgroup | Html | Td | Th | Tr) =>
            {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            _ => self.handle_in_table(tok, ctx, fx),
        }
    }

    fn leave_table_body(&mut self, ctx: &mut ParseContext) -> Result<Flow, TreeError> {
        use ElementType::*;
        if !(self.in_scope(Tbody, Scope::Table)
            || self.in_scope(Thead, Scope::Table)
            || self.in_scope(Tfoot, Scope::Table))
        {
            self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
            return Ok(Flow::Done);
        }
        self.clear_stack_to(TBODY_CONTEXT)?;
        self.pop_current()?;
        self.mode = InsertionMode::InTable;
        Ok(Flow::Reprocess(InsertionMode::InTable))
    }

    pub(crate) fn handle_in_row(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::Start(tag) if matches!(tag.ty, Td | Th) => {
                self.clear_stack_to(ROW_CONTEXT)?;
                self.insert_element(Namespace::Html, tag)?;
                self.mode = InsertionMode::InCell;
                self.formatting.push_marker();
                Ok(Flow::Done)
            }
            Tok::End(tag) if tag.ty == Tr => {
                if !self.in_scope(Tr, Scope::Table) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.clear_stack_to(ROW_CONTEXT)?;
                self.pop_current()?;
                self.mode = InsertionMode::InTableBody;
                Ok(Flow::Done)
            }
            Tok::Start(tag)
                if matches!(tag.ty, Caption | Col | Colgroup | Tbody | Tfoot | Thead | Tr) =>
            {
                self.leave_row(ctx)
            }
            Tok::End(tag) if tag.ty == Table => self.leave_row(ctx),
            Tok::End(tag) if matches!(tag.ty, Tbody | Tfoot | Thead) => {
                if !self.in_scope(tag.ty, Scope::Table) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.leave_row(ctx)
            }
            Tok::End(tag)
                if matches!(tag.ty, Body | Caption | Col | Colgroup | Html | Td | Th) =>
            {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            _ => self.handle_in_table(tok, ctx, fx),
        }
    }

    fn leave_row(&mut self, ctx: &mut ParseContext) -> Result<Flow, TreeError> {
        use ElementType::*;
        if !self.in_scope(Tr, Scope::Table) {
            self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
            return Ok(Flow::Done);
        }
        self.clear_stack_to(ROW_CONTEXT)?;
        self.pop_current()?;
        self.mode = InsertionMode::InTableBody;
        Ok(Flow::Reprocess(InsertionMode::InTableBody))
    }

    pub(crate) fn handle_in_cell(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tok {
            Tok::End(tag) if matches!(tag.ty, Td | Th) => {
                if !self.in_scope(tag.ty, Scope::Table) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.generate_implied_end_tags(None)?;
                if self.current_type() != Some(tag.ty) {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                self.pop_until(tag.ty)?;
                self.clear_formatting_to_marker()?;
                self.mode = InsertionMode::InRow;
                Ok(Flow::Done)
            }
            Tok::Start(tag)
                if matches!(
                    tag.ty,
                    Caption | Col | Colgroup | Tbody | Td | Tfoot | Th | Thead | Tr
                ) =>
            {
                if !(self.in_scope(Td, Scope::Table) || self.in_scope(Th, Scope::Table)) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    return Ok(Flow::Done);
                }
                self.close_cell(ctx)?;
                Ok(Flow::Reprocess(InsertionMode::InRow))
            }
            Tok::End(tag) if matches!(tag.ty, Body | Caption | Col | Colgroup | Html) => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            Tok::End(tag) if matches!(tag.ty, Table | Tbody | Tfoot | Thead | Tr) => {
                if !self.in_scope(tag.ty, Scope::Table) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.close_cell(ctx)?;
                Ok(Flow::Reprocess(InsertionMode::InRow))
            }
            _ => self.handle_in_body(tok, ctx, fx),
        }
    }

    /// Close the cell and return to the row.
    fn close_cell(&mut self, ctx: &mut ParseContext) -> Result<(), TreeError> {
        use ElementType::*;
        self.generate_implied_end_tags(None)?;
        if !matches!(self.current_type(), Some(Td | Th)) {
            self.parse_error(ctx, ParseErrorCode::UnclosedElements);
        }
        self.pop_until_one_of(&[Td, Th])?;
        self.clear_formatting_to_marker()?;
        self.mode = InsertionMode::InRow;
        Ok(())
    }
}
