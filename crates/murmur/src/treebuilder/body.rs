//! The "in body" insertion mode.

use crate::context::ParseContext;
use crate::elements::{self, ElementType};
use crate::errors::{ParseErrorCode, TreeError};
use crate::token::Namespace;
use crate::tokenizer::ContentModel;

use super::formatting::AdoptionOutcome;
use super::handler::TreeHandler;
use super::stack::Scope;
use super::{
    CommentTarget, Flow, InsertionMode, StepEffects, TagView, Tok, TreeBuilder, is_all_whitespace,
};

/// Element types that may legitimately still be open when the body ends.
fn may_be_open_at_end(ty: ElementType) -> bool {
    use ElementType::*;
    matches!(
        ty,
        Dd | Dt | Li | Option | Optgroup | P | Rp | Rt | Tbody | Td | Tfoot | Th | Thead | Tr
            | Body | Html
    )
}

impl<H: TreeHandler> TreeBuilder<H> {
    pub(crate) fn handle_in_body(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Chars(data) => {
                self.reconstruct_formatting()?;
                self.append_text(data)?;
                if !is_all_whitespace(data) {
                    self.frameset_ok = false;
                }
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
            Tok::Start(tag) => self.in_body_start(tag, ctx, fx),
            Tok::End(tag) => self.in_body_end(tag, ctx),
            Tok::Eof => {
                if self
                    .stack
                    .iter()
                    .any(|f| f.ns == Namespace::Html && !may_be_open_at_end(f.ty))
                {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                self.stop_parsing()?;
                Ok(Flow::Done)
            }
        }
    }

    fn in_body_start(
        &mut self,
        tag: &TagView,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tag.ty {
            Html => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                let root = self.stack.get(0).expect("html element open").node.clone();
                self.handler.add_attributes(&root, &tag.attrs)?;
                Ok(Flow::Done)
            }
            Base | Basefont | Bgsound | Command | Link | Meta | Noframes | Script | Style
            | Title => self.handle_in_head(&Tok::Start(tag.clone()), ctx, fx),
            Body => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                let body = self
                    .stack
                    .get(1)
                    .filter(|f| f.ty == Body)
                    .map(|f| f.node.clone());
                if let Some(body) = body {
                    self.frameset_ok = false;
                    self.handler.add_attributes(&body, &tag.attrs)?;
                }
                Ok(Flow::Done)
            }
            Frameset => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                let body_ok = self
                    .stack
                    .get(1)
                    .map(|f| f.ty == Body)
                    .unwrap_or(false);
                if !body_ok || !self.frameset_ok {
                    return Ok(Flow::Done);
                }
                // Tear the body element out and replace it with the frameset.
                let body = self.stack.get(1).expect("checked above").node.clone();
                if let Some(parent) = self.handler.get_parent(&body, false)? {
                    self.handler.remove_child(&parent, &body)?;
                }
                while self.stack.len() > 1 {
                    self.pop_current()?;
                }
                self.insert_element(Namespace::Html, tag)?;
                self.mode = InsertionMode::InFrameset;
                Ok(Flow::Done)
            }
            Address | Article | Aside | Blockquote | Center | Details | Dialog | Dir | Div | Dl
            | Fieldset | Figcaption | Figure | Footer | Header | Main | Menu | Nav | Ol | P
            | Section | Summary | Ul | Datagrid => {
                self.close_p_in_button_scope(ctx)?;
                self.insert_element(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            H1 | H2 | H3 | H4 | H5 | H6 => {
                self.close_p_in_button_scope(ctx)?;
                if matches!(self.current_type(), Some(H1 | H2 | H3 | H4 | H5 | H6)) {
                    self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                    self.pop_current()?;
                }
                self.insert_element(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Pre | Listing => {
                self.close_p_in_button_scope(ctx)?;
                self.insert_element(Namespace::Html, tag)?;
                self.ignore_lf = true;
                self.frameset_ok = false;
                Ok(Flow::Done)
            }
            Form => {
                if self.form.is_some() {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                    return Ok(Flow::Done);
                }
                self.close_p_in_button_scope(ctx)?;
                let node = self.insert_element(Namespace::Html, tag)?;
                self.set_form(Some(&node))?;
                Ok(Flow::Done)
            }
            Li => {
                self.frameset_ok = false;
                self.close_list_item_like(ctx, &[Li])?;
                self.close_p_in_button_scope(ctx)?;
                self.insert_element(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Dd | Dt => {
                self.frameset_ok = false;
                self.close_list_item_like(ctx, &[Dd, Dt])?;
                self.close_p_in_button_scope(ctx)?;
                self.insert_element(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Plaintext => {
                self.close_p_in_button_scope(ctx)?;
                self.insert_element(Namespace::Html, tag)?;
                fx.content_model = Some(ContentModel::Plaintext);
                Ok(Flow::Done)
            }
            Button => {
                if self.in_scope(Button, Scope::Default) {
                    self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                    self.generate_implied_end_tags(None)?;
                    self.pop_until(Button)?;
                }
                self.reconstruct_formatting()?;
                let node = self.insert_element(Namespace::Html, tag)?;
                self.associate_form(&node)?;
                self.frameset_ok = false;
                Ok(Flow::Done)
            }
            A => {
                if self.formatting.find_since_marker(A, "a").is_some() {
                    self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                    self.adoption_agency(ctx, A, "a")?;
                    // The agency may leave the stale entry behind; scrub it.
                    if let Some(idx) = self.formatting.find_since_marker(A, "a") {
                        if let super::formatting::FormatEntry::Element(e) =
                            self.formatting.remove(idx)
                        {
                            if let Some(pos) = self.stack.position_of(&e.node) {
                                let frame = self.stack.remove(pos);
                                self.handler.unref_node(&frame.node)?;
                            }
                            self.handler.unref_node(&e.node)?;
                        }
                    }
                }
                self.reconstruct_formatting()?;
                let node = self.insert_element(Namespace::Html, tag)?;
                self.push_formatting(tag, &node)?;
                Ok(Flow::Done)
            }
            B | Big | Code | Em | Font | I | S | Small | Strike | Strong | Tt | U => {
                self.reconstruct_formatting()?;
                let node = self.insert_element(Namespace::Html, tag)?;
                self.push_formatting(tag, &node)?;
                Ok(Flow::Done)
            }
            Nobr => {
                self.reconstruct_formatting()?;
                if self.in_scope(Nobr, Scope::Default) {
                    self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                    self.adoption_agency(ctx, Nobr, "nobr")?;
                    self.reconstruct_formatting()?;
                }
                let node = self.insert_element(Namespace::Html, tag)?;
                self.push_formatting(tag, &node)?;
                Ok(Flow::Done)
            }
            Applet | Marquee | Object => {
                self.reconstruct_formatting()?;
                let node = self.insert_element(Namespace::Html, tag)?;
                if tag.ty == Object {
                    self.associate_form(&node)?;
                }
                self.formatting.push_marker();
                self.frameset_ok = false;
                Ok(Flow::Done)
            }
            Table => {
                if self.quirks != super::QuirksMode::Full {
                    self.close_p_in_button_scope(ctx)?;
                }
                self.insert_element(Namespace::Html, tag)?;
                self.frameset_ok = false;
                self.mode = InsertionMode::InTable;
                Ok(Flow::Done)
            }
            Area | Br | Embed | Img | Wbr => {
                self.reconstruct_formatting()?;
                self.insert_element_no_push(Namespace::Html, tag)?;
                self.frameset_ok = false;
                Ok(Flow::Done)
            }
            Input => {
                self.reconstruct_formatting()?;
                let node = self.insert_element_no_push(Namespace::Html, tag)?;
                self.associate_form(&node)?;
                let hidden = tag
                    .attrs
                    .iter()
                    .find(|a| a.name == "type")
                    .is_some_and(|a| a.value.eq_ignore_ascii_case("hidden"));
                if !hidden {
                    self.frameset_ok = false;
                }
                Ok(Flow::Done)
            }
            Param | Spacer => {
                self.insert_element_no_push(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Hr => {
                self.close_p_in_button_scope(ctx)?;
                self.insert_element_no_push(Namespace::Html, tag)?;
                self.frameset_ok = false;
                Ok(Flow::Done)
            }
            Image => {
                // Don't ask.
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                let img = TagView {
                    name: "img".to_string(),
                    ty: Img,
                    self_closing: tag.self_closing,
                    attrs: tag.attrs.clone(),
                };
                self.in_body_start(&img, ctx, fx)
            }
            Textarea => {
                let node = self.insert_element(Namespace::Html, tag)?;
                self.associate_form(&node)?;
                self.ignore_lf = true;
                self.frameset_ok = false;
                fx.content_model = Some(ContentModel::Rcdata);
                self.orig_mode = Some(self.mode);
                self.mode = InsertionMode::Text;
                Ok(Flow::Done)
            }
            Xmp => {
                self.close_p_in_button_scope(ctx)?;
                self.reconstruct_formatting()?;
                self.frameset_ok = false;
                self.generic_text_element(tag, ContentModel::Cdata, fx)?;
                Ok(Flow::Done)
            }
            Iframe => {
                self.frameset_ok = false;
                self.generic_text_element(tag, ContentModel::Cdata, fx)?;
                Ok(Flow::Done)
            }
            Noembed => {
                self.generic_text_element(tag, ContentModel::Cdata, fx)?;
                Ok(Flow::Done)
            }
            Noscript if self.scripting => {
                self.generic_text_element(tag, ContentModel::Cdata, fx)?;
                Ok(Flow::Done)
            }
            Select => {
                self.reconstruct_formatting()?;
                let node = self.insert_element(Namespace::Html, tag)?;
                self.associate_form(&node)?;
                self.frameset_ok = false;
                self.mode = match self.mode {
                    InsertionMode::InTable
                    | InsertionMode::InCaption
                    | InsertionMode::InTableBody
                    | InsertionMode::InRow
                    | InsertionMode::InCell => InsertionMode::InSelectInTable,
                    _ => InsertionMode::InSelect,
                };
                Ok(Flow::Done)
            }
            Optgroup | Option => {
                if self.current_type() == Some(Option) {
                    self.pop_current()?;
                }
                self.reconstruct_formatting()?;
                self.insert_element(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Rp | Rt => {
                if self.in_scope(Ruby, Scope::Default) {
                    self.generate_implied_end_tags(None)?;
                    if self.current_type() != Some(Ruby) {
                        self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                    }
                }
                self.insert_element(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Math => {
                self.reconstruct_formatting()?;
                let adjusted = super::foreign::adjusted_foreign_tag(tag, Namespace::MathMl);
                self.insert_element(Namespace::MathMl, &adjusted)?;
                if tag.self_closing {
                    self.pop_current()?;
                }
                Ok(Flow::Done)
            }
            Svg => {
                self.reconstruct_formatting()?;
                let adjusted = super::foreign::adjusted_foreign_tag(tag, Namespace::Svg);
                self.insert_element(Namespace::Svg, &adjusted)?;
                if tag.self_closing {
                    self.pop_current()?;
                }
                Ok(Flow::Done)
            }
            Caption | Col | Colgroup | Frame | Head | Tbody | Td | Tfoot | Th | Thead | Tr => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                Ok(Flow::Done)
            }
            _ => {
                if tag.self_closing {
                    self.parse_error(ctx, ParseErrorCode::UnacknowledgedSelfClosingTag);
                }
                self.reconstruct_formatting()?;
                self.insert_element(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
        }
    }

    fn in_body_end(&mut self, tag: &TagView, ctx: &mut ParseContext) -> Result<Flow, TreeError> {
        use ElementType::*;
        match tag.ty {
            Body => {
                if !self.in_scope(Body, Scope::Default) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                if self
                    .stack
                    .iter()
                    .any(|f| f.ns == Namespace::Html && !may_be_open_at_end(f.ty))
                {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                self.mode = InsertionMode::AfterBody;
                Ok(Flow::Done)
            }
            Html => {
                if !self.in_scope(Body, Scope::Default) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.mode = InsertionMode::AfterBody;
                Ok(Flow::Reprocess(InsertionMode::AfterBody))
            }
            Address | Article | Aside | Blockquote | Button | Center | Details | Dialog | Dir
            | Div | Dl | Fieldset | Figcaption | Figure | Footer | Header | Listing | Main
            | Menu | Nav | Ol | Pre | Section | Summary | Ul | Datagrid => {
                if !self.in_scope(tag.ty, Scope::Default) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.generate_implied_end_tags(None)?;
                if self.current_type() != Some(tag.ty) {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                self.pop_until(tag.ty)?;
                Ok(Flow::Done)
            }
            Form => {
                let form = self.form.clone();
                self.set_form(None)?;
                let Some(form) = form else {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                };
                if !self.stack.node_in_scope(&form, Scope::Default) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.generate_implied_end_tags(None)?;
                if self
                    .stack
                    .current()
                    .map(|f| f.node != form)
                    .unwrap_or(true)
                {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                if let Some(idx) = self.stack.position_of(&form) {
                    let frame = self.stack.remove(idx);
                    self.handler.unref_node(&frame.node)?;
                }
                Ok(Flow::Done)
            }
            P => {
                if !self.in_scope(P, Scope::Button) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    let synthetic = TagView {
                        name: "p".to_string(),
                        ty: P,
                        self_closing: false,
                        attrs: Vec::new(),
                    };
                    self.insert_element(Namespace::Html, &synthetic)?;
                }
                self.close_p_element(ctx)?;
                Ok(Flow::Done)
            }
            Li => {
                if !self.in_scope(Li, Scope::ListItem) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.generate_implied_end_tags(Some(Li))?;
                if self.current_type() != Some(Li) {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                self.pop_until(Li)?;
                Ok(Flow::Done)
            }
            Dd | Dt => {
                if !self.in_scope(tag.ty, Scope::Default) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.generate_implied_end_tags(Some(tag.ty))?;
                if self.current_type() != Some(tag.ty) {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                self.pop_until(tag.ty)?;
                Ok(Flow::Done)
            }
            H1 | H2 | H3 | H4 | H5 | H6 => {
                let headings = [H1, H2, H3, H4, H5, H6];
                if !headings.iter().any(|h| self.in_scope(*h, Scope::Default)) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.generate_implied_end_tags(None)?;
                if self.current_type() != Some(tag.ty) {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                self.pop_until_one_of(&headings)?;
                Ok(Flow::Done)
            }
            A | B | Big | Code | Em | Font | I | Nobr | S | Small | Strike | Strong | Tt | U => {
                match self.adoption_agency(ctx, tag.ty, &tag.name)? {
                    AdoptionOutcome::Handled => Ok(Flow::Done),
                    AdoptionOutcome::NoFormattingElement => self.any_other_end_tag(tag, ctx),
                }
            }
            Applet | Marquee | Object => {
                if !self.in_scope(tag.ty, Scope::Default) {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.generate_implied_end_tags(None)?;
                if self.current_type() != Some(tag.ty) {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                self.pop_until(tag.ty)?;
                self.clear_formatting_to_marker()?;
                Ok(Flow::Done)
            }
            Br => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                self.reconstruct_formatting()?;
                let synthetic = TagView {
                    name: "br".to_string(),
                    ty: Br,
                    self_closing: false,
                    attrs: Vec::new(),
                };
                self.insert_element_no_push(Namespace::Html, &synthetic)?;
                self.frameset_ok = false;
                Ok(Flow::Done)
            }
            _ => self.any_other_end_tag(tag, ctx),
        }
    }

    /// The "any other end tag" stack walk, matching by name so unknown
    /// elements close correctly.
    pub(crate) fn any_other_end_tag(
        &mut self,
        tag: &TagView,
        ctx: &mut ParseContext,
    ) -> Result<Flow, TreeError> {
        for idx in (0..self.stack.len()).rev() {
            let frame = self.stack.get(idx).expect("index valid");
            if frame.ns == Namespace::Html && frame.name == tag.name {
                let ty = frame.ty;
                self.generate_implied_end_tags(Some(ty))?;
                if idx != self.stack.len() - 1 {
                    self.parse_error(ctx, ParseErrorCode::UnclosedElements);
                }
                while self.stack.len() > idx {
                    self.pop_current()?;
                }
                return Ok(Flow::Done);
            }
            if elements::is_special(frame.ns, frame.ty) {
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                return Ok(Flow::Done);
            }
        }
        self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
        Ok(Flow::Done)
    }

    fn close_p_in_button_scope(&mut self, ctx: &mut ParseContext) -> Result<(), TreeError> {
        if self.in_scope(ElementType::P, Scope::Button) {
            self.close_p_element(ctx)?;
        }
        Ok(())
    }

    /// The li/dd/dt opening walk: close an open item of the same family,
    /// stopping at special elements other than address, div and p.
    fn close_list_item_like(
        &mut self,
        ctx: &mut ParseContext,
        kinds: &[ElementType],
    ) -> Result<(), TreeError> {
        use ElementType::*;
        for idx in (0..self.stack.len()).rev() {
            let frame = self.stack.get(idx).expect("index valid");
            if frame.ns == Namespace::Html && kinds.contains(&frame.ty) {
                let ty = frame.ty;
                self.generate_implied_end_tags(Some(ty))?;
                if self.current_type() != Some(ty) {
                    self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                }
                self.pop_until(ty)?;
                return Ok(());
            }
            if elements::is_special(frame.ns, frame.ty) && !matches!(frame.ty, Address | Div | P) {
                return Ok(());
            }
        }
        Ok(())
    }
}
