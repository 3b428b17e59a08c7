//! Document-level insertion modes: initial, before-html, after-body and the
//! frameset family, plus quirks-mode determination from the DOCTYPE.

use crate::context::ParseContext;
use crate::elements::ElementType;
use crate::errors::{ParseErrorCode, TreeError};
use crate::token::Namespace;

use super::handler::{DoctypeDetails, ElementData, QuirksMode, TreeHandler};
use super::stack::OpenElement;
use super::{CommentTarget, Flow, InsertionMode, StepEffects, TagView, Tok, TreeBuilder, is_all_whitespace};

/// Public identifier prefixes that force full quirks mode.
const QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

const QUIRKY_PUBLIC_EXACT: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

const QUIRKY_SYSTEM_EXACT: &str = "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd";

const LIMITED_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

const CONDITIONAL_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

/// Determine the quirks mode implied by a DOCTYPE.
pub(crate) fn quirks_for_doctype(
    name: Option<&str>,
    public_id: Option<&str>,
    system_id: Option<&str>,
    force_quirks: bool,
) -> QuirksMode {
    if force_quirks {
        return QuirksMode::Full;
    }
    match name {
        Some(n) if n.eq_ignore_ascii_case("html") => {}
        _ => return QuirksMode::Full,
    }
    let public = public_id.map(|p| p.to_ascii_lowercase());
    let system = system_id.map(|s| s.to_ascii_lowercase());

    if let Some(system) = system.as_deref() {
        if system == QUIRKY_SYSTEM_EXACT {
            return QuirksMode::Full;
        }
    }
    if let Some(public) = public.as_deref() {
        if QUIRKY_PUBLIC_EXACT.contains(&public) {
            return QuirksMode::Full;
        }
        if QUIRKY_PUBLIC_PREFIXES.iter().any(|p| public.starts_with(p)) {
            return QuirksMode::Full;
        }
        let conditional = CONDITIONAL_PREFIXES.iter().any(|p| public.starts_with(p));
        if conditional && system.is_none() {
            return QuirksMode::Full;
        }
        if LIMITED_PUBLIC_PREFIXES.iter().any(|p| public.starts_with(p))
            || (conditional && system.is_some())
        {
            return QuirksMode::Limited;
        }
    }
    QuirksMode::None
}

impl<H: TreeHandler> TreeBuilder<H> {
    pub(crate) fn handle_initial(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        _fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Chars(data) if is_all_whitespace(data) => Ok(Flow::Done),
            Tok::Comment(data) => {
                let node = self.handler.create_comment(data)?;
                let doc = self.document.clone();
                self.handler.append_child(&doc, &node)?;
                self.handler.unref_node(&node)?;
                Ok(Flow::Done)
            }
            Tok::Doctype {
                name,
                public_id,
                system_id,
                force_quirks,
            } => {
                let node = self.handler.create_doctype(&DoctypeDetails {
                    name: name.map(str::to_string),
                    public_id: public_id.map(str::to_string),
                    system_id: system_id.map(str::to_string),
                    force_quirks: *force_quirks,
                })?;
                let doc = self.document.clone();
                self.handler.append_child(&doc, &node)?;
                self.handler.unref_node(&node)?;

                let quirks = quirks_for_doctype(*name, *public_id, *system_id, *force_quirks);
                self.quirks = quirks;
                self.handler.set_quirks_mode(quirks)?;
                self.mode = InsertionMode::BeforeHtml;
                Ok(Flow::Done)
            }
            _ => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                self.quirks = QuirksMode::Full;
                self.handler.set_quirks_mode(QuirksMode::Full)?;
                Ok(Flow::Reprocess(InsertionMode::BeforeHtml))
            }
        }
    }

    pub(crate) fn handle_before_html(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        _fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Doctype { .. } => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }
            Tok::Comment(data) => {
                self.append_comment(data, CommentTarget::Document)?;
                Ok(Flow::Done)
            }
            Tok::Chars(data) if is_all_whitespace(data) => Ok(Flow::Done),
            Tok::Start(tag) if tag.ty == ElementType::Html => {
                self.create_root(Some(tag))?;
                self.mode = InsertionMode::BeforeHead;
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
                self.create_root(None)?;
                Ok(Flow::Reprocess(InsertionMode::BeforeHead))
            }
        }
    }

    fn create_root(&mut self, tag: Option<&TagView>) -> Result<(), TreeError> {
        let data = match tag {
            Some(tag) => ElementData {
                ns: Namespace::Html,
                name: tag.name.clone(),
                attributes: tag.attrs.clone(),
            },
            None => ElementData {
                ns: Namespace::Html,
                name: "html".to_string(),
                attributes: Vec::new(),
            },
        };
        let root = self.handler.create_element(&data)?;
        let doc = self.document.clone();
        self.handler.append_child(&doc, &root)?;
        self.stack.push(OpenElement {
            ns: Namespace::Html,
            ty: ElementType::Html,
            name: "html".to_string(),
            node: root,
        });
        Ok(())
    }

    pub(crate) fn handle_after_body(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Chars(data) if is_all_whitespace(data) => self.handle_in_body(tok, ctx, fx),
            Tok::Comment(data) => {
                self.append_comment(data, CommentTarget::HtmlElement)?;
                Ok(Flow::Done)
            }
            Tok::Doctype { .. } => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }
            Tok::Start(tag) if tag.ty == ElementType::Html => self.handle_in_body(tok, ctx, fx),
            Tok::End(tag) if tag.ty == ElementType::Html => {
                if self.fragment.is_some() {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.mode = InsertionMode::AfterAfterBody;
                Ok(Flow::Done)
            }
            Tok::Eof => {
                self.stop_parsing()?;
                Ok(Flow::Done)
            }
            _ => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                Ok(Flow::Reprocess(InsertionMode::InBody))
            }
        }
    }

    pub(crate) fn handle_in_frameset(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
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
            Tok::Start(tag) if tag.ty == ElementType::Html => self.handle_in_body(tok, ctx, fx),
            Tok::Start(tag) if tag.ty == ElementType::Frameset => {
                self.insert_element(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Tok::End(tag) if tag.ty == ElementType::Frameset => {
                if self.stack.len() == 1 {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.pop_current()?;
                if self.fragment.is_none() && self.current_type() != Some(ElementType::Frameset) {
                    self.mode = InsertionMode::AfterFrameset;
                }
                Ok(Flow::Done)
            }
            Tok::Start(tag) if tag.ty == ElementType::Frame => {
                self.insert_element_no_push(Namespace::Html, tag)?;
                Ok(Flow::Done)
            }
            Tok::Start(tag) if tag.ty == ElementType::Noframes => {
                self.handle_in_head(tok, ctx, fx)
            }
            Tok::Eof => {
                if self.stack.len() != 1 {
                    self.parse_error(ctx, ParseErrorCode::UnexpectedEof);
                }
                self.stop_parsing()?;
                Ok(Flow::Done)
            }
            _ => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                Ok(Flow::Done)
            }
        }
    }

    pub(crate) fn handle_after_frameset(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
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
            Tok::Start(tag) if tag.ty == ElementType::Html => self.handle_in_body(tok, ctx, fx),
            Tok::End(tag) if tag.ty == ElementType::Html => {
                self.mode = InsertionMode::AfterAfterFrameset;
                Ok(Flow::Done)
            }
            Tok::Start(tag) if tag.ty == ElementType::Noframes => {
                self.handle_in_head(tok, ctx, fx)
            }
            Tok::Eof => {
                self.stop_parsing()?;
                Ok(Flow::Done)
            }
            _ => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                Ok(Flow::Done)
            }
        }
    }

    pub(crate) fn handle_after_after_body(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Comment(data) => {
                self.append_comment(data, CommentTarget::Document)?;
                Ok(Flow::Done)
            }
            Tok::Doctype { .. } => self.handle_in_body(tok, ctx, fx),
            Tok::Chars(data) if is_all_whitespace(data) => self.handle_in_body(tok, ctx, fx),
            Tok::Start(tag) if tag.ty == ElementType::Html => self.handle_in_body(tok, ctx, fx),
            Tok::Eof => {
                self.stop_parsing()?;
                Ok(Flow::Done)
            }
            _ => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                Ok(Flow::Reprocess(InsertionMode::InBody))
            }
        }
    }

    pub(crate) fn handle_after_after_frameset(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Comment(data) => {
                self.append_comment(data, CommentTarget::Document)?;
                Ok(Flow::Done)
            }
            Tok::Doctype { .. } => self.handle_in_body(tok, ctx, fx),
            Tok::Chars(data) if is_all_whitespace(data) => self.handle_in_body(tok, ctx, fx),
            Tok::Start(tag) if tag.ty == ElementType::Html => self.handle_in_body(tok, ctx, fx),
            Tok::Start(tag) if tag.ty == ElementType::Noframes => {
                self.handle_in_head(tok, ctx, fx)
            }
            Tok::Eof => {
                self.stop_parsing()?;
                Ok(Flow::Done)
            }
            _ => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedTokenInInsertionMode);
                Ok(Flow::Done)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_doctype_is_no_quirks() {
        assert_eq!(
            quirks_for_doctype(Some("html"), None, None, false),
            QuirksMode::None
        );
        assert_eq!(
            quirks_for_doctype(Some("HTML"), None, None, false),
            QuirksMode::None
        );
    }

    #[test]
    fn missing_or_wrong_name_is_full_quirks() {
        assert_eq!(quirks_for_doctype(None, None, None, false), QuirksMode::Full);
        assert_eq!(
            quirks_for_doctype(Some("xhtml"), None, None, false),
            QuirksMode::Full
        );
        assert_eq!(
            quirks_for_doctype(Some("html"), None, None, true),
            QuirksMode::Full
        );
    }

    #[test]
    fn legacy_public_ids_trigger_quirks() {
        assert_eq!(
            quirks_for_doctype(Some("html"), Some("-//W3C//DTD HTML 3.2//EN"), None, false),
            QuirksMode::Full
        );
        assert_eq!(
            quirks_for_doctype(Some("html"), Some("HTML"), None, false),
            QuirksMode::Full
        );
    }

    #[test]
    fn html_401_transitional_depends_on_system_id() {
        let public = Some("-//W3C//DTD HTML 4.01 Transitional//EN");
        assert_eq!(
            quirks_for_doctype(Some("html"), public, None, false),
            QuirksMode::Full
        );
        assert_eq!(
            quirks_for_doctype(
                Some("html"),
                public,
                Some("http://www.w3.org/TR/html4/loose.dtd"),
                false
            ),
            QuirksMode::Limited
        );
    }

    #[test]
    fn xhtml_transitional_is_limited_quirks() {
        assert_eq!(
            quirks_for_doctype(
                Some("html"),
                Some("-//W3C//DTD XHTML 1.0 Transitional//EN"),
                None,
                false
            ),
            QuirksMode::Limited
        );
    }
}
