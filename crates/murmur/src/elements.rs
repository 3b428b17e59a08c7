//! Element-name to element-type mapping.
//!
//! A closed set of recognized HTML, MathML and SVG element names backed by a
//! compile-time perfect-hash table. HTML-namespace lookups fold ASCII case;
//! foreign-content lookups are exact.

use phf::phf_map;

use crate::token::Namespace;

/// Closed enumeration of recognized element types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum ElementType {
    // Special
    Address, Area, Article, Aside, Base, Basefont, Bgsound, Blockquote,
    Body, Br, Center, Col, Colgroup, Command, Datagrid, Dd, Details,
    Dialog, Dir, Div, Dl, Dt, Embed, Fieldset, Figcaption, Figure, Footer,
    Form, Frame, Frameset, H1, H2, H3, H4, H5, H6, Head, Header, Hr, Iframe,
    Image, Img, Input, Isindex, Li, Link, Listing, Main, Menu, Meta, Nav,
    Noembed, Noframes, Noscript, Ol, Optgroup, Option, P, Param, Plaintext,
    Pre, Script, Section, Select, Spacer, Style, Summary, Tbody, Textarea,
    Tfoot, Thead, Title, Tr, Ul, Wbr,
    // Scoping
    Applet, Button, Caption, Html, Marquee, Object, Table, Td, Th,
    // Formatting
    A, B, Big, Code, Em, Font, I, Nobr, S, Small, Strike, Strong, Tt, U,
    // Phrasing
    Label, Output, Rp, Rt, Ruby, Span, Sub, Sup, Var, Xmp,
    // MathML
    Math, Mglyph, Malignmark, Mi, Mo, Mn, Ms, Mtext, AnnotationXml,
    // SVG
    Svg, ForeignObject, Desc,
    Unknown,
}

static ELEMENT_TYPES: phf::Map<&'static str, ElementType> = phf_map! {
    "address" => ElementType::Address,
    "area" => ElementType::Area,
    "article" => ElementType::Article,
    "aside" => ElementType::Aside,
    "base" => ElementType::Base,
    "basefont" => ElementType::Basefont,
    "bgsound" => ElementType::Bgsound,
    "blockquote" => ElementType::Blockquote,
    "body" => ElementType::Body,
    "br" => ElementType::Br,
    "center" => ElementType::Center,
    "col" => ElementType::Col,
    "colgroup" => ElementType::Colgroup,
    "command" => ElementType::Command,
    "datagrid" => ElementType::Datagrid,
    "dd" => ElementType::Dd,
    "details" => ElementType::Details,
    "dialog" => ElementType::Dialog,
    "dir" => ElementType::Dir,
    "div" => ElementType::Div,
    "dl" => ElementType::Dl,
    "dt" => ElementType::Dt,
    "embed" => ElementType::Embed,
    "fieldset" => ElementType::Fieldset,
    "figcaption" => ElementType::Figcaption,
    "figure" => ElementType::Figure,
    "footer" => ElementType::Footer,
    "form" => ElementType::Form,
    "frame" => ElementType::Frame,
    "frameset" => ElementType::Frameset,
    "h1" => ElementType::H1,
    "h2" => ElementType::H2,
    "h3" => ElementType::H3,
    "h4" => ElementType::H4,
    "h5" => ElementType::H5,
    "h6" => ElementType::H6,
    "head" => ElementType::Head,
    "header" => ElementType::Header,
    "hr" => ElementType::Hr,
    "iframe" => ElementType::Iframe,
    "image" => ElementType::Image,
    "img" => ElementType::Img,
    "input" => ElementType::Input,
    "isindex" => ElementType::Isindex,
    "li" => ElementType::Li,
    "link" => ElementType::Link,
    "listing" => ElementType::Listing,
    "main" => ElementType::Main,
    "menu" => ElementType::Menu,
    "meta" => ElementType::Meta,
    "nav" => ElementType::Nav,
    "noembed" => ElementType::Noembed,
    "noframes" => ElementType::Noframes,
    "noscript" => ElementType::Noscript,
    "ol" => ElementType::Ol,
    "optgroup" => ElementType::Optgroup,
    "option" => ElementType::Option,
    "p" => ElementType::P,
    "param" => ElementType::Param,
    "plaintext" => ElementType::Plaintext,
    "pre" => ElementType::Pre,
    "script" => ElementType::Script,
    "section" => ElementType::Section,
    "select" => ElementType::Select,
    "spacer" => ElementType::Spacer,
    "style" => ElementType::Style,
    "summary" => ElementType::Summary,
    "tbody" => ElementType::Tbody,
    "textarea" => ElementType::Textarea,
    "tfoot" => ElementType::Tfoot,
    "thead" => ElementType::Thead,
    "title" => ElementType::Title,
    "tr" => ElementType::Tr,
    "ul" => ElementType::Ul,
    "wbr" => ElementType::Wbr,
    "applet" => ElementType::Applet,
    "button" => ElementType::Button,
    "caption" => ElementType::Caption,
    "html" => ElementType::Html,
    "marquee" => ElementType::Marquee,
    "object" => ElementType::Object,
    "table" => ElementType::Table,
    "td" => ElementType::Td,
    "th" => ElementType::Th,
    "a" => ElementType::A,
    "b" => ElementType::B,
    "big" => ElementType::Big,
    "code" => ElementType::Code,
    "em" => ElementType::Em,
    "font" => ElementType::Font,
    "i" => ElementType::I,
    "nobr" => ElementType::Nobr,
    "s" => ElementType::S,
    "small" => ElementType::Small,
    "strike" => ElementType::Strike,
    "strong" => ElementType::Strong,
    "tt" => ElementType::Tt,
    "u" => ElementType::U,
    "label" => ElementType::Label,
    "output" => ElementType::Output,
    "rp" => ElementType::Rp,
    "rt" => ElementType::Rt,
    "ruby" => ElementType::Ruby,
    "span" => ElementType::Span,
    "sub" => ElementType::Sub,
    "sup" => ElementType::Sup,
    "var" => ElementType::Var,
    "xmp" => ElementType::Xmp,
    "math" => ElementType::Math,
    "mglyph" => ElementType::Mglyph,
    "malignmark" => ElementType::Malignmark,
    "mi" => ElementType::Mi,
    "mo" => ElementType::Mo,
    "mn" => ElementType::Mn,
    "ms" => ElementType::Ms,
    "mtext" => ElementType::Mtext,
    "annotation-xml" => ElementType::AnnotationXml,
    "svg" => ElementType::Svg,
    "foreignobject" => ElementType::ForeignObject,
    "desc" => ElementType::Desc,
};

/// Longest name in the table; anything longer is `Unknown` without hashing.
const MAX_NAME_LEN: usize = 16;

/// Look up an element type for a tag name in the given namespace.
///
/// HTML names fold ASCII case; foreign names must already be in their
/// canonical (adjusted) case and match exactly.
pub fn element_type(ns: Namespace, name: &str) -> ElementType {
    if name.len() > MAX_NAME_LEN {
        return ElementType::Unknown;
    }
    match ns {
        Namespace::Html => {
            if name.bytes().any(|b| b.is_ascii_uppercase()) {
                let folded = name.to_ascii_lowercase();
                ELEMENT_TYPES.get(folded.as_str())
            } else {
                ELEMENT_TYPES.get(name)
            }
        }
        _ => ELEMENT_TYPES.get(name),
    }
    .copied()
    .unwrap_or(ElementType::Unknown)
}

/// Void elements: start tags that never take content or a matching end tag.
pub fn is_void(element: ElementType) -> bool {
    use ElementType::*;
    matches!(
        element,
        Area | Base | Basefont | Bgsound | Br | Col | Command | Embed | Frame | Hr | Img
            | Input | Link | Meta | Param | Spacer | Wbr
    )
}

/// Formatting elements tracked by the active formatting list.
pub fn is_formatting(element: ElementType) -> bool {
    use ElementType::*;
    matches!(
        element,
        A | B | Big | Code | Em | Font | I | Nobr | S | Small | Strike | Strong | Tt | U
    )
}

/// The "special" category used by in-body end-tag handling.
pub fn is_special(ns: Namespace, element: ElementType) -> bool {
    use ElementType::*;
    match ns {
        Namespace::Html => matches!(
            element,
            Address | Area | Article | Aside | Base | Basefont | Bgsound | Blockquote | Body
                | Br | Center | Col | Colgroup | Command | Datagrid | Dd | Details | Dialog
                | Dir | Div | Dl | Dt | Embed | Fieldset | Figcaption | Figure | Footer | Form
                | Frame | Frameset | H1 | H2 | H3 | H4 | H5 | H6 | Head | Header | Hr | Iframe
                | Image | Img | Input | Isindex | Li | Link | Listing | Main | Menu | Meta
                | Nav | Noembed | Noframes | Noscript | Ol | Optgroup | Option | P | Param
                | Plaintext | Pre | Script | Section | Select | Spacer | Style | Summary
                | Tbody | Textarea | Tfoot | Thead | Title | Tr | Ul | Wbr | Applet | Button
                | Caption | Html | Marquee | Object | Table | Td | Th
        ),
        Namespace::MathMl => matches!(element, Mi | Mo | Mn | Ms | Mtext | AnnotationXml),
        Namespace::Svg => matches!(element, ForeignObject | Desc | Title),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_lookup_folds_ascii_case() {
        assert_eq!(element_type(Namespace::Html, "DIV"), ElementType::Div);
        assert_eq!(element_type(Namespace::Html, "div"), ElementType::Div);
        assert_eq!(
            element_type(Namespace::Html, "annotation-xml"),
            ElementType::AnnotationXml
        );
    }

    #[test]
    fn foreign_lookup_is_exact() {
        assert_eq!(
            element_type(Namespace::Svg, "foreignobject"),
            ElementType::ForeignObject
        );
        // Canonical SVG case is foreignObject; the table stores the folded
        // key, so the adjusted name must be folded by the foreign-content
        // path before lookup.
        assert_eq!(element_type(Namespace::Svg, "FOREIGNOBJECT"), ElementType::Unknown);
    }

    #[test]
    fn unknown_names_miss() {
        assert_eq!(element_type(Namespace::Html, "custom-tag"), ElementType::Unknown);
        assert_eq!(
            element_type(Namespace::Html, "averyveryverylongtagname"),
            ElementType::Unknown
        );
    }

    #[test]
    fn void_and_formatting_sets_are_disjoint() {
        for name in ["area", "br", "img", "input", "meta", "wbr"] {
            let ty = element_type(Namespace::Html, name);
            assert!(is_void(ty), "{name} must be void");
            assert!(!is_formatting(ty), "{name} must not be formatting");
        }
        for name in ["a", "b", "i", "nobr", "u"] {
            let ty = element_type(Namespace::Html, name);
            assert!(is_formatting(ty), "{name} must be formatting");
            assert!(!is_void(ty), "{name} must not be void");
        }
    }
}
