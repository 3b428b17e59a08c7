//! Foreign content (MathML and SVG): namespace-specific attribute renames,
//! tag-name case corrections and the breakout path back to HTML.

use crate::context::ParseContext;
use crate::elements::ElementType;
use crate::errors::{ParseErrorCode, TreeError};
use crate::token::Namespace;

use super::handler::TreeHandler;
use super::{CommentTarget, Flow, StepEffects, TagView, Tok, TreeBuilder};

/// SVG element names whose canonical form is mixed-case.
const SVG_TAG_CASE: &[(&str, &str)] = &[
    ("altglyph", "altGlyph"),
    ("altglyphdef", "altGlyphDef"),
    ("altglyphitem", "altGlyphItem"),
    ("animatecolor", "animateColor"),
    ("animatemotion", "animateMotion"),
    ("animatetransform", "animateTransform"),
    ("clippath", "clipPath"),
    ("feblend", "feBlend"),
    ("fecolormatrix", "feColorMatrix"),
    ("fecomponenttransfer", "feComponentTransfer"),
    ("fecomposite", "feComposite"),
    ("feconvolvematrix", "feConvolveMatrix"),
    ("fediffuselighting", "feDiffuseLighting"),
    ("fedisplacementmap", "feDisplacementMap"),
    ("fedistantlight", "feDistantLight"),
    ("fedropshadow", "feDropShadow"),
    ("feflood", "feFlood"),
    ("fefunca", "feFuncA"),
    ("fefuncb", "feFuncB"),
    ("fefuncg", "feFuncG"),
    ("fefuncr", "feFuncR"),
    ("fegaussianblur", "feGaussianBlur"),
    ("feimage", "feImage"),
    ("femerge", "feMerge"),
    ("femergenode", "feMergeNode"),
    ("femorphology", "feMorphology"),
    ("feoffset", "feOffset"),
    ("fepointlight", "fePointLight"),
    ("fespecularlighting", "feSpecularLighting"),
    ("fespotlight", "feSpotLight"),
    ("fetile", "feTile"),
    ("feturbulence", "feTurbulence"),
    ("foreignobject", "foreignObject"),
    ("glyphref", "glyphRef"),
    ("lineargradient", "linearGradient"),
    ("radialgradient", "radialGradient"),
    ("textpath", "textPath"),
];

/// SVG attribute names with canonical mixed case.
const SVG_ATTR_CASE: &[(&str, &str)] = &[
    ("attributename", "attributeName"),
    ("attributetype", "attributeType"),
    ("basefrequency", "baseFrequency"),
    ("baseprofile", "baseProfile"),
    ("calcmode", "calcMode"),
    ("clippathunits", "clipPathUnits"),
    ("diffuseconstant", "diffuseConstant"),
    ("edgemode", "edgeMode"),
    ("filterunits", "filterUnits"),
    ("glyphref", "glyphRef"),
    ("gradienttransform", "gradientTransform"),
    ("gradientunits", "gradientUnits"),
    ("kernelmatrix", "kernelMatrix"),
    ("kernelunitlength", "kernelUnitLength"),
    ("keypoints", "keyPoints"),
    ("keysplines", "keySplines"),
    ("keytimes", "keyTimes"),
    ("lengthadjust", "lengthAdjust"),
    ("limitingconeangle", "limitingConeAngle"),
    ("markerheight", "markerHeight"),
    ("markerunits", "markerUnits"),
    ("markerwidth", "markerWidth"),
    ("maskcontentunits", "maskContentUnits"),
    ("maskunits", "maskUnits"),
    ("numoctaves", "numOctaves"),
    ("pathlength", "pathLength"),
    ("patterncontentunits", "patternContentUnits"),
    ("patterntransform", "patternTransform"),
    ("patternunits", "patternUnits"),
    ("pointsatx", "pointsAtX"),
    ("pointsaty", "pointsAtY"),
    ("pointsatz", "pointsAtZ"),
    ("preservealpha", "preserveAlpha"),
    ("preserveaspectratio", "preserveAspectRatio"),
    ("primitiveunits", "primitiveUnits"),
    ("refx", "refX"),
    ("refy", "refY"),
    ("repeatcount", "repeatCount"),
    ("repeatdur", "repeatDur"),
    ("requiredextensions", "requiredExtensions"),
    ("requiredfeatures", "requiredFeatures"),
    ("specularconstant", "specularConstant"),
    ("specularexponent", "specularExponent"),
    ("spreadmethod", "spreadMethod"),
    ("startoffset", "startOffset"),
    ("stddeviation", "stdDeviation"),
    ("stitchtiles", "stitchTiles"),
    ("surfacescale", "surfaceScale"),
    ("systemlanguage", "systemLanguage"),
    ("tablevalues", "tableValues"),
    ("targetx", "targetX"),
    ("targety", "targetY"),
    ("textlength", "textLength"),
    ("viewbox", "viewBox"),
    ("viewtarget", "viewTarget"),
    ("xchannelselector", "xChannelSelector"),
    ("ychannelselector", "yChannelSelector"),
    ("zoomandpan", "zoomAndPan"),
];

/// Start tags that break out of foreign content back into HTML.
fn is_breakout(tag: &TagView) -> bool {
    use ElementType::*;
    if matches!(
        tag.ty,
        B | Big | Blockquote | Body | Br | Center | Code | Dd | Div | Dl | Dt | Em | Embed | H1
            | H2 | H3 | H4 | H5 | H6 | Head | Hr | I | Img | Li | Listing | Menu | Meta | Nobr
            | Ol | P | Pre | Ruby | S | Small | Span | Strong | Strike | Sub | Sup | Table | Tt
            | U | Ul | Var
    ) {
        return true;
    }
    tag.ty == ElementType::Font
        && tag
            .attrs
            .iter()
            .any(|a| matches!(a.name.as_str(), "color" | "face" | "size"))
}

pub(crate) fn is_mathml_text_integration_point(ns: Namespace, ty: ElementType) -> bool {
    ns == Namespace::MathMl
        && matches!(
            ty,
            ElementType::Mi | ElementType::Mo | ElementType::Mn | ElementType::Ms | ElementType::Mtext
        )
}

pub(crate) fn is_html_integration_point(ns: Namespace, ty: ElementType) -> bool {
    // annotation-xml counts only with an HTML-ish encoding attribute; the
    // attribute is not retained on stack frames, so the common SVG points
    // carry the behavior here.
    ns == Namespace::Svg
        && matches!(
            ty,
            ElementType::ForeignObject | ElementType::Desc | ElementType::Title
        )
}

/// Apply the namespace-specific attribute renames and (for SVG) tag-name case
/// correction to a token destined for foreign content.
pub(crate) fn adjusted_foreign_tag(tag: &TagView, ns: Namespace) -> TagView {
    let mut adjusted = tag.clone();
    if ns == Namespace::Svg {
        if let Ok(idx) = SVG_TAG_CASE.binary_search_by_key(&tag.name.as_str(), |&(from, _)| from) {
            adjusted.name = SVG_TAG_CASE[idx].1.to_string();
        }
    }
    for attr in &mut adjusted.attrs {
        if ns == Namespace::MathMl {
            if attr.name == "definitionurl" {
                attr.name = "definitionURL".to_string();
            }
        } else if ns == Namespace::Svg {
            if let Ok(idx) =
                SVG_ATTR_CASE.binary_search_by_key(&attr.name.as_str(), |&(from, _)| from)
            {
                attr.name = SVG_ATTR_CASE[idx].1.to_string();
            }
        }
        adjust_foreign_attribute(attr);
    }
    adjusted
}

/// The xlink/xml/xmlns namespace splits shared by both foreign vocabularies.
fn adjust_foreign_attribute(attr: &mut super::handler::AttributeData) {
    let (ns, local) = match attr.name.as_str() {
        "xlink:actuate" | "xlink:arcrole" | "xlink:href" | "xlink:role" | "xlink:show"
        | "xlink:title" | "xlink:type" => {
            (Namespace::XLink, attr.name["xlink:".len()..].to_string())
        }
        "xml:base" | "xml:lang" | "xml:space" => {
            (Namespace::Xml, attr.name["xml:".len()..].to_string())
        }
        "xmlns" => (Namespace::XmlNs, "xmlns".to_string()),
        "xmlns:xlink" => (Namespace::XmlNs, "xlink".to_string()),
        _ => return,
    };
    attr.ns = ns;
    attr.name = local;
}

impl<H: TreeHandler> TreeBuilder<H> {
    pub(crate) fn handle_foreign(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut ParseContext,
        _fx: &mut StepEffects,
    ) -> Result<Flow, TreeError> {
        match tok {
            Tok::Chars(data) => {
                self.append_text(data)?;
                if !super::is_all_whitespace(data) {
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
            Tok::Start(tag) if is_breakout(tag) => {
                self.parse_error(ctx, ParseErrorCode::UnexpectedStartTag);
                // Pop foreign frames until back at an integration point or
                // plain HTML, then retry in the current HTML mode.
                loop {
                    let done = match self.stack.current() {
                        None => true,
                        Some(f) => {
                            f.ns == Namespace::Html
                                || is_mathml_text_integration_point(f.ns, f.ty)
                                || is_html_integration_point(f.ns, f.ty)
                        }
                    };
                    if done {
                        break;
                    }
                    self.pop_current()?;
                }
                Ok(Flow::Reprocess(self.mode))
            }
            Tok::Start(tag) => {
                let ns = self
                    .adjusted_current_ns()
                    .unwrap_or(Namespace::Html);
                let adjusted = adjusted_foreign_tag(tag, ns);
                self.insert_element(ns, &adjusted)?;
                if tag.self_closing {
                    self.pop_current()?;
                }
                Ok(Flow::Done)
            }
            Tok::End(tag) => {
                // Walk the stack for a matching foreign element (names fold
                // ASCII case for the comparison).
                let mut idx = self.stack.len();
                while idx > 0 {
                    idx -= 1;
                    let frame = self.stack.get(idx).expect("index valid");
                    if frame.ns == Namespace::Html {
                        // Process per the HTML rules.
                        return Ok(Flow::Reprocess(self.mode));
                    }
                    if frame.name.eq_ignore_ascii_case(&tag.name) {
                        while self.stack.len() > idx {
                            self.pop_current()?;
                        }
                        return Ok(Flow::Done);
                    }
                }
                self.parse_error(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }
            Tok::Eof => Ok(Flow::Reprocess(self.mode)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treebuilder::handler::AttributeData;

    #[test]
    fn svg_tables_are_sorted_for_binary_search() {
        for window in SVG_TAG_CASE.windows(2) {
            assert!(window[0].0 < window[1].0, "SVG_TAG_CASE out of order");
        }
        for window in SVG_ATTR_CASE.windows(2) {
            assert!(window[0].0 < window[1].0, "SVG_ATTR_CASE out of order");
        }
    }

    #[test]
    fn svg_names_get_case_corrected() {
        let tag = TagView {
            name: "foreignobject".to_string(),
            ty: ElementType::ForeignObject,
            self_closing: false,
            attrs: vec![AttributeData {
                ns: Namespace::Html,
                name: "viewbox".to_string(),
                value: "0 0 1 1".to_string(),
            }],
        };
        let adjusted = adjusted_foreign_tag(&tag, Namespace::Svg);
        assert_eq!(adjusted.name, "foreignObject");
        assert_eq!(adjusted.attrs[0].name, "viewBox");
    }

    #[test]
    fn xlink_attributes_move_to_their_namespace() {
        let tag = TagView {
            name: "use".to_string(),
            ty: ElementType::Unknown,
            self_closing: true,
            attrs: vec![
                AttributeData {
                    ns: Namespace::Html,
                    name: "xlink:href".to_string(),
                    value: "#icon".to_string(),
                },
                AttributeData {
                    ns: Namespace::Html,
                    name: "xml:lang".to_string(),
                    value: "en".to_string(),
                },
            ],
        };
        let adjusted = adjusted_foreign_tag(&tag, Namespace::Svg);
        assert_eq!(adjusted.attrs[0].ns, Namespace::XLink);
        assert_eq!(adjusted.attrs[0].name, "href");
        assert_eq!(adjusted.attrs[1].ns, Namespace::Xml);
        assert_eq!(adjusted.attrs[1].name, "lang");
    }

    #[test]
    fn font_breaks_out_only_with_styling_attributes() {
        let plain = TagView {
            name: "font".to_string(),
            ty: ElementType::Font,
            self_closing: false,
            attrs: Vec::new(),
        };
        assert!(!is_breakout(&plain));
        let mut styled = plain.clone();
        styled.attrs.push(AttributeData {
            ns: Namespace::Html,
            name: "color".to_string(),
            value: "red".to_string(),
        });
        assert!(is_breakout(&styled));
    }
}
