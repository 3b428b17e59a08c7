//! Stack of open elements and the scope predicates that walk it.

use crate::elements::ElementType;
use crate::token::Namespace;

/// One frame on the stack of open elements. The frame owns one handler-level
/// reference on `node` for its lifetime. The name is kept alongside the type
/// tag so unknown elements can still be matched by end tags.
#[derive(Clone, Debug)]
pub(crate) struct OpenElement<H> {
    pub(crate) ns: Namespace,
    pub(crate) ty: ElementType,
    pub(crate) name: String,
    pub(crate) node: H,
}

/// Variants of the "has an element in scope" stack walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Default,
    ListItem,
    Button,
    Table,
    Select,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct OpenElements<H> {
    items: Vec<OpenElement<H>>,
}

impl<H: Clone + PartialEq> OpenElements<H> {
    pub(crate) fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn push(&mut self, frame: OpenElement<H>) {
        self.items.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<OpenElement<H>> {
        self.items.pop()
    }

    pub(crate) fn current(&self) -> Option<&OpenElement<H>> {
        self.items.last()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&OpenElement<H>> {
        self.items.get(index)
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, OpenElement<H>> {
        self.items.iter()
    }

    pub(crate) fn insert(&mut self, index: usize, frame: OpenElement<H>) {
        self.items.insert(index, frame);
    }

    pub(crate) fn remove(&mut self, index: usize) -> OpenElement<H> {
        self.items.remove(index)
    }

    pub(crate) fn replace(&mut self, index: usize, frame: OpenElement<H>) -> OpenElement<H> {
        std::mem::replace(&mut self.items[index], frame)
    }

    /// Index of the topmost frame holding `node`.
    pub(crate) fn position_of(&self, node: &H) -> Option<usize> {
        self.items.iter().rposition(|f| &f.node == node)
    }

    /// Index of the topmost frame of the given HTML-namespace type.
    pub(crate) fn position_of_type(&self, ty: ElementType) -> Option<usize> {
        self.items
            .iter()
            .rposition(|f| f.ns == Namespace::Html && f.ty == ty)
    }

    /// "Have an element of this type in the given scope."
    pub(crate) fn in_scope(&self, ty: ElementType, scope: Scope) -> bool {
        for frame in self.items.iter().rev() {
            if frame.ns == Namespace::Html && frame.ty == ty {
                return true;
            }
            if stops_scope(frame.ns, frame.ty, scope) {
                return false;
            }
        }
        false
    }

    /// "Have this particular node in scope."
    pub(crate) fn node_in_scope(&self, node: &H, scope: Scope) -> bool {
        for frame in self.items.iter().rev() {
            if &frame.node == node {
                return true;
            }
            if stops_scope(frame.ns, frame.ty, scope) {
                return false;
            }
        }
        false
    }
}

fn stops_scope(ns: Namespace, ty: ElementType, scope: Scope) -> bool {
    use ElementType::*;
    match scope {
        // The select variant inverts: everything stops it except optgroup
        // and option.
        Scope::Select => !(ns == Namespace::Html && matches!(ty, Optgroup | Option)),
        Scope::Table => ns == Namespace::Html && matches!(ty, Html | Table),
        Scope::ListItem if ns == Namespace::Html && matches!(ty, Ol | Ul) => true,
        Scope::Button if ns == Namespace::Html && ty == Button => true,
        _ => base_scope_stop(ns, ty),
    }
}

fn base_scope_stop(ns: Namespace, ty: ElementType) -> bool {
    use ElementType::*;
    match ns {
        Namespace::Html => matches!(
            ty,
            Applet | Caption | Html | Table | Td | Th | Marquee | Object
        ),
        Namespace::MathMl => matches!(ty, Mi | Mo | Mn | Ms | Mtext | AnnotationXml),
        Namespace::Svg => matches!(ty, ForeignObject | Desc | Title),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ty: ElementType) -> OpenElement<u32> {
        static NEXT: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);
        OpenElement {
            ns: Namespace::Html,
            ty,
            name: format!("{ty:?}").to_ascii_lowercase(),
            node: NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
        }
    }

    #[test]
    fn element_in_scope_stops_at_boundaries() {
        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html));
        stack.push(frame(ElementType::Body));
        stack.push(frame(ElementType::P));
        stack.push(frame(ElementType::Table));
        stack.push(frame(ElementType::Td));
        assert!(stack.in_scope(ElementType::Td, Scope::Default));
        assert!(
            !stack.in_scope(ElementType::P, Scope::Default),
            "table is a scope boundary"
        );
        assert!(stack.in_scope(ElementType::Table, Scope::Table));
    }

    #[test]
    fn button_scope_extends_default_stops() {
        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html));
        stack.push(frame(ElementType::P));
        stack.push(frame(ElementType::Button));
        assert!(stack.in_scope(ElementType::P, Scope::Default));
        assert!(!stack.in_scope(ElementType::P, Scope::Button));
    }

    #[test]
    fn list_item_scope_stops_at_lists() {
        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html));
        stack.push(frame(ElementType::Li));
        stack.push(frame(ElementType::Ul));
        assert!(!stack.in_scope(ElementType::Li, Scope::ListItem));
        assert!(stack.in_scope(ElementType::Li, Scope::Default));
    }

    #[test]
    fn select_scope_only_passes_option_like_frames() {
        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html));
        stack.push(frame(ElementType::Select));
        stack.push(frame(ElementType::Optgroup));
        stack.push(frame(ElementType::Option));
        assert!(stack.in_scope(ElementType::Select, Scope::Select));

        stack.push(frame(ElementType::Div));
        assert!(
            !stack.in_scope(ElementType::Select, Scope::Select),
            "a non-option frame stops select scope"
        );
    }
}
