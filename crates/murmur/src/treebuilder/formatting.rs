//! List of active formatting elements, the Noah's Ark clause, formatting
//! reconstruction and the adoption agency algorithm.

use crate::context::ParseContext;
use crate::elements::ElementType;
use crate::errors::{ParseErrorCode, TreeError};
use crate::token::Namespace;

use super::handler::{AttributeData, ElementData, TreeHandler};
use super::stack::{OpenElement, Scope};
use super::{TagView, TreeBuilder};

/// A formatting element retained for reconstruction: enough of the original
/// token to recreate the element, plus the live node.
#[derive(Clone, Debug)]
pub(crate) struct FormatElement<H> {
    pub(crate) ns: Namespace,
    pub(crate) ty: ElementType,
    pub(crate) name: String,
    pub(crate) attrs: Vec<AttributeData>,
    pub(crate) node: H,
}

#[derive(Clone, Debug)]
pub(crate) enum FormatEntry<H> {
    Marker,
    Element(FormatElement<H>),
}

/// The list of active formatting elements. Each element entry owns one
/// handler-level reference on its node.
#[derive(Clone, Debug, Default)]
pub(crate) struct ActiveFormatting<H> {
    entries: Vec<FormatEntry<H>>,
}

impl<H: Clone + PartialEq> ActiveFormatting<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&FormatEntry<H>> {
        self.entries.get(index)
    }

    pub(crate) fn push_marker(&mut self) {
        self.entries.push(FormatEntry::Marker);
    }

    /// Append an element entry, applying the Noah's Ark clause: with three
    /// matching entries since the last marker, the oldest is evicted and its
    /// node returned for release.
    pub(crate) fn push_element(&mut self, elem: FormatElement<H>) -> Option<H> {
        let start = self.index_after_last_marker();
        let mut matches: Vec<usize> = Vec::new();
        for (i, entry) in self.entries.iter().enumerate().skip(start) {
            if let FormatEntry::Element(e) = entry {
                if e.ns == elem.ns && e.name == elem.name && same_attributes(&e.attrs, &elem.attrs)
                {
                    matches.push(i);
                }
            }
        }
        let evicted = if matches.len() >= 3 {
            let oldest = matches[0];
            match self.entries.remove(oldest) {
                FormatEntry::Element(e) => Some(e.node),
                FormatEntry::Marker => unreachable!("matched entries are elements"),
            }
        } else {
            None
        };
        self.entries.push(FormatEntry::Element(elem));
        evicted
    }

    pub(crate) fn insert(&mut self, index: usize, entry: FormatEntry<H>) {
        self.entries.insert(index, entry);
    }

    pub(crate) fn remove(&mut self, index: usize) -> FormatEntry<H> {
        self.entries.remove(index)
    }

    fn index_after_last_marker(&self) -> usize {
        self.entries
            .iter()
            .rposition(|e| matches!(e, FormatEntry::Marker))
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    pub(crate) fn position_of_node(&self, node: &H) -> Option<usize> {
        self.entries.iter().rposition(|e| match e {
            FormatEntry::Element(e) => &e.node == node,
            FormatEntry::Marker => false,
        })
    }

    /// The most recent element entry of this type/name since the last marker.
    pub(crate) fn find_since_marker(&self, ty: ElementType, name: &str) -> Option<usize> {
        for (i, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormatEntry::Marker => return None,
                FormatEntry::Element(e) => {
                    if e.ns == Namespace::Html && e.ty == ty && e.name == name {
                        return Some(i);
                    }
                }
            }
        }
        None
    }

    /// Pop entries up to and including the last marker; returns the released
    /// element nodes.
    pub(crate) fn clear_to_marker(&mut self) -> Vec<H> {
        let mut released = Vec::new();
        while let Some(entry) = self.entries.pop() {
            match entry {
                FormatEntry::Marker => break,
                FormatEntry::Element(e) => released.push(e.node),
            }
        }
        released
    }

    pub(crate) fn clear_all(&mut self) -> Vec<H> {
        self.entries
            .drain(..)
            .filter_map(|e| match e {
                FormatEntry::Element(e) => Some(e.node),
                FormatEntry::Marker => None,
            })
            .collect()
    }
}

fn same_attributes(a: &[AttributeData], b: &[AttributeData]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|x| b.iter().any(|y| x.ns == y.ns && x.name == y.name && x.value == y.value))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AdoptionOutcome {
    Handled,
    /// No formatting element matched; process as "any other end tag".
    NoFormattingElement,
}

impl<H: TreeHandler> TreeBuilder<H> {
    /// Record a formatting element both on the stack (caller) and the list;
    /// the list takes its own reference.
    pub(crate) fn push_formatting(
        &mut self,
        tag: &TagView,
        node: &H::Handle,
    ) -> Result<(), TreeError> {
        self.handler.ref_node(node)?;
        let evicted = self.formatting.push_element(FormatElement {
            ns: Namespace::Html,
            ty: tag.ty,
            name: tag.name.clone(),
            attrs: tag.attrs.clone(),
            node: node.clone(),
        });
        if let Some(old) = evicted {
            self.handler.unref_node(&old)?;
        }
        Ok(())
    }

    pub(crate) fn clear_formatting_to_marker(&mut self) -> Result<(), TreeError> {
        let released = self.formatting.clear_to_marker();
        for node in released {
            self.handler.unref_node(&node)?;
        }
        Ok(())
    }

    /// The "reconstruct the active formatting elements" algorithm.
    pub(crate) fn reconstruct_formatting(&mut self) -> Result<(), TreeError> {
        if self.formatting.len() == 0 {
            return Ok(());
        }
        let last = self.formatting.len() - 1;
        match self.formatting.get(last) {
            Some(FormatEntry::Marker) | None => return Ok(()),
            Some(FormatEntry::Element(e)) => {
                if self.stack.position_of(&e.node).is_some() {
                    return Ok(());
                }
            }
        }

        // Rewind to the newest entry that is a marker or already open.
        let mut index = last;
        loop {
            if index == 0 {
                break;
            }
            index -= 1;
            let settled = match self.formatting.get(index) {
                Some(FormatEntry::Marker) | None => true,
                Some(FormatEntry::Element(e)) => self.stack.position_of(&e.node).is_some(),
            };
            if settled {
                index += 1;
                break;
            }
        }

        // Recreate everything from there on.
        while index < self.formatting.len() {
            let (data, old_node) = match self.formatting.get(index) {
                Some(FormatEntry::Element(e)) => (
                    ElementData {
                        ns: e.ns,
                        name: e.name.clone(),
                        attributes: e.attrs.clone(),
                    },
                    e.node.clone(),
                ),
                _ => unreachable!("reconstruction only walks element entries"),
            };
            let new_node = self.handler.create_element(&data)?;
            self.insert_at_appropriate_place(&new_node)?;
            let ty = match self.formatting.get(index) {
                Some(FormatEntry::Element(e)) => e.ty,
                _ => unreachable!(),
            };
            self.stack.push(OpenElement {
                ns: Namespace::Html,
                ty,
                name: data.name.clone(),
                node: new_node.clone(),
            });
            // The stack keeps the creation reference; the list swaps its own
            // reference over to the new node.
            self.handler.ref_node(&new_node)?;
            if let Some(FormatEntry::Element(e)) = self.formatting.get_mut_entry(index) {
                e.node = new_node;
            }
            self.handler.unref_node(&old_node)?;
            index += 1;
        }
        Ok(())
    }

    /// The adoption agency algorithm for a misnested formatting end tag.
    pub(crate) fn adoption_agency(
        &mut self,
        ctx: &mut ParseContext,
        subject_ty: ElementType,
        subject_name: &str,
    ) -> Result<AdoptionOutcome, TreeError> {
        // Shortcut: the current node matches and is not in the list.
        if let Some(frame) = self.stack.current() {
            if frame.ns == Namespace::Html
                && frame.ty == subject_ty
                && self.formatting.position_of_node(&frame.node).is_none()
            {
                self.pop_current()?;
                return Ok(AdoptionOutcome::Handled);
            }
        }

        for _ in 0..8 {
            let Some(fmt_idx) = self.formatting.find_since_marker(subject_ty, subject_name)
            else {
                return Ok(AdoptionOutcome::NoFormattingElement);
            };
            let fmt_node = match self.formatting.get(fmt_idx) {
                Some(FormatEntry::Element(e)) => e.node.clone(),
                _ => unreachable!("find_since_marker returns element entries"),
            };

            let Some(stack_idx) = self.stack.position_of(&fmt_node) else {
                self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                if let FormatEntry::Element(e) = self.formatting.remove(fmt_idx) {
                    self.handler.unref_node(&e.node)?;
                }
                return Ok(AdoptionOutcome::Handled);
            };
            if !self.stack.node_in_scope(&fmt_node, Scope::Default) {
                self.parse_error(ctx, ParseErrorCode::MisnestedTag);
                return Ok(AdoptionOutcome::Handled);
            }
            if self.stack.position_of(&fmt_node) != Some(self.stack.len() - 1) {
                self.parse_error(ctx, ParseErrorCode::MisnestedTag);
            }

            // Furthest block: the lowest special element above the formatting
            // element.
            let mut furthest: Option<usize> = None;
            for i in (stack_idx + 1)..self.stack.len() {
                let frame = self.stack.get(i).expect("index valid");
                if crate::elements::is_special(frame.ns, frame.ty) {
                    furthest = Some(i);
                    break;
                }
            }
            let Some(furthest_idx) = furthest else {
                // No furthest block: pop through the formatting element and
                // drop its list entry.
                while self.stack.len() > stack_idx {
                    self.pop_current()?;
                }
                if let FormatEntry::Element(e) = self.formatting.remove(fmt_idx) {
                    self.handler.unref_node(&e.node)?;
                }
                return Ok(AdoptionOutcome::Handled);
            };

            let furthest_block = self.stack.get(furthest_idx).expect("index valid").clone();
            let common_ancestor = self.stack.get(stack_idx - 1).expect("formatting element has an ancestor").clone();
            let mut bookmark = fmt_idx;

            // Inner loop: walk up from the furthest block, cloning list
            // members and detaching everything else.
            let mut node_idx = furthest_idx;
            let mut last_node = furthest_block.node.clone();
            let mut inner = 0usize;
            loop {
                inner += 1;
                node_idx -= 1;
                let node_frame = self.stack.get(node_idx).expect("index valid").clone();
                if node_frame.node == fmt_node {
                    break;
                }
                let mut list_pos = self.formatting.position_of_node(&node_frame.node);
                if inner > 3 {
                    if let Some(pos) = list_pos.take() {
                        if let FormatEntry::Element(e) = self.formatting.remove(pos) {
                            self.handler.unref_node(&e.node)?;
                        }
                        if pos < bookmark {
                            bookmark -= 1;
                        }
                    }
                }
                let Some(list_pos) = list_pos else {
                    // Not a formatting element: drop it from the stack.
                    let removed = self.stack.remove(node_idx);
                    self.handler.unref_node(&removed.node)?;
                    continue;
                };

                // Clone the formatting element and swap it into both
                // structures.
                let (data, ty) = match self.formatting.get(list_pos) {
                    Some(FormatEntry::Element(e)) => (
                        ElementData {
                            ns: e.ns,
                            name: e.name.clone(),
                            attributes: e.attrs.clone(),
                        },
                        e.ty,
                    ),
                    _ => unreachable!(),
                };
                let new_node = self.handler.create_element(&data)?;
                // Creation ref goes to the list entry; the stack needs its
                // own.
                self.handler.ref_node(&new_node)?;
                let old_list = match self.formatting.get_mut_entry(list_pos) {
                    Some(FormatEntry::Element(e)) => {
                        std::mem::replace(&mut e.node, new_node.clone())
                    }
                    _ => unreachable!(),
                };
                self.handler.unref_node(&old_list)?;
                let old_stack = self.stack.replace(
                    node_idx,
                    OpenElement {
                        ns: Namespace::Html,
                        ty,
                        name: data.name.clone(),
                        node: new_node.clone(),
                    },
                );
                self.handler.unref_node(&old_stack.node)?;

                if last_node == furthest_block.node {
                    bookmark = list_pos + 1;
                }

                // Reparent last_node under the clone.
                if let Some(parent) = self.handler.get_parent(&last_node, false)? {
                    self.handler.remove_child(&parent, &last_node)?;
                }
                self.handler.append_child(&new_node, &last_node)?;
                last_node = new_node;
            }

            // Place last_node at the appropriate spot relative to the common
            // ancestor (foster parenting applies around tables).
            if let Some(parent) = self.handler.get_parent(&last_node, false)? {
                self.handler.remove_child(&parent, &last_node)?;
            }
            if matches!(
                common_ancestor.ty,
                ElementType::Table
                    | ElementType::Tbody
                    | ElementType::Tfoot
                    | ElementType::Thead
                    | ElementType::Tr
            ) {
                let saved = self.foster_parenting;
                self.foster_parenting = true;
                self.insert_at_appropriate_place(&last_node)?;
                self.foster_parenting = saved;
            } else {
                self.handler.append_child(&common_ancestor.node, &last_node)?;
            }

            // Fresh element for the formatting entry; the furthest block's
            // children move under it. Inner-loop removals may have shifted
            // the list, so re-locate the entry by node.
            let fmt_idx = self
                .formatting
                .position_of_node(&fmt_node)
                .expect("formatting entry still listed");
            let (fmt_data, fmt_ty, fmt_name, fmt_attrs) = match self.formatting.get(fmt_idx) {
                Some(FormatEntry::Element(e)) => (
                    ElementData {
                        ns: e.ns,
                        name: e.name.clone(),
                        attributes: e.attrs.clone(),
                    },
                    e.ty,
                    e.name.clone(),
                    e.attrs.clone(),
                ),
                _ => unreachable!(),
            };
            let new_fmt = self.handler.create_element(&fmt_data)?;
            self.handler.reparent_children(&furthest_block.node, &new_fmt)?;
            self.handler.append_child(&furthest_block.node, &new_fmt)?;

            // Swap the list entry to the bookmark position.
            if let FormatEntry::Element(e) = self.formatting.remove(fmt_idx) {
                self.handler.unref_node(&e.node)?;
            }
            if fmt_idx < bookmark {
                bookmark -= 1;
            }
            let bookmark = bookmark.min(self.formatting.len());
            // The creation reference covers the list entry.
            self.formatting.insert(
                bookmark,
                FormatEntry::Element(FormatElement {
                    ns: Namespace::Html,
                    ty: fmt_ty,
                    name: fmt_name,
                    attrs: fmt_attrs,
                    node: new_fmt.clone(),
                }),
            );

            // Remove the old formatting element from the stack and insert the
            // clone just above the furthest block.
            let fmt_stack_idx = self
                .stack
                .position_of(&fmt_node)
                .expect("formatting element still open");
            let removed = self.stack.remove(fmt_stack_idx);
            self.handler.unref_node(&removed.node)?;
            let furthest_now = self
                .stack
                .position_of(&furthest_block.node)
                .expect("furthest block still open");
            self.handler.ref_node(&new_fmt)?;
            self.stack.insert(
                furthest_now + 1,
                OpenElement {
                    ns: Namespace::Html,
                    ty: fmt_ty,
                    name: fmt_data.name.clone(),
                    node: new_fmt,
                },
            );
        }
        Ok(AdoptionOutcome::Handled)
    }
}

impl<H: Clone + PartialEq> ActiveFormatting<H> {
    pub(crate) fn get_mut_entry(&mut self, index: usize) -> Option<&mut FormatEntry<H>> {
        self.entries.get_mut(index)
    }
}
