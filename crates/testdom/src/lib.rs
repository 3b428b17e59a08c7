//! Arena-backed sample DOM implementing murmur's tree-handler interface,
//! plus chunk-plan helpers for streaming-equivalence tests.
//!
//! Nodes live in an arena and are addressed by index; parent links are plain
//! back-pointers, so the cyclic parent/child structure needs no reference
//! counting of its own. The handler-level ref/unref calls are audited
//! separately so tests can assert they balance.

use std::cell::RefCell;
use std::rc::Rc;

use murmur::treebuilder::{AttributeData, DoctypeDetails, ElementData, QuirksMode, TreeHandler};
use murmur::{Namespace, TreeError};

pub mod chunks;

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        ns: Namespace,
        attrs: Vec<AttributeData>,
    },
    Text,
    Comment,
    Doctype {
        public_id: Option<String>,
        system_id: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// Element/doctype name, text content or comment data.
    pub data: String,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
}

#[derive(Debug, Default)]
pub struct CallCounts {
    pub created: u64,
    pub refs: u64,
    pub unrefs: u64,
    pub appends: u64,
    pub inserts: u64,
    pub removes: u64,
    pub clones: u64,
    pub reparents: u64,
    pub form_associations: u64,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<Node>,
    refcounts: Vec<i64>,
    quirks: Option<QuirksMode>,
    encoding_changes: Vec<String>,
    counts: CallCounts,
}

impl Inner {
    fn new_node(&mut self, kind: NodeKind, data: String) -> usize {
        self.counts.created += 1;
        self.nodes.push(Node {
            kind,
            data,
            children: Vec::new(),
            parent: None,
        });
        self.refcounts.push(1);
        self.nodes.len() - 1
    }

    fn detach(&mut self, node: usize) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&c| c != node);
        }
    }

    fn write_node(&self, node: usize, depth: usize, out: &mut String) {
        let n = &self.nodes[node];
        for _ in 0..depth {
            out.push_str("  ");
        }
        match &n.kind {
            NodeKind::Document => out.push_str("#document"),
            NodeKind::Element { ns, attrs } => {
                match ns {
                    Namespace::Html => out.push('<'),
                    Namespace::Svg => out.push_str("<svg "),
                    Namespace::MathMl => out.push_str("<math "),
                    other => out.push_str(&format!("<{other:?} ")),
                }
                out.push_str(&n.data);
                let mut sorted: Vec<&AttributeData> = attrs.iter().collect();
                sorted.sort_by(|a, b| a.name.cmp(&b.name));
                for attr in sorted {
                    out.push_str(&format!(" {}=\"{}\"", attr.name, attr.value));
                }
                out.push('>');
            }
            NodeKind::Text => {
                out.push('"');
                out.push_str(&n.data);
                out.push('"');
            }
            NodeKind::Comment => {
                out.push_str("<!-- ");
                out.push_str(&n.data);
                out.push_str(" -->");
            }
            NodeKind::Doctype { .. } => {
                out.push_str("<!DOCTYPE ");
                out.push_str(&n.data);
                out.push('>');
            }
        }
        out.push('\n');
        for &child in &n.children {
            self.write_node(child, depth + 1, out);
        }
    }
}

/// The shareable handler handle. Cloning shares the same arena.
#[derive(Clone, Default)]
pub struct TestDom(Rc<RefCell<Inner>>);

impl TestDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented tree snapshot rooted at the document.
    pub fn snapshot(&self) -> String {
        let inner = self.0.borrow();
        if inner.nodes.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        inner.write_node(0, 0, &mut out);
        out
    }

    /// True when every handler-created node has had its references released
    /// (the document itself is owned by the DOM).
    pub fn references_balanced(&self) -> bool {
        self.0.borrow().refcounts.iter().skip(1).all(|&r| r == 0)
    }

    pub fn outstanding_references(&self) -> i64 {
        self.0.borrow().refcounts.iter().skip(1).sum()
    }

    pub fn quirks(&self) -> Option<QuirksMode> {
        self.0.borrow().quirks
    }

    pub fn encoding_changes(&self) -> Vec<String> {
        self.0.borrow().encoding_changes.clone()
    }

    pub fn with_counts<R>(&self, f: impl FnOnce(&CallCounts) -> R) -> R {
        f(&self.0.borrow().counts)
    }

    /// Number of nodes of the given element name currently in the tree.
    pub fn count_elements(&self, name: &str) -> usize {
        let inner = self.0.borrow();
        let mut total = 0;
        let mut work = vec![0usize];
        while let Some(node) = work.pop() {
            let n = &inner.nodes[node];
            if matches!(n.kind, NodeKind::Element { .. }) && n.data == name {
                total += 1;
            }
            work.extend(n.children.iter().copied());
        }
        total
    }
}

impl TreeHandler for TestDom {
    type Handle = usize;

    fn document(&mut self) -> usize {
        let mut inner = self.0.borrow_mut();
        if inner.nodes.is_empty() {
            inner.nodes.push(Node {
                kind: NodeKind::Document,
                data: String::new(),
                children: Vec::new(),
                parent: None,
            });
            inner.refcounts.push(0);
        }
        0
    }

    fn create_comment(&mut self, data: &str) -> Result<usize, TreeError> {
        Ok(self
            .0
            .borrow_mut()
            .new_node(NodeKind::Comment, data.to_string()))
    }

    fn create_doctype(&mut self, doctype: &DoctypeDetails) -> Result<usize, TreeError> {
        Ok(self.0.borrow_mut().new_node(
            NodeKind::Doctype {
                public_id: doctype.public_id.clone(),
                system_id: doctype.system_id.clone(),
            },
            doctype.name.clone().unwrap_or_default(),
        ))
    }

    fn create_element(&mut self, element: &ElementData) -> Result<usize, TreeError> {
        Ok(self.0.borrow_mut().new_node(
            NodeKind::Element {
                ns: element.ns,
                attrs: element.attributes.clone(),
            },
            element.name.clone(),
        ))
    }

    fn create_text(&mut self, data: &str) -> Result<usize, TreeError> {
        Ok(self.0.borrow_mut().new_node(NodeKind::Text, data.to_string()))
    }

    fn ref_node(&mut self, node: &usize) -> Result<(), TreeError> {
        let mut inner = self.0.borrow_mut();
        inner.counts.refs += 1;
        inner.refcounts[*node] += 1;
        Ok(())
    }

    fn unref_node(&mut self, node: &usize) -> Result<(), TreeError> {
        let mut inner = self.0.borrow_mut();
        inner.counts.unrefs += 1;
        inner.refcounts[*node] -= 1;
        if inner.refcounts[*node] < 0 {
            return Err(TreeError::Failed("unref below zero"));
        }
        Ok(())
    }

    fn append_child(&mut self, parent: &usize, child: &usize) -> Result<usize, TreeError> {
        let mut inner = self.0.borrow_mut();
        inner.counts.appends += 1;
        // Coalesce adjacent text nodes; the returned handle is the node that
        // actually carries the text.
        if inner.nodes[*child].kind == NodeKind::Text {
            if let Some(&last) = inner.nodes[*parent].children.last() {
                if inner.nodes[last].kind == NodeKind::Text {
                    let extra = inner.nodes[*child].data.clone();
                    inner.nodes[last].data.push_str(&extra);
                    return Ok(last);
                }
            }
        }
        inner.detach(*child);
        inner.nodes[*parent].children.push(*child);
        inner.nodes[*child].parent = Some(*parent);
        Ok(*child)
    }

    fn insert_before(
        &mut self,
        parent: &usize,
        child: &usize,
        ref_child: &usize,
    ) -> Result<usize, TreeError> {
        let mut inner = self.0.borrow_mut();
        inner.counts.inserts += 1;
        inner.detach(*child);
        let idx = inner.nodes[*parent]
            .children
            .iter()
            .position(|c| c == ref_child)
            .ok_or(TreeError::UnknownNode)?;
        inner.nodes[*parent].children.insert(idx, *child);
        inner.nodes[*child].parent = Some(*parent);
        Ok(*child)
    }

    fn remove_child(&mut self, parent: &usize, child: &usize) -> Result<usize, TreeError> {
        let mut inner = self.0.borrow_mut();
        inner.counts.removes += 1;
        if inner.nodes[*child].parent != Some(*parent) {
            return Err(TreeError::UnknownNode);
        }
        inner.detach(*child);
        Ok(*child)
    }

    fn clone_node(&mut self, node: &usize, deep: bool) -> Result<usize, TreeError> {
        let mut inner = self.0.borrow_mut();
        inner.counts.clones += 1;
        let mut copy = inner.nodes[*node].clone();
        copy.parent = None;
        if !deep {
            copy.children = Vec::new();
        }
        inner.nodes.push(copy);
        inner.refcounts.push(1);
        Ok(inner.nodes.len() - 1)
    }

    fn reparent_children(&mut self, from: &usize, to: &usize) -> Result<(), TreeError> {
        let mut inner = self.0.borrow_mut();
        inner.counts.reparents += 1;
        let children = std::mem::take(&mut inner.nodes[*from].children);
        for &child in &children {
            inner.nodes[child].parent = Some(*to);
        }
        inner.nodes[*to].children.extend(children);
        Ok(())
    }

    fn get_parent(&mut self, node: &usize, elements_only: bool) -> Result<Option<usize>, TreeError> {
        let inner = self.0.borrow();
        Ok(inner.nodes[*node].parent.filter(|&p| {
            !elements_only || matches!(inner.nodes[p].kind, NodeKind::Element { .. })
        }))
    }

    fn has_children(&mut self, node: &usize) -> Result<bool, TreeError> {
        Ok(!self.0.borrow().nodes[*node].children.is_empty())
    }

    fn form_associate(&mut self, _form: &usize, _node: &usize) -> Result<(), TreeError> {
        self.0.borrow_mut().counts.form_associations += 1;
        Ok(())
    }

    fn add_attributes(
        &mut self,
        node: &usize,
        attributes: &[AttributeData],
    ) -> Result<(), TreeError> {
        let mut inner = self.0.borrow_mut();
        if let NodeKind::Element { attrs, .. } = &mut inner.nodes[*node].kind {
            for attr in attributes {
                if !attrs.iter().any(|a| a.name == attr.name) {
                    attrs.push(attr.clone());
                }
            }
        }
        Ok(())
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) -> Result<(), TreeError> {
        self.0.borrow_mut().quirks = Some(mode);
        Ok(())
    }

    fn encoding_change(&mut self, name: &str) -> Result<(), TreeError> {
        // The parse restarts under the new encoding; discard the document
        // content built so far.
        log::debug!(target: "testdom", "encoding change to {name}, resetting document");
        let mut inner = self.0.borrow_mut();
        inner.encoding_changes.push(name.to_string());
        if !inner.nodes.is_empty() {
            let children = std::mem::take(&mut inner.nodes[0].children);
            for child in children {
                inner.nodes[child].parent = None;
            }
        }
        Ok(())
    }
}

/// Parse a complete document and return the DOM plus the parser (kept alive
/// so span-backed state stays valid for inspection).
pub fn parse_document(input: &[u8]) -> (TestDom, murmur::Parser<TestDom>) {
    let dom = TestDom::new();
    let mut parser = murmur::Parser::new(murmur::ParserOptions::default(), dom.clone());
    if !input.is_empty() {
        parser.parse_chunk(input).expect("parse_chunk");
    }
    parser.completed().expect("completed");
    (dom, parser)
}

/// Parse and snapshot in one step.
pub fn snapshot_of(input: &str) -> String {
    let (dom, parser) = parse_document(input.as_bytes());
    drop(parser);
    dom.snapshot()
}
