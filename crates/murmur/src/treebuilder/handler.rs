//! The embedder-supplied tree-mutation interface.
//!
//! The tree builder never sees a concrete DOM: it drives an implementation of
//! [`TreeHandler`] through opaque `Handle`s.
//!
//! Reference discipline:
//! - `create_*` returns a handle owning one reference; the builder releases
//!   it with `unref_node` once the node is no longer held on the open-element
//!   stack, the active formatting list, or an element pointer.
//! - `ref_node` adds a reference when the builder stores an additional copy.
//! - Handles returned by `append_child`, `insert_before`, `remove_child` and
//!   `get_parent` are borrowed; `clone_node` returns an owned reference.
//! - At parser teardown the builder releases everything it still holds, so
//!   `ref` and `unref` calls balance for every node the handler ever created.

use crate::errors::TreeError;
use crate::token::Namespace;

/// Quirks mode derived from the DOCTYPE.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuirksMode {
    #[default]
    None,
    Limited,
    Full,
}

/// One attribute as delivered to the handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeData {
    pub ns: Namespace,
    pub name: String,
    pub value: String,
}

/// Element creation payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub ns: Namespace,
    pub name: String,
    pub attributes: Vec<AttributeData>,
}

/// DOCTYPE creation payload. `None` means the field was absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctypeDetails {
    pub name: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub force_quirks: bool,
}

pub trait TreeHandler {
    /// Opaque node reference.
    type Handle: Clone + PartialEq + std::fmt::Debug;

    /// The document node all content hangs off.
    fn document(&mut self) -> Self::Handle;

    fn create_comment(&mut self, data: &str) -> Result<Self::Handle, TreeError>;
    fn create_doctype(&mut self, doctype: &DoctypeDetails) -> Result<Self::Handle, TreeError>;
    fn create_element(&mut self, element: &ElementData) -> Result<Self::Handle, TreeError>;
    fn create_text(&mut self, data: &str) -> Result<Self::Handle, TreeError>;

    fn ref_node(&mut self, node: &Self::Handle) -> Result<(), TreeError>;
    fn unref_node(&mut self, node: &Self::Handle) -> Result<(), TreeError>;

    /// Append `child` to `parent`. The returned handle is the node actually
    /// living in the tree; a handler may coalesce adjacent text nodes, so it
    /// can differ from `child` and the builder adopts it for further work.
    fn append_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
    ) -> Result<Self::Handle, TreeError>;

    /// Insert `child` before `ref_child` under `parent`, with the same
    /// coalescing allowance as `append_child`.
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        ref_child: &Self::Handle,
    ) -> Result<Self::Handle, TreeError>;

    fn remove_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
    ) -> Result<Self::Handle, TreeError>;

    /// Clone a node; attributes always duplicate, children only when `deep`.
    fn clone_node(&mut self, node: &Self::Handle, deep: bool)
    -> Result<Self::Handle, TreeError>;

    /// Move every child of `from` to the end of `to`, preserving order.
    fn reparent_children(
        &mut self,
        from: &Self::Handle,
        to: &Self::Handle,
    ) -> Result<(), TreeError>;

    fn get_parent(
        &mut self,
        node: &Self::Handle,
        elements_only: bool,
    ) -> Result<Option<Self::Handle>, TreeError>;

    fn has_children(&mut self, node: &Self::Handle) -> Result<bool, TreeError>;

    fn form_associate(
        &mut self,
        form: &Self::Handle,
        node: &Self::Handle,
    ) -> Result<(), TreeError>;

    /// Add attributes to an existing element; already-present names are
    /// ignored.
    fn add_attributes(
        &mut self,
        node: &Self::Handle,
        attributes: &[AttributeData],
    ) -> Result<(), TreeError>;

    fn set_quirks_mode(&mut self, mode: QuirksMode) -> Result<(), TreeError>;

    /// Advisory notification that the document declared a different charset;
    /// the input stream tracks the authoritative outcome itself.
    fn encoding_change(&mut self, _name: &str) -> Result<(), TreeError> {
        Ok(())
    }
}
