//! Atom table for canonicalized tag and attribute names.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque atom identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// Document-level atom table.
///
/// Invariant: ASCII letters are stored in canonical lowercase form for
/// HTML-namespace matching. Non-ASCII code points are preserved as-is.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<Arc<str>>,
    map: HashMap<Arc<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, applying ASCII-lowercase folding for HTML matching.
    pub fn intern_ascii_folded(&mut self, name: &str) -> AtomId {
        let folded = if name.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(name.to_ascii_lowercase())
        } else {
            Cow::Borrowed(name)
        };
        if let Some(id) = self.map.get(folded.as_ref()) {
            return *id;
        }
        let atom = Arc::<str>::from(folded.as_ref());
        debug_assert!(
            self.atoms.len() < u32::MAX as usize,
            "atom table exceeded AtomId capacity"
        );
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(Arc::clone(&atom));
        self.map.insert(atom, id);
        id
    }

    /// Intern a name preserving case (foreign-content names are case-sensitive).
    pub fn intern_exact(&mut self, name: &str) -> AtomId {
        if let Some(id) = self.map.get(name) {
            return *id;
        }
        let atom = Arc::<str>::from(name);
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(Arc::clone(&atom));
        self.map.insert(atom, id);
        id
    }

    pub fn resolve(&self, id: AtomId) -> &str {
        self.atoms
            .get(id.0 as usize)
            .map(|s| s.as_ref())
            .expect("atom id out of range")
    }

    pub fn resolve_arc(&self, id: AtomId) -> Arc<str> {
        Arc::clone(self.atoms.get(id.0 as usize).expect("atom id out of range"))
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::AtomTable;

    #[test]
    fn intern_ascii_folded_is_case_insensitive() {
        let mut atoms = AtomTable::new();
        let upper = atoms.intern_ascii_folded("DIV");
        let mixed = atoms.intern_ascii_folded("DiV");
        let lower = atoms.intern_ascii_folded("div");
        assert_eq!(upper, mixed);
        assert_eq!(upper, lower);
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms.resolve(upper), "div");
    }

    #[test]
    fn intern_exact_preserves_case() {
        let mut atoms = AtomTable::new();
        let exact = atoms.intern_exact("foreignObject");
        assert_eq!(atoms.resolve(exact), "foreignObject");
        let folded = atoms.intern_ascii_folded("foreignObject");
        assert_ne!(exact, folded);
        assert_eq!(atoms.resolve(folded), "foreignobject");
    }

    #[test]
    fn intern_preserves_non_ascii() {
        let mut atoms = AtomTable::new();
        let id = atoms.intern_ascii_folded("Déjà");
        assert_eq!(atoms.resolve(id), "déjà");
    }
}
