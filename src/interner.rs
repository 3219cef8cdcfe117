//! String interner for declaration and symbol names.
//!
//! Names are interned once per semantic chain and passed around as `Atom`s
//! (plain u32 indices). Name equality during binding and decl diffing is an
//! integer comparison instead of a string comparison.

use rustc_hash::FxHashMap;
use serde::Serialize;

/// An interned name.
///
/// Atoms are cheap to copy and can be compared with `==` in O(1). To get
/// the actual string back, use `Interner::resolve`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// Sentinel for "no name" (anonymous decls); resolves to "".
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self.0 != 0
    }
}

/// Per-chain name table.
///
/// Unlike a process-global interner this lives on the `SemanticChain`, so
/// multiple chains can coexist and tests run in isolation. The chain is
/// single-threaded (see the concurrency contract on `Compiler`), so no
/// locking is needed here.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<String>,
    index: FxHashMap<String, Atom>,
}

impl Interner {
    pub fn new() -> Interner {
        let mut interner = Interner {
            strings: Vec::new(),
            index: FxHashMap::default(),
        };
        // Atom(0) is reserved for the empty/none name.
        interner.strings.push(String::new());
        interner.index.insert(String::new(), Atom::NONE);
        interner
    }

    /// Intern a string, returning its atom. Repeated calls with the same
    /// string return the same atom.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.index.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        self.strings.push(text.to_string());
        self.index.insert(text.to_string(), atom);
        atom
    }

    /// Resolve an atom back to its string.
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.0 as usize]
    }

    /// Look up an already-interned string without inserting.
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.index.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        // The reserved empty atom is always present.
        self.strings.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        let c = interner.intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "foo");
        assert_eq!(interner.resolve(c), "bar");
    }

    #[test]
    fn test_none_atom() {
        let interner = Interner::new();
        assert!(Atom::NONE.is_none());
        assert_eq!(interner.resolve(Atom::NONE), "");
    }

    #[test]
    fn test_get_without_insert() {
        let mut interner = Interner::new();
        assert_eq!(interner.get("missing"), None);
        let atom = interner.intern("present");
        assert_eq!(interner.get("present"), Some(atom));
    }
}
