//! Symbols and the symbol link graph.
//!
//! Symbols live in one arena per semantic chain and are addressed by
//! stable integer ids, so the cyclic cross-unit graph needs no shared
//! pointers and invalidation can track visited symbols with a bitset.
//! Links are `(start, end, kind)` triples kept in a per-symbol adjacency
//! index, maintained in both directions.
//!
//! A symbol's resolution state is the cycle breaker for the pull model:
//! `Unresolved` means no type has been computed, `Resolving` means a
//! computation is on the call stack (re-entry must short-circuit), and
//! `Resolved` means `symbol_type` is valid until the next invalidation.

use crate::decl::DeclId;
use crate::interner::Atom;
use smallvec::SmallVec;

/// A reference to a symbol within the chain's `SymbolArena`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == SymbolId::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != SymbolId::NONE
    }
}

/// The semantic category of a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A built-in type (`number`, `string`, ...). Created once per chain.
    Primitive,
    Module,
    Class,
    Interface,
    Function,
    Method,
    /// A callable signature hanging off a function/method/accessor.
    Signature,
    Variable,
    Parameter,
    Property,
    Accessor,
    TypeParameter,
    /// Synthesized for a queried expression node (call sites, literals).
    Expression,
    /// Synthesized array-of-element type; element via `TypeArgument`.
    Array,
    /// The internal error type; compatible with everything.
    ErrorType,
}

impl SymbolKind {
    /// Whether symbols of this kind denote a type by themselves.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Primitive
                | SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::TypeParameter
                | SymbolKind::Array
                | SymbolKind::ErrorType
        )
    }
}

/// Modifier flags carried on symbols.
pub mod symbol_flags {
    pub const EXPORTED: u32 = 1 << 0;
    pub const AMBIENT: u32 = 1 << 1;
    pub const STATIC: u32 = 1 << 2;
    pub const OPTIONAL: u32 = 1 << 3;
    pub const PRIVATE: u32 = 1 << 4;
    pub const VARARG: u32 = 1 << 5;
    /// Created by the resolver rather than bound from a decl.
    pub const SYNTHESIZED: u32 = 1 << 6;
    pub const SPECIALIZED: u32 = 1 << 7;
}

/// The three-state resolution machine. A symbol never observes a fourth
/// value; re-entrant resolution of a `Resolving` symbol short-circuits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionState {
    #[default]
    Unresolved,
    Resolving,
    Resolved,
}

/// One declaring occurrence contributing to a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeclRef {
    /// Owning unit path, interned.
    pub unit: Atom,
    pub decl: DeclId,
}

/// The kind of a directed symbol link.
///
/// Links carry no resolution logic; they exist for graph traversal during
/// invalidation and for enumerating structure (members, parameters).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Declared type: variable/parameter/property -> its type symbol.
    TypedAs,
    /// Inferred type: initialized decl -> the type its initializer gave it.
    ProvidesInferredType,
    Extends,
    Implements,
    /// Container -> member.
    Member,
    /// Signature -> parameter, in declaration order.
    Parameter,
    /// Signature -> return type.
    ReturnType,
    TypeParameter,
    TypeArgument,
    /// Callable -> call signature.
    CallSignature,
    /// Class -> construct signature.
    ConstructSignature,
    IndexSignature,
    /// Pairs a get accessor's signature with its set accessor's.
    GetterSetter,
    /// Call-site expression -> resolved callee. Carries invalidation from
    /// a callee to the call sites that resolved against it.
    CallTarget,
}

impl LinkKind {
    /// Type-derived links are dropped on invalidation and rebuilt by the
    /// next resolution; structural links survive.
    pub fn is_type_derived(self) -> bool {
        matches!(
            self,
            LinkKind::TypedAs
                | LinkKind::ProvidesInferredType
                | LinkKind::ReturnType
                | LinkKind::CallTarget
                | LinkKind::TypeArgument
        )
    }
}

/// A typed, directed edge between two symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolLink {
    pub start: SymbolId,
    pub end: SymbolId,
    pub kind: LinkKind,
}

/// A resolved semantic entity: what one or more decls bind to.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: Atom,
    pub kind: SymbolKind,
    /// See [`symbol_flags`].
    pub flags: u32,
    pub state: ResolutionState,
    /// Cached type, valid only while `state` is `Resolved`.
    pub symbol_type: Option<SymbolId>,
    /// Contributing decls; more than one under declaration merging.
    pub decls: SmallVec<[DeclRef; 1]>,
    /// Bind-pass stamp; distinguishes freshly (re)bound symbols from
    /// pre-existing ones within one update.
    pub last_bound: u32,
}

impl Symbol {
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ResolutionState::Resolved
    }

    /// Remove this symbol's contribution from `unit`'s decls.
    pub fn remove_decls_of_unit(&mut self, unit: Atom) {
        self.decls.retain(|d| d.unit != unit);
    }
}

// =============================================================================
// SymbolArena
// =============================================================================

/// Chain-wide symbol storage plus the link adjacency index.
///
/// Slots are tombstoned on removal so ids stay stable; the id space only
/// grows for the lifetime of a chain.
#[derive(Debug, Default)]
pub struct SymbolArena {
    slots: Vec<Option<Symbol>>,
    out_links: Vec<SmallVec<[SymbolLink; 4]>>,
    in_links: Vec<SmallVec<[SymbolLink; 4]>>,
}

impl SymbolArena {
    pub fn new() -> SymbolArena {
        SymbolArena::default()
    }

    pub fn alloc(&mut self, name: Atom, kind: SymbolKind, flags: u32) -> SymbolId {
        let id = SymbolId(self.slots.len() as u32);
        self.slots.push(Some(Symbol {
            id,
            name,
            kind,
            flags,
            state: ResolutionState::Unresolved,
            symbol_type: None,
            decls: SmallVec::new(),
            last_bound: 0,
        }));
        self.out_links.push(SmallVec::new());
        self.in_links.push(SmallVec::new());
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_none() {
            return None;
        }
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.is_none() {
            return None;
        }
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.get(id).is_some()
    }

    /// Total slot count including tombstones; sizes invalidation bitsets.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }

    /// Delete a symbol and every link touching it. The slot is
    /// tombstoned; the id is never reused.
    pub fn remove(&mut self, id: SymbolId) -> Option<Symbol> {
        if id.is_none() {
            return None;
        }
        self.unlink_all(id);
        self.slots.get_mut(id.0 as usize).and_then(|s| s.take())
    }

    // -------------------------------------------------------------------------
    // Links
    // -------------------------------------------------------------------------

    /// Add a directed link. Duplicates are allowed (two parameters may
    /// share a type symbol); out-link order is insertion order, which for
    /// `Parameter` links is declaration order.
    pub fn add_link(&mut self, start: SymbolId, end: SymbolId, kind: LinkKind) {
        debug_assert!(self.contains(start) && self.contains(end), "dangling link");
        let link = SymbolLink { start, end, kind };
        self.out_links[start.0 as usize].push(link);
        self.in_links[end.0 as usize].push(link);
    }

    pub fn out_links(&self, id: SymbolId) -> &[SymbolLink] {
        if id.is_none() {
            return &[];
        }
        self.out_links
            .get(id.0 as usize)
            .map_or(&[], |links| links.as_slice())
    }

    pub fn in_links(&self, id: SymbolId) -> &[SymbolLink] {
        if id.is_none() {
            return &[];
        }
        self.in_links
            .get(id.0 as usize)
            .map_or(&[], |links| links.as_slice())
    }

    /// Outgoing link targets of one kind, in insertion order.
    pub fn outs(&self, id: SymbolId, kind: LinkKind) -> Vec<SymbolId> {
        self.out_links(id)
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.end)
            .collect()
    }

    /// First outgoing link target of one kind.
    pub fn first_out(&self, id: SymbolId, kind: LinkKind) -> Option<SymbolId> {
        self.out_links(id)
            .iter()
            .find(|l| l.kind == kind)
            .map(|l| l.end)
    }

    /// Find a member symbol by name along `Member` links.
    pub fn find_member(&self, container: SymbolId, name: Atom) -> Option<SymbolId> {
        self.out_links(container)
            .iter()
            .filter(|l| l.kind == LinkKind::Member)
            .map(|l| l.end)
            .find(|&m| self.get(m).is_some_and(|s| s.name == name))
    }

    /// Remove every outgoing link of `start` whose kind satisfies the
    /// predicate, fixing up the targets' incoming lists.
    pub fn remove_out_links(&mut self, start: SymbolId, mut pred: impl FnMut(LinkKind) -> bool) {
        if start.is_none() {
            return;
        }
        let removed: Vec<SymbolLink> = {
            let links = &mut self.out_links[start.0 as usize];
            let mut removed = Vec::new();
            links.retain(|l| {
                if pred(l.kind) {
                    removed.push(*l);
                    false
                } else {
                    true
                }
            });
            removed
        };
        for link in removed {
            if let Some(ins) = self.in_links.get_mut(link.end.0 as usize) {
                if let Some(pos) = ins.iter().position(|l| *l == link) {
                    ins.remove(pos);
                }
            }
        }
    }

    /// Remove every link touching `id`, in both directions.
    fn unlink_all(&mut self, id: SymbolId) {
        self.remove_out_links(id, |_| true);
        let incoming: Vec<SymbolLink> = self.in_links[id.0 as usize].drain(..).collect();
        for link in incoming {
            if let Some(outs) = self.out_links.get_mut(link.start.0 as usize) {
                if let Some(pos) = outs.iter().position(|l| *l == link) {
                    outs.remove(pos);
                }
            }
        }
    }
}
