//! Declaration tree nodes.
//!
//! A `Decl` is a lightweight record of one declaring occurrence in a unit,
//! arranged in a tree mirroring scope structure (not full AST shape).
//! Decls are matched across edits structurally, by name and kind, never by
//! identity; the per-unit `DeclArena` is discarded wholesale when a unit's
//! semantic record is replaced.

use crate::interner::Atom;
use crate::span::Span;
use crate::symbols::SymbolId;
use crate::syntax::NodeIndex;
use smallvec::SmallVec;

/// A reference to a decl within a unit's `DeclArena`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    pub const NONE: DeclId = DeclId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == DeclId::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != DeclId::NONE
    }
}

/// The kind of declaring construct a decl records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// The top-level decl of a unit; exactly one per unit.
    Script,
    Module,
    Class,
    Interface,
    Function,
    Method,
    Constructor,
    GetAccessor,
    SetAccessor,
    CallSignature,
    ConstructSignature,
    IndexSignature,
    Variable,
    Parameter,
    Property,
    TypeParameter,
    /// The scope a catch clause introduces for its variable.
    CatchBlock,
    /// The scope a with statement introduces.
    WithBlock,
}

impl DeclKind {
    /// Whether decls of this kind carry a callable signature.
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            DeclKind::Function
                | DeclKind::Method
                | DeclKind::Constructor
                | DeclKind::GetAccessor
                | DeclKind::SetAccessor
                | DeclKind::CallSignature
                | DeclKind::ConstructSignature
                | DeclKind::IndexSignature
        )
    }

    /// Whether decls of this kind introduce a name resolution scope.
    pub fn is_scope(self) -> bool {
        matches!(
            self,
            DeclKind::Script
                | DeclKind::Module
                | DeclKind::Class
                | DeclKind::Interface
                | DeclKind::Function
                | DeclKind::Method
                | DeclKind::Constructor
                | DeclKind::GetAccessor
                | DeclKind::SetAccessor
                | DeclKind::CatchBlock
                | DeclKind::WithBlock
        )
    }
}

/// Modifier flags carried on decls, copied from the declaring AST node.
pub mod decl_flags {
    pub const EXPORTED: u32 = 1 << 0;
    pub const AMBIENT: u32 = 1 << 1;
    pub const STATIC: u32 = 1 << 2;
    pub const OPTIONAL: u32 = 1 << 3;
    pub const PRIVATE: u32 = 1 << 4;
    pub const REST: u32 = 1 << 5;
}

/// One declaring occurrence in a unit.
#[derive(Clone, Debug)]
pub struct Decl {
    pub id: DeclId,
    /// `Atom::NONE` for anonymous decls (script roots, lambdas, scopes).
    pub name: Atom,
    pub kind: DeclKind,
    /// See [`decl_flags`].
    pub flags: u32,
    pub span: Span,
    /// Owning unit path, interned.
    pub unit: Atom,
    pub parent: DeclId,
    pub children: SmallVec<[DeclId; 4]>,
    /// The symbol this decl contributed to; set by the binder.
    pub symbol: Option<SymbolId>,
    /// The signature symbol for callable kinds; set by the binder.
    pub signature_symbol: Option<SymbolId>,
    /// Back-pointer to the originating AST node.
    pub ast: NodeIndex,
}

impl Decl {
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Per-unit decl storage. Owned by the unit's semantic record.
#[derive(Clone, Debug, Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    pub fn new() -> DeclArena {
        DeclArena { decls: Vec::new() }
    }

    pub fn alloc(
        &mut self,
        name: Atom,
        kind: DeclKind,
        flags: u32,
        span: Span,
        unit: Atom,
        ast: NodeIndex,
    ) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl {
            id,
            name,
            kind,
            flags,
            span,
            unit,
            parent: DeclId::NONE,
            children: SmallVec::new(),
            symbol: None,
            signature_symbol: None,
            ast,
        });
        id
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        if id.is_none() {
            None
        } else {
            self.decls.get(id.0 as usize)
        }
    }

    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Decl> {
        if id.is_none() {
            None
        } else {
            self.decls.get_mut(id.0 as usize)
        }
    }

    pub fn add_child(&mut self, parent: DeclId, child: DeclId) {
        if let Some(decl) = self.get_mut(child) {
            decl.parent = parent;
        }
        if let Some(decl) = self.get_mut(parent) {
            decl.children.push(child);
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter()
    }

    /// Depth-first pre-order over the subtree rooted at `root`, children
    /// in source order.
    pub fn walk_preorder(&self, root: DeclId) -> Vec<DeclId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(decl) = self.get(id) {
                for &child in decl.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// The root-to-decl chain of names, skipping anonymous segments.
    /// Used for cross-unit path lookup and merge checks.
    pub fn name_path(&self, id: DeclId) -> Vec<Atom> {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(decl) = self.get(current) {
            if decl.name.is_some() {
                segments.push(decl.name);
            }
            current = decl.parent;
        }
        segments.reverse();
        segments
    }
}
