//! Per-unit semantic record.
//!
//! One record per compilation unit: the unit's decl tree plus the
//! bidirectional indices among AST nodes, decls, and symbols, the unit's
//! bind/check state, and its cached semantic diagnostics. A record is
//! replaced wholesale when its unit is updated; symbols survive in the
//! chain's arena and are reconnected by the rebind pass.

use crate::decl::{DeclId, DeclTree};
use crate::diagnostics::DiagnosticBag;
use crate::interner::Atom;
use crate::symbols::SymbolId;
use crate::syntax::{NodeIndex, SyntaxTree};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Where a unit sits in the bind/check lifecycle. An incremental update
/// moves a unit back to `Bound`; type checking moves it forward again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitState {
    #[default]
    Unbound,
    Bound,
    TypeChecked,
}

pub struct SemanticRecord {
    pub path: String,
    /// The unit path, interned; keys `DeclRef`s and scope ownership.
    pub unit: Atom,
    /// Shared with the unit's `Document` while the unit is open.
    pub syntax: Arc<SyntaxTree>,
    pub decl_tree: DeclTree,
    pub state: UnitState,
    /// AST node id -> resolved symbol. Covers both decl nodes (the
    /// symbol the decl bound to) and expression nodes (the resolver's
    /// cache backing identity-stable repeated queries).
    ast_to_symbol: FxHashMap<u32, SymbolId>,
    /// Reverse index for `get_ast_for_symbol`.
    symbol_to_ast: FxHashMap<SymbolId, NodeIndex>,
    /// Redeclaration and merge diagnostics from the bind pass. Live as
    /// long as the record; a rebind builds a fresh record.
    pub bind_diagnostics: DiagnosticBag,
    /// Resolution diagnostics, rebuilt by every check pass.
    pub check_diagnostics: DiagnosticBag,
}

impl SemanticRecord {
    pub fn new(path: String, unit: Atom, syntax: Arc<SyntaxTree>, decl_tree: DeclTree) -> Self {
        SemanticRecord {
            bind_diagnostics: DiagnosticBag::with_unit(path.clone()),
            check_diagnostics: DiagnosticBag::with_unit(path.clone()),
            path,
            unit,
            syntax,
            decl_tree,
            state: UnitState::Unbound,
            ast_to_symbol: FxHashMap::default(),
            symbol_to_ast: FxHashMap::default(),
        }
    }

    /// The unit's single top-level (script) decl.
    pub fn root_decl(&self) -> DeclId {
        self.decl_tree.root
    }

    /// The unit's top-level declarations: the script decl's children.
    pub fn top_level_decls(&self) -> Vec<DeclId> {
        self.decl_tree
            .arena
            .get(self.decl_tree.root)
            .map(|root| root.children.to_vec())
            .unwrap_or_default()
    }

    pub fn get_decl_for_ast(&self, ast: NodeIndex) -> Option<DeclId> {
        self.decl_tree.ast_to_decl.get(&ast.0).copied()
    }

    pub fn get_symbol_for_ast(&self, ast: NodeIndex) -> Option<SymbolId> {
        self.ast_to_symbol.get(&ast.0).copied()
    }

    pub fn set_symbol_for_ast(&mut self, ast: NodeIndex, symbol: SymbolId) {
        self.ast_to_symbol.insert(ast.0, symbol);
        self.symbol_to_ast.entry(symbol).or_insert(ast);
    }

    pub fn get_ast_for_symbol(&self, symbol: SymbolId) -> Option<NodeIndex> {
        self.symbol_to_ast.get(&symbol).copied()
    }

    /// All semantic diagnostics: bind-pass first, then the last check
    /// pass, each in emission (source) order.
    pub fn get_diagnostics(&self) -> Vec<crate::diagnostics::Diagnostic> {
        let mut out: Vec<_> = self.bind_diagnostics.diagnostics().to_vec();
        out.extend(self.check_diagnostics.diagnostics().iter().cloned());
        out
    }

    /// React to type invalidation touching this unit: drop cached
    /// expression resolutions and stale check diagnostics and fall back
    /// to `Bound` so the next diagnostics query re-checks.
    pub fn on_types_invalidated(&mut self) {
        self.ast_to_symbol.clear();
        self.symbol_to_ast.clear();
        self.check_diagnostics.clear();
        if self.state == UnitState::TypeChecked {
            self.state = UnitState::Bound;
        }
    }
}
