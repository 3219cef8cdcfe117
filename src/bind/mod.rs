//! Symbol binder.
//!
//! Consumes a unit's decl tree and creates or merges `Symbol` nodes and
//! the structural links between them. Binding never forces type
//! resolution: it shapes the graph and leaves `symbol_type` for the
//! resolver to fill on first query.
//!
//! Rebinding after an edit reconnects the symbols harvested from the old
//! record to the new decls that replaced their counterparts, so references
//! held by unaffected units keep working; only decls with no counterpart
//! get fresh symbols.

use crate::decl::{DeclId, DeclKind, DeclTree, decl_flags};
use crate::diagnostics::format_message;
use crate::interner::{Atom, Interner};
use crate::semantic::{ScopeEntry, SemanticChain, SemanticRecord, UnitState};
use crate::symbols::{DeclRef, LinkKind, SymbolArena, SymbolId, SymbolKind, symbol_flags};
use crate::syntax::{Node, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Identity map harvested from a unit's old record before an update:
/// structural key -> the symbols its decl was bound to. The ordinal
/// disambiguates same-name same-kind siblings (overloads).
#[derive(Debug, Default)]
pub struct RebindMap {
    entries: FxHashMap<(Vec<Atom>, DeclKind, usize), (SymbolId, Option<SymbolId>)>,
}

impl RebindMap {
    /// Harvest the symbol identities out of a record about to be
    /// replaced.
    pub fn harvest(record: &SemanticRecord) -> RebindMap {
        let mut map = RebindMap::default();
        let arena = &record.decl_tree.arena;
        for id in arena.walk_preorder(record.decl_tree.root) {
            let decl = match arena.get(id) {
                Some(decl) => decl,
                None => continue,
            };
            let symbol = match decl.symbol {
                Some(symbol) => symbol,
                None => continue,
            };
            let key = (
                arena.name_path(id),
                decl.kind,
                sibling_ordinal(&record.decl_tree, id),
            );
            map.entries.insert(key, (symbol, decl.signature_symbol));
        }
        map
    }

    fn lookup(&self, tree: &DeclTree, id: DeclId) -> Option<(SymbolId, Option<SymbolId>)> {
        let decl = tree.arena.get(id)?;
        let key = (
            tree.arena.name_path(id),
            decl.kind,
            sibling_ordinal(tree, id),
        );
        self.entries.get(&key).copied()
    }
}

/// Position of `id` among siblings sharing its name and kind.
fn sibling_ordinal(tree: &DeclTree, id: DeclId) -> usize {
    let decl = match tree.arena.get(id) {
        Some(decl) => decl,
        None => return 0,
    };
    let parent = match tree.arena.get(decl.parent) {
        Some(parent) => parent,
        None => return 0,
    };
    parent
        .children
        .iter()
        .filter_map(|&c| tree.arena.get(c))
        .filter(|c| c.name == decl.name && c.kind == decl.kind)
        .position(|c| c.id == decl.id)
        .unwrap_or(0)
}

/// Bind every decl in `path`'s tree, creating or reconnecting symbols.
///
/// `previous` carries the old record's symbol identities during an
/// incremental rebind; `None` means a fresh bind. Primitive symbols are
/// never touched here; they were created with the chain.
pub fn bind_unit(chain: &mut SemanticChain, path: &str, previous: Option<&RebindMap>) {
    let pass = chain.next_bind_pass();
    debug!(path, pass, rebind = previous.is_some(), "bind unit");
    {
        let SemanticChain {
            records,
            symbols,
            globals,
            interner,
            ..
        } = &mut *chain;
        let record = match records.get_mut(path) {
            Some(record) => record,
            None => return,
        };
        if previous.is_some() {
            // Strip this unit's stale decl refs chain-wide; the walk
            // below re-adds the surviving ones. Symbols left with no
            // contributing decls are the graph updater's to delete.
            let unit = record.unit;
            for symbol in symbols.iter_mut() {
                symbol.remove_decls_of_unit(unit);
            }
        }
        let root = record.decl_tree.root;
        let mut binder = BindPass {
            record,
            symbols,
            globals,
            interner,
            previous,
            pass,
        };
        binder.bind(root, None, None);
        if binder.record.state == UnitState::Unbound {
            binder.record.state = UnitState::Bound;
        }
    }
    chain.invalidate_path_index();
}

struct BindPass<'a> {
    record: &'a mut SemanticRecord,
    symbols: &'a mut SymbolArena,
    globals: &'a mut FxHashMap<Atom, ScopeEntry>,
    interner: &'a Interner,
    previous: Option<&'a RebindMap>,
    pass: u32,
}

impl<'a> BindPass<'a> {
    /// Bind `decl_id` and recurse. `container` is the symbol of the
    /// nearest enclosing named scope; `signature` the signature symbol of
    /// the nearest enclosing callable.
    fn bind(
        &mut self,
        decl_id: DeclId,
        container: Option<SymbolId>,
        signature: Option<SymbolId>,
    ) {
        let (kind, name, flags, ast) = {
            let decl = match self.record.decl_tree.arena.get(decl_id) {
                Some(decl) => decl,
                None => return,
            };
            (decl.kind, decl.name, decl.flags, decl.ast)
        };

        let mut child_container = container;
        let mut child_signature = signature;

        match kind {
            DeclKind::Script | DeclKind::CatchBlock | DeclKind::WithBlock => {
                // Anonymous scopes carry no symbol of their own.
            }
            DeclKind::Module => {
                let symbol = self.declare(decl_id, name, SymbolKind::Module, flags, container);
                child_container = Some(symbol);
            }
            DeclKind::Class => {
                let symbol = self.declare(decl_id, name, SymbolKind::Class, flags, container);
                child_container = Some(symbol);
                self.try_wire_heritage(symbol, ast);
            }
            DeclKind::Interface => {
                let symbol = self.declare(decl_id, name, SymbolKind::Interface, flags, container);
                child_container = Some(symbol);
                self.try_wire_heritage(symbol, ast);
            }
            DeclKind::Function => {
                let symbol = self.declare(decl_id, name, SymbolKind::Function, flags, container);
                let sig = self.attach_signature(decl_id, symbol, LinkKind::CallSignature);
                child_container = Some(symbol);
                child_signature = Some(sig);
            }
            DeclKind::Method => {
                let symbol = self.declare(decl_id, name, SymbolKind::Method, flags, container);
                let sig = self.attach_signature(decl_id, symbol, LinkKind::CallSignature);
                child_container = Some(symbol);
                child_signature = Some(sig);
            }
            DeclKind::Constructor => {
                let sig = self.fresh_signature(decl_id);
                if let Some(owner) = container {
                    self.ensure_link(owner, sig, LinkKind::ConstructSignature);
                }
                child_signature = Some(sig);
            }
            DeclKind::GetAccessor | DeclKind::SetAccessor => {
                let symbol = self.declare(decl_id, name, SymbolKind::Accessor, flags, container);
                let sig = self.attach_signature(decl_id, symbol, LinkKind::CallSignature);
                // Pair the get and set signatures once both are bound.
                let sigs = self.symbols.outs(symbol, LinkKind::CallSignature);
                if sigs.len() == 2 {
                    self.ensure_link(sigs[0], sigs[1], LinkKind::GetterSetter);
                }
                child_container = Some(symbol);
                child_signature = Some(sig);
            }
            DeclKind::CallSignature => {
                let sig = self.fresh_signature(decl_id);
                if let Some(owner) = container {
                    self.ensure_link(owner, sig, LinkKind::CallSignature);
                }
                child_signature = Some(sig);
            }
            DeclKind::ConstructSignature => {
                let sig = self.fresh_signature(decl_id);
                if let Some(owner) = container {
                    self.ensure_link(owner, sig, LinkKind::ConstructSignature);
                }
                child_signature = Some(sig);
            }
            DeclKind::IndexSignature => {
                let sig = self.fresh_signature(decl_id);
                if let Some(owner) = container {
                    self.ensure_link(owner, sig, LinkKind::IndexSignature);
                }
                child_signature = Some(sig);
            }
            DeclKind::Variable => {
                self.declare(decl_id, name, SymbolKind::Variable, flags, container);
            }
            DeclKind::Property => {
                self.declare(decl_id, name, SymbolKind::Property, flags, container);
            }
            DeclKind::Parameter => {
                let symbol = self.declare(decl_id, name, SymbolKind::Parameter, flags, container);
                if let Some(sig) = signature {
                    self.symbols.add_link(sig, symbol, LinkKind::Parameter);
                }
            }
            DeclKind::TypeParameter => {
                let symbol =
                    self.declare(decl_id, name, SymbolKind::TypeParameter, flags, container);
                if let Some(owner) = container {
                    self.ensure_link(owner, symbol, LinkKind::TypeParameter);
                }
            }
        }

        let children: Vec<DeclId> = self
            .record
            .decl_tree
            .arena
            .get(decl_id)
            .map(|d| d.children.to_vec())
            .unwrap_or_default();
        for child in children {
            self.bind(child, child_container, child_signature);
        }
    }

    /// Create, merge, or reconnect the symbol for one decl and register
    /// it in its scope.
    fn declare(
        &mut self,
        decl_id: DeclId,
        name: Atom,
        kind: SymbolKind,
        decl_flag_bits: u32,
        container: Option<SymbolId>,
    ) -> SymbolId {
        let flags = symbol_flags_from_decl(decl_flag_bits);
        let (value_space, type_space) = scope_spaces(kind);
        let is_member = container.is_some_and(|c| {
            self.symbols
                .get(c)
                .is_some_and(|s| matches!(s.kind, SymbolKind::Class | SymbolKind::Interface))
        });

        // 1. Reconnect the old record's symbol when rebinding.
        let reconnected = self
            .previous
            .and_then(|map| map.lookup(&self.record.decl_tree, decl_id))
            .filter(|(symbol, _)| self.symbols.contains(*symbol));
        if let Some((symbol, signature)) = reconnected {
            self.reattach(decl_id, symbol, signature);
            return symbol;
        }

        // 2. Merge into an existing same-scope symbol when legal.
        let existing = if name.is_none() {
            None
        } else if is_member {
            container.and_then(|c| self.symbols.find_member(c, name))
        } else if self.is_top_level(decl_id) {
            self.globals.get(&name).and_then(|e| {
                let value_hit = if value_space { e.value } else { None };
                let type_hit = if type_space { e.ty } else { None };
                value_hit.or(type_hit)
            })
        } else {
            self.find_local_sibling(decl_id, name)
        };

        if let Some(existing) = existing {
            if let Some(existing_kind) = self.symbols.get(existing).map(|s| s.kind) {
                if !merge_legal(existing_kind, kind) {
                    let span = self
                        .record
                        .decl_tree
                        .arena
                        .get(decl_id)
                        .map(|d| d.span)
                        .unwrap_or_default();
                    let text = self.interner.resolve(name).to_string();
                    self.record.bind_diagnostics.error(
                        span,
                        format_message("Duplicate identifier '{0}'.", &[&text]),
                        2300,
                    );
                }
                // Either way the decl contributes to the existing symbol,
                // so downstream queries still find something sensible.
                self.attach_decl(decl_id, existing);
                trace!(symbol = existing.0, "merged decl into symbol");
                return existing;
            }
        }

        // 3. Fresh symbol.
        let symbol = self.symbols.alloc(name, kind, flags);
        self.attach_decl(decl_id, symbol);
        if is_member {
            if let Some(container) = container {
                self.symbols.add_link(container, symbol, LinkKind::Member);
            }
        } else if self.is_top_level(decl_id) && name.is_some() {
            let entry = self.globals.entry(name).or_default();
            if value_space {
                entry.value = Some(symbol);
            }
            if type_space {
                entry.ty = Some(symbol);
            }
        } else if let Some(container) = container {
            // Named decls nested in a module surface as the module's
            // members for qualified lookup.
            if name.is_some()
                && self
                    .symbols
                    .get(container)
                    .is_some_and(|s| s.kind == SymbolKind::Module)
            {
                self.symbols.add_link(container, symbol, LinkKind::Member);
            }
        }
        trace!(symbol = symbol.0, ?kind, "created symbol");
        symbol
    }

    /// Attach a decl to a symbol: decl -> symbol pointer, symbol's decl
    /// list, the record's AST index, and the bind stamp.
    fn attach_decl(&mut self, decl_id: DeclId, symbol: SymbolId) {
        let unit = self.record.unit;
        let ast = {
            let decl = self
                .record
                .decl_tree
                .arena
                .get_mut(decl_id)
                .expect("decl exists");
            decl.symbol = Some(symbol);
            decl.ast
        };
        if let Some(sym) = self.symbols.get_mut(symbol) {
            if !sym
                .decls
                .iter()
                .any(|d| d.unit == unit && d.decl == decl_id)
            {
                sym.decls.push(DeclRef {
                    unit,
                    decl: decl_id,
                });
            }
            sym.last_bound = self.pass;
        }
        self.record.set_symbol_for_ast(ast, symbol);
    }

    /// Reconnect an existing symbol to its replacement decl. Stale refs
    /// into the discarded record were stripped when the pass started.
    fn reattach(&mut self, decl_id: DeclId, symbol: SymbolId, signature: Option<SymbolId>) {
        self.attach_decl(decl_id, symbol);
        if let Some(signature) = signature {
            if self.symbols.contains(signature) {
                if let Some(decl) = self.record.decl_tree.arena.get_mut(decl_id) {
                    decl.signature_symbol = Some(signature);
                }
                // Parameter links are re-wired as the parameters bind;
                // drop the stale ordering first.
                self.symbols
                    .remove_out_links(signature, |k| k == LinkKind::Parameter);
            }
        }
        trace!(symbol = symbol.0, "reconnected symbol");
    }

    /// Create or reconnect the signature symbol of a callable decl and
    /// link it from the owning symbol.
    fn attach_signature(&mut self, decl_id: DeclId, owner: SymbolId, link: LinkKind) -> SymbolId {
        let sig = self.fresh_signature(decl_id);
        self.ensure_link(owner, sig, link);
        sig
    }

    fn fresh_signature(&mut self, decl_id: DeclId) -> SymbolId {
        let unit = self.record.unit;
        let sig = match self
            .previous
            .and_then(|map| map.lookup(&self.record.decl_tree, decl_id))
            .and_then(|(_, sig)| sig)
            .filter(|sig| self.symbols.contains(*sig))
        {
            Some(previous) => {
                self.symbols
                    .remove_out_links(previous, |k| k == LinkKind::Parameter);
                previous
            }
            None => self
                .symbols
                .alloc(Atom::NONE, SymbolKind::Signature, symbol_flags::SYNTHESIZED),
        };
        if let Some(s) = self.symbols.get_mut(sig) {
            if !s.decls.iter().any(|d| d.unit == unit && d.decl == decl_id) {
                s.decls.push(DeclRef {
                    unit,
                    decl: decl_id,
                });
            }
            s.last_bound = self.pass;
        }
        if let Some(decl) = self.record.decl_tree.arena.get_mut(decl_id) {
            decl.signature_symbol = Some(sig);
        }
        sig
    }

    fn ensure_link(&mut self, start: SymbolId, end: SymbolId, kind: LinkKind) {
        let exists = self
            .symbols
            .out_links(start)
            .iter()
            .any(|l| l.kind == kind && l.end == end);
        if !exists {
            self.symbols.add_link(start, end, kind);
        }
    }

    fn is_top_level(&self, decl_id: DeclId) -> bool {
        self.record
            .decl_tree
            .arena
            .get(decl_id)
            .map(|d| d.parent == self.record.decl_tree.root)
            .unwrap_or(false)
    }

    /// Among earlier same-scope siblings, the symbol already bound for
    /// `name` (local redeclaration/merge check).
    fn find_local_sibling(&self, decl_id: DeclId, name: Atom) -> Option<SymbolId> {
        let arena = &self.record.decl_tree.arena;
        let decl = arena.get(decl_id)?;
        let parent = arena.get(decl.parent)?;
        parent
            .children
            .iter()
            .take_while(|&&c| c != decl_id)
            .filter_map(|&c| arena.get(c))
            .filter(|c| c.name == name)
            .find_map(|c| c.symbol)
    }

    /// Wire Extends/Implements links that already resolve; the resolver
    /// completes the rest lazily so cross-unit declaration order does not
    /// matter.
    fn try_wire_heritage(&mut self, symbol: SymbolId, ast: NodeIndex) {
        let syntax = self.record.syntax.clone();
        let (extends, implements): (Vec<NodeIndex>, Vec<NodeIndex>) = match syntax.arena.get(ast) {
            Some(Node::ClassDecl(class)) => (vec![class.extends], class.implements.clone()),
            Some(Node::InterfaceDecl(interface)) => (interface.extends.clone(), Vec::new()),
            _ => return,
        };
        for (clauses, kind) in [(extends, LinkKind::Extends), (implements, LinkKind::Implements)] {
            for idx in clauses {
                if let Some(Node::TypeRef(type_ref)) = syntax.arena.get(idx) {
                    let target = type_ref
                        .segments
                        .first()
                        .and_then(|first| self.interner.get(first))
                        .and_then(|atom| self.globals.get(&atom).and_then(|e| e.ty));
                    if let Some(target) = target {
                        if target != symbol {
                            self.ensure_link(symbol, target, kind);
                        }
                    }
                }
            }
        }
    }
}

/// Which scope spaces a symbol kind's name occupies.
fn scope_spaces(kind: SymbolKind) -> (bool, bool) {
    match kind {
        SymbolKind::Interface | SymbolKind::TypeParameter => (false, true),
        SymbolKind::Class | SymbolKind::Module => (true, true),
        _ => (true, false),
    }
}

/// Translate decl modifier flags into symbol flags.
fn symbol_flags_from_decl(flags: u32) -> u32 {
    let mut out = 0;
    if flags & decl_flags::EXPORTED != 0 {
        out |= symbol_flags::EXPORTED;
    }
    if flags & decl_flags::AMBIENT != 0 {
        out |= symbol_flags::AMBIENT;
    }
    if flags & decl_flags::STATIC != 0 {
        out |= symbol_flags::STATIC;
    }
    if flags & decl_flags::OPTIONAL != 0 {
        out |= symbol_flags::OPTIONAL;
    }
    if flags & decl_flags::PRIVATE != 0 {
        out |= symbol_flags::PRIVATE;
    }
    if flags & decl_flags::REST != 0 {
        out |= symbol_flags::VARARG;
    }
    out
}

/// Declaration-merging legality: which decl kinds may accumulate into an
/// existing symbol of the given kind.
fn merge_legal(existing: SymbolKind, incoming: SymbolKind) -> bool {
    matches!(
        (existing, incoming),
        (SymbolKind::Interface, SymbolKind::Interface)
            | (SymbolKind::Interface, SymbolKind::Module)
            | (SymbolKind::Module, SymbolKind::Interface)
            | (SymbolKind::Module, SymbolKind::Module)
            | (SymbolKind::Module, SymbolKind::Class)
            | (SymbolKind::Class, SymbolKind::Module)
            | (SymbolKind::Module, SymbolKind::Function)
            | (SymbolKind::Function, SymbolKind::Module)
            | (SymbolKind::Function, SymbolKind::Function)
            | (SymbolKind::Method, SymbolKind::Method)
            | (SymbolKind::Variable, SymbolKind::Variable)
            | (SymbolKind::Accessor, SymbolKind::Accessor)
    )
}
