//! Graph updater: applies decl diffs to the symbol graph.
//!
//! Consumes the `DeclDiff` list produced for an edited unit after the
//! rebind pass has reconnected surviving symbols. Removal deletes symbols
//! whose last contributing decl is gone; additions and changes invalidate
//! the affected symbols so dependents re-resolve on their next query.
//!
//! Invalidation propagates along *incoming* links of every kind (a
//! container is stale when a member changed, a call site when its callee
//! changed, a dependent when its type source changed), and a bitset
//! guarantees each symbol is processed at most once per update pass even
//! through cycles. Invalidation never raises; a symbol that cannot be
//! re-resolved afterwards surfaces as a diagnostic on the next semantic
//! pass.

use crate::decl::{DeclDiff, DeclId, DiffKind};
use crate::interner::Atom;
use crate::semantic::{SemanticChain, SemanticRecord};
use crate::symbols::{ResolutionState, SymbolId, SymbolKind};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

pub struct GraphUpdater<'a> {
    chain: &'a mut SemanticChain,
    /// Symbols already invalidated in this pass.
    visited: FixedBitSet,
    /// Units whose cached resolution state the pass staled.
    affected_units: FxHashSet<Atom>,
}

impl<'a> GraphUpdater<'a> {
    pub fn new(chain: &'a mut SemanticChain) -> GraphUpdater<'a> {
        let capacity = chain.symbols.capacity();
        GraphUpdater {
            chain,
            visited: FixedBitSet::with_capacity(capacity),
            affected_units: FxHashSet::default(),
        }
    }

    /// Apply one edited unit's diffs. `old_record` is the replaced record
    /// (pre-swap) whose decls the `Removed`/`Changed` entries reference.
    pub fn apply(&mut self, old_record: &SemanticRecord, diffs: &[DeclDiff]) {
        debug!(unit = %old_record.path, count = diffs.len(), "apply decl diffs");
        self.affected_units.insert(old_record.unit);
        for diff in diffs {
            match diff.kind {
                DiffKind::Removed => self.remove_decl(old_record, diff.old),
                DiffKind::Added => self.add_decl(&old_record.path, diff.new),
                DiffKind::Changed => self.change_decl(&old_record.path, diff.new),
            }
        }
        self.flush_affected_units();
    }

    /// Remove a decl subtree's contributions from the graph.
    ///
    /// A symbol that keeps contributing decls (declaration merging) is
    /// invalidated instead of deleted.
    pub fn remove_decl(&mut self, old_record: &SemanticRecord, old_decl: DeclId) {
        let arena = &old_record.decl_tree.arena;
        for id in arena.walk_preorder(old_decl) {
            let decl = match arena.get(id) {
                Some(decl) => decl,
                None => continue,
            };
            for symbol in [decl.symbol, decl.signature_symbol].into_iter().flatten() {
                if self.chain.symbols.get(symbol).is_none() {
                    continue;
                }
                let still_contributed = self
                    .chain
                    .symbols
                    .get(symbol)
                    .is_some_and(|s| !s.decls.is_empty());
                if still_contributed {
                    self.invalidate_type(symbol);
                } else {
                    self.delete_symbol(symbol);
                }
            }
        }
    }

    /// Account for a freshly added decl. Binding already happened in the
    /// rebind pass; what remains is invalidating the symbol it merged
    /// into (new overload, new merged declaration) and the enclosing
    /// container whose shape grew.
    pub fn add_decl(&mut self, path: &str, new_decl: DeclId) {
        let (symbol, parent_symbol) = {
            let record = match self.chain.records.get(path) {
                Some(record) => record,
                None => return,
            };
            let arena = &record.decl_tree.arena;
            let decl = match arena.get(new_decl) {
                Some(decl) => decl,
                None => return,
            };
            let parent_symbol = arena.get(decl.parent).and_then(|p| p.symbol);
            (decl.symbol, parent_symbol)
        };
        if let Some(symbol) = symbol {
            let merged = self
                .chain
                .symbols
                .get(symbol)
                .is_some_and(|s| s.decls.len() > 1);
            if merged {
                self.invalidate_type(symbol);
            }
        }
        if let Some(parent) = parent_symbol {
            self.invalidate_type(parent);
        }
    }

    /// A decl's own shape changed: the (reconnected) symbol keeps its
    /// identity but its type is stale.
    fn change_decl(&mut self, path: &str, new_decl: DeclId) {
        let symbols = {
            let record = match self.chain.records.get(path) {
                Some(record) => record,
                None => return,
            };
            record
                .decl_tree
                .arena
                .get(new_decl)
                .map(|d| [d.symbol, d.signature_symbol])
                .unwrap_or([None, None])
        };
        for symbol in symbols.into_iter().flatten() {
            self.invalidate_type(symbol);
        }
    }

    /// Mark a symbol's type stale and propagate to every symbol holding a
    /// link to it, each at most once per pass. Primitive and error-type
    /// symbols are immutable and never invalidated (nor propagated
    /// through), so a deleted `x: number` cannot stale every number-typed
    /// symbol in the program.
    pub fn invalidate_type(&mut self, symbol: SymbolId) {
        let mut stack = vec![symbol];
        while let Some(current) = stack.pop() {
            let index = current.0 as usize;
            if index >= self.visited.len() {
                let capacity = self.chain.symbols.capacity().max(index + 1);
                self.visited.grow(capacity);
            }
            if self.visited.contains(index) {
                continue;
            }
            self.visited.insert(index);

            let kind = match self.chain.symbols.get(current) {
                Some(s) => s.kind,
                None => continue,
            };
            if matches!(kind, SymbolKind::Primitive | SymbolKind::ErrorType) {
                continue;
            }

            trace!(symbol = current.0, "invalidate");
            for decl_ref in self
                .chain
                .symbols
                .get(current)
                .map(|s| s.decls.clone())
                .unwrap_or_default()
            {
                self.affected_units.insert(decl_ref.unit);
            }
            if let Some(s) = self.chain.symbols.get_mut(current) {
                s.state = ResolutionState::Unresolved;
                s.symbol_type = None;
            }
            self.chain
                .symbols
                .remove_out_links(current, |k| k.is_type_derived());

            for link in self.chain.symbols.in_links(current) {
                stack.push(link.start);
            }
        }
    }

    /// Delete a symbol outright: unlink it everywhere, drop its global
    /// scope entries, and invalidate its former dependents.
    fn delete_symbol(&mut self, symbol: SymbolId) {
        let (name, dependents) = {
            let name = self.chain.symbols.get(symbol).map(|s| s.name);
            let dependents: Vec<SymbolId> = self
                .chain
                .symbols
                .in_links(symbol)
                .iter()
                .map(|l| l.start)
                .collect();
            (name, dependents)
        };
        debug!(symbol = symbol.0, "delete symbol");
        self.chain.symbols.remove(symbol);
        if let Some(name) = name {
            if let Some(entry) = self.chain.globals.get_mut(&name) {
                if entry.value == Some(symbol) {
                    entry.value = None;
                }
                if entry.ty == Some(symbol) {
                    entry.ty = None;
                }
            }
        }
        for dependent in dependents {
            self.invalidate_type(dependent);
        }
    }

    /// Downgrade every unit the pass touched: cached expression
    /// resolutions and diagnostics are stale, so the next diagnostics
    /// query re-checks. Unaffected units keep their resolved state.
    fn flush_affected_units(&mut self) {
        let affected = std::mem::take(&mut self.affected_units);
        for record in self.chain.records.values_mut() {
            if affected.contains(&record.unit) {
                record.on_types_invalidated();
            }
        }
        self.chain.invalidate_path_index();
    }
}
