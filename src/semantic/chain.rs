//! The semantic chain: ordered registry of unit records, chain-wide
//! symbol storage, process-wide primitive symbols, and cross-unit
//! name-path lookup.
//!
//! One chain is one program. All mutable counters (bind pass, symbol ids)
//! live here rather than in globals, so multiple chains coexist and tests
//! run in isolation.

use crate::decl::{DeclId, DeclKind};
use crate::interner::{Atom, Interner};
use crate::semantic::record::SemanticRecord;
use crate::symbols::{LinkKind, ResolutionState, SymbolArena, SymbolId, SymbolKind, symbol_flags};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

/// The built-in type symbols, created exactly once per chain and shared
/// read-only by every unit.
#[derive(Clone, Copy, Debug)]
pub struct PrimitiveSymbols {
    pub any: SymbolId,
    pub number: SymbolId,
    pub string: SymbolId,
    pub boolean: SymbolId,
    pub void: SymbolId,
    pub null: SymbolId,
    pub undefined: SymbolId,
    /// The internal error type; compatible with everything, reported
    /// nowhere.
    pub error: SymbolId,
}

/// A two-space scope slot: structural languages keep value names and type
/// names in separate spaces (a class occupies both).
#[derive(Clone, Copy, Debug, Default)]
pub struct ScopeEntry {
    pub value: Option<SymbolId>,
    pub ty: Option<SymbolId>,
}

/// One hit in the cross-unit decl-path index.
#[derive(Clone, Copy, Debug)]
pub struct PathTarget {
    pub unit: Atom,
    pub decl: DeclId,
    pub kind: DeclKind,
    pub symbol: Option<SymbolId>,
}

pub struct SemanticChain {
    pub interner: Interner,
    pub symbols: SymbolArena,
    /// Unit records in submission order.
    pub records: IndexMap<String, SemanticRecord>,
    pub primitives: PrimitiveSymbols,
    /// Chain-global scope (top-level names of every unit).
    pub globals: FxHashMap<Atom, ScopeEntry>,
    /// Decl-path index, rebuilt lazily after structural changes.
    pub(crate) path_index: Option<FxHashMap<Vec<Atom>, Vec<PathTarget>>>,
    /// Interned array types: element type -> array-of-element symbol.
    pub(crate) array_types: FxHashMap<SymbolId, SymbolId>,
    /// Monotonic bind-pass counter; stamped into `Symbol::last_bound`.
    pub bind_pass: u32,
}

impl SemanticChain {
    pub fn new() -> SemanticChain {
        let mut interner = Interner::new();
        let mut symbols = SymbolArena::new();
        let mut globals: FxHashMap<Atom, ScopeEntry> = FxHashMap::default();

        let mut primitive = |interner: &mut Interner,
                             symbols: &mut SymbolArena,
                             globals: &mut FxHashMap<Atom, ScopeEntry>,
                             name: &str,
                             named_in_scope: bool| {
            let atom = interner.intern(name);
            let id = symbols.alloc(atom, SymbolKind::Primitive, 0);
            if named_in_scope {
                globals.entry(atom).or_default().ty = Some(id);
            }
            id
        };

        let any = primitive(&mut interner, &mut symbols, &mut globals, "any", true);
        let number = primitive(&mut interner, &mut symbols, &mut globals, "number", true);
        let string = primitive(&mut interner, &mut symbols, &mut globals, "string", true);
        let boolean = primitive(&mut interner, &mut symbols, &mut globals, "boolean", true);
        let void = primitive(&mut interner, &mut symbols, &mut globals, "void", true);
        // null/undefined are expression keywords, not nameable types.
        let null = primitive(&mut interner, &mut symbols, &mut globals, "null", false);
        let undefined = primitive(&mut interner, &mut symbols, &mut globals, "undefined", false);

        let error_atom = interner.intern("{error}");
        let error = symbols.alloc(error_atom, SymbolKind::ErrorType, 0);

        SemanticChain {
            interner,
            symbols,
            records: IndexMap::new(),
            primitives: PrimitiveSymbols {
                any,
                number,
                string,
                boolean,
                void,
                null,
                undefined,
                error,
            },
            globals,
            path_index: None,
            array_types: FxHashMap::default(),
            bind_pass: 0,
        }
    }

    /// The interned array-of-`element` type symbol, created on first use.
    pub fn array_type_of(&mut self, element: SymbolId) -> SymbolId {
        if let Some(&existing) = self.array_types.get(&element) {
            return existing;
        }
        let name = self.interner.intern("[]");
        let array = self
            .symbols
            .alloc(name, SymbolKind::Array, symbol_flags::SYNTHESIZED);
        self.symbols.add_link(array, element, LinkKind::TypeArgument);
        if let Some(s) = self.symbols.get_mut(array) {
            s.state = ResolutionState::Resolved;
            s.symbol_type = Some(array);
        }
        self.array_types.insert(element, array);
        array
    }

    /// Find a record by its interned unit atom.
    pub fn record_by_atom(&self, unit: Atom) -> Option<&SemanticRecord> {
        self.records.values().find(|r| r.unit == unit)
    }

    // -------------------------------------------------------------------------
    // Unit registry
    // -------------------------------------------------------------------------

    pub fn add_unit(&mut self, record: SemanticRecord) {
        debug!(path = %record.path, "add unit");
        self.records.insert(record.path.clone(), record);
        self.invalidate_path_index();
    }

    pub fn get_unit(&self, path: &str) -> Option<&SemanticRecord> {
        self.records.get(path)
    }

    pub fn get_unit_mut(&mut self, path: &str) -> Option<&mut SemanticRecord> {
        self.records.get_mut(path)
    }

    /// Atomically replace a unit's record. The old record is returned for
    /// diffing; no partially-updated state is ever observable because the
    /// slot swap is a single map insert over the existing key.
    pub fn update_unit(&mut self, new_record: SemanticRecord) -> Option<SemanticRecord> {
        let old = self.records.insert(new_record.path.clone(), new_record);
        self.invalidate_path_index();
        old
    }

    /// Drop cached resolution state for one unit (diagnostics, expression
    /// cache, checked flag).
    pub fn invalidate_unit(&mut self, path: &str) {
        if let Some(record) = self.records.get_mut(path) {
            record.on_types_invalidated();
        }
    }

    pub fn unit_count(&self) -> usize {
        self.records.len()
    }

    // -------------------------------------------------------------------------
    // Cross-unit path lookup
    // -------------------------------------------------------------------------

    /// Find decls matching a declaration path (`["M", "Point"]`) across
    /// all units, optionally filtered by kind.
    pub fn find_decls(&mut self, path: &[Atom], kind: Option<DeclKind>) -> Vec<PathTarget> {
        self.ensure_path_index();
        let index = self.path_index.as_ref().expect("just built");
        index
            .get(path)
            .map(|targets| {
                targets
                    .iter()
                    .filter(|t| kind.is_none_or(|k| t.kind == k))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find the symbol bound for a declaration path, if any decl on that
    /// path has been bound.
    pub fn find_symbol(&mut self, path: &[Atom], kind: Option<DeclKind>) -> Option<SymbolId> {
        self.find_decls(path, kind)
            .into_iter()
            .find_map(|t| t.symbol)
    }

    /// Throw away the decl-path index; the next lookup rebuilds it.
    pub fn invalidate_path_index(&mut self) {
        self.path_index = None;
    }

    fn ensure_path_index(&mut self) {
        if self.path_index.is_some() {
            return;
        }
        let mut index: FxHashMap<Vec<Atom>, Vec<PathTarget>> = FxHashMap::default();
        for record in self.records.values() {
            for decl in record.decl_tree.arena.iter() {
                if decl.name.is_none() {
                    continue;
                }
                let path = record.decl_tree.arena.name_path(decl.id);
                index.entry(path).or_default().push(PathTarget {
                    unit: record.unit,
                    decl: decl.id,
                    kind: decl.kind,
                    symbol: decl.symbol,
                });
            }
        }
        debug!(entries = index.len(), "rebuilt decl path index");
        self.path_index = Some(index);
    }

    // -------------------------------------------------------------------------
    // Global scope
    // -------------------------------------------------------------------------

    pub fn global_entry(&self, name: Atom) -> Option<ScopeEntry> {
        self.globals.get(&name).copied()
    }

    pub fn global_value(&self, name: Atom) -> Option<SymbolId> {
        self.globals.get(&name).and_then(|e| e.value)
    }

    pub fn global_type(&self, name: Atom) -> Option<SymbolId> {
        self.globals.get(&name).and_then(|e| e.ty)
    }

    /// Start a bind pass; returns the stamp for `Symbol::last_bound`.
    pub fn next_bind_pass(&mut self) -> u32 {
        self.bind_pass += 1;
        self.bind_pass
    }
}
