//! Semantic core of a batch-and-incremental compiler for a statically,
//! structurally typed scripting language.
//!
//! Parsed syntax trees go in; out comes a durable graph of declarations
//! and symbols that is resolved on demand (the pull model) and kept
//! consistent as individual units are edited and re-submitted, without a
//! whole-program re-check per edit. Point queries (symbol at offset, call
//! info at an AST path) back interactive tooling.
//!
//! Lexing/parsing, AST lowering, emission, and the full type-relationship
//! lattice are external collaborators; see `document::SourceParser` for
//! the parser contract.

// String interning for decl/symbol names
pub mod interner;
pub use interner::{Atom, Interner};

// Source spans and text change ranges
pub mod span;
pub use span::{Span, TextChangeRange};

// Diagnostic records and collection
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity};

// AST data model (arena, node enum, parsed-tree container)
pub mod syntax;
pub use syntax::{Node, NodeArena, NodeIndex, SyntaxTree};

// Versioned source units and the external parser contract
pub mod document;
pub use document::{Document, SourceParser};

// Declaration trees: builder and structural differ
pub mod decl;
pub use decl::{Decl, DeclDiff, DeclId, DeclKind, DeclTree, DeclTreeBuilder, DiffKind, diff_decls};

// Symbols and the typed link graph
pub mod symbols;
pub use symbols::{LinkKind, ResolutionState, Symbol, SymbolArena, SymbolId, SymbolKind, SymbolLink};

// Per-unit records and the chain-of-units registry
pub mod semantic;
pub use semantic::{SemanticChain, SemanticRecord, UnitState};

// Symbol binder
pub mod bind;
pub use bind::{RebindMap, bind_unit};

// Graph updater (diff application, invalidation propagation)
pub mod update;
pub use update::GraphUpdater;

// Pull resolver, resolution context, semantic checking
pub mod resolve;
pub use resolve::{CallInfo, ResolutionContext, Resolver};

// Path/position contextual resolution
pub mod position;
pub use position::PositionInfo;

// Compiler facade
pub mod compiler;
pub use compiler::{Compiler, CompilerOptions};

// Tracing setup (SEMA_LOG)
pub mod tracing_config;

// Shared test fixtures (mini source parser for tests)
#[cfg(test)]
#[path = "tests/fixtures.rs"]
pub mod fixtures;

#[cfg(test)]
#[path = "tests/decl_builder_tests.rs"]
mod decl_builder_tests;

#[cfg(test)]
#[path = "tests/diff_tests.rs"]
mod diff_tests;

#[cfg(test)]
#[path = "tests/binder_tests.rs"]
mod binder_tests;

#[cfg(test)]
#[path = "tests/update_tests.rs"]
mod update_tests;

#[cfg(test)]
#[path = "tests/position_tests.rs"]
mod position_tests;

#[cfg(test)]
#[path = "tests/compiler_tests.rs"]
mod compiler_tests;
