//! The per-unit semantic record and the chain-of-units registry.

pub mod chain;
pub mod record;

pub use chain::{PathTarget, PrimitiveSymbols, ScopeEntry, SemanticChain};
pub use record::{SemanticRecord, UnitState};
