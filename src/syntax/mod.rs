//! AST data model: node definitions, arena storage, and the parsed-tree
//! container handed over by the external parser.

pub mod arena;
pub mod ast;
pub mod base;

pub use arena::NodeArena;
pub use ast::Node;
pub use base::{NodeBase, NodeIndex, node_flags};

use crate::diagnostics::Diagnostic;

/// A parsed unit: the arena, the root `SourceUnit` node, and the parse
/// diagnostics. Produced by a `SourceParser`, consumed by the semantic
/// core.
#[derive(Debug)]
pub struct SyntaxTree {
    pub arena: NodeArena,
    pub root: NodeIndex,
    pub diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    pub fn new(arena: NodeArena, root: NodeIndex, diagnostics: Vec<Diagnostic>) -> SyntaxTree {
        SyntaxTree {
            arena,
            root,
            diagnostics,
        }
    }
}
