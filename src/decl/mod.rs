//! Declaration trees: the per-unit `Decl` records, the AST-to-decl
//! builder, and the structural differ driving incremental updates.

pub mod builder;
#[allow(clippy::module_inception)]
pub mod decl;
pub mod diff;

pub use builder::{DeclTree, DeclTreeBuilder};
pub use decl::{Decl, DeclArena, DeclId, DeclKind, decl_flags};
pub use diff::{DeclDiff, DiffKind, diff_decls};
