//! Versioned source units and the external parser contract.
//!
//! A `Document` pairs a unit's text with its parsed tree. Open units (the
//! ones an editor is actively changing) retain their tree so the parser can
//! re-parse incrementally against a change range; closed units drop the
//! tree after semantic structures are extracted and keep only the cached
//! parse diagnostics to bound memory.

use crate::diagnostics::Diagnostic;
use crate::span::TextChangeRange;
use crate::syntax::SyntaxTree;
use std::sync::Arc;
use tracing::debug;

/// The external parser this core builds on. Implementations turn text into
/// a `SyntaxTree`; the semantic core never looks at source text itself.
pub trait SourceParser {
    fn parse(&self, path: &str, text: &str) -> SyntaxTree;

    /// Re-parse after an edit described by `change`. Implementations may
    /// reuse unchanged regions of `old`; a full re-parse of `new_text` is a
    /// correct (if slower) implementation.
    fn incremental_parse(
        &self,
        old: &SyntaxTree,
        change: TextChangeRange,
        path: &str,
        new_text: &str,
    ) -> SyntaxTree;
}

/// One versioned submission of a source unit.
///
/// Documents are immutable: `update` produces a replacement and the old
/// one is discarded by the compiler.
pub struct Document {
    pub path: String,
    pub text: String,
    pub version: u32,
    pub is_open: bool,
    /// Units this one references, in submission order.
    pub referenced_files: Vec<String>,
    /// Retained for open units only.
    syntax: Option<Arc<SyntaxTree>>,
    /// Cached parse diagnostics; survives the tree for closed units.
    parse_diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Parse `text` and create the first document for a unit.
    pub fn new(
        parser: &dyn SourceParser,
        path: String,
        text: String,
        version: u32,
        is_open: bool,
        referenced_files: Vec<String>,
    ) -> Document {
        let tree = parser.parse(&path, &text);
        Document::from_tree(path, text, version, is_open, referenced_files, tree)
    }

    fn from_tree(
        path: String,
        text: String,
        version: u32,
        is_open: bool,
        referenced_files: Vec<String>,
        tree: SyntaxTree,
    ) -> Document {
        let parse_diagnostics = tree.diagnostics.clone();
        Document {
            path,
            text,
            version,
            is_open,
            referenced_files,
            syntax: Some(Arc::new(tree)),
            parse_diagnostics,
        }
    }

    /// Produce the replacement document for an edit.
    ///
    /// Chooses an incremental re-parse when this document still holds its
    /// tree and the caller supplied a change range; otherwise re-parses
    /// from scratch.
    pub fn update(
        &self,
        parser: &dyn SourceParser,
        text: String,
        version: u32,
        is_open: bool,
        change: Option<TextChangeRange>,
    ) -> Document {
        let tree = match (self.syntax.as_ref(), change) {
            (Some(old), Some(change)) => {
                debug!(path = %self.path, ?change, "incremental re-parse");
                parser.incremental_parse(old, change, &self.path, &text)
            }
            _ => {
                debug!(path = %self.path, "full re-parse");
                parser.parse(&self.path, &text)
            }
        };
        Document::from_tree(
            self.path.clone(),
            text,
            version,
            is_open,
            self.referenced_files.clone(),
            tree,
        )
    }

    /// The retained syntax tree. `None` after `release_tree` on a closed
    /// unit.
    pub fn syntax(&self) -> Option<&Arc<SyntaxTree>> {
        self.syntax.as_ref()
    }

    pub fn parse_diagnostics(&self) -> &[Diagnostic] {
        &self.parse_diagnostics
    }

    /// Drop the retained tree for a closed unit. The parse diagnostics
    /// stay cached. No-op for open units, which need the tree for
    /// incremental re-parse.
    pub fn release_tree(&mut self) {
        if !self.is_open {
            self.syntax = None;
        }
    }
}
