//! Compiler facade.
//!
//! Orchestrates documents, decl building, binding, diffing, graph update,
//! checking, and the editor point-queries. One facade is one program; the
//! whole surface is synchronous and single-threaded: callers must not
//! interleave two updates to the same compiler (the single-threaded
//! contract is the concurrency discipline, no internal locking exists).
//!
//! Unit lifecycle: Unbound -> Bound -> TypeChecked. An incremental update
//! moves the edited unit (and every unit its change invalidated) back to
//! Bound without discarding unaffected units' resolved state.

use crate::bind::{RebindMap, bind_unit};
use crate::decl::{Decl, DeclTreeBuilder, diff_decls};
use crate::diagnostics::{Diagnostic, DiagnosticBag, format_message};
use crate::document::{Document, SourceParser};
use crate::position::{self, PositionInfo};
use crate::resolve::{CallInfo, Resolver};
use crate::semantic::{SemanticChain, SemanticRecord, UnitState};
use crate::span::{Span, TextChangeRange};
use crate::symbols::SymbolId;
use crate::syntax::NodeIndex;
use crate::update::GraphUpdater;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Debug, Default)]
pub struct CompilerOptions {
    /// Keep closed units' syntax trees on their documents (they are
    /// always retained on the semantic records). Off by default to bound
    /// memory.
    pub retain_closed_unit_trees: bool,
}

pub struct Compiler {
    pub options: CompilerOptions,
    parser: Box<dyn SourceParser>,
    pub documents: IndexMap<String, Document>,
    pub chain: SemanticChain,
    /// Structural/configuration errors: zero-location, not per-unit.
    config_diagnostics: DiagnosticBag,
}

impl Compiler {
    pub fn new(options: CompilerOptions, parser: Box<dyn SourceParser>) -> Compiler {
        Compiler {
            options,
            parser,
            documents: IndexMap::new(),
            chain: SemanticChain::new(),
            config_diagnostics: DiagnosticBag::new(),
        }
    }

    // =========================================================================
    // Unit registration and update
    // =========================================================================

    /// Submit a new source unit. Parsing happens now; binding is pulled
    /// lazily by the first type check or query.
    pub fn add_source_unit(
        &mut self,
        path: &str,
        text: String,
        version: u32,
        is_open: bool,
        referenced_files: Vec<String>,
    ) -> &Document {
        info!(path, version, "add source unit");
        let mut document = Document::new(
            &*self.parser,
            path.to_string(),
            text,
            version,
            is_open,
            referenced_files,
        );
        let record = self.build_record(&document);
        self.chain.add_unit(record);
        if !self.options.retain_closed_unit_trees {
            document.release_tree();
        }
        self.documents.insert(path.to_string(), document);
        self.documents.get(path).expect("just inserted")
    }

    /// Re-submit an edited unit and run the incremental path: re-parse,
    /// decl diff, atomic record swap, rebind, graph update.
    pub fn update_source_unit(
        &mut self,
        path: &str,
        text: String,
        version: u32,
        is_open: bool,
        change_range: Option<TextChangeRange>,
    ) -> Option<&Document> {
        let old_document = match self.documents.get(path) {
            Some(document) => document,
            None => {
                self.config_diagnostics.add(Diagnostic::error(
                    path,
                    Span::ZERO,
                    format_message("File '{0}' not found.", &[path]),
                    6053,
                ));
                return None;
            }
        };
        info!(path, version, "update source unit");
        let mut document =
            old_document.update(&*self.parser, text, version, is_open, change_range);
        let new_record = self.build_record(&document);

        // Diff old against new before the swap; both trees are alive.
        let (diffs, rebind_map) = {
            let old_record = self.chain.get_unit(path).expect("unit was added");
            let diffs = diff_decls(
                &old_record.decl_tree,
                &old_record.syntax.arena,
                &new_record.decl_tree,
                &new_record.syntax.arena,
            );
            (diffs, RebindMap::harvest(old_record))
        };
        debug!(path, diff_count = diffs.len(), "incremental update");

        // Atomic swap; no partially-updated record is observable.
        let old_record = self
            .chain
            .update_unit(new_record)
            .expect("old record existed");

        // Reconnect surviving symbols, then apply the edits.
        bind_unit(&mut self.chain, path, Some(&rebind_map));
        GraphUpdater::new(&mut self.chain).apply(&old_record, &diffs);

        if !self.options.retain_closed_unit_trees {
            document.release_tree();
        }
        self.documents.insert(path.to_string(), document);
        self.documents.get(path)
    }

    fn build_record(&mut self, document: &Document) -> SemanticRecord {
        let syntax: Arc<crate::syntax::SyntaxTree> = document
            .syntax()
            .cloned()
            .expect("document was just parsed");
        let unit = self.chain.interner.intern(&document.path);
        let decl_tree =
            DeclTreeBuilder::build(&syntax.arena, syntax.root, unit, &mut self.chain.interner);
        SemanticRecord::new(document.path.clone(), unit, syntax, decl_tree)
    }

    // =========================================================================
    // Binding and checking
    // =========================================================================

    /// Bind every still-unbound unit, in submission order.
    fn ensure_all_bound(&mut self) {
        let unbound: Vec<String> = self
            .chain
            .records
            .values()
            .filter(|r| r.state == UnitState::Unbound)
            .map(|r| r.path.clone())
            .collect();
        for path in unbound {
            bind_unit(&mut self.chain, &path, None);
        }
    }

    /// Full pull pass: decl trees and binding for every unit, then
    /// semantic diagnostics per unit. Already-checked units are not
    /// re-checked.
    pub fn pull_type_check(&mut self) {
        self.ensure_all_bound();
        let paths: Vec<String> = self.chain.records.keys().cloned().collect();
        for path in paths {
            let needs_check = self
                .chain
                .get_unit(&path)
                .is_some_and(|r| r.state != UnitState::TypeChecked);
            if needs_check {
                let mut resolver = Resolver::new(&mut self.chain);
                resolver.check_unit(&path);
            }
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub fn get_syntactic_diagnostics(&self, path: &str) -> Vec<Diagnostic> {
        self.documents
            .get(path)
            .map(|d| d.parse_diagnostics().to_vec())
            .unwrap_or_default()
    }

    /// Semantic diagnostics for one unit, forcing resolution of its
    /// decls. Repeated calls without intervening edits return the same
    /// list in the same order.
    pub fn get_semantic_diagnostics(&mut self, path: &str) -> Vec<Diagnostic> {
        self.ensure_all_bound();
        let needs_check = self
            .chain
            .get_unit(path)
            .is_some_and(|r| r.state != UnitState::TypeChecked);
        if needs_check {
            let mut resolver = Resolver::new(&mut self.chain);
            resolver.check_unit(path);
        }
        self.chain
            .get_unit(path)
            .map(|r| r.get_diagnostics())
            .unwrap_or_default()
    }

    /// Structural/configuration errors (unknown unit paths and the
    /// like): zero-location, kept apart from per-unit records.
    pub fn get_configuration_diagnostics(&self) -> &[Diagnostic] {
        self.config_diagnostics.diagnostics()
    }

    // =========================================================================
    // Point queries
    // =========================================================================

    /// Resolve the symbol at a text offset.
    pub fn resolve_position(&mut self, path: &str, offset: u32) -> PositionInfo {
        self.ensure_all_bound();
        position::resolve_position(&mut self.chain, path, offset)
    }

    /// Resolve the symbol at an explicit root-to-leaf AST path.
    pub fn pull_get_symbol_information_from_path(
        &mut self,
        path: &str,
        nodes: &[NodeIndex],
    ) -> PositionInfo {
        self.ensure_all_bound();
        position::resolve_ast_path(&mut self.chain, path, nodes)
    }

    /// Resolve the call at (or enclosing) an AST path's leaf.
    pub fn pull_get_call_information_from_path(
        &mut self,
        path: &str,
        nodes: &[NodeIndex],
    ) -> Option<CallInfo> {
        self.ensure_all_bound();
        position::call_info_from_path(&mut self.chain, path, nodes)
    }

    /// Names visible from the path's leaf, inner scopes first.
    pub fn pull_get_visible_symbols_from_path(
        &mut self,
        path: &str,
        nodes: &[NodeIndex],
    ) -> Vec<SymbolId> {
        self.ensure_all_bound();
        position::visible_symbols_from_path(&mut self.chain, path, nodes)
    }

    /// Members offered by the contextual type at the path's leaf.
    pub fn pull_get_contextual_members_from_path(
        &mut self,
        path: &str,
        nodes: &[NodeIndex],
    ) -> Vec<SymbolId> {
        self.ensure_all_bound();
        position::contextual_members_from_path(&mut self.chain, path, nodes)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// The unit's top-level declarations.
    pub fn get_top_level_declarations(&self, path: &str) -> Vec<&Decl> {
        self.chain
            .get_unit(path)
            .map(|record| {
                record
                    .top_level_decls()
                    .into_iter()
                    .filter_map(|id| record.decl_tree.arena.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn document(&self, path: &str) -> Option<&Document> {
        self.documents.get(path)
    }
}
