//! Pull-model type resolution.
//!
//! Types are computed when first queried, never eagerly during binding.
//! Every computation runs behind the symbol's three-state resolution
//! machine: a symbol found `Resolving` short-circuits to the error type
//! instead of recursing, which is the only cycle breaker; call-stack
//! depth is never relied on.
//!
//! The detailed type-relationship lattice is out of scope here; the
//! compatibility relation is the minimal one the graph needs (identity,
//! `any`/error, null/undefined widening, heritage walks, and a shallow
//! structural check for object literals).

use crate::decl::{DeclId, DeclKind};
use crate::diagnostics::{Diagnostic, format_message};
use crate::interner::Atom;
use crate::resolve::context::ResolutionContext;
use crate::semantic::SemanticChain;
use crate::span::Span;
use crate::symbols::{
    DeclRef, LinkKind, ResolutionState, SymbolId, SymbolKind, symbol_flags,
};
use crate::syntax::{Node, NodeIndex, SyntaxTree};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::trace;

/// The outcome of resolving a call or constructor-call expression.
#[derive(Clone, Debug)]
pub struct CallInfo {
    /// The true callee symbol (distinct from a variable merely holding
    /// the callable).
    pub target: SymbolId,
    /// Every candidate signature of the callee.
    pub signatures: Vec<SymbolId>,
    /// The signature the call resolved against, if any applied.
    pub best: Option<SymbolId>,
    pub is_constructor: bool,
    /// The call expression's type: the chosen signature's return type.
    pub result_type: SymbolId,
}

pub struct Resolver<'a> {
    pub chain: &'a mut SemanticChain,
    pub ctx: ResolutionContext,
}

impl<'a> Resolver<'a> {
    pub fn new(chain: &'a mut SemanticChain) -> Resolver<'a> {
        Resolver {
            chain,
            ctx: ResolutionContext::new(),
        }
    }

    fn syntax_of(&self, path: &str) -> Option<Arc<SyntaxTree>> {
        self.chain.records.get(path).map(|r| r.syntax.clone())
    }

    fn unit_atom(&self, path: &str) -> Atom {
        self.chain
            .records
            .get(path)
            .map(|r| r.unit)
            .unwrap_or(Atom::NONE)
    }

    /// Report into the unit's check diagnostics, honoring provisional
    /// frames.
    pub(crate) fn report(&mut self, path: &str, span: Span, message: String, code: u32) {
        let diagnostic = Diagnostic::error(path, span, message, code);
        if let Some(record) = self.chain.records.get_mut(path) {
            self.ctx.report(diagnostic, &mut record.check_diagnostics);
        }
    }

    fn cache(&mut self, path: &str, node: NodeIndex, symbol: SymbolId) {
        // Speculative resolutions must stay revertible; only committed
        // paths may populate the identity cache.
        if self.ctx.is_provisional() {
            return;
        }
        if let Some(record) = self.chain.records.get_mut(path) {
            record.set_symbol_for_ast(node, symbol);
        }
    }

    /// The decl site backing a symbol: owning unit path, its tree, and
    /// the decl/AST pair. Symbols synthesized by resolution have none.
    fn decl_site(&self, symbol: SymbolId) -> Option<(String, Arc<SyntaxTree>, DeclId, NodeIndex)> {
        let decl_ref = self.chain.symbols.get(symbol)?.decls.first().copied()?;
        self.site_of(decl_ref)
    }

    fn site_of(&self, decl_ref: DeclRef) -> Option<(String, Arc<SyntaxTree>, DeclId, NodeIndex)> {
        if decl_ref.decl.is_none() {
            return None;
        }
        let record = self.chain.record_by_atom(decl_ref.unit)?;
        let ast = record.decl_tree.arena.get(decl_ref.decl)?.ast;
        Some((
            record.path.clone(),
            record.syntax.clone(),
            decl_ref.decl,
            ast,
        ))
    }

    // =========================================================================
    // Symbol type resolution
    // =========================================================================

    /// The type of a symbol, computed on first query and cached until
    /// invalidated. A symbol already `Resolving` yields the error type
    /// (cycle guard).
    pub fn type_of_symbol(&mut self, symbol: SymbolId) -> SymbolId {
        let error = self.chain.primitives.error;
        let (state, kind) = match self.chain.symbols.get(symbol) {
            Some(s) => (s.state, s.kind),
            None => return error,
        };
        match state {
            ResolutionState::Resolved => {
                return self
                    .chain
                    .symbols
                    .get(symbol)
                    .and_then(|s| s.symbol_type)
                    .unwrap_or(error);
            }
            ResolutionState::Resolving => {
                trace!(symbol = symbol.0, "cycle short-circuit");
                return error;
            }
            ResolutionState::Unresolved => {}
        }

        if let Some(s) = self.chain.symbols.get_mut(symbol) {
            s.state = ResolutionState::Resolving;
        }

        let computed = match kind {
            SymbolKind::Primitive
            | SymbolKind::ErrorType
            | SymbolKind::TypeParameter
            | SymbolKind::Module
            | SymbolKind::Array => symbol,
            SymbolKind::Class | SymbolKind::Interface => {
                self.ensure_heritage(symbol);
                symbol
            }
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Accessor => {
                for sig in self.chain.symbols.outs(symbol, LinkKind::CallSignature) {
                    self.type_of_symbol(sig);
                }
                symbol
            }
            SymbolKind::Signature => self.resolve_signature(symbol),
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Property => {
                self.resolve_value_decl(symbol)
            }
            // An orphaned expression symbol (invalidated call site); a
            // fresh resolution of the AST node replaces it.
            SymbolKind::Expression => error,
        };

        if let Some(s) = self.chain.symbols.get_mut(symbol) {
            s.state = ResolutionState::Resolved;
            s.symbol_type = Some(computed);
        }
        trace!(symbol = symbol.0, ty = computed.0, "resolved");
        computed
    }

    /// Resolve parameter and return types of a signature; the signature's
    /// own type is its return type.
    fn resolve_signature(&mut self, signature: SymbolId) -> SymbolId {
        let any = self.chain.primitives.any;
        for param in self.chain.symbols.outs(signature, LinkKind::Parameter) {
            self.type_of_symbol(param);
        }
        let site = self.decl_site(signature);
        let return_type = match site {
            Some((path, syntax, _, ast)) => {
                let annotation = match syntax.arena.get(ast) {
                    Some(Node::FunctionDecl(func)) => func.return_type,
                    Some(Node::MethodMember(method)) => method.return_type,
                    Some(Node::GetAccessor(get)) => get.return_type,
                    Some(Node::CallSignatureMember(sig)) => sig.return_type,
                    Some(Node::ConstructSignatureMember(sig)) => sig.return_type,
                    Some(Node::IndexSignatureMember(sig)) => sig.return_type,
                    Some(Node::ArrowFunction(arrow)) => arrow.return_type,
                    // Constructors and set accessors return nothing.
                    _ => NodeIndex::NONE,
                };
                if annotation.is_some() {
                    self.resolve_type_annotation(&path, &syntax, annotation, false)
                } else {
                    any
                }
            }
            None => any,
        };
        if self
            .chain
            .symbols
            .first_out(signature, LinkKind::ReturnType)
            != Some(return_type)
        {
            self.chain
                .symbols
                .remove_out_links(signature, |k| k == LinkKind::ReturnType);
            if self.chain.symbols.contains(return_type) {
                self.chain
                    .symbols
                    .add_link(signature, return_type, LinkKind::ReturnType);
            }
        }
        return_type
    }

    /// Resolve the declared or inferred type of a variable, parameter, or
    /// property symbol.
    fn resolve_value_decl(&mut self, symbol: SymbolId) -> SymbolId {
        let any = self.chain.primitives.any;
        let site = match self.decl_site(symbol) {
            Some(site) => site,
            None => return any,
        };
        let (path, syntax, _, ast) = site;
        let (annotation, initializer) = match syntax.arena.get(ast) {
            Some(Node::VariableDecl(var)) => (var.type_annotation, var.initializer),
            Some(Node::ParameterDecl(param)) => (param.type_annotation, NodeIndex::NONE),
            Some(Node::PropertyMember(prop)) => (prop.type_annotation, prop.initializer),
            // The catch variable is anchored on its identifier.
            Some(Node::Identifier(_)) => (NodeIndex::NONE, NodeIndex::NONE),
            _ => (NodeIndex::NONE, NodeIndex::NONE),
        };

        if annotation.is_some() {
            let ty = self.resolve_type_annotation(&path, &syntax, annotation, false);
            self.set_type_link(symbol, ty, LinkKind::TypedAs);
            return ty;
        }
        if initializer.is_some() {
            let init_symbol = self.resolve_expr(&path, initializer);
            let ty = self.type_of_symbol(init_symbol);
            self.set_type_link(symbol, ty, LinkKind::ProvidesInferredType);
            return ty;
        }
        any
    }

    fn set_type_link(&mut self, symbol: SymbolId, ty: SymbolId, kind: LinkKind) {
        self.chain
            .symbols
            .remove_out_links(symbol, |k| k == LinkKind::TypedAs || k == LinkKind::ProvidesInferredType);
        if self.chain.symbols.contains(ty) {
            self.chain.symbols.add_link(symbol, ty, kind);
        }
    }

    /// Complete Extends/Implements links the binder could not wire (the
    /// heritage name lived in a unit bound later).
    fn ensure_heritage(&mut self, symbol: SymbolId) {
        let decl_refs: Vec<DeclRef> = self
            .chain
            .symbols
            .get(symbol)
            .map(|s| s.decls.to_vec())
            .unwrap_or_default();
        for decl_ref in decl_refs {
            let (path, syntax, _, ast) = match self.site_of(decl_ref) {
                Some(site) => site,
                None => continue,
            };
            let (extends, implements): (Vec<NodeIndex>, Vec<NodeIndex>) =
                match syntax.arena.get(ast) {
                    Some(Node::ClassDecl(class)) => {
                        (vec![class.extends], class.implements.clone())
                    }
                    Some(Node::InterfaceDecl(interface)) => {
                        (interface.extends.clone(), Vec::new())
                    }
                    _ => continue,
                };
            for (clauses, kind) in
                [(extends, LinkKind::Extends), (implements, LinkKind::Implements)]
            {
                for clause in clauses {
                    if clause.is_none() {
                        continue;
                    }
                    let target = self.resolve_type_annotation(&path, &syntax, clause, false);
                    if target != symbol
                        && target != self.chain.primitives.error
                        && self.chain.symbols.contains(target)
                    {
                        let exists = self
                            .chain
                            .symbols
                            .out_links(symbol)
                            .iter()
                            .any(|l| l.kind == kind && l.end == target);
                        if !exists {
                            self.chain.symbols.add_link(symbol, target, kind);
                        }
                    }
                }
            }
        }
    }

    // =========================================================================
    // Type annotations
    // =========================================================================

    /// Resolve a type annotation node to a type symbol. With `report`,
    /// unknown names produce a 2304 diagnostic; resolution triggered from
    /// `type_of_symbol` stays silent and the check pass re-derives the
    /// diagnostics deterministically.
    pub fn resolve_type_annotation(
        &mut self,
        path: &str,
        syntax: &SyntaxTree,
        idx: NodeIndex,
        report: bool,
    ) -> SymbolId {
        let any = self.chain.primitives.any;
        let error = self.chain.primitives.error;
        match syntax.arena.get(idx) {
            Some(Node::TypeRef(type_ref)) => {
                let span = type_ref.base.span;
                let segments = type_ref.segments.clone();
                let mut current = match segments.first() {
                    Some(first) => {
                        let atom = self.chain.interner.intern(first);
                        match self.lookup_name(path, idx, atom, true) {
                            Some(symbol) => symbol,
                            None => {
                                if report {
                                    self.report(
                                        path,
                                        span,
                                        format_message("Cannot find name '{0}'.", &[first]),
                                        2304,
                                    );
                                }
                                return error;
                            }
                        }
                    }
                    None => return any,
                };
                for segment in &segments[1..] {
                    let atom = self.chain.interner.intern(segment);
                    match self.chain.symbols.find_member(current, atom) {
                        Some(member) => current = member,
                        None => {
                            if report {
                                let container = self.type_display_name(current);
                                self.report(
                                    path,
                                    span,
                                    format_message(
                                        "Property '{0}' does not exist on type '{1}'.",
                                        &[segment, &container],
                                    ),
                                    2339,
                                );
                            }
                            return error;
                        }
                    }
                }
                current
            }
            Some(Node::ArrayType(array)) => {
                let element = self.resolve_type_annotation(path, syntax, array.element, report);
                self.chain.array_type_of(element)
            }
            _ => any,
        }
    }

    // =========================================================================
    // Name lookup
    // =========================================================================

    /// Innermost decl whose AST subtree contains `node`, found by walking
    /// parent links.
    pub fn enclosing_decl(&self, path: &str, node: NodeIndex) -> Option<DeclId> {
        let record = self.chain.records.get(path)?;
        let mut current = node;
        while current.is_some() {
            if let Some(decl) = record.get_decl_for_ast(current) {
                return Some(decl);
            }
            current = record.syntax.arena.parent(current);
        }
        None
    }

    /// Lexical name lookup from `from`'s position: enclosing decl scopes
    /// inner to outer, then the chain-global scope. Class and interface
    /// members are not lexically visible.
    pub fn lookup_name(
        &self,
        path: &str,
        from: NodeIndex,
        name: Atom,
        type_space: bool,
    ) -> Option<SymbolId> {
        let record = self.chain.records.get(path)?;
        let mut scope = self.enclosing_decl(path, from);
        while let Some(scope_id) = scope {
            let decl = record.decl_tree.arena.get(scope_id)?;
            if !matches!(decl.kind, DeclKind::Class | DeclKind::Interface) {
                for &child_id in &decl.children {
                    let child = match record.decl_tree.arena.get(child_id) {
                        Some(child) => child,
                        None => continue,
                    };
                    if child.name == name && kind_in_space(child.kind, type_space) {
                        if let Some(symbol) = child.symbol {
                            return Some(symbol);
                        }
                    }
                }
            }
            scope = if decl.parent.is_none() {
                None
            } else {
                Some(decl.parent)
            };
        }
        if type_space {
            self.chain.global_type(name)
        } else {
            self.chain
                .global_value(name)
                .or_else(|| self.builtin_value(name))
        }
    }

    /// `undefined`/`null` resolve as values without being declared.
    fn builtin_value(&self, name: Atom) -> Option<SymbolId> {
        let text = self.chain.interner.resolve(name);
        match text {
            "undefined" => Some(self.chain.primitives.undefined),
            "null" => Some(self.chain.primitives.null),
            _ => None,
        }
    }

    // =========================================================================
    // Expression resolution
    // =========================================================================

    /// Resolve an expression node to its symbol. Identifiers yield the
    /// referenced symbol; literals yield primitives; calls and literals
    /// with structure yield synthesized expression symbols. Results are
    /// cached per node (identity-stable until invalidation) unless a
    /// provisional frame is open.
    pub fn resolve_expr(&mut self, path: &str, node: NodeIndex) -> SymbolId {
        let error = self.chain.primitives.error;
        if let Some(record) = self.chain.records.get(path) {
            if let Some(cached) = record.get_symbol_for_ast(node) {
                if self.chain.symbols.contains(cached) {
                    return cached;
                }
            }
        }
        let syntax = match self.syntax_of(path) {
            Some(syntax) => syntax,
            None => return error,
        };
        let node_ref = match syntax.arena.get(node) {
            Some(node_ref) => node_ref,
            None => return error,
        };

        let symbol = match node_ref {
            Node::NumberLit(_) => self.chain.primitives.number,
            Node::StringLit(_) => self.chain.primitives.string,
            Node::BoolLit(_) => self.chain.primitives.boolean,
            Node::NullLit(_) => self.chain.primitives.null,
            Node::Identifier(ident) => {
                let name = ident.name.clone();
                let span = ident.base.span;
                let atom = self.chain.interner.intern(&name);
                match self.lookup_name(path, node, atom, false) {
                    Some(symbol) => symbol,
                    None => {
                        self.report(
                            path,
                            span,
                            format_message("Cannot find name '{0}'.", &[&name]),
                            2304,
                        );
                        error
                    }
                }
            }
            Node::PropertyAccess(access) => {
                let object = access.object;
                let name_node = access.name;
                let span = node_ref.base().span;
                self.resolve_property_access(path, &syntax, node, object, name_node, span)
            }
            Node::CallExpr(_) | Node::NewExpr(_) => {
                let info = self.resolve_call(path, node);
                return self.finish_call_site(path, node, &info);
            }
            Node::ObjectLit(obj) => {
                let properties = obj.properties.clone();
                self.resolve_object_literal(path, &syntax, node, &properties)
            }
            Node::ArrayLit(arr) => {
                let elements = arr.elements.clone();
                self.resolve_array_literal(path, &elements)
            }
            Node::AssignExpr(assign) => {
                let target = assign.target;
                let value = assign.value;
                let span = node_ref.base().span;
                let lhs = self.resolve_expr(path, target);
                let lhs_type = self.type_of_symbol(lhs);
                self.ctx.push_contextual_type(lhs_type);
                let rhs = self.resolve_expr(path, value);
                let rhs_type = self.type_of_symbol(rhs);
                self.ctx.pop_contextual_type();
                if !self.types_compatible(rhs_type, lhs_type) {
                    let source = self.type_display_name(rhs_type);
                    let target_name = self.type_display_name(lhs_type);
                    self.report(
                        path,
                        span,
                        format_message(
                            "Type '{0}' is not assignable to type '{1}'.",
                            &[&source, &target_name],
                        ),
                        2322,
                    );
                }
                lhs
            }
            Node::CastExpr(cast) => {
                let inner = cast.expression;
                let annotation = cast.type_annotation;
                let ty = self.resolve_type_annotation(path, &syntax, annotation, false);
                self.ctx.push_contextual_type(ty);
                self.resolve_expr(path, inner);
                self.ctx.pop_contextual_type();
                ty
            }
            Node::ArrowFunction(_) => self.resolve_arrow(path, node),
            _ => error,
        };
        self.cache(path, node, symbol);
        symbol
    }

    fn resolve_property_access(
        &mut self,
        path: &str,
        syntax: &SyntaxTree,
        node: NodeIndex,
        object: NodeIndex,
        name_node: NodeIndex,
        span: Span,
    ) -> SymbolId {
        let error = self.chain.primitives.error;
        let name = match syntax.arena.identifier_name(name_node) {
            Some(name) => name.to_string(),
            None => return error,
        };
        let atom = self.chain.interner.intern(&name);
        let object_symbol = self.resolve_expr(path, object);
        let object_type = self.type_of_symbol(object_symbol);
        if object_type == self.chain.primitives.any || object_type == error {
            return self.chain.primitives.any;
        }
        match self.find_member_deep(object_type, atom) {
            Some(member) => {
                self.cache(path, name_node, member);
                self.cache(path, node, member);
                member
            }
            None => {
                let on = self.type_display_name(object_type);
                self.report(
                    path,
                    span,
                    format_message(
                        "Property '{0}' does not exist on type '{1}'.",
                        &[&name, &on],
                    ),
                    2339,
                );
                error
            }
        }
    }

    /// Member lookup along `Member` links, walking the `Extends` chain.
    pub fn find_member_deep(&self, ty: SymbolId, name: Atom) -> Option<SymbolId> {
        let mut visited: FxHashSet<SymbolId> = FxHashSet::default();
        let mut stack = vec![ty];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(member) = self.chain.symbols.find_member(current, name) {
                return Some(member);
            }
            for base in self.chain.symbols.outs(current, LinkKind::Extends) {
                stack.push(base);
            }
        }
        None
    }

    fn resolve_object_literal(
        &mut self,
        path: &str,
        syntax: &SyntaxTree,
        node: NodeIndex,
        properties: &[NodeIndex],
    ) -> SymbolId {
        let contextual = self.ctx.contextual_type();
        let anon = self.synthesize_expression_symbol(path);
        for &prop_idx in properties {
            let (name_node, value) = match syntax.arena.get(prop_idx) {
                Some(Node::PropertyAssignment(prop)) => (prop.name, prop.value),
                _ => continue,
            };
            let name = match syntax.arena.identifier_name(name_node) {
                Some(name) => self.chain.interner.intern(name),
                None => Atom::NONE,
            };
            // Contextually typed: the property takes the type the target
            // member declares, and the value is resolved against it.
            let declared = contextual
                .and_then(|ct| self.find_member_deep(ct, name))
                .map(|member| self.type_of_symbol(member));
            let value_type = match declared {
                Some(member_type) => {
                    self.ctx.push_contextual_type(member_type);
                    let value_symbol = self.resolve_expr(path, value);
                    let value_type = self.type_of_symbol(value_symbol);
                    self.ctx.pop_contextual_type();
                    if !self.types_compatible(value_type, member_type) {
                        let source = self.type_display_name(value_type);
                        let target = self.type_display_name(member_type);
                        let span = syntax
                            .arena
                            .span(value)
                            .unwrap_or_default();
                        self.report(
                            path,
                            span,
                            format_message(
                                "Type '{0}' is not assignable to type '{1}'.",
                                &[&source, &target],
                            ),
                            2322,
                        );
                    }
                    member_type
                }
                None => {
                    let value_symbol = self.resolve_expr(path, value);
                    self.type_of_symbol(value_symbol)
                }
            };
            let property = self.chain.symbols.alloc(
                name,
                SymbolKind::Property,
                symbol_flags::SYNTHESIZED,
            );
            let unit = self.unit_atom(path);
            if let Some(s) = self.chain.symbols.get_mut(property) {
                s.state = ResolutionState::Resolved;
                s.symbol_type = Some(value_type);
                s.decls.push(DeclRef {
                    unit,
                    decl: DeclId::NONE,
                });
            }
            if self.chain.symbols.contains(value_type) {
                self.chain
                    .symbols
                    .add_link(property, value_type, LinkKind::TypedAs);
            }
            self.chain.symbols.add_link(anon, property, LinkKind::Member);
            self.cache(path, prop_idx, property);
        }
        if let Some(s) = self.chain.symbols.get_mut(anon) {
            s.state = ResolutionState::Resolved;
            s.symbol_type = Some(anon);
        }
        anon
    }

    fn resolve_array_literal(&mut self, path: &str, elements: &[NodeIndex]) -> SymbolId {
        let any = self.chain.primitives.any;
        // An enclosing array contextual type types the elements.
        let element_contextual = self
            .ctx
            .contextual_type()
            .filter(|&ct| {
                self.chain
                    .symbols
                    .get(ct)
                    .is_some_and(|s| s.kind == SymbolKind::Array)
            })
            .and_then(|ct| self.chain.symbols.first_out(ct, LinkKind::TypeArgument));
        if let Some(element_type) = element_contextual {
            self.ctx.push_contextual_type(element_type);
        }
        let mut element_type = None;
        for &element in elements {
            let symbol = self.resolve_expr(path, element);
            let ty = self.type_of_symbol(symbol);
            element_type.get_or_insert(ty);
        }
        if element_contextual.is_some() {
            self.ctx.pop_contextual_type();
        }
        let element = element_contextual.or(element_type).unwrap_or(any);
        self.chain.array_type_of(element)
    }

    fn resolve_arrow(&mut self, path: &str, node: NodeIndex) -> SymbolId {
        let error = self.chain.primitives.error;
        // The binder gave the arrow a function decl; its symbol is on
        // record.
        let symbol = match self
            .chain
            .records
            .get(path)
            .and_then(|r| r.get_decl_for_ast(node))
            .and_then(|d| {
                self.chain
                    .records
                    .get(path)
                    .and_then(|r| r.decl_tree.arena.get(d))
                    .and_then(|decl| decl.symbol)
            }) {
            Some(symbol) => symbol,
            None => return error,
        };
        // A contextual callable types unannotated parameters.
        if let Some(contextual_sig) = self
            .ctx
            .contextual_type()
            .and_then(|ct| self.chain.symbols.first_out(ct, LinkKind::CallSignature))
        {
            let contextual_params = self.chain.symbols.outs(contextual_sig, LinkKind::Parameter);
            let own_sig = self
                .chain
                .records
                .get(path)
                .and_then(|r| r.get_decl_for_ast(node))
                .and_then(|d| {
                    self.chain
                        .records
                        .get(path)
                        .and_then(|r| r.decl_tree.arena.get(d))
                        .and_then(|decl| decl.signature_symbol)
                });
            if let Some(own_sig) = own_sig {
                let own_params = self.chain.symbols.outs(own_sig, LinkKind::Parameter);
                for (i, &param) in own_params.iter().enumerate() {
                    let unresolved = self
                        .chain
                        .symbols
                        .get(param)
                        .is_some_and(|s| s.state == ResolutionState::Unresolved);
                    if !unresolved {
                        continue;
                    }
                    if let Some(&source) = contextual_params.get(i) {
                        let ty = self.type_of_symbol(source);
                        if let Some(s) = self.chain.symbols.get_mut(param) {
                            s.state = ResolutionState::Resolved;
                            s.symbol_type = Some(ty);
                        }
                        if self.chain.symbols.contains(ty) {
                            self.chain.symbols.add_link(param, ty, LinkKind::TypedAs);
                        }
                    }
                }
            }
        }
        self.type_of_symbol(symbol);
        symbol
    }

    fn synthesize_expression_symbol(&mut self, path: &str) -> SymbolId {
        let unit = self.unit_atom(path);
        let symbol =
            self.chain
                .symbols
                .alloc(Atom::NONE, SymbolKind::Expression, symbol_flags::SYNTHESIZED);
        if let Some(s) = self.chain.symbols.get_mut(symbol) {
            s.decls.push(DeclRef {
                unit,
                decl: DeclId::NONE,
            });
        }
        symbol
    }

    // =========================================================================
    // Call resolution
    // =========================================================================

    /// Resolve a call or constructor call: pick the first applicable
    /// signature, trying each candidate in a provisional frame so a
    /// rejected candidate's diagnostics never leak.
    pub fn resolve_call(&mut self, path: &str, node: NodeIndex) -> CallInfo {
        let error = self.chain.primitives.error;
        let empty = CallInfo {
            target: SymbolId::NONE,
            signatures: Vec::new(),
            best: None,
            is_constructor: false,
            result_type: error,
        };
        let syntax = match self.syntax_of(path) {
            Some(syntax) => syntax,
            None => return empty,
        };
        let (callee, arguments, is_constructor, span) = match syntax.arena.get(node) {
            Some(Node::CallExpr(call)) => (
                call.callee,
                call.arguments.clone(),
                false,
                call.base.span,
            ),
            Some(Node::NewExpr(new)) => (new.callee, new.arguments.clone(), true, new.base.span),
            _ => return empty,
        };

        let callee_symbol = self.resolve_expr(path, callee);
        let callee_type = self.type_of_symbol(callee_symbol);
        // The true callee: a variable holding a function resolves to the
        // function symbol through its type.
        let callable = match self.chain.symbols.get(callee_symbol).map(|s| s.kind) {
            Some(
                SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Accessor
                | SymbolKind::Class,
            ) => callee_symbol,
            _ => callee_type,
        };
        let link = if is_constructor {
            LinkKind::ConstructSignature
        } else {
            LinkKind::CallSignature
        };
        let signatures = self.chain.symbols.outs(callable, link);
        if is_constructor && signatures.is_empty() {
            // A class without an explicit constructor is constructible
            // with no arguments.
            if self
                .chain
                .symbols
                .get(callable)
                .is_some_and(|s| s.kind == SymbolKind::Class)
                && arguments.is_empty()
            {
                let result = callable;
                return CallInfo {
                    target: callable,
                    signatures: Vec::new(),
                    best: None,
                    is_constructor,
                    result_type: result,
                };
            }
        }
        if signatures.is_empty() {
            if callee_type != error && callee_type != self.chain.primitives.any {
                let name = self.type_display_name(callee_type);
                self.report(
                    path,
                    span,
                    format_message("Type '{0}' has no call signatures.", &[&name]),
                    2349,
                );
            }
            return CallInfo {
                target: callable,
                signatures: Vec::new(),
                best: None,
                is_constructor,
                result_type: if callee_type == self.chain.primitives.any {
                    self.chain.primitives.any
                } else {
                    error
                },
            };
        }

        // Try candidates in declaration order; first applicable wins.
        let mut best = None;
        for &signature in &signatures {
            self.ctx.start_provisional();
            let applicable = self.signature_applicable(path, signature, &arguments);
            self.ctx.rollback_provisional();
            if applicable {
                best = Some(signature);
                break;
            }
        }

        let result_type = match best {
            Some(signature) => {
                // Re-resolve the arguments on the committed path so their
                // cached symbols and contextual types are permanent.
                self.check_arguments(path, signature, &arguments, span, true);
                self.type_of_symbol(signature)
            }
            None => {
                // No candidate applied: report against the first
                // candidate for arity, the first arity-match for types.
                let reportable = signatures
                    .iter()
                    .copied()
                    .find(|&s| self.arity_matches(s, arguments.len()))
                    .unwrap_or(signatures[0]);
                self.check_arguments(path, reportable, &arguments, span, false);
                error
            }
        };
        if is_constructor && best.is_some() {
            // Constructing yields the class instance, not the
            // constructor's (absent) return annotation.
            let instance = if self
                .chain
                .symbols
                .get(callable)
                .is_some_and(|s| s.kind == SymbolKind::Class)
            {
                callable
            } else {
                result_type
            };
            return CallInfo {
                target: callable,
                signatures,
                best,
                is_constructor,
                result_type: instance,
            };
        }
        CallInfo {
            target: callable,
            signatures,
            best,
            is_constructor,
            result_type,
        }
    }

    fn arity_matches(&self, signature: SymbolId, argc: usize) -> bool {
        let params = self.chain.symbols.outs(signature, LinkKind::Parameter);
        let has_vararg = params.iter().any(|&p| {
            self.chain
                .symbols
                .get(p)
                .is_some_and(|s| s.has_flag(symbol_flags::VARARG))
        });
        let required = params
            .iter()
            .filter(|&&p| {
                self.chain.symbols.get(p).is_some_and(|s| {
                    !s.has_flag(symbol_flags::OPTIONAL) && !s.has_flag(symbol_flags::VARARG)
                })
            })
            .count();
        argc >= required && (has_vararg || argc <= params.len())
    }

    /// Whether every argument is compatible with its parameter. Runs
    /// inside a provisional frame during candidate selection.
    fn signature_applicable(
        &mut self,
        path: &str,
        signature: SymbolId,
        arguments: &[NodeIndex],
    ) -> bool {
        if !self.arity_matches(signature, arguments.len()) {
            return false;
        }
        let params = self.chain.symbols.outs(signature, LinkKind::Parameter);
        for (i, &argument) in arguments.iter().enumerate() {
            let param = params.get(i).or(params.last());
            let param_type = match param {
                Some(&p) => self.type_of_symbol(p),
                None => self.chain.primitives.any,
            };
            self.ctx.push_contextual_type(param_type);
            let arg_symbol = self.resolve_expr(path, argument);
            let arg_type = self.type_of_symbol(arg_symbol);
            self.ctx.pop_contextual_type();
            if !self.types_compatible(arg_type, param_type) {
                return false;
            }
        }
        true
    }

    /// Resolve arguments against a signature on the permanent path,
    /// reporting mismatches when `expect_success` is false or a late
    /// mismatch appears.
    fn check_arguments(
        &mut self,
        path: &str,
        signature: SymbolId,
        arguments: &[NodeIndex],
        call_span: Span,
        expect_success: bool,
    ) {
        let params = self.chain.symbols.outs(signature, LinkKind::Parameter);
        if !self.arity_matches(signature, arguments.len()) && !expect_success {
            let expected = params.len().to_string();
            let got = arguments.len().to_string();
            self.report(
                path,
                call_span,
                format_message("Expected {0} arguments, but got {1}.", &[&expected, &got]),
                2554,
            );
            return;
        }
        for (i, &argument) in arguments.iter().enumerate() {
            let param = params.get(i).or(params.last());
            let param_type = match param {
                Some(&p) => self.type_of_symbol(p),
                None => self.chain.primitives.any,
            };
            self.ctx.push_contextual_type(param_type);
            let arg_symbol = self.resolve_expr(path, argument);
            let arg_type = self.type_of_symbol(arg_symbol);
            self.ctx.pop_contextual_type();
            if !expect_success && !self.types_compatible(arg_type, param_type) {
                let source = self.type_display_name(arg_type);
                let target = self.type_display_name(param_type);
                let span = self
                    .syntax_of(path)
                    .and_then(|s| s.arena.span(argument))
                    .unwrap_or(call_span);
                self.report(
                    path,
                    span,
                    format_message(
                        "Argument of type '{0}' is not assignable to parameter of type '{1}'.",
                        &[&source, &target],
                    ),
                    2345,
                );
            }
        }
    }

    /// Materialize the call-site expression symbol: `CallTarget` carries
    /// invalidation from the callee, `TypedAs` the result type.
    fn finish_call_site(&mut self, path: &str, node: NodeIndex, info: &CallInfo) -> SymbolId {
        let symbol = self.synthesize_expression_symbol(path);
        if let Some(s) = self.chain.symbols.get_mut(symbol) {
            s.state = ResolutionState::Resolved;
            s.symbol_type = Some(info.result_type);
        }
        if info.target.is_some() && self.chain.symbols.contains(info.target) {
            self.chain
                .symbols
                .add_link(symbol, info.target, LinkKind::CallTarget);
        }
        if self.chain.symbols.contains(info.result_type) {
            self.chain
                .symbols
                .add_link(symbol, info.result_type, LinkKind::TypedAs);
        }
        self.cache(path, node, symbol);
        symbol
    }

    // =========================================================================
    // Compatibility
    // =========================================================================

    /// The minimal compatibility relation. The full assignability
    /// lattice (unions, generics, variance) is not this crate's concern.
    pub fn types_compatible(&mut self, source: SymbolId, target: SymbolId) -> bool {
        let mut visited = FxHashSet::default();
        self.compatible_inner(source, target, &mut visited)
    }

    fn compatible_inner(
        &mut self,
        source: SymbolId,
        target: SymbolId,
        visited: &mut FxHashSet<(SymbolId, SymbolId)>,
    ) -> bool {
        if source == target {
            return true;
        }
        let p = self.chain.primitives;
        if source == p.any || target == p.any || source == p.error || target == p.error {
            return true;
        }
        if source == p.null || source == p.undefined {
            return true;
        }
        if !visited.insert((source, target)) {
            // Already comparing this pair further up the stack.
            return true;
        }
        let source_kind = self.chain.symbols.get(source).map(|s| s.kind);
        let target_kind = self.chain.symbols.get(target).map(|s| s.kind);
        if source_kind == Some(SymbolKind::Array) && target_kind == Some(SymbolKind::Array) {
            let se = self.chain.symbols.first_out(source, LinkKind::TypeArgument);
            let te = self.chain.symbols.first_out(target, LinkKind::TypeArgument);
            return match (se, te) {
                (Some(se), Some(te)) => self.compatible_inner(se, te, visited),
                _ => true,
            };
        }
        // Nominal widening along heritage links.
        let mut stack: Vec<SymbolId> = self.chain.symbols.outs(source, LinkKind::Extends);
        stack.extend(self.chain.symbols.outs(source, LinkKind::Implements));
        let mut seen: FxHashSet<SymbolId> = FxHashSet::default();
        while let Some(base) = stack.pop() {
            if !seen.insert(base) {
                continue;
            }
            if base == target {
                return true;
            }
            stack.extend(self.chain.symbols.outs(base, LinkKind::Extends));
            stack.extend(self.chain.symbols.outs(base, LinkKind::Implements));
        }
        // Structural check into an interface target: every declared
        // member must be present and compatible on the source.
        if target_kind == Some(SymbolKind::Interface)
            && matches!(
                source_kind,
                Some(SymbolKind::Expression | SymbolKind::Interface | SymbolKind::Class)
            )
        {
            let members = self.members_of_type(target);
            for member in members {
                let (name, optional) = match self.chain.symbols.get(member) {
                    Some(s) => (s.name, s.has_flag(symbol_flags::OPTIONAL)),
                    None => continue,
                };
                match self.find_member_deep(source, name) {
                    Some(counterpart) => {
                        let member_type = self.type_of_symbol(member);
                        let counterpart_type = self.type_of_symbol(counterpart);
                        if !self.compatible_inner(counterpart_type, member_type, visited) {
                            return false;
                        }
                    }
                    None if optional => {}
                    None => return false,
                }
            }
            return true;
        }
        false
    }

    /// Members of a type, including inherited ones, in declaration order.
    pub fn members_of_type(&mut self, ty: SymbolId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        let mut seen_names: FxHashSet<Atom> = FxHashSet::default();
        let mut visited: FxHashSet<SymbolId> = FxHashSet::default();
        let mut stack = vec![ty];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for member in self.chain.symbols.outs(current, LinkKind::Member) {
                if let Some(name) = self.chain.symbols.get(member).map(|s| s.name) {
                    if seen_names.insert(name) {
                        out.push(member);
                    }
                }
            }
            for base in self.chain.symbols.outs(current, LinkKind::Extends) {
                stack.push(base);
            }
        }
        out
    }

    /// A printable name for a type symbol.
    pub fn type_display_name(&self, ty: SymbolId) -> String {
        match self.chain.symbols.get(ty) {
            Some(s) if s.kind == SymbolKind::Array => {
                let element = self
                    .chain
                    .symbols
                    .first_out(ty, LinkKind::TypeArgument)
                    .map(|e| self.type_display_name(e))
                    .unwrap_or_else(|| "any".to_string());
                format!("{}[]", element)
            }
            Some(s) if s.name.is_some() => self.chain.interner.resolve(s.name).to_string(),
            Some(s) if s.kind == SymbolKind::Expression => "{}".to_string(),
            _ => "{error}".to_string(),
        }
    }
}

/// Whether a decl of this kind is found when searching the given scope
/// space. Classes and modules straddle both spaces.
fn kind_in_space(kind: DeclKind, type_space: bool) -> bool {
    if type_space {
        matches!(
            kind,
            DeclKind::Interface | DeclKind::Class | DeclKind::Module | DeclKind::TypeParameter
        )
    } else {
        !matches!(kind, DeclKind::Interface | DeclKind::TypeParameter)
    }
}
