//! Path/position-based contextual resolution.
//!
//! Given a text offset or an explicit root-to-leaf AST path, rebuilds
//! enough contextual state (enclosing declaration, contextual type stack)
//! to answer editor point-queries: the symbol at the point, the chosen
//! call signature, the visible names, the contextual members.
//!
//! Resolution here is aggressive but quiet: symbols and caches commit
//! (repeated queries return identical symbols), diagnostics do not. An
//! offset with no containing node, or a leaf that cannot be resolved,
//! yields an empty result; callers treat "no info" as a normal outcome.

use crate::decl::DeclKind;
use crate::resolve::{CallInfo, Resolver};
use crate::semantic::SemanticChain;
use crate::symbols::{LinkKind, SymbolId};
use crate::syntax::{Node, NodeIndex};
use rustc_hash::FxHashSet;
use tracing::trace;

/// The uniform result of both entry points.
#[derive(Clone, Debug, Default)]
pub struct PositionInfo {
    /// The resolved symbol at the point, if any.
    pub symbol: Option<SymbolId>,
    /// The AST node the symbol was bound at.
    pub ast: NodeIndex,
    /// The symbol of the nearest enclosing declaration scope.
    pub enclosing_scope_symbol: Option<SymbolId>,
    /// For callable targets: the signature the call resolved against.
    pub candidate_signature: Option<SymbolId>,
    /// For callable targets: every candidate signature.
    pub all_signatures: Vec<SymbolId>,
    pub is_constructor_call: bool,
}

impl PositionInfo {
    pub fn empty() -> PositionInfo {
        PositionInfo {
            ast: NodeIndex::NONE,
            ..PositionInfo::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
    }
}

/// Resolve the innermost node at a text offset.
pub fn resolve_position(chain: &mut SemanticChain, path: &str, offset: u32) -> PositionInfo {
    let nodes = match chain.records.get(path) {
        Some(record) => record.syntax.arena.path_at(record.syntax.root, offset),
        None => return PositionInfo::empty(),
    };
    if nodes.is_empty() {
        trace!(offset, "no containing node");
        return PositionInfo::empty();
    }
    resolve_ast_path(chain, path, &nodes)
}

/// Resolve an explicit root-to-leaf AST path.
pub fn resolve_ast_path(
    chain: &mut SemanticChain,
    path: &str,
    nodes: &[NodeIndex],
) -> PositionInfo {
    let leaf = match nodes.last() {
        Some(&leaf) => leaf,
        None => return PositionInfo::empty(),
    };
    let mut resolver = Resolver::new(chain);
    resolver.ctx.quiet = true;

    let enclosing_scope_symbol = enclosing_scope_symbol(&resolver, path, nodes);

    // A point on a declaration's own AST (or its own name) is the
    // declaration, never a sub-expression to re-resolve.
    if let Some(symbol) = declared_symbol_at(&resolver, path, leaf, nodes) {
        let mut info = PositionInfo {
            symbol: Some(symbol),
            ast: leaf,
            enclosing_scope_symbol,
            ..PositionInfo::default()
        };
        attach_signatures(&mut resolver, symbol, &mut info);
        return info;
    }

    // Resolve outside in: the outermost context-establishing ancestor
    // (initializer, assertion, assignment, object literal, lambda, call,
    // array) resolves first so contextual types are in place when the
    // leaf resolves.
    resolve_enclosing_context(&mut resolver, path, nodes);

    // A property name inside an object literal is the property symbol
    // the literal's (contextually typed) resolution produced, not a free
    // identifier.
    let property_symbol = property_assignment_symbol(&resolver, path, nodes, leaf);

    let symbol = if let Some(property_symbol) = property_symbol {
        Some(property_symbol)
    } else if is_expression_node(&resolver, path, leaf) {
        Some(resolver.resolve_expr(path, leaf))
    } else {
        resolver
            .chain
            .records
            .get(path)
            .and_then(|r| r.get_symbol_for_ast(leaf))
    };

    let mut info = PositionInfo {
        symbol,
        ast: leaf,
        enclosing_scope_symbol,
        ..PositionInfo::default()
    };

    // A leaf that is the target of a call resolves the call too: the
    // chosen overload and the true callee, distinct from a variable that
    // merely holds a function value.
    if let Some(call_node) = enclosing_call_with_callee(&resolver, path, nodes, leaf) {
        let call = resolver.resolve_call(path, call_node);
        if call.target.is_some() {
            info.symbol = Some(call.target);
        }
        info.candidate_signature = call.best;
        info.all_signatures = call.signatures;
        info.is_constructor_call = call.is_constructor;
    } else if let Some(symbol) = info.symbol {
        attach_signatures(&mut resolver, symbol, &mut info);
    }

    if info.symbol == Some(resolver.chain.primitives.error) {
        // Unresolvable leaves are "no info", not an error payload.
        info.symbol = None;
    }
    info
}

/// The resolved call at or enclosing the leaf of an AST path.
pub fn call_info_from_path(
    chain: &mut SemanticChain,
    path: &str,
    nodes: &[NodeIndex],
) -> Option<CallInfo> {
    let call_node = {
        let record = chain.records.get(path)?;
        nodes
            .iter()
            .rev()
            .copied()
            .find(|&n| {
                matches!(
                    record.syntax.arena.get(n),
                    Some(Node::CallExpr(_) | Node::NewExpr(_))
                )
            })?
    };
    let mut resolver = Resolver::new(chain);
    resolver.ctx.quiet = true;
    resolve_enclosing_context(&mut resolver, path, nodes);
    Some(resolver.resolve_call(path, call_node))
}

/// Every symbol visible from the leaf's position: enclosing scopes inner
/// to outer, then the chain-global scope.
pub fn visible_symbols_from_path(
    chain: &mut SemanticChain,
    path: &str,
    nodes: &[NodeIndex],
) -> Vec<SymbolId> {
    let leaf = match nodes.last() {
        Some(&leaf) => leaf,
        None => return Vec::new(),
    };
    let mut out = Vec::new();
    let mut seen: FxHashSet<SymbolId> = FxHashSet::default();
    let resolver = Resolver::new(chain);
    let mut scope = resolver.enclosing_decl(path, leaf);
    if let Some(record) = resolver.chain.records.get(path) {
        while let Some(scope_id) = scope {
            let decl = match record.decl_tree.arena.get(scope_id) {
                Some(decl) => decl,
                None => break,
            };
            if !matches!(decl.kind, DeclKind::Class | DeclKind::Interface) {
                for &child in &decl.children {
                    if let Some(symbol) =
                        record.decl_tree.arena.get(child).and_then(|c| c.symbol)
                    {
                        if seen.insert(symbol) {
                            out.push(symbol);
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
    }
    for entry in resolver.chain.globals.values() {
        for symbol in [entry.value, entry.ty].into_iter().flatten() {
            if seen.insert(symbol) {
                out.push(symbol);
            }
        }
    }
    out
}

/// The members the leaf's contextual type offers (completion inside an
/// object literal argument, for instance).
pub fn contextual_members_from_path(
    chain: &mut SemanticChain,
    path: &str,
    nodes: &[NodeIndex],
) -> Vec<SymbolId> {
    let mut resolver = Resolver::new(chain);
    resolver.ctx.quiet = true;
    resolve_enclosing_context(&mut resolver, path, nodes);
    match contextual_type_at(&mut resolver, path, nodes) {
        Some(ty) => resolver.members_of_type(ty),
        None => Vec::new(),
    }
}

// =============================================================================
// Shared machinery
// =============================================================================

fn is_expression_node(resolver: &Resolver<'_>, path: &str, node: NodeIndex) -> bool {
    resolver
        .chain
        .records
        .get(path)
        .and_then(|r| r.syntax.arena.get(node))
        .is_some_and(|n| n.is_expression())
}

/// The symbol when the leaf is a declaration's own AST node or its own
/// name identifier.
fn declared_symbol_at(
    resolver: &Resolver<'_>,
    path: &str,
    leaf: NodeIndex,
    nodes: &[NodeIndex],
) -> Option<SymbolId> {
    let record = resolver.chain.records.get(path)?;
    if let Some(decl) = record.get_decl_for_ast(leaf) {
        if let Some(symbol) = record.decl_tree.arena.get(decl).and_then(|d| d.symbol) {
            return Some(symbol);
        }
    }
    // Position exactly on a declaring node's name identifier.
    if nodes.len() >= 2 {
        let parent = nodes[nodes.len() - 2];
        let parent_name = match record.syntax.arena.get(parent)? {
            Node::FunctionDecl(func) => func.name,
            Node::ClassDecl(class) => class.name,
            Node::InterfaceDecl(interface) => interface.name,
            Node::ModuleDecl(module) => module.name,
            Node::MethodMember(method) => method.name,
            Node::PropertyMember(prop) => prop.name,
            Node::GetAccessor(get) => get.name,
            Node::SetAccessor(set) => set.name,
            Node::VariableDecl(var) => var.name,
            Node::ParameterDecl(param) => param.name,
            Node::TypeParameterDecl(tp) => tp.name,
            _ => NodeIndex::NONE,
        };
        if parent_name == leaf {
            let decl = record.get_decl_for_ast(parent)?;
            return record.decl_tree.arena.get(decl).and_then(|d| d.symbol);
        }
    }
    None
}

/// The property symbol for a leaf that is (or names) an object-literal
/// property assignment, cached on the assignment node by resolution.
fn property_assignment_symbol(
    resolver: &Resolver<'_>,
    path: &str,
    nodes: &[NodeIndex],
    leaf: NodeIndex,
) -> Option<SymbolId> {
    let record = resolver.chain.records.get(path)?;
    if matches!(
        record.syntax.arena.get(leaf),
        Some(Node::PropertyAssignment(_))
    ) {
        return record.get_symbol_for_ast(leaf);
    }
    if nodes.len() >= 2 {
        let parent = nodes[nodes.len() - 2];
        if let Some(Node::PropertyAssignment(assignment)) = record.syntax.arena.get(parent) {
            if assignment.name == leaf {
                return record.get_symbol_for_ast(parent);
            }
        }
    }
    None
}

/// The symbol of the nearest enclosing scope-introducing declaration.
fn enclosing_scope_symbol(
    resolver: &Resolver<'_>,
    path: &str,
    nodes: &[NodeIndex],
) -> Option<SymbolId> {
    let record = resolver.chain.records.get(path)?;
    for &node in nodes.iter().rev().skip(1) {
        if let Some(decl_id) = record.get_decl_for_ast(node) {
            if let Some(decl) = record.decl_tree.arena.get(decl_id) {
                if decl.kind.is_scope() {
                    if let Some(symbol) = decl.symbol {
                        return Some(symbol);
                    }
                }
            }
        }
    }
    None
}

/// Resolve the outermost context-establishing ancestor so contextual
/// types are pushed before the leaf is looked at. Resolving the ancestor
/// resolves (and caches) everything beneath it, leaf included.
fn resolve_enclosing_context(resolver: &mut Resolver<'_>, path: &str, nodes: &[NodeIndex]) {
    for (i, &node) in nodes.iter().enumerate() {
        if i + 1 == nodes.len() {
            break;
        }
        let shape = resolver
            .chain
            .records
            .get(path)
            .and_then(|r| r.syntax.arena.get(node))
            .map(|n| ancestor_shape(n));
        match shape {
            Some(AncestorShape::Initializer { annotation, initializer }) => {
                if initializer.is_some() {
                    let syntax = match resolver.chain.records.get(path) {
                        Some(record) => record.syntax.clone(),
                        None => return,
                    };
                    let declared = if annotation.is_some() {
                        Some(resolver.resolve_type_annotation(path, &syntax, annotation, false))
                    } else {
                        None
                    };
                    if let Some(declared) = declared {
                        resolver.ctx.push_contextual_type(declared);
                        resolver.resolve_expr(path, initializer);
                        resolver.ctx.pop_contextual_type();
                    } else {
                        resolver.resolve_expr(path, initializer);
                    }
                    return;
                }
            }
            Some(AncestorShape::Expression) => {
                resolver.resolve_expr(path, node);
                return;
            }
            _ => {}
        }
    }
}

enum AncestorShape {
    /// A declaration whose initializer establishes context.
    Initializer {
        annotation: NodeIndex,
        initializer: NodeIndex,
    },
    /// An expression that establishes context when resolved.
    Expression,
    Other,
}

fn ancestor_shape(node: &Node) -> AncestorShape {
    match node {
        Node::VariableDecl(var) => AncestorShape::Initializer {
            annotation: var.type_annotation,
            initializer: var.initializer,
        },
        Node::PropertyMember(prop) => AncestorShape::Initializer {
            annotation: prop.type_annotation,
            initializer: prop.initializer,
        },
        Node::CastExpr(_)
        | Node::AssignExpr(_)
        | Node::ObjectLit(_)
        | Node::ArrayLit(_)
        | Node::ArrowFunction(_)
        | Node::CallExpr(_)
        | Node::NewExpr(_) => AncestorShape::Expression,
        _ => AncestorShape::Other,
    }
}

/// The nearest enclosing call whose callee subtree contains the leaf.
fn enclosing_call_with_callee(
    resolver: &Resolver<'_>,
    path: &str,
    nodes: &[NodeIndex],
    leaf: NodeIndex,
) -> Option<NodeIndex> {
    let record = resolver.chain.records.get(path)?;
    for (i, &node) in nodes.iter().enumerate().rev() {
        let callee = match record.syntax.arena.get(node) {
            Some(Node::CallExpr(call)) => call.callee,
            Some(Node::NewExpr(new)) => new.callee,
            _ => continue,
        };
        // The leaf must sit inside the callee, not the argument list.
        let in_callee = nodes[i + 1..]
            .first()
            .is_some_and(|&next| next == callee)
            || callee == leaf;
        if in_callee {
            return Some(node);
        }
    }
    None
}

/// The contextual type the leaf's surroundings establish, derived by
/// walking the path bottom-up.
fn contextual_type_at(
    resolver: &mut Resolver<'_>,
    path: &str,
    nodes: &[NodeIndex],
) -> Option<SymbolId> {
    for (i, &node) in nodes.iter().enumerate().rev().skip(1) {
        let child = nodes[i + 1];
        let shape = {
            let record = resolver.chain.records.get(path)?;
            record.syntax.arena.get(node).map(|n| match n {
                Node::VariableDecl(var) => {
                    (1u8, var.type_annotation, var.initializer, Vec::new(), NodeIndex::NONE)
                }
                Node::PropertyMember(prop) => {
                    (1, prop.type_annotation, prop.initializer, Vec::new(), NodeIndex::NONE)
                }
                Node::CastExpr(cast) => {
                    (2, cast.type_annotation, cast.expression, Vec::new(), NodeIndex::NONE)
                }
                Node::AssignExpr(assign) => {
                    (3, NodeIndex::NONE, assign.value, Vec::new(), assign.target)
                }
                Node::CallExpr(call) => {
                    (4, NodeIndex::NONE, NodeIndex::NONE, call.arguments.clone(), NodeIndex::NONE)
                }
                Node::NewExpr(new) => {
                    (4, NodeIndex::NONE, NodeIndex::NONE, new.arguments.clone(), NodeIndex::NONE)
                }
                Node::ObjectLit(obj) => {
                    (5, NodeIndex::NONE, NodeIndex::NONE, obj.properties.clone(), NodeIndex::NONE)
                }
                Node::ArrayLit(_) => {
                    (6, NodeIndex::NONE, NodeIndex::NONE, Vec::new(), NodeIndex::NONE)
                }
                _ => (0, NodeIndex::NONE, NodeIndex::NONE, Vec::new(), NodeIndex::NONE),
            })
        }?;
        match shape {
            (1, annotation, initializer, _, _) if child == initializer && annotation.is_some() => {
                let syntax = resolver.chain.records.get(path)?.syntax.clone();
                return Some(resolver.resolve_type_annotation(path, &syntax, annotation, false));
            }
            (2, annotation, expression, _, _) if child == expression => {
                let syntax = resolver.chain.records.get(path)?.syntax.clone();
                return Some(resolver.resolve_type_annotation(path, &syntax, annotation, false));
            }
            (3, _, value, _, target) if child == value => {
                let lhs = resolver.resolve_expr(path, target);
                return Some(resolver.type_of_symbol(lhs));
            }
            (4, _, _, arguments, _) => {
                // Leaf inside an argument: per-parameter contextual type.
                if let Some(arg_index) = arguments.iter().position(|&a| a == child) {
                    let call = resolver.resolve_call(path, node);
                    let signature = call.best.or_else(|| call.signatures.first().copied())?;
                    let params = resolver.chain.symbols.outs(signature, LinkKind::Parameter);
                    let param = params.get(arg_index).or(params.last()).copied()?;
                    return Some(resolver.type_of_symbol(param));
                }
                return None;
            }
            (5, _, _, properties, _) => {
                let outer = contextual_type_at(resolver, path, &nodes[..=i])?;
                let leaf = *nodes.last()?;
                // On a property name the object's own contextual type
                // applies (member completion); inside a property value
                // the named member's type does.
                let name: Option<String> = {
                    let record = resolver.chain.records.get(path)?;
                    properties.iter().find_map(|&prop| {
                        match record.syntax.arena.get(prop) {
                            Some(Node::PropertyAssignment(assignment)) if prop == child => {
                                if assignment.name == leaf {
                                    return Some(None);
                                }
                                Some(
                                    record
                                        .syntax
                                        .arena
                                        .identifier_name(assignment.name)
                                        .map(|s| s.to_string()),
                                )
                            }
                            _ => None,
                        }
                    })?
                };
                let name = match name {
                    // Leaf is the property name itself.
                    None => return Some(outer),
                    Some(name) => name,
                };
                let atom = resolver.chain.interner.intern(&name);
                let member = resolver.find_member_deep(outer, atom)?;
                return Some(resolver.type_of_symbol(member));
            }
            (6, _, _, _, _) => {
                let outer = contextual_type_at(resolver, path, &nodes[..=i])?;
                return resolver.chain.symbols.first_out(outer, LinkKind::TypeArgument);
            }
            _ => {}
        }
    }
    None
}

/// Populate the callable payload for a directly-resolved symbol.
fn attach_signatures(resolver: &mut Resolver<'_>, symbol: SymbolId, info: &mut PositionInfo) {
    let signatures = resolver.chain.symbols.outs(symbol, LinkKind::CallSignature);
    if !signatures.is_empty() {
        info.candidate_signature = signatures.first().copied();
        info.all_signatures = signatures;
    }
}
