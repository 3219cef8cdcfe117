//! Structural decl-tree diffing.
//!
//! Compares the old and new decl trees of one unit and classifies each
//! structurally-matched pair as unchanged, `Changed`, `Added`, or
//! `Removed`. Matching is by `(name, kind)`; sibling groups sharing both
//! (overloads) are tie-broken by structural signature hash first and
//! ordinal position second, so reordering edits do not cascade into
//! spurious diffs.
//!
//! Equality looks only at declaration-relevant shape: kind, flags, type
//! annotation paths, heritage names, and (for unannotated initialized
//! decls) the initializer's structural shape. Spans and literal texts are
//! cosmetic and ignored. A decl whose only change is inside a child decl
//! yields no entry of its own; the child does.

use super::builder::DeclTree;
use super::decl::{Decl, DeclId};
use crate::syntax::{Node, NodeArena, NodeIndex};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// The classification of one decl pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Removed,
    Changed,
}

/// One edit in a unit's declaration structure.
///
/// `old` is NONE for `Added`, `new` is NONE for `Removed`. A `Removed`
/// entry covers its whole subtree; descendants get no entries of their
/// own and the graph updater recurses instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeclDiff {
    pub kind: DiffKind,
    pub old: DeclId,
    pub new: DeclId,
}

/// Diff two decl trees for the same unit.
///
/// `diff_decls(d, _, d, _)` over identical trees yields an empty list.
pub fn diff_decls(
    old_tree: &DeclTree,
    old_ast: &NodeArena,
    new_tree: &DeclTree,
    new_ast: &NodeArena,
) -> Vec<DeclDiff> {
    let mut diffs = Vec::new();
    diff_pair(
        old_tree,
        old_ast,
        old_tree.root,
        new_tree,
        new_ast,
        new_tree.root,
        &mut diffs,
    );
    debug!(count = diffs.len(), "decl diff complete");
    diffs
}

fn diff_pair(
    old_tree: &DeclTree,
    old_ast: &NodeArena,
    old_id: DeclId,
    new_tree: &DeclTree,
    new_ast: &NodeArena,
    new_id: DeclId,
    diffs: &mut Vec<DeclDiff>,
) {
    let old_decl = match old_tree.arena.get(old_id) {
        Some(decl) => decl,
        None => return,
    };
    let new_decl = match new_tree.arena.get(new_id) {
        Some(decl) => decl,
        None => return,
    };

    if own_shape_hash(old_decl, old_ast) != own_shape_hash(new_decl, new_ast) {
        diffs.push(DeclDiff {
            kind: DiffKind::Changed,
            old: old_id,
            new: new_id,
        });
    }

    // Match children by (name, kind), then signature hash, then ordinal.
    let old_children: Vec<DeclId> = old_decl.children.to_vec();
    let new_children: Vec<DeclId> = new_decl.children.to_vec();
    let mut old_taken = vec![false; old_children.len()];

    let mut matched: Vec<(DeclId, DeclId)> = Vec::new();
    for &new_child_id in &new_children {
        let new_child = match new_tree.arena.get(new_child_id) {
            Some(decl) => decl,
            None => continue,
        };
        let mut chosen: Option<usize> = None;
        let new_sig = signature_hash(new_child, new_ast);
        // First pass: same name/kind and same signature hash.
        for (i, &old_child_id) in old_children.iter().enumerate() {
            if old_taken[i] {
                continue;
            }
            let old_child = match old_tree.arena.get(old_child_id) {
                Some(decl) => decl,
                None => continue,
            };
            if old_child.name == new_child.name
                && old_child.kind == new_child.kind
                && signature_hash(old_child, old_ast) == new_sig
            {
                chosen = Some(i);
                break;
            }
        }
        // Second pass: same name/kind, ordinal order.
        if chosen.is_none() {
            for (i, &old_child_id) in old_children.iter().enumerate() {
                if old_taken[i] {
                    continue;
                }
                let old_child = match old_tree.arena.get(old_child_id) {
                    Some(decl) => decl,
                    None => continue,
                };
                if old_child.name == new_child.name && old_child.kind == new_child.kind {
                    chosen = Some(i);
                    break;
                }
            }
        }
        match chosen {
            Some(i) => {
                old_taken[i] = true;
                matched.push((old_children[i], new_child_id));
            }
            None => diffs.push(DeclDiff {
                kind: DiffKind::Added,
                old: DeclId::NONE,
                new: new_child_id,
            }),
        }
    }

    for (i, &old_child_id) in old_children.iter().enumerate() {
        if !old_taken[i] {
            diffs.push(DeclDiff {
                kind: DiffKind::Removed,
                old: old_child_id,
                new: DeclId::NONE,
            });
        }
    }

    for (old_child, new_child) in matched {
        diff_pair(
            old_tree, old_ast, old_child, new_tree, new_ast, new_child, diffs,
        );
    }
}

// =============================================================================
// Shape fingerprints
// =============================================================================

/// Hash of a decl's own externally observable shape.
///
/// Parameter annotations are deliberately excluded from their callable's
/// hash: a parameter is a decl of its own and reports its own change.
fn own_shape_hash(decl: &Decl, ast: &NodeArena) -> u64 {
    let mut hasher = FxHasher::default();
    decl.kind.hash(&mut hasher);
    decl.flags.hash(&mut hasher);
    match ast.get(decl.ast) {
        Some(Node::VariableDecl(var)) => {
            annotation_shape(ast, var.type_annotation, &mut hasher);
            if var.type_annotation.is_none() {
                expr_shape(ast, var.initializer, &mut hasher);
            }
        }
        Some(Node::PropertyMember(prop)) => {
            annotation_shape(ast, prop.type_annotation, &mut hasher);
            if prop.type_annotation.is_none() {
                expr_shape(ast, prop.initializer, &mut hasher);
            }
        }
        Some(Node::ParameterDecl(param)) => {
            annotation_shape(ast, param.type_annotation, &mut hasher);
        }
        Some(Node::FunctionDecl(func)) => {
            annotation_shape(ast, func.return_type, &mut hasher);
        }
        Some(Node::MethodMember(method)) => {
            annotation_shape(ast, method.return_type, &mut hasher);
        }
        Some(Node::GetAccessor(get)) => {
            annotation_shape(ast, get.return_type, &mut hasher);
        }
        Some(Node::CallSignatureMember(sig)) => {
            annotation_shape(ast, sig.return_type, &mut hasher);
        }
        Some(Node::ConstructSignatureMember(sig)) => {
            annotation_shape(ast, sig.return_type, &mut hasher);
        }
        Some(Node::IndexSignatureMember(sig)) => {
            annotation_shape(ast, sig.return_type, &mut hasher);
        }
        Some(Node::ClassDecl(class)) => {
            heritage_shape(ast, class.extends, &mut hasher);
            for &clause in &class.implements {
                heritage_shape(ast, clause, &mut hasher);
            }
        }
        Some(Node::InterfaceDecl(interface)) => {
            for &clause in &interface.extends {
                heritage_shape(ast, clause, &mut hasher);
            }
        }
        _ => {}
    }
    hasher.finish()
}

/// Hash of a decl's full callable signature: own shape plus every
/// parameter's shape. Used only as the overload tie-break during child
/// matching, never to emit entries.
fn signature_hash(decl: &Decl, ast: &NodeArena) -> u64 {
    let mut hasher = FxHasher::default();
    own_shape_hash(decl, ast).hash(&mut hasher);
    if decl.kind.is_callable() {
        if let Some(node) = ast.get(decl.ast) {
            let params: &[NodeIndex] = match node {
                Node::FunctionDecl(func) => &func.parameters,
                Node::MethodMember(method) => &method.parameters,
                Node::ConstructorMember(ctor) => &ctor.parameters,
                Node::CallSignatureMember(sig) => &sig.parameters,
                Node::ConstructSignatureMember(sig) => &sig.parameters,
                _ => &[],
            };
            params.len().hash(&mut hasher);
            for &param in params {
                if let Some(Node::ParameterDecl(p)) = ast.get(param) {
                    p.base.flags.hash(&mut hasher);
                    annotation_shape(ast, p.type_annotation, &mut hasher);
                }
            }
        }
    }
    hasher.finish()
}

/// Hash a type annotation's structure: type name paths and array nesting.
fn annotation_shape(ast: &NodeArena, idx: NodeIndex, hasher: &mut FxHasher) {
    match ast.get(idx) {
        Some(Node::TypeRef(type_ref)) => {
            1u8.hash(hasher);
            for atom in &type_ref.segments {
                atom.hash(hasher);
            }
        }
        Some(Node::ArrayType(array)) => {
            2u8.hash(hasher);
            annotation_shape(ast, array.element, hasher);
        }
        _ => 0u8.hash(hasher),
    }
}

fn heritage_shape(ast: &NodeArena, idx: NodeIndex, hasher: &mut FxHasher) {
    annotation_shape(ast, idx, hasher);
}

/// Hash an expression's type-relevant structure. Literal texts are
/// ignored (`1` and `2` are both number-typed); names are not.
fn expr_shape(ast: &NodeArena, idx: NodeIndex, hasher: &mut FxHasher) {
    let node = match ast.get(idx) {
        Some(node) => node,
        None => {
            0u8.hash(hasher);
            return;
        }
    };
    match node {
        Node::NumberLit(_) => 1u8.hash(hasher),
        Node::StringLit(_) => 2u8.hash(hasher),
        Node::BoolLit(_) => 3u8.hash(hasher),
        Node::NullLit(_) => 4u8.hash(hasher),
        Node::Identifier(ident) => {
            5u8.hash(hasher);
            ident.name.hash(hasher);
        }
        Node::PropertyAccess(access) => {
            6u8.hash(hasher);
            expr_shape(ast, access.object, hasher);
            if let Some(name) = ast.identifier_name(access.name) {
                name.hash(hasher);
            }
        }
        Node::CallExpr(call) => {
            7u8.hash(hasher);
            expr_shape(ast, call.callee, hasher);
        }
        Node::NewExpr(new) => {
            8u8.hash(hasher);
            expr_shape(ast, new.callee, hasher);
        }
        Node::ObjectLit(obj) => {
            9u8.hash(hasher);
            for &prop in &obj.properties {
                if let Some(Node::PropertyAssignment(assignment)) = ast.get(prop) {
                    if let Some(name) = ast.identifier_name(assignment.name) {
                        name.hash(hasher);
                    }
                    expr_shape(ast, assignment.value, hasher);
                }
            }
        }
        Node::ArrayLit(arr) => {
            10u8.hash(hasher);
            arr.elements.len().hash(hasher);
            if let Some(&first) = arr.elements.first() {
                expr_shape(ast, first, hasher);
            }
        }
        Node::CastExpr(cast) => {
            11u8.hash(hasher);
            annotation_shape(ast, cast.type_annotation, hasher);
        }
        Node::ArrowFunction(_) => 12u8.hash(hasher),
        Node::AssignExpr(assign) => {
            13u8.hash(hasher);
            expr_shape(ast, assign.value, hasher);
        }
        _ => 255u8.hash(hasher),
    }
}
