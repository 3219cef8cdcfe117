//! Declaration tree builder.
//!
//! Walks a unit's AST and produces the tree of `Decl` nodes mirroring
//! scope structure, together with the AST-to-decl index. The walk is a
//! plain pre/post traversal with a current-parent stack; identical AST
//! shape always yields an isomorphic decl tree, which the decl differ
//! relies on.

use super::decl::{DeclArena, DeclId, DeclKind};
use crate::interner::{Atom, Interner};
use crate::syntax::{Node, NodeArena, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::trace;

/// The builder's output: the unit's decl tree plus the AST index.
#[derive(Clone, Debug)]
pub struct DeclTree {
    pub arena: DeclArena,
    pub root: DeclId,
    /// AST node id -> decl created for that node.
    pub ast_to_decl: FxHashMap<u32, DeclId>,
}

pub struct DeclTreeBuilder<'a> {
    ast: &'a NodeArena,
    unit: Atom,
    interner: &'a mut Interner,
    decls: DeclArena,
    ast_to_decl: FxHashMap<u32, DeclId>,
    parent_stack: Vec<DeclId>,
}

impl<'a> DeclTreeBuilder<'a> {
    /// Build the decl tree for the unit rooted at `root`. Declaration
    /// names are interned into the chain's name table here.
    pub fn build(
        ast: &'a NodeArena,
        root: NodeIndex,
        unit: Atom,
        interner: &'a mut Interner,
    ) -> DeclTree {
        let mut builder = DeclTreeBuilder {
            ast,
            unit,
            interner,
            decls: DeclArena::new(),
            ast_to_decl: FxHashMap::default(),
            parent_stack: Vec::new(),
        };
        builder.visit(root);
        debug_assert!(
            builder.parent_stack.is_empty(),
            "unbalanced decl parent stack"
        );
        let root_decl = builder
            .ast_to_decl
            .get(&root.0)
            .copied()
            .expect("source unit must produce a top-level decl");
        DeclTree {
            arena: builder.decls,
            root: root_decl,
            ast_to_decl: builder.ast_to_decl,
        }
    }

    fn visit(&mut self, idx: NodeIndex) {
        let node = match self.ast.get(idx) {
            Some(node) => node,
            None => return,
        };

        let created = match node {
            Node::SourceUnit(_) => Some(self.declare(idx, Atom::NONE, DeclKind::Script)),
            Node::ModuleDecl(module) => {
                let name = self.name_of(module.name);
                Some(self.declare(idx, name, DeclKind::Module))
            }
            Node::ClassDecl(class) => {
                let name = self.name_of(class.name);
                Some(self.declare(idx, name, DeclKind::Class))
            }
            Node::InterfaceDecl(interface) => {
                let name = self.name_of(interface.name);
                Some(self.declare(idx, name, DeclKind::Interface))
            }
            Node::FunctionDecl(func) => {
                let name = self.name_of(func.name);
                Some(self.declare(idx, name, DeclKind::Function))
            }
            Node::MethodMember(method) => {
                let name = self.name_of(method.name);
                Some(self.declare(idx, name, DeclKind::Method))
            }
            Node::ConstructorMember(_) => {
                Some(self.declare(idx, Atom::NONE, DeclKind::Constructor))
            }
            Node::PropertyMember(prop) => {
                let name = self.name_of(prop.name);
                Some(self.declare(idx, name, DeclKind::Property))
            }
            Node::GetAccessor(get) => {
                let name = self.name_of(get.name);
                Some(self.declare(idx, name, DeclKind::GetAccessor))
            }
            Node::SetAccessor(set) => {
                let name = self.name_of(set.name);
                Some(self.declare(idx, name, DeclKind::SetAccessor))
            }
            Node::CallSignatureMember(_) => {
                Some(self.declare(idx, Atom::NONE, DeclKind::CallSignature))
            }
            Node::ConstructSignatureMember(_) => {
                Some(self.declare(idx, Atom::NONE, DeclKind::ConstructSignature))
            }
            Node::IndexSignatureMember(_) => {
                Some(self.declare(idx, Atom::NONE, DeclKind::IndexSignature))
            }
            Node::VariableDecl(var) => {
                let name = self.name_of(var.name);
                Some(self.declare(idx, name, DeclKind::Variable))
            }
            Node::ParameterDecl(param) => {
                let name = self.name_of(param.name);
                Some(self.declare(idx, name, DeclKind::Parameter))
            }
            Node::TypeParameterDecl(tp) => {
                let name = self.name_of(tp.name);
                Some(self.declare(idx, name, DeclKind::TypeParameter))
            }
            Node::CatchClause(clause) => {
                let scope = self.declare(idx, Atom::NONE, DeclKind::CatchBlock);
                // The catch variable is a decl of its own inside the
                // catch scope, anchored on the name identifier.
                let var_name = self.name_of(clause.name);
                self.parent_stack.push(scope);
                self.declare(clause.name, var_name, DeclKind::Variable);
                self.parent_stack.pop();
                Some(scope)
            }
            Node::WithStatement(_) => Some(self.declare(idx, Atom::NONE, DeclKind::WithBlock)),
            Node::ArrowFunction(_) => Some(self.declare(idx, Atom::NONE, DeclKind::Function)),
            _ => None,
        };

        if let Some(decl) = created {
            self.parent_stack.push(decl);
        }
        for child in self.ast.children(idx) {
            self.visit(child);
        }
        if created.is_some() {
            self.parent_stack.pop();
        }
    }

    fn declare(&mut self, ast: NodeIndex, name: Atom, kind: DeclKind) -> DeclId {
        let node = self.ast.get(ast).expect("declaring node must exist");
        let span = node.base().span;
        // node_flags and decl_flags share bit assignments.
        let flags = node.base().flags;
        let id = self.decls.alloc(name, kind, flags, span, self.unit, ast);
        if let Some(&parent) = self.parent_stack.last() {
            self.decls.add_child(parent, id);
        }
        self.ast_to_decl.insert(ast.0, id);
        trace!(?kind, decl = id.0, ast = ast.0, "declared");
        id
    }

    fn name_of(&mut self, idx: NodeIndex) -> Atom {
        match self.ast.identifier_name(idx) {
            Some(name) => self.interner.intern(name),
            None => Atom::NONE,
        }
    }
}
