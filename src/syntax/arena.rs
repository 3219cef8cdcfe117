//! Node arena for AST storage.
//!
//! Nodes are stored contiguously and referenced by index. A node's id
//! equals its index, so maps keyed by node id are stable for the lifetime
//! of the arena.

use super::ast::Node;
use super::base::NodeIndex;
use crate::span::Span;

/// Arena-based storage for AST nodes.
#[derive(Debug, Default)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a node to the arena and return its index. Assigns the node id.
    pub fn add(&mut self, mut node: Node) -> NodeIndex {
        let index = self.nodes.len() as u32;
        node.base_mut().id = index;
        self.nodes.push(node);
        NodeIndex(index)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn span(&self, index: NodeIndex) -> Option<Span> {
        self.get(index).map(|n| n.base().span)
    }

    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map_or(NodeIndex::NONE, |n| n.base().parent)
    }

    /// The name text of an `Identifier` node, if `index` is one.
    pub fn identifier_name(&self, index: NodeIndex) -> Option<&str> {
        match self.get(index)? {
            Node::Identifier(ident) => Some(&ident.name),
            _ => None,
        }
    }

    /// Enumerate a node's children in source order.
    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let node = match self.get(index) {
            Some(n) => n,
            None => return Vec::new(),
        };

        let add_opt = |children: &mut Vec<NodeIndex>, idx: NodeIndex| {
            if idx.is_some() {
                children.push(idx);
            }
        };
        let add_list = |children: &mut Vec<NodeIndex>, list: &[NodeIndex]| {
            children.extend(list.iter().copied().filter(|i| i.is_some()));
        };

        let mut children = Vec::new();
        match node {
            Node::SourceUnit(unit) => add_list(&mut children, &unit.statements),
            Node::ModuleDecl(module) => {
                add_opt(&mut children, module.name);
                add_list(&mut children, &module.body);
            }
            Node::ClassDecl(class) => {
                add_opt(&mut children, class.name);
                add_list(&mut children, &class.type_parameters);
                add_opt(&mut children, class.extends);
                add_list(&mut children, &class.implements);
                add_list(&mut children, &class.members);
            }
            Node::InterfaceDecl(interface) => {
                add_opt(&mut children, interface.name);
                add_list(&mut children, &interface.type_parameters);
                add_list(&mut children, &interface.extends);
                add_list(&mut children, &interface.members);
            }
            Node::FunctionDecl(func) => {
                add_opt(&mut children, func.name);
                add_list(&mut children, &func.type_parameters);
                add_list(&mut children, &func.parameters);
                add_opt(&mut children, func.return_type);
                add_opt(&mut children, func.body);
            }
            Node::MethodMember(method) => {
                add_opt(&mut children, method.name);
                add_list(&mut children, &method.type_parameters);
                add_list(&mut children, &method.parameters);
                add_opt(&mut children, method.return_type);
                add_opt(&mut children, method.body);
            }
            Node::ConstructorMember(ctor) => {
                add_list(&mut children, &ctor.parameters);
                add_opt(&mut children, ctor.body);
            }
            Node::PropertyMember(prop) => {
                add_opt(&mut children, prop.name);
                add_opt(&mut children, prop.type_annotation);
                add_opt(&mut children, prop.initializer);
            }
            Node::GetAccessor(get) => {
                add_opt(&mut children, get.name);
                add_opt(&mut children, get.return_type);
                add_opt(&mut children, get.body);
            }
            Node::SetAccessor(set) => {
                add_opt(&mut children, set.name);
                add_opt(&mut children, set.parameter);
                add_opt(&mut children, set.body);
            }
            Node::CallSignatureMember(sig) => {
                add_list(&mut children, &sig.parameters);
                add_opt(&mut children, sig.return_type);
            }
            Node::ConstructSignatureMember(sig) => {
                add_list(&mut children, &sig.parameters);
                add_opt(&mut children, sig.return_type);
            }
            Node::IndexSignatureMember(sig) => {
                add_opt(&mut children, sig.parameter);
                add_opt(&mut children, sig.return_type);
            }
            Node::VariableDecl(decl) => {
                add_opt(&mut children, decl.name);
                add_opt(&mut children, decl.type_annotation);
                add_opt(&mut children, decl.initializer);
            }
            Node::ParameterDecl(param) => {
                add_opt(&mut children, param.name);
                add_opt(&mut children, param.type_annotation);
            }
            Node::TypeParameterDecl(tp) => add_opt(&mut children, tp.name),
            Node::Block(block) => add_list(&mut children, &block.statements),
            Node::ExpressionStatement(stmt) => add_opt(&mut children, stmt.expression),
            Node::ReturnStatement(stmt) => add_opt(&mut children, stmt.expression),
            Node::IfStatement(stmt) => {
                add_opt(&mut children, stmt.condition);
                add_opt(&mut children, stmt.then_branch);
                add_opt(&mut children, stmt.else_branch);
            }
            Node::TryStatement(stmt) => {
                add_opt(&mut children, stmt.try_block);
                add_opt(&mut children, stmt.catch_clause);
            }
            Node::CatchClause(clause) => {
                add_opt(&mut children, clause.name);
                add_opt(&mut children, clause.block);
            }
            Node::WithStatement(stmt) => {
                add_opt(&mut children, stmt.expression);
                add_opt(&mut children, stmt.body);
            }
            Node::TypeRef(_) => {}
            Node::ArrayType(array) => add_opt(&mut children, array.element),
            Node::Identifier(_)
            | Node::NumberLit(_)
            | Node::StringLit(_)
            | Node::BoolLit(_)
            | Node::NullLit(_) => {}
            Node::CallExpr(call) => {
                add_opt(&mut children, call.callee);
                add_list(&mut children, &call.arguments);
            }
            Node::NewExpr(new) => {
                add_opt(&mut children, new.callee);
                add_list(&mut children, &new.arguments);
            }
            Node::PropertyAccess(access) => {
                add_opt(&mut children, access.object);
                add_opt(&mut children, access.name);
            }
            Node::ObjectLit(obj) => add_list(&mut children, &obj.properties),
            Node::PropertyAssignment(prop) => {
                add_opt(&mut children, prop.name);
                add_opt(&mut children, prop.value);
            }
            Node::ArrayLit(arr) => add_list(&mut children, &arr.elements),
            Node::AssignExpr(assign) => {
                add_opt(&mut children, assign.target);
                add_opt(&mut children, assign.value);
            }
            Node::CastExpr(cast) => {
                add_opt(&mut children, cast.expression);
                add_opt(&mut children, cast.type_annotation);
            }
            Node::ArrowFunction(arrow) => {
                add_list(&mut children, &arrow.parameters);
                add_opt(&mut children, arrow.return_type);
                add_opt(&mut children, arrow.body);
            }
        }
        children
    }

    /// Fix up parent links for the subtree rooted at `root`.
    ///
    /// Parsers build bottom-up, so parents are unknown at `add` time.
    pub fn finalize_parents(&mut self, root: NodeIndex) {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            for child in self.children(current) {
                if let Some(node) = self.get_mut(child) {
                    node.base_mut().parent = current;
                }
                stack.push(child);
            }
        }
    }

    /// The innermost node whose span contains `offset`, searching from
    /// `root` downward. Returns NONE when the offset lies outside every
    /// node (callers treat that as "no info", not an error).
    pub fn innermost_at(&self, root: NodeIndex, offset: u32) -> NodeIndex {
        match self.span(root) {
            Some(span) if span.contains(offset) => {}
            _ => return NodeIndex::NONE,
        }
        let mut current = root;
        'descend: loop {
            for child in self.children(current) {
                if let Some(span) = self.span(child) {
                    if span.contains(offset) {
                        current = child;
                        continue 'descend;
                    }
                }
            }
            return current;
        }
    }

    /// The root-to-leaf chain of nodes whose spans contain `offset`.
    pub fn path_at(&self, root: NodeIndex, offset: u32) -> Vec<NodeIndex> {
        let mut path = Vec::new();
        match self.span(root) {
            Some(span) if span.contains(offset) => path.push(root),
            _ => return path,
        }
        let mut current = root;
        'descend: loop {
            for child in self.children(current) {
                if let Some(span) = self.span(child) {
                    if span.contains(offset) {
                        path.push(child);
                        current = child;
                        continue 'descend;
                    }
                }
            }
            return path;
        }
    }
}
