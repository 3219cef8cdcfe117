//! Semantic check pass for one unit.
//!
//! Forces resolution of every decl in the unit and walks the statement
//! tree resolving expressions, accumulating diagnostics on the record in
//! source order. Failures on one symbol never abort the walk; resolution
//! continues with the error placeholder so dependent code still gets
//! partially checked.

use crate::decl::DeclId;
use crate::diagnostics::format_message;
use crate::resolve::resolver::Resolver;
use crate::semantic::UnitState;
use crate::syntax::{Node, NodeIndex, SyntaxTree};
use std::sync::Arc;
use tracing::debug;

impl<'a> Resolver<'a> {
    /// Run semantic checking for `path`, rebuilding its check
    /// diagnostics. Repeated runs without intervening edits produce the
    /// same diagnostics in the same order.
    pub fn check_unit(&mut self, path: &str) {
        let (root, syntax) = {
            let record = match self.chain.records.get_mut(path) {
                Some(record) => record,
                None => return,
            };
            // Re-deriving diagnostics needs a fresh expression walk; the
            // cached symbols of the previous pass would swallow reports.
            record.on_types_invalidated();
            (record.syntax.root, record.syntax.clone())
        };
        debug!(path, "semantic check");

        // Force resolution of every decl and surface annotation errors.
        let decl_ids: Vec<DeclId> = {
            let record = match self.chain.records.get(path) {
                Some(record) => record,
                None => return,
            };
            record
                .decl_tree
                .arena
                .walk_preorder(record.decl_tree.root)
        };
        for decl_id in decl_ids {
            let (symbol, signature, ast) = {
                let record = match self.chain.records.get(path) {
                    Some(record) => record,
                    None => return,
                };
                match record.decl_tree.arena.get(decl_id) {
                    Some(decl) => (decl.symbol, decl.signature_symbol, decl.ast),
                    None => continue,
                }
            };
            if let Some(symbol) = symbol {
                self.type_of_symbol(symbol);
            }
            if let Some(signature) = signature {
                self.type_of_symbol(signature);
            }
            self.report_annotation_errors(path, &syntax, ast);
        }

        self.check_statement(path, &syntax, root);

        if let Some(record) = self.chain.records.get_mut(path) {
            record.state = UnitState::TypeChecked;
        }
    }

    /// Re-resolve a decl node's annotations in reporting mode so unknown
    /// type names surface on every check pass.
    fn report_annotation_errors(&mut self, path: &str, syntax: &Arc<SyntaxTree>, ast: NodeIndex) {
        let annotations: Vec<NodeIndex> = match syntax.arena.get(ast) {
            Some(Node::VariableDecl(var)) => vec![var.type_annotation],
            Some(Node::ParameterDecl(param)) => vec![param.type_annotation],
            Some(Node::PropertyMember(prop)) => vec![prop.type_annotation],
            Some(Node::FunctionDecl(func)) => vec![func.return_type],
            Some(Node::MethodMember(method)) => vec![method.return_type],
            Some(Node::GetAccessor(get)) => vec![get.return_type],
            Some(Node::CallSignatureMember(sig)) => vec![sig.return_type],
            Some(Node::ConstructSignatureMember(sig)) => vec![sig.return_type],
            Some(Node::ClassDecl(class)) => {
                let mut out = vec![class.extends];
                out.extend(class.implements.iter().copied());
                out
            }
            Some(Node::InterfaceDecl(interface)) => interface.extends.clone(),
            _ => Vec::new(),
        };
        for annotation in annotations {
            if annotation.is_some() {
                self.resolve_type_annotation(path, syntax, annotation, true);
            }
        }
    }

    /// Walk a statement subtree, resolving statement-level expressions.
    /// Expression internals (call arguments, literal members) resolve
    /// inside `resolve_expr`.
    fn check_statement(&mut self, path: &str, syntax: &Arc<SyntaxTree>, node: NodeIndex) {
        let statements: Vec<NodeIndex> = match syntax.arena.get(node) {
            Some(Node::SourceUnit(unit)) => unit.statements.clone(),
            Some(Node::Block(block)) => block.statements.clone(),
            Some(Node::ModuleDecl(module)) => module.body.clone(),
            Some(Node::ClassDecl(class)) => class.members.clone(),
            Some(Node::FunctionDecl(func)) => {
                if func.body.is_some() {
                    vec![func.body]
                } else {
                    Vec::new()
                }
            }
            Some(Node::MethodMember(method)) => {
                if method.body.is_some() {
                    vec![method.body]
                } else {
                    Vec::new()
                }
            }
            Some(Node::ConstructorMember(ctor)) => {
                if ctor.body.is_some() {
                    vec![ctor.body]
                } else {
                    Vec::new()
                }
            }
            Some(Node::GetAccessor(get)) => {
                if get.body.is_some() {
                    vec![get.body]
                } else {
                    Vec::new()
                }
            }
            Some(Node::SetAccessor(set)) => {
                if set.body.is_some() {
                    vec![set.body]
                } else {
                    Vec::new()
                }
            }
            Some(Node::PropertyMember(prop)) => {
                self.check_initialized_decl(path, syntax, prop.type_annotation, prop.initializer);
                Vec::new()
            }
            Some(Node::VariableDecl(var)) => {
                self.check_initialized_decl(path, syntax, var.type_annotation, var.initializer);
                Vec::new()
            }
            Some(Node::ExpressionStatement(stmt)) => {
                self.resolve_expr(path, stmt.expression);
                Vec::new()
            }
            Some(Node::ReturnStatement(stmt)) => {
                if stmt.expression.is_some() {
                    self.resolve_expr(path, stmt.expression);
                }
                Vec::new()
            }
            Some(Node::IfStatement(stmt)) => {
                self.resolve_expr(path, stmt.condition);
                let mut out = vec![stmt.then_branch];
                if stmt.else_branch.is_some() {
                    out.push(stmt.else_branch);
                }
                out
            }
            Some(Node::TryStatement(stmt)) => {
                let mut out = vec![stmt.try_block];
                if stmt.catch_clause.is_some() {
                    out.push(stmt.catch_clause);
                }
                out
            }
            Some(Node::CatchClause(clause)) => vec![clause.block],
            Some(Node::WithStatement(stmt)) => {
                self.resolve_expr(path, stmt.expression);
                vec![stmt.body]
            }
            Some(Node::InterfaceDecl(_)) => Vec::new(),
            _ => Vec::new(),
        };
        for statement in statements {
            self.check_statement(path, syntax, statement);
        }
    }

    /// An initialized decl with an annotation checks the initializer
    /// against the declared type, with the declared type pushed as the
    /// initializer's contextual type.
    fn check_initialized_decl(
        &mut self,
        path: &str,
        syntax: &Arc<SyntaxTree>,
        annotation: NodeIndex,
        initializer: NodeIndex,
    ) {
        if initializer.is_none() {
            return;
        }
        if annotation.is_none() {
            self.resolve_expr(path, initializer);
            return;
        }
        let declared = self.resolve_type_annotation(path, syntax, annotation, false);
        self.ctx.push_contextual_type(declared);
        let init_symbol = self.resolve_expr(path, initializer);
        let init_type = self.type_of_symbol(init_symbol);
        self.ctx.pop_contextual_type();
        if !self.types_compatible(init_type, declared) {
            let source = self.type_display_name(init_type);
            let target = self.type_display_name(declared);
            let span = syntax.arena.span(initializer).unwrap_or_default();
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
    }
}
