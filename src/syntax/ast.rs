//! AST node definitions.
//!
//! One closed enum over every node category, with a payload struct per
//! kind. Producing these trees from source text is the external parser's
//! job; this module only defines the shape the semantic core consumes.

use super::base::{NodeBase, NodeIndex};

// =============================================================================
// Declarations and statements
// =============================================================================

/// Root node of a unit's AST. Exactly one per unit.
#[derive(Clone, Debug)]
pub struct SourceUnit {
    pub base: NodeBase,
    pub statements: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct ModuleDecl {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub body: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub type_parameters: Vec<NodeIndex>,
    /// Single base class reference, or NONE.
    pub extends: NodeIndex,
    pub implements: Vec<NodeIndex>,
    pub members: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub type_parameters: Vec<NodeIndex>,
    pub extends: Vec<NodeIndex>,
    pub members: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub type_parameters: Vec<NodeIndex>,
    pub parameters: Vec<NodeIndex>,
    /// Return type annotation, or NONE.
    pub return_type: NodeIndex,
    /// Body block, or NONE for overload declarations.
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct MethodMember {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub type_parameters: Vec<NodeIndex>,
    pub parameters: Vec<NodeIndex>,
    pub return_type: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ConstructorMember {
    pub base: NodeBase,
    pub parameters: Vec<NodeIndex>,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct PropertyMember {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub type_annotation: NodeIndex,
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct GetAccessor {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub return_type: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct SetAccessor {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub parameter: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CallSignatureMember {
    pub base: NodeBase,
    pub parameters: Vec<NodeIndex>,
    pub return_type: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ConstructSignatureMember {
    pub base: NodeBase,
    pub parameters: Vec<NodeIndex>,
    pub return_type: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct IndexSignatureMember {
    pub base: NodeBase,
    pub parameter: NodeIndex,
    pub return_type: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct VariableDecl {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub type_annotation: NodeIndex,
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ParameterDecl {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub type_annotation: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct TypeParameterDecl {
    pub base: NodeBase,
    pub name: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub base: NodeBase,
    pub statements: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct ExpressionStatement {
    pub base: NodeBase,
    pub expression: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ReturnStatement {
    pub base: NodeBase,
    pub expression: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct IfStatement {
    pub base: NodeBase,
    pub condition: NodeIndex,
    pub then_branch: NodeIndex,
    pub else_branch: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct TryStatement {
    pub base: NodeBase,
    pub try_block: NodeIndex,
    pub catch_clause: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub block: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct WithStatement {
    pub base: NodeBase,
    pub expression: NodeIndex,
    pub body: NodeIndex,
}

// =============================================================================
// Type annotations
// =============================================================================

/// A (possibly qualified) type name, e.g. `number` or `M.Point`.
#[derive(Clone, Debug)]
pub struct TypeRef {
    pub base: NodeBase,
    pub segments: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ArrayType {
    pub base: NodeBase,
    pub element: NodeIndex,
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Clone, Debug)]
pub struct Identifier {
    pub base: NodeBase,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct NumberLit {
    pub base: NodeBase,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct StringLit {
    pub base: NodeBase,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct BoolLit {
    pub base: NodeBase,
    pub value: bool,
}

#[derive(Clone, Debug)]
pub struct NullLit {
    pub base: NodeBase,
}

#[derive(Clone, Debug)]
pub struct CallExpr {
    pub base: NodeBase,
    pub callee: NodeIndex,
    pub arguments: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct NewExpr {
    pub base: NodeBase,
    pub callee: NodeIndex,
    pub arguments: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct PropertyAccess {
    pub base: NodeBase,
    pub object: NodeIndex,
    pub name: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ObjectLit {
    pub base: NodeBase,
    pub properties: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct PropertyAssignment {
    pub base: NodeBase,
    pub name: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ArrayLit {
    pub base: NodeBase,
    pub elements: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct AssignExpr {
    pub base: NodeBase,
    pub target: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CastExpr {
    pub base: NodeBase,
    pub expression: NodeIndex,
    pub type_annotation: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ArrowFunction {
    pub base: NodeBase,
    pub parameters: Vec<NodeIndex>,
    pub return_type: NodeIndex,
    /// Block or bare expression body.
    pub body: NodeIndex,
}

// =============================================================================
// Node
// =============================================================================

/// The closed union of every AST node kind.
#[derive(Clone, Debug)]
pub enum Node {
    SourceUnit(SourceUnit),
    ModuleDecl(ModuleDecl),
    ClassDecl(ClassDecl),
    InterfaceDecl(InterfaceDecl),
    FunctionDecl(FunctionDecl),
    MethodMember(MethodMember),
    ConstructorMember(ConstructorMember),
    PropertyMember(PropertyMember),
    GetAccessor(GetAccessor),
    SetAccessor(SetAccessor),
    CallSignatureMember(CallSignatureMember),
    ConstructSignatureMember(ConstructSignatureMember),
    IndexSignatureMember(IndexSignatureMember),
    VariableDecl(VariableDecl),
    ParameterDecl(ParameterDecl),
    TypeParameterDecl(TypeParameterDecl),
    Block(Block),
    ExpressionStatement(ExpressionStatement),
    ReturnStatement(ReturnStatement),
    IfStatement(IfStatement),
    TryStatement(TryStatement),
    CatchClause(CatchClause),
    WithStatement(WithStatement),
    TypeRef(TypeRef),
    ArrayType(ArrayType),
    Identifier(Identifier),
    NumberLit(NumberLit),
    StringLit(StringLit),
    BoolLit(BoolLit),
    NullLit(NullLit),
    CallExpr(CallExpr),
    NewExpr(NewExpr),
    PropertyAccess(PropertyAccess),
    ObjectLit(ObjectLit),
    PropertyAssignment(PropertyAssignment),
    ArrayLit(ArrayLit),
    AssignExpr(AssignExpr),
    CastExpr(CastExpr),
    ArrowFunction(ArrowFunction),
}

impl Node {
    pub fn base(&self) -> &NodeBase {
        match self {
            Node::SourceUnit(n) => &n.base,
            Node::ModuleDecl(n) => &n.base,
            Node::ClassDecl(n) => &n.base,
            Node::InterfaceDecl(n) => &n.base,
            Node::FunctionDecl(n) => &n.base,
            Node::MethodMember(n) => &n.base,
            Node::ConstructorMember(n) => &n.base,
            Node::PropertyMember(n) => &n.base,
            Node::GetAccessor(n) => &n.base,
            Node::SetAccessor(n) => &n.base,
            Node::CallSignatureMember(n) => &n.base,
            Node::ConstructSignatureMember(n) => &n.base,
            Node::IndexSignatureMember(n) => &n.base,
            Node::VariableDecl(n) => &n.base,
            Node::ParameterDecl(n) => &n.base,
            Node::TypeParameterDecl(n) => &n.base,
            Node::Block(n) => &n.base,
            Node::ExpressionStatement(n) => &n.base,
            Node::ReturnStatement(n) => &n.base,
            Node::IfStatement(n) => &n.base,
            Node::TryStatement(n) => &n.base,
            Node::CatchClause(n) => &n.base,
            Node::WithStatement(n) => &n.base,
            Node::TypeRef(n) => &n.base,
            Node::ArrayType(n) => &n.base,
            Node::Identifier(n) => &n.base,
            Node::NumberLit(n) => &n.base,
            Node::StringLit(n) => &n.base,
            Node::BoolLit(n) => &n.base,
            Node::NullLit(n) => &n.base,
            Node::CallExpr(n) => &n.base,
            Node::NewExpr(n) => &n.base,
            Node::PropertyAccess(n) => &n.base,
            Node::ObjectLit(n) => &n.base,
            Node::PropertyAssignment(n) => &n.base,
            Node::ArrayLit(n) => &n.base,
            Node::AssignExpr(n) => &n.base,
            Node::CastExpr(n) => &n.base,
            Node::ArrowFunction(n) => &n.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut NodeBase {
        match self {
            Node::SourceUnit(n) => &mut n.base,
            Node::ModuleDecl(n) => &mut n.base,
            Node::ClassDecl(n) => &mut n.base,
            Node::InterfaceDecl(n) => &mut n.base,
            Node::FunctionDecl(n) => &mut n.base,
            Node::MethodMember(n) => &mut n.base,
            Node::ConstructorMember(n) => &mut n.base,
            Node::PropertyMember(n) => &mut n.base,
            Node::GetAccessor(n) => &mut n.base,
            Node::SetAccessor(n) => &mut n.base,
            Node::CallSignatureMember(n) => &mut n.base,
            Node::ConstructSignatureMember(n) => &mut n.base,
            Node::IndexSignatureMember(n) => &mut n.base,
            Node::VariableDecl(n) => &mut n.base,
            Node::ParameterDecl(n) => &mut n.base,
            Node::TypeParameterDecl(n) => &mut n.base,
            Node::Block(n) => &mut n.base,
            Node::ExpressionStatement(n) => &mut n.base,
            Node::ReturnStatement(n) => &mut n.base,
            Node::IfStatement(n) => &mut n.base,
            Node::TryStatement(n) => &mut n.base,
            Node::CatchClause(n) => &mut n.base,
            Node::WithStatement(n) => &mut n.base,
            Node::TypeRef(n) => &mut n.base,
            Node::ArrayType(n) => &mut n.base,
            Node::Identifier(n) => &mut n.base,
            Node::NumberLit(n) => &mut n.base,
            Node::StringLit(n) => &mut n.base,
            Node::BoolLit(n) => &mut n.base,
            Node::NullLit(n) => &mut n.base,
            Node::CallExpr(n) => &mut n.base,
            Node::NewExpr(n) => &mut n.base,
            Node::PropertyAccess(n) => &mut n.base,
            Node::ObjectLit(n) => &mut n.base,
            Node::PropertyAssignment(n) => &mut n.base,
            Node::ArrayLit(n) => &mut n.base,
            Node::AssignExpr(n) => &mut n.base,
            Node::CastExpr(n) => &mut n.base,
            Node::ArrowFunction(n) => &mut n.base,
        }
    }

    /// Whether this node introduces a declaration the decl builder records.
    pub fn is_declaring(&self) -> bool {
        matches!(
            self,
            Node::SourceUnit(_)
                | Node::ModuleDecl(_)
                | Node::ClassDecl(_)
                | Node::InterfaceDecl(_)
                | Node::FunctionDecl(_)
                | Node::MethodMember(_)
                | Node::ConstructorMember(_)
                | Node::PropertyMember(_)
                | Node::GetAccessor(_)
                | Node::SetAccessor(_)
                | Node::CallSignatureMember(_)
                | Node::ConstructSignatureMember(_)
                | Node::IndexSignatureMember(_)
                | Node::VariableDecl(_)
                | Node::ParameterDecl(_)
                | Node::TypeParameterDecl(_)
                | Node::CatchClause(_)
                | Node::WithStatement(_)
                | Node::ArrowFunction(_)
        )
    }

    /// Whether this node is an expression.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Node::Identifier(_)
                | Node::NumberLit(_)
                | Node::StringLit(_)
                | Node::BoolLit(_)
                | Node::NullLit(_)
                | Node::CallExpr(_)
                | Node::NewExpr(_)
                | Node::PropertyAccess(_)
                | Node::ObjectLit(_)
                | Node::ArrayLit(_)
                | Node::AssignExpr(_)
                | Node::CastExpr(_)
                | Node::ArrowFunction(_)
        )
    }
}
