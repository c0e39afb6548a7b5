//! The syntax tree, expressed as tagged enums rather than the reference
//! implementation's struct-inheritance-via-embedded-`base`-field layout.

use ocl_core::{SourceLocation, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinType {
    Int,
    Float,
    String,
    Bool,
    Char,
    Array,
    Void,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub builtin: BuiltinType,
    pub element_type: Option<Box<TypeNode>>,
}

impl TypeNode {
    pub fn simple(builtin: BuiltinType) -> Self {
        TypeNode { builtin, element_type: None }
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_node: Option<TypeNode>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal { value: Value, location: SourceLocation },
    Identifier { name: String, location: SourceLocation },
    BinOp { op: String, left: Box<Expr>, right: Box<Expr>, location: SourceLocation },
    UnaryOp { op: String, operand: Box<Expr>, location: SourceLocation },
    Call { name: String, args: Vec<Expr>, location: SourceLocation },
    IndexAccess { array: Box<Expr>, index: Box<Expr>, location: SourceLocation },
    ArrayLiteral { elements: Vec<Expr>, location: SourceLocation },
}

impl Expr {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Expr::Literal { location, .. }
            | Expr::Identifier { location, .. }
            | Expr::BinOp { location, .. }
            | Expr::UnaryOp { location, .. }
            | Expr::Call { location, .. }
            | Expr::IndexAccess { location, .. }
            | Expr::ArrayLiteral { location, .. } => location,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl { name: String, type_node: Option<TypeNode>, initializer: Option<Expr>, location: SourceLocation },
    FuncDecl {
        name: String,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    Block { statements: Vec<Stmt>, location: SourceLocation },
    If { condition: Expr, then_block: Vec<Stmt>, else_block: Option<Vec<Stmt>>, location: SourceLocation },
    Loop {
        is_for: bool,
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Box<Stmt>>,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    Return { value: Option<Expr>, location: SourceLocation },
    Break { location: SourceLocation },
    Continue { location: SourceLocation },
    ExprStmt { expr: Expr, location: SourceLocation },
    Import { filename: String, location: SourceLocation },
    Declare { name: String, type_node: Option<TypeNode>, location: SourceLocation },
}

impl Stmt {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Stmt::VarDecl { location, .. }
            | Stmt::FuncDecl { location, .. }
            | Stmt::Block { location, .. }
            | Stmt::If { location, .. }
            | Stmt::Loop { location, .. }
            | Stmt::Return { location, .. }
            | Stmt::Break { location }
            | Stmt::Continue { location }
            | Stmt::ExprStmt { location, .. }
            | Stmt::Import { location, .. }
            | Stmt::Declare { location, .. } => location,
        }
    }
}

/// A whole parsed source file.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
