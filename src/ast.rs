// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the Kat programming language.
//
// The AST is a closed set of node variants split into expressions (Expr),
// which produce a value, and statements (Stmt), which produce an effect and
// optionally a value. Every node keeps the token it started from so the
// evaluator can point diagnostics at the source. Nodes are never mutated
// after the parser returns them.

use crate::lexer::Token;
use serde::Serialize;
use std::rc::Rc;

/// Prefix (unary) operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefixOp {
    Negate,
    Not,
    Increment,
    Decrement,
}

impl PrefixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            PrefixOp::Negate => "-",
            PrefixOp::Not => "!",
            PrefixOp::Increment => "++",
            PrefixOp::Decrement => "--",
        }
    }
}

/// Postfix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

impl PostfixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            PostfixOp::Increment => "++",
            PostfixOp::Decrement => "--",
        }
    }
}

/// Binary operators, including assignment and member access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    Assign,
    Member,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Assign => "=",
            BinaryOp::Member => ".",
        }
    }
}

/// Represents an expression in Kat - something that evaluates to a value
#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    Integer {
        token: Token,
        value: i64,
    },
    Float {
        token: Token,
        value: f64,
    },
    Boolean {
        token: Token,
        value: bool,
    },
    Str {
        token: Token,
        value: String,
    },
    Identifier {
        token: Token,
        name: String,
    },
    /// The `self` keyword inside a method body
    SelfRef {
        token: Token,
    },
    Prefix {
        token: Token,
        op: PrefixOp,
        right: Box<Expr>,
    },
    Postfix {
        token: Token,
        op: PostfixOp,
        left: Box<Expr>,
    },
    Binary {
        token: Token,
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        token: Token,
        condition: Box<Expr>,
        then_arm: Box<Expr>,
        else_arm: Box<Expr>,
    },
    Array {
        token: Token,
        elements: Vec<Expr>,
    },
    /// Map literal; entries keep their source order
    Map {
        token: Token,
        entries: Vec<(Expr, Expr)>,
    },
    Index {
        token: Token,
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        token: Token,
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `Name { field: value, ... }`
    StructLiteral {
        token: Token,
        name: String,
        fields: Vec<(String, Expr)>,
    },
    /// Anonymous function `fn(a, b) { ... }`
    Function {
        token: Token,
        params: Vec<String>,
        body: Rc<Block>,
    },
    /// `import("name")`
    Import {
        token: Token,
        path: Box<Expr>,
    },
}

impl Expr {
    /// The token this expression started from
    pub fn token(&self) -> &Token {
        match self {
            Expr::Integer { token, .. }
            | Expr::Float { token, .. }
            | Expr::Boolean { token, .. }
            | Expr::Str { token, .. }
            | Expr::Identifier { token, .. }
            | Expr::SelfRef { token }
            | Expr::Prefix { token, .. }
            | Expr::Postfix { token, .. }
            | Expr::Binary { token, .. }
            | Expr::Ternary { token, .. }
            | Expr::Array { token, .. }
            | Expr::Map { token, .. }
            | Expr::Index { token, .. }
            | Expr::Call { token, .. }
            | Expr::StructLiteral { token, .. }
            | Expr::Function { token, .. }
            | Expr::Import { token, .. } => token,
        }
    }

    /// Returns the identifier name if this is a plain identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Brace-delimited statement sequence
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub token: Token,
    pub body: Vec<Stmt>,
}

/// Where a function declaration binds its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FunctionTarget {
    /// `fn name(...)`
    Name(String),
    /// `fn Receiver.method(...)`, attached to an already-declared struct
    Method { receiver: String, method: String },
}

/// Represents a statement in Kat - an action or declaration
#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    Expression {
        expr: Expr,
    },
    Let {
        token: Token,
        target: Expr,
        value: Expr,
    },
    Const {
        token: Token,
        target: Expr,
        value: Expr,
    },
    Struct {
        token: Token,
        name: String,
        fields: Vec<String>,
    },
    Function {
        token: Token,
        target: FunctionTarget,
        params: Vec<String>,
        body: Rc<Block>,
    },
    Block(Block),
    If {
        token: Token,
        condition: Expr,
        then_branch: Block,
        /// Either a `Block` or another `If` for `else if` chains
        else_branch: Option<Box<Stmt>>,
    },
    /// `for let i = 0; i < n; i++ { ... }`
    ClassicFor {
        token: Token,
        init: Box<Stmt>,
        condition: Expr,
        post: Expr,
        body: Block,
    },
    /// `for condition { ... }`
    ModernFor {
        token: Token,
        condition: Expr,
        body: Block,
    },
    Return {
        token: Token,
        value: Option<Expr>,
    },
}

impl Stmt {
    /// The token this statement started from
    pub fn token(&self) -> &Token {
        match self {
            Stmt::Expression { expr } => expr.token(),
            Stmt::Block(block) => &block.token,
            Stmt::Let { token, .. }
            | Stmt::Const { token, .. }
            | Stmt::Struct { token, .. }
            | Stmt::Function { token, .. }
            | Stmt::If { token, .. }
            | Stmt::ClassicFor { token, .. }
            | Stmt::ModernFor { token, .. }
            | Stmt::Return { token, .. } => token,
        }
    }
}

/// The root of a parsed source unit
#[derive(Debug, Clone, Default, Serialize)]
pub struct Program {
    pub body: Vec<Stmt>,
}
