use serde::Serialize;

use crate::lexer::{IntLit, Token};
use crate::span::Spanned;

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Form {
    Function(Function),
    Attribute(Attribute),
}

impl Form {
    /// `(name, arity)` of a function declaration; attributes have no identity.
    pub fn name_arity(&self) -> Option<(&str, usize)> {
        match self {
            Form::Function(f) => Some((&f.name.node, f.arity)),
            Form::Attribute(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Form::Function(_) => "function",
            Form::Attribute(_) => "attribute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: Spanned<String>,
    pub arity: usize,
    pub clauses: Vec<Spanned<Clause>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: Spanned<String>,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeValue {
    /// `-export([f/1]).`, `-module(m).`, `-endif.`
    Exprs(Vec<Spanned<Expr>>),
    /// Type-level attributes (`-spec`, `-type`, `-record`, ...) kept verbatim.
    Tokens(Vec<Token>),
}

/// One clause of a function, fun, `case`, `receive`, `if` or `try`.
///
/// `if` clauses have no patterns. Catch clauses always have exactly three:
/// class, reason and stacktrace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    pub patterns: Vec<Spanned<Expr>>,
    /// Guard sequence: `;`-separated guards of `,`-separated tests.
    pub guards: Vec<Vec<Spanned<Expr>>>,
    pub body: Vec<Spanned<Expr>>,
}

/// Expressions and patterns share one tree, as the grammar does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Integer(IntLit),
    Float(f64),
    Char(char),
    String(String),
    Atom(String),
    Var(String),
    Tuple(Vec<Spanned<Expr>>),
    List {
        elements: Vec<Spanned<Expr>>,
        tail: Option<Box<Spanned<Expr>>>,
    },
    Binary(Vec<BinElement>),
    Map {
        base: Option<Box<Spanned<Expr>>>,
        fields: Vec<MapField>,
    },
    Record {
        base: Option<Box<Spanned<Expr>>>,
        name: String,
        fields: Vec<RecordField>,
    },
    /// `#rec.field`
    RecordIndex {
        name: String,
        field: String,
    },
    /// `Expr#rec.field`
    RecordAccess {
        base: Box<Spanned<Expr>>,
        name: String,
        field: String,
    },
    Match {
        pattern: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
    },
    BinOp {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Call {
        function: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    /// `Module:Function`, only ever the callee of a `Call`.
    Remote {
        module: Box<Spanned<Expr>>,
        function: Box<Spanned<Expr>>,
    },
    /// `begin ... end`
    Block(Vec<Spanned<Expr>>),
    Case {
        subject: Box<Spanned<Expr>>,
        clauses: Vec<Spanned<Clause>>,
    },
    If(Vec<Spanned<Clause>>),
    Receive {
        clauses: Vec<Spanned<Clause>>,
        after: Option<After>,
    },
    Try {
        body: Vec<Spanned<Expr>>,
        of_clauses: Vec<Spanned<Clause>>,
        catch_clauses: Vec<Spanned<Clause>>,
        after: Vec<Spanned<Expr>>,
    },
    Catch(Box<Spanned<Expr>>),
    ListComp {
        template: Box<Spanned<Expr>>,
        qualifiers: Vec<Qualifier>,
    },
    BinComp {
        template: Box<Spanned<Expr>>,
        qualifiers: Vec<Qualifier>,
    },
    /// `fun (...) -> ... end`, or `fun Name(...) -> ... end` when named.
    Fun {
        name: Option<String>,
        clauses: Vec<Spanned<Clause>>,
    },
    /// `fun f/1` or `fun M:F/A`
    FunRef {
        module: Option<Box<Spanned<Expr>>>,
        function: Box<Spanned<Expr>>,
        arity: Box<Spanned<Expr>>,
    },
    /// Unexpanded preprocessor macro: `?NAME` or `?NAME(Args)`.
    Macro {
        name: String,
        args: Option<Vec<Spanned<Expr>>>,
    },
}

impl Expr {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Integer(_) => "integer",
            Expr::Float(_) => "float",
            Expr::Char(_) => "char",
            Expr::String(_) => "string",
            Expr::Atom(_) => "atom",
            Expr::Var(_) => "variable",
            Expr::Tuple(_) => "tuple",
            Expr::List { .. } => "list",
            Expr::Binary(_) => "binary",
            Expr::Map { .. } => "map",
            Expr::Record { .. } => "record",
            Expr::RecordIndex { .. } => "record_index",
            Expr::RecordAccess { .. } => "record_field",
            Expr::Match { .. } => "match",
            Expr::BinOp { .. } => "op",
            Expr::UnaryOp { .. } => "op",
            Expr::Call { .. } => "call",
            Expr::Remote { .. } => "remote",
            Expr::Block(_) => "block",
            Expr::Case { .. } => "case",
            Expr::If(_) => "if",
            Expr::Receive { .. } => "receive",
            Expr::Try { .. } => "try",
            Expr::Catch(_) => "catch",
            Expr::ListComp { .. } => "lc",
            Expr::BinComp { .. } => "bc",
            Expr::Fun { .. } => "fun",
            Expr::FunRef { .. } => "fun_ref",
            Expr::Macro { .. } => "macro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Send,
    Orelse,
    Andalso,
    Eq,
    Neq,
    ExactEq,
    ExactNeq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Append,
    Subtract,
    Add,
    Sub,
    Bor,
    Bxor,
    Bsl,
    Bsr,
    Or,
    Xor,
    Mul,
    Div,
    IntDiv,
    Rem,
    Band,
    And,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Neq | BinOp::ExactEq | BinOp::ExactNeq
                | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Send => "!",
            BinOp::Orelse => "orelse",
            BinOp::Andalso => "andalso",
            BinOp::Eq => "==",
            BinOp::Neq => "/=",
            BinOp::ExactEq => "=:=",
            BinOp::ExactNeq => "=/=",
            BinOp::Lt => "<",
            BinOp::LtEq => "=<",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Append => "++",
            BinOp::Subtract => "--",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Bor => "bor",
            BinOp::Bxor => "bxor",
            BinOp::Bsl => "bsl",
            BinOp::Bsr => "bsr",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::IntDiv => "div",
            BinOp::Rem => "rem",
            BinOp::Band => "band",
            BinOp::And => "and",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Neg,
    Bnot,
    Not,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Bnot => "bnot",
            UnaryOp::Not => "not",
        }
    }
}

/// `Value:Size/type-unit:8` inside `<< >>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinElement {
    pub value: Spanned<Expr>,
    pub size: Option<Spanned<Expr>>,
    pub types: Vec<BinType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinType {
    pub name: String,
    /// `unit:8` carries its numeric argument.
    pub arg: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MapOp {
    /// `=>`
    Assoc,
    /// `:=`
    Exact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapField {
    pub key: Spanned<Expr>,
    pub op: MapOp,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordField {
    /// Field name, or `_` for the catch-all field.
    pub name: Spanned<String>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Qualifier {
    /// `Pattern <- List`
    Generator { pattern: Spanned<Expr>, source: Spanned<Expr> },
    /// `Pattern <= Binary`
    BinGenerator { pattern: Spanned<Expr>, source: Spanned<Expr> },
    Filter(Spanned<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct After {
    pub timeout: Box<Spanned<Expr>>,
    pub body: Vec<Spanned<Expr>>,
}
