//! Defines the AST for SQL expressions.

use crate::ast::select::Select;
use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or table identifier, e.g., `users` or `users.id`.
    Identifier(Ident),

    /// All columns of a table, e.g. `t.*`.
    Wildcard { qualifier: Option<String> },

    /// A literal value bound as a statement parameter.
    Value(Value),

    /// Raw SQL text emitted verbatim, e.g. the scale in `ROUND(x, 2)`.
    Literal(String),

    /// A binary operation, e.g., `column = 'value'` or `a AND b`.
    BinaryOp(Box<BinaryOp>),

    /// A function call, e.g., `COUNT(*)` or `SUM(DISTINCT price)`.
    FunctionCall(FunctionCall),

    /// An aliased expression, e.g. `COUNT(*) AS total_count`
    Alias { expr: Box<Expr>, alias: String },

    /// `expr [NOT] IN (v1, v2, ...)`
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expr>, negated: bool },

    /// `expr [NOT] IN (SELECT ...)`
    InSubQuery {
        expr: Box<Expr>,
        subquery: Box<Select>,
        negated: bool,
    },

    /// `[NOT] EXISTS (SELECT ...)`
    Exists {
        subquery: Box<Select>,
        negated: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 't' in 't.id'
    pub name: String,              // e.g., the 'id' in 't.id'
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub wildcard: bool, // represents the '*' in 'COUNT(*)'
    pub distinct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,    // =
    NotEq, // <>
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=
    Like,

    // Logical
    And,
    Or,
}

impl Expr {
    pub fn qualified(qualifier: &str, name: &str) -> Self {
        Expr::Identifier(Ident {
            qualifier: Some(qualifier.to_string()),
            name: name.to_string(),
        })
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }

    pub fn aliased(self, alias: Option<&str>) -> Self {
        match alias {
            Some(alias) => Expr::Alias {
                expr: Box::new(self),
                alias: alias.to_string(),
            },
            None => self,
        }
    }
}
