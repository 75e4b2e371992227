//! Defines the Abstract Syntax Tree (AST) for a SELECT query.

use crate::ast::{
    common::{JoinKind, NullPrecedence, OrderDir, TableRef},
    expr::Expr,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Select {
    /// The list of columns or expressions to be returned.
    /// e.g., `t.id`, `COUNT(*)`
    pub columns: Vec<Expr>,

    /// The primary table (or derived table) for the query.
    pub from: Option<FromClause>,

    /// JOIN clauses in emission order.
    pub joins: Vec<JoinClause>,

    pub where_clause: Option<Expr>,

    pub group_by: Vec<Expr>,

    pub having: Option<Expr>,

    pub order_by: Vec<OrderByExpr>,

    pub limit: Option<Expr>,

    pub offset: Option<Expr>,
}

/// What a FROM or JOIN item reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Table(TableRef),
    /// A parenthesised sub-query used as a derived table.
    SubQuery(Box<Select>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub source: TableSource,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub source: TableSource,
    pub alias: Option<String>,
    /// The join condition, e.g., `ON t.customer_id = c.id`.
    pub on: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: Option<OrderDir>,
    pub nulls: NullPrecedence,
    /// Compare case-insensitively by folding the expression first.
    pub ignore_case: bool,
}
