//! Per-node clause pieces.
//!
//! Each function turns the state of a single node into AST fragments,
//! qualifying columns with the node's alias. The manager stitches the pieces
//! of every node of a tree into one [`Select`].

use crate::{
    ast::{
        expr::{BinaryOperator, Expr, FunctionCall},
        select::{OrderByExpr, Select},
    },
    dialect::Dialect,
    node::{Aggregate, CompareOp, CriteriaNode, OnCondition, SelectItem},
    renderer::{Render, Renderer},
};
use model::{core::value::Value, metadata::ColumnMeta};
use serde::Serialize;
use std::sync::Arc;

pub(crate) fn column_expr(alias: &str, column: &str) -> Expr {
    Expr::qualified(alias, column)
}

pub(crate) fn compare_operator(op: CompareOp) -> BinaryOperator {
    match op {
        CompareOp::Eq => BinaryOperator::Eq,
        CompareOp::NotEq => BinaryOperator::NotEq,
        CompareOp::Lt => BinaryOperator::Lt,
        CompareOp::LtEq => BinaryOperator::LtEq,
        CompareOp::Gt => BinaryOperator::Gt,
        CompareOp::GtEq => BinaryOperator::GtEq,
        CompareOp::Like => BinaryOperator::Like,
    }
}

/// `FUNC([DISTINCT] alias.column)`, wrapped in `ROUND(.., scale)` when scaled.
pub(crate) fn aggregate_expr(alias: &str, aggregate: &Aggregate) -> Expr {
    let call = match &aggregate.column {
        Some(column) => FunctionCall {
            name: aggregate.func.sql_name().to_string(),
            args: vec![column_expr(alias, &column.column)],
            wildcard: false,
            distinct: aggregate.distinct,
        },
        None => FunctionCall {
            name: aggregate.func.sql_name().to_string(),
            args: Vec::new(),
            wildcard: true,
            distinct: false,
        },
    };

    match aggregate.scale {
        Some(scale) => Expr::FunctionCall(FunctionCall {
            name: "ROUND".to_string(),
            args: vec![Expr::FunctionCall(call), Expr::Literal(scale.to_string())],
            wildcard: false,
            distinct: false,
        }),
        None => Expr::FunctionCall(call),
    }
}

/// Explicit projection of `node`: plain columns minus exclusions, then
/// aggregates, in insertion order.
pub(crate) fn select_items(node: &CriteriaNode) -> Vec<Expr> {
    node.selected
        .iter()
        .filter_map(|item| match item {
            SelectItem::Column { column, alias } => {
                if node.excluded.contains(&column.column) {
                    return None;
                }
                let alias = alias.as_deref().or(match column.property {
                    Some(property) if node.result.property_as_alias => Some(property),
                    _ => None,
                });
                Some(column_expr(&node.alias, &column.column).aliased(alias))
            }
            SelectItem::Aggregate(aggregate) => {
                Some(aggregate_expr(&node.alias, aggregate).aliased(aggregate.alias.as_deref()))
            }
        })
        .collect()
}

/// Whether `node` still selects a plain column once exclusions apply.
pub(crate) fn has_visible_selection(node: &CriteriaNode) -> bool {
    node.selected.iter().any(|item| match item {
        SelectItem::Column { column, .. } => !node.excluded.contains(&column.column),
        SelectItem::Aggregate(_) => false,
    })
}

/// Every mapped column of `node`'s entity, minus exclusions.
pub(crate) fn all_columns(node: &CriteriaNode, columns: &[Arc<ColumnMeta>]) -> Vec<Expr> {
    columns
        .iter()
        .filter(|meta| !node.excluded.contains(&meta.column))
        .map(|meta| {
            let alias = node
                .result
                .property_as_alias
                .then_some(meta.property.as_str());
            column_expr(&node.alias, &meta.column).aliased(alias)
        })
        .collect()
}

pub(crate) fn group_items(node: &CriteriaNode) -> Vec<Expr> {
    node.group_by
        .iter()
        .map(|column| column_expr(&node.alias, &column.column))
        .collect()
}

pub(crate) fn having_predicates(node: &CriteriaNode) -> Vec<Expr> {
    node.having
        .iter()
        .map(|having| {
            Expr::binary(
                aggregate_expr(&node.alias, &having.aggregate),
                compare_operator(having.op),
                Expr::Value(having.value.clone()),
            )
        })
        .collect()
}

pub(crate) fn order_items(node: &CriteriaNode) -> Vec<OrderByExpr> {
    node.order_by
        .iter()
        .map(|sort| OrderByExpr {
            expr: column_expr(&node.alias, &sort.column.column),
            direction: Some(sort.direction),
            nulls: sort.nulls,
            ignore_case: sort.ignore_case,
        })
        .collect()
}

/// `(parent.left = joined.right) AND ...` in insertion order.
pub(crate) fn on_condition(parent: &str, joined: &str, conditions: &[OnCondition]) -> Option<Expr> {
    conjunction(conditions.iter().map(|condition| {
        Expr::binary(
            column_expr(parent, &condition.left),
            BinaryOperator::Eq,
            column_expr(joined, &condition.right),
        )
    }))
}

/// Left-folds `predicates` with AND.
pub(crate) fn conjunction(predicates: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    predicates
        .into_iter()
        .reduce(|acc, next| Expr::binary(acc, BinaryOperator::And, next))
}

/// Clause bodies of a rendered statement, without their keywords.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fragments {
    pub select: String,
    /// Main table with its alias followed by every JOIN clause.
    pub from: String,
    pub where_clause: Option<String>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub order_by: Option<String>,
    /// Parameters of all fragments, numbered as in the full statement.
    pub params: Vec<Value>,
}

impl Fragments {
    pub(crate) fn from_select(select: &Select, dialect: &dyn Dialect) -> Self {
        let mut r = Renderer::new(dialect);

        let columns = capture(&mut r, |r| r.render_list(&select.columns));
        let from = capture(&mut r, |r| {
            if let Some(from) = &select.from {
                from.source.render(r);
                r.render_table_alias(from.alias.as_deref());
            }
            for join in &select.joins {
                r.sql.push(' ');
                join.render(r);
            }
        });
        let where_clause = select
            .where_clause
            .as_ref()
            .map(|expr| capture(&mut r, |r| expr.render(r)));
        let group_by = (!select.group_by.is_empty())
            .then(|| capture(&mut r, |r| r.render_list(&select.group_by)));
        let having = select
            .having
            .as_ref()
            .map(|expr| capture(&mut r, |r| expr.render(r)));
        let order_by = (!select.order_by.is_empty())
            .then(|| capture(&mut r, |r| r.render_list(&select.order_by)));

        let (_, params) = r.finish();
        Self {
            select: columns,
            from: from.trim_start().to_string(),
            where_clause,
            group_by,
            having,
            order_by,
            params,
        }
    }
}

fn capture(r: &mut Renderer, write: impl FnOnce(&mut Renderer)) -> String {
    let start = r.sql.len();
    write(r);
    r.sql[start..].to_string()
}
