//! Turns a criteria tree into a parameterised SQL statement.

use crate::{
    ast::{
        common::TableRef,
        expr::Expr,
        select::{FromClause, JoinClause, Select, TableSource},
    },
    config::CriteriaConfig,
    context::{NodeId, SharedContext, TreeContext},
    criteria::Criteria,
    dialect::{Ansi, Dialect},
    error::{CriteriaError, Result},
    fragment::{
        Fragments, all_columns, column_expr, compare_operator, conjunction, group_items,
        has_visible_selection, having_predicates, on_condition, order_items, select_items,
    },
    node::{CriteriaNode, Filter, NodeSource, SubQuerySource},
    renderer::{Render, Renderer},
};
use model::core::value::Value;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, trace};

/// A rendered query, ready for an executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    pub result_type: Option<String>,
    pub map_key: Option<String>,
    pub map_type: Option<String>,
}

impl Statement {
    /// Stable hash of the SQL text, usable as a prepared-statement cache key.
    pub fn fingerprint(&self) -> String {
        format!("{:x}", md5::compute(&self.sql))
    }
}

/// Renders criteria trees with one dialect.
pub struct SqlManager {
    dialect: Box<dyn Dialect>,
}

impl Default for SqlManager {
    fn default() -> Self {
        Self::new(Ansi::default())
    }
}

impl SqlManager {
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self {
            dialect: Box::new(dialect),
        }
    }

    pub fn from_config(config: &CriteriaConfig) -> Self {
        Self {
            dialect: config.dialect(),
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Validates the tree of `root` and renders it. Nothing is produced
    /// unless the whole tree renders.
    pub fn render<E>(&self, root: &Criteria<E>) -> Result<Statement> {
        let select = build_select(&root.ctx, root.id)?;

        let mut renderer = Renderer::new(self.dialect.as_ref());
        select.render(&mut renderer);
        let (sql, params) = renderer.finish();

        let result = root.result_config();
        debug!(
            "rendered `{}` for {} with {} parameter(s): {}",
            root.alias(),
            self.dialect.name(),
            params.len(),
            sql
        );

        Ok(Statement {
            sql,
            params,
            result_type: result.result_type,
            map_key: result.map_key,
            map_type: result.map_type,
        })
    }

    /// Clause-by-clause text of the statement `render` would produce.
    pub fn fragments<E>(&self, root: &Criteria<E>) -> Result<Fragments> {
        let select = build_select(&root.ctx, root.id)?;
        Ok(Fragments::from_select(&select, self.dialect.as_ref()))
    }
}

/// Builds the SELECT for the tree in `ctx`, starting at `root`.
pub(crate) fn build_select(ctx: &SharedContext, root: NodeId) -> Result<Select> {
    let tree = ctx.borrow();
    tree.validate_joins()?;

    let order = walk(&tree, root);
    let mut seen = HashSet::new();
    for id in &order {
        let alias = &tree.node(*id).alias;
        if !seen.insert(alias.as_str()) {
            return Err(CriteriaError::DuplicateAlias(alias.clone()));
        }
    }
    trace!("join walk from `{}`: {:?}", tree.node(root).alias, order);

    let mut select = Select::default();
    let mut predicates = Vec::new();
    let mut having = Vec::new();

    for (position, id) in order.iter().enumerate() {
        let node = tree.node(*id);
        let is_root = position == 0;

        // Joins only shape the result when fetched.
        if is_root || node.fetch {
            select.columns.extend(projection(&tree, node, is_root)?);
            select.group_by.extend(group_items(node));
            having.extend(having_predicates(node));
            select.order_by.extend(order_items(node));
        }
        for filter in &node.filters {
            predicates.push(filter_expr(&node.alias, filter)?);
        }

        let source = table_source(node)?;
        if is_root {
            select.from = Some(FromClause {
                source,
                alias: Some(node.alias.clone()),
            });
        } else {
            select.joins.push(join_clause(&tree, node, source)?);
        }
    }

    if select.columns.is_empty() {
        return Err(CriteriaError::EmptyProjection(tree.node(root).alias.clone()));
    }

    select.where_clause = conjunction(predicates);
    select.having = conjunction(having);

    let root_node = tree.node(root);
    select.limit = root_node.limit.map(|n| Expr::Value(Value::Uint(n)));
    select.offset = root_node.offset.map(|n| Expr::Value(Value::Uint(n)));

    Ok(select)
}

/// Root first, then attached joins depth-first in attachment order.
fn walk(tree: &TreeContext, root: NodeId) -> Vec<NodeId> {
    fn visit(tree: &TreeContext, id: NodeId, order: &mut Vec<NodeId>, visited: &mut HashSet<NodeId>) {
        if !visited.insert(id) {
            return;
        }
        order.push(id);
        for child in tree.joins.children(tree.node(id).graph_key) {
            visit(tree, *child, order, visited);
        }
    }

    let mut order = Vec::new();
    visit(tree, root, &mut order, &mut HashSet::new());
    order
}

fn projection(tree: &TreeContext, node: &CriteriaNode, is_root: bool) -> Result<Vec<Expr>> {
    let mut columns = select_items(node);

    let implicit = if is_root {
        !has_visible_selection(node) && !node.has_aggregates()
    } else {
        !has_visible_selection(node)
    };
    if !implicit {
        return Ok(columns);
    }

    match &node.source {
        NodeSource::Entity(entity) => {
            let all = tree.resolver.columns(entity)?;
            columns.extend(all_columns(node, &all));
        }
        // Derived-table columns are unknown; a wildcard would bypass exclusions.
        NodeSource::SubQuery { .. } if node.excluded.is_empty() => {
            columns.push(Expr::Wildcard {
                qualifier: Some(node.alias.clone()),
            })
        }
        NodeSource::SubQuery { .. } => {}
    }
    Ok(columns)
}

fn table_source(node: &CriteriaNode) -> Result<TableSource> {
    match &node.source {
        NodeSource::Entity(entity) => Ok(TableSource::Table(TableRef {
            schema: None,
            name: entity.table().to_string(),
        })),
        NodeSource::SubQuery { sub, .. } => Ok(TableSource::SubQuery(Box::new(nested(sub)?))),
    }
}

fn nested(sub: &SubQuerySource) -> Result<Select> {
    build_select(&sub.ctx, sub.root)
}

fn join_clause(tree: &TreeContext, node: &CriteriaNode, source: TableSource) -> Result<JoinClause> {
    let edge = node.join.as_ref().ok_or_else(|| CriteriaError::IncompleteJoin {
        alias: node.alias.clone(),
        reason: "not a join".to_string(),
    })?;
    let parent = edge
        .parent
        .map(|parent| tree.node(parent).alias.as_str())
        .ok_or_else(|| CriteriaError::NullReference {
            alias: node.alias.clone(),
            context: "join has no parent".to_string(),
        })?;
    let on = on_condition(parent, &node.alias, &edge.conditions).ok_or_else(|| {
        CriteriaError::IncompleteJoin {
            alias: node.alias.clone(),
            reason: "no on-condition".to_string(),
        }
    })?;

    Ok(JoinClause {
        kind: edge.kind,
        source,
        alias: Some(node.alias.clone()),
        on,
    })
}

fn filter_expr(alias: &str, filter: &Filter) -> Result<Expr> {
    let expr = match filter {
        Filter::Compare { column, op, value } => Expr::binary(
            column_expr(alias, &column.column),
            compare_operator(*op),
            Expr::Value(value.clone()),
        ),
        Filter::InList {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                // Nothing is IN an empty list.
                Expr::Literal(if *negated { "1 = 1" } else { "1 = 0" }.to_string())
            } else {
                Expr::InList {
                    expr: Box::new(column_expr(alias, &column.column)),
                    list: values.iter().cloned().map(Expr::Value).collect(),
                    negated: *negated,
                }
            }
        }
        Filter::Null { column, negated } => Expr::IsNull {
            expr: Box::new(column_expr(alias, &column.column)),
            negated: *negated,
        },
        Filter::InSubQuery {
            column,
            sub,
            negated,
        } => Expr::InSubQuery {
            expr: Box::new(column_expr(alias, &column.column)),
            subquery: Box::new(nested(sub)?),
            negated: *negated,
        },
        Filter::Exists { sub, negated } => Expr::Exists {
            subquery: Box::new(nested(sub)?),
            negated: *negated,
        },
        Filter::Outer {
            column,
            op,
            outer_alias,
            outer_column,
        } => Expr::binary(
            column_expr(alias, &column.column),
            compare_operator(*op),
            column_expr(outer_alias, outer_column),
        ),
    };
    Ok(expr)
}
