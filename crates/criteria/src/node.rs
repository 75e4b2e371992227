//! Resolved, alias-free state of one query scope.
//!
//! Everything here is stored without table qualification; the fragment
//! assembler qualifies columns with the owning node's alias at render time.

use crate::{
    ast::common::{JoinKind, NullPrecedence, OrderDir},
    context::{NodeId, TreeContext},
};
use model::{
    core::{entity::EntityType, value::Value},
    metadata::ColumnMeta,
};
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::HashSet,
    fmt,
    rc::{Rc, Weak},
    sync::Arc,
};

/// A column of the owning node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnRef {
    pub column: String,
    /// Property name when addressed through a typed property.
    pub property: Option<&'static str>,
    /// Keeps the resolver's cache entry alive for as long as the node is.
    pub meta: Option<Arc<ColumnMeta>>,
}

impl ColumnRef {
    pub fn raw(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            property: None,
            meta: None,
        }
    }

    pub fn resolved(property: &'static str, meta: Arc<ColumnMeta>) -> Self {
        Self {
            column: meta.column.clone(),
            property: Some(property),
            meta: Some(meta),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
            AggregateFn::Avg => "AVG",
            AggregateFn::Min => "MIN",
            AggregateFn::Max => "MAX",
        }
    }

    /// MIN/MAX over distinct values equals MIN/MAX over all values.
    pub fn supports_distinct(&self) -> bool {
        matches!(self, AggregateFn::Count | AggregateFn::Sum | AggregateFn::Avg)
    }

    pub fn supports_scale(&self) -> bool {
        matches!(self, AggregateFn::Sum | AggregateFn::Avg)
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Aggregate {
    pub func: AggregateFn,
    /// `None` aggregates over `*`.
    pub column: Option<ColumnRef>,
    pub alias: Option<String>,
    pub scale: Option<u32>,
    pub distinct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SelectItem {
    Column {
        column: ColumnRef,
        alias: Option<String>,
    },
    Aggregate(Aggregate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Having {
    pub aggregate: Aggregate,
    pub op: CompareOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SortSpec {
    pub column: ColumnRef,
    pub direction: OrderDir,
    pub ignore_case: bool,
    pub nulls: NullPrecedence,
}

/// A WHERE predicate contributed by one node.
#[derive(Debug, Clone)]
pub(crate) enum Filter {
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: Value,
    },
    InList {
        column: ColumnRef,
        values: Vec<Value>,
        negated: bool,
    },
    Null {
        column: ColumnRef,
        negated: bool,
    },
    InSubQuery {
        column: ColumnRef,
        sub: SubQuerySource,
        negated: bool,
    },
    Exists {
        sub: SubQuerySource,
        negated: bool,
    },
    /// Correlated comparison against a column of the enclosing query.
    Outer {
        column: ColumnRef,
        op: CompareOp,
        outer_alias: String,
        outer_column: String,
    },
}

/// A criteria tree nested inside another one.
#[derive(Clone)]
pub(crate) struct SubQuerySource {
    pub ctx: Rc<RefCell<TreeContext>>,
    pub root: NodeId,
}

impl fmt::Debug for SubQuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubQuerySource")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeSource {
    Entity(EntityType),
    /// Derived table; `entity` is the inner root's entity, used to resolve
    /// typed properties against the sub-query's projection.
    SubQuery {
        sub: SubQuerySource,
        entity: EntityType,
    },
}

impl NodeSource {
    pub fn entity(&self) -> &EntityType {
        match self {
            NodeSource::Entity(entity) => entity,
            NodeSource::SubQuery { entity, .. } => entity,
        }
    }
}

/// Non-owning link from a sub-query to the node that encloses it.
#[derive(Debug, Clone)]
pub(crate) struct OuterRef {
    pub ctx: Weak<RefCell<TreeContext>>,
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OnCondition {
    /// Column of the parent the join is attached to.
    pub left: String,
    /// Column of the joined node.
    pub right: String,
}

/// Join bookkeeping of a node created by a join factory.
#[derive(Debug, Clone)]
pub(crate) struct JoinEdge {
    pub kind: JoinKind,
    /// Node the join was created from.
    pub reference: NodeId,
    /// Node the join is attached to; `Some` once attached.
    pub parent: Option<NodeId>,
    pub conditions: Vec<OnCondition>,
}

/// Lifecycle of a join node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    Created,
    Conditioned,
    Attached,
}

impl JoinEdge {
    pub fn state(&self) -> JoinState {
        if self.parent.is_some() {
            JoinState::Attached
        } else if !self.conditions.is_empty() {
            JoinState::Conditioned
        } else {
            JoinState::Created
        }
    }
}

/// Result-mapping settings inherited by joins and sub-queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultConfig {
    pub result_type: Option<String>,
    pub map_key: Option<String>,
    pub map_type: Option<String>,
    pub property_as_alias: bool,
}

/// One logical table or derived table of the statement.
#[derive(Debug, Clone)]
pub(crate) struct CriteriaNode {
    pub source: NodeSource,
    pub alias: String,
    pub selected: Vec<SelectItem>,
    pub excluded: HashSet<String>,
    pub group_by: Vec<ColumnRef>,
    pub having: Vec<Having>,
    pub filters: Vec<Filter>,
    pub order_by: Vec<SortSpec>,
    pub result: ResultConfig,
    pub fetch: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub join: Option<JoinEdge>,
    /// Key of the join list this node reads its children from. Branches
    /// share the key of the node they were branched from.
    pub graph_key: NodeId,
    pub outer: Option<OuterRef>,
}

impl CriteriaNode {
    pub fn new(source: NodeSource, alias: String, id: NodeId) -> Self {
        Self {
            source,
            alias,
            selected: Vec::new(),
            excluded: HashSet::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            result: ResultConfig::default(),
            fetch: false,
            limit: None,
            offset: None,
            join: None,
            graph_key: id,
            outer: None,
        }
    }

    pub fn has_aggregates(&self) -> bool {
        self.selected
            .iter()
            .any(|item| matches!(item, SelectItem::Aggregate(_)))
    }

    /// Copy of the node-local state for a branch. Join linkage is dropped:
    /// a branch is a root that shares the original's join list.
    pub fn branch(&self) -> Self {
        Self {
            join: None,
            ..self.clone()
        }
    }
}
