use thiserror::Error;

pub type Result<T> = std::result::Result<T, CriteriaError>;

/// Errors raised while building or rendering a criteria tree.
///
/// All of them point at a defect in how the caller assembled the query and
/// are never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    /// A node needed its reference (join parent or outer query) but has none.
    #[error("criteria `{alias}` has no reference query: {context}")]
    NullReference { alias: String, context: String },

    /// The metadata provider has no column for this property.
    #[error("no column mapping for property `{property}` of entity `{entity}`")]
    UnresolvedProperty { entity: String, property: String },

    /// Two live nodes of one tree claimed the same alias.
    #[error("alias `{0}` is already in use in this query")]
    DuplicateAlias(String),

    /// A join reached render time without being attached or conditioned.
    #[error("join `{alias}` is incomplete: {reason}")]
    IncompleteJoin { alias: String, reason: String },

    /// The join is already linked to a parent.
    #[error("join `{alias}` is already attached to `{parent}`")]
    JoinAlreadyAttached { alias: String, parent: String },

    /// A node from a different tree was used where a node of this tree is required.
    #[error("criteria `{0}` belongs to a different query tree")]
    ForeignNode(String),

    /// Attaching or nesting would make a query contain itself.
    #[error("criteria `{0}` would contain itself")]
    Cycle(String),

    /// Exclusions removed every column the statement could select.
    #[error("criteria `{0}` has no columns left to select")]
    EmptyProjection(String),

    #[error("configuration error: {0}")]
    Config(String),
}
