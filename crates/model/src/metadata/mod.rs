//! Read-only property-to-column lookup consumed by the criteria builder.

use crate::core::entity::EntityType;
use thiserror::Error;

pub mod column;
pub mod registry;

pub use column::{ColumnMeta, EntityMeta};
pub use registry::MetadataRegistry;

/// Source of entity column mappings.
///
/// Implementations must be immutable for the lifetime of the process: callers
/// cache what they get back and never ask twice for a live mapping.
pub trait MetadataProvider: Send + Sync {
    /// Column mapped to `property` of `entity`, if any.
    fn column(&self, entity: &EntityType, property: &str) -> Option<ColumnMeta>;

    /// Every mapped column of `entity` in declaration order, or `None` when
    /// the entity itself is unknown.
    fn columns(&self, entity: &EntityType) -> Option<Vec<ColumnMeta>>;
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("entity `{0}` is already registered")]
    DuplicateEntity(String),

    #[error("entity `{entity}` maps property `{property}` twice")]
    DuplicateProperty { entity: String, property: String },
}
