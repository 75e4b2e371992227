//! Type tokens for entities and their properties.
//!
//! An entity is a Rust type standing for one mapped table. Properties are
//! addressed through [`Property<E>`] constants, which tie a property name to
//! its owning entity at compile time and erase to a hashable [`PropertyRef`]
//! when they cross into the untyped parts of the system.

use crate::metadata::ColumnMeta;
use std::{any::TypeId, fmt, marker::PhantomData};

/// Runtime identity of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityType {
    type_id: TypeId,
    name: &'static str,
    table: &'static str,
}

impl EntityType {
    pub fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            name: E::NAME,
            table: E::TABLE,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Simple name of the entity, e.g. `Order`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Physical table the entity maps to.
    pub fn table(&self) -> &'static str {
        self.table
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub trait Entity: 'static {
    const NAME: &'static str;
    const TABLE: &'static str;

    fn entity_type() -> EntityType
    where
        Self: Sized,
    {
        EntityType::of::<Self>()
    }
}

/// An entity that can describe its own column mapping.
///
/// Implemented by the [`entity!`](crate::entity) macro so that a
/// [`MetadataRegistry`](crate::metadata::MetadataRegistry) can be populated
/// without hand-written metadata.
pub trait Mapped: Entity {
    fn columns() -> Vec<ColumnMeta>;
}

/// A typed reference to a property of entity `E`.
pub struct Property<E> {
    name: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Property<E> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _entity: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<E: Entity> Property<E> {
    pub fn erase(&self) -> PropertyRef {
        PropertyRef {
            entity: EntityType::of::<E>(),
            name: self.name,
        }
    }
}

impl<E> Clone for Property<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Property<E> {}

impl<E> PartialEq for Property<E> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<E> Eq for Property<E> {}

impl<E> fmt::Debug for Property<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&self.name).finish()
    }
}

/// Entity-erased property reference. Its `Hash`/`Eq` is the structural
/// identity `(entity type, property name)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    entity: EntityType,
    name: &'static str,
}

impl PropertyRef {
    pub fn new(entity: EntityType, name: &'static str) -> Self {
        Self { entity, name }
    }

    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity.name, self.name)
    }
}
