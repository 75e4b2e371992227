use crate::{
    core::entity::{EntityType, Mapped},
    metadata::{ColumnMeta, EntityMeta, MetadataError, MetadataProvider},
};
use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
};

/// In-memory [`MetadataProvider`] populated from [`Mapped`] entities.
#[derive(Debug, Default, Clone)]
pub struct MetadataRegistry {
    entities: HashMap<TypeId, EntityMeta>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the column mapping declared by `E`.
    pub fn register<E: Mapped>(&mut self) -> Result<(), MetadataError> {
        let entity = EntityType::of::<E>();
        self.insert(
            entity,
            EntityMeta {
                name: entity.name().to_string(),
                table: entity.table().to_string(),
                columns: E::columns(),
            },
        )
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with<E: Mapped>(mut self) -> Result<Self, MetadataError> {
        self.register::<E>()?;
        Ok(self)
    }

    pub fn insert(&mut self, entity: EntityType, meta: EntityMeta) -> Result<(), MetadataError> {
        if self.entities.contains_key(&entity.type_id()) {
            return Err(MetadataError::DuplicateEntity(entity.name().to_string()));
        }

        let mut seen = HashSet::new();
        for column in &meta.columns {
            if !seen.insert(column.property.as_str()) {
                return Err(MetadataError::DuplicateProperty {
                    entity: meta.name.clone(),
                    property: column.property.clone(),
                });
            }
        }

        self.entities.insert(entity.type_id(), meta);
        Ok(())
    }

    pub fn entity(&self, entity: &EntityType) -> Option<&EntityMeta> {
        self.entities.get(&entity.type_id())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl MetadataProvider for MetadataRegistry {
    fn column(&self, entity: &EntityType, property: &str) -> Option<ColumnMeta> {
        self.entity(entity)
            .and_then(|meta| meta.column(property))
            .cloned()
    }

    fn columns(&self, entity: &EntityType) -> Option<Vec<ColumnMeta>> {
        self.entity(entity).map(|meta| meta.columns.clone())
    }
}
