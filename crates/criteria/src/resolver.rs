//! Property-to-column resolution.
//!
//! [`CachedResolver`] answers lookups from a [`ColumnCache`] shared by every
//! query tree in the process, keyed by provider and property. Cached values
//! are held weakly: a mapping stays in memory only while its provider is alive
//! and some criteria node still holds its `Arc`. The next miss after that
//! repopulates it from the [`MetadataProvider`].

use crate::error::{CriteriaError, Result};
use dashmap::{DashMap, mapref::entry::Entry};
use lazy_static::lazy_static;
use model::{
    core::entity::{EntityType, PropertyRef},
    metadata::{ColumnMeta, MetadataProvider},
};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Resolves typed property references to column metadata.
pub trait PropertyResolver: Send + Sync {
    fn resolve(&self, property: &PropertyRef) -> Result<Arc<ColumnMeta>>;

    /// Every mapped column of `entity`, in declaration order.
    fn columns(&self, entity: &EntityType) -> Result<Vec<Arc<ColumnMeta>>>;
}

lazy_static! {
    static ref GLOBAL_CACHE: Arc<ColumnCache> = Arc::new(ColumnCache::new());
}

/// Weak pair of the provider a mapping came from and the mapping itself.
/// An entry is live only while both are.
#[derive(Debug)]
struct CachedColumn {
    provider: Weak<dyn MetadataProvider>,
    meta: Weak<ColumnMeta>,
}

impl CachedColumn {
    fn new(provider: &Arc<dyn MetadataProvider>, meta: &Arc<ColumnMeta>) -> Self {
        Self {
            provider: Arc::downgrade(provider),
            meta: Arc::downgrade(meta),
        }
    }

    fn upgrade(&self) -> Option<Arc<ColumnMeta>> {
        self.provider.upgrade()?;
        self.meta.upgrade()
    }

    fn is_live(&self) -> bool {
        self.provider.strong_count() > 0 && self.meta.strong_count() > 0
    }
}

/// Provider identity plus property identity. Two providers never share an
/// entry, even for the same property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    provider: usize,
    property: PropertyRef,
}

impl CacheKey {
    fn new(provider: &Arc<dyn MetadataProvider>, property: PropertyRef) -> Self {
        Self {
            provider: Arc::as_ptr(provider) as *const () as usize,
            property,
        }
    }
}

/// Concurrent map from (provider, property) to weakly held column metadata.
#[derive(Debug, Default)]
pub struct ColumnCache {
    entries: DashMap<CacheKey, CachedColumn>,
}

impl ColumnCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by [`CachedResolver::new`].
    pub fn global() -> Arc<ColumnCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Returns the live mapping `provider` gave for `property`, or runs `load`
    /// and caches its result. `load` runs while the key's shard is
    /// write-locked, so concurrent misses on one key compute it once.
    pub fn get_or_load<F>(
        &self,
        provider: &Arc<dyn MetadataProvider>,
        property: PropertyRef,
        load: F,
    ) -> Result<Arc<ColumnMeta>>
    where
        F: FnOnce() -> Result<ColumnMeta>,
    {
        let key = CacheKey::new(provider, property);
        if let Some(live) = self.entries.get(&key).and_then(|cached| cached.upgrade()) {
            trace!("column cache hit for {}", property);
            return Ok(live);
        }

        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                if let Some(live) = entry.get().upgrade() {
                    return Ok(live);
                }
                trace!("column cache entry for {} was reclaimed, reloading", property);
                let meta = Arc::new(load()?);
                entry.insert(CachedColumn::new(provider, &meta));
                Ok(meta)
            }
            Entry::Vacant(entry) => {
                trace!("column cache miss for {}", property);
                let meta = Arc::new(load()?);
                entry.insert(CachedColumn::new(provider, &meta));
                Ok(meta)
            }
        }
    }

    /// Drops entries whose metadata is no longer referenced anywhere.
    /// Returns how many were removed.
    pub fn purge(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| cached.is_live());
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// [`PropertyResolver`] backed by a metadata provider and a [`ColumnCache`].
#[derive(Clone)]
pub struct CachedResolver {
    provider: Arc<dyn MetadataProvider>,
    cache: Arc<ColumnCache>,
}

impl CachedResolver {
    /// Resolver sharing the process-wide cache.
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self::with_cache(provider, ColumnCache::global())
    }

    pub fn with_cache(provider: Arc<dyn MetadataProvider>, cache: Arc<ColumnCache>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &Arc<ColumnCache> {
        &self.cache
    }
}

impl PropertyResolver for CachedResolver {
    fn resolve(&self, property: &PropertyRef) -> Result<Arc<ColumnMeta>> {
        self.cache.get_or_load(&self.provider, *property, || {
            self.provider
                .column(property.entity(), property.name())
                .ok_or_else(|| unresolved(property.entity(), property.name()))
        })
    }

    fn columns(&self, entity: &EntityType) -> Result<Vec<Arc<ColumnMeta>>> {
        let columns = self
            .provider
            .columns(entity)
            .ok_or_else(|| unresolved(entity, "*"))?;

        Ok(columns.into_iter().map(Arc::new).collect())
    }
}

pub(crate) fn unresolved(entity: &EntityType, property: &str) -> CriteriaError {
    CriteriaError::UnresolvedProperty {
        entity: entity.name().to_string(),
        property: property.to_string(),
    }
}
