//! The typed criteria handle and its capability traits.
//!
//! A [`Criteria<E>`] is a cheap handle onto one node of a query tree. Every
//! node of a tree (root, joins, branches) shares one context holding the node
//! arena, the alias registry, the join graph and the property resolver.
//! Handles are `!Send`: a tree is assembled on one thread.

pub mod aggregate;
pub mod filter;
pub mod group;
pub mod join;
pub mod select;
pub mod sort;

use crate::{
    config::CriteriaConfig,
    context::{NodeId, SharedContext, TreeContext},
    error::{CriteriaError, Result},
    node::{ColumnRef, JoinState, NodeSource, OuterRef, ResultConfig},
    resolver::PropertyResolver,
};
use model::core::entity::{Entity, EntityType, Property};
use std::{fmt, marker::PhantomData, rc::Rc, sync::Arc};

/// Column addressing: a typed property resolved through the tree's
/// [`PropertyResolver`], or a raw column name used as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<E> {
    Property(Property<E>),
    Column(String),
}

impl<E> From<Property<E>> for Target<E> {
    fn from(property: Property<E>) -> Self {
        Target::Property(property)
    }
}

impl<E> From<&str> for Target<E> {
    fn from(column: &str) -> Self {
        Target::Column(column.to_string())
    }
}

impl<E> From<String> for Target<E> {
    fn from(column: String) -> Self {
        Target::Column(column)
    }
}

/// Handle onto one node of a criteria tree rooted at, or joining, entity `E`.
pub struct Criteria<E> {
    pub(crate) ctx: SharedContext,
    pub(crate) id: NodeId,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Criteria<E> {
    fn clone(&self) -> Self {
        Self::from_parts(Rc::clone(&self.ctx), self.id)
    }
}

impl<E> fmt::Debug for Criteria<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.ctx.borrow();
        let node = ctx.node(self.id);
        f.debug_struct("Criteria")
            .field("entity", &node.source.entity().name())
            .field("alias", &node.alias)
            .field("id", &self.id)
            .finish()
    }
}

impl<E> Criteria<E> {
    pub(crate) fn from_parts(ctx: SharedContext, id: NodeId) -> Self {
        Self {
            ctx,
            id,
            _entity: PhantomData,
        }
    }

    pub fn alias(&self) -> String {
        self.ctx.borrow().node(self.id).alias.clone()
    }

    pub fn entity_type(&self) -> EntityType {
        *self.ctx.borrow().node(self.id).source.entity()
    }

    /// Lifecycle state when this node was created by a join factory.
    pub fn join_state(&self) -> Option<JoinState> {
        self.ctx.borrow().join_state(self.id)
    }

    /// Whether both handles point into the same tree.
    pub fn same_tree<P>(&self, other: &Criteria<P>) -> bool {
        Rc::ptr_eq(&self.ctx, &other.ctx)
    }

    pub fn result_config(&self) -> ResultConfig {
        self.ctx.borrow().node(self.id).result.clone()
    }

    pub(crate) fn resolver(&self) -> Arc<dyn PropertyResolver> {
        Arc::clone(&self.ctx.borrow().resolver)
    }

    pub(crate) fn update<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&mut crate::node::CriteriaNode),
    {
        f(self.ctx.borrow_mut().node_mut(self.id));
        self
    }
}

impl<E: Entity> Criteria<E> {
    /// Root of a new tree with a derived alias.
    pub fn new(resolver: Arc<dyn PropertyResolver>) -> Self {
        Self::root(resolver, None, ResultConfig::default())
    }

    /// Root of a new tree with an explicit alias.
    pub fn aliased(resolver: Arc<dyn PropertyResolver>, alias: &str) -> Self {
        Self::root(resolver, Some(alias), ResultConfig::default())
    }

    fn root(resolver: Arc<dyn PropertyResolver>, alias: Option<&str>, result: ResultConfig) -> Self {
        let ctx = TreeContext::with_root(
            resolver,
            NodeSource::Entity(E::entity_type()),
            alias,
            Vec::new(),
            result,
            None,
        );
        Self::from_parts(ctx, 0)
    }

    /// New tree nested inside `outer`'s query. It inherits the outer node's
    /// result settings, derives aliases that avoid the outer tree's, and
    /// can correlate against `outer` through
    /// [`Filterable::eq_outer`](filter::Filterable::eq_outer).
    pub fn sub_query<P>(outer: &Criteria<P>) -> Self {
        Self::nested(outer, None)
    }

    pub fn sub_query_as<P>(outer: &Criteria<P>, alias: &str) -> Self {
        Self::nested(outer, Some(alias))
    }

    fn nested<P>(outer: &Criteria<P>, alias: Option<&str>) -> Self {
        let (resolver, reserved, result) = {
            let ctx = outer.ctx.borrow();
            (
                Arc::clone(&ctx.resolver),
                ctx.aliases.aliases().map(str::to_string).collect(),
                ctx.node(outer.id).result.clone(),
            )
        };
        let ctx = TreeContext::with_root(
            resolver,
            NodeSource::Entity(E::entity_type()),
            alias,
            reserved,
            result,
            Some(OuterRef {
                ctx: Rc::downgrade(&outer.ctx),
                node: outer.id,
            }),
        );
        Self::from_parts(ctx, 0)
    }

    /// Independent copy of this node's selection, grouping, ordering and
    /// filters. The copy keeps the alias and sees the same joins.
    pub fn branch(&self) -> Self {
        let id = self.ctx.borrow_mut().add_branch(self.id);
        Self::from_parts(Rc::clone(&self.ctx), id)
    }

    pub fn result_type(&self, name: impl Into<String>) -> &Self {
        let name = name.into();
        self.update(|node| node.result.result_type = Some(name))
    }

    pub fn map_type(&self, name: impl Into<String>) -> &Self {
        let name = name.into();
        self.update(|node| node.result.map_type = Some(name))
    }

    /// Column the caller keys result maps by. Stores the property name
    /// instead when `property_as_alias` is on.
    pub fn map_key(&self, target: impl Into<Target<E>>) -> Result<&Self> {
        let column = self.column(target.into())?;
        Ok(self.update(|node| {
            let key = match column.property {
                Some(property) if node.result.property_as_alias => property.to_string(),
                _ => column.column,
            };
            node.result.map_key = Some(key);
        }))
    }

    pub fn property_as_alias(&self, enabled: bool) -> &Self {
        self.update(|node| node.result.property_as_alias = enabled)
    }

    pub fn limit(&self, limit: u64) -> &Self {
        self.update(|node| node.limit = Some(limit))
    }

    pub fn offset(&self, offset: u64) -> &Self {
        self.update(|node| node.offset = Some(offset))
    }

    /// Resolves `target` to a column of this node.
    pub(crate) fn column(&self, target: Target<E>) -> Result<ColumnRef> {
        resolve_target(&self.resolver(), target)
    }
}

pub(crate) fn resolve_target<E: Entity>(
    resolver: &Arc<dyn PropertyResolver>,
    target: Target<E>,
) -> Result<ColumnRef> {
    match target {
        Target::Property(property) => {
            let meta = resolver.resolve(&property.erase())?;
            Ok(ColumnRef::resolved(property.name(), meta))
        }
        Target::Column(column) => Ok(ColumnRef::raw(column)),
    }
}

/// Error for an operation on a node that must sit in `other`'s tree.
pub(crate) fn ensure_same_tree<A, B>(node: &Criteria<A>, other: &Criteria<B>) -> Result<()> {
    if node.same_tree(other) {
        Ok(())
    } else {
        Err(CriteriaError::ForeignNode(other.alias()))
    }
}

/// Entry point that carries the resolver and defaults for new trees.
#[derive(Clone)]
pub struct CriteriaFactory {
    resolver: Arc<dyn PropertyResolver>,
    property_as_alias: bool,
}

impl CriteriaFactory {
    pub fn new(resolver: Arc<dyn PropertyResolver>) -> Self {
        Self {
            resolver,
            property_as_alias: false,
        }
    }

    pub fn from_config(resolver: Arc<dyn PropertyResolver>, config: &CriteriaConfig) -> Self {
        Self::new(resolver).with_property_as_alias(config.property_as_alias)
    }

    pub fn with_property_as_alias(mut self, enabled: bool) -> Self {
        self.property_as_alias = enabled;
        self
    }

    pub fn resolver(&self) -> &Arc<dyn PropertyResolver> {
        &self.resolver
    }

    pub fn query<E: Entity>(&self) -> Criteria<E> {
        Criteria::root(Arc::clone(&self.resolver), None, self.defaults())
    }

    pub fn query_as<E: Entity>(&self, alias: &str) -> Criteria<E> {
        Criteria::root(Arc::clone(&self.resolver), Some(alias), self.defaults())
    }

    fn defaults(&self) -> ResultConfig {
        ResultConfig {
            property_as_alias: self.property_as_alias,
            ..ResultConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{criteria::select::Selectable, resolver::CachedResolver};
    use model::{entity, metadata::MetadataRegistry};

    entity! {
        struct Invoice => "invoice" {
            ID: "id" => "id" as Long,
            TOTAL: "totalAmount" => "total_amount" as Decimal,
        }
    }

    fn factory() -> CriteriaFactory {
        let registry = MetadataRegistry::new().with::<Invoice>().unwrap();
        CriteriaFactory::new(Arc::new(CachedResolver::new(Arc::new(registry))))
    }

    #[test]
    fn test_root_aliases() {
        let factory = factory();
        assert_eq!(factory.query::<Invoice>().alias(), "i");
        assert_eq!(factory.query_as::<Invoice>("inv").alias(), "inv");
    }

    #[test]
    fn test_sub_query_avoids_outer_aliases() {
        let outer = factory().query::<Invoice>();
        let inner = Criteria::<Invoice>::sub_query(&outer);

        assert_eq!(inner.alias(), "i1");
        assert!(!inner.same_tree(&outer));
    }

    #[test]
    fn test_map_key_follows_property_as_alias() {
        let criteria = factory().query::<Invoice>();
        criteria.map_key(Invoice::TOTAL).unwrap();
        assert_eq!(criteria.result_config().map_key.as_deref(), Some("total_amount"));

        criteria.property_as_alias(true).map_key(Invoice::TOTAL).unwrap();
        assert_eq!(criteria.result_config().map_key.as_deref(), Some("totalAmount"));
    }

    #[test]
    fn test_branch_is_independent() {
        let original = factory().query::<Invoice>();
        original.select(Invoice::ID).unwrap();

        let copy = original.branch();
        copy.select(Invoice::TOTAL).unwrap();

        assert_eq!(copy.alias(), original.alias());
        assert_eq!(original.ctx.borrow().node(original.id).selected.len(), 1);
        assert_eq!(copy.ctx.borrow().node(copy.id).selected.len(), 2);
    }

    #[test]
    fn test_result_settings_reach_sub_queries() {
        let outer = factory().query::<Invoice>();
        outer.result_type("InvoiceRow").property_as_alias(true);

        let inner = Criteria::<Invoice>::sub_query(&outer);
        let config = inner.result_config();
        assert_eq!(config.result_type.as_deref(), Some("InvoiceRow"));
        assert!(config.property_as_alias);
    }
}
