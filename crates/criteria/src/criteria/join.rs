//! Join factories and the join builder.
//!
//! A join goes through three states. It is `Created` by a factory on a
//! reference node, becomes `Conditioned` once it has an on-condition, and
//! ends `Attached` under a parent node of the same tree. Only attached,
//! conditioned joins render; anything else fails with
//! [`CriteriaError::IncompleteJoin`] at render time.

use crate::{
    ast::common::JoinKind,
    criteria::{Criteria, Target, ensure_same_tree, filter::nest, resolve_target},
    error::Result,
    node::{JoinState, NodeSource, OnCondition},
};
use model::core::entity::{Entity, Property};
use std::{marker::PhantomData, ops::Deref, rc::Rc};

pub trait Joinable<E> {
    /// Joins entity `R` with an explicit alias, or a derived one.
    fn join_as<R: Entity>(&self, kind: JoinKind, alias: Option<&str>) -> Result<JoinCriteria<E, R>>;

    /// Joins the derived table produced by `sub`.
    fn join_sub_query<R: Entity>(
        &self,
        kind: JoinKind,
        sub: &Criteria<R>,
        alias: Option<&str>,
    ) -> Result<JoinCriteria<E, R>>;

    fn inner_join<R: Entity>(&self) -> Result<JoinCriteria<E, R>> {
        self.join_as(JoinKind::Inner, None)
    }

    fn left_join<R: Entity>(&self) -> Result<JoinCriteria<E, R>> {
        self.join_as(JoinKind::Left, None)
    }

    fn right_join<R: Entity>(&self) -> Result<JoinCriteria<E, R>> {
        self.join_as(JoinKind::Right, None)
    }

    fn full_join<R: Entity>(&self) -> Result<JoinCriteria<E, R>> {
        self.join_as(JoinKind::Full, None)
    }
}

impl<E: Entity> Joinable<E> for Criteria<E> {
    fn join_as<R: Entity>(&self, kind: JoinKind, alias: Option<&str>) -> Result<JoinCriteria<E, R>> {
        let id = self.ctx.borrow_mut().add_join(
            self.id,
            NodeSource::Entity(R::entity_type()),
            kind,
            alias,
        )?;
        Ok(JoinCriteria::new(Criteria::from_parts(Rc::clone(&self.ctx), id)))
    }

    fn join_sub_query<R: Entity>(
        &self,
        kind: JoinKind,
        sub: &Criteria<R>,
        alias: Option<&str>,
    ) -> Result<JoinCriteria<E, R>> {
        let source = NodeSource::SubQuery {
            sub: nest(self, sub)?,
            entity: R::entity_type(),
        };
        let id = self
            .ctx
            .borrow_mut()
            .add_join(self.id, source, kind, alias)?;
        Ok(JoinCriteria::new(Criteria::from_parts(Rc::clone(&self.ctx), id)))
    }
}

/// A join of entity `R` created from a node of entity `L`.
///
/// Dereferences to the joined [`Criteria<R>`], so projection, grouping,
/// sorting and filtering on the joined side work as on any node.
pub struct JoinCriteria<L, R> {
    criteria: Criteria<R>,
    _reference: PhantomData<fn() -> L>,
}

impl<L, R> Deref for JoinCriteria<L, R> {
    type Target = Criteria<R>;

    fn deref(&self) -> &Criteria<R> {
        &self.criteria
    }
}

impl<L: Entity, R: Entity> JoinCriteria<L, R> {
    fn new(criteria: Criteria<R>) -> Self {
        Self {
            criteria,
            _reference: PhantomData,
        }
    }

    /// `ON parent.<column> = joined.<column>` where both sides share the
    /// column `property` maps to.
    pub fn on(&self, property: Property<R>) -> Result<&Self> {
        let column = self.criteria.column(property.into())?.column;
        Ok(self.condition(column.clone(), column))
    }

    /// `ON parent.<left> = joined.<right>`. Either side may be a typed
    /// property or a raw column.
    pub fn on_with(
        &self,
        left: impl Into<Target<L>>,
        right: impl Into<Target<R>>,
    ) -> Result<&Self> {
        let left = resolve_target(&self.criteria.resolver(), left.into())?.column;
        let right = self.criteria.column(right.into())?.column;
        Ok(self.condition(left, right))
    }

    pub fn col_on(&self, column: &str) -> &Self {
        self.condition(column.to_string(), column.to_string())
    }

    pub fn col_on_with(&self, left: &str, right: &str) -> &Self {
        self.condition(left.to_string(), right.to_string())
    }

    fn condition(&self, left: String, right: String) -> &Self {
        self.criteria.update(|node| {
            debug_assert!(node.join.is_some(), "`{}` is not a join", node.alias);
            if let Some(edge) = node.join.as_mut() {
                edge.conditions.push(OnCondition { left, right });
            }
        });
        self
    }

    /// Project the joined entity's columns when it has no explicit selection.
    pub fn fetch(&self, fetch: bool) -> &Self {
        self.criteria.update(|node| node.fetch = fetch);
        self
    }

    /// Attaches the join to the node it was created from.
    pub fn join(&self) -> Result<Criteria<R>> {
        let reference = {
            let ctx = self.criteria.ctx.borrow();
            ctx.node(self.criteria.id)
                .join
                .as_ref()
                .map(|edge| edge.reference)
                .unwrap_or(self.criteria.id)
        };
        self.criteria.ctx.borrow_mut().attach(self.criteria.id, reference)?;
        Ok(self.criteria.clone())
    }

    /// Attaches the join to `parent`, which must belong to the same tree.
    pub fn join_to<P>(&self, parent: &Criteria<P>) -> Result<Criteria<R>> {
        ensure_same_tree(&self.criteria, parent)?;
        self.criteria.ctx.borrow_mut().attach(self.criteria.id, parent.id)?;
        Ok(self.criteria.clone())
    }

    pub fn state(&self) -> JoinState {
        self.criteria.join_state().unwrap_or(JoinState::Created)
    }

    pub fn criteria(&self) -> &Criteria<R> {
        &self.criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::CriteriaError, resolver::CachedResolver};
    use model::{entity, metadata::MetadataRegistry};
    use std::sync::Arc;

    entity! {
        struct Employee => "employee" {
            ID: "id" => "id" as Long,
            MANAGER_ID: "managerId" => "manager_id" as Long,
            DEPT_ID: "deptId" => "dept_id" as Long,
        }
    }

    entity! {
        struct Dept => "dept" {
            ID: "id" => "id" as Long,
        }
    }

    fn employee() -> Criteria<Employee> {
        let registry = MetadataRegistry::new()
            .with::<Employee>()
            .and_then(|r| r.with::<Dept>())
            .unwrap();
        Criteria::new(Arc::new(CachedResolver::new(Arc::new(registry))))
    }

    fn conditions(join: &Criteria<Employee>) -> Vec<OnCondition> {
        let ctx = join.ctx.borrow();
        ctx.node(join.id).join.as_ref().unwrap().conditions.clone()
    }

    #[test]
    fn test_state_transitions() {
        let root = employee();
        let manager = root.inner_join::<Employee>().unwrap();
        assert_eq!(manager.state(), JoinState::Created);

        manager.on_with(Employee::MANAGER_ID, Employee::ID).unwrap();
        assert_eq!(manager.state(), JoinState::Conditioned);

        let attached = manager.join().unwrap();
        assert_eq!(manager.state(), JoinState::Attached);
        assert_eq!(attached.alias(), "e1");
        assert_eq!(
            conditions(&attached),
            vec![OnCondition {
                left: "manager_id".into(),
                right: "id".into(),
            }]
        );
    }

    #[test]
    fn test_same_name_on_condition() {
        let root = employee();
        let peer = root.left_join::<Employee>().unwrap();
        peer.on(Employee::DEPT_ID).unwrap();
        assert_eq!(
            conditions(&peer),
            vec![OnCondition {
                left: "dept_id".into(),
                right: "dept_id".into(),
            }]
        );
    }

    #[test]
    fn test_on_with_mixes_property_and_column() {
        let root = employee();
        let dept = root.inner_join::<Dept>().unwrap();
        dept.on_with(Employee::DEPT_ID, "dept_code").unwrap();
        dept.on_with("region", Dept::ID).unwrap();

        let ctx = dept.ctx.borrow();
        assert_eq!(
            ctx.node(dept.id).join.as_ref().unwrap().conditions,
            vec![
                OnCondition {
                    left: "dept_id".into(),
                    right: "dept_code".into(),
                },
                OnCondition {
                    left: "region".into(),
                    right: "id".into(),
                },
            ]
        );
    }

    #[test]
    #[should_panic(expected = "is not a join")]
    fn test_condition_on_non_join_panics() {
        let root = employee();
        JoinCriteria::<Employee, Employee>::new(root).col_on("id");
    }

    #[test]
    fn test_explicit_alias_collision() {
        let root = employee();
        let err = root
            .join_as::<Dept>(JoinKind::Inner, Some("e"))
            .err()
            .unwrap();
        assert_eq!(err, CriteriaError::DuplicateAlias("e".into()));
    }

    #[test]
    fn test_join_to_other_tree_is_rejected() {
        let root = employee();
        let other = employee();
        let dept = root.inner_join::<Dept>().unwrap();
        dept.col_on_with("dept_id", "id");

        assert!(matches!(dept.join_to(&other), Err(CriteriaError::ForeignNode(_))));
        assert_eq!(dept.state(), JoinState::Conditioned);
    }

    #[test]
    fn test_second_attach_is_rejected() {
        let root = employee();
        let dept = root.inner_join::<Dept>().unwrap();
        dept.col_on_with("dept_id", "id").join().unwrap();

        assert!(matches!(
            dept.join_to(&root),
            Err(CriteriaError::JoinAlreadyAttached { .. })
        ));
    }

    #[test]
    fn test_nested_join_under_join() {
        let root = employee();
        let manager = root.inner_join::<Employee>().unwrap();
        manager.on_with(Employee::MANAGER_ID, Employee::ID).unwrap();
        let manager = manager.join().unwrap();

        let dept = manager.left_join::<Dept>().unwrap();
        dept.on_with(Employee::DEPT_ID, Dept::ID).unwrap();
        let dept = dept.join().unwrap();

        let ctx = root.ctx.borrow();
        assert_eq!(ctx.joins.children(root.id), &[manager.id]);
        assert_eq!(ctx.joins.children(manager.id), &[dept.id]);
        assert_eq!(dept.alias(), "d");
    }
}
