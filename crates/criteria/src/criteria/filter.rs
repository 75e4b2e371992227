use crate::{
    context::contains_context,
    criteria::{Criteria, Target, resolve_target},
    error::{CriteriaError, Result},
    node::{CompareOp, Filter, SubQuerySource},
};
use model::core::{entity::Entity, value::Value};
use std::rc::Rc;

/// WHERE predicates. Every predicate of every node in a tree is ANDed.
pub trait Filterable<E> {
    fn filter(&self, target: impl Into<Target<E>>, op: CompareOp, value: impl Into<Value>) -> Result<&Self>;

    fn in_values<I, V>(&self, target: impl Into<Target<E>>, values: I, negated: bool) -> Result<&Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>;

    fn null_check(&self, target: impl Into<Target<E>>, negated: bool) -> Result<&Self>;

    /// `target [NOT] IN (<sub>)`.
    fn sub_query_filter<S>(&self, target: impl Into<Target<E>>, sub: &Criteria<S>, negated: bool) -> Result<&Self>;

    /// `[NOT] EXISTS (<sub>)`.
    fn exists_filter<S>(&self, sub: &Criteria<S>, negated: bool) -> Result<&Self>;

    /// Compares `target` with a column of the query this one is nested in.
    fn correlate<P: Entity>(&self, target: impl Into<Target<E>>, op: CompareOp, outer: impl Into<Target<P>>) -> Result<&Self>;

    fn eq(&self, target: impl Into<Target<E>>, value: impl Into<Value>) -> Result<&Self> {
        self.filter(target, CompareOp::Eq, value)
    }

    fn ne(&self, target: impl Into<Target<E>>, value: impl Into<Value>) -> Result<&Self> {
        self.filter(target, CompareOp::NotEq, value)
    }

    fn gt(&self, target: impl Into<Target<E>>, value: impl Into<Value>) -> Result<&Self> {
        self.filter(target, CompareOp::Gt, value)
    }

    fn ge(&self, target: impl Into<Target<E>>, value: impl Into<Value>) -> Result<&Self> {
        self.filter(target, CompareOp::GtEq, value)
    }

    fn lt(&self, target: impl Into<Target<E>>, value: impl Into<Value>) -> Result<&Self> {
        self.filter(target, CompareOp::Lt, value)
    }

    fn le(&self, target: impl Into<Target<E>>, value: impl Into<Value>) -> Result<&Self> {
        self.filter(target, CompareOp::LtEq, value)
    }

    fn like(&self, target: impl Into<Target<E>>, pattern: impl Into<Value>) -> Result<&Self> {
        self.filter(target, CompareOp::Like, pattern)
    }

    fn in_list<I, V>(&self, target: impl Into<Target<E>>, values: I) -> Result<&Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_values(target, values, false)
    }

    fn not_in_list<I, V>(&self, target: impl Into<Target<E>>, values: I) -> Result<&Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_values(target, values, true)
    }

    fn is_null(&self, target: impl Into<Target<E>>) -> Result<&Self> {
        self.null_check(target, false)
    }

    fn is_not_null(&self, target: impl Into<Target<E>>) -> Result<&Self> {
        self.null_check(target, true)
    }

    fn in_sub_query<S>(&self, target: impl Into<Target<E>>, sub: &Criteria<S>) -> Result<&Self> {
        self.sub_query_filter(target, sub, false)
    }

    fn not_in_sub_query<S>(&self, target: impl Into<Target<E>>, sub: &Criteria<S>) -> Result<&Self> {
        self.sub_query_filter(target, sub, true)
    }

    fn exists<S>(&self, sub: &Criteria<S>) -> Result<&Self> {
        self.exists_filter(sub, false)
    }

    fn not_exists<S>(&self, sub: &Criteria<S>) -> Result<&Self> {
        self.exists_filter(sub, true)
    }

    fn eq_outer<P: Entity>(&self, target: impl Into<Target<E>>, outer: impl Into<Target<P>>) -> Result<&Self> {
        self.correlate(target, CompareOp::Eq, outer)
    }
}

impl<E: Entity> Filterable<E> for Criteria<E> {
    fn filter(&self, target: impl Into<Target<E>>, op: CompareOp, value: impl Into<Value>) -> Result<&Self> {
        let column = self.column(target.into())?;
        let value = value.into();
        Ok(self.update(|node| node.filters.push(Filter::Compare { column, op, value })))
    }

    fn in_values<I, V>(&self, target: impl Into<Target<E>>, values: I, negated: bool) -> Result<&Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let column = self.column(target.into())?;
        let values = values.into_iter().map(Into::into).collect();
        Ok(self.update(|node| {
            node.filters.push(Filter::InList {
                column,
                values,
                negated,
            })
        }))
    }

    fn null_check(&self, target: impl Into<Target<E>>, negated: bool) -> Result<&Self> {
        let column = self.column(target.into())?;
        Ok(self.update(|node| node.filters.push(Filter::Null { column, negated })))
    }

    fn sub_query_filter<S>(&self, target: impl Into<Target<E>>, sub: &Criteria<S>, negated: bool) -> Result<&Self> {
        let column = self.column(target.into())?;
        let sub = nest(self, sub)?;
        Ok(self.update(|node| {
            node.filters.push(Filter::InSubQuery {
                column,
                sub,
                negated,
            })
        }))
    }

    fn exists_filter<S>(&self, sub: &Criteria<S>, negated: bool) -> Result<&Self> {
        let sub = nest(self, sub)?;
        Ok(self.update(|node| node.filters.push(Filter::Exists { sub, negated })))
    }

    fn correlate<P: Entity>(&self, target: impl Into<Target<E>>, op: CompareOp, outer: impl Into<Target<P>>) -> Result<&Self> {
        let column = self.column(target.into())?;

        let outer_ref = self.ctx.borrow().node(self.id).outer.clone();
        let outer_ctx = outer_ref
            .as_ref()
            .and_then(|outer| outer.ctx.upgrade().map(|ctx| (ctx, outer.node)));
        let Some((outer_ctx, outer_node)) = outer_ctx else {
            return Err(CriteriaError::NullReference {
                alias: self.alias(),
                context: "correlated filter needs an enclosing query".to_string(),
            });
        };

        let outer_alias = outer_ctx.borrow().node(outer_node).alias.clone();
        let outer_column = resolve_target(&self.resolver(), outer.into())?.column;

        Ok(self.update(|node| {
            node.filters.push(Filter::Outer {
                column,
                op,
                outer_alias,
                outer_column,
            })
        }))
    }
}

/// Captures `sub` for nesting inside `host`, refusing self-containment.
pub(crate) fn nest<H, S>(host: &Criteria<H>, sub: &Criteria<S>) -> Result<SubQuerySource> {
    if contains_context(&sub.ctx, &host.ctx) {
        return Err(CriteriaError::Cycle(sub.alias()));
    }
    Ok(SubQuerySource {
        ctx: Rc::clone(&sub.ctx),
        root: sub.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::CachedResolver;
    use model::{entity, metadata::MetadataRegistry};
    use std::sync::Arc;

    entity! {
        struct Author => "author" {
            ID: "id" => "id" as Long,
            NAME: "name" => "full_name" as VarChar,
        }
    }

    entity! {
        struct Post => "post" {
            ID: "id" => "id" as Long,
            AUTHOR_ID: "authorId" => "author_id" as Long,
        }
    }

    fn resolver() -> Arc<CachedResolver> {
        let registry = MetadataRegistry::new()
            .with::<Author>()
            .and_then(|r| r.with::<Post>())
            .unwrap();
        Arc::new(CachedResolver::new(Arc::new(registry)))
    }

    #[test]
    fn test_filters_accumulate_in_order() {
        let author: Criteria<Author> = Criteria::new(resolver());
        author
            .eq(Author::ID, 7)
            .and_then(|c| c.like(Author::NAME, "A%"))
            .and_then(|c| c.in_list(Author::ID, [1, 2, 3]))
            .and_then(|c| c.is_not_null(Author::NAME))
            .unwrap();

        let ctx = author.ctx.borrow();
        let filters = &ctx.node(author.id).filters;
        assert_eq!(filters.len(), 4);
        assert!(matches!(&filters[0], Filter::Compare { op: CompareOp::Eq, .. }));
        assert!(matches!(&filters[2], Filter::InList { values, negated: false, .. } if values.len() == 3));
        assert!(matches!(&filters[3], Filter::Null { negated: true, .. }));
    }

    #[test]
    fn test_correlation_uses_outer_alias() {
        let author: Criteria<Author> = Criteria::new(resolver());
        let posts = Criteria::<Post>::sub_query(&author);
        posts.eq_outer(Post::AUTHOR_ID, Author::ID).unwrap();

        let ctx = posts.ctx.borrow();
        match &ctx.node(posts.id).filters[0] {
            Filter::Outer {
                column,
                outer_alias,
                outer_column,
                ..
            } => {
                assert_eq!(column.column, "author_id");
                assert_eq!(outer_alias, "a");
                assert_eq!(outer_column, "id");
            }
            other => panic!("unexpected filter {other:?}"),
        }
    }

    #[test]
    fn test_correlation_without_outer_fails() {
        let posts: Criteria<Post> = Criteria::new(resolver());
        let err = posts.eq_outer(Post::AUTHOR_ID, Author::ID).unwrap_err();
        assert!(matches!(err, CriteriaError::NullReference { .. }));
    }

    #[test]
    fn test_self_nesting_is_a_cycle() {
        let author: Criteria<Author> = Criteria::new(resolver());
        let posts = Criteria::<Post>::sub_query(&author);
        author.in_sub_query(Author::ID, &posts).unwrap();

        assert_eq!(posts.exists(&author).unwrap_err(), CriteriaError::Cycle("a".into()));
        assert_eq!(author.exists(&author).unwrap_err(), CriteriaError::Cycle("a".into()));
    }
}
