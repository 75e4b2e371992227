use crate::{
    criteria::{Criteria, Target, aggregate::{AggOptions, build_aggregate}},
    error::Result,
    node::{AggregateFn, CompareOp, Having},
};
use model::core::{entity::Entity, value::Value};

/// GROUP BY and HAVING.
pub trait Groupable<E> {
    fn group_column(&self, target: Target<E>) -> Result<&Self>;

    /// Adds `func(target) <op> value` to HAVING; `None` aggregates over `*`.
    fn having_aggregate(
        &self,
        func: AggregateFn,
        target: Option<Target<E>>,
        op: CompareOp,
        value: Value,
    ) -> Result<&Self>;

    fn group(&self, target: impl Into<Target<E>>) -> Result<&Self> {
        self.group_column(target.into())
    }

    fn groups<I, T>(&self, targets: I) -> Result<&Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Target<E>>,
    {
        for target in targets {
            self.group_column(target.into())?;
        }
        Ok(self)
    }

    fn having(
        &self,
        func: AggregateFn,
        target: impl Into<Target<E>>,
        op: CompareOp,
        value: impl Into<Value>,
    ) -> Result<&Self> {
        self.having_aggregate(func, Some(target.into()), op, value.into())
    }

    /// `HAVING COUNT(*) <op> value`.
    fn having_count_all(&self, op: CompareOp, value: impl Into<Value>) -> Result<&Self> {
        self.having_aggregate(AggregateFn::Count, None, op, value.into())
    }
}

impl<E: Entity> Groupable<E> for Criteria<E> {
    fn group_column(&self, target: Target<E>) -> Result<&Self> {
        let column = self.column(target)?;
        Ok(self.update(|node| node.group_by.push(column)))
    }

    fn having_aggregate(
        &self,
        func: AggregateFn,
        target: Option<Target<E>>,
        op: CompareOp,
        value: Value,
    ) -> Result<&Self> {
        let aggregate = build_aggregate(self, func, target, AggOptions::default())?;
        Ok(self.update(|node| {
            node.having.push(Having {
                aggregate,
                op,
                value,
            })
        }))
    }
}
