use crate::{
    criteria::{Criteria, Target},
    error::Result,
    node::{Aggregate, AggregateFn, SelectItem},
};
use model::core::entity::Entity;
use tracing::{debug, warn};

/// Options shared by every aggregate projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggOptions {
    pub alias: Option<String>,
    /// Round SUM/AVG results to this many decimal places.
    pub scale: Option<u32>,
    pub distinct: bool,
}

impl AggOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

impl From<&str> for AggOptions {
    fn from(alias: &str) -> Self {
        AggOptions::new().alias(alias)
    }
}

impl From<Option<&str>> for AggOptions {
    fn from(alias: Option<&str>) -> Self {
        AggOptions {
            alias: alias.map(str::to_string),
            ..AggOptions::default()
        }
    }
}

pub trait Aggregable<E> {
    /// Adds `func` over `target`, or over `*` when `target` is `None`.
    fn aggregate(&self, func: AggregateFn, target: Option<Target<E>>, options: AggOptions) -> Result<&Self>;

    fn col_count(&self, target: impl Into<Target<E>>, options: impl Into<AggOptions>) -> Result<&Self> {
        self.aggregate(AggregateFn::Count, Some(target.into()), options.into())
    }

    fn col_sum(&self, target: impl Into<Target<E>>, options: impl Into<AggOptions>) -> Result<&Self> {
        self.aggregate(AggregateFn::Sum, Some(target.into()), options.into())
    }

    fn col_avg(&self, target: impl Into<Target<E>>, options: impl Into<AggOptions>) -> Result<&Self> {
        self.aggregate(AggregateFn::Avg, Some(target.into()), options.into())
    }

    fn col_min(&self, target: impl Into<Target<E>>, options: impl Into<AggOptions>) -> Result<&Self> {
        self.aggregate(AggregateFn::Min, Some(target.into()), options.into())
    }

    fn col_max(&self, target: impl Into<Target<E>>, options: impl Into<AggOptions>) -> Result<&Self> {
        self.aggregate(AggregateFn::Max, Some(target.into()), options.into())
    }

    /// `COUNT(*)`.
    fn count_all(&self, options: impl Into<AggOptions>) -> Result<&Self> {
        self.aggregate(AggregateFn::Count, None, options.into())
    }
}

impl<E: Entity> Aggregable<E> for Criteria<E> {
    fn aggregate(&self, func: AggregateFn, target: Option<Target<E>>, options: AggOptions) -> Result<&Self> {
        let aggregate = build_aggregate(self, func, target, options)?;
        Ok(self.update(|node| node.selected.push(SelectItem::Aggregate(aggregate))))
    }
}

/// Resolves and normalises an aggregate for `criteria`'s node.
pub(crate) fn build_aggregate<E: Entity>(
    criteria: &Criteria<E>,
    func: AggregateFn,
    target: Option<Target<E>>,
    options: AggOptions,
) -> Result<Aggregate> {
    let column = target.map(|target| criteria.column(target)).transpose()?;

    let distinct = if options.distinct && !func.supports_distinct() {
        warn!("DISTINCT has no effect on {}, dropping it", func);
        false
    } else {
        options.distinct && column.is_some()
    };

    let scale = match options.scale {
        Some(scale) if func.supports_scale() => Some(scale),
        Some(_) => {
            debug!("scale only applies to SUM and AVG, ignoring it for {}", func);
            None
        }
        None => None,
    };

    Ok(Aggregate {
        func,
        column,
        alias: options.alias,
        scale,
        distinct,
    })
}
