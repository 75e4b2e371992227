//! Typed, fluent construction of SQL `SELECT` statements.
//!
//! ```
//! use criteria::prelude::*;
//! use model::{entity, metadata::MetadataRegistry};
//! use std::sync::Arc;
//!
//! entity! {
//!     pub struct Order => "order" {
//!         ID: "id" => "id" as Long,
//!         CUSTOMER_ID: "customerId" => "customer_id" as Long,
//!     }
//! }
//!
//! entity! {
//!     pub struct Customer => "customer" {
//!         ID: "id" => "id" as Long,
//!     }
//! }
//!
//! # fn main() -> criteria::Result<()> {
//! let registry = MetadataRegistry::new()
//!     .with::<Order>()
//!     .and_then(|r| r.with::<Customer>())
//!     .expect("entities register once");
//! let factory = CriteriaFactory::new(Arc::new(CachedResolver::new(Arc::new(registry))));
//!
//! let order = factory.query::<Order>();
//! order.select(Order::ID)?;
//! order
//!     .left_join::<Customer>()?
//!     .on_with(Order::CUSTOMER_ID, Customer::ID)?
//!     .join()?;
//!
//! let statement = SqlManager::default().render(&order)?;
//! assert_eq!(
//!     statement.sql,
//!     "SELECT o.id FROM order o LEFT JOIN customer c ON (o.customer_id = c.id)"
//! );
//! # Ok(())
//! # }
//! ```

pub mod alias;
pub mod ast;
pub mod config;
mod context;
pub mod criteria;
pub mod dialect;
pub mod error;
pub mod fragment;
pub mod manager;
mod node;
pub mod renderer;
pub mod resolver;

pub use config::CriteriaConfig;
pub use criteria::{Criteria, CriteriaFactory, Target, join::JoinCriteria};
pub use error::{CriteriaError, Result};
pub use fragment::Fragments;
pub use manager::{SqlManager, Statement};
pub use node::{AggregateFn, CompareOp, JoinState, ResultConfig};

pub mod prelude {
    pub use crate::{
        ast::common::{JoinKind, NullPrecedence, OrderDir},
        criteria::{
            aggregate::{AggOptions, Aggregable},
            filter::Filterable,
            group::Groupable,
            join::Joinable,
            select::Selectable,
            sort::{SortOptions, Sortable},
        },
        resolver::{CachedResolver, ColumnCache, PropertyResolver},
        AggregateFn, CompareOp, Criteria, CriteriaFactory, JoinState, SqlManager, Target,
    };
}
