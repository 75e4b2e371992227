#![allow(dead_code)]

use criteria::prelude::*;
use model::{entity, metadata::MetadataRegistry};
use std::sync::Arc;

entity! {
    pub struct Order => "order" {
        ID: "id" => "id" as Long,
        CUSTOMER_ID: "customerId" => "customer_id" as Long,
        AMOUNT: "amount" => "amount" as Decimal,
        STATUS: "status" => "status" as VarChar,
        CREATED_AT: "createdAt" => "created_at" as Timestamp,
    }
}

entity! {
    pub struct Customer => "customer" {
        ID: "id" => "id" as Long,
        NAME: "name" => "name" as VarChar,
        REFERRER_ID: "referrerId" => "referrer_id" as Long,
    }
}

entity! {
    pub struct OrderLine => "order_line" {
        ID: "id" => "id" as Long,
        ORDER_ID: "orderId" => "order_id" as Long,
        QUANTITY: "quantity" => "qty" as Int,
    }
}

pub fn registry() -> MetadataRegistry {
    MetadataRegistry::new()
        .with::<Order>()
        .and_then(|r| r.with::<Customer>())
        .and_then(|r| r.with::<OrderLine>())
        .expect("test entities register once")
}

pub fn resolver() -> Arc<dyn PropertyResolver> {
    Arc::new(CachedResolver::with_cache(
        Arc::new(registry()),
        Arc::new(ColumnCache::new()),
    ))
}

pub fn factory() -> CriteriaFactory {
    CriteriaFactory::new(resolver())
}

pub fn render<E>(criteria: &Criteria<E>) -> String {
    SqlManager::default()
        .render(criteria)
        .expect("criteria renders")
        .sql
}
