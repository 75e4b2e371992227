mod common;

use common::{Customer, Order, OrderLine, factory, render};
use criteria::{CriteriaError, prelude::*};

#[test]
fn test_self_join_gets_distinct_alias() {
    let customer = factory().query::<Customer>();
    customer.select(Customer::NAME).unwrap();

    let referrer = customer.left_join::<Customer>().unwrap();
    referrer
        .on_with(Customer::REFERRER_ID, Customer::ID)
        .unwrap()
        .fetch(true);
    let referrer = referrer.join().unwrap();
    referrer.select_as(Customer::NAME, "referrer_name").unwrap();

    assert_eq!(
        render(&customer),
        concat!(
            "SELECT c.name, c1.name AS referrer_name FROM customer c ",
            "LEFT JOIN customer c1 ON (c.referrer_id = c1.id)"
        )
    );
}

#[test]
fn test_nested_joins_render_in_pre_order() {
    let line = factory().query::<OrderLine>();
    line.select(OrderLine::QUANTITY).unwrap();

    let order = line.inner_join::<Order>().unwrap();
    order.on_with(OrderLine::ORDER_ID, Order::ID).unwrap();
    let order = order.join().unwrap();

    let customer = order.inner_join::<Customer>().unwrap();
    customer.on_with(Order::CUSTOMER_ID, Customer::ID).unwrap();
    customer.join().unwrap();

    let second_line = line.right_join::<OrderLine>().unwrap();
    second_line.col_on_with("order_id", "order_id").join().unwrap();

    assert_eq!(
        render(&line),
        concat!(
            "SELECT o.qty FROM order_line o ",
            "INNER JOIN order o1 ON (o.order_id = o1.id) ",
            "INNER JOIN customer c ON (o1.customer_id = c.id) ",
            "RIGHT JOIN order_line o2 ON (o.order_id = o2.order_id)"
        )
    );
}

#[test]
fn test_join_to_explicit_parent_qualifies_left_side() {
    let order = factory().query::<Order>();
    order.select(Order::ID).unwrap();

    let customer = order.inner_join::<Customer>().unwrap();
    customer.on_with(Order::CUSTOMER_ID, Customer::ID).unwrap();
    let customer = customer.join().unwrap();

    // Created from the order node, attached under the customer.
    let referrer = order.full_join::<Customer>().unwrap();
    referrer.col_on_with("referrer_id", "id").join_to(&customer).unwrap();

    assert_eq!(
        render(&order),
        concat!(
            "SELECT o.id FROM order o ",
            "INNER JOIN customer c ON (o.customer_id = c.id) ",
            "FULL OUTER JOIN customer c1 ON (c.referrer_id = c1.id)"
        )
    );
}

#[test]
fn test_on_with_pairs_property_and_raw_column() {
    let order = factory().query::<Order>();
    order.select(Order::ID).unwrap();

    let line = order.inner_join::<OrderLine>().unwrap();
    line.on_with(Order::ID, "order_id")
        .and_then(|l| l.on_with("status", OrderLine::ID))
        .and_then(|l| l.join())
        .unwrap();

    assert_eq!(
        render(&order),
        concat!(
            "SELECT o.id FROM order o INNER JOIN order_line o1 ON ",
            "((o.id = o1.order_id) AND (o.status = o1.id))"
        )
    );
}

#[test]
fn test_multiple_on_conditions_are_anded() {
    let order = factory().query::<Order>();
    order.select(Order::ID).unwrap();

    let line = order.inner_join::<OrderLine>().unwrap();
    line.on_with(Order::ID, OrderLine::ORDER_ID)
        .unwrap()
        .col_on_with("status", "status")
        .join()
        .unwrap();
    assert_eq!(line.state(), JoinState::Attached);

    line.col_on("region");
    assert_eq!(
        render(&order),
        concat!(
            "SELECT o.id FROM order o INNER JOIN order_line o1 ON ",
            "(((o.id = o1.order_id) AND (o.status = o1.status)) AND (o.region = o1.region))"
        )
    );
}

#[test]
fn test_unconditioned_join_fails_then_succeeds() {
    let order = factory().query::<Order>();
    let customer = order.inner_join::<Customer>().unwrap();
    customer.join().unwrap();

    let manager = SqlManager::default();
    assert!(matches!(
        manager.render(&order),
        Err(CriteriaError::IncompleteJoin { .. })
    ));

    customer.on_with(Order::CUSTOMER_ID, Customer::ID).unwrap();
    assert!(manager.render(&order).is_ok());
}

#[test]
fn test_never_attached_join_fails() {
    let order = factory().query::<Order>();
    let customer = order.inner_join::<Customer>().unwrap();
    customer.on_with(Order::CUSTOMER_ID, Customer::ID).unwrap();

    let err = SqlManager::default().render(&order).unwrap_err();
    assert_eq!(
        err,
        CriteriaError::IncompleteJoin {
            alias: "c".into(),
            reason: "never attached".into(),
        }
    );
    assert_eq!(customer.state(), JoinState::Conditioned);
}

#[test]
fn test_explicit_join_alias_and_collision() {
    let order = factory().query::<Order>();
    let buyer = order
        .join_as::<Customer>(JoinKind::Left, Some("buyer"))
        .unwrap();
    buyer.on_with(Order::CUSTOMER_ID, Customer::ID).unwrap();
    buyer.join().unwrap();
    assert_eq!(buyer.alias(), "buyer");

    let clash = order.join_as::<Customer>(JoinKind::Left, Some("buyer"));
    assert!(matches!(clash, Err(CriteriaError::DuplicateAlias(alias)) if alias == "buyer"));

    assert_eq!(order.inner_join::<Customer>().unwrap().alias(), "c");
}

#[test]
fn test_join_to_foreign_tree_fails() {
    let order = factory().query::<Order>();
    let other = factory().query::<Customer>();

    let customer = order.inner_join::<Customer>().unwrap();
    customer.col_on_with("customer_id", "id");
    assert!(matches!(
        customer.join_to(&other),
        Err(CriteriaError::ForeignNode(_))
    ));
}

#[test]
fn test_branches_share_joins_but_not_selections() {
    let order = factory().query::<Order>();
    order.select(Order::ID).unwrap();

    let customer = order.inner_join::<Customer>().unwrap();
    customer.on_with(Order::CUSTOMER_ID, Customer::ID).unwrap();
    customer.join().unwrap();

    let totals = order.branch();
    totals
        .col_sum(Order::AMOUNT, "total")
        .and_then(|t| t.group(Order::CUSTOMER_ID))
        .unwrap();

    assert_eq!(
        render(&order),
        "SELECT o.id FROM order o INNER JOIN customer c ON (o.customer_id = c.id)"
    );
    assert_eq!(
        render(&totals),
        concat!(
            "SELECT o.id, SUM(o.amount) AS total FROM order o ",
            "INNER JOIN customer c ON (o.customer_id = c.id) GROUP BY o.customer_id"
        )
    );
}
