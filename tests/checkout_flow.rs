//! Checkout and confirmation flows against in-memory ports.

mod support;

use bigdecimal::BigDecimal;
use referral_checkout::domain::errors::DomainError;
use referral_checkout::domain::order::OrderFilter;
use referral_checkout::domain::payment::GatewayError;

use support::{dec, harness, submission, ADMIN_EMAIL, AMBASSADOR_EMAIL};

#[tokio::test]
async fn places_order_with_revenue_split_and_opens_session() {
    let h = harness();

    let outcome = h
        .service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect("order placed");

    let orders = h.store.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.id, outcome.order_id);
    assert_eq!(order.code, "123456");
    assert_eq!(order.ambassador_email, AMBASSADOR_EMAIL);
    assert!(!order.complete);
    assert_eq!(order.transaction_id.as_deref(), Some("sess_1"));

    let item = &order.items[0];
    assert_eq!(item.product_title, "Product 1");
    assert_eq!(item.price, dec("10.00"));
    assert_eq!(item.quantity, dec("2"));
    assert_eq!(item.ambassador_revenue, dec("2.00"));
    assert_eq!(item.admin_revenue, dec("18.00"));

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].idempotency_key, outcome.order_id.to_string());
    assert_eq!(requests[0].client_reference, outcome.order_id.to_string());
    assert_eq!(requests[0].line_items[0].unit_amount, 1000);
    assert_eq!(requests[0].line_items[0].currency, "usd");
    assert_eq!(outcome.session.id, "sess_1");
}

#[tokio::test]
async fn every_item_splits_its_line_total_exactly() {
    let h = harness();
    h.store.add_product(2, "Product 2", "19.99");
    h.store.add_product(3, "Product 3", "0.05");

    h.service
        .place_order(submission("123456", &[(1, "1"), (2, "3"), (3, "1.5")]))
        .await
        .expect("order placed");

    let order = &h.store.orders()[0];
    assert_eq!(order.items.len(), 3);
    for item in &order.items {
        let line_total = &item.price * &item.quantity;
        assert_eq!(&item.ambassador_revenue + &item.admin_revenue, line_total);
        assert!(item.ambassador_revenue >= BigDecimal::from(0));
    }
    assert_eq!(
        order.ambassador_revenue() + order.admin_revenue(),
        order.total()
    );
}

#[tokio::test]
async fn unknown_code_writes_nothing() {
    let h = harness();

    let err = h
        .service
        .place_order(submission("nope", &[(1, "2")]))
        .await
        .expect_err("invalid code");

    assert!(matches!(err, DomainError::InvalidReferralCode(code) if code == "nope"));
    assert_eq!(h.store.order_count(), 0);
    assert_eq!(h.store.item_count(), 0);
    assert!(h.gateway.requests().is_empty());
}

#[tokio::test]
async fn unknown_product_discards_the_whole_order() {
    let h = harness();

    let err = h
        .service
        .place_order(submission("123456", &[(1, "2"), (99, "1")]))
        .await
        .expect_err("unknown product");

    assert!(matches!(err, DomainError::UnknownProduct(99)));
    assert_eq!(h.store.order_count(), 0);
    assert_eq!(h.store.item_count(), 0);
    assert!(h.gateway.requests().is_empty());
}

#[tokio::test]
async fn malformed_submission_is_rejected_before_lookup() {
    let h = harness();

    let mut bad_email = submission("123456", &[(1, "1")]);
    bad_email.email = "not-an-email".to_string();
    let err = h.service.place_order(bad_email).await.expect_err("bad email");
    assert!(matches!(err, DomainError::Validation(_)));

    let no_products = submission("123456", &[]);
    let err = h.service.place_order(no_products).await.expect_err("no products");
    assert!(matches!(err, DomainError::Validation(_)));

    let zero_quantity = submission("123456", &[(1, "0")]);
    let err = h.service.place_order(zero_quantity).await.expect_err("zero quantity");
    assert!(matches!(err, DomainError::Validation(_)));

    assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn out_of_range_quantities_are_rejected_before_any_write() {
    let h = harness();

    // A tiny exponent would stall revenue rounding; a huge whole number would
    // commit an order whose amount no payment session can carry.
    for quantity in ["1e-20000000", "1e20"] {
        let started = std::time::Instant::now();
        let err = h
            .service
            .place_order(submission("123456", &[(1, quantity)]))
            .await
            .expect_err("quantity out of range");

        assert!(matches!(err, DomainError::Validation(_)), "{quantity}: {err:?}");
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    assert_eq!(h.store.order_count(), 0);
    assert!(h.gateway.requests().is_empty());
}

#[tokio::test]
async fn gateway_failure_keeps_order_for_retry() {
    let h = harness();
    h.gateway
        .fail_next(GatewayError::Unavailable("503 Service Unavailable".into()));

    let err = h
        .service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect_err("gateway down");

    let order_id = match err {
        DomainError::PaymentSession { order_id, source } => {
            assert!(source.is_retryable());
            order_id
        }
        other => panic!("unexpected error: {other:?}"),
    };
    let orders = h.store.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert!(orders[0].transaction_id.is_none());

    let outcome = h
        .service
        .retry_payment_session(order_id)
        .await
        .expect("retry succeeds");

    assert_eq!(outcome.order_id, order_id);
    assert_eq!(h.store.order_count(), 1);
    let order = h.service.get_order(order_id).await.unwrap().expect("order");
    assert_eq!(order.transaction_id.as_deref(), Some(outcome.session.id.as_str()));

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].idempotency_key, requests[1].idempotency_key);
    assert_eq!(requests[0].line_items, requests[1].line_items);
}

#[tokio::test]
async fn unrecorded_session_reports_order_and_session() {
    let h = harness();
    h.store.fail_next_attach();

    let err = h
        .service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect_err("session not stored");

    let order_id = h.store.orders()[0].id;
    match err {
        DomainError::SessionNotRecorded {
            order_id: id,
            session_id,
            ..
        } => {
            assert_eq!(id, order_id);
            assert_eq!(session_id, "sess_1");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.store.order_count(), 1);
    assert!(h.store.orders()[0].transaction_id.is_none());
}

#[tokio::test]
async fn retry_is_refused_once_a_session_exists() {
    let h = harness();
    let outcome = h
        .service
        .place_order(submission("123456", &[(1, "1")]))
        .await
        .expect("order placed");

    let err = h
        .service
        .retry_payment_session(outcome.order_id)
        .await
        .expect_err("already has a session");
    assert!(matches!(err, DomainError::PaymentSessionExists(id) if id == outcome.order_id));

    let err = h
        .service
        .retry_payment_session(uuid::Uuid::new_v4())
        .await
        .expect_err("no such order");
    assert!(matches!(err, DomainError::OrderNotFound));
    assert_eq!(h.gateway.requests().len(), 1);
}

#[tokio::test]
async fn confirmation_completes_order_and_notifies_both_parties() {
    let h = harness();
    let outcome = h
        .service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect("order placed");

    let confirmed = h.service.confirm(Some("sess_1")).await.expect("confirmed");
    assert_eq!(confirmed.order_id, outcome.order_id);
    assert!(confirmed.newly_completed);

    let order = h.service.get_order(outcome.order_id).await.unwrap().expect("order");
    assert!(order.complete);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, ADMIN_EMAIL);
    assert_eq!(sent[0].subject, "An order has been completed.");
    assert_eq!(
        sent[0].body,
        format!("Order #{} with total of $18.00 has been completed.", outcome.order_id)
    );
    assert_eq!(sent[1].to, AMBASSADOR_EMAIL);
    assert_eq!(sent[1].body, "You earned $2.00 from the link #123456.");
}

#[tokio::test]
async fn repeated_confirmation_notifies_once() {
    let h = harness();
    h.service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect("order placed");

    let first = h.service.confirm(Some("sess_1")).await.expect("first");
    let second = h.service.confirm(Some("sess_1")).await.expect("replay");

    assert!(first.newly_completed);
    assert!(!second.newly_completed);
    assert_eq!(first.order_id, second.order_id);
    assert_eq!(h.notifier.sent().len(), 2);
    assert!(h.store.orders()[0].complete);
}

#[tokio::test]
async fn concurrent_confirmations_complete_exactly_once() {
    let h = harness();
    h.service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect("order placed");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = h.service.clone();
            tokio::spawn(async move { service.confirm(Some("sess_1")).await })
        })
        .collect();

    let mut newly_completed = 0;
    for handle in handles {
        if handle.await.unwrap().expect("confirmed").newly_completed {
            newly_completed += 1;
        }
    }

    assert_eq!(newly_completed, 1);
    assert_eq!(h.notifier.sent().len(), 2);
}

#[tokio::test]
async fn unknown_session_is_not_found_and_changes_nothing() {
    let h = harness();
    h.service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect("order placed");

    let err = h.service.confirm(Some("sess_unknown")).await.expect_err("unknown");
    assert!(matches!(err, DomainError::OrderNotFound));

    let err = h.service.confirm(None).await.expect_err("missing source");
    assert!(matches!(err, DomainError::OrderNotFound));

    let err = h.service.confirm(Some("  ")).await.expect_err("blank source");
    assert!(matches!(err, DomainError::OrderNotFound));

    assert!(!h.store.orders()[0].complete);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn notification_failure_does_not_undo_completion() {
    let h = harness();
    h.notifier.fail_all();
    let outcome = h
        .service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect("order placed");

    let confirmed = h.service.confirm(Some("sess_1")).await.expect("confirmed");

    assert!(confirmed.newly_completed);
    let order = h.service.get_order(outcome.order_id).await.unwrap().expect("order");
    assert!(order.complete);
    // Both deliveries are still attempted.
    assert_eq!(h.notifier.sent().len(), 2);
}

#[tokio::test]
async fn order_items_keep_the_price_paid() {
    let h = harness();
    let outcome = h
        .service
        .place_order(submission("123456", &[(1, "2")]))
        .await
        .expect("order placed");

    h.store.add_product(1, "Product 1 renamed", "25.00");

    let order = h.service.get_order(outcome.order_id).await.unwrap().expect("order");
    assert_eq!(order.items[0].product_title, "Product 1");
    assert_eq!(order.items[0].price, dec("10.00"));
    assert_eq!(order.total(), dec("20.00"));
}

#[tokio::test]
async fn lists_orders_by_completion_state() {
    let h = harness();
    for _ in 0..3 {
        h.service
            .place_order(submission("123456", &[(1, "1")]))
            .await
            .expect("order placed");
    }
    h.service.confirm(Some("sess_2")).await.expect("confirmed");

    let all = h
        .service
        .list_orders(OrderFilter::default(), 1, 2)
        .await
        .expect("list");
    assert_eq!(all.total, 3);
    assert_eq!(all.items.len(), 2);

    let complete = h
        .service
        .list_orders(OrderFilter { complete: Some(true) }, 1, 20)
        .await
        .expect("list");
    assert_eq!(complete.total, 1);
    assert_eq!(complete.items[0].transaction_id.as_deref(), Some("sess_2"));
}

#[tokio::test]
async fn link_details_skip_products_missing_from_catalog() {
    let h = harness();
    h.store.add_product(2, "Product 2", "5.00");
    h.store.add_link("abcdef", AMBASSADOR_EMAIL, vec![2, 1, 42]);
    h.store.remove_product(1);

    let details = h
        .service
        .link_details("abcdef")
        .await
        .expect("lookup")
        .expect("link exists");

    assert_eq!(details.link.code, "abcdef");
    assert_eq!(details.products.len(), 1);
    assert_eq!(details.products[0].id, 2);

    assert!(h.service.link_details("missing").await.expect("lookup").is_none());
}

#[tokio::test]
async fn order_is_found_by_its_payment_session() {
    let h = harness();
    let outcome = h
        .service
        .place_order(submission("123456", &[(1, "1")]))
        .await
        .expect("order placed");

    let order = h
        .service
        .find_by_session(&outcome.session.id)
        .await
        .expect("lookup")
        .expect("order for session");
    assert_eq!(order.id, outcome.order_id);

    assert!(h.service.find_by_session("sess_unknown").await.expect("lookup").is_none());
}
