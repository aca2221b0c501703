mod common;

use common::{harness, order_for};
use dinein::domain::event::{EventKind, Topic};
use dinein::domain::order::{NewOrder, OrderRecord, OrderStatus, PaymentMethod};
use dinein::error::ServiceError;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_initial_status_follows_payment_method() {
    let h = harness(10);
    let online = h
        .services
        .orders
        .create_order(order_for(4, PaymentMethod::Online))
        .await
        .unwrap();
    assert_eq!(online.status, OrderStatus::AwaitingPayment);
    assert!(online.order_id.starts_with("ORDER_"));
    assert!(online.order_id.ends_with("_4"));
    assert_eq!(online.items.len(), 2);
    assert_eq!(online.total_price, dec!(28.00));

    let cash = h
        .services
        .orders
        .create_order(order_for(5, PaymentMethod::Cash))
        .await
        .unwrap();
    assert_eq!(cash.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_order_created_reaches_table_and_staff() {
    let h = harness(10);
    h.services
        .orders
        .create_order(order_for(7, PaymentMethod::Card))
        .await
        .unwrap();
    assert_eq!(
        h.events.topics(),
        vec![Topic::Global, Topic::Table(7), Topic::Admin]
    );
    let sent = h.events.sent.lock().unwrap();
    assert!(sent.iter().all(|(_, e)| e.event == EventKind::OrderCreated));
}

#[tokio::test]
async fn test_invalid_orders_are_rejected() {
    let h = harness(10);
    let cases = [
        NewOrder {
            table_number: Some(0),
            ..order_for(1, PaymentMethod::Cash)
        },
        NewOrder {
            table_number: Some(11),
            ..order_for(1, PaymentMethod::Cash)
        },
        NewOrder {
            items: Vec::new(),
            ..order_for(1, PaymentMethod::Cash)
        },
        NewOrder {
            total_price: None,
            ..order_for(1, PaymentMethod::Cash)
        },
        NewOrder {
            customer_name: Some("  ".into()),
            ..order_for(1, PaymentMethod::Cash)
        },
    ];
    for case in cases {
        assert!(matches!(
            h.services.orders.create_order(case).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }
    assert!(h.services.orders.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_status_outside_whitelist_leaves_order_unchanged() {
    let h = harness(10);
    let order = h
        .services
        .orders
        .create_order(order_for(2, PaymentMethod::Cash))
        .await
        .unwrap();

    for bad in ["Payment Failed", "Pending", "Served", ""] {
        let result = h.services.orders.update_status(&order.order_id, bad).await;
        assert!(
            matches!(result, Err(ServiceError::InvalidStatus(_))),
            "{bad} should be refused"
        );
    }
    let stored = h.services.orders.get_order(&order.order_id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.updated_at, order.updated_at);

    let ready = h
        .services
        .orders
        .update_status(&order.order_id, "ready")
        .await
        .unwrap();
    assert_eq!(ready.status, OrderStatus::Ready);
}

#[tokio::test]
async fn test_cancel_and_filtered_listings() {
    let h = harness(10);
    let a = h
        .services
        .orders
        .create_order(order_for(3, PaymentMethod::Cash))
        .await
        .unwrap();
    h.services
        .orders
        .create_order(order_for(8, PaymentMethod::Online))
        .await
        .unwrap();
    let cancelled = h.services.orders.cancel_order(&a.order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let at_three = h.services.orders.list_by_table(3).await.unwrap();
    assert_eq!(at_three.len(), 1);
    let awaiting = h
        .services
        .orders
        .list_by_status("Awaiting Payment")
        .await
        .unwrap();
    assert_eq!(awaiting.len(), 1);
    assert_eq!(awaiting[0].table_number, 8);
    assert!(matches!(
        h.services.orders.list_by_status("Lost").await,
        Err(ServiceError::InvalidStatus(_))
    ));
    assert!(matches!(
        h.services.orders.cancel_order("ORDER_1_1").await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_corrupt_item_blob_reads_as_empty() {
    let h = harness(10);
    let now = chrono::Local::now().naive_local();
    h.orders
        .insert(OrderRecord {
            order_id: "ORDER_1_6".into(),
            table_number: 6,
            customer_name: "Legacy".into(),
            items: "{not json".into(),
            total_price: dec!(12.50),
            payment_method: PaymentMethod::Cash,
            status: OrderStatus::Pending,
            payment_status: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let order = h.services.orders.get_order("ORDER_1_6").await.unwrap();
    assert!(order.items.is_empty());
    assert_eq!(order.total_price, dec!(12.50));
}
