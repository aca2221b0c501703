use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::order::{OrderPatch, OrderRecord};
use crate::domain::ports::{Allocation, BookingFilter, BookingStore, OrderFilter, OrderStore};
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use chrono::Local;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for bookings.
///
/// `insert_with` holds the write lock across the allocation decision and the
/// insert, which serializes concurrent bookings.
#[derive(Default, Clone)]
pub struct InMemoryBookingStore {
    bookings: Arc<RwLock<HashMap<String, Booking>>>,
}

impl InMemoryBookingStore {
    /// Creates a new, empty in-memory booking store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_with(&self, allocate: Allocation) -> Result<Booking> {
        let mut bookings = self.bookings.write().await;
        let snapshot: Vec<Booking> = bookings.values().cloned().collect();
        let booking = allocate(&snapshot)?;
        if bookings.contains_key(&booking.booking_id) {
            return Err(ServiceError::store(format!(
                "duplicate booking id {}",
                booking.booking_id
            )));
        }
        bookings.insert(booking.booking_id.clone(), booking.clone());
        Ok(booking)
    }

    async fn get(&self, booking_id: &str) -> Result<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(booking_id).cloned())
    }

    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut matching: Vec<Booking> = bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.booking_time
                .cmp(&b.booking_time)
                .then_with(|| a.table_number.cmp(&b.table_number))
        });
        Ok(matching)
    }

    async fn update_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings.get_mut(booking_id).map(|booking| {
            booking.status = status;
            booking.clone()
        }))
    }
}

/// A thread-safe in-memory store for orders.
///
/// Records are kept in their persisted shape, item blob included.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, OrderRecord>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: OrderRecord) -> Result<OrderRecord> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_id) {
            return Err(ServiceError::store(format!(
                "duplicate order id {}",
                order.order_id
            )));
        }
        orders.insert(order.order_id.clone(), order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: &str) -> Result<Option<OrderRecord>> {
        let orders = self.orders.read().await;
        Ok(orders.get(order_id).cloned())
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<OrderRecord> = orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_id.cmp(&a.order_id))
        });
        Ok(matching)
    }

    async fn update(&self, order_id: &str, patch: OrderPatch) -> Result<Option<OrderRecord>> {
        let mut orders = self.orders.write().await;
        let now = Local::now().naive_local();
        Ok(orders.get_mut(order_id).map(|order| {
            patch.apply(order, now);
            order.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interval::parse_timestamp;
    use crate::domain::order::{OrderStatus, PaymentMethod};
    use rust_decimal_macros::dec;

    fn booking(id: &str, table: u32, start: &str) -> Booking {
        let start = parse_timestamp(start).unwrap();
        Booking {
            booking_id: id.into(),
            table_number: table,
            party_size: 4,
            customer_name: "Mei".into(),
            customer_phone: "555-0102".into(),
            booking_time: start,
            duration_minutes: 60,
            status: BookingStatus::Booked,
            created_at: start,
        }
    }

    fn record(id: &str, table: u32, created: &str) -> OrderRecord {
        let created = parse_timestamp(created).unwrap();
        OrderRecord {
            order_id: id.into(),
            table_number: table,
            customer_name: "Mei".into(),
            items: "[]".into(),
            total_price: dec!(0),
            payment_method: PaymentMethod::Online,
            status: OrderStatus::AwaitingPayment,
            payment_status: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[tokio::test]
    async fn test_in_memory_booking_store() {
        let store = InMemoryBookingStore::new();
        let late = booking("BK-2", 1, "2026-03-01T21:00");
        let early = booking("BK-1", 2, "2026-03-01T18:00");
        for b in [late.clone(), early.clone()] {
            store.insert_with(Box::new(move |_: &[Booking]| Ok(b))).await.unwrap();
        }

        assert_eq!(store.get("BK-1").await.unwrap(), Some(early.clone()));
        assert!(store.get("BK-9").await.unwrap().is_none());

        let all = store.list(BookingFilter::default()).await.unwrap();
        assert_eq!(all, vec![early, late.clone()]);

        let from_evening = BookingFilter {
            from: parse_timestamp("2026-03-01T20:00"),
            until: None,
        };
        assert_eq!(store.list(from_evening).await.unwrap(), vec![late]);
    }

    #[tokio::test]
    async fn test_allocation_sees_existing_bookings() {
        let store = InMemoryBookingStore::new();
        let first = booking("BK-1", 1, "2026-03-01T19:00");
        store
            .insert_with(Box::new(move |_: &[Booking]| Ok(first)))
            .await
            .unwrap();

        let seen = store
            .insert_with(Box::new(|existing: &[Booking]| {
                assert_eq!(existing.len(), 1);
                Err(ServiceError::NoTableAvailable)
            }))
            .await;
        assert!(matches!(seen, Err(ServiceError::NoTableAvailable)));
        assert_eq!(store.list(BookingFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_booking_status_update_returns_row() {
        let store = InMemoryBookingStore::new();
        let b = booking("BK-1", 1, "2026-03-01T19:00");
        store.insert_with(Box::new(move |_: &[Booking]| Ok(b))).await.unwrap();

        let updated = store
            .update_status("BK-1", BookingStatus::Seated)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Seated);
        assert!(
            store
                .update_status("missing", BookingStatus::Seated)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_in_memory_order_store() {
        let store = InMemoryOrderStore::new();
        store
            .insert(record("ORDER_1_3", 3, "2026-03-01T18:00"))
            .await
            .unwrap();
        store
            .insert(record("ORDER_2_4", 4, "2026-03-01T19:00"))
            .await
            .unwrap();
        assert!(
            store
                .insert(record("ORDER_1_3", 3, "2026-03-01T18:00"))
                .await
                .is_err()
        );

        let newest_first: Vec<String> = store
            .list(OrderFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(newest_first, vec!["ORDER_2_4", "ORDER_1_3"]);

        let table_three = store
            .list(OrderFilter {
                table_number: Some(3),
                status: None,
            })
            .await
            .unwrap();
        assert_eq!(table_three.len(), 1);

        let patched = store
            .update(
                "ORDER_2_4",
                OrderPatch {
                    status: Some(OrderStatus::Preparing),
                    payment_status: Some("PAID".into()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched.status, OrderStatus::Preparing);
        assert_eq!(patched.payment_status.as_deref(), Some("PAID"));
        assert!(
            store
                .update("ORDER_9_9", OrderPatch::status(OrderStatus::Ready))
                .await
                .unwrap()
                .is_none()
        );
    }
}
