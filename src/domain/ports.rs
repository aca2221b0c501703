use super::booking::{Booking, BookingStatus};
use super::event::{DomainEvent, Topic};
use super::order::{OrderPatch, OrderRecord, OrderStatus};
use super::payment::{GatewayOrderRequest, GatewayOrderStatus, GatewaySession, WebhookSignature};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Decides which booking to insert given every booking currently stored.
///
/// Runs inside the store's write boundary, so no other insert can observe
/// the snapshot between the decision and the write.
pub type Allocation = Box<dyn FnOnce(&[Booking]) -> Result<Booking> + Send>;

/// Select filter for bookings; bounds apply to `booking_time`, `until` is exclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BookingFilter {
    pub from: Option<NaiveDateTime>,
    pub until: Option<NaiveDateTime>,
}

impl BookingFilter {
    pub fn between(from: NaiveDateTime, until: NaiveDateTime) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.from.is_none_or(|from| booking.booking_time >= from)
            && self.until.is_none_or(|until| booking.booking_time < until)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OrderFilter {
    pub table_number: Option<u32>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &OrderRecord) -> bool {
        self.table_number.is_none_or(|t| order.table_number == t)
            && self.status.is_none_or(|s| order.status == s)
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Serialized read-decide-insert. Returns the inserted booking.
    async fn insert_with(&self, allocate: Allocation) -> Result<Booking>;
    async fn get(&self, booking_id: &str) -> Result<Option<Booking>>;
    /// Matching bookings ordered by `booking_time` ascending.
    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>>;
    async fn update_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: OrderRecord) -> Result<OrderRecord>;
    async fn get(&self, order_id: &str) -> Result<Option<OrderRecord>>;
    /// Matching orders, newest first.
    async fn list(&self, filter: OrderFilter) -> Result<Vec<OrderRecord>>;
    async fn update(&self, order_id: &str, patch: OrderPatch) -> Result<Option<OrderRecord>>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> std::result::Result<GatewaySession, GatewayError>;

    async fn fetch_order(
        &self,
        order_id: &str,
    ) -> std::result::Result<GatewayOrderStatus, GatewayError>;

    /// Checks a raw webhook delivery against its signature headers.
    fn verify_webhook(
        &self,
        body: &[u8],
        signature: &WebhookSignature,
    ) -> std::result::Result<(), GatewayError>;
}

/// Fan-out of domain events to topic audiences. Delivery is best-effort.
pub trait EventPublisher: Send + Sync {
    /// Returns how many subscribers the event was handed to.
    fn publish(&self, topic: Topic, event: &DomainEvent) -> usize;

    fn publish_all(&self, topics: &[Topic], event: &DomainEvent) -> usize {
        topics.iter().map(|topic| self.publish(*topic, event)).sum()
    }
}

pub type BookingStoreRef = Arc<dyn BookingStore>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
pub type EventPublisherRef = Arc<dyn EventPublisher>;
