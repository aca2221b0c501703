//! Application layer: the booking, order and payment managers.
//!
//! Managers share one persistence collaborator and one event publisher and
//! never call into each other. [`Services`] wires them from a [`Config`].

pub mod availability;
pub mod bookings;
pub mod orders;
pub mod payments;
pub mod retry;

use crate::config::Config;
use crate::domain::ports::{BookingStoreRef, EventPublisherRef, OrderStoreRef, PaymentGatewayRef};
use availability::AvailabilityResolver;
use bookings::BookingManager;
use orders::OrderManager;
use payments::PaymentReconciler;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub availability: Arc<AvailabilityResolver>,
    pub bookings: Arc<BookingManager>,
    pub orders: Arc<OrderManager>,
    pub payments: Arc<PaymentReconciler>,
}

impl Services {
    /// Wires every manager over the shared store, gateway and publisher.
    ///
    /// # Arguments
    ///
    /// * `config` - Table count, default duration, retry policy and webhook settings.
    /// * `booking_store` - Shared by the availability resolver and the booking manager.
    /// * `order_store` - Shared by the order manager and the payment reconciler.
    /// * `gateway` - The payment gateway adapter.
    /// * `events` - The broadcast collaborator.
    pub fn new(
        config: &Config,
        booking_store: BookingStoreRef,
        order_store: OrderStoreRef,
        gateway: PaymentGatewayRef,
        events: EventPublisherRef,
    ) -> Self {
        Self {
            availability: Arc::new(AvailabilityResolver::new(
                booking_store.clone(),
                config.table_count,
            )),
            bookings: Arc::new(BookingManager::new(
                booking_store,
                events.clone(),
                config.table_count,
                config.default_duration_minutes,
            )),
            orders: Arc::new(OrderManager::new(
                order_store.clone(),
                events.clone(),
                config.table_count,
            )),
            payments: Arc::new(PaymentReconciler::new(
                gateway,
                order_store,
                events,
                config.retry.clone(),
                config.gateway.verify_webhooks,
            )),
        }
    }
}
