#![allow(dead_code)]

use async_trait::async_trait;
use dinein::application::Services;
use dinein::application::retry::RetryPolicy;
use dinein::config::Config;
use dinein::domain::booking::NewBooking;
use dinein::domain::event::{DomainEvent, Topic};
use dinein::domain::order::{NewOrder, OrderItem, PaymentMethod};
use dinein::domain::payment::{
    GatewayOrderRequest, GatewayOrderStatus, GatewaySession, WebhookSignature,
};
use dinein::domain::ports::{EventPublisher, OrderStoreRef, PaymentGateway};
use dinein::error::GatewayError;
use dinein::infrastructure::in_memory::{InMemoryBookingStore, InMemoryOrderStore};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Gateway double that replays queued outcomes in order and counts calls.
#[derive(Default)]
pub struct ScriptedGateway {
    creates: Mutex<VecDeque<Result<GatewaySession, GatewayError>>>,
    fetches: Mutex<VecDeque<Result<GatewayOrderStatus, GatewayError>>>,
    pub create_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub accept_signatures: bool,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            accept_signatures: true,
            ..Self::default()
        }
    }

    pub fn rejecting_signatures() -> Self {
        Self::default()
    }

    pub fn push_create(&self, outcome: Result<GatewaySession, GatewayError>) {
        self.creates.lock().unwrap().push_back(outcome);
    }

    pub fn push_fetch(&self, outcome: Result<GatewayOrderStatus, GatewayError>) {
        self.fetches.lock().unwrap().push_back(outcome);
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_order(
        &self,
        _request: &GatewayOrderRequest,
    ) -> Result<GatewaySession, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("script exhausted".into())))
    }

    async fn fetch_order(&self, _order_id: &str) -> Result<GatewayOrderStatus, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("script exhausted".into())))
    }

    fn verify_webhook(
        &self,
        _body: &[u8],
        _signature: &WebhookSignature,
    ) -> Result<(), GatewayError> {
        if self.accept_signatures {
            Ok(())
        } else {
            Err(GatewayError::Signature("signature mismatch".into()))
        }
    }
}

/// Publisher that keeps every event with the topic it was sent to.
#[derive(Default)]
pub struct RecordingPublisher {
    pub sent: Mutex<Vec<(Topic, DomainEvent)>>,
}

impl RecordingPublisher {
    pub fn topics(&self) -> Vec<Topic> {
        self.sent.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, topic: Topic, event: &DomainEvent) -> usize {
        self.sent.lock().unwrap().push((topic, event.clone()));
        1
    }
}

pub struct Harness {
    pub services: Services,
    pub gateway: Arc<ScriptedGateway>,
    pub events: Arc<RecordingPublisher>,
    pub orders: OrderStoreRef,
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::fixed(3, Duration::from_millis(5)).with_timeout(Duration::from_millis(200))
}

pub fn harness(table_count: u32) -> Harness {
    harness_with(table_count, ScriptedGateway::new(), false)
}

pub fn harness_with(table_count: u32, gateway: ScriptedGateway, verify_webhooks: bool) -> Harness {
    let mut config = Config {
        table_count,
        retry: fast_retry(),
        ..Config::default()
    };
    config.gateway.verify_webhooks = verify_webhooks;

    let gateway = Arc::new(gateway);
    let events = Arc::new(RecordingPublisher::default());
    let orders: OrderStoreRef = Arc::new(InMemoryOrderStore::new());
    let services = Services::new(
        &config,
        Arc::new(InMemoryBookingStore::new()),
        orders.clone(),
        gateway.clone(),
        events.clone(),
    );
    Harness {
        services,
        gateway,
        events,
        orders,
    }
}

pub fn booking_at(time: &str, duration: u32, table: Option<u32>) -> NewBooking {
    NewBooking {
        table_number: table,
        party_size: Some(2),
        customer_name: Some("Asha".into()),
        customer_phone: Some("555-0100".into()),
        booking_time: Some(time.into()),
        duration_minutes: Some(duration),
    }
}

pub fn order_for(table: u32, method: PaymentMethod) -> NewOrder {
    NewOrder {
        table_number: Some(table),
        customer_name: Some("Asha".into()),
        items: vec![
            OrderItem {
                name: "Masala Dosa".into(),
                quantity: 2,
                unit_price: Decimal::new(1250, 2),
            },
            OrderItem {
                name: "Chai".into(),
                quantity: 1,
                unit_price: Decimal::new(300, 2),
            },
        ],
        total_price: Some(Decimal::new(2800, 2)),
        payment_method: Some(method),
    }
}

pub fn session(id: &str) -> GatewaySession {
    GatewaySession {
        payment_session_id: id.into(),
        order_status: Some("ACTIVE".into()),
    }
}
