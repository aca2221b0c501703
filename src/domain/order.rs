use crate::error::ServiceError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every order id and the gateway order identifier.
pub const ORDER_ID_PREFIX: &str = "ORDER";

/// Kitchen-side status of an order. Independent of `payment_status`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
pub enum OrderStatus {
    Pending,
    #[serde(rename = "Awaiting Payment")]
    AwaitingPayment,
    Preparing,
    Ready,
    Delivered,
    #[serde(rename = "Payment Failed")]
    PaymentFailed,
    Cancelled,
}

impl OrderStatus {
    /// Statuses staff may set directly through a status update.
    pub const ASSIGNABLE: [OrderStatus; 5] = [
        Self::AwaitingPayment,
        Self::Preparing,
        Self::Ready,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::AwaitingPayment => "Awaiting Payment",
            Self::Preparing => "Preparing",
            Self::Ready => "Ready",
            Self::Delivered => "Delivered",
            Self::PaymentFailed => "Payment Failed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_assignable(self) -> bool {
        Self::ASSIGNABLE.contains(&self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ServiceError;

    /// Accepts the display form, snake_case or kebab-case, in any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "awaitingpayment" => Ok(Self::AwaitingPayment),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "delivered" => Ok(Self::Delivered),
            "paymentfailed" => Ok(Self::PaymentFailed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ServiceError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Online,
    Card,
}

impl PaymentMethod {
    /// Kitchen status an order starts in for this payment method.
    pub fn initial_status(self) -> OrderStatus {
        match self {
            Self::Online => OrderStatus::AwaitingPayment,
            Self::Cash | Self::Card => OrderStatus::Pending,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The order as served to callers and broadcast to subscribers.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub order_id: String,
    pub table_number: u32,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The order as persisted: items travel as a serialized JSON blob.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderRecord {
    pub order_id: String,
    pub table_number: u32,
    pub customer_name: String,
    pub items: String,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        let items = decode_items(&record.order_id, &record.items);
        Self {
            order_id: record.order_id,
            table_number: record.table_number,
            customer_name: record.customer_name,
            items,
            total_price: record.total_price,
            payment_method: record.payment_method,
            status: record.status,
            payment_status: record.payment_status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Deserializes a stored item blob; corrupt or empty blobs read as no items.
pub fn decode_items(order_id: &str, blob: &str) -> Vec<OrderItem> {
    if blob.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(blob).unwrap_or_else(|err| {
        tracing::warn!(order_id, error = %err, "stored order items unreadable, serving empty list");
        Vec::new()
    })
}

/// Field changes applied by an update-returning store write.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<String>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            payment_status: None,
        }
    }

    pub fn apply(&self, record: &mut OrderRecord, now: NaiveDateTime) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(payment_status) = &self.payment_status {
            record.payment_status = Some(payment_status.clone());
        }
        record.updated_at = now;
    }
}

/// Unvalidated order request as received from a client.
#[derive(Debug, Deserialize, Clone)]
pub struct NewOrder {
    pub table_number: Option<u32>,
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_price: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
}

/// `ORDER_<unix micros>_<table>`
pub fn order_id(now: NaiveDateTime, table_number: u32) -> String {
    format!(
        "{ORDER_ID_PREFIX}_{}_{table_number}",
        now.and_utc().timestamp_micros()
    )
}
