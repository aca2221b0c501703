use crate::domain::order::{ORDER_ID_PREFIX, Order, OrderStatus};
use crate::error::{Result, ServiceError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gateway status string that marks a settled payment.
pub const PAID: &str = "PAID";

/// Payment-side state of an order, derived from its raw gateway status.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Awaiting,
    Paid,
    Failed,
}

impl PaymentState {
    /// The one mapping from a gateway status to a payment state, shared by
    /// webhooks, verification and session creation.
    ///
    /// `None` means no outcome has been reported yet. Any reported status
    /// other than `PAID`, including the gateway's open `ACTIVE`, counts as
    /// failed; the raw string travels alongside for callers that need it.
    pub fn from_gateway_status(status: Option<&str>) -> Self {
        match status {
            None => Self::Awaiting,
            Some(s) if s.eq_ignore_ascii_case(PAID) => Self::Paid,
            Some(_) => Self::Failed,
        }
    }

    /// Kitchen status a webhook outcome moves the order to.
    pub fn kitchen_status(self) -> Option<OrderStatus> {
        match self {
            Self::Awaiting => None,
            Self::Paid => Some(OrderStatus::Preparing),
            Self::Failed => Some(OrderStatus::PaymentFailed),
        }
    }
}

/// The three-part gateway order identifier `ORDER_<timestamp>_<table>`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct GatewayOrderRef {
    pub timestamp: i64,
    pub table_number: u32,
}

impl GatewayOrderRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || ServiceError::InvalidOrderFormat(raw.to_string());
        let mut parts = raw.split('_');
        let (Some(prefix), Some(timestamp), Some(table), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        if prefix != ORDER_ID_PREFIX {
            return Err(invalid());
        }
        let timestamp = timestamp.parse::<i64>().map_err(|_| invalid())?;
        let table_number = table.parse::<u32>().map_err(|_| invalid())?;
        if table_number == 0 {
            return Err(invalid());
        }
        Ok(Self {
            timestamp,
            table_number,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CustomerDetails {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub customer_phone: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct OrderMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
}

/// Unvalidated session request as received from a client.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct CreateSessionRequest {
    pub order_id: Option<String>,
    pub order_amount: Option<Decimal>,
    pub order_currency: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub order_meta: Option<OrderMeta>,
}

/// Body sent to the gateway's create-order operation.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct GatewayOrderRequest {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub order_amount: Decimal,
    pub order_currency: String,
    pub customer_details: CustomerDetails,
    pub order_meta: OrderMeta,
}

impl TryFrom<CreateSessionRequest> for GatewayOrderRequest {
    type Error = ServiceError;

    fn try_from(req: CreateSessionRequest) -> Result<Self> {
        let missing = |field: &str| ServiceError::InvalidInput(format!("{field} is required"));
        let order_id = req
            .order_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| missing("order_id"))?;
        let order_amount = req.order_amount.ok_or_else(|| missing("order_amount"))?;
        if order_amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "order_amount must be positive".to_string(),
            ));
        }
        let order_currency = req
            .order_currency
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| missing("order_currency"))?;
        let customer_details = req
            .customer_details
            .ok_or_else(|| missing("customer_details"))?;
        let order_meta = req.order_meta.ok_or_else(|| missing("order_meta"))?;
        Ok(Self {
            order_id,
            order_amount,
            order_currency,
            customer_details,
            order_meta,
        })
    }
}

/// What the gateway hands back when an order is created on its side.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct GatewaySession {
    pub payment_session_id: String,
    #[serde(default)]
    pub order_status: Option<String>,
}

/// What the gateway reports for an existing order.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct GatewayOrderStatus {
    pub order_id: String,
    pub order_status: String,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PaymentSession {
    pub session_id: String,
    pub order_id: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Payment outcome delivered by the gateway's callback.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct WebhookPayload {
    pub order_id: String,
    #[serde(default)]
    pub cf_payment_id: Option<String>,
    pub order_status: String,
    #[serde(default)]
    pub order_amount: Option<Decimal>,
}

/// Signature headers accompanying a raw webhook delivery.
#[derive(Debug, Default, Clone)]
pub struct WebhookSignature {
    pub timestamp: Option<String>,
    pub signature: Option<String>,
}

/// The updated order plus the correlation data parsed from the webhook.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct WebhookOutcome {
    pub order: Order,
    pub table_number: u32,
    pub payment_id: Option<String>,
    pub payment_state: PaymentState,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum VerificationSource {
    Local,
    Gateway,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PaymentVerification {
    pub order_id: String,
    pub payment_status: String,
    pub payment_state: PaymentState,
    pub source: VerificationSource,
    pub order: Order,
}
