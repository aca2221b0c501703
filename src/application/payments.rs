//! Payment reconciliation between local orders and the remote gateway.
//!
//! The gateway is only ever reached through [`RetryPolicy::run`]. Webhook
//! outcomes are applied last-write-wins: a late failure delivered after a
//! success will move the order back to `Payment Failed`.

use crate::application::retry::RetryPolicy;
use crate::domain::event::{DomainEvent, EventKind, Topic};
use crate::domain::order::{Order, OrderPatch};
use crate::domain::payment::{
    CreateSessionRequest, GatewayOrderRef, GatewayOrderRequest, PAID, PaymentSession,
    PaymentState, PaymentVerification, VerificationSource, WebhookOutcome, WebhookPayload,
    WebhookSignature,
};
use crate::domain::ports::{EventPublisherRef, OrderStoreRef, PaymentGatewayRef};
use crate::error::{Result, ServiceError};

/// Keeps the payment axis of each order in step with the gateway.
pub struct PaymentReconciler {
    gateway: PaymentGatewayRef,
    orders: OrderStoreRef,
    events: EventPublisherRef,
    retry: RetryPolicy,
    verify_webhooks: bool,
}

impl PaymentReconciler {
    /// Creates a new `PaymentReconciler`.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The remote payment gateway.
    /// * `orders` - The order store; the reconciler is the only writer of `payment_status`.
    /// * `events` - Receives `payment_updated` events after webhook writes.
    /// * `retry` - Budget and timeout for every gateway call.
    /// * `verify_webhooks` - Whether raw deliveries must carry a valid signature.
    pub fn new(
        gateway: PaymentGatewayRef,
        orders: OrderStoreRef,
        events: EventPublisherRef,
        retry: RetryPolicy,
        verify_webhooks: bool,
    ) -> Self {
        Self {
            gateway,
            orders,
            events,
            retry,
            verify_webhooks,
        }
    }

    /// Opens a gateway payment session for an order that is not yet paid.
    pub async fn create_session(&self, payload: CreateSessionRequest) -> Result<PaymentSession> {
        let request = GatewayOrderRequest::try_from(payload)?;
        let order = self
            .orders
            .get(&request.order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", request.order_id.clone()))?;
        if PaymentState::from_gateway_status(order.payment_status.as_deref()) == PaymentState::Paid
        {
            return Err(ServiceError::PaymentAlreadyConfirmed(order.order_id));
        }

        let session = self
            .retry
            .run("create_order", || self.gateway.create_order(&request))
            .await
            .map_err(|exhausted| ServiceError::PaymentCreationFailed {
                attempts: exhausted.attempts,
                source: exhausted.last_error,
            })?;

        tracing::info!(
            order_id = %request.order_id,
            amount = %request.order_amount,
            "payment session created"
        );
        Ok(PaymentSession {
            session_id: session.payment_session_id,
            order_id: request.order_id,
            amount: request.order_amount,
            currency: request.order_currency,
        })
    }

    /// Entry point for raw gateway callbacks: checks the signature when
    /// configured to, then applies the decoded payload.
    pub async fn handle_webhook_delivery(
        &self,
        body: &[u8],
        signature: &WebhookSignature,
    ) -> Result<WebhookOutcome> {
        if self.verify_webhooks {
            self.gateway
                .verify_webhook(body, signature)
                .map_err(ServiceError::InvalidSignature)?;
        }
        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| ServiceError::InvalidInput(format!("unreadable webhook body: {e}")))?;
        self.handle_webhook(payload).await
    }

    /// Writes the reported payment status and the kitchen status it implies.
    ///
    /// Redelivering the same payload yields the same row. The write is not
    /// conditioned on the previous state.
    pub async fn handle_webhook(&self, payload: WebhookPayload) -> Result<WebhookOutcome> {
        let reference = GatewayOrderRef::parse(&payload.order_id).inspect_err(|_| {
            tracing::warn!(order_id = %payload.order_id, "webhook rejected, malformed order id");
        })?;

        let payment_state = PaymentState::from_gateway_status(Some(&payload.order_status));
        let patch = OrderPatch {
            status: payment_state.kitchen_status(),
            payment_status: Some(payload.order_status.clone()),
        };
        let record = self
            .orders
            .update(&payload.order_id, patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", payload.order_id.clone()))?;
        let order = Order::from(record);

        tracing::info!(
            order_id = %order.order_id,
            table = reference.table_number,
            payment_status = %payload.order_status,
            status = %order.status,
            "payment webhook applied"
        );
        let event = DomainEvent::order(EventKind::PaymentUpdated, order.clone());
        self.events
            .publish_all(&Topic::for_order(reference.table_number), &event);

        Ok(WebhookOutcome {
            order,
            table_number: reference.table_number,
            payment_id: payload.cf_payment_id,
            payment_state,
        })
    }

    /// Local-first payment check. A locally settled order never reaches the
    /// gateway.
    pub async fn verify_payment(&self, order_id: &str) -> Result<PaymentVerification> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .map(Order::from)
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        if let Some(status) = order
            .payment_status
            .as_deref()
            .filter(|s| s.eq_ignore_ascii_case(PAID))
        {
            return Ok(PaymentVerification {
                order_id: order.order_id.clone(),
                payment_status: status.to_string(),
                payment_state: PaymentState::Paid,
                source: VerificationSource::Local,
                order,
            });
        }

        let live = self
            .retry
            .run("fetch_order", || self.gateway.fetch_order(order_id))
            .await
            .map_err(|exhausted| ServiceError::PaymentVerificationFailed {
                attempts: exhausted.attempts,
                source: exhausted.last_error,
            })?;
        tracing::debug!(order_id, gateway_status = %live.order_status, "payment verified with gateway");
        Ok(PaymentVerification {
            order_id: order.order_id.clone(),
            payment_state: PaymentState::from_gateway_status(Some(&live.order_status)),
            payment_status: live.order_status,
            source: VerificationSource::Gateway,
            order,
        })
    }
}
