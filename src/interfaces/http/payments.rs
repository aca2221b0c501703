use super::AppState;
use super::extract::{ApiJson, ApiPath};
use crate::domain::payment::{
    CreateSessionRequest, PaymentSession, PaymentVerification, WebhookSignature,
};
use crate::error::{Result, ServiceError};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

pub const HEADER_WEBHOOK_TIMESTAMP: &str = "x-webhook-timestamp";
pub const HEADER_WEBHOOK_SIGNATURE: &str = "x-webhook-signature";

pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateSessionRequest>,
) -> Result<Json<PaymentSession>> {
    Ok(Json(state.services.payments.create_session(payload).await?))
}

/// Deliveries that can never be applied (bad JSON, a malformed order id, an
/// order this service does not hold) are acknowledged with 200 and
/// `{"status":"rejected"}` so the gateway stops redelivering them.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let signature = WebhookSignature {
        timestamp: header(HEADER_WEBHOOK_TIMESTAMP),
        signature: header(HEADER_WEBHOOK_SIGNATURE),
    };

    match state
        .services
        .payments
        .handle_webhook_delivery(&body, &signature)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "order_id": outcome.order.order_id,
                "table_number": outcome.table_number,
                "payment_state": outcome.payment_state,
            })),
        )
            .into_response(),
        Err(
            err @ (ServiceError::InvalidInput(_)
            | ServiceError::InvalidOrderFormat(_)
            | ServiceError::NotFound { .. }),
        ) => {
            tracing::warn!(error = %err, "webhook rejected");
            (
                StatusCode::OK,
                Json(json!({ "status": "rejected", "reason": err.kind() })),
            )
                .into_response()
        }
        Err(err) => {
            if matches!(err, ServiceError::InvalidSignature(_)) {
                tracing::warn!(error = %err, "webhook signature rejected");
            }
            err.into_response()
        }
    }
}

pub async fn verify_payment(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<String>,
) -> Result<Json<PaymentVerification>> {
    Ok(Json(state.services.payments.verify_payment(&order_id).await?))
}
