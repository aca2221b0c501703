//! HTTP and websocket surface.
//!
//! Handlers translate requests into manager calls and nothing more; every
//! rule lives in the application layer.

mod bookings;
mod error;
mod extract;
mod orders;
mod payments;
mod socket;

use crate::application::Services;
use crate::infrastructure::broadcast::SubscriptionRegistry;
use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::sync::Arc;

pub use error::ErrorBody;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub registry: Arc<SubscriptionRegistry>,
    /// Window length for availability queries that omit `duration`.
    pub default_duration_minutes: u32,
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/{id}",
            get(bookings::get_booking).delete(bookings::cancel_booking),
        )
        .route("/bookings/{id}/status", put(bookings::update_status))
        .route("/tables/availability", get(bookings::available_tables))
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/table/{table}", get(orders::list_by_table))
        .route("/orders/status/{status}", get(orders::list_by_status))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/cancel", post(orders::cancel_order))
        .route("/payments/session", post(payments::create_session))
        .route("/payments/webhook", post(payments::webhook))
        .route("/payments/verify/{order_id}", get(payments::verify_payment));

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(socket::upgrade))
        .nest("/api", api_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
