use super::AppState;
use super::extract::{ApiJson, ApiPath};
use crate::domain::order::{NewOrder, Order};
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: String,
}

pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.services.orders.list_orders().await?))
}

pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.services.orders.create_order(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Order>> {
    Ok(Json(state.services.orders.get_order(&id).await?))
}

pub async fn list_by_table(
    State(state): State<AppState>,
    ApiPath(table): ApiPath<u32>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.services.orders.list_by_table(table).await?))
}

pub async fn list_by_status(
    State(state): State<AppState>,
    ApiPath(status): ApiPath<String>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.services.orders.list_by_status(&status).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<Order>> {
    let order = state
        .services
        .orders
        .update_status(&id, &body.status)
        .await?;
    Ok(Json(order))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Order>> {
    Ok(Json(state.services.orders.cancel_order(&id).await?))
}
