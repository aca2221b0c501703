use super::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::application::availability::TableAvailability;
use crate::domain::booking::{Booking, BookingStatus, NewBooking};
use crate::domain::interval::{parse_day, parse_timestamp};
use crate::error::{Result, ServiceError};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    from: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    at: String,
    duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: String,
}

pub async fn list_bookings(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Booking>>> {
    let from = query
        .from
        .as_deref()
        .map(|raw| {
            parse_day(raw)
                .ok_or_else(|| ServiceError::InvalidInput(format!("'{raw}' is not a date")))
        })
        .transpose()?;
    let bookings = state.services.bookings.list_bookings(from).await?;
    Ok(Json(bookings))
}

pub async fn create_booking(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewBooking>,
) -> Result<(StatusCode, Json<Booking>)> {
    let booking = state.services.bookings.create_booking(input).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Booking>> {
    Ok(Json(state.services.bookings.get_booking(&id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<Booking>> {
    let status: BookingStatus = body.status.parse()?;
    Ok(Json(state.services.bookings.update_status(&id, status).await?))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Booking>> {
    Ok(Json(state.services.bookings.cancel_booking(&id).await?))
}

pub async fn available_tables(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<Json<TableAvailability>> {
    let at = parse_timestamp(&query.at)
        .ok_or_else(|| ServiceError::InvalidInput(format!("'{}' is not a timestamp", query.at)))?;
    let duration = query.duration.unwrap_or(state.default_duration_minutes);
    let availability = state
        .services
        .availability
        .available_tables(at, duration)
        .await?;
    Ok(Json(availability))
}
