use crate::domain::interval::TimeWindow;
use crate::error::ServiceError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a table booking.
///
/// Only `Booked` and `Seated` bookings hold a table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BookingStatus {
    Booked,
    Seated,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Booked | Self::Seated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booked => "Booked",
            Self::Seated => "Seated",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "booked" => Ok(Self::Booked),
            "seated" => Ok(Self::Seated),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ServiceError::InvalidInput(format!(
                "unknown booking status '{s}'"
            ))),
        }
    }
}

/// A reservation of one table for a time window.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Booking {
    pub booking_id: String,
    pub table_number: u32,
    pub party_size: u32,
    pub customer_name: String,
    pub customer_phone: String,
    pub booking_time: NaiveDateTime,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
}

impl Booking {
    /// Whether this booking holds its table during `window`.
    pub fn blocks(&self, window: &TimeWindow) -> bool {
        self.status.is_active() && window.overlaps(self.booking_time, self.duration_minutes)
    }
}

/// Unvalidated booking request as received from a client.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct NewBooking {
    pub table_number: Option<u32>,
    pub party_size: Option<u32>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub booking_time: Option<String>,
    pub duration_minutes: Option<u32>,
}

/// A booking request that passed boundary validation, before a table is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub table_number: Option<u32>,
    pub party_size: u32,
    pub customer_name: String,
    pub customer_phone: String,
    pub window: TimeWindow,
    pub duration_minutes: u32,
}

impl BookingRequest {
    /// Materializes the request on `table_number`.
    pub fn into_booking(self, table_number: u32, now: NaiveDateTime) -> Booking {
        Booking {
            booking_id: booking_id(now, table_number),
            table_number,
            party_size: self.party_size,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            booking_time: self.window.start,
            duration_minutes: self.duration_minutes,
            status: BookingStatus::Booked,
            created_at: now,
        }
    }
}

/// `BK-<yyyymmddHHMMSS>-T<table>-<suffix>`
pub fn booking_id(now: NaiveDateTime, table_number: u32) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "BK-{}-T{}-{}",
        now.format("%Y%m%d%H%M%S"),
        table_number,
        &suffix[..8]
    )
}
