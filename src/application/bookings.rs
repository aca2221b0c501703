use crate::application::availability::resolve;
use crate::domain::booking::{Booking, BookingRequest, BookingStatus, NewBooking};
use crate::domain::event::{DomainEvent, EventKind, Topic};
use crate::domain::interval::{TimeWindow, parse_timestamp};
use crate::domain::ports::{Allocation, BookingFilter, BookingStoreRef, EventPublisherRef};
use crate::error::{Result, ServiceError};
use chrono::{Local, NaiveDate, NaiveTime};

/// Creates, transitions and cancels table bookings.
///
/// Table choice and insert happen inside one store write boundary, so two
/// concurrent requests cannot both claim the same table for overlapping
/// windows.
pub struct BookingManager {
    store: BookingStoreRef,
    events: EventPublisherRef,
    table_count: u32,
    default_duration_minutes: u32,
}

impl BookingManager {
    /// Creates a new `BookingManager`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where bookings are read and written.
    /// * `events` - Receives booking events after each committed write.
    /// * `table_count` - Tables are numbered `1..=table_count`.
    /// * `default_duration_minutes` - Used when a request omits its duration.
    pub fn new(
        store: BookingStoreRef,
        events: EventPublisherRef,
        table_count: u32,
        default_duration_minutes: u32,
    ) -> Self {
        Self {
            store,
            events,
            table_count,
            default_duration_minutes,
        }
    }

    /// Bookings starting on or after `from_day` (default: today), earliest first.
    pub async fn list_bookings(&self, from_day: Option<NaiveDate>) -> Result<Vec<Booking>> {
        let day = from_day.unwrap_or_else(|| Local::now().date_naive());
        let filter = BookingFilter {
            from: Some(day.and_time(NaiveTime::MIN)),
            until: None,
        };
        self.store.list(filter).await
    }

    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        self.store
            .get(booking_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("booking", booking_id))
    }

    pub async fn create_booking(&self, input: NewBooking) -> Result<Booking> {
        let request = self.validate(input)?;
        let table_count = self.table_count;
        let allocate: Allocation = Box::new(move |existing: &[Booking]| {
            let availability = resolve(existing, &request.window, table_count);
            let table = match request.table_number {
                Some(pinned) if availability.is_free(pinned) => pinned,
                Some(_) => return Err(ServiceError::NoTableAvailable),
                None => availability
                    .lowest_free()
                    .ok_or(ServiceError::NoTableAvailable)?,
            };
            let now = Local::now().naive_local();
            Ok(request.into_booking(table, now))
        });

        let booking = self.store.insert_with(allocate).await.inspect_err(|err| {
            if matches!(err, ServiceError::NoTableAvailable) {
                tracing::info!("booking rejected, no table free for requested slot");
            }
        })?;
        tracing::info!(
            booking_id = %booking.booking_id,
            table = booking.table_number,
            at = %booking.booking_time,
            "booking created"
        );
        self.broadcast(EventKind::BookingCreated, &booking);
        Ok(booking)
    }

    /// Overwrites the status unconditionally; staff corrections go through here.
    pub async fn update_status(&self, booking_id: &str, status: BookingStatus) -> Result<Booking> {
        let booking = self
            .store
            .update_status(booking_id, status)
            .await?
            .ok_or_else(|| ServiceError::not_found("booking", booking_id))?;
        tracing::info!(booking_id, status = %status, "booking status updated");
        self.broadcast(EventKind::BookingUpdated, &booking);
        Ok(booking)
    }

    pub async fn cancel_booking(&self, booking_id: &str) -> Result<Booking> {
        let booking = self
            .store
            .update_status(booking_id, BookingStatus::Cancelled)
            .await?
            .ok_or_else(|| ServiceError::not_found("booking", booking_id))?;
        tracing::info!(booking_id, "booking cancelled");
        self.broadcast(EventKind::BookingCancelled, &booking);
        Ok(booking)
    }

    fn validate(&self, input: NewBooking) -> Result<BookingRequest> {
        let customer_name = required_text(input.customer_name, "customer_name")?;
        let customer_phone = required_text(input.customer_phone, "customer_phone")?;
        let party_size = match input.party_size {
            Some(0) => {
                return Err(ServiceError::InvalidInput(
                    "party_size must be at least 1".to_string(),
                ));
            }
            Some(n) => n,
            None => {
                return Err(ServiceError::InvalidInput(
                    "party_size is required".to_string(),
                ));
            }
        };
        let raw_time = input
            .booking_time
            .ok_or_else(|| ServiceError::InvalidInput("booking_time is required".to_string()))?;
        let start = parse_timestamp(&raw_time).ok_or_else(|| {
            ServiceError::InvalidInput(format!("booking_time '{raw_time}' is not a timestamp"))
        })?;
        let duration_minutes = input
            .duration_minutes
            .unwrap_or(self.default_duration_minutes);
        if duration_minutes == 0 {
            return Err(ServiceError::InvalidInput(
                "duration_minutes must be positive".to_string(),
            ));
        }
        if let Some(table) = input.table_number
            && !(1..=self.table_count).contains(&table)
        {
            return Err(ServiceError::InvalidInput(format!(
                "table_number must be between 1 and {}",
                self.table_count
            )));
        }
        let window = TimeWindow::starting_at(start, duration_minutes).ok_or_else(|| {
            ServiceError::InvalidInput("booking window is out of range".to_string())
        })?;
        Ok(BookingRequest {
            table_number: input.table_number,
            party_size,
            customer_name,
            customer_phone,
            window,
            duration_minutes,
        })
    }

    fn broadcast(&self, kind: EventKind, booking: &Booking) {
        let event = DomainEvent::booking(kind, booking.clone());
        self.events.publish_all(&Topic::BOOKING, &event);
    }
}

pub(crate) fn required_text(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::InvalidInput(format!("{field} is required")))
}
