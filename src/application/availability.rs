use crate::domain::booking::Booking;
use crate::domain::interval::{TimeWindow, day_bounds};
use crate::domain::ports::{BookingFilter, BookingStoreRef};
use crate::error::{Result, ServiceError};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;

/// Free and occupied tables for one window. Together they cover `1..=total`.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct TableAvailability {
    pub available: Vec<u32>,
    pub occupied: Vec<u32>,
    pub total: u32,
}

impl TableAvailability {
    pub fn lowest_free(&self) -> Option<u32> {
        self.available.first().copied()
    }

    pub fn is_free(&self, table_number: u32) -> bool {
        self.available.binary_search(&table_number).is_ok()
    }
}

/// Partitions `1..=total` by whether any active booking in `bookings`
/// overlaps `window`. Bookings on tables outside the range are ignored.
pub fn resolve(bookings: &[Booking], window: &TimeWindow, total: u32) -> TableAvailability {
    let occupied: BTreeSet<u32> = bookings
        .iter()
        .filter(|b| (1..=total).contains(&b.table_number) && b.blocks(window))
        .map(|b| b.table_number)
        .collect();
    let available = (1..=total).filter(|t| !occupied.contains(t)).collect();
    TableAvailability {
        available,
        occupied: occupied.into_iter().collect(),
        total,
    }
}

/// Read-only availability queries over the booking store.
pub struct AvailabilityResolver {
    bookings: BookingStoreRef,
    table_count: u32,
}

impl AvailabilityResolver {
    /// Creates a new `AvailabilityResolver`.
    ///
    /// # Arguments
    ///
    /// * `bookings` - The booking store snapshots are read from.
    /// * `table_count` - Size of the floor; results cover `1..=table_count`.
    pub fn new(bookings: BookingStoreRef, table_count: u32) -> Self {
        Self {
            bookings,
            table_count,
        }
    }

    /// Free tables for `[at, at + duration_minutes)`, judged against the
    /// bookings that start on the same calendar day as `at`.
    pub async fn available_tables(
        &self,
        at: NaiveDateTime,
        duration_minutes: u32,
    ) -> Result<TableAvailability> {
        if duration_minutes == 0 {
            return Err(ServiceError::InvalidInput(
                "duration must be at least one minute".to_string(),
            ));
        }
        let window = TimeWindow::starting_at(at, duration_minutes).ok_or_else(|| {
            ServiceError::InvalidInput("requested window is out of range".to_string())
        })?;
        let (day_start, day_end) = day_bounds(at);
        let snapshot = self
            .bookings
            .list(BookingFilter::between(day_start, day_end))
            .await?;
        let availability = resolve(&snapshot, &window, self.table_count);
        tracing::debug!(
            %at,
            duration_minutes,
            free = availability.available.len(),
            "resolved table availability"
        );
        Ok(availability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::BookingStatus;
    use crate::domain::interval::parse_timestamp;

    fn booking(table: u32, start: &str, minutes: u32, status: BookingStatus) -> Booking {
        let start = parse_timestamp(start).unwrap();
        Booking {
            booking_id: format!("BK-{table}"),
            table_number: table,
            party_size: 2,
            customer_name: "Guest".into(),
            customer_phone: "555-0100".into(),
            booking_time: start,
            duration_minutes: minutes,
            status,
            created_at: start,
        }
    }

    fn window(start: &str, minutes: u32) -> TimeWindow {
        TimeWindow::starting_at(parse_timestamp(start).unwrap(), minutes).unwrap()
    }

    #[test]
    fn test_overlapping_active_booking_occupies_table() {
        let bookings = vec![booking(3, "2026-03-01T19:00", 60, BookingStatus::Booked)];
        let result = resolve(&bookings, &window("2026-03-01T19:30", 30), 10);
        assert_eq!(result.occupied, vec![3]);
        assert_eq!(result.available, vec![1, 2, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(result.total, 10);
    }

    #[test]
    fn test_inactive_and_adjacent_bookings_do_not_occupy() {
        let bookings = vec![
            booking(1, "2026-03-01T19:00", 60, BookingStatus::Cancelled),
            booking(2, "2026-03-01T19:00", 60, BookingStatus::Completed),
            booking(3, "2026-03-01T18:00", 60, BookingStatus::Seated),
            booking(4, "2026-03-01T20:00", 60, BookingStatus::Booked),
        ];
        let result = resolve(&bookings, &window("2026-03-01T19:00", 60), 4);
        assert!(result.occupied.is_empty());
        assert_eq!(result.lowest_free(), Some(1));
    }

    #[test]
    fn test_tables_outside_configured_range_are_ignored() {
        let bookings = vec![booking(12, "2026-03-01T19:00", 60, BookingStatus::Booked)];
        let result = resolve(&bookings, &window("2026-03-01T19:00", 60), 10);
        assert!(result.occupied.is_empty());
        assert_eq!(result.available.len(), 10);
    }

    #[test]
    fn test_full_house_has_no_free_table() {
        let bookings: Vec<Booking> = (1..=3)
            .map(|t| booking(t, "2026-03-01T19:00", 120, BookingStatus::Booked))
            .collect();
        let result = resolve(&bookings, &window("2026-03-01T20:00", 30), 3);
        assert_eq!(result.lowest_free(), None);
        assert!(!result.is_free(2));
    }
}
