use crate::domain::booking::Booking;
use crate::domain::order::Order;
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named audience for real-time delivery.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Topic {
    Global,
    Admin,
    Table(u32),
}

impl Topic {
    /// Audiences for an order mutation: everyone, the ordering table, staff.
    pub fn for_order(table_number: u32) -> [Topic; 3] {
        [Topic::Global, Topic::Table(table_number), Topic::Admin]
    }

    /// Audiences for a booking mutation.
    pub const BOOKING: [Topic; 2] = [Topic::Global, Topic::Admin];
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Admin => f.write_str("admin"),
            Self::Table(n) => write!(f, "table:{n}"),
        }
    }
}

impl FromStr for Topic {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "global" => Ok(Self::Global),
            "admin" => Ok(Self::Admin),
            other => other
                .strip_prefix("table:")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .map(Self::Table)
                .ok_or_else(|| ServiceError::InvalidInput(format!("unknown room '{s}'"))),
        }
    }
}

impl Serialize for Topic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BookingCreated,
    BookingUpdated,
    BookingCancelled,
    OrderCreated,
    OrderUpdated,
    OrderCancelled,
    PaymentUpdated,
}

/// Full current record carried by every event; never a diff.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum EventData {
    Booking(Booking),
    Order(Order),
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct DomainEvent {
    pub event: EventKind,
    pub data: EventData,
}

impl DomainEvent {
    pub fn booking(event: EventKind, booking: Booking) -> Self {
        Self {
            event,
            data: EventData::Booking(booking),
        }
    }

    pub fn order(event: EventKind, order: Order) -> Self {
        Self {
            event,
            data: EventData::Order(order),
        }
    }
}

/// What a subscriber receives: the event and the room it arrived through.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct EventEnvelope {
    pub topic: Topic,
    #[serde(flatten)]
    pub event: DomainEvent,
}
