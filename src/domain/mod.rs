//! Domain model: records, value types, and the ports the application layer
//! talks to. Nothing here performs I/O.

pub mod booking;
pub mod event;
pub mod interval;
pub mod order;
pub mod payment;
pub mod ports;
