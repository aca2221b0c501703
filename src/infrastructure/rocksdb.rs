use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::order::{OrderPatch, OrderRecord};
use crate::domain::ports::{Allocation, BookingFilter, BookingStore, OrderFilter, OrderStore};
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use chrono::Local;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for bookings, keyed by booking id.
pub const CF_BOOKINGS: &str = "bookings";
/// Column Family for orders, keyed by order id.
pub const CF_ORDERS: &str = "orders";

/// A persistent store implementation using RocksDB.
///
/// Values are JSON. Every read-modify-write goes through `write_gate`, so a
/// booking allocation and its insert cannot interleave with another writer
/// in this process.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_gate: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_bookings = ColumnFamilyDescriptor::new(CF_BOOKINGS, Options::default());
        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_bookings, cf_orders])?;

        Ok(Self {
            db: Arc::new(db),
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf_name: &str, key: &str, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| ServiceError::store(format!("{name} column family not found")))
    }
}

#[async_trait]
impl BookingStore for RocksDBStore {
    async fn insert_with(&self, allocate: Allocation) -> Result<Booking> {
        let _gate = self.write_gate.lock().await;
        let existing: Vec<Booking> = self.scan(CF_BOOKINGS)?;
        let booking = allocate(&existing)?;
        if existing.iter().any(|b| b.booking_id == booking.booking_id) {
            return Err(ServiceError::store(format!(
                "duplicate booking id {}",
                booking.booking_id
            )));
        }
        self.write(CF_BOOKINGS, &booking.booking_id, &booking)?;
        Ok(booking)
    }

    async fn get(&self, booking_id: &str) -> Result<Option<Booking>> {
        self.read(CF_BOOKINGS, booking_id)
    }

    async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .scan::<Booking>(CF_BOOKINGS)?
            .into_iter()
            .filter(|b| filter.matches(b))
            .collect();
        bookings.sort_by(|a, b| {
            a.booking_time
                .cmp(&b.booking_time)
                .then_with(|| a.table_number.cmp(&b.table_number))
        });
        Ok(bookings)
    }

    async fn update_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>> {
        let _gate = self.write_gate.lock().await;
        let Some(mut booking) = self.read::<Booking>(CF_BOOKINGS, booking_id)? else {
            return Ok(None);
        };
        booking.status = status;
        self.write(CF_BOOKINGS, booking_id, &booking)?;
        Ok(Some(booking))
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn insert(&self, order: OrderRecord) -> Result<OrderRecord> {
        let _gate = self.write_gate.lock().await;
        if self.read::<OrderRecord>(CF_ORDERS, &order.order_id)?.is_some() {
            return Err(ServiceError::store(format!(
                "duplicate order id {}",
                order.order_id
            )));
        }
        self.write(CF_ORDERS, &order.order_id, &order)?;
        Ok(order)
    }

    async fn get(&self, order_id: &str) -> Result<Option<OrderRecord>> {
        self.read(CF_ORDERS, order_id)
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<OrderRecord>> {
        let mut orders: Vec<OrderRecord> = self
            .scan::<OrderRecord>(CF_ORDERS)?
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_id.cmp(&a.order_id))
        });
        Ok(orders)
    }

    async fn update(&self, order_id: &str, patch: OrderPatch) -> Result<Option<OrderRecord>> {
        let _gate = self.write_gate.lock().await;
        let Some(mut order) = self.read::<OrderRecord>(CF_ORDERS, order_id)? else {
            return Ok(None);
        };
        patch.apply(&mut order, Local::now().naive_local());
        self.write(CF_ORDERS, order_id, &order)?;
        Ok(Some(order))
    }
}
