#![cfg(feature = "storage-rocksdb")]

mod common;

use common::{RecordingPublisher, ScriptedGateway, booking_at, fast_retry};
use dinein::application::Services;
use dinein::config::Config;
use dinein::error::ServiceError;
use dinein::infrastructure::rocksdb::RocksDBStore;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn services_on(path: &Path) -> Services {
    let store = RocksDBStore::open(path).unwrap();
    let config = Config {
        table_count: 1,
        retry: fast_retry(),
        ..Config::default()
    };
    Services::new(
        &config,
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(ScriptedGateway::new()),
        Arc::new(RecordingPublisher::default()),
    )
}

#[tokio::test]
async fn test_rocksdb_bookings_survive_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let first_id = {
        let services = services_on(&db_path);
        services
            .bookings
            .create_booking(booking_at("2026-03-01T19:00", 60, None))
            .await
            .unwrap()
            .booking_id
    };

    let services = services_on(&db_path);
    let recovered = services.bookings.get_booking(&first_id).await.unwrap();
    assert_eq!(recovered.table_number, 1);

    // The recovered booking still holds the only table.
    let clash = services
        .bookings
        .create_booking(booking_at("2026-03-01T19:30", 60, None))
        .await;
    assert!(matches!(clash, Err(ServiceError::NoTableAvailable)));
}
