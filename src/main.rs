use clap::Parser;
use dinein::application::Services;
use dinein::config::{Cli, Config};
use dinein::domain::ports::{BookingStoreRef, EventPublisherRef, OrderStoreRef, PaymentGatewayRef};
use dinein::infrastructure::broadcast::SubscriptionRegistry;
use dinein::infrastructure::cashfree::CashfreeGateway;
use dinein::infrastructure::in_memory::{InMemoryBookingStore, InMemoryOrderStore};
use dinein::interfaces::http::{AppState, router};
use dinein::logging::init_logging;
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let config = cli.into_config()?;

    let (booking_store, order_store) = open_stores(&config)?;
    let registry = Arc::new(SubscriptionRegistry::with_capacity(config.channel_capacity));
    let gateway: PaymentGatewayRef = Arc::new(CashfreeGateway::new(config.gateway.clone()));
    let events: EventPublisherRef = registry.clone();
    let services = Services::new(&config, booking_store, order_store, gateway, events);

    let app = router(AppState {
        services,
        registry,
        default_duration_minutes: config.default_duration_minutes,
    });

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .into_diagnostic()?;
    tracing::info!(
        listen = %config.listen,
        tables = config.table_count,
        gateway = config.gateway.endpoint(),
        "dine-in service ready"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;
    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(config: &Config) -> Result<(BookingStoreRef, OrderStoreRef)> {
    if let Some(db_path) = &config.db_path {
        let store = dinein::infrastructure::rocksdb::RocksDBStore::open(db_path)?;
        tracing::info!(path = %db_path.display(), "using RocksDB storage");
        return Ok((Arc::new(store.clone()), Arc::new(store)));
    }
    Ok(in_memory())
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(config: &Config) -> Result<(BookingStoreRef, OrderStoreRef)> {
    if config.db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory())
}

fn in_memory() -> (BookingStoreRef, OrderStoreRef) {
    (
        Arc::new(InMemoryBookingStore::new()),
        Arc::new(InMemoryOrderStore::new()),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
