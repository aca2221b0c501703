use crate::application::bookings::required_text;
use crate::domain::event::{DomainEvent, EventKind, Topic};
use crate::domain::order::{
    NewOrder, Order, OrderPatch, OrderRecord, OrderStatus, PaymentMethod, order_id,
};
use crate::domain::ports::{EventPublisherRef, OrderFilter, OrderStoreRef};
use crate::error::{Result, ServiceError};
use chrono::Local;
use rust_decimal::Decimal;

/// Kitchen-side order lifecycle. Payment status is owned by the reconciler.
pub struct OrderManager {
    store: OrderStoreRef,
    events: EventPublisherRef,
    table_count: u32,
}

impl OrderManager {
    /// Creates a new `OrderManager`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where orders are read and written.
    /// * `events` - Receives order events for the global, table and admin rooms.
    /// * `table_count` - Orders must name a table in `1..=table_count`.
    pub fn new(store: OrderStoreRef, events: EventPublisherRef, table_count: u32) -> Self {
        Self {
            store,
            events,
            table_count,
        }
    }

    /// Validates and stores a new order. Online orders start as
    /// `Awaiting Payment`, everything else as `Pending`.
    pub async fn create_order(&self, input: NewOrder) -> Result<Order> {
        let table_number = input
            .table_number
            .filter(|t| (1..=self.table_count).contains(t))
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "table_number must be between 1 and {}",
                    self.table_count
                ))
            })?;
        let customer_name = required_text(input.customer_name, "customer_name")?;
        if input.items.is_empty() {
            return Err(ServiceError::InvalidInput(
                "an order needs at least one item".to_string(),
            ));
        }
        if let Some(item) = input
            .items
            .iter()
            .find(|i| i.quantity == 0 || i.unit_price < Decimal::ZERO || i.name.trim().is_empty())
        {
            return Err(ServiceError::InvalidInput(format!(
                "item '{}' needs a name, a positive quantity and a non-negative price",
                item.name
            )));
        }
        let total_price = input
            .total_price
            .ok_or_else(|| ServiceError::InvalidInput("total_price is required".to_string()))?;
        let payment_method = input.payment_method.unwrap_or(PaymentMethod::Cash);

        let computed: Decimal = input.items.iter().map(|i| i.line_total()).sum();
        if computed != total_price {
            tracing::warn!(
                table = table_number,
                %total_price,
                %computed,
                "order total differs from item sum, keeping caller total"
            );
        }

        let now = Local::now().naive_local();
        let record = OrderRecord {
            order_id: order_id(now, table_number),
            table_number,
            customer_name,
            items: serde_json::to_string(&input.items)?,
            total_price,
            payment_method,
            status: payment_method.initial_status(),
            payment_status: None,
            created_at: now,
            updated_at: now,
        };
        let order = Order::from(self.store.insert(record).await?);
        tracing::info!(
            order_id = %order.order_id,
            table = order.table_number,
            status = %order.status,
            "order created"
        );
        self.broadcast(EventKind::OrderCreated, &order);
        Ok(order)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.list(OrderFilter::default()).await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        self.store
            .get(order_id)
            .await?
            .map(Order::from)
            .ok_or_else(|| ServiceError::not_found("order", order_id))
    }

    pub async fn list_by_table(&self, table_number: u32) -> Result<Vec<Order>> {
        self.list(OrderFilter {
            table_number: Some(table_number),
            status: None,
        })
        .await
    }

    pub async fn list_by_status(&self, status: &str) -> Result<Vec<Order>> {
        let status: OrderStatus = status.parse()?;
        self.list(OrderFilter {
            table_number: None,
            status: Some(status),
        })
        .await
    }

    /// Applies a staff status change. Only [`OrderStatus::ASSIGNABLE`] values
    /// are accepted; anything else leaves the order untouched.
    pub async fn update_status(&self, order_id: &str, new_status: &str) -> Result<Order> {
        let status = new_status
            .parse::<OrderStatus>()
            .ok()
            .filter(|s| s.is_assignable())
            .ok_or_else(|| ServiceError::InvalidStatus(new_status.to_string()))?;
        let order = self.write_status(order_id, status).await?;
        tracing::info!(order_id, status = %status, "order status updated");
        self.broadcast(EventKind::OrderUpdated, &order);
        Ok(order)
    }

    pub async fn cancel_order(&self, order_id: &str) -> Result<Order> {
        let order = self.write_status(order_id, OrderStatus::Cancelled).await?;
        tracing::info!(order_id, "order cancelled");
        self.broadcast(EventKind::OrderCancelled, &order);
        Ok(order)
    }

    async fn write_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        self.store
            .update(order_id, OrderPatch::status(status))
            .await?
            .map(Order::from)
            .ok_or_else(|| ServiceError::not_found("order", order_id))
    }

    async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let records = self.store.list(filter).await?;
        Ok(records.into_iter().map(Order::from).collect())
    }

    fn broadcast(&self, kind: EventKind, order: &Order) {
        let event = DomainEvent::order(kind, order.clone());
        self.events
            .publish_all(&Topic::for_order(order.table_number), &event);
    }
}
