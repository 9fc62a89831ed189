//! Order operations: creation, lookup, status updates, statistics.
//!
//! The catalog is a separate service reached through the [`CatalogClient`]
//! seam; there is no shared schema and no transaction spanning both stores.
//! Inventory movements around creation and cancellation are forward-only
//! compensations, not rollbacks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use souk_core::{OrderId, ProductId, SubjectId};

use crate::order::{transition, Order, OrderLine, TransitionError, TransitionPolicy};
use crate::status::OrderStatus;
use crate::store::{OrderStore, OrderStoreError};
use crate::summary::{summarize, OrderSummary};

/// What the order service needs to know about a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: u64,
    pub quantity: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogClientError {
    #[error("product not found")]
    NotFound,

    #[error("insufficient inventory")]
    InsufficientInventory,

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Cross-service seam to the catalog.
///
/// Calls go over the network in deployments; implementations must bound
/// their own timeouts.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn product(&self, id: ProductId) -> Result<ProductSnapshot, CatalogClientError>;

    /// Adjust stock by `delta` (negative reserves, positive restores).
    async fn adjust_inventory(&self, id: ProductId, delta: i64)
        -> Result<(), CatalogClientError>;
}

/// One requested line of a new order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderServiceError {
    #[error("order not found")]
    NotFound,

    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    #[error("insufficient inventory for product {0}")]
    InsufficientInventory(ProductId),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The order changed between read and commit; re-read and retry.
    #[error("order was modified concurrently")]
    Conflict,

    #[error("validation failed: {0}")]
    Validation(String),
}

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogClient>,
    policy: Arc<dyn TransitionPolicy>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogClient>,
        policy: Arc<dyn TransitionPolicy>,
    ) -> Self {
        Self {
            store,
            catalog,
            policy,
        }
    }

    /// Create an order for `owner`, snapshotting prices and reserving
    /// inventory line by line.
    ///
    /// Duplicate calls create distinct orders; idempotency keys are not part
    /// of this contract.
    pub async fn create_order(
        &self,
        owner: SubjectId,
        items: Vec<NewOrderItem>,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderServiceError> {
        if items.is_empty() {
            return Err(OrderServiceError::Validation(
                "order must contain at least one item".into(),
            ));
        }
        if items.iter().any(|i| i.quantity == 0) {
            return Err(OrderServiceError::Validation(
                "item quantity must be positive".into(),
            ));
        }

        // Resolve and price every line before touching any inventory.
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            let snapshot = self.catalog.product(item.product_id).await.map_err(|e| {
                match e {
                    CatalogClientError::NotFound => {
                        OrderServiceError::UnknownProduct(item.product_id)
                    }
                    other => OrderServiceError::CatalogUnavailable(other.to_string()),
                }
            })?;

            if snapshot.quantity < item.quantity {
                return Err(OrderServiceError::InsufficientInventory(item.product_id));
            }

            lines.push(OrderLine {
                product_id: snapshot.id,
                product_name: snapshot.name,
                quantity: item.quantity,
                unit_price: snapshot.price,
            });
        }

        // Reserve inventory. A mid-way failure undoes earlier reservations
        // (forward-only compensation; the two stores are not transactional).
        for (idx, line) in lines.iter().enumerate() {
            let reserve = self
                .catalog
                .adjust_inventory(line.product_id, -i64::from(line.quantity))
                .await;

            if let Err(e) = reserve {
                self.release_lines(&lines[..idx]).await;
                return Err(match e {
                    CatalogClientError::NotFound => {
                        OrderServiceError::UnknownProduct(line.product_id)
                    }
                    CatalogClientError::InsufficientInventory => {
                        OrderServiceError::InsufficientInventory(line.product_id)
                    }
                    CatalogClientError::Unavailable(msg) => {
                        OrderServiceError::CatalogUnavailable(msg)
                    }
                });
            }
        }

        let order = Order::new(OrderId::new(), owner, lines, now);
        self.store.insert(order.clone());
        tracing::info!(order_id = %order.id, total = order.total, "order created");
        Ok(order)
    }

    /// Fetch an order, scoped to its owner: someone else's order id behaves
    /// exactly like a missing one.
    pub fn get_order(&self, id: OrderId, owner: &SubjectId) -> Result<Order, OrderServiceError> {
        match self.store.get(id) {
            Some(order) if &order.owner == owner => Ok(order),
            _ => Err(OrderServiceError::NotFound),
        }
    }

    pub fn list_orders(&self, owner: &SubjectId) -> Vec<Order> {
        self.store.list_by_owner(owner)
    }

    /// Apply a status transition on behalf of `actor`.
    ///
    /// The read is re-validated at commit time via compare-and-swap: if the
    /// order moved since it was read, the caller gets `Conflict` and must
    /// re-read before retrying, so two racing transitions cannot both land.
    pub async fn update_status(
        &self,
        id: OrderId,
        target: OrderStatus,
        actor: &SubjectId,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderServiceError> {
        let current = self.store.get(id).ok_or(OrderServiceError::NotFound)?;

        let next = transition(&current, target, actor, self.policy.as_ref(), now)?;
        if next.status == current.status {
            // Idempotent re-request: nothing to commit.
            return Ok(current);
        }

        let was_cancellation = next.status == OrderStatus::Cancelled;
        let committed = self
            .store
            .commit_status(id, current.version, next)
            .map_err(|e| match e {
                OrderStoreError::NotFound => OrderServiceError::NotFound,
                OrderStoreError::Conflict => OrderServiceError::Conflict,
            })?;

        tracing::info!(order_id = %id, from = %current.status, to = %committed.status, "order transitioned");

        // The transition is committed; restoring stock is compensation and
        // must not undo it. Failures are logged and left to reconciliation.
        if was_cancellation {
            self.release_lines(&committed.lines).await;
        }

        Ok(committed)
    }

    /// Per-status counts and revenue for one owner's orders.
    pub fn stats_summary(&self, owner: &SubjectId) -> OrderSummary {
        let orders = self.store.list_by_owner(owner);
        summarize(&orders)
    }

    async fn release_lines(&self, lines: &[OrderLine]) {
        for line in lines {
            let restore = self
                .catalog
                .adjust_inventory(line.product_id, i64::from(line.quantity))
                .await;
            if let Err(e) = restore {
                // The product may legitimately no longer resolve; references
                // across services carry no integrity guarantee.
                tracing::warn!(
                    product_id = %line.product_id,
                    error = %e,
                    "failed to restore inventory for cancelled line"
                );
            }
        }
    }
}
