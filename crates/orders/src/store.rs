//! Order storage seam with optimistic concurrency.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use souk_core::{OrderId, SubjectId};

use crate::order::Order;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderStoreError {
    #[error("order not found")]
    NotFound,

    /// The order changed since it was read; the caller must re-read before
    /// retrying.
    #[error("order was modified concurrently")]
    Conflict,
}

/// Storage boundary for orders.
///
/// `commit_status` is the compare-and-swap primitive: a status change read
/// from version `v` only lands if the stored order is still at version `v`,
/// so two transitions from the same stale read cannot both apply.
pub trait OrderStore: Send + Sync {
    fn insert(&self, order: Order);
    fn get(&self, id: OrderId) -> Option<Order>;
    fn list_by_owner(&self, owner: &SubjectId) -> Vec<Order>;

    /// Commit `updated` if the stored order is still at `expected_version`.
    /// On success the stored version becomes `expected_version + 1` and the
    /// committed order is returned.
    fn commit_status(
        &self,
        id: OrderId,
        expected_version: u64,
        updated: Order,
    ) -> Result<Order, OrderStoreError>;
}

/// Mutex-protected map, suitable for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.lock().unwrap().get(&id).cloned()
    }

    fn list_by_owner(&self, owner: &SubjectId) -> Vec<Order> {
        let mut owned: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| &o.owner == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|o| *o.id.as_uuid());
        owned
    }

    fn commit_status(
        &self,
        id: OrderId,
        expected_version: u64,
        mut updated: Order,
    ) -> Result<Order, OrderStoreError> {
        let mut orders = self.orders.lock().unwrap();
        let stored = orders.get_mut(&id).ok_or(OrderStoreError::NotFound)?;
        if stored.version != expected_version {
            return Err(OrderStoreError::Conflict);
        }
        updated.version = expected_version + 1;
        *stored = updated.clone();
        Ok(updated)
    }
}
