//! Product storage seam.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;

use souk_core::ProductId;

use crate::product::Product;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProductStoreError {
    #[error("product with this sku already exists")]
    DuplicateSku,

    #[error("product not found")]
    NotFound,

    #[error("insufficient inventory: available {available}, requested {requested}")]
    InsufficientInventory { available: u32, requested: u32 },

    #[error("inventory overflow")]
    QuantityOverflow,
}

/// Storage boundary for products.
pub trait ProductStore: Send + Sync {
    fn insert(&self, product: Product) -> Result<(), ProductStoreError>;
    fn get(&self, id: ProductId) -> Option<Product>;
    fn list(&self) -> Vec<Product>;
    /// Replace an existing record (keyed by `product.id`).
    fn replace(&self, product: Product) -> Result<(), ProductStoreError>;
    fn remove(&self, id: ProductId) -> Result<(), ProductStoreError>;

    /// Adjust stock by `delta` in one atomic read-modify-write, so two
    /// concurrent reservations can never both spend the same units.
    /// Never drives quantity below zero; on refusal the record is unchanged.
    fn adjust_quantity(
        &self,
        id: ProductId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Product, ProductStoreError>;
}

/// Mutex-protected map, suitable for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryProductStore {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductStore for InMemoryProductStore {
    fn insert(&self, product: Product) -> Result<(), ProductStoreError> {
        let mut products = self.products.lock().unwrap();
        if products.values().any(|p| p.sku == product.sku) {
            return Err(ProductStoreError::DuplicateSku);
        }
        products.insert(product.id, product);
        Ok(())
    }

    fn get(&self, id: ProductId) -> Option<Product> {
        self.products.lock().unwrap().get(&id).cloned()
    }

    fn list(&self) -> Vec<Product> {
        let mut all: Vec<Product> = self.products.lock().unwrap().values().cloned().collect();
        // Deterministic listing order (id is time-ordered).
        all.sort_by_key(|p| *p.id.as_uuid());
        all
    }

    fn replace(&self, product: Product) -> Result<(), ProductStoreError> {
        let mut products = self.products.lock().unwrap();
        match products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product;
                Ok(())
            }
            None => Err(ProductStoreError::NotFound),
        }
    }

    fn remove(&self, id: ProductId) -> Result<(), ProductStoreError> {
        self.products
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(ProductStoreError::NotFound)
    }

    fn adjust_quantity(
        &self,
        id: ProductId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Product, ProductStoreError> {
        let mut products = self.products.lock().unwrap();
        let product = products.get_mut(&id).ok_or(ProductStoreError::NotFound)?;

        let next = i64::from(product.quantity) + delta;
        if next < 0 {
            return Err(ProductStoreError::InsufficientInventory {
                available: product.quantity,
                requested: delta.unsigned_abs().min(u64::from(u32::MAX)) as u32,
            });
        }
        let next = u32::try_from(next).map_err(|_| ProductStoreError::QuantityOverflow)?;

        product.quantity = next;
        product.updated_at = now;
        Ok(product.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn widget() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: "widget".into(),
            description: "a widget".into(),
            price: 100,
            quantity: 10,
            category: "widgets".into(),
            sku: "W-1".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn adjust_refuses_below_zero_and_leaves_record_unchanged() {
        let store = InMemoryProductStore::new();
        let product = widget();
        let id = product.id;
        store.insert(product).unwrap();

        let err = store.adjust_quantity(id, -11, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            ProductStoreError::InsufficientInventory {
                available: 10,
                requested: 11
            }
        );
        assert_eq!(store.get(id).unwrap().quantity, 10);
    }

    #[test]
    fn racing_reservations_never_oversell() {
        let store = Arc::new(InMemoryProductStore::new());
        let product = widget();
        let id = product.id;
        store.insert(product).unwrap();

        // 8 threads each try to reserve 2 units out of 10.
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.adjust_quantity(id, -2, Utc::now()).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|reserved| *reserved)
            .count();

        // Exactly 5 reservations fit; a lost update would let more through.
        assert_eq!(successes, 5);
        assert_eq!(store.get(id).unwrap().quantity, 0);
    }
}
