//! Catalog operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use souk_core::ProductId;

use crate::product::{NewProduct, Product, ProductFilter, ProductUpdate};
use crate::store::{ProductStore, ProductStoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product not found")]
    NotFound,

    #[error("product with this sku already exists")]
    DuplicateSku,

    #[error("insufficient inventory: available {available}, requested {requested}")]
    InsufficientInventory { available: u32, requested: u32 },

    #[error("validation failed: {0}")]
    Validation(String),
}

impl From<ProductStoreError> for CatalogError {
    fn from(e: ProductStoreError) -> Self {
        match e {
            ProductStoreError::DuplicateSku => CatalogError::DuplicateSku,
            ProductStoreError::NotFound => CatalogError::NotFound,
            ProductStoreError::InsufficientInventory {
                available,
                requested,
            } => CatalogError::InsufficientInventory {
                available,
                requested,
            },
            ProductStoreError::QuantityOverflow => {
                CatalogError::Validation("inventory overflow".into())
            }
        }
    }
}

pub struct CatalogService {
    store: Arc<dyn ProductStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, new: NewProduct, now: DateTime<Utc>) -> Result<Product, CatalogError> {
        if new.name.trim().is_empty() {
            return Err(CatalogError::Validation("name must not be empty".into()));
        }
        if new.sku.trim().is_empty() {
            return Err(CatalogError::Validation("sku must not be empty".into()));
        }

        let product = Product {
            id: ProductId::new(),
            name: new.name,
            description: new.description,
            price: new.price,
            quantity: new.quantity,
            category: new.category,
            sku: new.sku,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(product.clone())?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    pub fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store.get(id).ok_or(CatalogError::NotFound)
    }

    pub fn list(&self, filter: &ProductFilter) -> Vec<Product> {
        let limit = filter.limit.unwrap_or(ProductFilter::DEFAULT_LIMIT);
        self.store
            .list()
            .into_iter()
            .filter(|p| filter.matches(p))
            .skip(filter.offset)
            .take(limit)
            .collect()
    }

    pub fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
        now: DateTime<Utc>,
    ) -> Result<Product, CatalogError> {
        if update.is_empty() {
            return Err(CatalogError::Validation("no fields to update".into()));
        }

        let mut product = self.get(id)?;
        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(quantity) = update.quantity {
            product.quantity = quantity;
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        product.updated_at = now;

        self.store.replace(product.clone())?;
        Ok(product)
    }

    pub fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        self.store.remove(id)?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Adjust stock by `delta` (negative to reserve, positive to restore).
    ///
    /// Delegates to the store's atomic read-modify-write so concurrent
    /// reservations cannot both spend the same units. Never drives quantity
    /// below zero; on refusal the record is unchanged.
    pub fn adjust_inventory(
        &self,
        id: ProductId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<u32, CatalogError> {
        let product = self.store.adjust_quantity(id, delta, now)?;
        Ok(product.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryProductStore;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(InMemoryProductStore::new()))
    }

    fn widget(sku: &str, price: u64, quantity: u32) -> NewProduct {
        NewProduct {
            name: format!("widget {sku}"),
            description: "a widget".into(),
            price,
            quantity,
            category: "widgets".into(),
            sku: sku.into(),
        }
    }

    #[test]
    fn duplicate_sku_is_rejected() {
        let svc = service();
        let now = Utc::now();
        svc.create(widget("W-1", 100, 5), now).unwrap();
        assert_eq!(
            svc.create(widget("W-1", 200, 1), now).unwrap_err(),
            CatalogError::DuplicateSku
        );
    }

    #[test]
    fn inventory_never_goes_negative() {
        let svc = service();
        let now = Utc::now();
        let product = svc.create(widget("W-1", 100, 3), now).unwrap();

        let err = svc.adjust_inventory(product.id, -4, now).unwrap_err();
        assert_eq!(
            err,
            CatalogError::InsufficientInventory {
                available: 3,
                requested: 4
            }
        );
        // Refusal leaves the record unchanged.
        assert_eq!(svc.get(product.id).unwrap().quantity, 3);

        assert_eq!(svc.adjust_inventory(product.id, -3, now).unwrap(), 0);
        assert_eq!(svc.adjust_inventory(product.id, 2, now).unwrap(), 2);
    }

    #[test]
    fn list_applies_filters_and_pagination() {
        let svc = service();
        let now = Utc::now();
        svc.create(widget("W-1", 100, 1), now).unwrap();
        svc.create(widget("W-2", 250, 1), now).unwrap();
        svc.create(widget("W-3", 400, 1), now).unwrap();

        let filter = ProductFilter {
            min_price: Some(200),
            ..Default::default()
        };
        let listed = svc.list(&filter);
        assert_eq!(listed.len(), 2);

        let filter = ProductFilter {
            min_price: Some(200),
            offset: 1,
            limit: Some(1),
            ..Default::default()
        };
        let listed = svc.list(&filter);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].price, 400);
    }

    #[test]
    fn update_is_partial_and_touches_updated_at() {
        let svc = service();
        let created_at = Utc::now();
        let product = svc.create(widget("W-1", 100, 5), created_at).unwrap();

        let later = created_at + chrono::Duration::seconds(10);
        let updated = svc
            .update(
                product.id,
                ProductUpdate {
                    price: Some(150),
                    ..Default::default()
                },
                later,
            )
            .unwrap();

        assert_eq!(updated.price, 150);
        assert_eq!(updated.name, product.name);
        assert_eq!(updated.updated_at, later);

        assert!(matches!(
            svc.update(product.id, ProductUpdate::default(), later),
            Err(CatalogError::Validation(_))
        ));
    }
}
