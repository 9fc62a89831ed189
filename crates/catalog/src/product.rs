//! Product records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_core::ProductId;

/// A product owned by the catalog service.
///
/// Price is in minor currency units (e.g. cents), non-negative by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub quantity: u32,
    pub category: String,
    /// Unique within the store.
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub quantity: u32,
    pub category: String,
    pub sku: String,
}

/// Partial update; `None` fields are left unchanged. The sku is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub quantity: Option<u32>,
    pub category: Option<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.category.is_none()
    }
}

/// Listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

impl ProductFilter {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}
