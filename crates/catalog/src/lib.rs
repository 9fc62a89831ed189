//! `souk-catalog` — the catalog service core.
//!
//! Owns product records. Other services reference products by id only; a
//! reference held elsewhere (e.g. an order line) carries no integrity
//! guarantee and may stop resolving at any time.

pub mod product;
pub mod service;
pub mod store;

pub use product::{NewProduct, Product, ProductFilter, ProductUpdate};
pub use service::{CatalogError, CatalogService};
pub use store::{InMemoryProductStore, ProductStore, ProductStoreError};
