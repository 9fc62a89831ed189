//! `souk-orders` — the order service core.
//!
//! The order lifecycle is a fixed state machine whose legality and
//! authorization checks are pure functions; the only shared mutable
//! resource is the order store, and every status change goes through a
//! compare-and-swap commit so concurrent transitions from a stale read
//! cannot both apply.

pub mod order;
pub mod service;
pub mod status;
pub mod store;
pub mod summary;

pub use order::{transition, Order, OrderLine, TransitionError, TransitionPolicy};
pub use service::{
    CatalogClient, CatalogClientError, NewOrderItem, OrderService, OrderServiceError,
    ProductSnapshot,
};
pub use status::OrderStatus;
pub use store::{InMemoryOrderStore, OrderStore, OrderStoreError};
pub use summary::{summarize, OrderSummary};
