//! `souk-core` — shared domain primitives.
//!
//! Typed identifiers and the domain error model used across all souk
//! services. This crate is pure: no IO, no clocks, no transport concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{OrderId, ProductId, SubjectId, UserId};
