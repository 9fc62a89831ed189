//! Order statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::order::Order;
use crate::status::OrderStatus;

/// Aggregate view over a collection of orders.
///
/// Cancelled orders count toward `total_orders` and the per-status
/// breakdown, but contribute nothing to `total_revenue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub total_orders: usize,
    /// Every status is present, zero when absent from the input.
    pub status_counts: BTreeMap<OrderStatus, usize>,
    /// Revenue over non-cancelled orders, minor currency units.
    pub total_revenue: u64,
}

impl OrderSummary {
    pub fn empty() -> Self {
        Self {
            total_orders: 0,
            status_counts: OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
            total_revenue: 0,
        }
    }
}

impl Default for OrderSummary {
    fn default() -> Self {
        Self::empty()
    }
}

/// Pure fold over a collection of orders; never mutates its input.
///
/// An empty collection yields all-zero counts, not an error.
pub fn summarize<'a, I>(orders: I) -> OrderSummary
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut summary = OrderSummary::empty();
    for order in orders {
        summary.total_orders += 1;
        *summary.status_counts.entry(order.status).or_insert(0) += 1;
        if order.status != OrderStatus::Cancelled {
            summary.total_revenue = summary.total_revenue.saturating_add(order.total);
        }
    }
    summary
}
