//! Order status lifecycle.

use serde::{Deserialize, Serialize};

/// Order status.
///
/// `Created → Paid → Shipped → Delivered`, with a side branch from
/// `Created`/`Paid` to `Cancelled`. `Delivered` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Created,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Created,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// No transition is permitted out of a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The fixed legal-edge table. Consulted before any mutation; an edge
    /// not listed here is illegal no matter who asks.
    pub fn can_transition(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Created, Paid)
                | (Paid, Shipped)
                | (Shipped, Delivered)
                | (Created, Cancelled)
                | (Paid, Cancelled)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}
