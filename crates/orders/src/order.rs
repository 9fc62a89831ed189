//! The order record and its transition rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use souk_core::{OrderId, ProductId, SubjectId};

use crate::status::OrderStatus;

/// One line of an order.
///
/// `unit_price` and `product_name` are snapshots taken when the order was
/// created; later catalog changes do not flow back into existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Minor currency units, at time of order.
    pub unit_price: u64,
}

impl OrderLine {
    /// Saturates at `u64::MAX` rather than wrapping on pathological inputs.
    pub fn subtotal(&self) -> u64 {
        u64::from(self.quantity).saturating_mul(self.unit_price)
    }
}

/// An order, owned by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Subject the order belongs to (from a verified credential).
    pub owner: SubjectId,
    pub lines: Vec<OrderLine>,
    /// Computed once at creation; never recomputed from live catalog prices.
    pub total: u64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency guard, bumped by the store on each commit.
    pub version: u64,
}

impl Order {
    pub fn new(id: OrderId, owner: SubjectId, lines: Vec<OrderLine>, now: DateTime<Utc>) -> Self {
        let total = lines
            .iter()
            .map(OrderLine::subtotal)
            .fold(0u64, u64::saturating_add);
        Self {
            id,
            owner,
            lines,
            total,
            status: OrderStatus::Created,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

/// Authorization capability injected by the host.
///
/// Role systems are a peripheral concern; the state machine only needs to
/// know whether an actor holds elevated privilege.
pub trait TransitionPolicy: Send + Sync {
    fn is_elevated(&self, actor: &SubjectId) -> bool;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested edge is not in the legal-edge table.
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// The actor is not permitted to request this transition.
    #[error("forbidden")]
    Forbidden,
}

/// Compute the order as it would be after moving to `target`.
///
/// Pure: the input order is never mutated, and the result depends only on
/// the arguments. Rules, checked in order:
///
/// 1. `target == current` is a no-op success (tolerates at-least-once
///    delivery of retried requests) — the returned order is identical to
///    the input, including `updated_at`.
/// 2. The edge must be in the legal-edge table, else `IllegalTransition`.
/// 3. The owner may request `Cancelled` (the table already restricts that
///    to `Created`/`Paid`); every other transition requires an elevated
///    actor per the injected policy. Violation is `Forbidden`.
///
/// An accepted transition carries the new status and `updated_at = now`.
/// Committing the result against storage is the caller's job.
pub fn transition(
    order: &Order,
    target: OrderStatus,
    actor: &SubjectId,
    policy: &dyn TransitionPolicy,
    now: DateTime<Utc>,
) -> Result<Order, TransitionError> {
    if target == order.status {
        return Ok(order.clone());
    }

    if !order.status.can_transition(target) {
        return Err(TransitionError::IllegalTransition {
            from: order.status,
            to: target,
        });
    }

    let owner_cancel = target == OrderStatus::Cancelled && *actor == order.owner;
    if !owner_cancel && !policy.is_elevated(actor) {
        return Err(TransitionError::Forbidden);
    }

    let mut next = order.clone();
    next.status = target;
    next.updated_at = now;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) struct NoOneElevated;

    impl TransitionPolicy for NoOneElevated {
        fn is_elevated(&self, _actor: &SubjectId) -> bool {
            false
        }
    }

    pub(crate) struct Staff(pub SubjectId);

    impl TransitionPolicy for Staff {
        fn is_elevated(&self, actor: &SubjectId) -> bool {
            *actor == self.0
        }
    }

    fn subject(s: &str) -> SubjectId {
        SubjectId::parse(s).unwrap()
    }

    fn order_with_status(status: OrderStatus) -> Order {
        let line = OrderLine {
            product_id: ProductId::new(),
            product_name: "widget".into(),
            quantity: 2,
            unit_price: 150,
        };
        let mut order = Order::new(OrderId::new(), subject("u1"), vec![line], Utc::now());
        order.status = status;
        order
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        let lines = vec![
            OrderLine {
                product_id: ProductId::new(),
                product_name: "a".into(),
                quantity: 2,
                unit_price: 100,
            },
            OrderLine {
                product_id: ProductId::new(),
                product_name: "b".into(),
                quantity: 1,
                unit_price: 50,
            },
        ];
        let order = Order::new(OrderId::new(), subject("u1"), lines, Utc::now());
        assert_eq!(order.total, 250);
        assert_eq!(order.status, OrderStatus::Created);
    }

    #[test]
    fn pathological_amounts_saturate_instead_of_wrapping() {
        let line = OrderLine {
            product_id: ProductId::new(),
            product_name: "everything".into(),
            quantity: u32::MAX,
            unit_price: u64::MAX,
        };
        assert_eq!(line.subtotal(), u64::MAX);

        let lines = vec![line.clone(), line];
        let order = Order::new(OrderId::new(), subject("u1"), lines, Utc::now());
        assert_eq!(order.total, u64::MAX);
    }

    #[test]
    fn owner_cannot_skip_to_shipped() {
        let order = order_with_status(OrderStatus::Created);
        let err = transition(
            &order,
            OrderStatus::Shipped,
            &subject("u1"),
            &NoOneElevated,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::IllegalTransition {
                from: OrderStatus::Created,
                to: OrderStatus::Shipped
            }
        );
        assert_eq!(order.status, OrderStatus::Created);
    }

    #[test]
    fn owner_may_cancel_created_and_paid() {
        for from in [OrderStatus::Created, OrderStatus::Paid] {
            let order = order_with_status(from);
            let next = transition(
                &order,
                OrderStatus::Cancelled,
                &subject("u1"),
                &NoOneElevated,
                Utc::now(),
            )
            .unwrap();
            assert_eq!(next.status, OrderStatus::Cancelled);
        }
    }

    #[test]
    fn non_owner_cancel_requires_elevation() {
        let order = order_with_status(OrderStatus::Created);
        let err = transition(
            &order,
            OrderStatus::Cancelled,
            &subject("mallory"),
            &NoOneElevated,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::Forbidden);

        let staff = Staff(subject("ops"));
        let next = transition(
            &order,
            OrderStatus::Cancelled,
            &subject("ops"),
            &staff,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(next.status, OrderStatus::Cancelled);
    }

    #[test]
    fn forward_transitions_require_elevation_even_for_owner() {
        let order = order_with_status(OrderStatus::Created);
        let err = transition(
            &order,
            OrderStatus::Paid,
            &subject("u1"),
            &NoOneElevated,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::Forbidden);
    }

    #[test]
    fn same_status_is_a_no_op_success() {
        let order = order_with_status(OrderStatus::Paid);
        let next = transition(
            &order,
            OrderStatus::Paid,
            &subject("anyone"),
            &NoOneElevated,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(next, order);
    }

    #[test]
    fn accepted_transition_updates_only_status_and_updated_at() {
        let order = order_with_status(OrderStatus::Paid);
        let staff = Staff(subject("ops"));
        let later = order.updated_at + chrono::Duration::seconds(5);
        let next =
            transition(&order, OrderStatus::Shipped, &subject("ops"), &staff, later).unwrap();
        assert_eq!(next.status, OrderStatus::Shipped);
        assert_eq!(next.updated_at, later);
        assert_eq!(next.total, order.total);
        assert_eq!(next.lines, order.lines);
        assert_eq!(next.version, order.version);
    }

    fn any_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    proptest! {
        /// Transition outcomes agree with the edge table for every
        /// (from, target) pair, and a rejected transition leaves the order
        /// untouched.
        #[test]
        fn transition_agrees_with_edge_table(from in any_status(), target in any_status()) {
            let order = order_with_status(from);
            let before = order.clone();
            let staff = Staff(subject("ops"));

            let result = transition(&order, target, &subject("ops"), &staff, Utc::now());

            if target == from {
                prop_assert_eq!(result.unwrap(), before.clone());
            } else if from.can_transition(target) {
                prop_assert_eq!(result.unwrap().status, target);
            } else {
                prop_assert_eq!(
                    result.unwrap_err(),
                    TransitionError::IllegalTransition { from, to: target }
                );
            }
            // Input order is never mutated.
            prop_assert_eq!(order, before);
        }

        /// Without elevation, the only transition a non-owner can get past
        /// authorization is the idempotent no-op.
        #[test]
        fn unelevated_stranger_never_changes_state(from in any_status(), target in any_status()) {
            let order = order_with_status(from);
            let result = transition(&order, target, &subject("mallory"), &NoOneElevated, Utc::now());
            match result {
                Ok(next) => prop_assert_eq!(next.status, from),
                Err(_) => {}
            }
        }
    }
}
