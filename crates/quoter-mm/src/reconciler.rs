//! Desired-versus-live reconciliation.
//!
//! Each slot is compared with its desired entry independently and gets at
//! most one action per cycle. Actions the handle reports as not sent are
//! dropped silently; the next cycle re-evaluates from scratch.

use quoter_core::{IntentSequence, OrderSide, Price, Qty, RiskStatus};
use quoter_telemetry::Metrics;
use tracing::{debug, warn};

use crate::handle::{HandleState, OrderHandle};
use crate::planner::{DesiredOrder, DesiredTable};
use crate::slot::SlotPool;

/// Action chosen for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    None,
    New { price: Price, qty: Qty },
    Replace { price: Price, qty: Qty },
    Cancel,
}

impl SlotAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::New { .. } => "new",
            Self::Replace { .. } => "replace",
            Self::Cancel => "cancel",
        }
    }
}

/// Decide the action for one slot.
pub fn decide(desired: DesiredOrder, live: &HandleState, min_price_diff: u64) -> SlotAction {
    let wanted = desired.is_wanted();
    let resting = live.last_quantity.is_positive();

    if wanted && live.is_reset() {
        return SlotAction::New {
            price: desired.price,
            qty: desired.quantity,
        };
    }
    if wanted && resting {
        let price_moved = live.last_quoted_price != desired.price
            && live.last_quoted_price.abs_diff(desired.price) >= min_price_diff;
        let qty_changed = live.last_quantity != desired.quantity;
        if price_moved || qty_changed {
            return SlotAction::Replace {
                price: desired.price,
                qty: desired.quantity,
            };
        }
        return SlotAction::None;
    }
    if !wanted && resting {
        return SlotAction::Cancel;
    }
    // Not wanted and reset, or wanted while the slot waits for its
    // terminal confirmation.
    SlotAction::None
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Actions the handles reported as sent.
    pub sent: u32,
    /// Actions the handles refused.
    pub not_sent: u32,
}

/// Applies desired-vs-live decisions to the slot pool.
#[derive(Debug)]
pub struct OrderReconciler {
    min_price_diff: u64,
    msg_sent_count: u64,
    intents: IntentSequence,
}

impl OrderReconciler {
    pub fn new(min_price_diff: u64) -> Self {
        Self {
            min_price_diff,
            msg_sent_count: 0,
            intents: IntentSequence::new(),
        }
    }

    /// Total actions sent since construction.
    pub fn msg_sent_count(&self) -> u64 {
        self.msg_sent_count
    }

    pub fn reconcile<H: OrderHandle>(
        &mut self,
        desired: &DesiredTable,
        pool: &mut SlotPool<H>,
        risk: &mut RiskStatus,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for side in OrderSide::ALL {
            for slot in pool.side_mut(side).iter_mut() {
                let id = slot.id();
                let target = desired.get(side, id.index);
                let action = decide(target, slot.live(), self.min_price_diff);

                risk.clear();
                let sent = match action {
                    SlotAction::None => continue,
                    SlotAction::New { price, qty } => {
                        let intent = self.intents.next_id();
                        slot.send_new(risk, intent, price, qty)
                    }
                    SlotAction::Replace { price, qty } => slot.send_replace(risk, price, qty),
                    SlotAction::Cancel => slot.send_cancel(risk),
                };

                if sent {
                    self.msg_sent_count += 1;
                    summary.sent += 1;
                    Metrics::order_action_sent(action.label(), side.as_str());
                    debug!(
                        slot = %id,
                        action = action.label(),
                        price = %target.price,
                        qty = %target.quantity,
                        intent = ?slot.intent(),
                        in_flight = slot.live().status.is_in_flight(),
                        "Order action sent"
                    );
                } else {
                    summary.not_sent += 1;
                    Metrics::order_action_not_sent(action.label(), side.as_str());
                    if risk.is_clear() {
                        debug!(slot = %id, action = action.label(), "Order action not sent");
                    } else {
                        warn!(
                            slot = %id,
                            action = action.label(),
                            risk = %risk,
                            "Order action rejected by risk check"
                        );
                    }
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{HandleCall, MockOrderHandle, MockScript};
    use quoter_core::{OrderIntentId, OrderStatus};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn live(price: i64, qty: i64) -> HandleState {
        HandleState {
            status: OrderStatus::Live,
            last_quoted_price: Price::new(price),
            last_quantity: Qty::new(qty),
            ..HandleState::default()
        }
    }

    fn want(price: i64, qty: i64) -> DesiredOrder {
        DesiredOrder::new(Price::new(price), Qty::new(qty))
    }

    fn setup() -> (Rc<RefCell<MockScript>>, SlotPool<MockOrderHandle>) {
        let script = MockScript::shared();
        let handles = script.clone();
        let pool = SlotPool::new(2, move |id| {
            MockOrderHandle::with_script(id.side, handles.clone())
        });
        (script, pool)
    }

    #[test]
    fn test_decide_new_on_reset_slot() {
        let action = decide(want(99, 100), &HandleState::default(), 1);
        assert_eq!(
            action,
            SlotAction::New {
                price: Price::new(99),
                qty: Qty::new(100)
            }
        );
    }

    #[test]
    fn test_decide_small_price_move_ignored() {
        assert_eq!(decide(want(101, 100), &live(99, 100), 3), SlotAction::None);
        assert_eq!(
            decide(want(102, 100), &live(99, 100), 3),
            SlotAction::Replace {
                price: Price::new(102),
                qty: Qty::new(100)
            }
        );
    }

    #[test]
    fn test_decide_qty_change_always_replaces() {
        let action = decide(want(99, 60), &live(99, 100), 1_000);
        assert_eq!(action.label(), "replace");
    }

    #[test]
    fn test_decide_cancel_when_unwanted() {
        assert_eq!(decide(DesiredOrder::NONE, &live(99, 100), 1), SlotAction::Cancel);
        assert_eq!(
            decide(DesiredOrder::NONE, &HandleState::default(), 1),
            SlotAction::None
        );
    }

    #[test]
    fn test_decide_waits_for_terminal_confirmation() {
        // Filled to zero but not yet reset.
        let state = live(99, 0);
        assert_eq!(decide(want(99, 100), &state, 1), SlotAction::None);
    }

    #[test]
    fn test_zero_min_price_diff_replaces_any_move() {
        assert_eq!(decide(want(100, 100), &live(99, 100), 0).label(), "replace");
        assert_eq!(decide(want(99, 100), &live(99, 100), 0), SlotAction::None);
    }

    #[test]
    fn test_reconcile_twice_is_idempotent() {
        let (script, mut pool) = setup();
        let mut table = DesiredTable::new(2);
        table.set(OrderSide::Buy, 0, want(99, 100));
        table.set(OrderSide::Sell, 0, want(101, 100));

        let mut reconciler = OrderReconciler::new(1);
        let mut risk = RiskStatus::default();
        let first = reconciler.reconcile(&table, &mut pool, &mut risk);
        assert_eq!(first.sent, 2);

        let second = reconciler.reconcile(&table, &mut pool, &mut risk);
        assert_eq!(second, ReconcileSummary::default());
        assert_eq!(reconciler.msg_sent_count(), 2);
        assert_eq!(script.borrow().calls().len(), 2);
    }

    #[test]
    fn test_reconcile_assigns_fresh_intents() {
        let (script, mut pool) = setup();
        let mut table = DesiredTable::new(2);
        table.set(OrderSide::Buy, 0, want(99, 100));
        table.set(OrderSide::Sell, 1, want(101, 40));

        let mut reconciler = OrderReconciler::new(1);
        reconciler.reconcile(&table, &mut pool, &mut RiskStatus::default());

        let calls = script.borrow_mut().drain();
        assert_eq!(
            calls,
            vec![
                HandleCall::New {
                    side: OrderSide::Buy,
                    intent: OrderIntentId::new(1),
                    price: Price::new(99),
                    qty: Qty::new(100)
                },
                HandleCall::New {
                    side: OrderSide::Sell,
                    intent: OrderIntentId::new(2),
                    price: Price::new(101),
                    qty: Qty::new(40)
                },
            ]
        );
        assert_eq!(
            pool.slot(OrderSide::Sell, 1).unwrap().intent(),
            Some(OrderIntentId::new(2))
        );
    }

    #[test]
    fn test_not_sent_does_not_count() {
        let (script, mut pool) = setup();
        script.borrow_mut().send = false;
        let mut table = DesiredTable::new(2);
        table.set(OrderSide::Buy, 0, want(99, 100));

        let mut reconciler = OrderReconciler::new(1);
        let summary = reconciler.reconcile(&table, &mut pool, &mut RiskStatus::default());
        assert_eq!(summary.sent, 0);
        assert_eq!(summary.not_sent, 1);
        assert_eq!(reconciler.msg_sent_count(), 0);
        assert!(pool.slot(OrderSide::Buy, 0).unwrap().is_reset());

        // Next pass retries.
        script.borrow_mut().send = true;
        let summary = reconciler.reconcile(&table, &mut pool, &mut RiskStatus::default());
        assert_eq!(summary.sent, 1);
    }

    #[test]
    fn test_risk_reject_reported() {
        let (script, mut pool) = setup();
        script.borrow_mut().risk_reject = Some("max order value".to_string());
        let mut table = DesiredTable::new(2);
        table.set(OrderSide::Sell, 0, want(101, 100));

        let mut risk = RiskStatus::default();
        let summary = OrderReconciler::new(1).reconcile(&table, &mut pool, &mut risk);
        assert_eq!(summary.not_sent, 1);
        assert_eq!(risk.to_string(), "rejected: max order value");
    }

    #[test]
    fn test_cancel_when_desired_cleared() {
        let (script, mut pool) = setup();
        let mut table = DesiredTable::new(2);
        table.set(OrderSide::Buy, 0, want(99, 100));
        let mut reconciler = OrderReconciler::new(1);
        let mut risk = RiskStatus::default();
        reconciler.reconcile(&table, &mut pool, &mut risk);

        table.reset();
        let summary = reconciler.reconcile(&table, &mut pool, &mut risk);
        assert_eq!(summary.sent, 1);
        assert_eq!(
            script.borrow().calls().last(),
            Some(&HandleCall::Cancel {
                side: OrderSide::Buy
            })
        );
        assert_eq!(
            pool.slot(OrderSide::Buy, 0).unwrap().live().status,
            OrderStatus::PendingCancel
        );
    }
}
