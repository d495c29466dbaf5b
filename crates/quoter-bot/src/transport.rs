//! Channel-backed order handle.
//!
//! Each slot gets a [`ChannelOrderHandle`]. Requests go out on an unbounded
//! channel to whatever venue drains it; confirmations come back through the
//! orchestrator's router.

use quoter_core::{
    ContractId, OrderConfirmation, OrderIntentId, OrderSide, Price, Qty, RiskStatus,
};
use quoter_mm::{HandleState, LocalOrderState, OrderHandle};
use tokio::sync::mpsc;
use tracing::trace;

/// Request sent to the venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRequest {
    New {
        intent: OrderIntentId,
        contract: ContractId,
        side: OrderSide,
        price: Price,
        qty: Qty,
    },
    Replace {
        intent: OrderIntentId,
        contract: ContractId,
        side: OrderSide,
        price: Price,
        qty: Qty,
    },
    Cancel {
        intent: OrderIntentId,
        contract: ContractId,
        side: OrderSide,
    },
}

impl OrderRequest {
    pub fn intent(&self) -> OrderIntentId {
        match self {
            Self::New { intent, .. } | Self::Replace { intent, .. } | Self::Cancel { intent, .. } => {
                *intent
            }
        }
    }
}

/// Pre-trade limits checked before a request leaves the handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreTradeCheck {
    pub max_order_qty: Option<Qty>,
}

impl PreTradeCheck {
    fn check(&self, qty: Qty, risk: &mut RiskStatus) -> bool {
        match self.max_order_qty {
            Some(max) if qty > max => {
                risk.reject(format!("order qty {qty} exceeds limit {max}"));
                false
            }
            _ => {
                risk.clear();
                true
            }
        }
    }
}

/// Order handle forwarding requests over an mpsc channel.
#[derive(Debug)]
pub struct ChannelOrderHandle {
    contract: ContractId,
    side: OrderSide,
    order: LocalOrderState,
    limits: PreTradeCheck,
    tx: mpsc::UnboundedSender<OrderRequest>,
}

impl ChannelOrderHandle {
    pub fn new(
        contract: ContractId,
        side: OrderSide,
        limits: PreTradeCheck,
        tx: mpsc::UnboundedSender<OrderRequest>,
    ) -> Self {
        Self {
            contract,
            side,
            order: LocalOrderState::new(),
            limits,
            tx,
        }
    }

    /// Returns false when the venue side of the channel is gone.
    fn send(&self, request: OrderRequest) -> bool {
        trace!(?request, "Sending order request");
        self.tx.send(request).is_ok()
    }
}

impl OrderHandle for ChannelOrderHandle {
    fn side(&self) -> OrderSide {
        self.side
    }

    fn reset(&mut self) {
        self.order.reset();
    }

    fn new_order(
        &mut self,
        risk: &mut RiskStatus,
        intent: OrderIntentId,
        price: Price,
        qty: Qty,
    ) -> bool {
        if !self.order.can_new(qty) || !self.limits.check(qty, risk) {
            return false;
        }
        let request = OrderRequest::New {
            intent,
            contract: self.contract,
            side: self.side,
            price,
            qty,
        };
        self.send(request) && self.order.begin_new(intent, price, qty)
    }

    fn replace_order(&mut self, risk: &mut RiskStatus, price: Price, qty: Qty) -> bool {
        let Some(intent) = self.order.intent() else {
            return false;
        };
        if !self.order.can_replace(qty) || !self.limits.check(qty, risk) {
            return false;
        }
        let request = OrderRequest::Replace {
            intent,
            contract: self.contract,
            side: self.side,
            price,
            qty,
        };
        self.send(request) && self.order.begin_replace(price, qty)
    }

    fn cancel_order(&mut self, risk: &mut RiskStatus) -> bool {
        let Some(intent) = self.order.intent() else {
            return false;
        };
        if !self.order.can_cancel() {
            return false;
        }
        risk.clear();
        let request = OrderRequest::Cancel {
            intent,
            contract: self.contract,
            side: self.side,
        };
        self.send(request) && self.order.begin_cancel()
    }

    fn apply_confirmation(&mut self, confirmation: &OrderConfirmation) -> bool {
        self.order.apply(confirmation)
    }

    fn state(&self) -> &HandleState {
        self.order.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quoter_core::OrderStatus;

    fn handle(limits: PreTradeCheck) -> (ChannelOrderHandle, mpsc::UnboundedReceiver<OrderRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ChannelOrderHandle::new(ContractId::new(1), OrderSide::Buy, limits, tx),
            rx,
        )
    }

    #[test]
    fn test_new_order_forwards_request() {
        let (mut handle, mut rx) = handle(PreTradeCheck::default());
        let mut risk = RiskStatus::default();
        let intent = OrderIntentId::new(5);

        assert!(handle.new_order(&mut risk, intent, Price::new(99), Qty::new(10)));
        assert_eq!(handle.state().status, OrderStatus::PendingNew);
        assert_eq!(
            rx.try_recv().unwrap(),
            OrderRequest::New {
                intent,
                contract: ContractId::new(1),
                side: OrderSide::Buy,
                price: Price::new(99),
                qty: Qty::new(10),
            }
        );
    }

    #[test]
    fn test_replace_and_cancel_carry_intent() {
        let (mut handle, mut rx) = handle(PreTradeCheck::default());
        let mut risk = RiskStatus::default();
        let intent = OrderIntentId::new(5);
        handle.new_order(&mut risk, intent, Price::new(99), Qty::new(10));
        assert!(handle.replace_order(&mut risk, Price::new(98), Qty::new(10)));
        assert!(handle.cancel_order(&mut risk));

        let intents: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|r| r.intent())
            .collect();
        assert_eq!(intents, vec![intent; 3]);
    }

    #[test]
    fn test_replace_without_order_not_sent() {
        let (mut handle, mut rx) = handle(PreTradeCheck::default());
        let mut risk = RiskStatus::default();
        assert!(!handle.replace_order(&mut risk, Price::new(98), Qty::new(10)));
        assert!(!handle.cancel_order(&mut risk));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_limit_rejects_large_order() {
        let limits = PreTradeCheck {
            max_order_qty: Some(Qty::new(50)),
        };
        let (mut handle, mut rx) = handle(limits);
        let mut risk = RiskStatus::default();

        assert!(!handle.new_order(&mut risk, OrderIntentId::new(1), Price::new(99), Qty::new(51)));
        assert!(!risk.is_clear());
        assert!(handle.is_reset());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_is_not_sent() {
        let (mut handle, rx) = handle(PreTradeCheck::default());
        drop(rx);
        let mut risk = RiskStatus::default();
        assert!(!handle.new_order(&mut risk, OrderIntentId::new(1), Price::new(99), Qty::new(1)));
        assert!(handle.is_reset());
    }
}
