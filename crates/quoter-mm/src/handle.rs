//! Order handle contract.
//!
//! An [`OrderHandle`] sends new/replace/cancel requests for one order and
//! applies the exchange's confirmations to its own state. Slots own one
//! handle each and mirror its [`HandleState`] after every call.
//!
//! [`LocalOrderState`] is the state machine shared by handle
//! implementations:
//!
//! ```text
//! Reset -> PendingNew -> Live -> PendingReplace / PendingCancel -> Live / Reset
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use quoter_core::{
    ConfirmationKind, OrderConfirmation, OrderIntentId, OrderSide, OrderStatus, Price, Qty,
    RiskStatus,
};
use tracing::trace;

/// Readable view of one order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleState {
    pub status: OrderStatus,
    pub last_quoted_price: Price,
    /// Quantity still open at the exchange (optimistic while in flight).
    pub last_quantity: Qty,
    /// Cumulative filled quantity of the current order.
    pub last_filled_quantity: Qty,
    pub exchange_order_id: Option<u64>,
}

impl HandleState {
    /// No live order.
    #[inline]
    pub fn is_reset(&self) -> bool {
        self.status == OrderStatus::Reset
    }
}

/// Sends order requests for one side and tracks the resulting order.
///
/// Every `*_order` call returns whether the request was sent. A request
/// that was not sent leaves the state untouched. Pre-trade risk outcome is
/// written into `risk`.
pub trait OrderHandle {
    /// Side this handle trades.
    fn side(&self) -> OrderSide;

    /// Drop any association with a previous order.
    fn reset(&mut self);

    fn new_order(
        &mut self,
        risk: &mut RiskStatus,
        intent: OrderIntentId,
        price: Price,
        qty: Qty,
    ) -> bool;

    fn replace_order(&mut self, risk: &mut RiskStatus, price: Price, qty: Qty) -> bool;

    fn cancel_order(&mut self, risk: &mut RiskStatus) -> bool;

    /// Apply an exchange notification. Returns false if it does not
    /// belong to the current order.
    fn apply_confirmation(&mut self, confirmation: &OrderConfirmation) -> bool;

    fn state(&self) -> &HandleState;

    fn last_quantity(&self) -> Qty {
        self.state().last_quantity
    }

    fn is_reset(&self) -> bool {
        self.state().is_reset()
    }
}

// ============================================================================
// Local Order State
// ============================================================================

/// Order state machine for handle implementations.
///
/// `last_*` fields are updated optimistically when a request is sent; the
/// acknowledged terms are kept aside so a rejected replace can restore them.
#[derive(Debug, Clone, Default)]
pub struct LocalOrderState {
    state: HandleState,
    intent: Option<OrderIntentId>,
    acked_price: Price,
    acked_qty: Qty,
}

impl LocalOrderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &HandleState {
        &self.state
    }

    /// Intent of the current order.
    pub fn intent(&self) -> Option<OrderIntentId> {
        self.intent
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn can_new(&self, qty: Qty) -> bool {
        self.state.is_reset() && qty.is_positive()
    }

    pub fn can_replace(&self, qty: Qty) -> bool {
        qty.is_positive()
            && !matches!(
                self.state.status,
                OrderStatus::Reset | OrderStatus::PendingCancel
            )
    }

    pub fn can_cancel(&self) -> bool {
        !matches!(
            self.state.status,
            OrderStatus::Reset | OrderStatus::PendingCancel
        )
    }

    /// Record a sent new order.
    pub fn begin_new(&mut self, intent: OrderIntentId, price: Price, qty: Qty) -> bool {
        if !self.can_new(qty) {
            return false;
        }
        self.intent = Some(intent);
        self.acked_price = Price::ZERO;
        self.acked_qty = Qty::ZERO;
        self.state = HandleState {
            status: OrderStatus::PendingNew,
            last_quoted_price: price,
            last_quantity: qty,
            last_filled_quantity: Qty::ZERO,
            exchange_order_id: None,
        };
        true
    }

    /// Record a sent replace.
    pub fn begin_replace(&mut self, price: Price, qty: Qty) -> bool {
        if !self.can_replace(qty) {
            return false;
        }
        self.state.status = OrderStatus::PendingReplace;
        self.state.last_quoted_price = price;
        self.state.last_quantity = qty;
        true
    }

    /// Record a sent cancel.
    pub fn begin_cancel(&mut self) -> bool {
        if !self.can_cancel() {
            return false;
        }
        self.state.status = OrderStatus::PendingCancel;
        true
    }

    /// Apply an exchange notification.
    pub fn apply(&mut self, conf: &OrderConfirmation) -> bool {
        if self.state.is_reset() || self.intent != Some(conf.intent) {
            return false;
        }
        if conf.exchange_order_id.is_some() {
            self.state.exchange_order_id = conf.exchange_order_id;
        }

        let status = self.state.status;
        if conf.kind.is_fill() {
            self.state.last_filled_quantity =
                self.state.last_filled_quantity + conf.last_fill_qty;
        }
        if conf.kind.is_terminal() {
            self.close();
        } else {
            match conf.kind {
                ConfirmationKind::Confirmed => {
                    self.ack(conf.order_price, conf.open_qty);
                    if status == OrderStatus::PendingNew {
                        self.show_acked(OrderStatus::Live);
                    }
                }
                ConfirmationKind::Replaced => {
                    self.ack(conf.order_price, conf.open_qty);
                    if status != OrderStatus::PendingCancel {
                        self.show_acked(OrderStatus::Live);
                    }
                }
                ConfirmationKind::ReplaceRejected => {
                    if status == OrderStatus::PendingReplace {
                        self.show_acked(OrderStatus::Live);
                    }
                }
                ConfirmationKind::CancelRejected => {
                    if status == OrderStatus::PendingCancel {
                        self.show_acked(OrderStatus::Live);
                    }
                }
                ConfirmationKind::PartialFill => {
                    self.acked_qty = conf.open_qty;
                    match status {
                        OrderStatus::PendingNew | OrderStatus::Live => {
                            self.acked_price = conf.order_price;
                            self.show_acked(OrderStatus::Live);
                        }
                        // A cancel carries no new terms.
                        OrderStatus::PendingCancel => {
                            self.acked_price = conf.order_price;
                            self.show_acked(OrderStatus::PendingCancel);
                        }
                        // Keep the replace terms; its ack settles them.
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        trace!(
            intent = %conf.intent,
            kind = %conf.kind,
            status = %self.state.status,
            qty = %self.state.last_quantity,
            "Applied confirmation"
        );
        true
    }

    fn ack(&mut self, price: Price, qty: Qty) {
        self.acked_price = price;
        self.acked_qty = qty;
    }

    fn show_acked(&mut self, status: OrderStatus) {
        self.state.status = status;
        self.state.last_quoted_price = self.acked_price;
        self.state.last_quantity = self.acked_qty;
    }

    /// The order no longer rests; the owner resets the slot.
    fn close(&mut self) {
        self.state.last_quantity = Qty::ZERO;
        self.acked_qty = Qty::ZERO;
    }
}

// ============================================================================
// Mock Handle
// ============================================================================

/// Request recorded by [`MockOrderHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleCall {
    New {
        side: OrderSide,
        intent: OrderIntentId,
        price: Price,
        qty: Qty,
    },
    Replace {
        side: OrderSide,
        price: Price,
        qty: Qty,
    },
    Cancel {
        side: OrderSide,
    },
}

/// Behaviour and call log shared by a set of mock handles.
#[derive(Debug)]
pub struct MockScript {
    /// Whether requests are reported as sent.
    pub send: bool,
    /// When set, every request fails the risk check with this reason.
    pub risk_reject: Option<String>,
    calls: Vec<HandleCall>,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            send: true,
            risk_reject: None,
            calls: Vec::new(),
        }
    }
}

impl MockScript {
    pub fn shared() -> Rc<RefCell<MockScript>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn calls(&self) -> &[HandleCall] {
        &self.calls
    }

    /// Take the recorded calls.
    pub fn drain(&mut self) -> Vec<HandleCall> {
        std::mem::take(&mut self.calls)
    }
}

/// Order handle that records requests instead of sending them.
#[derive(Debug)]
pub struct MockOrderHandle {
    side: OrderSide,
    order: LocalOrderState,
    script: Rc<RefCell<MockScript>>,
}

impl MockOrderHandle {
    pub fn new(side: OrderSide) -> Self {
        Self::with_script(side, MockScript::shared())
    }

    pub fn with_script(side: OrderSide, script: Rc<RefCell<MockScript>>) -> Self {
        Self {
            side,
            order: LocalOrderState::new(),
            script,
        }
    }

    pub fn intent(&self) -> Option<OrderIntentId> {
        self.order.intent()
    }

    /// Passes the risk check, then asks the script whether to send.
    fn submit(&self, risk: &mut RiskStatus, call: HandleCall) -> bool {
        let mut script = self.script.borrow_mut();
        if let Some(reason) = &script.risk_reject {
            risk.reject(reason.clone());
            return false;
        }
        risk.clear();
        if !script.send {
            return false;
        }
        script.calls.push(call);
        true
    }
}

impl OrderHandle for MockOrderHandle {
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
        if !self.order.can_new(qty) {
            return false;
        }
        let call = HandleCall::New {
            side: self.side,
            intent,
            price,
            qty,
        };
        self.submit(risk, call) && self.order.begin_new(intent, price, qty)
    }

    fn replace_order(&mut self, risk: &mut RiskStatus, price: Price, qty: Qty) -> bool {
        if !self.order.can_replace(qty) {
            return false;
        }
        let call = HandleCall::Replace {
            side: self.side,
            price,
            qty,
        };
        self.submit(risk, call) && self.order.begin_replace(price, qty)
    }

    fn cancel_order(&mut self, risk: &mut RiskStatus) -> bool {
        if !self.order.can_cancel() {
            return false;
        }
        let call = HandleCall::Cancel { side: self.side };
        self.submit(risk, call) && self.order.begin_cancel()
    }

    fn apply_confirmation(&mut self, confirmation: &OrderConfirmation) -> bool {
        self.order.apply(confirmation)
    }

    fn state(&self) -> &HandleState {
        self.order.state()
    }
}
