//! Order slots.
//!
//! The pool is allocated once at construction: `pool_size` slots per side,
//! each owning one order handle. A slot mirrors its handle's state after
//! every call and carries the intent id confirmations are routed by.

use std::fmt;

use quoter_core::{OrderConfirmation, OrderIntentId, OrderSide, Price, Qty, RiskStatus};
use quoter_telemetry::SlotRecord;

use crate::handle::{HandleState, OrderHandle};

/// Position of a slot in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub side: OrderSide,
    pub index: usize,
}

impl SlotId {
    pub fn new(side: OrderSide, index: usize) -> Self {
        Self { side, index }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.side, self.index)
    }
}

/// One pool element.
#[derive(Debug)]
pub struct OrderSlot<H> {
    id: SlotId,
    handle: H,
    intent: Option<OrderIntentId>,
    live: HandleState,
}

impl<H: OrderHandle> OrderSlot<H> {
    pub fn new(id: SlotId, mut handle: H) -> Self {
        handle.reset();
        let live = *handle.state();
        Self {
            id,
            handle,
            intent: None,
            live,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Intent of the order this slot carries.
    pub fn intent(&self) -> Option<OrderIntentId> {
        self.intent
    }

    /// Last-known live state.
    pub fn live(&self) -> &HandleState {
        &self.live
    }

    pub fn is_reset(&self) -> bool {
        self.live.is_reset()
    }

    pub fn live_quantity(&self) -> Qty {
        self.live.last_quantity
    }

    pub fn send_new(
        &mut self,
        risk: &mut RiskStatus,
        intent: OrderIntentId,
        price: Price,
        qty: Qty,
    ) -> bool {
        let sent = self.handle.new_order(risk, intent, price, qty);
        if sent {
            self.intent = Some(intent);
        }
        self.sync();
        sent
    }

    pub fn send_replace(&mut self, risk: &mut RiskStatus, price: Price, qty: Qty) -> bool {
        let sent = self.handle.replace_order(risk, price, qty);
        self.sync();
        sent
    }

    pub fn send_cancel(&mut self, risk: &mut RiskStatus) -> bool {
        let sent = self.handle.cancel_order(risk);
        self.sync();
        sent
    }

    /// Forward a confirmation to the handle.
    pub fn apply(&mut self, confirmation: &OrderConfirmation) -> bool {
        let applied = self.handle.apply_confirmation(confirmation);
        self.sync();
        applied
    }

    /// Release the slot for a fresh order.
    pub fn reset(&mut self) {
        self.handle.reset();
        self.intent = None;
        self.sync();
    }

    pub fn record(&self) -> SlotRecord {
        SlotRecord {
            side: self.id.side,
            index: self.id.index,
            intent: self.intent,
            status: self.live.status,
            is_reset: self.live.is_reset(),
            exchange_order_id: self.live.exchange_order_id,
            last_quoted_price: self.live.last_quoted_price,
            last_quantity: self.live.last_quantity,
            last_filled_quantity: self.live.last_filled_quantity,
        }
    }

    fn sync(&mut self) {
        self.live = *self.handle.state();
    }
}

/// Fixed pool of slots for both sides.
#[derive(Debug)]
pub struct SlotPool<H> {
    buys: Vec<OrderSlot<H>>,
    sells: Vec<OrderSlot<H>>,
}

impl<H: OrderHandle> SlotPool<H> {
    /// Allocate `pool_size` slots per side, one handle each.
    pub fn new(pool_size: usize, mut make_handle: impl FnMut(SlotId) -> H) -> Self {
        let mut build = |side| {
            (0..pool_size)
                .map(|index| {
                    let id = SlotId::new(side, index);
                    OrderSlot::new(id, make_handle(id))
                })
                .collect::<Vec<_>>()
        };
        let buys = build(OrderSide::Buy);
        let sells = build(OrderSide::Sell);
        Self { buys, sells }
    }

    pub fn pool_size(&self) -> usize {
        self.buys.len()
    }

    pub fn side(&self, side: OrderSide) -> &[OrderSlot<H>] {
        match side {
            OrderSide::Buy => &self.buys,
            OrderSide::Sell => &self.sells,
        }
    }

    pub fn side_mut(&mut self, side: OrderSide) -> &mut [OrderSlot<H>] {
        match side {
            OrderSide::Buy => &mut self.buys,
            OrderSide::Sell => &mut self.sells,
        }
    }

    pub fn slot(&self, side: OrderSide, index: usize) -> Option<&OrderSlot<H>> {
        self.side(side).get(index)
    }

    /// Buy slots, then sell slots.
    pub fn iter(&self) -> impl Iterator<Item = &OrderSlot<H>> {
        self.buys.iter().chain(self.sells.iter())
    }

    /// Slot carrying `intent`, buys scanned first.
    pub fn find_by_intent_mut(&mut self, intent: OrderIntentId) -> Option<&mut OrderSlot<H>> {
        self.buys
            .iter_mut()
            .chain(self.sells.iter_mut())
            .find(|slot| slot.intent == Some(intent))
    }

    /// Number of slots carrying an order.
    pub fn active_count(&self) -> usize {
        self.iter().filter(|slot| !slot.is_reset()).count()
    }

    pub fn records(&self) -> Vec<SlotRecord> {
        self.iter().map(OrderSlot::record).collect()
    }
}
