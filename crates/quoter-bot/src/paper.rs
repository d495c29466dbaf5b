//! Paper venue.
//!
//! Rests orders received from the channel handles, acknowledges every
//! request and fills resting orders against each new book:
//! - a buy fills when ask[0] is at or through its price
//! - a sell fills when bid[0] is at or through its price
//!
//! Fills are booked into a [`FillLedger`], which is also the strategy's
//! position source.

use std::collections::BTreeMap;

use quoter_core::{
    BookSnapshot, ConfirmationKind, ContractId, OrderConfirmation, OrderIntentId, OrderSide,
    Price, Qty,
};
use quoter_mm::FillLedger;
use tracing::debug;

use crate::transport::OrderRequest;

#[derive(Debug, Clone, Copy)]
struct RestingOrder {
    contract: ContractId,
    side: OrderSide,
    price: Price,
    open_qty: Qty,
    exchange_id: u64,
}

impl RestingOrder {
    fn confirmation(&self, intent: OrderIntentId, kind: ConfirmationKind) -> OrderConfirmation {
        OrderConfirmation::new(intent, self.contract, self.side, kind)
            .with_order(self.price, self.open_qty)
            .with_exchange_id(self.exchange_id)
    }
}

/// Simulated exchange.
#[derive(Debug, Default)]
pub struct PaperVenue {
    /// Keyed by intent; ordered so matching is deterministic.
    orders: BTreeMap<OrderIntentId, RestingOrder>,
    ledger: FillLedger,
    next_exchange_id: u64,
}

impl PaperVenue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &FillLedger {
        &self.ledger
    }

    pub fn resting_count(&self) -> usize {
        self.orders.len()
    }

    /// Acknowledge one request.
    pub fn on_request(&mut self, request: OrderRequest) -> OrderConfirmation {
        match request {
            OrderRequest::New {
                intent,
                contract,
                side,
                price,
                qty,
            } => {
                self.next_exchange_id += 1;
                let order = RestingOrder {
                    contract,
                    side,
                    price,
                    open_qty: qty,
                    exchange_id: self.next_exchange_id,
                };
                self.orders.insert(intent, order);
                order.confirmation(intent, ConfirmationKind::Confirmed)
            }
            OrderRequest::Replace {
                intent,
                contract,
                side,
                price,
                qty,
            } => match self.orders.get_mut(&intent) {
                Some(order) => {
                    order.price = price;
                    order.open_qty = qty;
                    order.confirmation(intent, ConfirmationKind::Replaced)
                }
                None => OrderConfirmation::new(
                    intent,
                    contract,
                    side,
                    ConfirmationKind::ReplaceRejected,
                ),
            },
            OrderRequest::Cancel {
                intent,
                contract,
                side,
            } => match self.orders.remove(&intent) {
                Some(order) => {
                    let mut canceled = order;
                    canceled.open_qty = Qty::ZERO;
                    canceled.confirmation(intent, ConfirmationKind::Canceled)
                }
                None => {
                    OrderConfirmation::new(intent, contract, side, ConfirmationKind::CancelRejected)
                }
            },
        }
    }

    /// Match resting orders against the top of `book`.
    pub fn on_book(&mut self, book: &BookSnapshot) -> Vec<OrderConfirmation> {
        let mut confirmations = Vec::new();
        let mut bid = book.bids[0];
        let mut ask = book.asks[0];

        for (&intent, order) in self.orders.iter_mut() {
            if order.contract != book.contract_id {
                continue;
            }
            let level = match order.side {
                OrderSide::Buy if ask.is_quoted() && ask.price <= order.price => &mut ask,
                OrderSide::Sell if bid.is_quoted() && bid.price >= order.price => &mut bid,
                _ => continue,
            };
            let fill_qty = order.open_qty.min(level.quantity);
            if !fill_qty.is_positive() {
                continue;
            }
            level.quantity = level.quantity - fill_qty;
            order.open_qty = order.open_qty - fill_qty;
            self.ledger
                .record_fill(order.contract, order.side, order.price, fill_qty);

            let kind = if order.open_qty.is_zero() {
                ConfirmationKind::Filled
            } else {
                ConfirmationKind::PartialFill
            };
            debug!(
                intent = %intent,
                side = %order.side,
                price = %order.price,
                qty = %fill_qty,
                open = %order.open_qty,
                "Paper fill"
            );
            confirmations.push(
                order
                    .confirmation(intent, kind)
                    .with_fill(order.price, fill_qty),
            );
        }

        self.orders.retain(|_, o| o.open_qty.is_positive());
        confirmations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: ContractId = ContractId(1);

    fn new_order(intent: u64, side: OrderSide, price: i64, qty: i64) -> OrderRequest {
        OrderRequest::New {
            intent: OrderIntentId::new(intent),
            contract: CONTRACT,
            side,
            price: Price::new(price),
            qty: Qty::new(qty),
        }
    }

    fn book(bid: (i64, i64), ask: (i64, i64)) -> BookSnapshot {
        BookSnapshot::from_levels(CONTRACT, None, &[bid], &[ask]).unwrap()
    }

    #[test]
    fn test_new_is_confirmed_with_exchange_id() {
        let mut venue = PaperVenue::new();
        let conf = venue.on_request(new_order(1, OrderSide::Buy, 99, 100));
        assert_eq!(conf.kind, ConfirmationKind::Confirmed);
        assert_eq!(conf.exchange_order_id, Some(1));
        assert_eq!(conf.open_qty, Qty::new(100));
        assert_eq!(venue.resting_count(), 1);
    }

    #[test]
    fn test_partial_then_full_fill() {
        let mut venue = PaperVenue::new();
        venue.on_request(new_order(1, OrderSide::Buy, 99, 100));

        let confs = venue.on_book(&book((98, 10), (99, 40)));
        assert_eq!(confs.len(), 1);
        assert_eq!(confs[0].kind, ConfirmationKind::PartialFill);
        assert_eq!(confs[0].last_fill_qty, Qty::new(40));
        assert_eq!(confs[0].open_qty, Qty::new(60));
        assert_eq!(venue.ledger().net_qty(CONTRACT), Qty::new(40));

        let confs = venue.on_book(&book((98, 10), (97, 500)));
        assert_eq!(confs[0].kind, ConfirmationKind::Filled);
        assert_eq!(confs[0].last_fill_price, Price::new(99));
        assert_eq!(venue.resting_count(), 0);
        assert_eq!(venue.ledger().net_qty(CONTRACT), Qty::new(100));
    }

    #[test]
    fn test_sell_fills_against_bid() {
        let mut venue = PaperVenue::new();
        venue.on_request(new_order(1, OrderSide::Sell, 101, 10));
        assert!(venue.on_book(&book((100, 50), (102, 50))).is_empty());

        let confs = venue.on_book(&book((101, 50), (102, 50)));
        assert_eq!(confs[0].kind, ConfirmationKind::Filled);
        assert_eq!(venue.ledger().net_qty(CONTRACT), Qty::new(-10));
    }

    #[test]
    fn test_top_level_quantity_is_shared() {
        let mut venue = PaperVenue::new();
        venue.on_request(new_order(1, OrderSide::Buy, 100, 30));
        venue.on_request(new_order(2, OrderSide::Buy, 100, 30));

        let confs = venue.on_book(&book((98, 10), (100, 40)));
        let filled: i64 = confs.iter().map(|c| c.last_fill_qty.inner()).sum();
        assert_eq!(filled, 40);
        assert_eq!(venue.resting_count(), 1);
    }

    #[test]
    fn test_replace_and_cancel() {
        let mut venue = PaperVenue::new();
        venue.on_request(new_order(1, OrderSide::Buy, 99, 100));

        let replaced = venue.on_request(OrderRequest::Replace {
            intent: OrderIntentId::new(1),
            contract: CONTRACT,
            side: OrderSide::Buy,
            price: Price::new(98),
            qty: Qty::new(60),
        });
        assert_eq!(replaced.kind, ConfirmationKind::Replaced);
        assert_eq!(replaced.order_price, Price::new(98));

        let cancel = OrderRequest::Cancel {
            intent: OrderIntentId::new(1),
            contract: CONTRACT,
            side: OrderSide::Buy,
        };
        let canceled = venue.on_request(cancel.clone());
        assert_eq!(canceled.kind, ConfirmationKind::Canceled);
        assert_eq!(canceled.open_qty, Qty::ZERO);

        let again = venue.on_request(cancel);
        assert_eq!(again.kind, ConfirmationKind::CancelRejected);
    }
}
