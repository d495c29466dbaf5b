//! Desired-order planning.
//!
//! Every cycle the desired table is zeroed and refilled from the net
//! position and the book. Two roles per side:
//! - Slot 0 (build): quote up to the inventory cap on both sides
//! - Slot 1 (square-off): work the whole net position back to flat

use quoter_core::{BookSnapshot, NetPosition, OrderSide, Price, Qty};
use tracing::debug;

/// Slot index of the inventory-building role.
pub const BUILD_SLOT: usize = 0;
/// Slot index of the square-off role.
pub const SQUARE_OFF_SLOT: usize = 1;

/// Order wanted in one slot this cycle. Zero quantity means none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesiredOrder {
    pub price: Price,
    pub quantity: Qty,
}

impl DesiredOrder {
    pub const NONE: Self = Self {
        price: Price::ZERO,
        quantity: Qty::ZERO,
    };

    pub fn new(price: Price, quantity: Qty) -> Self {
        Self { price, quantity }
    }

    /// Whether an order is wanted.
    #[inline]
    pub fn is_wanted(&self) -> bool {
        self.quantity.is_positive()
    }
}

/// Desired orders for every slot on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredTable {
    buys: Vec<DesiredOrder>,
    sells: Vec<DesiredOrder>,
}

impl DesiredTable {
    pub fn new(pool_size: usize) -> Self {
        Self {
            buys: vec![DesiredOrder::NONE; pool_size],
            sells: vec![DesiredOrder::NONE; pool_size],
        }
    }

    pub fn pool_size(&self) -> usize {
        self.buys.len()
    }

    /// Zero every entry.
    pub fn reset(&mut self) {
        self.buys.fill(DesiredOrder::NONE);
        self.sells.fill(DesiredOrder::NONE);
    }

    /// Entry for `side` / `index`, [`DesiredOrder::NONE`] when out of range.
    pub fn get(&self, side: OrderSide, index: usize) -> DesiredOrder {
        self.side(side)
            .get(index)
            .copied()
            .unwrap_or(DesiredOrder::NONE)
    }

    pub fn side(&self, side: OrderSide) -> &[DesiredOrder] {
        match side {
            OrderSide::Buy => &self.buys,
            OrderSide::Sell => &self.sells,
        }
    }

    /// Set an entry. Returns false when the pool has no such slot.
    pub fn set(&mut self, side: OrderSide, index: usize, order: DesiredOrder) -> bool {
        let entries = match side {
            OrderSide::Buy => &mut self.buys,
            OrderSide::Sell => &mut self.sells,
        };
        match entries.get_mut(index) {
            Some(entry) => {
                *entry = order;
                true
            }
            None => false,
        }
    }

    /// Whether any slot wants an order.
    pub fn is_empty(&self) -> bool {
        !self.buys.iter().chain(&self.sells).any(|d| d.is_wanted())
    }
}

/// Build-role quantities `(buy, sell)`, both non-negative.
///
/// buy = max(min(cap, cap - net), 0)
/// sell = |min(max(-cap, -cap - net), 0)|
pub fn build_quantities(net: Qty, cap: Qty) -> (Qty, Qty) {
    let (net, cap) = (net.inner(), cap.inner());
    let buy = cap.min(cap - net).max(0);
    let sell = (-cap).max(-cap - net).min(0);
    (Qty::new(buy), Qty::new(-sell))
}

/// Fills the desired table from position and book.
#[derive(Debug, Clone, Copy)]
pub struct QuotePlanner {
    placed_depth: usize,
}

impl QuotePlanner {
    pub fn new(placed_depth: usize) -> Self {
        Self { placed_depth }
    }

    pub fn placed_depth(&self) -> usize {
        self.placed_depth
    }

    /// Zero `table` and refill it.
    pub fn plan_into(
        &self,
        position: &NetPosition,
        cap: Qty,
        book: &BookSnapshot,
        table: &mut DesiredTable,
    ) {
        table.reset();

        let bid = book.bid_price(self.placed_depth);
        let ask = book.ask_price(self.placed_depth);
        let net = position.net_qty;

        let (buy, sell) = build_quantities(net, cap);
        if buy.is_positive() {
            table.set(OrderSide::Buy, BUILD_SLOT, DesiredOrder::new(bid, buy));
        }
        if sell.is_positive() {
            table.set(OrderSide::Sell, BUILD_SLOT, DesiredOrder::new(ask, sell));
        }

        // Square-off works the opposite side of the position.
        let square_off = if net.is_positive() {
            Some((OrderSide::Sell, ask))
        } else if net.is_negative() {
            Some((OrderSide::Buy, bid))
        } else {
            None
        };
        if let Some((side, price)) = square_off {
            table.set(side, SQUARE_OFF_SLOT, DesiredOrder::new(price, net.abs()));
        }

        debug!(
            net = %net,
            cap = %cap,
            build_buy = %buy,
            build_sell = %sell,
            bid = %bid,
            ask = %ask,
            "Planned desired orders"
        );
    }

    /// Convenience wrapper returning a fresh table.
    pub fn plan(
        &self,
        position: &NetPosition,
        cap: Qty,
        book: &BookSnapshot,
        pool_size: usize,
    ) -> DesiredTable {
        let mut table = DesiredTable::new(pool_size);
        self.plan_into(position, cap, book, &mut table);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quoter_core::{ContractId, TradedTotals};

    const CAP: Qty = Qty(100);

    fn book() -> BookSnapshot {
        BookSnapshot::from_levels(
            ContractId::new(1),
            None,
            &[(101, 5), (100, 5), (99, 5), (98, 5), (97, 5)],
            &[(102, 5), (103, 5), (104, 5), (105, 5), (106, 5)],
        )
        .unwrap()
    }

    fn position(net: i64) -> NetPosition {
        let totals = if net >= 0 {
            TradedTotals {
                buy_qty: Qty::new(net),
                ..TradedTotals::default()
            }
        } else {
            TradedTotals {
                sell_qty: Qty::new(-net),
                ..TradedTotals::default()
            }
        };
        NetPosition::from_totals(ContractId::new(1), totals)
    }

    #[test]
    fn test_build_quantities_flat() {
        assert_eq!(build_quantities(Qty::ZERO, CAP), (Qty::new(100), Qty::new(100)));
    }

    #[test]
    fn test_build_quantities_long() {
        assert_eq!(build_quantities(Qty::new(30), CAP), (Qty::new(70), Qty::new(100)));
        // Past the cap the buy side stops and the sell side stays clamped.
        assert_eq!(build_quantities(Qty::new(150), CAP), (Qty::ZERO, Qty::new(100)));
    }

    #[test]
    fn test_build_quantities_short() {
        assert_eq!(build_quantities(Qty::new(-30), CAP), (Qty::new(100), Qty::new(70)));
        assert_eq!(build_quantities(Qty::new(-150), CAP), (Qty::new(100), Qty::ZERO));
    }

    #[test]
    fn test_plan_flat_quotes_both_sides_at_placed_depth() {
        let table = QuotePlanner::new(2).plan(&position(0), CAP, &book(), 2);
        assert_eq!(
            table.get(OrderSide::Buy, BUILD_SLOT),
            DesiredOrder::new(Price::new(99), Qty::new(100))
        );
        assert_eq!(
            table.get(OrderSide::Sell, BUILD_SLOT),
            DesiredOrder::new(Price::new(104), Qty::new(100))
        );
        assert!(!table.get(OrderSide::Buy, SQUARE_OFF_SLOT).is_wanted());
        assert!(!table.get(OrderSide::Sell, SQUARE_OFF_SLOT).is_wanted());
    }

    #[test]
    fn test_plan_long_squares_off_on_sell() {
        let table = QuotePlanner::new(2).plan(&position(40), CAP, &book(), 2);
        assert_eq!(table.get(OrderSide::Buy, BUILD_SLOT).quantity, Qty::new(60));
        assert_eq!(
            table.get(OrderSide::Sell, SQUARE_OFF_SLOT),
            DesiredOrder::new(Price::new(104), Qty::new(40))
        );
        assert!(!table.get(OrderSide::Buy, SQUARE_OFF_SLOT).is_wanted());
    }

    #[test]
    fn test_plan_short_squares_off_on_buy() {
        let table = QuotePlanner::new(2).plan(&position(-150), CAP, &book(), 2);
        assert_eq!(table.get(OrderSide::Buy, BUILD_SLOT).quantity, Qty::new(100));
        assert!(!table.get(OrderSide::Sell, BUILD_SLOT).is_wanted());
        assert_eq!(
            table.get(OrderSide::Buy, SQUARE_OFF_SLOT),
            DesiredOrder::new(Price::new(99), Qty::new(150))
        );
    }

    #[test]
    fn test_plan_into_clears_stale_entries() {
        let planner = QuotePlanner::new(2);
        let mut table = planner.plan(&position(40), CAP, &book(), 2);
        planner.plan_into(&position(0), CAP, &book(), &mut table);
        assert!(!table.get(OrderSide::Sell, SQUARE_OFF_SLOT).is_wanted());
    }

    #[test]
    fn test_single_slot_pool_skips_square_off() {
        let table = QuotePlanner::new(2).plan(&position(40), CAP, &book(), 1);
        assert_eq!(table.pool_size(), 1);
        assert_eq!(table.get(OrderSide::Buy, BUILD_SLOT).quantity, Qty::new(60));
        assert_eq!(table.get(OrderSide::Sell, SQUARE_OFF_SLOT), DesiredOrder::NONE);
    }

    #[test]
    fn test_reset_empties_table() {
        let mut table = QuotePlanner::new(0).plan(&position(0), CAP, &book(), 2);
        assert!(!table.is_empty());
        table.reset();
        assert!(table.is_empty());
    }
}
