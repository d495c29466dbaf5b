//! Net position types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::book::ContractId;
use crate::Qty;

/// Cumulative traded quantity and value per side, as reported by a
/// position service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradedTotals {
    pub buy_qty: Qty,
    pub buy_value: i64,
    pub sell_qty: Qty,
    pub sell_value: i64,
}

/// Net inventory for one contract.
///
/// Derived from [`TradedTotals`] on every cycle; never mutated in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetPosition {
    pub contract_id: ContractId,
    /// Buy quantity minus sell quantity. Positive = long.
    pub net_qty: Qty,
    pub totals: TradedTotals,
}

impl NetPosition {
    pub fn from_totals(contract_id: ContractId, totals: TradedTotals) -> Self {
        Self {
            contract_id,
            net_qty: totals.buy_qty - totals.sell_qty,
            totals,
        }
    }

    /// Realized cash flow plus open inventory marked at `mid`.
    pub fn gross_pnl(&self, mid: Decimal) -> Decimal {
        let cash = Decimal::from(self.totals.sell_value) - Decimal::from(self.totals.buy_value);
        cash + self.net_qty.to_decimal() * mid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_net_qty_is_buy_minus_sell() {
        let totals = TradedTotals {
            buy_qty: Qty::new(100),
            buy_value: 9_900,
            sell_qty: Qty::new(60),
            sell_value: 6_060,
        };
        let pos = NetPosition::from_totals(ContractId::new(1), totals);
        assert_eq!(pos.net_qty, Qty::new(40));
    }

    #[test]
    fn test_gross_pnl_marks_open_inventory() {
        let totals = TradedTotals {
            buy_qty: Qty::new(100),
            buy_value: 9_900,
            sell_qty: Qty::new(60),
            sell_value: 6_060,
        };
        let pos = NetPosition::from_totals(ContractId::new(1), totals);
        // 6060 - 9900 + 40 * 100.5
        assert_eq!(pos.gross_pnl(dec!(100.5)), dec!(180));
    }

    #[test]
    fn test_flat_position_pnl_is_cash_only() {
        let totals = TradedTotals {
            buy_qty: Qty::new(10),
            buy_value: 990,
            sell_qty: Qty::new(10),
            sell_value: 1_010,
        };
        let pos = NetPosition::from_totals(ContractId::new(1), totals);
        assert!(pos.net_qty.is_zero());
        assert_eq!(pos.gross_pnl(dec!(123)), dec!(20));
    }
}
