//! Net position tracking.
//!
//! The position service is abstracted behind [`PositionSource`]. The
//! tracker pulls traded totals once per cycle and derives the net position;
//! nothing mutates the cached position in between.

use std::collections::HashMap;

use quoter_core::{ContractId, NetPosition, OrderSide, Price, Qty, TradedTotals};
use tracing::debug;

use crate::error::PositionError;

/// Read access to per-contract traded totals.
#[cfg_attr(test, mockall::automock)]
pub trait PositionSource {
    fn traded_totals(&self, contract: ContractId) -> Result<TradedTotals, PositionError>;
}

/// Cached net position, refreshed once per cycle.
#[derive(Debug, Default)]
pub struct PositionTracker {
    last: NetPosition,
}

impl PositionTracker {
    pub fn new(contract: ContractId) -> Self {
        Self {
            last: NetPosition::from_totals(contract, TradedTotals::default()),
        }
    }

    /// Pull totals for `contract` and recompute the net position.
    ///
    /// On failure the cached position is left untouched.
    pub fn update<P>(
        &mut self,
        source: &P,
        contract: ContractId,
    ) -> Result<NetPosition, PositionError>
    where
        P: PositionSource + ?Sized,
    {
        let totals = source.traded_totals(contract)?;
        let position = NetPosition::from_totals(contract, totals);
        if position.net_qty != self.last.net_qty {
            debug!(
                contract = %contract,
                from = %self.last.net_qty,
                to = %position.net_qty,
                "Net position changed"
            );
        }
        self.last = position;
        Ok(position)
    }

    /// Position as of the last successful update.
    pub fn last(&self) -> &NetPosition {
        &self.last
    }
}

// ============================================================================
// Fill Ledger
// ============================================================================

/// In-memory position service fed by fills.
#[derive(Debug, Default)]
pub struct FillLedger {
    totals: HashMap<ContractId, TradedTotals>,
    fill_count: u64,
}

impl FillLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fill.
    pub fn record_fill(&mut self, contract: ContractId, side: OrderSide, price: Price, qty: Qty) {
        if !qty.is_positive() {
            return;
        }
        let totals = self.totals.entry(contract).or_default();
        match side {
            OrderSide::Buy => {
                totals.buy_qty = totals.buy_qty + qty;
                totals.buy_value += qty.notional(price);
            }
            OrderSide::Sell => {
                totals.sell_qty = totals.sell_qty + qty;
                totals.sell_value += qty.notional(price);
            }
        }
        self.fill_count += 1;
    }

    /// Net quantity for a contract (0 when never traded).
    pub fn net_qty(&self, contract: ContractId) -> Qty {
        self.totals
            .get(&contract)
            .map(|t| t.buy_qty - t.sell_qty)
            .unwrap_or(Qty::ZERO)
    }

    /// Total number of fills processed.
    pub fn fill_count(&self) -> u64 {
        self.fill_count
    }
}

impl PositionSource for FillLedger {
    fn traded_totals(&self, contract: ContractId) -> Result<TradedTotals, PositionError> {
        Ok(self.totals.get(&contract).copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    const CONTRACT: ContractId = ContractId(7);

    #[test]
    fn test_update_computes_net() {
        let mut source = MockPositionSource::new();
        source
            .expect_traded_totals()
            .with(eq(CONTRACT))
            .times(1)
            .returning(|_| {
                Ok(TradedTotals {
                    buy_qty: Qty::new(100),
                    buy_value: 9_900,
                    sell_qty: Qty::new(60),
                    sell_value: 6_060,
                })
            });

        let mut tracker = PositionTracker::new(CONTRACT);
        let pos = tracker.update(&source, CONTRACT).unwrap();
        assert_eq!(pos.net_qty, Qty::new(40));
        assert_eq!(tracker.last().net_qty, Qty::new(40));
    }

    #[test]
    fn test_update_failure_keeps_cache() {
        let mut source = MockPositionSource::new();
        let mut calls = 0;
        source.expect_traded_totals().times(2).returning(move |c| {
            calls += 1;
            if calls == 1 {
                Ok(TradedTotals {
                    buy_qty: Qty::new(10),
                    buy_value: 1_000,
                    ..TradedTotals::default()
                })
            } else {
                Err(PositionError::Unavailable {
                    contract: c,
                    reason: "service down".to_string(),
                })
            }
        });

        let mut tracker = PositionTracker::new(CONTRACT);
        tracker.update(&source, CONTRACT).unwrap();
        let err = tracker.update(&source, CONTRACT).unwrap_err();
        assert!(err.to_string().contains("service down"));
        assert_eq!(tracker.last().net_qty, Qty::new(10));
    }

    #[test]
    fn test_ledger_accumulates_fills() {
        let mut ledger = FillLedger::new();
        ledger.record_fill(CONTRACT, OrderSide::Buy, Price::new(99), Qty::new(40));
        ledger.record_fill(CONTRACT, OrderSide::Sell, Price::new(101), Qty::new(10));
        ledger.record_fill(CONTRACT, OrderSide::Sell, Price::new(101), Qty::ZERO);

        let totals = ledger.traded_totals(CONTRACT).unwrap();
        assert_eq!(totals.buy_qty, Qty::new(40));
        assert_eq!(totals.buy_value, 3_960);
        assert_eq!(totals.sell_value, 1_010);
        assert_eq!(ledger.net_qty(CONTRACT), Qty::new(30));
        assert_eq!(ledger.fill_count(), 2);
    }

    #[test]
    fn test_ledger_unknown_contract_is_flat() {
        let ledger = FillLedger::new();
        let totals = ledger.traded_totals(ContractId::new(99)).unwrap();
        assert_eq!(totals, TradedTotals::default());
    }
}
