//! Book snapshot types.
//!
//! A snapshot holds the best [`BOOK_DEPTH`] levels per side, ordered
//! best-to-worst. A level whose price is zero or negative carries no quote.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::order::OrderSide;
use crate::{Price, Qty};

/// Number of price levels carried per side.
pub const BOOK_DEPTH: usize = 20;

/// Exchange contract identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub i64);

impl ContractId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One price level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub quantity: Qty,
}

impl BookLevel {
    pub fn new(price: i64, quantity: i64) -> Self {
        Self {
            price: Price::new(price),
            quantity: Qty::new(quantity),
        }
    }

    /// Whether this level carries a quote.
    #[inline]
    pub fn is_quoted(&self) -> bool {
        self.price.is_positive()
    }
}

/// Two-sided book snapshot for one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub contract_id: ContractId,
    pub timestamp: DateTime<Utc>,
    pub bids: [BookLevel; BOOK_DEPTH],
    pub asks: [BookLevel; BOOK_DEPTH],
}

impl BookSnapshot {
    /// Empty snapshot (every level unquoted).
    pub fn empty(contract_id: ContractId, timestamp: DateTime<Utc>) -> Self {
        Self {
            contract_id,
            timestamp,
            bids: [BookLevel::default(); BOOK_DEPTH],
            asks: [BookLevel::default(); BOOK_DEPTH],
        }
    }

    /// Build a snapshot from `(price, quantity)` pairs, best first.
    ///
    /// Missing depth is left unquoted. When the feed carries no timestamp
    /// the local clock is used.
    pub fn from_levels(
        contract_id: ContractId,
        timestamp: Option<DateTime<Utc>>,
        bids: &[(i64, i64)],
        asks: &[(i64, i64)],
    ) -> Result<Self> {
        if bids.len() > BOOK_DEPTH || asks.len() > BOOK_DEPTH {
            return Err(CoreError::InvalidBook(format!(
                "{} bid / {} ask levels exceeds depth {BOOK_DEPTH}",
                bids.len(),
                asks.len()
            )));
        }
        let mut snapshot = Self::empty(contract_id, timestamp.unwrap_or_else(Utc::now));
        for (slot, &(price, qty)) in snapshot.bids.iter_mut().zip(bids) {
            *slot = BookLevel::new(price, qty);
        }
        for (slot, &(price, qty)) in snapshot.asks.iter_mut().zip(asks) {
            *slot = BookLevel::new(price, qty);
        }
        Ok(snapshot)
    }

    /// Level on `side` at `depth` (0 = best). `None` beyond [`BOOK_DEPTH`].
    pub fn level(&self, side: OrderSide, depth: usize) -> Option<&BookLevel> {
        match side {
            OrderSide::Buy => self.bids.get(depth),
            OrderSide::Sell => self.asks.get(depth),
        }
    }

    /// Bid price at `depth`, `Price::ZERO` when out of range.
    pub fn bid_price(&self, depth: usize) -> Price {
        self.level(OrderSide::Buy, depth)
            .map(|l| l.price)
            .unwrap_or(Price::ZERO)
    }

    /// Ask price at `depth`, `Price::ZERO` when out of range.
    pub fn ask_price(&self, depth: usize) -> Price {
        self.level(OrderSide::Sell, depth)
            .map(|l| l.price)
            .unwrap_or(Price::ZERO)
    }

    /// (bid[0] + ask[0]) / 2. `None` unless both sides are quoted at the top.
    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.bids[0];
        let ask = self.asks[0];
        if !bid.is_quoted() || !ask.is_quoted() {
            return None;
        }
        Some((bid.price.to_decimal() + ask.price.to_decimal()) / Decimal::TWO)
    }
}
