//! Order-related types and identifiers.
//!
//! Provides order side and the order-intent identifier used to route
//! confirmations back to the slot that issued the order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Both sides, buy first. Slot scans always follow this order.
    pub const ALL: [OrderSide; 2] = [OrderSide::Buy, OrderSide::Sell];

    /// Upper-case label used in snapshot records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Stable identifier of one order intent.
///
/// Assigned when a slot sends a new order and carried on every request
/// and confirmation for that order until the slot is reset. Never reused
/// within a run, so a late confirmation for an old order cannot match a
/// slot that has since moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderIntentId(u64);

impl OrderIntentId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for OrderIntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intent-{}", self.0)
    }
}

/// Monotonic source of [`OrderIntentId`]s. Starts at 1.
#[derive(Debug, Default)]
pub struct IntentSequence {
    last: u64,
}

impl IntentSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier.
    pub fn next_id(&mut self) -> OrderIntentId {
        self.last += 1;
        OrderIntentId(self.last)
    }

    /// Last identifier handed out, if any.
    pub fn last(&self) -> Option<OrderIntentId> {
        (self.last > 0).then_some(OrderIntentId(self.last))
    }
}
