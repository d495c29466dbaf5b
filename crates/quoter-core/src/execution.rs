//! Execution-related types for order lifecycle management.
//!
//! This module provides types for:
//! - Per-order lifecycle status as mirrored by a slot
//! - Exchange confirmations and their kinds
//! - Pre-trade risk status written by order handles

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::book::ContractId;
use crate::order::{OrderIntentId, OrderSide};
use crate::{Price, Qty};

// ============================================================================
// Order Status
// ============================================================================

/// Lifecycle status of the order carried by one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// No live order.
    #[default]
    Reset,
    /// New order sent, not yet acknowledged.
    PendingNew,
    /// Acknowledged and resting.
    Live,
    /// Replace sent, not yet acknowledged.
    PendingReplace,
    /// Cancel sent, not yet acknowledged.
    PendingCancel,
}

impl OrderStatus {
    /// Returns true while a request is awaiting its acknowledgement.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::PendingNew | Self::PendingReplace | Self::PendingCancel
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => write!(f, "reset"),
            Self::PendingNew => write!(f, "pending_new"),
            Self::Live => write!(f, "live"),
            Self::PendingReplace => write!(f, "pending_replace"),
            Self::PendingCancel => write!(f, "pending_cancel"),
        }
    }
}

// ============================================================================
// Confirmations
// ============================================================================

/// Kind of exchange notification for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    /// New order accepted and resting.
    Confirmed,
    /// New order rejected.
    NewRejected,
    /// Immediate-or-cancel remainder cancelled by the exchange.
    IocCanceled,
    /// Partially filled, remainder still resting.
    PartialFill,
    /// Completely filled.
    Filled,
    /// Cancel acknowledged.
    Canceled,
    /// Replace acknowledged.
    Replaced,
    /// Replace rejected, previous terms still resting.
    ReplaceRejected,
    /// Cancel rejected, order still resting.
    CancelRejected,
}

impl ConfirmationKind {
    /// Returns true if this notification carries a fill.
    #[must_use]
    pub fn is_fill(&self) -> bool {
        matches!(self, Self::PartialFill | Self::Filled)
    }

    /// Returns true if the order no longer rests after this notification.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NewRejected | Self::IocCanceled | Self::Filled | Self::Canceled
        )
    }
}

impl fmt::Display for ConfirmationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Confirmed => "confirmed",
            Self::NewRejected => "new_rejected",
            Self::IocCanceled => "ioc_canceled",
            Self::PartialFill => "partial_fill",
            Self::Filled => "filled",
            Self::Canceled => "canceled",
            Self::Replaced => "replaced",
            Self::ReplaceRejected => "replace_rejected",
            Self::CancelRejected => "cancel_rejected",
        };
        f.write_str(s)
    }
}

/// Exchange notification for one order.
///
/// `open_qty` is the quantity the exchange still holds for the order
/// after this event; `order_price` is its current limit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    /// Intent the order was sent under.
    pub intent: OrderIntentId,
    pub contract_id: ContractId,
    pub side: OrderSide,
    pub kind: ConfirmationKind,
    /// Exchange-assigned order id, once known.
    pub exchange_order_id: Option<u64>,
    pub order_price: Price,
    pub open_qty: Qty,
    pub last_fill_price: Price,
    pub last_fill_qty: Qty,
}

impl OrderConfirmation {
    /// Create a confirmation with no order terms or fill attached.
    #[must_use]
    pub fn new(
        intent: OrderIntentId,
        contract_id: ContractId,
        side: OrderSide,
        kind: ConfirmationKind,
    ) -> Self {
        Self {
            intent,
            contract_id,
            side,
            kind,
            exchange_order_id: None,
            order_price: Price::ZERO,
            open_qty: Qty::ZERO,
            last_fill_price: Price::ZERO,
            last_fill_qty: Qty::ZERO,
        }
    }

    #[must_use]
    pub fn with_order(mut self, price: Price, open_qty: Qty) -> Self {
        self.order_price = price;
        self.open_qty = open_qty;
        self
    }

    #[must_use]
    pub fn with_fill(mut self, price: Price, qty: Qty) -> Self {
        self.last_fill_price = price;
        self.last_fill_qty = qty;
        self
    }

    #[must_use]
    pub fn with_exchange_id(mut self, id: u64) -> Self {
        self.exchange_order_id = Some(id);
        self
    }
}

// ============================================================================
// Risk Status
// ============================================================================

/// Outcome of the order handle's pre-trade risk check for the last request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiskStatus {
    #[default]
    Clear,
    Rejected { reason: String },
}

impl RiskStatus {
    #[must_use]
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }

    pub fn reject(&mut self, reason: impl Into<String>) {
        *self = Self::Rejected {
            reason: reason.into(),
        };
    }

    pub fn clear(&mut self) {
        *self = Self::Clear;
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "clear"),
            Self::Rejected { reason } => write!(f, "rejected: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_kinds() {
        assert!(ConfirmationKind::Filled.is_terminal());
        assert!(ConfirmationKind::Canceled.is_terminal());
        assert!(ConfirmationKind::NewRejected.is_terminal());
        assert!(!ConfirmationKind::PartialFill.is_terminal());
        assert!(!ConfirmationKind::CancelRejected.is_terminal());
    }

    #[test]
    fn test_in_flight_status() {
        assert!(OrderStatus::PendingNew.is_in_flight());
        assert!(OrderStatus::PendingCancel.is_in_flight());
        assert!(!OrderStatus::Live.is_in_flight());
        assert!(!OrderStatus::Reset.is_in_flight());
    }

    #[test]
    fn test_confirmation_builder() {
        let conf = OrderConfirmation::new(
            OrderIntentId::new(3),
            ContractId::new(9),
            OrderSide::Buy,
            ConfirmationKind::PartialFill,
        )
        .with_order(Price::new(99), Qty::new(60))
        .with_fill(Price::new(99), Qty::new(40))
        .with_exchange_id(1001);

        assert_eq!(conf.open_qty, Qty::new(60));
        assert_eq!(conf.last_fill_qty, Qty::new(40));
        assert_eq!(conf.exchange_order_id, Some(1001));
        assert!(conf.kind.is_fill());
    }

    #[test]
    fn test_risk_status_roundtrip() {
        let mut risk = RiskStatus::default();
        assert!(risk.is_clear());
        risk.reject("max order value");
        assert_eq!(risk.to_string(), "rejected: max order value");
        risk.clear();
        assert!(risk.is_clear());
    }
}
