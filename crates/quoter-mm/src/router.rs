//! Confirmation routing.
//!
//! Confirmations are matched to slots by order-intent id. A slot whose
//! order no longer rests after the confirmation is reset so the next cycle
//! can place a fresh order in it.

use quoter_core::OrderConfirmation;
use quoter_telemetry::Metrics;
use tracing::{debug, warn};

use crate::handle::OrderHandle;
use crate::slot::{SlotId, SlotPool};

/// Result of routing one confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Applied to the slot; `released` when the slot was reset afterwards.
    Applied { slot: SlotId, released: bool },
    /// Matched a slot but the handle did not apply it.
    Rejected { slot: SlotId },
    /// No slot carries the intent.
    Unroutable,
}

impl RouteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Rejected { .. } => "rejected",
            Self::Unroutable => "unroutable",
        }
    }
}

/// Routes confirmations into the slot pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfirmationRouter;

impl ConfirmationRouter {
    pub fn route<H: OrderHandle>(
        confirmation: &OrderConfirmation,
        pool: &mut SlotPool<H>,
    ) -> RouteOutcome {
        let outcome = match pool.find_by_intent_mut(confirmation.intent) {
            None => {
                warn!(
                    intent = %confirmation.intent,
                    kind = %confirmation.kind,
                    side = %confirmation.side,
                    "Unroutable confirmation discarded"
                );
                RouteOutcome::Unroutable
            }
            Some(slot) => {
                let id = slot.id();
                let applied = slot.apply(confirmation);
                let released = !slot.is_reset() && slot.live_quantity().is_zero();
                if released {
                    slot.reset();
                }
                debug!(
                    slot = %id,
                    intent = %confirmation.intent,
                    kind = %confirmation.kind,
                    applied,
                    released,
                    "Confirmation routed"
                );
                if applied {
                    RouteOutcome::Applied { slot: id, released }
                } else {
                    RouteOutcome::Rejected { slot: id }
                }
            }
        };
        Metrics::confirmation(outcome.label());
        outcome
    }
}
