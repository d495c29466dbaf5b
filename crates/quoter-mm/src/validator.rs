//! Book snapshot validation.
//!
//! A snapshot is usable only when the best `min_depth` levels on both sides
//! all carry a positive price. The check is the cycle gate: an unusable
//! snapshot short-circuits planning and reconciliation for that tick.

use quoter_core::{BookSnapshot, OrderSide, BOOK_DEPTH};
use std::fmt;

/// First unquoted level found by [`check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookDefect {
    pub side: OrderSide,
    pub depth: usize,
}

impl fmt::Display for BookDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            OrderSide::Buy => "bid",
            OrderSide::Sell => "ask",
        };
        write!(f, "{side} level {} has no price", self.depth)
    }
}

/// Returns true when the best `min_depth` levels on both sides are quoted.
///
/// The cycle gate in [`CycleOrchestrator`](crate::CycleOrchestrator) calls
/// [`check`] instead so the failing level can be logged.
#[inline]
pub fn is_valid(snapshot: &BookSnapshot, min_depth: usize) -> bool {
    check(snapshot, min_depth).is_ok()
}

/// Like [`is_valid`] but reports where the book failed.
///
/// Levels are scanned best-first, bid before ask at each depth.
pub fn check(snapshot: &BookSnapshot, min_depth: usize) -> Result<(), BookDefect> {
    let depth = min_depth.min(BOOK_DEPTH);
    for i in 0..depth {
        if !snapshot.bids[i].price.is_positive() {
            return Err(BookDefect {
                side: OrderSide::Buy,
                depth: i,
            });
        }
        if !snapshot.asks[i].price.is_positive() {
            return Err(BookDefect {
                side: OrderSide::Sell,
                depth: i,
            });
        }
    }
    Ok(())
}
