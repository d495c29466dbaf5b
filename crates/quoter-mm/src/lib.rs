//! Decision core of the single-instrument quoting strategy.
//!
//! Keeps a small pool of limit orders on both sides of one instrument:
//! - Book validation gating every cycle
//! - Net position tracking from a position service
//! - Desired-order planning (inventory build + square-off)
//! - Reconciliation of desired against live orders (new/replace/cancel)
//! - Confirmation routing by order-intent id
//!
//! # Architecture
//!
//! ```text
//! BookSnapshot → CycleOrchestrator.on_market_data()
//!                 ├─ validator: top-N levels quoted?
//!                 ├─ PositionTracker: net = buys - sells
//!                 ├─ QuotePlanner: fill DesiredTable
//!                 └─ OrderReconciler: SlotPool ⇄ OrderHandle
//!                      ↓
//!                 SnapshotSink (CycleRecord)
//!
//! OrderConfirmation → ConfirmationRouter → OrderSlot → OrderHandle
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod orchestrator;
pub mod planner;
pub mod position;
pub mod reconciler;
pub mod router;
pub mod slot;
pub mod validator;

pub use config::{StrategyConfig, StrategyParams, MAX_POOL_SIZE};
pub use error::{ConfigError, PositionError, StartupError};
pub use handle::{
    HandleCall, HandleState, LocalOrderState, MockOrderHandle, MockScript, OrderHandle,
};
pub use orchestrator::{
    CycleOrchestrator, CycleOutcome, InstrumentInfo, Lifecycle, StrategyComment, StrategyEvent,
};
pub use planner::{
    build_quantities, DesiredOrder, DesiredTable, QuotePlanner, BUILD_SLOT, SQUARE_OFF_SLOT,
};
pub use position::{FillLedger, PositionSource, PositionTracker};
pub use reconciler::{decide, OrderReconciler, ReconcileSummary, SlotAction};
pub use router::{ConfirmationRouter, RouteOutcome};
pub use slot::{OrderSlot, SlotId, SlotPool};
pub use validator::BookDefect;
