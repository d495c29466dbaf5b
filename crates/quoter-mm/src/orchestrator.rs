//! Tick-driven strategy controller.
//!
//! The orchestrator owns the slot pool, the desired table and the position
//! cache. The host delivers events one at a time:
//! - market data runs Validate -> Track -> Plan -> Reconcile -> Record
//! - confirmations are routed into the pool and recorded
//! - timer ticks log a heartbeat
//! - a terminate request latches the strategy into shutdown
//!
//! No error escapes an entry point. A collaborator failure inside one
//! becomes a terminate request carrying the error comment.

use std::fmt;
use std::time::Instant;

use chrono::Utc;
use quoter_core::{BookSnapshot, ContractId, OrderConfirmation, OrderSide, RiskStatus};
use quoter_telemetry::{CycleRecord, DesiredRecord, Metrics, RecordTrigger, SnapshotSink};
use tracing::{debug, error, info, warn};

use crate::config::{StrategyConfig, StrategyParams};
use crate::error::StartupError;
use crate::handle::OrderHandle;
use crate::planner::{DesiredTable, QuotePlanner};
use crate::position::{PositionSource, PositionTracker};
use crate::reconciler::OrderReconciler;
use crate::router::{ConfirmationRouter, RouteOutcome};
use crate::slot::{SlotId, SlotPool};
use crate::validator;

// ============================================================================
// Lifecycle
// ============================================================================

/// Strategy lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Initializing,
    Running,
    Terminating,
    Terminated,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Comment attached to a terminated strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyComment {
    /// Startup or run-time failure.
    ErrorState,
    /// Operator terminate command.
    TerminateCommand,
}

impl fmt::Display for StrategyComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ErrorState => f.write_str("STRATEGY_ERROR_STATE"),
            Self::TerminateCommand => f.write_str("TERMINATE_STRATEGY"),
        }
    }
}

impl StartupError {
    /// Comment reported when construction fails.
    pub fn comment(&self) -> StrategyComment {
        StrategyComment::ErrorState
    }
}

// ============================================================================
// Events
// ============================================================================

/// Instrument the strategy trades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentInfo {
    pub contract_id: ContractId,
    /// Composed display name.
    pub name: String,
    pub lot_size: i64,
}

/// Event delivered by the host.
#[derive(Debug, Clone)]
pub enum StrategyEvent {
    MarketData(BookSnapshot),
    Timer,
    Confirmation(OrderConfirmation),
    Terminate,
}

/// Result of one market-data event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Planned and reconciled; `sent` actions went out.
    Completed { sent: u32 },
    /// Book failed validation; nothing planned.
    InvalidBook,
    /// Snapshot for another contract.
    ForeignContract,
    /// Not running (before start or after terminate).
    NotRunning,
    /// A collaborator failed and termination was requested.
    Failed,
}

impl CycleOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::InvalidBook => "invalid_book",
            Self::ForeignContract => "foreign_contract",
            Self::NotRunning => "not_running",
            Self::Failed => "failed",
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Single-instrument quoting strategy.
pub struct CycleOrchestrator<H, S> {
    config: StrategyConfig,
    instrument: InstrumentInfo,
    lifecycle: Lifecycle,
    comment: Option<StrategyComment>,
    tracker: PositionTracker,
    planner: QuotePlanner,
    desired: DesiredTable,
    slots: SlotPool<H>,
    reconciler: OrderReconciler,
    risk: RiskStatus,
    last_book: Option<BookSnapshot>,
    sink: S,
    cycles: u64,
}

impl<H: OrderHandle, S: SnapshotSink> CycleOrchestrator<H, S> {
    /// Validate parameters and allocate the slot pool.
    pub fn try_new(
        params: &StrategyParams,
        instrument: InstrumentInfo,
        make_handle: impl FnMut(SlotId) -> H,
        sink: S,
    ) -> Result<Self, StartupError> {
        let config = StrategyConfig::new(params, instrument.lot_size)?;
        if !config.has_square_off_slot() {
            warn!(
                pool_size = config.pool_size(),
                "Single-slot pool: square-off role disabled"
            );
        }

        let slots = SlotPool::new(config.pool_size(), make_handle);
        info!(
            instrument = %instrument.name,
            contract = %instrument.contract_id,
            lot_size = config.lot_size(),
            cap = %config.inventory_cap(),
            min_price_diff = config.min_price_diff(),
            min_valid_depth = config.min_valid_depth(),
            placed_depth = config.placed_depth(),
            pool_size = config.pool_size(),
            "Strategy initialized"
        );

        Ok(Self {
            tracker: PositionTracker::new(instrument.contract_id),
            planner: QuotePlanner::new(config.placed_depth()),
            desired: DesiredTable::new(config.pool_size()),
            reconciler: OrderReconciler::new(config.min_price_diff()),
            lifecycle: Lifecycle::Initializing,
            comment: None,
            risk: RiskStatus::default(),
            last_book: None,
            cycles: 0,
            config,
            instrument,
            slots,
            sink,
        })
    }

    /// Initializing -> Running. Returns false from any other state.
    pub fn start(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Initializing {
            return false;
        }
        self.lifecycle = Lifecycle::Running;
        info!(instrument = %self.instrument.name, "Strategy running");
        self.record(RecordTrigger::Startup);
        true
    }

    /// Dispatch one host event. Returns the lifecycle afterwards.
    pub fn handle_event<P>(&mut self, event: StrategyEvent, positions: &P) -> Lifecycle
    where
        P: PositionSource + ?Sized,
    {
        match event {
            StrategyEvent::MarketData(book) => {
                self.on_market_data(book, positions);
            }
            StrategyEvent::Timer => self.on_timer(),
            StrategyEvent::Confirmation(conf) => {
                self.on_confirmation(&conf);
            }
            StrategyEvent::Terminate => {
                self.request_terminate(StrategyComment::TerminateCommand);
            }
        }
        self.lifecycle
    }

    /// Run one decision cycle for a book snapshot.
    pub fn on_market_data<P>(&mut self, book: BookSnapshot, positions: &P) -> CycleOutcome
    where
        P: PositionSource + ?Sized,
    {
        let outcome = self.run_cycle(book, positions);
        Metrics::cycle(outcome.label());
        outcome
    }

    fn run_cycle<P>(&mut self, book: BookSnapshot, positions: &P) -> CycleOutcome
    where
        P: PositionSource + ?Sized,
    {
        if self.lifecycle != Lifecycle::Running {
            return CycleOutcome::NotRunning;
        }
        if book.contract_id != self.instrument.contract_id {
            debug!(contract = %book.contract_id, "Ignoring snapshot for other contract");
            return CycleOutcome::ForeignContract;
        }
        let started = Instant::now();

        if let Err(defect) = validator::check(&book, self.config.min_valid_depth()) {
            // Nothing stale may be acted on later.
            self.desired.reset();
            warn!(
                contract = %book.contract_id,
                defect = %defect,
                "Invalid book, cycle skipped"
            );
            return CycleOutcome::InvalidBook;
        }

        let position = match self.tracker.update(positions, self.instrument.contract_id) {
            Ok(position) => position,
            Err(e) => {
                error!(error = %e, "Position read failed");
                self.request_terminate(StrategyComment::ErrorState);
                return CycleOutcome::Failed;
            }
        };
        Metrics::net_position(position.net_qty.inner());

        self.planner.plan_into(
            &position,
            self.config.inventory_cap(),
            &book,
            &mut self.desired,
        );
        let summary = self
            .reconciler
            .reconcile(&self.desired, &mut self.slots, &mut self.risk);

        if self.config.tick_to_order_latency() {
            let latency_us = started.elapsed().as_secs_f64() * 1_000_000.0;
            Metrics::tick_to_order(latency_us);
            info!(latency_us, sent = summary.sent, "Tick to order");
        }

        self.cycles += 1;
        self.last_book = Some(book);
        self.record(RecordTrigger::Cycle);
        CycleOutcome::Completed { sent: summary.sent }
    }

    /// Route a confirmation. Returns whether a slot applied it.
    pub fn on_confirmation(&mut self, confirmation: &OrderConfirmation) -> bool {
        if self.is_latched() {
            debug!(intent = %confirmation.intent, "Confirmation after terminate ignored");
            return false;
        }
        let outcome = ConfirmationRouter::route(confirmation, &mut self.slots);
        if !matches!(outcome, RouteOutcome::Unroutable) {
            self.record(RecordTrigger::Confirmation);
        }
        outcome.is_applied()
    }

    /// Heartbeat; the host re-arms the timer.
    pub fn on_timer(&mut self) {
        if self.is_latched() {
            return;
        }
        info!(
            lifecycle = %self.lifecycle,
            msg_sent_count = self.reconciler.msg_sent_count(),
            cycles = self.cycles,
            active_slots = self.slots.active_count(),
            net = %self.tracker.last().net_qty,
            "Timer"
        );
    }

    /// Latch termination. Returns false if already requested.
    ///
    /// Open orders are left to the handle layer.
    pub fn request_terminate(&mut self, comment: StrategyComment) -> bool {
        if self.is_latched() {
            return false;
        }
        self.comment = Some(comment);
        self.lifecycle = Lifecycle::Terminating;
        match comment {
            StrategyComment::ErrorState => {
                error!(comment = %comment, "Strategy terminating")
            }
            StrategyComment::TerminateCommand => {
                info!(comment = %comment, "Strategy terminating")
            }
        }
        true
    }

    /// Terminating -> Terminated, once the host has stopped dispatching.
    pub fn finish(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Terminating {
            return false;
        }
        self.lifecycle = Lifecycle::Terminated;
        info!(
            msg_sent_count = self.reconciler.msg_sent_count(),
            cycles = self.cycles,
            "Strategy terminated"
        );
        true
    }

    fn is_latched(&self) -> bool {
        matches!(
            self.lifecycle,
            Lifecycle::Terminating | Lifecycle::Terminated
        )
    }

    fn record(&mut self, trigger: RecordTrigger) {
        let position = *self.tracker.last();
        let mid = self.last_book.as_ref().and_then(BookSnapshot::mid_price);
        let (gross_pnl, net_pnl) = CycleRecord::pnl(&position, mid);

        let desired = OrderSide::ALL
            .iter()
            .flat_map(|&side| {
                self.desired
                    .side(side)
                    .iter()
                    .enumerate()
                    .map(move |(index, d)| DesiredRecord {
                        side,
                        index,
                        price: d.price,
                        quantity: d.quantity,
                    })
            })
            .collect();

        let (timestamp, bids, asks) = match &self.last_book {
            Some(book) => (book.timestamp, book.bids.to_vec(), book.asks.to_vec()),
            None => (Utc::now(), Vec::new(), Vec::new()),
        };

        let record = CycleRecord {
            trigger,
            timestamp,
            contract: self.instrument.name.clone(),
            net_qty: position.net_qty,
            gross_pnl,
            net_pnl,
            mid_price: mid,
            totals: position.totals,
            msg_sent_count: self.reconciler.msg_sent_count(),
            max_position_lots: self.config.max_position_lots(),
            pool_size: self.config.pool_size(),
            slots: self.slots.records(),
            desired,
            bids,
            asks,
        };
        self.sink.emit(&record);
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn comment(&self) -> Option<StrategyComment> {
        self.comment
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn instrument(&self) -> &InstrumentInfo {
        &self.instrument
    }

    pub fn desired(&self) -> &DesiredTable {
        &self.desired
    }

    pub fn slots(&self) -> &SlotPool<H> {
        &self.slots
    }

    pub fn msg_sent_count(&self) -> u64 {
        self.reconciler.msg_sent_count()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
