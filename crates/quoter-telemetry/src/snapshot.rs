//! Per-cycle strategy snapshot record.
//!
//! One record is emitted after every completed market-data cycle and after
//! every routed confirmation. The record is plain data; how it is written
//! out is up to the [`SnapshotSink`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use quoter_core::{
    BookLevel, NetPosition, OrderIntentId, OrderSide, OrderStatus, Price, Qty, TradedTotals,
};

use crate::error::TelemetryResult;

/// What caused a record to be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTrigger {
    Startup,
    Cycle,
    Confirmation,
}

/// Live state of one order slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotRecord {
    pub side: OrderSide,
    pub index: usize,
    pub intent: Option<OrderIntentId>,
    pub status: OrderStatus,
    pub is_reset: bool,
    pub exchange_order_id: Option<u64>,
    pub last_quoted_price: Price,
    pub last_quantity: Qty,
    pub last_filled_quantity: Qty,
}

/// Desired order for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DesiredRecord {
    pub side: OrderSide,
    pub index: usize,
    pub price: Price,
    pub quantity: Qty,
}

/// Strategy snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleRecord {
    pub trigger: RecordTrigger,
    pub timestamp: DateTime<Utc>,
    pub contract: String,
    pub net_qty: Qty,
    pub gross_pnl: Decimal,
    pub net_pnl: Decimal,
    pub mid_price: Option<Decimal>,
    pub totals: TradedTotals,
    pub msg_sent_count: u64,
    pub max_position_lots: i64,
    pub pool_size: usize,
    pub slots: Vec<SlotRecord>,
    pub desired: Vec<DesiredRecord>,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl CycleRecord {
    /// P&L fields derived from position and mid. Without a mid, open
    /// inventory is marked at zero.
    pub fn pnl(position: &NetPosition, mid: Option<Decimal>) -> (Decimal, Decimal) {
        let gross = position.gross_pnl(mid.unwrap_or(Decimal::ZERO));
        // No fee model: net equals gross.
        (gross, gross)
    }

    /// Slot record lookup by side and index.
    pub fn slot(&self, side: OrderSide, index: usize) -> Option<&SlotRecord> {
        self.slots
            .iter()
            .find(|s| s.side == side && s.index == index)
    }

    pub fn to_json(&self) -> TelemetryResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Destination for snapshot records.
pub trait SnapshotSink {
    fn emit(&mut self, record: &CycleRecord);
}

/// Writes each record as one JSON line on the `quoter::snapshot` target.
#[derive(Debug, Default)]
pub struct TracingSnapshotSink;

impl SnapshotSink for TracingSnapshotSink {
    fn emit(&mut self, record: &CycleRecord) {
        match record.to_json() {
            Ok(json) => info!(target: "quoter::snapshot", trigger = ?record.trigger, "{json}"),
            Err(e) => warn!(error = %e, "Failed to serialize snapshot record"),
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotSink {
    records: Vec<CycleRecord>,
}

impl MemorySnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[CycleRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&CycleRecord> {
        self.records.last()
    }

    pub fn count(&self, trigger: RecordTrigger) -> usize {
        self.records.iter().filter(|r| r.trigger == trigger).count()
    }
}

impl SnapshotSink for MemorySnapshotSink {
    fn emit(&mut self, record: &CycleRecord) {
        self.records.push(record.clone());
    }
}
