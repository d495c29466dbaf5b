//! Prometheus metrics, structured logging and strategy snapshots.
//!
//! - Prometheus metrics for order actions, cycles and confirmations
//! - Structured logging with tracing (pretty or JSON)
//! - Per-cycle snapshot records and their sinks

pub mod error;
pub mod logging;
pub mod metrics;
pub mod snapshot;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use snapshot::{
    CycleRecord, DesiredRecord, MemorySnapshotSink, RecordTrigger, SlotRecord, SnapshotSink,
    TracingSnapshotSink,
};
