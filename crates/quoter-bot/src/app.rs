//! Main application orchestration.
//!
//! Wires the strategy to the paper venue and replays a recorded book file:
//! - Instrument resolution and replay subscription at construction
//! - One channel order handle per slot
//! - Event loop interleaving books, timer ticks and Ctrl-C
//! - Venue acknowledgements and fills routed back as confirmations

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quoter_core::{BookSnapshot, ContractId, OrderConfirmation, Qty};
use quoter_mm::{CycleOrchestrator, Lifecycle, StartupError, StrategyComment, StrategyEvent};
use quoter_telemetry::{SnapshotSink, TracingSnapshotSink};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::instruments::InstrumentRegistry;
use crate::paper::PaperVenue;
use crate::transport::{ChannelOrderHandle, OrderRequest, PreTradeCheck};

/// One line of the replay file.
#[derive(Debug, Deserialize)]
struct BookLine {
    contract_id: i64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    bids: Vec<(i64, i64)>,
    asks: Vec<(i64, i64)>,
}

/// Parse one replay line into a snapshot.
pub fn parse_book(line: &str) -> AppResult<BookSnapshot> {
    let raw: BookLine =
        serde_json::from_str(line).map_err(|e| AppError::Replay(e.to_string()))?;
    BookSnapshot::from_levels(
        ContractId::new(raw.contract_id),
        raw.timestamp,
        &raw.bids,
        &raw.asks,
    )
    .map_err(|e| AppError::Replay(e.to_string()))
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub books: u64,
    pub skipped_lines: u64,
    pub cycles: u64,
    pub msg_sent_count: u64,
    pub fills: u64,
    pub net_qty: Qty,
    pub lifecycle: Lifecycle,
    pub comment: Option<StrategyComment>,
}

/// Main application.
pub struct Application<S = TracingSnapshotSink> {
    config: AppConfig,
    contract: ContractId,
    orchestrator: CycleOrchestrator<ChannelOrderHandle, S>,
    venue: PaperVenue,
    requests: mpsc::UnboundedReceiver<OrderRequest>,
    replay: Option<std::fs::File>,
    pending: VecDeque<OrderConfirmation>,
    books: u64,
    skipped_lines: u64,
}

impl Application<TracingSnapshotSink> {
    /// Create the application, logging snapshots through tracing.
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        Self::with_sink(config, TracingSnapshotSink)
    }
}

impl<S: SnapshotSink> Application<S> {
    /// Resolve the instrument, open the replay and build the strategy.
    pub fn with_sink(config: AppConfig, sink: S) -> Result<Self, StartupError> {
        let registry = InstrumentRegistry::new(&config.paper.instruments);
        let instrument = registry.resolve(&config.instrument)?;

        let replay = std::fs::File::open(&config.paper.replay_file).map_err(|e| {
            StartupError::SubscriptionFailed(format!(
                "{}: {e}",
                config.paper.replay_file.display()
            ))
        })?;

        let (tx, requests) = mpsc::unbounded_channel();
        let limits = PreTradeCheck {
            max_order_qty: config.paper.max_order_qty.map(Qty::new),
        };
        let contract = instrument.contract_id;
        let orchestrator = CycleOrchestrator::try_new(
            &config.strategy,
            instrument,
            |id| ChannelOrderHandle::new(contract, id.side, limits, tx.clone()),
            sink,
        )?;

        info!(
            replay = %config.paper.replay_file.display(),
            instruments = registry.len(),
            "Application created"
        );

        Ok(Self {
            config,
            contract,
            orchestrator,
            venue: PaperVenue::new(),
            requests,
            replay: Some(replay),
            pending: VecDeque::new(),
            books: 0,
            skipped_lines: 0,
        })
    }

    /// Replay the book file until it ends, Ctrl-C, or the strategy
    /// terminates on its own.
    pub async fn run(&mut self) -> AppResult<RunSummary> {
        let Some(file) = self.replay.take() else {
            return Ok(self.summary());
        };
        let mut lines = BufReader::new(tokio::fs::File::from_std(file)).lines();

        self.orchestrator.start();

        let period = Duration::from_millis(self.config.app.timer_interval_ms.max(1));
        let mut timer = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        let pace = Duration::from_millis(self.config.paper.replay_interval_ms);

        while self.orchestrator.lifecycle() == Lifecycle::Running {
            tokio::select! {
                line = next_line(&mut lines, pace) => {
                    match line? {
                        Some(line) => self.on_line(&line),
                        None => {
                            info!(books = self.books, "Replay finished");
                            self.dispatch(StrategyEvent::Terminate);
                        }
                    }
                }

                _ = timer.tick() => {
                    self.dispatch(StrategyEvent::Timer);
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    self.dispatch(StrategyEvent::Terminate);
                }
            }
        }

        self.orchestrator.finish();
        let summary = self.summary();
        info!(
            books = summary.books,
            cycles = summary.cycles,
            msg_sent_count = summary.msg_sent_count,
            fills = summary.fills,
            net = %summary.net_qty,
            "Run complete"
        );
        Ok(summary)
    }

    fn on_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let book = match parse_book(line) {
            Ok(book) => book,
            Err(e) => {
                warn!(error = %e, "Skipping malformed replay line");
                self.skipped_lines += 1;
                return;
            }
        };
        self.books += 1;

        // Fills reach the strategy before the tick that caused them.
        let fills = self.venue.on_book(&book);
        self.pending.extend(fills);
        self.deliver_confirmations();

        self.dispatch(StrategyEvent::MarketData(book));
        self.pump_requests();
        self.deliver_confirmations();
    }

    fn dispatch(&mut self, event: StrategyEvent) {
        self.orchestrator.handle_event(event, self.venue.ledger());
    }

    /// Hand every queued request to the venue.
    fn pump_requests(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            debug!(intent = %request.intent(), "Venue request");
            let confirmation = self.venue.on_request(request);
            self.pending.push_back(confirmation);
        }
    }

    fn deliver_confirmations(&mut self) {
        while let Some(confirmation) = self.pending.pop_front() {
            self.dispatch(StrategyEvent::Confirmation(confirmation));
        }
    }

    pub fn summary(&self) -> RunSummary {
        let ledger = self.venue.ledger();
        RunSummary {
            books: self.books,
            skipped_lines: self.skipped_lines,
            cycles: self.orchestrator.cycles(),
            msg_sent_count: self.orchestrator.msg_sent_count(),
            fills: ledger.fill_count(),
            net_qty: ledger.net_qty(self.contract),
            lifecycle: self.orchestrator.lifecycle(),
            comment: self.orchestrator.comment(),
        }
    }

    pub fn orchestrator(&self) -> &CycleOrchestrator<ChannelOrderHandle, S> {
        &self.orchestrator
    }

    pub fn venue(&self) -> &PaperVenue {
        &self.venue
    }
}

/// Next replay line, optionally paced.
async fn next_line<R>(lines: &mut Lines<R>, pace: Duration) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    if !pace.is_zero() {
        tokio::time::sleep(pace).await;
    }
    lines.next_line().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_book_line() {
        let book = parse_book(
            r#"{"contract_id": 7, "timestamp": "2021-04-29T09:15:00Z", "bids": [[100, 5], [99, 3]], "asks": [[101, 4]]}"#,
        )
        .unwrap();
        assert_eq!(book.contract_id, ContractId::new(7));
        assert_eq!(book.bid_price(1).inner(), 99);
        assert_eq!(book.ask_price(0).inner(), 101);
        assert!(!book.asks[1].is_quoted());
        assert_eq!(book.timestamp.to_rfc3339(), "2021-04-29T09:15:00+00:00");
    }

    #[test]
    fn test_parse_book_without_timestamp_uses_clock() {
        let before = Utc::now();
        let book = parse_book(r#"{"contract_id": 7, "bids": [], "asks": []}"#).unwrap();
        assert!(book.timestamp >= before);
    }

    #[test]
    fn test_parse_book_rejects_garbage() {
        assert!(matches!(parse_book("not json"), Err(AppError::Replay(_))));

        let too_deep: Vec<(i64, i64)> = (0..21).map(|i| (100 - i, 1)).collect();
        let line = serde_json::json!({
            "contract_id": 7,
            "bids": too_deep,
            "asks": [],
        })
        .to_string();
        assert!(matches!(parse_book(&line), Err(AppError::Replay(_))));
    }
}
