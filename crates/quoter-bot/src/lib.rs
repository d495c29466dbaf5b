//! Host application for the quoting strategy.
//!
//! Runs the decision core against a paper venue:
//! - TOML configuration and instrument lookup
//! - Channel-backed order handles
//! - Paper venue with fill ledger (position source)
//! - Book replay event loop

pub mod app;
pub mod config;
pub mod error;
pub mod instruments;
pub mod paper;
pub mod transport;

pub use app::{parse_book, Application, RunSummary};
pub use config::{AppConfig, InstrumentConfig, InstrumentEntry, PaperConfig, RuntimeConfig};
pub use error::{AppError, AppResult};
pub use instruments::InstrumentRegistry;
pub use paper::PaperVenue;
pub use transport::{ChannelOrderHandle, OrderRequest, PreTradeCheck};
