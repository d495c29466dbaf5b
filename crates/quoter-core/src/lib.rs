//! Core domain types for the quoting strategy.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Price`, `Qty`: integer tick/unit newtypes
//! - `BookSnapshot`: fixed-depth two-sided book
//! - `NetPosition`: net inventory derived from traded totals
//! - `OrderConfirmation`, `OrderStatus`: order lifecycle types
//! - `OrderIntentId`: stable routing identity for confirmations

pub mod book;
pub mod error;
pub mod execution;
pub mod order;
pub mod position;
pub mod units;

pub use book::{BookLevel, BookSnapshot, ContractId, BOOK_DEPTH};
pub use error::{CoreError, Result};
pub use execution::{ConfirmationKind, OrderConfirmation, OrderStatus, RiskStatus};
pub use order::{IntentSequence, OrderIntentId, OrderSide};
pub use position::{NetPosition, TradedTotals};
pub use units::{Price, Qty};
