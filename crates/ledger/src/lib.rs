//! `stocklog-ledger` — append-only stock ledger.
//!
//! The ledger is the authoritative record of quantity-affecting events, one
//! totally ordered stream per item. This crate holds the event model, the
//! `StockLedger` storage abstraction, and the in-memory implementation used
//! for tests/dev; durable backends plug in behind the same trait.

pub mod event;
pub mod in_memory;
pub mod store;

pub use event::{apply_delta, fold_stream, EventKind, StockChange, StockEvent};
pub use in_memory::InMemoryStockLedger;
pub use store::{ExpectedSeq, LedgerError, LedgerHead, StockLedger};
