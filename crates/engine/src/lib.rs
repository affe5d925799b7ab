//! `stocklog-engine` — stock mutation engine and read side.
//!
//! The engine is the only writer to the stock ledger: it validates each
//! operation against catalog and current ledger state, appends exactly one
//! event per successful operation, and emits low-stock alerts through the
//! outbound observer interface. The query service is the matching read-only
//! surface for surrounding request-handling layers.

pub mod engine;
pub mod observer;
pub mod query;


pub use engine::StockMutationEngine;
pub use observer::{
    ChannelLowStockNotifier, LowStockAlert, LowStockObserver, NoopLowStockObserver, NotifyError,
    Subscription,
};
pub use query::QueryService;
