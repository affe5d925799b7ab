//! Append-only, per-item stock ledger abstraction.

use std::sync::Arc;

use thiserror::Error;

use stocklog_core::{ItemId, StockState};

use crate::event::{StockChange, StockEvent};

/// Optimistic concurrency expectation for an item stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedSeq {
    /// Skip the check (migrations, backfills).
    Any,
    /// Require the stream head to be at an exact sequence number
    /// (0 = empty stream).
    Exact(u64),
}

impl ExpectedSeq {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedSeq::Any => true,
            ExpectedSeq::Exact(seq) => seq == actual,
        }
    }
}

/// The stream head: latest sequence number plus the cached derived state.
///
/// `sequence_number == 0` means the stream is empty and `state` is the zero
/// position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LedgerHead {
    pub sequence_number: u64,
    pub state: StockState,
}

impl LedgerHead {
    pub fn empty() -> Self {
        Self {
            sequence_number: 0,
            state: StockState::zero(),
        }
    }
}

/// Ledger storage error.
///
/// These are infrastructure failures (concurrency, storage, malformed
/// appends), distinct from domain precondition failures which never reach
/// the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("optimistic concurrency check failed: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Append-only stock ledger: the single shared mutable resource.
///
/// Streams are keyed by `ItemId` and carry monotonically increasing sequence
/// numbers (1, 2, 3, ...). Implementations must:
///
/// - make `append` atomic per item with respect to concurrent appends
/// - enforce the `ExpectedSeq` check against the current head
/// - assign sequence numbers with no gaps or duplicates
/// - return history in sequence order, identically on repeated calls
///
/// Any durable backend with per-item atomic append and ordered read-back
/// (relational table, log file, key-value store) can stand behind this trait.
/// Cross-item operations must not serialize against each other beyond
/// whatever short-lived internal locking the backend needs.
pub trait StockLedger: Send + Sync {
    /// Append one change to an item's stream, assigning the next sequence
    /// number. All-or-nothing: on any error the stream is untouched.
    fn append(
        &self,
        item_id: ItemId,
        change: StockChange,
        expected: ExpectedSeq,
    ) -> Result<StockEvent, LedgerError>;

    /// Forward-ordered events with `sequence_number > since_seq`.
    /// `since_seq = 0` returns the full stream. Restartable: events are
    /// immutable, so repeated calls with the same arguments yield the same
    /// sequence.
    fn history(&self, item_id: ItemId, since_seq: u64) -> Result<Vec<StockEvent>, LedgerError>;

    /// Current head of an item's stream, O(1) via the cached aggregate on
    /// the latest event. Empty head for items with no events.
    fn current(&self, item_id: ItemId) -> Result<LedgerHead, LedgerError>;
}

impl<L> StockLedger for Arc<L>
where
    L: StockLedger + ?Sized,
{
    fn append(
        &self,
        item_id: ItemId,
        change: StockChange,
        expected: ExpectedSeq,
    ) -> Result<StockEvent, LedgerError> {
        (**self).append(item_id, change, expected)
    }

    fn history(&self, item_id: ItemId, since_seq: u64) -> Result<Vec<StockEvent>, LedgerError> {
        (**self).history(item_id, since_seq)
    }

    fn current(&self, item_id: ItemId) -> Result<LedgerHead, LedgerError> {
        (**self).current(item_id)
    }
}
