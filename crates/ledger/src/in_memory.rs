use std::collections::HashMap;
use std::sync::RwLock;

use tracing::trace;

use stocklog_core::{EventId, ItemId};

use crate::event::{apply_delta, EventKind, StockChange, StockEvent};
use crate::store::{ExpectedSeq, LedgerError, LedgerHead, StockLedger};

/// In-memory append-only stock ledger.
///
/// Check-and-append happens under the write lock, which makes each append
/// atomic per item and linearizes the stream: sequence order is a valid
/// serialization of the concurrent calls that produced it.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    streams: RwLock<HashMap<ItemId, Vec<StockEvent>>>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn head_of(stream: &[StockEvent]) -> LedgerHead {
        stream
            .last()
            .map(|e| LedgerHead {
                sequence_number: e.sequence_number,
                state: e.resulting_state(),
            })
            .unwrap_or_else(LedgerHead::empty)
    }

    /// Structural checks on a change before it is admitted to a stream.
    ///
    /// The engine computes `resulting` from the fold it validated against;
    /// re-deriving it here catches writers whose cached state drifted.
    fn validate_change(change: &StockChange, head: &LedgerHead) -> Result<(), LedgerError> {
        if change.delta == 0 {
            return Err(LedgerError::InvalidAppend("delta cannot be zero".to_string()));
        }

        if change.resulting.reserved > change.resulting.on_hand {
            return Err(LedgerError::InvalidAppend(format!(
                "resulting reserved ({}) exceeds resulting on_hand ({})",
                change.resulting.reserved, change.resulting.on_hand
            )));
        }

        let expected_sign_ok = match change.kind {
            EventKind::Receive | EventKind::Reserve => change.delta > 0,
            EventKind::Commit | EventKind::Release => change.delta < 0,
            EventKind::Adjust => true,
        };
        if !expected_sign_ok {
            return Err(LedgerError::InvalidAppend(format!(
                "{:?} delta has the wrong sign: {}",
                change.kind, change.delta
            )));
        }

        if apply_delta(change.kind, change.delta, head.state) != change.resulting {
            return Err(LedgerError::InvalidAppend(format!(
                "resulting state {:?} does not follow from head {:?} and delta {}",
                change.resulting, head.state, change.delta
            )));
        }

        Ok(())
    }
}

impl StockLedger for InMemoryStockLedger {
    fn append(
        &self,
        item_id: ItemId,
        change: StockChange,
        expected: ExpectedSeq,
    ) -> Result<StockEvent, LedgerError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;

        let stream = streams.entry(item_id).or_default();
        let head = Self::head_of(stream);

        if !expected.matches(head.sequence_number) {
            let expected = match expected {
                ExpectedSeq::Exact(seq) => seq,
                // Unreachable: Any always matches.
                ExpectedSeq::Any => head.sequence_number,
            };
            return Err(LedgerError::Conflict {
                expected,
                actual: head.sequence_number,
            });
        }

        Self::validate_change(&change, &head)?;

        let stored = StockEvent {
            event_id: EventId::new(),
            item_id,
            sequence_number: head.sequence_number + 1,
            kind: change.kind,
            delta: change.delta,
            reference: change.reference,
            occurred_at: change.occurred_at,
            resulting_on_hand: change.resulting.on_hand,
            resulting_reserved: change.resulting.reserved,
        };

        stream.push(stored.clone());
        trace!(
            item_id = %item_id,
            sequence_number = stored.sequence_number,
            event_type = stored.event_type(),
            "event appended"
        );
        Ok(stored)
    }

    fn history(&self, item_id: ItemId, since_seq: u64) -> Result<Vec<StockEvent>, LedgerError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;

        Ok(streams
            .get(&item_id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|e| e.sequence_number > since_seq)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn current(&self, item_id: ItemId) -> Result<LedgerHead, LedgerError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;

        Ok(streams
            .get(&item_id)
            .map(|stream| Self::head_of(stream))
            .unwrap_or_else(LedgerHead::empty))
    }
}
