//! Stock mutation engine: the sole write path into the ledger.
//!
//! Every operation is one validate-then-append cycle:
//!
//! ```text
//! Operation
//!   ↓
//! 1. Resolve item from the catalog (must exist and be active)
//!   ↓
//! 2. Read the ledger head (current state + sequence number)
//!   ↓
//! 3. Check the operation's precondition, compute the resulting state
//!   ↓
//! 4. Append one event conditioned on the head sequence being unchanged
//!   ↓
//! 5. On conflict, retry the whole cycle (bounded); on success, emit a
//!    low-stock alert when on-hand fell to or below the reorder threshold
//! ```
//!
//! No partial application: either exactly one event is appended or the
//! ledger is untouched. Concurrency control is optimistic and scoped per
//! item; operations on different items never invalidate one another.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use stocklog_catalog::{Item, ItemCatalog};
use stocklog_core::{InventoryError, InventoryResult, ItemId, Reference, StockState};
use stocklog_ledger::{EventKind, ExpectedSeq, LedgerError, StockChange, StockEvent, StockLedger};

use crate::observer::{LowStockAlert, LowStockObserver};

/// Validate-then-append attempts before a lost race is surfaced to the
/// caller as `ConcurrencyConflict`.
const MAX_APPEND_ATTEMPTS: u32 = 5;

/// One of the five quantity-affecting operations, pre-validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Operation {
    Receive(u64),
    Reserve(u64),
    Commit(u64),
    Release(u64),
    Adjust(i64),
}

impl Operation {
    fn kind(self) -> EventKind {
        match self {
            Operation::Receive(_) => EventKind::Receive,
            Operation::Reserve(_) => EventKind::Reserve,
            Operation::Commit(_) => EventKind::Commit,
            Operation::Release(_) => EventKind::Release,
            Operation::Adjust(_) => EventKind::Adjust,
        }
    }

    /// Signed operation quantity as recorded on the event.
    fn delta(self) -> InventoryResult<i64> {
        let signed = |qty: u64| {
            i64::try_from(qty)
                .map_err(|_| InventoryError::validation(format!("quantity {qty} is too large")))
        };
        match self {
            Operation::Receive(qty) | Operation::Reserve(qty) => signed(qty),
            Operation::Commit(qty) | Operation::Release(qty) => Ok(-signed(qty)?),
            Operation::Adjust(delta) => Ok(delta),
        }
    }

    /// Check arguments that need no ledger state.
    fn validate_args(self) -> InventoryResult<()> {
        match self {
            Operation::Receive(0)
            | Operation::Reserve(0)
            | Operation::Commit(0)
            | Operation::Release(0) => {
                Err(InventoryError::validation("quantity must be positive"))
            }
            Operation::Adjust(0) => Err(InventoryError::validation("delta cannot be zero")),
            _ => Ok(()),
        }
    }

    /// Check the precondition against the current state and compute the
    /// resulting state. No side effects.
    fn apply(self, state: StockState) -> InventoryResult<StockState> {
        match self {
            Operation::Receive(qty) => state.receive(qty),
            Operation::Reserve(qty) => state.reserve(qty),
            Operation::Commit(qty) => state.commit(qty),
            Operation::Release(qty) => state.release(qty),
            Operation::Adjust(delta) => state.adjust(delta),
        }
    }
}

/// The single component allowed to append to the stock ledger.
///
/// Generic over the ledger backend; observers are fire-and-forget.
#[derive(Debug)]
pub struct StockMutationEngine<L> {
    catalog: Arc<ItemCatalog>,
    ledger: L,
    observer: Arc<dyn LowStockObserver>,
}

impl<L> StockMutationEngine<L>
where
    L: StockLedger,
{
    pub fn new(catalog: Arc<ItemCatalog>, ledger: L, observer: Arc<dyn LowStockObserver>) -> Self {
        Self {
            catalog,
            ledger,
            observer,
        }
    }

    pub fn catalog(&self) -> &Arc<ItemCatalog> {
        &self.catalog
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// `on_hand += qty`. Always permitted for an active item.
    pub fn receive(
        &self,
        item_id: ItemId,
        qty: u64,
        reference: Option<Reference>,
    ) -> InventoryResult<StockEvent> {
        self.mutate(item_id, Operation::Receive(qty), reference)
    }

    /// `reserved += qty`. Requires `available >= qty`.
    pub fn reserve(
        &self,
        item_id: ItemId,
        qty: u64,
        reference: Option<Reference>,
    ) -> InventoryResult<StockEvent> {
        self.mutate(item_id, Operation::Reserve(qty), reference)
    }

    /// Convert a reservation into a deduction: `on_hand -= qty,
    /// reserved -= qty`. Requires both counters to cover `qty`.
    pub fn commit(
        &self,
        item_id: ItemId,
        qty: u64,
        reference: Option<Reference>,
    ) -> InventoryResult<StockEvent> {
        self.mutate(item_id, Operation::Commit(qty), reference)
    }

    /// Cancel a reservation without consuming stock: `reserved -= qty`.
    pub fn release(
        &self,
        item_id: ItemId,
        qty: u64,
        reference: Option<Reference>,
    ) -> InventoryResult<StockEvent> {
        self.mutate(item_id, Operation::Release(qty), reference)
    }

    /// Signed correction of `on_hand` (stocktake). The resulting on-hand
    /// must stay non-negative and keep covering reservations.
    pub fn adjust(
        &self,
        item_id: ItemId,
        delta: i64,
        reference: Option<Reference>,
    ) -> InventoryResult<StockEvent> {
        self.mutate(item_id, Operation::Adjust(delta), reference)
    }

    /// Soft-deactivate an item, checked against live ledger state.
    pub fn deactivate_item(&self, item_id: ItemId) -> InventoryResult<Item> {
        // Resolve first so unknown items report NotFound, not empty-stock.
        self.catalog.get(item_id)?;
        let head = self.ledger.current(item_id).map_err(map_ledger_error)?;
        self.catalog.deactivate(item_id, &head.state)
    }

    fn mutate(
        &self,
        item_id: ItemId,
        op: Operation,
        reference: Option<Reference>,
    ) -> InventoryResult<StockEvent> {
        op.validate_args()?;

        let item = self.catalog.get(item_id)?;
        if !item.active {
            return Err(InventoryError::invalid_state("item is deactivated"));
        }

        let delta = op.delta()?;

        let mut attempt = 0;
        let stored = loop {
            attempt += 1;

            let head = self.ledger.current(item_id).map_err(map_ledger_error)?;
            let resulting = op.apply(head.state)?;

            let change = StockChange {
                kind: op.kind(),
                delta,
                reference: reference.clone(),
                occurred_at: Utc::now(),
                resulting,
            };

            match self
                .ledger
                .append(item_id, change, ExpectedSeq::Exact(head.sequence_number))
            {
                Ok(stored) => break stored,
                Err(LedgerError::Conflict { expected, actual }) => {
                    if attempt >= MAX_APPEND_ATTEMPTS {
                        return Err(InventoryError::conflict(format!(
                            "append for item {item_id} lost {attempt} races \
                             (last: expected seq {expected}, found {actual})"
                        )));
                    }
                    debug!(
                        item_id = %item_id,
                        attempt,
                        expected,
                        actual,
                        "optimistic append conflict, retrying"
                    );
                }
                Err(other) => return Err(map_ledger_error(other)),
            }
        };

        debug!(
            item_id = %item_id,
            event_type = stored.event_type(),
            sequence_number = stored.sequence_number,
            on_hand = stored.resulting_on_hand,
            reserved = stored.resulting_reserved,
            "stock mutation applied"
        );

        if stored.resulting_on_hand <= item.reorder_threshold {
            let alert = LowStockAlert {
                item_id,
                on_hand: stored.resulting_on_hand,
                reorder_threshold: item.reorder_threshold,
            };
            if let Err(e) = self.observer.notify(alert) {
                // Fire-and-forget: the mutation stands regardless.
                warn!(item_id = %item_id, error = ?e, "low-stock notification dropped");
            }
        }

        Ok(stored)
    }
}

pub(crate) fn map_ledger_error(err: LedgerError) -> InventoryError {
    match err {
        LedgerError::Conflict { expected, actual } => InventoryError::conflict(format!(
            "expected seq {expected}, found {actual}"
        )),
        LedgerError::InvalidAppend(msg) => InventoryError::storage(format!("invalid append: {msg}")),
        LedgerError::Storage(msg) => InventoryError::storage(msg),
    }
}
