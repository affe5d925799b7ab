//! Read-only views over the catalog and the ledger.
//!
//! The query service never exposes raw ledger internals beyond the stored
//! events themselves and never writes; derived state comes from the cached
//! aggregate, with `replay` as the fold-from-scratch audit path.

use std::sync::Arc;

use stocklog_catalog::{Item, ItemCatalog};
use stocklog_core::{InventoryResult, ItemId, StockState};
use stocklog_ledger::{fold_stream, StockEvent, StockLedger};

use crate::engine::map_ledger_error;

#[derive(Debug)]
pub struct QueryService<L> {
    catalog: Arc<ItemCatalog>,
    ledger: L,
}

impl<L> QueryService<L>
where
    L: StockLedger,
{
    pub fn new(catalog: Arc<ItemCatalog>, ledger: L) -> Self {
        Self { catalog, ledger }
    }

    /// Current derived state. Zero state for a known item with no events;
    /// `NotFound` for unknown items.
    pub fn current(&self, item_id: ItemId) -> InventoryResult<StockState> {
        self.catalog.get(item_id)?;
        let head = self.ledger.current(item_id).map_err(map_ledger_error)?;
        Ok(head.state)
    }

    /// Quantity that can still be reserved.
    pub fn available(&self, item_id: ItemId) -> InventoryResult<u64> {
        Ok(self.current(item_id)?.available())
    }

    /// Forward-ordered events with `sequence_number > since_seq`.
    pub fn history(&self, item_id: ItemId, since_seq: u64) -> InventoryResult<Vec<StockEvent>> {
        self.catalog.get(item_id)?;
        self.ledger.history(item_id, since_seq).map_err(map_ledger_error)
    }

    /// Re-derive the current state by folding the full history from zero.
    ///
    /// Must agree with `current()`; callers use it to audit the cached
    /// aggregate against the stream.
    pub fn replay(&self, item_id: ItemId) -> InventoryResult<StockState> {
        let history = self.history(item_id, 0)?;
        Ok(fold_stream(&history))
    }

    pub fn item(&self, item_id: ItemId) -> InventoryResult<Item> {
        self.catalog.get(item_id)
    }

    pub fn items(&self) -> InventoryResult<Vec<Item>> {
        self.catalog.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StockMutationEngine;
    use crate::observer::NoopLowStockObserver;
    use stocklog_core::InventoryError;
    use stocklog_ledger::InMemoryStockLedger;

    fn setup() -> (
        StockMutationEngine<Arc<InMemoryStockLedger>>,
        QueryService<Arc<InMemoryStockLedger>>,
        ItemId,
    ) {
        let catalog = Arc::new(ItemCatalog::new());
        let ledger = Arc::new(InMemoryStockLedger::new());
        let engine = StockMutationEngine::new(
            catalog.clone(),
            ledger.clone(),
            Arc::new(NoopLowStockObserver),
        );
        let query = QueryService::new(catalog, ledger);
        let item_id = engine.catalog().register("Widget", "pcs", 5).unwrap().id;
        (engine, query, item_id)
    }

    #[test]
    fn current_is_zero_for_a_known_item_with_no_events() {
        let (_engine, query, item_id) = setup();
        assert_eq!(query.current(item_id).unwrap(), StockState::zero());
        assert_eq!(query.available(item_id).unwrap(), 0);
    }

    #[test]
    fn current_is_not_found_for_unknown_items() {
        let (_engine, query, _item_id) = setup();
        assert_eq!(query.current(ItemId::new()).unwrap_err(), InventoryError::NotFound);
        assert_eq!(query.history(ItemId::new(), 0).unwrap_err(), InventoryError::NotFound);
    }

    #[test]
    fn replay_agrees_with_current_after_mutations() {
        let (engine, query, item_id) = setup();
        engine.receive(item_id, 20, None).unwrap();
        engine.reserve(item_id, 15, None).unwrap();
        engine.commit(item_id, 15, None).unwrap();
        engine.adjust(item_id, -5, None).unwrap();

        let current = query.current(item_id).unwrap();
        assert_eq!(query.replay(item_id).unwrap(), current);
        assert_eq!(current, StockState::zero());
    }

    #[test]
    fn available_reflects_reservations() {
        let (engine, query, item_id) = setup();
        engine.receive(item_id, 20, None).unwrap();
        engine.reserve(item_id, 15, None).unwrap();

        assert_eq!(query.available(item_id).unwrap(), 5);
    }

    #[test]
    fn history_since_seq_resumes_mid_stream() {
        let (engine, query, item_id) = setup();
        engine.receive(item_id, 20, None).unwrap();
        engine.reserve(item_id, 15, None).unwrap();
        engine.release(item_id, 15, None).unwrap();

        let tail = query.history(item_id, 1).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence_number, 2);
        assert_eq!(tail[1].sequence_number, 3);
    }

    #[test]
    fn items_lists_registered_catalog_entries() {
        let (engine, query, _item_id) = setup();
        engine.catalog().register("Gadget", "pcs", 1).unwrap();

        let mut names: Vec<String> = query.items().unwrap().into_iter().map(|i| i.name).collect();
        names.sort();
        assert_eq!(names, vec!["Gadget".to_string(), "Widget".to_string()]);
    }
}
