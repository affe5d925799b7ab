//! Item catalog: identity and descriptive metadata for inventory items.
//!
//! The catalog is the sole owner of `Item` records. Identity (`id`,
//! `created_at`) is assigned once at registration and never mutated or
//! reused; descriptive metadata (name, unit, reorder threshold) may change.
//! Items are never physically deleted while ledger events reference them —
//! deactivation is a soft flag, and it requires the item's stock position to
//! be empty.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stocklog_core::{InventoryError, InventoryResult, ItemId, StockState};

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Unit of measure ("pcs", "kg", ...). Display metadata only.
    pub unit: String,
    /// On-hand level at or below which a low-stock notification fires.
    pub reorder_threshold: u64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update of an item's mutable metadata. `None` leaves a field as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub reorder_threshold: Option<u64>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    items: HashMap<ItemId, Item>,
    /// Lowercased name -> id, for uniqueness checks.
    by_name: HashMap<String, ItemId>,
}

/// Thread-safe item catalog.
///
/// Items are read-mostly after registration; one `RwLock` over both maps
/// keeps the name index consistent with the item set.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    inner: RwLock<CatalogInner>,
}

fn normalized(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new item with a freshly assigned id.
    pub fn register(
        &self,
        name: impl Into<String>,
        unit: impl Into<String>,
        reorder_threshold: u64,
    ) -> InventoryResult<Item> {
        let name = name.into().trim().to_string();
        let unit = unit.into().trim().to_string();

        if name.is_empty() {
            return Err(InventoryError::validation("name cannot be empty"));
        }
        if unit.is_empty() {
            return Err(InventoryError::validation("unit cannot be empty"));
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| InventoryError::storage("catalog lock poisoned"))?;

        let key = normalized(&name);
        if inner.by_name.contains_key(&key) {
            return Err(InventoryError::duplicate_item(name));
        }

        let item = Item {
            id: ItemId::new(),
            name,
            unit,
            reorder_threshold,
            active: true,
            created_at: Utc::now(),
        };

        inner.by_name.insert(key, item.id);
        inner.items.insert(item.id, item.clone());
        debug!(item_id = %item.id, name = %item.name, "registered item");

        Ok(item)
    }

    pub fn get(&self, item_id: ItemId) -> InventoryResult<Item> {
        let inner = self
            .inner
            .read()
            .map_err(|_| InventoryError::storage("catalog lock poisoned"))?;

        inner
            .items
            .get(&item_id)
            .cloned()
            .ok_or(InventoryError::NotFound)
    }

    /// All items, registration order not guaranteed.
    pub fn list(&self) -> InventoryResult<Vec<Item>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| InventoryError::storage("catalog lock poisoned"))?;

        Ok(inner.items.values().cloned().collect())
    }

    /// Update mutable metadata. Identity fields are untouched; renames
    /// re-check name uniqueness.
    pub fn update(&self, item_id: ItemId, update: ItemUpdate) -> InventoryResult<Item> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| InventoryError::storage("catalog lock poisoned"))?;

        let current = inner.items.get(&item_id).ok_or(InventoryError::NotFound)?.clone();

        let mut next = current.clone();
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(InventoryError::validation("name cannot be empty"));
            }
            let key = normalized(&name);
            if inner.by_name.get(&key).is_some_and(|&owner| owner != item_id) {
                return Err(InventoryError::duplicate_item(name));
            }
            next.name = name;
        }
        if let Some(unit) = update.unit {
            let unit = unit.trim().to_string();
            if unit.is_empty() {
                return Err(InventoryError::validation("unit cannot be empty"));
            }
            next.unit = unit;
        }
        if let Some(threshold) = update.reorder_threshold {
            next.reorder_threshold = threshold;
        }

        if next.name != current.name {
            inner.by_name.remove(&normalized(&current.name));
            inner.by_name.insert(normalized(&next.name), item_id);
        }
        inner.items.insert(item_id, next.clone());

        Ok(next)
    }

    /// Soft-deactivate an item. The caller supplies the item's current stock
    /// position (from the ledger); deactivation requires it to be empty.
    pub fn deactivate(&self, item_id: ItemId, current: &StockState) -> InventoryResult<Item> {
        // Existence first, so unknown ids report NotFound over ActiveStock.
        self.get(item_id)?;

        if !current.is_empty() {
            return Err(InventoryError::ActiveStock {
                on_hand: current.on_hand,
                reserved: current.reserved,
            });
        }

        self.set_active(item_id, false)
    }

    /// Re-enable a deactivated item.
    pub fn reactivate(&self, item_id: ItemId) -> InventoryResult<Item> {
        self.set_active(item_id, true)
    }

    fn set_active(&self, item_id: ItemId, active: bool) -> InventoryResult<Item> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| InventoryError::storage("catalog lock poisoned"))?;

        let item = inner.items.get_mut(&item_id).ok_or(InventoryError::NotFound)?;
        item.active = active;
        debug!(item_id = %item_id, active, "item activation changed");

        Ok(item.clone())
    }
}
