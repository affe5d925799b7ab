//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// preconditions, conflicts). Storage concerns belong to the ledger layer and
/// are mapped into this taxonomy at the engine boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// A value failed validation (e.g. empty name, zero quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested item was not found.
    #[error("item not found")]
    NotFound,

    /// Registration violated a uniqueness constraint.
    #[error("duplicate item: {0}")]
    DuplicateItem(String),

    /// A reservation asked for more than is available.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },

    /// A commit/release exceeded reserved (or on-hand) stock, or the item is
    /// not in a state that permits the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An adjustment would push on-hand below zero (or below reserved).
    #[error("invalid adjustment: on_hand {on_hand}, delta {delta}")]
    InvalidAdjustment { on_hand: u64, delta: i64 },

    /// Deactivation attempted while the item still holds stock.
    #[error("item still holds stock: on_hand {on_hand}, reserved {reserved}")]
    ActiveStock { on_hand: u64, reserved: u64 },

    /// An optimistic append lost its race and retries were exhausted.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The ledger storage backend failed (lock poisoning and the like).
    #[error("storage failure: {0}")]
    Storage(String),
}

impl InventoryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn duplicate_item(msg: impl Into<String>) -> Self {
        Self::DuplicateItem(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
