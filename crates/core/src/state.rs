//! Derived stock state: the fold of an item's ledger history.

use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, InventoryResult};

/// Current stock position of one item.
///
/// Quantities are unsigned by representation, so `on_hand >= 0` and
/// `reserved >= 0` cannot be violated. The remaining invariant,
/// `on_hand >= reserved`, is enforced by every transition in this module;
/// callers never construct states that break it.
///
/// `resulting_on_hand`/`resulting_reserved` on stored events are snapshots of
/// this value and are derivable from replaying the stream — persisted for
/// fast reads, not as independent truth.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockState {
    pub on_hand: u64,
    pub reserved: u64,
}

impl StockState {
    /// The empty position: no stock, nothing reserved.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn new(on_hand: u64, reserved: u64) -> InventoryResult<Self> {
        if reserved > on_hand {
            return Err(InventoryError::invalid_state(format!(
                "reserved ({reserved}) exceeds on_hand ({on_hand})"
            )));
        }
        Ok(Self { on_hand, reserved })
    }

    /// Quantity that can still be reserved.
    pub fn available(&self) -> u64 {
        self.on_hand - self.reserved
    }

    pub fn is_empty(&self) -> bool {
        self.on_hand == 0 && self.reserved == 0
    }

    /// `on_hand += qty`.
    pub fn receive(&self, qty: u64) -> InventoryResult<Self> {
        let on_hand = self.on_hand.checked_add(qty).ok_or_else(|| {
            InventoryError::validation(format!("receive of {qty} overflows on_hand"))
        })?;
        Ok(Self {
            on_hand,
            reserved: self.reserved,
        })
    }

    /// `reserved += qty`, requires `available >= qty`.
    pub fn reserve(&self, qty: u64) -> InventoryResult<Self> {
        let available = self.available();
        if qty > available {
            return Err(InventoryError::InsufficientStock {
                requested: qty,
                available,
            });
        }
        Ok(Self {
            on_hand: self.on_hand,
            reserved: self.reserved + qty,
        })
    }

    /// `on_hand -= qty, reserved -= qty`, requires both cover `qty`.
    pub fn commit(&self, qty: u64) -> InventoryResult<Self> {
        if qty > self.reserved || qty > self.on_hand {
            return Err(InventoryError::invalid_state(format!(
                "commit of {qty} exceeds reserved ({}) or on_hand ({})",
                self.reserved, self.on_hand
            )));
        }
        Ok(Self {
            on_hand: self.on_hand - qty,
            reserved: self.reserved - qty,
        })
    }

    /// `reserved -= qty`, requires `reserved >= qty`.
    pub fn release(&self, qty: u64) -> InventoryResult<Self> {
        if qty > self.reserved {
            return Err(InventoryError::invalid_state(format!(
                "release of {qty} exceeds reserved ({})",
                self.reserved
            )));
        }
        Ok(Self {
            on_hand: self.on_hand,
            reserved: self.reserved - qty,
        })
    }

    /// Signed correction of `on_hand`. The result must stay non-negative and
    /// must still cover `reserved`.
    pub fn adjust(&self, delta: i64) -> InventoryResult<Self> {
        let on_hand = self
            .on_hand
            .checked_add_signed(delta)
            .filter(|&n| n >= self.reserved)
            .ok_or(InventoryError::InvalidAdjustment {
                on_hand: self.on_hand,
                delta,
            })?;
        Ok(Self {
            on_hand,
            reserved: self.reserved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_is_on_hand_minus_reserved() {
        let state = StockState::new(10, 4).unwrap();
        assert_eq!(state.available(), 6);
    }

    #[test]
    fn new_rejects_reserved_above_on_hand() {
        assert!(StockState::new(3, 5).is_err());
    }

    #[test]
    fn reserve_beyond_available_fails_without_change() {
        let state = StockState::new(10, 6).unwrap();
        let err = state.reserve(5).unwrap_err();
        match err {
            InventoryError::InsufficientStock {
                requested: 5,
                available: 4,
            } => {}
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn commit_requires_reservation_cover() {
        let state = StockState::new(10, 3).unwrap();
        assert!(state.commit(4).is_err());
        let after = state.commit(3).unwrap();
        assert_eq!(after, StockState::new(7, 0).unwrap());
    }

    #[test]
    fn release_restores_availability() {
        let state = StockState::new(10, 3).unwrap();
        let after = state.release(3).unwrap();
        assert_eq!(after.available(), 10);
        assert!(after.release(1).is_err());
    }

    #[test]
    fn adjust_cannot_go_negative_or_undercut_reservations() {
        let state = StockState::new(5, 0).unwrap();
        assert!(state.adjust(-10).is_err());
        assert_eq!(state.adjust(-5).unwrap(), StockState::zero());

        let reserved = StockState::new(5, 4).unwrap();
        // Dropping on_hand below reserved would break on_hand >= reserved.
        assert!(reserved.adjust(-2).is_err());
        assert_eq!(reserved.adjust(-1).unwrap(), StockState::new(4, 4).unwrap());
    }
}
