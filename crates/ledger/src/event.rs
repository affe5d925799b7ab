//! Ledger event model.
//!
//! Events move through two shapes:
//!
//! 1. **`StockChange`**: decided by the mutation engine, not yet persisted.
//! 2. **`StockEvent`**: stored, with an assigned `event_id` and
//!    `sequence_number`.
//!
//! The ledger assigns sequence numbers during append; a stored event is
//! immutable thereafter. Corrections happen by appending a compensating
//! `Adjust` event, never by editing history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocklog_core::{EventId, ItemId, Reference, StockState};

/// The closed set of quantity-affecting operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Receive,
    Reserve,
    Commit,
    Release,
    Adjust,
}

impl EventKind {
    /// Stable event name/type identifier (e.g. "stock.received").
    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::Receive => "stock.received",
            EventKind::Reserve => "stock.reserved",
            EventKind::Commit => "stock.committed",
            EventKind::Release => "stock.released",
            EventKind::Adjust => "stock.adjusted",
        }
    }
}

/// A quantity change ready to be appended (no sequence number yet).
///
/// The `resulting` state is the fold of the stream the change was decided
/// against plus this change's delta. The ledger re-derives it on append and
/// refuses changes that do not follow from the current head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub kind: EventKind,
    /// Signed operation quantity. Positive for receive/reserve, negative for
    /// commit/release, either sign for adjust. Which counter it moves is
    /// determined by `kind` (reserve/release move `reserved`, the rest move
    /// `on_hand`; commit moves both).
    pub delta: i64,
    pub reference: Option<Reference>,
    pub occurred_at: DateTime<Utc>,
    pub resulting: StockState,
}

/// A stored, immutable ledger event for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEvent {
    pub event_id: EventId,
    pub item_id: ItemId,

    /// Monotonically increasing position in the item's stream, starting at 1.
    pub sequence_number: u64,

    pub kind: EventKind,
    /// Signed operation quantity; see [`StockChange::delta`].
    pub delta: i64,
    pub reference: Option<Reference>,
    pub occurred_at: DateTime<Utc>,

    /// Cached fold of the stream up to and including this event.
    pub resulting_on_hand: u64,
    pub resulting_reserved: u64,
}

impl StockEvent {
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    /// The derived state as of this event.
    pub fn resulting_state(&self) -> StockState {
        StockState {
            on_hand: self.resulting_on_hand,
            reserved: self.resulting_reserved,
        }
    }

    /// Re-derive the state after this event from the state before it.
    ///
    /// This is the fold step: replaying it over a full stream from
    /// `StockState::zero()` must reproduce each event's `resulting_*` fields.
    pub fn fold(&self, before: StockState) -> StockState {
        apply_delta(self.kind, self.delta, before)
    }
}

/// State transition for one (kind, delta) pair.
///
/// Saturating arithmetic keeps the fold total; streams written through the
/// mutation engine never reach the saturation points.
pub fn apply_delta(kind: EventKind, delta: i64, before: StockState) -> StockState {
    match kind {
        EventKind::Receive | EventKind::Adjust => StockState {
            on_hand: before.on_hand.saturating_add_signed(delta),
            reserved: before.reserved,
        },
        EventKind::Reserve | EventKind::Release => StockState {
            on_hand: before.on_hand,
            reserved: before.reserved.saturating_add_signed(delta),
        },
        EventKind::Commit => {
            let qty = delta.unsigned_abs();
            StockState {
                on_hand: before.on_hand.saturating_sub(qty),
                reserved: before.reserved.saturating_sub(qty),
            }
        }
    }
}

/// Fold a forward-ordered stream from the empty position.
pub fn fold_stream<'a>(events: impl IntoIterator<Item = &'a StockEvent>) -> StockState {
    events
        .into_iter()
        .fold(StockState::zero(), |state, event| event.fold(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(seq: u64, kind: EventKind, delta: i64, on_hand: u64, reserved: u64) -> StockEvent {
        StockEvent {
            event_id: EventId::new(),
            item_id: ItemId::new(),
            sequence_number: seq,
            kind,
            delta,
            reference: None,
            occurred_at: Utc::now(),
            resulting_on_hand: on_hand,
            resulting_reserved: reserved,
        }
    }

    #[test]
    fn event_types_are_dotted_and_stable() {
        assert_eq!(EventKind::Receive.event_type(), "stock.received");
        assert_eq!(EventKind::Adjust.event_type(), "stock.adjusted");
    }

    #[test]
    fn folding_a_stream_reproduces_cached_resulting_fields() {
        let events = vec![
            event(1, EventKind::Receive, 20, 20, 0),
            event(2, EventKind::Reserve, 15, 20, 15),
            event(3, EventKind::Commit, -15, 5, 0),
            event(4, EventKind::Adjust, -5, 0, 0),
        ];

        let mut state = StockState::zero();
        for e in &events {
            state = e.fold(state);
            assert_eq!(state, e.resulting_state(), "at seq {}", e.sequence_number);
        }
        assert_eq!(fold_stream(&events), StockState::zero());
    }

    #[test]
    fn release_returns_reserved_quantity() {
        let events = vec![
            event(1, EventKind::Receive, 10, 10, 0),
            event(2, EventKind::Reserve, 4, 10, 4),
            event(3, EventKind::Release, -4, 10, 0),
        ];
        assert_eq!(fold_stream(&events), StockState::new(10, 0).unwrap());
    }

    #[test]
    fn stock_event_serializes_with_flat_resulting_fields() {
        let event = StockEvent {
            event_id: EventId::new(),
            item_id: ItemId::new(),
            sequence_number: 1,
            kind: EventKind::Receive,
            delta: 20,
            reference: Some(Reference::new("po-1001")),
            occurred_at: Utc::now(),
            resulting_on_hand: 20,
            resulting_reserved: 0,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "receive");
        assert_eq!(json["resulting_on_hand"], 20);
        assert_eq!(json["reference"], "po-1001");
    }
}
