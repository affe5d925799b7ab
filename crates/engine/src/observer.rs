//! Outbound low-stock notification interface.
//!
//! Fire-and-forget: the engine emits an alert after a successful mutation
//! drops on-hand to or below the item's reorder threshold. Delivery failures
//! are logged by the engine and never roll back the mutation, so observers
//! may be lossy and consumers must tolerate duplicates.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocklog_core::ItemId;

/// A low-stock notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub item_id: ItemId,
    pub on_hand: u64,
    pub reorder_threshold: u64,
}

/// Notification delivery error.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notifier's internal state is unusable (lock poisoning).
    #[error("notifier state is poisoned")]
    Poisoned,

    /// The alert could not be handed to the delivery channel.
    #[error("alert delivery failed: {0}")]
    Delivery(String),
}

/// Observer of low-stock conditions.
///
/// Implementations must not block the mutation path for long; the engine
/// calls `notify` synchronously after the append has committed.
pub trait LowStockObserver: Send + Sync + core::fmt::Debug {
    fn notify(&self, alert: LowStockAlert) -> Result<(), NotifyError>;
}

impl<O> LowStockObserver for Arc<O>
where
    O: LowStockObserver + ?Sized,
{
    fn notify(&self, alert: LowStockAlert) -> Result<(), NotifyError> {
        (**self).notify(alert)
    }
}

/// Observer that discards alerts. For tests and callers that opt out.
#[derive(Debug, Default)]
pub struct NoopLowStockObserver;

impl LowStockObserver for NoopLowStockObserver {
    fn notify(&self, _alert: LowStockAlert) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// A subscription to a stream of low-stock alerts.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<LowStockAlert>,
}

impl Subscription {
    pub fn new(receiver: Receiver<LowStockAlert>) -> Self {
        Self { receiver }
    }

    /// Block until the next alert is available.
    pub fn recv(&self) -> Result<LowStockAlert, mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an alert without blocking.
    pub fn try_recv(&self) -> Result<LowStockAlert, mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for an alert.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<LowStockAlert, mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// In-process channel-based notifier.
///
/// - No IO / no async
/// - Best-effort fan-out to every subscriber
/// - Dead subscribers are dropped while publishing
#[derive(Debug, Default)]
pub struct ChannelLowStockNotifier {
    subscribers: Mutex<Vec<mpsc::Sender<LowStockAlert>>>,
}

impl ChannelLowStockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive alerts until the process restarts.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}

impl LowStockObserver for ChannelLowStockNotifier {
    fn notify(&self, alert: LowStockAlert) -> Result<(), NotifyError> {
        let mut subs = self.subscribers.lock().map_err(|_| NotifyError::Poisoned)?;

        subs.retain(|tx| tx.send(alert.clone()).is_ok());

        Ok(())
    }
}
