//! src/eventbus/mod.rs
//!
//! In-process fan-out of state changes to live subscribers. Delivery is
//! best-effort: a subscriber whose queue is full misses the event, and
//! subscribers that dropped their receiver are pruned on the next publish.

pub mod activity_logger;

use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use spinbot_common::models::{
    DonationRecord, GiftSubRecord, SpinAlert, SpinCommandRecord, Thresholds,
};

/// Every notification category pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum BotEvent {
    NewDonation(DonationRecord),
    NewGiftSub(GiftSubRecord),
    NewSpinCommand(SpinCommandRecord),
    /// Raised whenever a record's spin flag goes false -> true.
    SpinAlert(SpinAlert),
    ThresholdsUpdate(Thresholds),
}

impl BotEvent {
    /// Category name as seen by subscribers.
    pub fn event_type(&self) -> &'static str {
        match self {
            BotEvent::NewDonation(_) => "new-donation",
            BotEvent::NewGiftSub(_) => "new-gift-sub",
            BotEvent::NewSpinCommand(_) => "new-spin-command",
            BotEvent::SpinAlert(_) => "spin-alert",
            BotEvent::ThresholdsUpdate(_) => "thresholds-update",
        }
    }

    /// JSON body of the notification.
    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            BotEvent::NewDonation(d) => serde_json::to_value(d),
            BotEvent::NewGiftSub(g) => serde_json::to_value(g),
            BotEvent::NewSpinCommand(c) => serde_json::to_value(c),
            BotEvent::SpinAlert(a) => serde_json::to_value(a),
            BotEvent::ThresholdsUpdate(t) => serde_json::to_value(t),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// Each subscriber gets its own bounded `mpsc::Sender<BotEvent>`.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<BotEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 256;

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events published from now on are delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<BotEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Publish an event to all current subscribers without waiting on any of them.
    pub async fn publish(&self, event: BotEvent) {
        let mut subs = self.subscribers.lock().await;
        subs.retain(|s| match s.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Subscriber queue full, dropping {}", event.event_type());
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
