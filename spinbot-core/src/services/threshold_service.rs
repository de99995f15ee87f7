use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use spinbot_common::models::{Thresholds, ThresholdsUpdate};
use spinbot_common::traits::ThresholdStore;

use crate::eventbus::{BotEvent, EventBus};
use crate::Error;

/// Owns the live threshold policy. Reads are lock-cheap snapshots; writes go
/// to the store first so memory never runs ahead of disk.
pub struct ThresholdService {
    current: RwLock<Thresholds>,
    store: Arc<dyn ThresholdStore>,
    event_bus: Arc<EventBus>,
}

impl ThresholdService {
    /// Loads persisted thresholds, writing the defaults if nothing is stored yet.
    pub async fn load(store: Arc<dyn ThresholdStore>, event_bus: Arc<EventBus>) -> Result<Self, Error> {
        let thresholds = match store.load().await? {
            Some(t) => t,
            None => {
                let defaults = Thresholds::default();
                info!(
                    "No stored thresholds, writing defaults ({} bits / {} gift subs)",
                    defaults.bit_threshold, defaults.gift_sub_threshold
                );
                store.save(&defaults).await?;
                defaults
            }
        };
        debug!("ThresholdService loaded {:?}", thresholds);

        Ok(Self {
            current: RwLock::new(thresholds),
            store,
            event_bus,
        })
    }

    pub async fn current(&self) -> Thresholds {
        *self.current.read().await
    }

    /// Merges, persists, then swaps in the new policy and tells subscribers.
    pub async fn save(&self, update: ThresholdsUpdate) -> Result<Thresholds, Error> {
        let mut guard = self.current.write().await;
        let next = guard.merged(&update)?;
        self.store.save(&next).await?;
        *guard = next;
        drop(guard);

        info!(
            "Thresholds updated: {} bits / {} gift subs",
            next.bit_threshold, next.gift_sub_threshold
        );
        self.event_bus.publish(BotEvent::ThresholdsUpdate(next)).await;
        Ok(next)
    }
}
