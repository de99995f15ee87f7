use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use spinbot_common::models::{
    DonationRecord, DonationStats, GiftSubRecord, GiftSubStats, SpinAlert, SpinCommandRecord,
    SpinCommandStats,
};
use spinbot_common::traits::{EventLogRepository, FlagUpdate, SpinFlagRepository, SpinFlagged};

use crate::eventbus::{BotEvent, EventBus};
use crate::services::stats;
use crate::services::threshold_service::ThresholdService;
use crate::Error;

/// How many rows the recent lists carry.
pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationsView {
    pub donations: Vec<DonationRecord>,
    pub stats: DonationStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSubsView {
    pub gift_subs: Vec<GiftSubRecord>,
    pub gift_sub_stats: GiftSubStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinCommandsView {
    pub spin_commands: Vec<SpinCommandRecord>,
    pub spin_command_stats: SpinCommandStats,
}

/// What a new live subscriber receives before any notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerSnapshot {
    #[serde(flatten)]
    pub donations: DonationsView,
    #[serde(flatten)]
    pub gift_subs: GiftSubsView,
    #[serde(flatten)]
    pub spin_commands: SpinCommandsView,
}

/// Ingestion and manual correction of the three logs. Every successful
/// write is followed by exactly one notification, plus a spin-alert when a
/// record's flag moves to true.
pub struct DonationService {
    donations: Arc<dyn SpinFlagRepository<DonationRecord>>,
    gift_subs: Arc<dyn SpinFlagRepository<GiftSubRecord>>,
    spin_commands: Arc<dyn EventLogRepository<SpinCommandRecord>>,
    thresholds: Arc<ThresholdService>,
    event_bus: Arc<EventBus>,
}

impl DonationService {
    pub fn new(
        donations: Arc<dyn SpinFlagRepository<DonationRecord>>,
        gift_subs: Arc<dyn SpinFlagRepository<GiftSubRecord>>,
        spin_commands: Arc<dyn EventLogRepository<SpinCommandRecord>>,
        thresholds: Arc<ThresholdService>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        debug!("Initializing DonationService");
        Self {
            donations,
            gift_subs,
            spin_commands,
            thresholds,
            event_bus,
        }
    }

    pub fn thresholds(&self) -> &Arc<ThresholdService> {
        &self.thresholds
    }

    pub async fn record_cheer(
        &self,
        username: &str,
        bits: u64,
        message: &str,
    ) -> Result<DonationRecord, Error> {
        let thresholds = self.thresholds.current().await;
        let record = DonationRecord {
            timestamp: String::new(),
            username: username.to_string(),
            bits,
            message: message.to_string(),
            spin_triggered: thresholds.cheer_qualifies(bits),
        };
        let record = self.donations.append_stamped(record).await?;
        info!(
            "Cheer: {} x{} bits (spin: {})",
            record.username, record.bits, record.spin_triggered
        );

        self.event_bus.publish(BotEvent::NewDonation(record.clone())).await;
        if record.spin_triggered {
            self.event_bus
                .publish(BotEvent::SpinAlert(SpinAlert::from(&record)))
                .await;
        }
        Ok(record)
    }

    pub async fn record_gift_subs(
        &self,
        username: &str,
        sub_count: u32,
        recipients: Vec<String>,
    ) -> Result<GiftSubRecord, Error> {
        if sub_count == 0 {
            return Err(Error::Validation("gift-sub count must be positive".into()));
        }
        let thresholds = self.thresholds.current().await;
        let record = GiftSubRecord {
            timestamp: String::new(),
            username: username.to_string(),
            sub_count,
            recipients,
            spin_triggered: thresholds.gift_subs_qualify(sub_count),
        };
        let record = self.gift_subs.append_stamped(record).await?;
        info!(
            "Gift subs: {} x{} (spin: {})",
            record.username, record.sub_count, record.spin_triggered
        );

        self.event_bus.publish(BotEvent::NewGiftSub(record.clone())).await;
        if record.spin_triggered {
            self.event_bus
                .publish(BotEvent::SpinAlert(SpinAlert::from(&record)))
                .await;
        }
        Ok(record)
    }

    /// Audit entry for a `!spin` chat line, written before any resolution.
    pub async fn record_spin_command(
        &self,
        username: &str,
        command: &str,
    ) -> Result<SpinCommandRecord, Error> {
        let record = SpinCommandRecord {
            timestamp: String::new(),
            username: username.to_string(),
            command: command.to_string(),
        };
        let record = self.spin_commands.append_stamped(record).await?;
        self.event_bus
            .publish(BotEvent::NewSpinCommand(record.clone()))
            .await;
        Ok(record)
    }

    /// Direct flag update from the REST surface. Either direction is allowed;
    /// only false -> true raises a spin-alert.
    pub async fn set_donation_spin(&self, timestamp: &str, value: bool) -> Result<DonationRecord, Error> {
        let update = self.donations.update_spin_triggered(timestamp, value).await?;
        self.announce_flag(&update, SpinAlert::from(&update.record)).await;
        Ok(update.record)
    }

    pub async fn set_gift_sub_spin(&self, timestamp: &str, value: bool) -> Result<GiftSubRecord, Error> {
        let update = self.gift_subs.update_spin_triggered(timestamp, value).await?;
        self.announce_flag(&update, SpinAlert::from(&update.record)).await;
        Ok(update.record)
    }

    async fn announce_flag<R: SpinFlagged>(&self, update: &FlagUpdate<R>, alert: SpinAlert) {
        debug!(
            "Spin flag for {} set to {} (was {})",
            update.record.timestamp(),
            update.record.spin_triggered(),
            update.previous
        );
        if update.newly_triggered() {
            self.event_bus.publish(BotEvent::SpinAlert(alert)).await;
        }
    }

    pub async fn donations_view(&self) -> Result<DonationsView, Error> {
        let all = self.donations.read_all().await?;
        Ok(DonationsView {
            stats: stats::donation_stats(&all),
            donations: recent(all),
        })
    }

    pub async fn gift_subs_view(&self) -> Result<GiftSubsView, Error> {
        let all = self.gift_subs.read_all().await?;
        Ok(GiftSubsView {
            gift_sub_stats: stats::gift_sub_stats(&all),
            gift_subs: recent(all),
        })
    }

    pub async fn spin_commands_view(&self) -> Result<SpinCommandsView, Error> {
        let all = self.spin_commands.read_all().await?;
        Ok(SpinCommandsView {
            spin_command_stats: stats::spin_command_stats(&all),
            spin_commands: recent(all),
        })
    }

    pub async fn snapshot(&self) -> Result<TrackerSnapshot, Error> {
        Ok(TrackerSnapshot {
            donations: self.donations_view().await?,
            gift_subs: self.gift_subs_view().await?,
            spin_commands: self.spin_commands_view().await?,
        })
    }

    /// Raw donation log bytes, `None` before the first write.
    pub async fn export_donations_csv(&self) -> Result<Option<Vec<u8>>, Error> {
        self.donations.export_raw().await
    }
}

/// Newest first, capped at `RECENT_LIMIT`. Stats need the full scan anyway,
/// so one read serves both.
fn recent<R>(all: Vec<R>) -> Vec<R> {
    all.into_iter().rev().take(RECENT_LIMIT).collect()
}
