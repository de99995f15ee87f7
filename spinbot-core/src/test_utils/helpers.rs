// File: spinbot-core/src/test_utils/helpers.rs

use std::sync::Arc;

use tempfile::TempDir;

use crate::api::AppState;
use crate::eventbus::EventBus;
use crate::repositories::csv::{DONATIONS_FILE, GIFT_SUBS_FILE, SPIN_COMMANDS_FILE};
use crate::repositories::json::CONFIG_FILE;
use crate::repositories::{DonationLog, GiftSubLog, JsonThresholdStore, SpinCommandLog};
use crate::services::{
    ChatEventHandler, CommandService, DonationService, SpinResolver, ThresholdService,
};
use crate::Error;

/// Every tracker service wired over a throwaway data directory.
pub struct TestTracker {
    /// Dropping this removes the data directory.
    pub dir: TempDir,
    pub event_bus: Arc<EventBus>,
    pub donation_log: Arc<DonationLog>,
    pub gift_sub_log: Arc<GiftSubLog>,
    pub spin_command_log: Arc<SpinCommandLog>,
    pub thresholds: Arc<ThresholdService>,
    pub donations: Arc<DonationService>,
    pub resolver: Arc<SpinResolver>,
    pub commands: Arc<CommandService>,
    pub handler: Arc<ChatEventHandler>,
}

impl TestTracker {
    pub fn app_state(&self) -> AppState {
        AppState {
            donations: self.donations.clone(),
            commands: self.commands.clone(),
            event_bus: self.event_bus.clone(),
        }
    }
}

/// Builds a tracker in a fresh temp dir with default thresholds.
pub async fn setup_test_tracker() -> Result<TestTracker, Error> {
    let dir = TempDir::new()?;
    let event_bus = Arc::new(EventBus::new());

    let store = Arc::new(JsonThresholdStore::new(dir.path().join(CONFIG_FILE)));
    let thresholds = Arc::new(ThresholdService::load(store, event_bus.clone()).await?);

    let donation_log = Arc::new(DonationLog::new(dir.path().join(DONATIONS_FILE)));
    let gift_sub_log = Arc::new(GiftSubLog::new(dir.path().join(GIFT_SUBS_FILE)));
    let spin_command_log = Arc::new(SpinCommandLog::new(dir.path().join(SPIN_COMMANDS_FILE)));

    let donations = Arc::new(DonationService::new(
        donation_log.clone(),
        gift_sub_log.clone(),
        spin_command_log.clone(),
        thresholds.clone(),
        event_bus.clone(),
    ));
    let resolver = Arc::new(SpinResolver::new(
        donation_log.clone(),
        gift_sub_log.clone(),
        event_bus.clone(),
    ));
    let commands = Arc::new(CommandService::new(donations.clone(), resolver.clone()));
    let handler = Arc::new(ChatEventHandler::new(donations.clone(), commands.clone()));

    Ok(TestTracker {
        dir,
        event_bus,
        donation_log,
        gift_sub_log,
        spin_command_log,
        thresholds,
        donations,
        resolver,
        commands,
        handler,
    })
}
