//! spinbot-server/src/context.rs
//!
//! Builds every long-lived service over the data directory.

use std::sync::Arc;

use tracing::{info, warn};

use spinbot_core::api::AppState;
use spinbot_core::eventbus::EventBus;
use spinbot_core::platforms::twitch_irc::{TwitchIrcConfig, ANONYMOUS_USERNAME};
use spinbot_core::repositories::csv::{DONATIONS_FILE, GIFT_SUBS_FILE, SPIN_COMMANDS_FILE};
use spinbot_core::repositories::json::CONFIG_FILE;
use spinbot_core::repositories::{DonationLog, GiftSubLog, JsonThresholdStore, SpinCommandLog};
use spinbot_core::services::{
    ChatEventHandler, CommandService, DonationService, SpinResolver, ThresholdService,
};
use spinbot_core::Error;

use crate::Args;

pub struct ServerContext {
    pub event_bus: Arc<EventBus>,
    pub donations: Arc<DonationService>,
    pub commands: Arc<CommandService>,
    pub chat_handler: Arc<ChatEventHandler>,
}

impl ServerContext {
    pub async fn new(args: &Args) -> Result<Self, Error> {
        let dir = &args.data_dir;
        tokio::fs::create_dir_all(dir).await?;

        let event_bus = Arc::new(EventBus::new());

        let donation_log = Arc::new(DonationLog::new(dir.join(DONATIONS_FILE)));
        let gift_sub_log = Arc::new(GiftSubLog::new(dir.join(GIFT_SUBS_FILE)));
        let spin_command_log = Arc::new(SpinCommandLog::new(dir.join(SPIN_COMMANDS_FILE)));
        donation_log.initialize().await?;
        gift_sub_log.initialize().await?;
        spin_command_log.initialize().await?;

        let store = Arc::new(JsonThresholdStore::new(dir.join(CONFIG_FILE)));
        let thresholds = Arc::new(ThresholdService::load(store, event_bus.clone()).await?);
        let current = thresholds.current().await;
        info!(
            "Thresholds: {} bits / {} gift subs",
            current.bit_threshold, current.gift_sub_threshold
        );

        let donations = Arc::new(DonationService::new(
            donation_log.clone(),
            gift_sub_log.clone(),
            spin_command_log,
            thresholds,
            event_bus.clone(),
        ));

        let resolver = Arc::new(SpinResolver::new(donation_log, gift_sub_log, event_bus.clone()));
        let commands = Arc::new(CommandService::new(donations.clone(), resolver));
        let chat_handler = Arc::new(ChatEventHandler::new(donations.clone(), commands.clone()));

        Ok(Self {
            event_bus,
            donations,
            commands,
            chat_handler,
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            donations: self.donations.clone(),
            commands: self.commands.clone(),
            event_bus: self.event_bus.clone(),
        }
    }
}

/// Chat login from `TWITCH_USERNAME` / `TWITCH_OAUTH_TOKEN`. Without a token
/// the connection is anonymous and read-only, which is all the tracker needs.
pub fn chat_config(
    channel: &str,
    username: Option<String>,
    oauth_token: Option<String>,
) -> TwitchIrcConfig {
    let token = oauth_token.unwrap_or_default().trim().to_string();
    let username = username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    match (username, token.is_empty()) {
        (Some(username), false) => TwitchIrcConfig {
            username,
            oauth_token: token,
            channel: channel.to_string(),
        },
        (Some(username), true) if username != ANONYMOUS_USERNAME => {
            warn!("TWITCH_USERNAME set without TWITCH_OAUTH_TOKEN; connecting anonymously");
            TwitchIrcConfig::anonymous(channel)
        }
        _ => TwitchIrcConfig::anonymous(channel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn anonymous_unless_token_given() {
        let anon = chat_config("girl_dm_", None, None);
        assert_eq!(anon.username, ANONYMOUS_USERNAME);
        assert!(anon.oauth_token.is_empty());

        let no_token = chat_config("girl_dm_", Some("mybot".into()), Some("  ".into()));
        assert_eq!(no_token.username, ANONYMOUS_USERNAME);

        let authed = chat_config("girl_dm_", Some("mybot".into()), Some("oauth:abc".into()));
        assert_eq!(authed.username, "mybot");
        assert_eq!(authed.oauth_token, "oauth:abc");
        assert_eq!(authed.channel, "girl_dm_");
    }

    #[tokio::test]
    async fn context_creates_data_files() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        let args = Args::parse_from([
            "spinbot",
            "--no-chat",
            "--data-dir",
            data_dir.to_str().unwrap(),
        ]);

        let ctx = ServerContext::new(&args).await.unwrap();
        for file in [DONATIONS_FILE, GIFT_SUBS_FILE, SPIN_COMMANDS_FILE, CONFIG_FILE] {
            assert!(data_dir.join(file).exists(), "{file} missing");
        }
        let snapshot = ctx.donations.snapshot().await.unwrap();
        assert!(snapshot.donations.donations.is_empty());
    }
}
