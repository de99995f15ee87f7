use std::sync::Arc;

use tracing::{debug, error, warn};

use spinbot_common::models::ChatEvent;

use crate::services::command_service::{CommandOutcome, CommandService};
use crate::services::donation_service::DonationService;

/// Single entry point for everything the chat feed delivers.
pub struct ChatEventHandler {
    donations: Arc<DonationService>,
    commands: Arc<CommandService>,
}

impl ChatEventHandler {
    pub fn new(donations: Arc<DonationService>, commands: Arc<CommandService>) -> Self {
        Self { donations, commands }
    }

    /// Routes one event. Failures are logged and swallowed so a bad event
    /// never takes the chat loop down.
    pub async fn dispatch(&self, event: ChatEvent) {
        debug!("Dispatching {}", event.event_type());
        match event {
            ChatEvent::Cheer { username, bits, message } => {
                if let Err(e) = self.donations.record_cheer(&username, bits, &message).await {
                    error!("Failed to record cheer from {}: {}", username, e);
                }
            }
            ChatEvent::GiftSubBundle { username, sub_count, recipients } => {
                if let Err(e) = self
                    .donations
                    .record_gift_subs(&username, sub_count, recipients)
                    .await
                {
                    error!("Failed to record gift subs from {}: {}", username, e);
                }
            }
            ChatEvent::ChatMessage { username, text, is_privileged } => {
                match self.commands.handle_chat_message(&username, &text, is_privileged).await {
                    Ok(CommandOutcome::Ignored) => {}
                    Ok(outcome) => debug!("Command from {} -> {:?}", username, outcome),
                    Err(e) => error!("Command from {} failed: {}", username, e),
                }
            }
            ChatEvent::Disconnected { reason } => {
                warn!("Chat feed disconnected: {}", reason);
            }
        }
    }
}
