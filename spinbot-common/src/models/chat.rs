/// The four event shapes delivered by the chat feed client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Cheer {
        username: String,
        bits: u64,
        message: String,
    },
    GiftSubBundle {
        username: String,
        sub_count: u32,
        recipients: Vec<String>,
    },
    ChatMessage {
        username: String,
        text: String,
        /// Moderator or broadcaster, as flagged by the platform.
        is_privileged: bool,
    },
    Disconnected {
        reason: String,
    },
}

impl ChatEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ChatEvent::Cheer { .. } => "cheer",
            ChatEvent::GiftSubBundle { .. } => "gift-sub-bundle",
            ChatEvent::ChatMessage { .. } => "chat-message",
            ChatEvent::Disconnected { .. } => "disconnected",
        }
    }
}
