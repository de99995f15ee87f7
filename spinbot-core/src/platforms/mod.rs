// File: src/platforms/mod.rs

use async_trait::async_trait;

use spinbot_common::models::ChatEvent;

use crate::Error;

pub mod twitch_irc;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
    Error(String),
}

/// A live chat feed that yields typed events until its connection drops.
#[async_trait]
pub trait PlatformIntegration: Send {
    async fn connect(&mut self) -> Result<(), Error>;
    async fn disconnect(&mut self) -> Result<(), Error>;

    /// Next event from the current connection. `None` once it is gone.
    async fn next_event(&mut self) -> Option<ChatEvent>;

    fn connection_status(&self) -> ConnectionStatus;
}
