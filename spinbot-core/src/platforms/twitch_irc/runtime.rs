//! src/platforms/twitch_irc/runtime.rs
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use spinbot_common::models::ChatEvent;

use crate::eventbus::EventBus;
use crate::platforms::{ConnectionStatus, PlatformIntegration};
use crate::services::ChatEventHandler;
use crate::Error;

use super::client::{irc_channel, TwitchIrcClient};

/// Anonymous read-only login name Twitch accepts without a token.
pub const ANONYMOUS_USERNAME: &str = "justinfan12345";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct TwitchIrcConfig {
    pub username: String,
    /// Empty means anonymous.
    pub oauth_token: String,
    pub channel: String,
}

impl TwitchIrcConfig {
    pub fn anonymous(channel: &str) -> Self {
        Self {
            username: ANONYMOUS_USERNAME.to_string(),
            oauth_token: String::new(),
            channel: channel.to_string(),
        }
    }
}

pub struct TwitchIrcPlatform {
    config: TwitchIrcConfig,
    connection_status: ConnectionStatus,
    client: Option<TwitchIrcClient>,
    incoming: Option<mpsc::UnboundedReceiver<ChatEvent>>,
}

impl TwitchIrcPlatform {
    pub fn new(config: TwitchIrcConfig) -> Self {
        Self {
            config,
            connection_status: ConnectionStatus::Disconnected,
            client: None,
            incoming: None,
        }
    }
}

#[async_trait]
impl PlatformIntegration for TwitchIrcPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.client.is_some() {
            info!("(TwitchIrcPlatform) connect => already connected");
            return Ok(());
        }

        let mut client = match TwitchIrcClient::connect(&self.config.username, &self.config.oauth_token).await {
            Ok(c) => c,
            Err(e) => {
                let msg = format!("Error connecting to Twitch IRC => {}", e);
                error!("{}", msg);
                self.connection_status = ConnectionStatus::Error(msg.clone());
                return Err(Error::Platform(msg));
            }
        };

        self.incoming = client.incoming.take();
        if self.incoming.is_none() {
            client.shutdown();
            return Err(Error::Platform("No incoming channel in TwitchIrcClient".into()));
        }

        client.join_channel(&self.config.channel);
        info!(
            "(TwitchIrcPlatform) connected as {} to {}",
            self.config.username,
            irc_channel(&self.config.channel)
        );
        self.client = Some(client);
        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;
        self.incoming = None;
        if let Some(cli) = self.client.take() {
            cli.shutdown();
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Option<ChatEvent> {
        match self.incoming.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.connection_status.clone()
    }
}

/// Runs a chat feed until the bus shuts down: dispatches every event and,
/// whenever the connection drops or fails, waits `reconnect_delay` and
/// tries again. There is no retry limit.
pub async fn run_chat_loop<P: PlatformIntegration>(
    mut platform: P,
    handler: Arc<ChatEventHandler>,
    event_bus: Arc<EventBus>,
    reconnect_delay: Duration,
) {
    let mut shutdown_rx = event_bus.shutdown_rx.clone();

    'outer: loop {
        if event_bus.is_shutdown() {
            break;
        }

        match platform.connect().await {
            Ok(()) => loop {
                tokio::select! {
                    biased;
                    Ok(_) = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break 'outer;
                        }
                    }
                    maybe_event = platform.next_event() => {
                        match maybe_event {
                            Some(event @ ChatEvent::Disconnected { .. }) => {
                                handler.dispatch(event).await;
                                break;
                            }
                            Some(event) => handler.dispatch(event).await,
                            None => {
                                handler
                                    .dispatch(ChatEvent::Disconnected {
                                        reason: "event stream ended".into(),
                                    })
                                    .await;
                                break;
                            }
                        }
                    }
                }
            },
            Err(e) => warn!("Chat connect failed: {}", e),
        }

        if let Err(e) = platform.disconnect().await {
            debug!("Chat disconnect error: {}", e);
        }
        warn!("Reconnecting to chat in {:?}", reconnect_delay);

        tokio::select! {
            biased;
            Ok(_) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }

    let _ = platform.disconnect().await;
    info!("Chat runtime stopped.");
}

pub fn spawn_chat_runtime<P>(
    platform: P,
    handler: Arc<ChatEventHandler>,
    event_bus: Arc<EventBus>,
    reconnect_delay: Duration,
) -> JoinHandle<()>
where
    P: PlatformIntegration + 'static,
{
    tokio::spawn(run_chat_loop(platform, handler, event_bus, reconnect_delay))
}
