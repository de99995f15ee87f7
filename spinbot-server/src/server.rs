//! spinbot-server/src/server.rs
//!
//! Starts the chat runtime and HTTP surface, then waits for Ctrl-C.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{error, info};

use spinbot_core::api;
use spinbot_core::eventbus::activity_logger::spawn_activity_logger;
use spinbot_core::platforms::twitch_irc::{spawn_chat_runtime, TwitchIrcPlatform};

use crate::context::{chat_config, ServerContext};
use crate::Args;

pub async fn run_server(args: Args, addr: SocketAddr) -> anyhow::Result<()> {
    let ctx = ServerContext::new(&args).await?;
    let event_bus = ctx.event_bus.clone();

    let logger_handle = spawn_activity_logger(&event_bus).await;

    let chat_handle = if args.no_chat {
        info!("Chat connection disabled (--no-chat).");
        None
    } else {
        let config = chat_config(
            &args.channel,
            std::env::var("TWITCH_USERNAME").ok(),
            std::env::var("TWITCH_OAUTH_TOKEN").ok(),
        );
        Some(spawn_chat_runtime(
            TwitchIrcPlatform::new(config),
            ctx.chat_handler.clone(),
            event_bus.clone(),
            Duration::from_secs(args.reconnect_delay_secs),
        ))
    };

    // Ctrl-C => signal
    let eb_for_ctrlc = event_bus.clone();
    let _ctrlc_handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            return;
        }
        info!("Ctrl-C detected; shutting down event bus...");
        eb_for_ctrlc.shutdown();
    });

    let served = api::serve(addr, ctx.app_state()).await;
    if served.is_err() {
        event_bus.shutdown();
    }

    if let Some(handle) = chat_handle {
        let _ = handle.await;
    }
    let _ = logger_handle.await;
    info!("Server shutdown complete.");

    served?;
    Ok(())
}
