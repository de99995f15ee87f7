pub mod client;
pub mod runtime;

pub use client::{ParsedTwitchMsg, TwitchIrcClient};
pub use runtime::{
    run_chat_loop, spawn_chat_runtime, TwitchIrcConfig, TwitchIrcPlatform, ANONYMOUS_USERNAME,
    DEFAULT_RECONNECT_DELAY,
};
