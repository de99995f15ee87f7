//! src/eventbus/activity_logger.rs
//!
//! Spawns a task that subscribes to the EventBus and writes one log line per
//! notification. Stops when the bus is shut down or the channel closes.

use tokio::task::JoinHandle;
use tracing::info;

use crate::eventbus::{BotEvent, EventBus};

pub async fn spawn_activity_logger(event_bus: &EventBus) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe(None).await;
    let mut shutdown_rx = event_bus.shutdown_rx.clone();

    tokio::spawn(async move {
        info!("Activity logger started.");
        loop {
            tokio::select! {
                biased;
                Ok(_) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Activity logger shutting down.");
                        break;
                    }
                },
                maybe_event = rx.recv() => {
                    match maybe_event {
                        Some(event) => info!("{}", describe(&event)),
                        None => {
                            info!("Activity logger channel closed.");
                            break;
                        }
                    }
                },
            }
        }
    })
}

/// Human-readable one-liner for a notification.
pub fn describe(event: &BotEvent) -> String {
    match event {
        BotEvent::NewDonation(d) => format!("{} cheered {} bits", d.username, d.bits),
        BotEvent::NewGiftSub(g) => format!("{} gifted {} subs", g.username, g.sub_count),
        BotEvent::NewSpinCommand(c) => format!("{} sent '{}'", c.username, c.command),
        BotEvent::SpinAlert(a) => match (a.bits, a.sub_count) {
            (Some(bits), _) => format!("SPIN ALERT! {} donated {} bits", a.username, bits),
            (_, Some(subs)) => format!("SPIN ALERT! {} gifted {} subs", a.username, subs),
            _ => format!("SPIN ALERT! {}", a.username),
        },
        BotEvent::ThresholdsUpdate(t) => format!(
            "Thresholds now {} bits / {} gift subs",
            t.bit_threshold, t.gift_sub_threshold
        ),
    }
}
