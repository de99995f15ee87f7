// tests/scenario_tests.rs
//
// End-to-end flows through the chat handler, services and CSV logs.

use spinbot_common::models::{ChatEvent, SpinKind, SpinResolution, Thresholds};
use spinbot_common::traits::EventLogRepository;
use spinbot_core::eventbus::BotEvent;
use spinbot_core::services::CommandOutcome;
use spinbot_core::test_utils::helpers::setup_test_tracker;
use spinbot_core::Error;
use tokio_test::assert_ok;

fn mod_says(text: &str) -> ChatEvent {
    ChatEvent::ChatMessage {
        username: "TheMod".into(),
        text: text.into(),
        is_privileged: true,
    }
}

fn cheer(user: &str, bits: u64) -> ChatEvent {
    ChatEvent::Cheer {
        username: user.into(),
        bits,
        message: format!("cheer{bits}, nice \"stream\""),
    }
}

#[tokio::test]
async fn cheer_threshold_decides_spin_alert() -> Result<(), Error> {
    let t = setup_test_tracker().await?;
    let mut rx = t.event_bus.subscribe(None).await;

    t.handler.dispatch(cheer("low", 999)).await;
    t.handler.dispatch(cheer("high", 1000)).await;

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.event_type());
    }
    assert_eq!(kinds, vec!["new-donation", "new-donation", "spin-alert"]);

    let all = t.donation_log.read_all().await?;
    assert_eq!(all.len(), 2);
    assert!(!all[0].spin_triggered);
    assert!(all[1].spin_triggered);
    assert_eq!(all[1].message, "cheer1000, nice \"stream\"");
    Ok(())
}

#[tokio::test]
async fn resolving_twice_is_quiet_the_second_time() -> Result<(), Error> {
    let t = setup_test_tracker().await?;
    t.handler.dispatch(cheer("Bob", 100)).await;

    let first = t.resolver.resolve_spin("!spin @bob").await?;
    assert!(first.is_triggered());

    let mut rx = t.event_bus.subscribe(None).await;
    let second = t.resolver.resolve_spin("!spin @bob").await?;
    assert!(matches!(second, SpinResolution::AlreadyTriggered { kind: SpinKind::BitDonation, .. }));
    assert!(rx.try_recv().is_err(), "no spin-alert on repeat");
    Ok(())
}

#[tokio::test]
async fn stats_pick_cumulative_top_donator() -> Result<(), Error> {
    let t = setup_test_tracker().await?;
    t.handler.dispatch(cheer("A", 500)).await;
    t.handler.dispatch(cheer("B", 1500)).await;
    t.handler.dispatch(cheer("A", 300)).await;

    let view = t.donations.donations_view().await?;
    assert_eq!(view.stats.total_bits, 2300);
    assert_eq!(view.stats.top_donator, "B");
    assert_eq!(view.stats.top_donator_bits, 1500);
    assert_eq!(view.stats.total_spins, 1);
    Ok(())
}

#[tokio::test]
async fn moderator_spin_falls_through_to_gift_sub() -> Result<(), Error> {
    let t = setup_test_tracker().await?;
    t.handler
        .dispatch(ChatEvent::GiftSubBundle {
            username: "Alice".into(),
            sub_count: 1,
            recipients: vec!["lucky".into()],
        })
        .await;
    t.handler.dispatch(cheer("Alice", 2000)).await;

    let outcome = t
        .commands
        .handle_chat_message("TheMod", "!spin @Alice", true)
        .await?;
    match outcome {
        CommandOutcome::SpinResolved { resolution, audit } => {
            assert_eq!(resolution.kind(), SpinKind::GiftSub);
            assert!(resolution.is_triggered());
            assert_eq!(audit.command, "!spin @Alice");
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let gifts = t.gift_sub_log.read_all().await?;
    assert!(gifts[0].spin_triggered);
    assert_eq!(gifts[0].recipients, vec!["lucky".to_string()]);
    Ok(())
}

#[tokio::test]
async fn setthreshold_then_cheer_auto_triggers() -> Result<(), Error> {
    let t = setup_test_tracker().await?;
    let mut rx = t.event_bus.subscribe(None).await;

    t.handler.dispatch(mod_says("!setthreshold bits=500 subs=2")).await;
    assert_eq!(
        rx.recv().await,
        Some(BotEvent::ThresholdsUpdate(Thresholds { bit_threshold: 500, gift_sub_threshold: 2 }))
    );
    assert_eq!(
        t.thresholds.current().await,
        Thresholds { bit_threshold: 500, gift_sub_threshold: 2 }
    );

    t.handler.dispatch(cheer("fan", 600)).await;
    assert!(matches!(rx.recv().await, Some(BotEvent::NewDonation(d)) if d.spin_triggered));
    assert!(matches!(rx.recv().await, Some(BotEvent::SpinAlert(_))));

    // Persisted for the next start.
    let saved = std::fs::read_to_string(t.dir.path().join("config.json"))?;
    let saved: Thresholds = serde_json::from_str(&saved)?;
    assert_eq!(saved, Thresholds { bit_threshold: 500, gift_sub_threshold: 2 });
    Ok(())
}

#[tokio::test]
async fn malformed_setthreshold_changes_nothing() -> Result<(), Error> {
    let t = setup_test_tracker().await?;
    let outcome = t
        .commands
        .handle_chat_message("TheMod", "!setthreshold bits=lots", true)
        .await?;
    assert!(matches!(outcome, CommandOutcome::Rejected(_)));
    assert_eq!(t.thresholds.current().await, Thresholds::default());

    let viewer = t
        .commands
        .handle_chat_message("viewer", "!setthreshold bits=1", false)
        .await?;
    assert!(matches!(viewer, CommandOutcome::Ignored));
    assert_eq!(t.thresholds.current().await, Thresholds::default());
    Ok(())
}

#[tokio::test]
async fn non_moderator_spin_is_audited_not_resolved() -> Result<(), Error> {
    let t = setup_test_tracker().await?;
    t.handler.dispatch(cheer("Carol", 10)).await;

    let outcome = t
        .commands
        .handle_chat_message("viewer", "!spin @Carol", false)
        .await?;
    assert!(matches!(outcome, CommandOutcome::SpinAudited(_)));

    let malformed = t.commands.handle_chat_message("TheMod", "!spin", true).await?;
    assert!(matches!(
        malformed,
        CommandOutcome::SpinFailed { error: Error::InvalidCommandFormat(_), .. }
    ));

    let audit = t.spin_command_log.read_all().await?;
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[0].username, "viewer");
    assert!(!t.donation_log.read_all().await?[0].spin_triggered);
    Ok(())
}

#[tokio::test]
async fn restart_keeps_thresholds_and_rows() -> Result<(), Error> {
    let t = setup_test_tracker().await?;
    assert_ok!(
        t.thresholds
            .save(spinbot_common::models::ThresholdsUpdate {
                bit_threshold: Some(42),
                gift_sub_threshold: None,
            })
            .await
    );
    t.handler.dispatch(cheer("early", 50)).await;

    // A second service stack over the same directory.
    let store = std::sync::Arc::new(spinbot_core::repositories::JsonThresholdStore::new(
        t.dir.path().join("config.json"),
    ));
    let reloaded = spinbot_core::services::ThresholdService::load(store, t.event_bus.clone()).await?;
    assert_eq!(reloaded.current().await.bit_threshold, 42);

    let log = spinbot_core::repositories::DonationLog::new(t.dir.path().join("bit_donations.csv"));
    let rows = log.read_all().await?;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].spin_triggered, "50 bits clears a threshold of 42");
    Ok(())
}
