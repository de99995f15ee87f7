//! Resolves a moderator's `!spin <user>` into a concrete record update.
//!
//! The newest donation for the user is tried first, then the newest gift-sub
//! bundle. A record that is already triggered is skipped rather than treated
//! as an error, so a second `!spin` for the same user reaches the next
//! actionable record or reports that nothing is left to do.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use spinbot_common::models::{DonationRecord, GiftSubRecord, SpinAlert, SpinKind, SpinResolution};
use spinbot_common::traits::{SpinFlagRepository, SpinFlagged};

use crate::eventbus::{BotEvent, EventBus};
use crate::Error;

static SPIN_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^!spin(?:\s+@?(?P<target>\w+))?(?:\s+.*)?$").expect("valid spin regex")
});

/// Extracts the target of `!spin @name` / `!spin name`.
pub fn parse_spin_target(text: &str) -> Result<String, Error> {
    let text = text.trim();
    SPIN_COMMAND
        .captures(text)
        .and_then(|caps| caps.name("target"))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidCommandFormat(text.to_string()))
}

pub struct SpinResolver {
    donations: Arc<dyn SpinFlagRepository<DonationRecord>>,
    gift_subs: Arc<dyn SpinFlagRepository<GiftSubRecord>>,
    event_bus: Arc<EventBus>,
}

impl SpinResolver {
    pub fn new(
        donations: Arc<dyn SpinFlagRepository<DonationRecord>>,
        gift_subs: Arc<dyn SpinFlagRepository<GiftSubRecord>>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            donations,
            gift_subs,
            event_bus,
        }
    }

    /// Parses the command text, then resolves its target.
    pub async fn resolve_spin(&self, text: &str) -> Result<SpinResolution, Error> {
        let target = parse_spin_target(text)?;
        self.resolve_target(&target).await
    }

    pub async fn resolve_target(&self, target: &str) -> Result<SpinResolution, Error> {
        let donation = self.donations.find_most_recent_by_username(target).await?;
        if let Some(rec) = donation.as_ref().filter(|r| !r.spin_triggered) {
            if let Some(done) = self.trigger(&*self.donations, rec, SpinKind::BitDonation).await? {
                return Ok(done);
            }
        }

        let gift = self.gift_subs.find_most_recent_by_username(target).await?;
        if let Some(rec) = gift.as_ref().filter(|r| !r.spin_triggered) {
            if let Some(done) = self.trigger(&*self.gift_subs, rec, SpinKind::GiftSub).await? {
                return Ok(done);
            }
        }

        let already = match (donation, gift) {
            (Some(d), _) => SpinResolution::AlreadyTriggered {
                kind: SpinKind::BitDonation,
                timestamp: d.timestamp,
                username: d.username,
            },
            (None, Some(g)) => SpinResolution::AlreadyTriggered {
                kind: SpinKind::GiftSub,
                timestamp: g.timestamp,
                username: g.username,
            },
            (None, None) => return Err(Error::NoMatchFound(target.to_string())),
        };
        debug!("Nothing left to spin for {}", target);
        Ok(already)
    }

    /// Flips one record. `None` means another writer set it first.
    async fn trigger<R>(
        &self,
        repo: &dyn SpinFlagRepository<R>,
        rec: &R,
        kind: SpinKind,
    ) -> Result<Option<SpinResolution>, Error>
    where
        R: SpinFlagged,
        for<'a> SpinAlert: From<&'a R>,
    {
        let update = repo.update_spin_triggered(rec.timestamp(), true).await?;
        if !update.newly_triggered() {
            return Ok(None);
        }

        info!("Spin resolved: {} ({})", update.record.username(), kind.as_str());
        self.event_bus
            .publish(BotEvent::SpinAlert(SpinAlert::from(&update.record)))
            .await;
        Ok(Some(SpinResolution::Triggered {
            kind,
            timestamp: update.record.timestamp().to_string(),
            username: update.record.username().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{DonationLog, GiftSubLog};
    use spinbot_common::traits::EventLogRepository;
    use tempfile::TempDir;

    #[test]
    fn parses_targets() {
        assert_eq!(parse_spin_target("!spin @Alice").unwrap(), "Alice");
        assert_eq!(parse_spin_target("!spin bob").unwrap(), "bob");
        assert_eq!(parse_spin_target("  !SPIN   @carol please ").unwrap(), "carol");
    }

    #[test]
    fn rejects_malformed_commands() {
        for text in ["!spin", "!spin @", "!spinner bob", "spin bob", ""] {
            let err = parse_spin_target(text).unwrap_err();
            assert!(matches!(err, Error::InvalidCommandFormat(_)), "{text:?}");
        }
    }

    struct Fixture {
        _dir: TempDir,
        donations: Arc<DonationLog>,
        gift_subs: Arc<GiftSubLog>,
        bus: Arc<EventBus>,
        resolver: SpinResolver,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let donations = Arc::new(DonationLog::new(dir.path().join("d.csv")));
        let gift_subs = Arc::new(GiftSubLog::new(dir.path().join("g.csv")));
        let bus = Arc::new(EventBus::new());
        let resolver = SpinResolver::new(donations.clone(), gift_subs.clone(), bus.clone());
        Fixture { _dir: dir, donations, gift_subs, bus, resolver }
    }

    fn donation(ts: &str, user: &str, spin: bool) -> DonationRecord {
        DonationRecord {
            timestamp: ts.into(),
            username: user.into(),
            bits: 100,
            message: String::new(),
            spin_triggered: spin,
        }
    }

    fn gift(ts: &str, user: &str, spin: bool) -> GiftSubRecord {
        GiftSubRecord {
            timestamp: ts.into(),
            username: user.into(),
            sub_count: 1,
            recipients: vec!["r".into()],
            spin_triggered: spin,
        }
    }

    #[tokio::test]
    async fn marks_newest_donation() {
        let f = fixture();
        f.donations.append(&donation("2024-01-01T00:00:00.000Z", "alice", false)).await.unwrap();
        f.donations.append(&donation("2024-01-01T00:00:01.000Z", "Alice", false)).await.unwrap();
        let mut rx = f.bus.subscribe(None).await;

        let res = f.resolver.resolve_spin("!spin @ALICE").await.unwrap();
        assert_eq!(
            res,
            SpinResolution::Triggered {
                kind: SpinKind::BitDonation,
                timestamp: "2024-01-01T00:00:01.000Z".into(),
                username: "Alice".into(),
            }
        );
        assert!(matches!(rx.recv().await, Some(BotEvent::SpinAlert(a)) if !a.is_gift_sub));

        let all = f.donations.read_all().await.unwrap();
        assert!(!all[0].spin_triggered);
        assert!(all[1].spin_triggered);
    }

    #[tokio::test]
    async fn falls_through_to_gift_sub() {
        let f = fixture();
        f.gift_subs.append(&gift("2024-01-01T00:00:00.000Z", "Alice", false)).await.unwrap();
        f.donations.append(&donation("2024-01-01T00:00:05.000Z", "Alice", true)).await.unwrap();

        let res = f.resolver.resolve_spin("!spin @Alice").await.unwrap();
        assert_eq!(res.kind(), SpinKind::GiftSub);
        assert!(res.is_triggered());
        assert!(f.gift_subs.read_all().await.unwrap()[0].spin_triggered);
    }

    #[tokio::test]
    async fn second_resolve_is_quiet() {
        let f = fixture();
        f.donations.append(&donation("2024-01-01T00:00:00.000Z", "bob", false)).await.unwrap();
        assert!(f.resolver.resolve_target("bob").await.unwrap().is_triggered());

        let mut rx = f.bus.subscribe(None).await;
        let again = f.resolver.resolve_target("bob").await.unwrap();
        assert_eq!(
            again,
            SpinResolution::AlreadyTriggered {
                kind: SpinKind::BitDonation,
                timestamp: "2024-01-01T00:00:00.000Z".into(),
                username: "bob".into(),
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_user_is_no_match() {
        let f = fixture();
        f.donations.append(&donation("2024-01-01T00:00:00.000Z", "bob", false)).await.unwrap();
        let err = f.resolver.resolve_target("nobody").await.unwrap_err();
        assert!(matches!(err, Error::NoMatchFound(ref name) if name == "nobody"));
    }
}
