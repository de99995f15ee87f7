use std::sync::Arc;

use tracing::{debug, info, warn};

use spinbot_common::models::{SpinCommandRecord, SpinResolution, Thresholds, ThresholdsUpdate};

use crate::services::donation_service::DonationService;
use crate::services::spin_resolver::SpinResolver;
use crate::Error;

pub const SPIN_PREFIX: &str = "!spin";
pub const SET_THRESHOLD_COMMAND: &str = "!setthreshold";

/// What a chat line turned into.
#[derive(Debug)]
pub enum CommandOutcome {
    /// Not a command this service handles, or the sender lacked privilege
    /// for a gated command that has no audit trail.
    Ignored,
    /// Audited, but the sender is not a moderator or broadcaster.
    SpinAudited(SpinCommandRecord),
    SpinResolved {
        audit: SpinCommandRecord,
        resolution: SpinResolution,
    },
    /// Audited and attempted; chat never hears about the failure.
    SpinFailed {
        audit: SpinCommandRecord,
        error: Error,
    },
    ThresholdsUpdated(Thresholds),
    /// Privileged `!setthreshold` with arguments that did not parse.
    Rejected(String),
}

/// True for any line the spin audit trail must record.
pub fn is_spin_command(text: &str) -> bool {
    let text = text.trim_start();
    text.get(..SPIN_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SPIN_PREFIX))
}

/// Parses the arguments of `!setthreshold bits=<int> subs=<int>`. Either key
/// may be omitted, but not both; any unknown key or bad value fails the
/// whole command.
pub fn parse_set_threshold(text: &str) -> Result<ThresholdsUpdate, Error> {
    let mut parts = text.split_whitespace();
    match parts.next() {
        Some(cmd) if cmd.eq_ignore_ascii_case(SET_THRESHOLD_COMMAND) => {}
        _ => return Err(Error::InvalidCommandFormat(text.to_string())),
    }

    let bad = |arg: &str| Error::InvalidCommandFormat(format!("bad argument '{}'", arg));
    let mut update = ThresholdsUpdate::default();

    for arg in parts {
        let (key, value) = arg.split_once('=').ok_or_else(|| bad(arg))?;
        match key.to_ascii_lowercase().as_str() {
            "bits" => {
                let bits: u64 = value.parse().map_err(|_| bad(arg))?;
                update.bit_threshold = Some(bits);
            }
            "subs" => {
                let subs: u32 = value.parse().map_err(|_| bad(arg))?;
                update.gift_sub_threshold = Some(subs);
            }
            _ => return Err(bad(arg)),
        }
    }

    if update.bit_threshold == Some(0) || update.gift_sub_threshold == Some(0) {
        return Err(Error::InvalidCommandFormat("thresholds must be positive".into()));
    }
    if update == ThresholdsUpdate::default() {
        return Err(Error::InvalidCommandFormat("expected bits=<int> and/or subs=<int>".into()));
    }
    Ok(update)
}

pub struct CommandService {
    donations: Arc<DonationService>,
    resolver: Arc<SpinResolver>,
}

impl CommandService {
    pub fn new(donations: Arc<DonationService>, resolver: Arc<SpinResolver>) -> Self {
        debug!("Initializing CommandService");
        Self { donations, resolver }
    }

    /// Handles one chat line. Only an audit write failure is returned as an
    /// error; command failures are logged and reported in the outcome.
    pub async fn handle_chat_message(
        &self,
        username: &str,
        text: &str,
        is_privileged: bool,
    ) -> Result<CommandOutcome, Error> {
        let trimmed = text.trim();

        if is_spin_command(trimmed) {
            let audit = self.donations.record_spin_command(username, trimmed).await?;
            if !is_privileged {
                debug!("'{}' from non-moderator {} audited only", trimmed, username);
                return Ok(CommandOutcome::SpinAudited(audit));
            }

            return Ok(match self.resolver.resolve_spin(trimmed).await {
                Ok(resolution) => CommandOutcome::SpinResolved { audit, resolution },
                Err(error) => {
                    warn!("'{}' from {} not resolved: {}", trimmed, username, error);
                    CommandOutcome::SpinFailed { audit, error }
                }
            });
        }

        let is_set_threshold = trimmed
            .split_whitespace()
            .next()
            .is_some_and(|cmd| cmd.eq_ignore_ascii_case(SET_THRESHOLD_COMMAND));
        if !is_set_threshold {
            return Ok(CommandOutcome::Ignored);
        }
        if !is_privileged {
            debug!("Ignoring {} from non-moderator {}", SET_THRESHOLD_COMMAND, username);
            return Ok(CommandOutcome::Ignored);
        }

        let update = match parse_set_threshold(trimmed) {
            Ok(u) => u,
            Err(e) => {
                warn!("Malformed '{}' from {}: {}", trimmed, username, e);
                return Ok(CommandOutcome::Rejected(e.to_string()));
            }
        };

        let thresholds = self.donations.thresholds().save(update).await?;
        info!(
            "{} set thresholds to {} bits / {} gift subs",
            username, thresholds.bit_threshold, thresholds.gift_sub_threshold
        );
        Ok(CommandOutcome::ThresholdsUpdated(thresholds))
    }
}
