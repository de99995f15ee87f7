//! Summary metrics derived from a full log scan. Nothing is cached; callers
//! read the log and aggregate on every request.

use std::collections::{HashMap, HashSet};

use spinbot_common::models::{
    DonationRecord, DonationStats, GiftSubRecord, GiftSubStats, SpinCommandRecord,
    SpinCommandStats, NO_TOP_USER,
};

/// Per-user running totals that remember first-seen order, so "top user"
/// ties go to whoever appeared first in the log.
#[derive(Debug, Default)]
struct UserTotals {
    order: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl UserTotals {
    fn add(&mut self, username: &str, amount: u64) {
        match self.index.get(username) {
            Some(&i) => self.order[i].1 = self.order[i].1.saturating_add(amount),
            None => {
                self.index.insert(username.to_string(), self.order.len());
                self.order.push((username.to_string(), amount));
            }
        }
    }

    /// First user with the strictly greatest positive total.
    fn top(&self) -> Option<(&str, u64)> {
        let mut best: Option<(&str, u64)> = None;
        for (name, total) in &self.order {
            if *total > best.map_or(0, |(_, t)| t) {
                best = Some((name.as_str(), *total));
            }
        }
        best
    }
}

pub fn donation_stats(records: &[DonationRecord]) -> DonationStats {
    let mut totals = UserTotals::default();
    let mut stats = DonationStats::default();

    for rec in records {
        stats.total_donations += 1;
        stats.total_bits = stats.total_bits.saturating_add(rec.bits);
        if rec.spin_triggered {
            stats.total_spins += 1;
        }
        totals.add(&rec.username, rec.bits);
    }

    if let Some((name, bits)) = totals.top() {
        stats.top_donator = name.to_string();
        stats.top_donator_bits = bits;
    }
    stats
}

pub fn gift_sub_stats(records: &[GiftSubRecord]) -> GiftSubStats {
    let mut totals = UserTotals::default();
    let mut stats = GiftSubStats::default();

    for rec in records {
        stats.total_events += 1;
        stats.total_gift_subs = stats
            .total_gift_subs
            .saturating_add(u64::from(rec.sub_count));
        if rec.spin_triggered {
            stats.total_spins += 1;
        }
        totals.add(&rec.username, u64::from(rec.sub_count));
    }

    match totals.top() {
        Some((name, subs)) => {
            stats.top_gifter = name.to_string();
            stats.top_gifter_subs = subs;
        }
        None => stats.top_gifter = NO_TOP_USER.to_string(),
    }
    stats
}

pub fn spin_command_stats(records: &[SpinCommandRecord]) -> SpinCommandStats {
    let unique: HashSet<String> = records.iter().map(|r| r.username.to_lowercase()).collect();
    SpinCommandStats {
        total_commands: records.len(),
        unique_users: unique.len(),
    }
}
