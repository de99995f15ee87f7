// src/repositories/csv/mod.rs

pub mod codec;
pub mod event_log;

use spinbot_common::models::{DonationRecord, GiftSubRecord, SpinCommandRecord};

pub use event_log::CsvEventLog;

pub type DonationLog = CsvEventLog<DonationRecord>;
pub type GiftSubLog = CsvEventLog<GiftSubRecord>;
pub type SpinCommandLog = CsvEventLog<SpinCommandRecord>;

pub const DONATIONS_FILE: &str = "bit_donations.csv";
pub const GIFT_SUBS_FILE: &str = "gift_subs.csv";
pub const SPIN_COMMANDS_FILE: &str = "spin_commands.csv";
