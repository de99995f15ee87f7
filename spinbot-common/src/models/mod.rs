// File: spinbot-common/src/models/mod.rs
pub mod donation;
pub mod gift_sub;
pub mod spin_command;
pub mod thresholds;
pub mod stats;
pub mod chat;
pub mod spin;

pub use donation::DonationRecord;
pub use gift_sub::GiftSubRecord;
pub use spin_command::SpinCommandRecord;
pub use thresholds::{Thresholds, ThresholdsUpdate};
pub use stats::{DonationStats, GiftSubStats, SpinCommandStats, NO_TOP_USER};
pub use chat::ChatEvent;
pub use spin::{SpinAlert, SpinKind, SpinResolution};
