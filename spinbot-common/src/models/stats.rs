use serde::{Deserialize, Serialize};

/// Sentinel reported as the top user of an empty log.
pub const NO_TOP_USER: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationStats {
    pub total_donations: usize,
    pub total_bits: u64,
    pub total_spins: usize,
    pub top_donator: String,
    pub top_donator_bits: u64,
}

impl Default for DonationStats {
    fn default() -> Self {
        Self {
            total_donations: 0,
            total_bits: 0,
            total_spins: 0,
            top_donator: NO_TOP_USER.to_string(),
            top_donator_bits: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSubStats {
    /// Sum of `subCount` over all bundles.
    pub total_gift_subs: u64,
    /// Number of bundles.
    pub total_events: usize,
    pub total_spins: usize,
    pub top_gifter: String,
    pub top_gifter_subs: u64,
}

impl Default for GiftSubStats {
    fn default() -> Self {
        Self {
            total_gift_subs: 0,
            total_events: 0,
            total_spins: 0,
            top_gifter: NO_TOP_USER.to_string(),
            top_gifter_subs: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinCommandStats {
    pub total_commands: usize,
    pub unique_users: usize,
}
