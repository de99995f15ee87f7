use serde::{Deserialize, Serialize};

use super::donation::DonationRecord;
use super::gift_sub::GiftSubRecord;

/// Which log a spin was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinKind {
    BitDonation,
    GiftSub,
}

impl SpinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinKind::BitDonation => "bit_donation",
            SpinKind::GiftSub => "gift_sub",
        }
    }
}

/// Payload of a `spin-alert` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinAlert {
    pub kind: SpinKind,
    pub timestamp: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_count: Option<u32>,
    pub is_gift_sub: bool,
}

impl From<&DonationRecord> for SpinAlert {
    fn from(rec: &DonationRecord) -> Self {
        Self {
            kind: SpinKind::BitDonation,
            timestamp: rec.timestamp.clone(),
            username: rec.username.clone(),
            bits: Some(rec.bits),
            message: Some(rec.message.clone()),
            sub_count: None,
            is_gift_sub: false,
        }
    }
}

impl From<&GiftSubRecord> for SpinAlert {
    fn from(rec: &GiftSubRecord) -> Self {
        Self {
            kind: SpinKind::GiftSub,
            timestamp: rec.timestamp.clone(),
            username: rec.username.clone(),
            bits: None,
            message: None,
            sub_count: Some(rec.sub_count),
            is_gift_sub: true,
        }
    }
}

/// Successful outcome of resolving `!spin <user>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SpinResolution {
    /// A record was flipped to spin-triggered.
    Triggered {
        kind: SpinKind,
        timestamp: String,
        username: String,
    },
    /// Every matching record was already triggered; nothing changed.
    AlreadyTriggered {
        kind: SpinKind,
        timestamp: String,
        username: String,
    },
}

impl SpinResolution {
    pub fn kind(&self) -> SpinKind {
        match self {
            SpinResolution::Triggered { kind, .. } => *kind,
            SpinResolution::AlreadyTriggered { kind, .. } => *kind,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            SpinResolution::Triggered { timestamp, .. } => timestamp,
            SpinResolution::AlreadyTriggered { timestamp, .. } => timestamp,
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, SpinResolution::Triggered { .. })
    }
}
