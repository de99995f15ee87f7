use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_BIT_THRESHOLD: u64 = 1000;
pub const DEFAULT_GIFT_SUB_THRESHOLD: u32 = 3;

/// Minimum magnitudes that auto-qualify an event for a spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub bit_threshold: u64,
    pub gift_sub_threshold: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bit_threshold: DEFAULT_BIT_THRESHOLD,
            gift_sub_threshold: DEFAULT_GIFT_SUB_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn cheer_qualifies(&self, bits: u64) -> bool {
        bits >= self.bit_threshold
    }

    pub fn gift_subs_qualify(&self, sub_count: u32) -> bool {
        sub_count >= self.gift_sub_threshold
    }

    /// Applies a partial update; omitted fields keep their current value.
    pub fn merged(&self, update: &ThresholdsUpdate) -> Result<Self, Error> {
        if update.bit_threshold.is_none() && update.gift_sub_threshold.is_none() {
            return Err(Error::Validation(
                "at least one of bitThreshold or giftSubThreshold is required".into(),
            ));
        }
        let merged = Self {
            bit_threshold: update.bit_threshold.unwrap_or(self.bit_threshold),
            gift_sub_threshold: update.gift_sub_threshold.unwrap_or(self.gift_sub_threshold),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Both thresholds must be positive.
    pub fn validate(&self) -> Result<(), Error> {
        if self.bit_threshold == 0 {
            return Err(Error::Validation("bitThreshold must be a positive integer".into()));
        }
        if self.gift_sub_threshold == 0 {
            return Err(Error::Validation("giftSubThreshold must be a positive integer".into()));
        }
        Ok(())
    }
}

/// Partial threshold change, as sent by the REST surface or `!setthreshold`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdsUpdate {
    #[serde(default)]
    pub bit_threshold: Option<u64>,
    #[serde(default)]
    pub gift_sub_threshold: Option<u32>,
}
