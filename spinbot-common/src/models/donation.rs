use serde::{Deserialize, Serialize};

use crate::traits::record_traits::{parse_flag, LogField, LogRecord, SpinFlagged};

/// A bit cheer, one row of `bit_donations.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub timestamp: String,
    pub username: String,
    pub bits: u64,
    pub message: String,
    pub spin_triggered: bool,
}

impl LogRecord for DonationRecord {
    const HEADER: &'static [&'static str] =
        &["Timestamp", "Username", "Bits", "Message", "SpinTriggered"];

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn set_timestamp(&mut self, timestamp: String) {
        self.timestamp = timestamp;
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn to_fields(&self) -> Vec<LogField> {
        vec![
            LogField::plain(&self.timestamp),
            LogField::text(self.username.clone()),
            LogField::plain(self.bits),
            LogField::text(self.message.clone()),
            LogField::flag(self.spin_triggered),
        ]
    }

    fn from_fields(fields: &[String]) -> Option<Self> {
        if fields.len() < 5 {
            return None;
        }
        let bits = fields[2].trim().parse::<u64>().ok()?;
        Some(Self {
            timestamp: fields[0].trim().to_string(),
            username: fields[1].clone(),
            bits,
            message: fields[3].clone(),
            spin_triggered: parse_flag(&fields[4]),
        })
    }
}

impl SpinFlagged for DonationRecord {
    fn spin_triggered(&self) -> bool {
        self.spin_triggered
    }

    fn set_spin_triggered(&mut self, value: bool) {
        self.spin_triggered = value;
    }
}
