use serde::{Deserialize, Serialize};

use crate::traits::record_traits::{parse_flag, LogField, LogRecord, SpinFlagged};

/// Separator used inside the single recipients cell.
const RECIPIENT_SEPARATOR: char = ';';

/// A gift-sub bundle, one row of `gift_subs.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSubRecord {
    pub timestamp: String,
    pub username: String,
    pub sub_count: u32,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub spin_triggered: bool,
}

impl LogRecord for GiftSubRecord {
    const HEADER: &'static [&'static str] =
        &["Timestamp", "Username", "SubCount", "Recipients", "SpinTriggered"];

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
        let joined = self
            .recipients
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(&RECIPIENT_SEPARATOR.to_string());
        vec![
            LogField::plain(&self.timestamp),
            LogField::text(self.username.clone()),
            LogField::plain(self.sub_count),
            LogField::text(joined),
            LogField::flag(self.spin_triggered),
        ]
    }

    fn from_fields(fields: &[String]) -> Option<Self> {
        if fields.len() < 5 {
            return None;
        }
        let sub_count = fields[2].trim().parse::<u32>().ok()?;
        let recipients = fields[3]
            .split(RECIPIENT_SEPARATOR)
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(|r| r.to_string())
            .collect();
        Some(Self {
            timestamp: fields[0].trim().to_string(),
            username: fields[1].clone(),
            sub_count,
            recipients,
            spin_triggered: parse_flag(&fields[4]),
        })
    }
}

impl SpinFlagged for GiftSubRecord {
    fn spin_triggered(&self) -> bool {
        self.spin_triggered
    }

    fn set_spin_triggered(&mut self, value: bool) {
        self.spin_triggered = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_recipient_cell_yields_no_recipients() {
        let fields: Vec<String> = ["2024-01-01T00:00:00.000Z", "gifter", "5", "", "YES"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rec = GiftSubRecord::from_fields(&fields).unwrap();
        assert!(rec.recipients.is_empty());
        assert!(rec.spin_triggered);
        assert_eq!(rec.sub_count, 5);
    }

    #[test]
    fn recipients_share_one_cell() {
        let rec = GiftSubRecord {
            timestamp: "t".into(),
            username: "gifter".into(),
            sub_count: 2,
            recipients: vec!["a".into(), "b".into()],
            spin_triggered: false,
        };
        assert_eq!(rec.to_fields()[3], LogField::Text("a;b".into()));
    }
}
