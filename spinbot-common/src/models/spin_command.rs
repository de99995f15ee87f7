use serde::{Deserialize, Serialize};

use crate::traits::record_traits::{LogField, LogRecord};

/// Audit entry for any chat line starting with `!spin`. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinCommandRecord {
    pub timestamp: String,
    pub username: String,
    pub command: String,
}

impl LogRecord for SpinCommandRecord {
    const HEADER: &'static [&'static str] = &["Timestamp", "Username", "Command"];

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
            LogField::text(self.command.clone()),
        ]
    }

    fn from_fields(fields: &[String]) -> Option<Self> {
        if fields.len() < 3 {
            return None;
        }
        Some(Self {
            timestamp: fields[0].trim().to_string(),
            username: fields[1].clone(),
            command: fields[2].clone(),
        })
    }
}
