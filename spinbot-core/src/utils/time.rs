use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Formats like JavaScript's `toISOString`: `2024-05-01T10:00:00.123Z`.
pub fn to_iso_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_iso(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Issues row keys for one log. Keys are millisecond ISO-8601 strings and
/// strictly increase, even when two rows land in the same millisecond.
#[derive(Debug, Default)]
pub struct LogClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl LogClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure later keys sort after `ts` (e.g. the newest row on disk).
    pub fn observe(&self, ts: &str) {
        if let Some(seen) = parse_iso(ts) {
            let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
            if last.map_or(true, |l| seen > l) {
                *last = Some(seen);
            }
        }
    }

    pub fn next(&self) -> String {
        self.next_at(Utc::now())
    }

    pub fn next_at(&self, now: DateTime<Utc>) -> String {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let mut candidate = truncate_millis(now);
        if let Some(prev) = *last {
            if candidate <= prev {
                candidate = prev + Duration::milliseconds(1);
            }
        }
        *last = Some(candidate);
        to_iso_millis(candidate)
    }
}

fn truncate_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}
