//! Row-level contract shared by every append-only log.
//!
//! A record knows its own column layout; the storage layer only knows how to
//! quote, split and order rows.

/// One cell of a persisted row. `Text` cells are written inside double quotes,
/// `Plain` cells are written verbatim (numbers, flags, timestamps).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogField {
    Plain(String),
    Text(String),
}

impl LogField {
    pub fn plain(value: impl ToString) -> Self {
        LogField::Plain(value.to_string())
    }

    pub fn text(value: impl Into<String>) -> Self {
        LogField::Text(value.into())
    }

    pub fn flag(value: bool) -> Self {
        LogField::Plain(if value { "YES" } else { "NO" }.to_string())
    }
}

/// Parses the legacy `YES`/`NO` flag column.
pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("YES")
}

pub trait LogRecord: Clone + Send + Sync + 'static {
    /// Column names written as the first row of a fresh log.
    const HEADER: &'static [&'static str];

    /// Unique, append-ordered key of the row.
    fn timestamp(&self) -> &str;

    /// Assigns the key. Only the log that stores the record calls this.
    fn set_timestamp(&mut self, timestamp: String);

    fn username(&self) -> &str;

    fn to_fields(&self) -> Vec<LogField>;

    /// Rebuilds a record from unquoted cells. Returns `None` for rows that do
    /// not have the expected shape; callers skip those.
    fn from_fields(fields: &[String]) -> Option<Self>;
}

/// Records that carry a `spinTriggered` flag.
pub trait SpinFlagged: LogRecord {
    fn spin_triggered(&self) -> bool;
    fn set_spin_triggered(&mut self, value: bool);
}
