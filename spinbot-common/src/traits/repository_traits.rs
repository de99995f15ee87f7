use async_trait::async_trait;
use crate::error::Error;
use crate::models::Thresholds;
use crate::traits::record_traits::{LogRecord, SpinFlagged};

/// Append-only log of one record category.
#[async_trait]
pub trait EventLogRepository<R: LogRecord>: Send + Sync {
    /// Writes a new row. The record's timestamp is its key and is not reassigned.
    async fn append(&self, record: &R) -> Result<(), Error>;

    /// Writes a new row under the log's next key and returns the stored record.
    /// Keys are issued in the same critical section as the write, so file order
    /// and key order always agree.
    async fn append_stamped(&self, record: R) -> Result<R, Error>;

    /// Every well-formed row, oldest first.
    async fn read_all(&self) -> Result<Vec<R>, Error>;

    /// Newest first, at most `limit` rows.
    async fn list_most_recent(&self, limit: usize) -> Result<Vec<R>, Error>;

    /// Case-insensitive exact username match, newest row wins.
    async fn find_most_recent_by_username(&self, username: &str) -> Result<Option<R>, Error>;

    /// Raw persisted bytes, or `None` if the log has never been created.
    async fn export_raw(&self) -> Result<Option<Vec<u8>>, Error>;
}

#[async_trait]
pub trait SpinFlagRepository<R: SpinFlagged>: EventLogRepository<R> {
    /// Replaces the spin flag of the row keyed by `timestamp`.
    /// `Error::NotFound` leaves the log untouched.
    async fn update_spin_triggered(&self, timestamp: &str, value: bool) -> Result<FlagUpdate<R>, Error>;
}

/// Result of a spin-flag update: the stored record plus the flag it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagUpdate<R> {
    pub record: R,
    pub previous: bool,
}

impl<R: SpinFlagged> FlagUpdate<R> {
    /// True when this update moved the flag from false to true.
    pub fn newly_triggered(&self) -> bool {
        !self.previous && self.record.spin_triggered()
    }
}

/// Persistence for the process-wide threshold policy.
#[async_trait]
pub trait ThresholdStore: Send + Sync {
    async fn load(&self) -> Result<Option<Thresholds>, Error>;
    async fn save(&self, thresholds: &Thresholds) -> Result<(), Error>;
}
