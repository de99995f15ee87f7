//! src/repositories/csv/event_log.rs
//!
//! File-backed append-only log, one per record category. Each log owns a
//! mutex that every read and write goes through; single-row updates rewrite
//! the whole file through a temp file and an atomic rename. New keys are
//! issued under that same mutex.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use spinbot_common::traits::{
    EventLogRepository, FlagUpdate, LogRecord, SpinFlagRepository, SpinFlagged,
};

use super::codec::{encode_header, encode_row, split_row};
use crate::repositories::atomic_write;
use crate::utils::time::LogClock;
use crate::Error;

/// State guarded by the log mutex.
#[derive(Debug, Default)]
struct LogState {
    clock: LogClock,
    /// Set once the clock has seen the newest row on disk.
    seeded: bool,
}

pub struct CsvEventLog<R> {
    path: PathBuf,
    lock: Mutex<LogState>,
    _record: PhantomData<fn() -> R>,
}

impl<R: LogRecord> CsvEventLog<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(LogState::default()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file with only its header row if it does not exist yet.
    pub async fn initialize(&self) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let mut header = encode_header(R::HEADER);
                header.push('\n');
                atomic_write(&self.path, header.into_bytes()).await?;
                info!("Created log file {}", self.path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_content(&self) -> Result<Option<String>, Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn parse_records(&self, content: &str) -> Vec<R> {
        data_lines(content)
            .filter_map(|line| {
                let rec = decode::<R>(line);
                if rec.is_none() {
                    warn!("Skipping malformed row in {}: {}", self.path.display(), line);
                }
                rec
            })
            .collect()
    }

    /// Writes one row, plus the header for an empty file. Callers hold the lock.
    async fn write_row(&self, record: &R) -> Result<(), Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut chunk = String::new();
        if file.metadata().await?.len() == 0 {
            chunk.push_str(&encode_header(R::HEADER));
            chunk.push('\n');
        }
        chunk.push_str(&encode_row(&record.to_fields()));
        chunk.push('\n');

        // One write call per row keeps partial rows out of other readers' way.
        file.write_all(chunk.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended row {} to {}", record.timestamp(), self.path.display());
        Ok(())
    }

    async fn read_records(&self) -> Result<Vec<R>, Error> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_content()
            .await?
            .map(|c| self.parse_records(&c))
            .unwrap_or_default())
    }
}

fn decode<R: LogRecord>(line: &str) -> Option<R> {
    split_row(line).and_then(|cells| R::from_fields(&cells))
}

/// Non-blank lines of a log document with CR stripped.
fn content_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
}

/// Data rows of a log document: everything after the header.
fn data_lines(content: &str) -> impl Iterator<Item = &str> {
    content_lines(content).skip(1)
}

#[async_trait]
impl<R: LogRecord> EventLogRepository<R> for CsvEventLog<R> {
    async fn append(&self, record: &R) -> Result<(), Error> {
        let state = self.lock.lock().await;
        self.write_row(record).await?;
        state.clock.observe(record.timestamp());
        Ok(())
    }

    async fn append_stamped(&self, mut record: R) -> Result<R, Error> {
        let mut state = self.lock.lock().await;
        if !state.seeded {
            if let Some(content) = self.read_content().await? {
                if let Some(last) = self.parse_records(&content).last() {
                    state.clock.observe(last.timestamp());
                }
            }
            state.seeded = true;
        }

        record.set_timestamp(state.clock.next());
        self.write_row(&record).await?;
        Ok(record)
    }

    async fn read_all(&self) -> Result<Vec<R>, Error> {
        self.read_records().await
    }

    async fn list_most_recent(&self, limit: usize) -> Result<Vec<R>, Error> {
        let records = self.read_records().await?;
        Ok(records.into_iter().rev().take(limit).collect())
    }

    async fn find_most_recent_by_username(&self, username: &str) -> Result<Option<R>, Error> {
        let wanted = username.to_lowercase();
        let records = self.read_records().await?;
        Ok(records
            .into_iter()
            .rev()
            .find(|r| r.username().to_lowercase() == wanted))
    }

    async fn export_raw(&self) -> Result<Option<Vec<u8>>, Error> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<R: SpinFlagged> SpinFlagRepository<R> for CsvEventLog<R> {
    async fn update_spin_triggered(
        &self,
        timestamp: &str,
        value: bool,
    ) -> Result<FlagUpdate<R>, Error> {
        let _guard = self.lock.lock().await;
        let not_found = || Error::NotFound(format!("no record with timestamp {}", timestamp));

        let content = self.read_content().await?.ok_or_else(not_found)?;

        let mut out = String::with_capacity(content.len() + 8);
        let mut updated: Option<FlagUpdate<R>> = None;

        for (i, line) in content_lines(&content).enumerate() {
            if i > 0 && updated.is_none() {
                if let Some(mut rec) = decode::<R>(line) {
                    if rec.timestamp() == timestamp {
                        let previous = rec.spin_triggered();
                        rec.set_spin_triggered(value);
                        out.push_str(&encode_row(&rec.to_fields()));
                        out.push('\n');
                        updated = Some(FlagUpdate { record: rec, previous });
                        continue;
                    }
                }
            }
            out.push_str(line);
            out.push('\n');
        }

        let update = updated.ok_or_else(not_found)?;
        if update.previous != value {
            atomic_write(&self.path, out.into_bytes()).await?;
            debug!(
                "Set spinTriggered={} on {} in {}",
                value,
                timestamp,
                self.path.display()
            );
        }
        Ok(update)
    }
}
