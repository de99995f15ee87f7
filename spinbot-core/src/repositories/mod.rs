// src/repositories/mod.rs

use std::path::{Path, PathBuf};

use crate::Error;

pub mod csv;
pub mod json;

pub use csv::{CsvEventLog, DonationLog, GiftSubLog, SpinCommandLog};
pub use json::JsonThresholdStore;

/// Replaces `path` with `bytes` through a sibling temp file, so readers see
/// either the old content or the new content and never a partial file.
pub(crate) async fn atomic_write(path: &Path, bytes: Vec<u8>) -> Result<(), Error> {
    let target: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(), Error> {
        use std::io::Write;

        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| Error::StorageUnavailable(std::io::Error::other(e)))?
}
