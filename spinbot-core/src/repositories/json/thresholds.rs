use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use spinbot_common::models::Thresholds;
use spinbot_common::traits::ThresholdStore;

use crate::repositories::atomic_write;
use crate::Error;

/// Keeps the threshold policy in a small JSON document:
/// `{"bitThreshold":1000,"giftSubThreshold":3}`.
#[derive(Debug, Clone)]
pub struct JsonThresholdStore {
    path: PathBuf,
}

impl JsonThresholdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ThresholdStore for JsonThresholdStore {
    async fn load(&self) -> Result<Option<Thresholds>, Error> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let thresholds: Thresholds = serde_json::from_slice(&raw)?;
        thresholds.validate()?;
        debug!("Loaded thresholds from {}: {:?}", self.path.display(), thresholds);
        Ok(Some(thresholds))
    }

    async fn save(&self, thresholds: &Thresholds) -> Result<(), Error> {
        let mut body = serde_json::to_vec_pretty(thresholds)?;
        body.push(b'\n');
        atomic_write(&self.path, body).await
    }
}
