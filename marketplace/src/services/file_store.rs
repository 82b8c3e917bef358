//! JSON file persistence store
//!
//! Writes the snapshot to a sibling temp file and renames it over the target,
//! so a crash mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shared::logging::Component;
use shared::{market_debug, StateSnapshot};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{MarketError, MarketResult};
use crate::traits::StateStore;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> MarketResult<Option<StateSnapshot>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let snapshot = serde_json::from_str(&contents).map_err(|e| MarketError::Persistence {
            message: format!("{} is not a valid snapshot: {}", self.path.display(), e),
        })?;
        market_debug!(Component::Persistence, "Loaded snapshot from {}", self.path.display());
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &StateSnapshot) -> MarketResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(snapshot)?;

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp, &self.path).await?;

        market_debug!(Component::Persistence, "Saved snapshot ({} bytes) to {}", json.len(), self.path.display());
        Ok(())
    }
}
