//! JSON file persistence for the active brief set.
//!
//! The whole set is rewritten on every mutation. Writes go to a sibling
//! temp file first and are renamed into place so a crash never leaves a
//! truncated store behind.

use anyhow::{Context, Result};
use async_trait::async_trait;
use machine_core::{Brief, BriefStore};
use std::path::{Path, PathBuf};

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BriefStore for JsonFileStore {
    async fn read_all(&self) -> Result<Vec<Brief>> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read brief store {}", self.path.display()))?;
        let briefs: Vec<Brief> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse brief store {}", self.path.display()))?;
        Ok(briefs)
    }

    async fn write_all(&self, briefs: &[Brief]) -> Result<()> {
        let json = serde_json::to_vec_pretty(briefs)?;
        write_atomically(&self.path, &json).await
    }
}

/// Write `bytes` to `path` via a temp file + rename, creating parent dirs.
pub(crate) async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
