//! Per-guild settings store
//!
//! Settings live in memory and are written to a JSON object keyed by guild
//! id on every update. Reading an unknown guild yields defaults without
//! touching the file.

use anyhow::Result;
use machine_core::{BriefError, ServerSettings, SettingsUpdate};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

use crate::store::write_atomically;

pub struct SettingsStore {
    path: PathBuf,
    settings: RwLock<HashMap<String, ServerSettings>>,
    /// Serializes update + save so files are written in mutation order.
    save_lock: Mutex<()>,
}

impl SettingsStore {
    /// Empty store backed by `path`; nothing is read.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            settings: RwLock::new(HashMap::new()),
            save_lock: Mutex::new(()),
        }
    }

    /// Load settings from `path`.
    ///
    /// A missing file is a first run: an empty file is written. A corrupt
    /// file is logged and the store starts empty.
    pub async fn load<P: AsRef<Path>>(path: P) -> Self {
        let store = Self::new(path);
        match tokio::fs::read_to_string(&store.path).await {
            Ok(data) => match serde_json::from_str::<HashMap<String, ServerSettings>>(&data) {
                Ok(map) => {
                    let mut settings = store.settings.write().await;
                    for (guild_id, mut s) in map {
                        // The map key is authoritative.
                        s.guild_id = guild_id.clone();
                        settings.insert(guild_id, s);
                    }
                    tracing::info!("Settings loaded successfully ({} guilds)", settings.len());
                }
                Err(e) => {
                    tracing::error!("Error parsing settings {}: {}", store.path.display(), e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings file found, using defaults");
                if let Err(e) = store.save().await {
                    tracing::error!("Error saving settings: {:#}", e);
                }
            }
            Err(e) => {
                tracing::error!("Error loading settings {}: {}", store.path.display(), e);
            }
        }
        store
    }

    /// Settings for `guild_id`, created with defaults on first access.
    pub async fn get(&self, guild_id: &str) -> ServerSettings {
        if let Some(s) = self.settings.read().await.get(guild_id) {
            return s.clone();
        }
        self.settings
            .write()
            .await
            .entry(guild_id.to_string())
            .or_insert_with(|| ServerSettings::new(guild_id))
            .clone()
    }

    /// Settings for a guild only if it has been seen before.
    pub async fn find(&self, guild_id: &str) -> Option<ServerSettings> {
        self.settings.read().await.get(guild_id).cloned()
    }

    /// Guild whose configured brief channel is `channel_id`.
    ///
    /// Guilds without a configured channel never match.
    pub async fn find_by_channel(&self, channel_id: &str) -> Option<ServerSettings> {
        self.settings
            .read()
            .await
            .values()
            .find(|s| s.owns_channel(channel_id))
            .cloned()
    }

    /// Merge `update` into the guild's settings and persist.
    ///
    /// On a write failure the in-memory merge is kept and the error returned.
    pub async fn update(
        &self,
        guild_id: &str,
        update: SettingsUpdate,
    ) -> machine_core::Result<ServerSettings> {
        let _guard = self.save_lock.lock().await;
        let updated = {
            let mut settings = self.settings.write().await;
            let entry = settings
                .entry(guild_id.to_string())
                .or_insert_with(|| ServerSettings::new(guild_id));
            entry.apply(update);
            entry.clone()
        };
        self.write_snapshot()
            .await
            .map_err(|e| BriefError::Persistence(format!("{:#}", e)))?;
        tracing::info!("Settings updated for guild {}", guild_id);
        Ok(updated)
    }

    pub async fn all(&self) -> Vec<ServerSettings> {
        let mut all: Vec<ServerSettings> = self.settings.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.guild_id.cmp(&b.guild_id));
        all
    }

    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        self.write_snapshot().await
    }

    async fn write_snapshot(&self) -> Result<()> {
        let snapshot: BTreeMap<String, ServerSettings> = self
            .settings
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let json = serde_json::to_vec_pretty(&snapshot)?;
        write_atomically(&self.path, &json).await
    }
}
