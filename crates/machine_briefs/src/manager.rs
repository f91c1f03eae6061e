//! Brief Lifecycle Manager
//!
//! Owns the set of active briefs for the lifetime of the process:
//! - creation: generate content, post it, register it, persist the set
//! - completion / cancellation: terminal transition, removal, persist
//! - queries: active, expired, by id
//!
//! Collaborators (generator, channel, alert sink, store) are injected at
//! construction. Generation failures raise exactly one admin alert and
//! leave no trace in the active set; post failures and store write failures
//! are logged and do not undo the in-memory change.

use chrono::{DateTime, Utc};
use machine_core::{
    AlertSink, Brief, BriefError, BriefGenerator, BriefMessage, BriefStatus, BriefStore, Language,
    MessageChannel, Result, ServerSettings,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Everything needed to issue one brief.
#[derive(Debug, Clone, PartialEq)]
pub struct BriefRequest {
    pub channel_id: String,
    /// Used only when the generated deadline label has no day count.
    pub duration_hours: u32,
    pub guild_id: Option<String>,
    pub language: Language,
}

impl BriefRequest {
    pub fn new(channel_id: &str, duration_hours: u32) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            duration_hours,
            guild_id: None,
            language: Language::default(),
        }
    }

    /// A brief for `channel_id` using the guild's duration and language.
    pub fn for_guild(settings: &ServerSettings, channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            duration_hours: settings.brief_duration_hours,
            guild_id: Some(settings.guild_id.clone()),
            language: settings.language,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BriefStats {
    pub active: usize,
    pub overdue: usize,
    pub completed: usize,
    pub cancelled: usize,
}

pub struct BriefManager {
    generator: Arc<dyn BriefGenerator>,
    channel: Arc<dyn MessageChannel>,
    alerts: Arc<dyn AlertSink>,
    store: Arc<dyn BriefStore>,

    /// Active briefs keyed by id.
    active: RwLock<HashMap<String, Brief>>,

    /// Briefs that reached a terminal status during this process.
    finished: RwLock<HashMap<String, Brief>>,

    /// Held across "mutate + snapshot + write" so snapshots hit the store in order.
    persist_lock: Mutex<()>,
}

impl BriefManager {
    /// Manager with an empty active set; the store is not read.
    pub fn new(
        generator: Arc<dyn BriefGenerator>,
        channel: Arc<dyn MessageChannel>,
        alerts: Arc<dyn AlertSink>,
        store: Arc<dyn BriefStore>,
    ) -> Self {
        Self {
            generator,
            channel,
            alerts,
            store,
            active: RwLock::new(HashMap::new()),
            finished: RwLock::new(HashMap::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Manager restored from the durable store.
    ///
    /// An absent or unreadable store is a valid first run: the manager
    /// starts empty and a warning is logged.
    pub async fn load(
        generator: Arc<dyn BriefGenerator>,
        channel: Arc<dyn MessageChannel>,
        alerts: Arc<dyn AlertSink>,
        store: Arc<dyn BriefStore>,
    ) -> Self {
        let manager = Self::new(generator, channel, alerts, store);
        match manager.store.read_all().await {
            Ok(briefs) => {
                let mut active = manager.active.write().await;
                for brief in briefs {
                    if brief.is_active() {
                        active.insert(brief.id.clone(), brief);
                    } else {
                        tracing::debug!("Skipping stored brief {} ({})", brief.id, brief.status);
                    }
                }
                tracing::info!("Loaded {} active briefs from store", active.len());
            }
            Err(e) => {
                tracing::warn!("Brief store unavailable, starting empty: {:#}", e);
            }
        }
        manager
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a brief in `channel_id` with default guild-less settings.
    pub async fn create_brief(&self, channel_id: &str, duration_hours: u32) -> Result<Brief> {
        self.create(BriefRequest::new(channel_id, duration_hours)).await
    }

    pub async fn create(&self, request: BriefRequest) -> Result<Brief> {
        let content = match self.generator.generate(request.language).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(
                    "Error generating brief for channel {} ({}): {:#}",
                    request.channel_id,
                    self.generator.name(),
                    e
                );
                self.alert(
                    &format!(
                        "La génération d'un brief a échoué pour le salon <#{}>.",
                        request.channel_id
                    ),
                    &format!("{:#}", e),
                )
                .await;
                return Err(BriefError::Generation(e.to_string()));
            }
        };

        let mut brief = Brief::new(content, &request.channel_id, request.duration_hours, Utc::now());
        brief.guild_id = request.guild_id.clone();

        let message = BriefMessage::for_brief(&brief, request.language);
        match self.channel.post(&brief.channel_id, &message).await {
            Ok(message_id) => brief.message_id = Some(message_id),
            Err(e) => {
                tracing::error!(
                    "Could not post brief {} to channel {}: {:#}",
                    brief.id,
                    brief.channel_id,
                    e
                );
            }
        }

        let _guard = self.persist_lock.lock().await;
        let snapshot = {
            let mut active = self.active.write().await;
            active.insert(brief.id.clone(), brief.clone());
            snapshot(&active)
        };
        self.persist(&snapshot).await;

        tracing::info!("Brief created: {} in channel {}", brief.id, brief.channel_id);
        Ok(brief)
    }

    // ========================================================================
    // Terminal transitions
    // ========================================================================

    pub async fn complete_brief(&self, id: &str) -> Result<Brief> {
        self.finish(id, BriefStatus::Completed).await
    }

    pub async fn cancel_brief(&self, id: &str) -> Result<Brief> {
        self.finish(id, BriefStatus::Cancelled).await
    }

    async fn finish(&self, id: &str, status: BriefStatus) -> Result<Brief> {
        let _guard = self.persist_lock.lock().await;
        let (brief, snapshot) = {
            let mut active = self.active.write().await;
            let mut brief = active
                .remove(id)
                .ok_or_else(|| BriefError::NotFound(id.to_string()))?;
            if let Err(e) = brief.transition(status) {
                active.insert(brief.id.clone(), brief);
                return Err(e);
            }
            (brief, snapshot(&active))
        };
        self.finished
            .write()
            .await
            .insert(brief.id.clone(), brief.clone());
        self.persist(&snapshot).await;

        tracing::info!("Brief {}: {}", status, id);
        Ok(brief)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Active briefs, oldest first.
    pub async fn get_active_briefs(&self) -> Vec<Brief> {
        let active = self.active.read().await;
        snapshot(&active)
    }

    /// Active briefs whose deadline has passed. Does not change any status.
    pub async fn get_expired_briefs(&self) -> Vec<Brief> {
        self.expired_at(Utc::now()).await
    }

    pub async fn expired_at(&self, now: DateTime<Utc>) -> Vec<Brief> {
        self.get_active_briefs()
            .await
            .into_iter()
            .filter(|b| b.is_expired_at(now))
            .collect()
    }

    /// Active briefs posted in `channel_id`.
    pub async fn active_in_channel(&self, channel_id: &str) -> Vec<Brief> {
        self.get_active_briefs()
            .await
            .into_iter()
            .filter(|b| b.channel_id == channel_id)
            .collect()
    }

    /// Active or finished-this-process brief by id.
    pub async fn get_brief_by_id(&self, id: &str) -> Option<Brief> {
        if let Some(b) = self.active.read().await.get(id) {
            return Some(b.clone());
        }
        self.finished.read().await.get(id).cloned()
    }

    pub async fn stats(&self) -> BriefStats {
        let now = Utc::now();
        let mut stats = BriefStats::default();
        for brief in self.active.read().await.values() {
            stats.active += 1;
            if brief.is_expired_at(now) {
                stats.overdue += 1;
            }
        }
        for brief in self.finished.read().await.values() {
            match brief.status {
                BriefStatus::Completed => stats.completed += 1,
                BriefStatus::Cancelled => stats.cancelled += 1,
                BriefStatus::Active => {}
            }
        }
        stats
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn persist(&self, briefs: &[Brief]) {
        if let Err(e) = self.store.write_all(briefs).await {
            tracing::error!("Failed to persist {} active briefs: {:#}", briefs.len(), e);
        }
    }

    async fn alert(&self, message: &str, detail: &str) {
        if let Err(e) = self.alerts.notify(message, Some(detail)).await {
            tracing::error!("Failed to send admin alert: {:#}", e);
        }
    }
}

fn snapshot(active: &HashMap<String, Brief>) -> Vec<Brief> {
    let mut briefs: Vec<Brief> = active.values().cloned().collect();
    briefs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    briefs
}
