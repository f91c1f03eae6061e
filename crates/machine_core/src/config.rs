use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub discord: DiscordConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub scheduler: SchedulerConfig,
}

impl MachineConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: MachineConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DISCORD_TOKEN") {
            self.discord.token = Some(v);
        }
        if let Ok(v) = std::env::var("DISCORD_CLIENT_ID") {
            self.discord.application_id = Some(v);
        }
        if let Ok(v) = std::env::var("ADMIN_USER_ID") {
            self.discord.admin_user_id = Some(v);
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            if !v.trim().is_empty() {
                self.llm.api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("OPENAI_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("OPENAI_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("MACHINE_BRIEFS_PATH") {
            self.storage.briefs_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MACHINE_SETTINGS_PATH") {
            self.storage.settings_path = PathBuf::from(v);
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub token: Option<String>,
    pub application_id: Option<String>,
    /// User that receives generation-failure alerts by direct message.
    pub admin_user_id: Option<String>,
    pub api_base_url: String,
    pub gateway_url: String,
    pub request_timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            application_id: None,
            admin_user_id: None,
            api_base_url: "https://discord.com/api/v10".to_string(),
            gateway_url: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "openai" or "mock". Without an API key the static fallback generator is used.
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            model: "gpt-4-turbo-preview".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 500,
            temperature: 0.9,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub briefs_path: PathBuf,
    pub settings_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            briefs_path: PathBuf::from("data/briefs.json"),
            settings_path: PathBuf::from("config/servers.json"),
        }
    }
}

/// Cron expressions (minute hour day-of-month month day-of-week), local time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub expiry_sweep: String,
    pub daily_generation: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            expiry_sweep: "0 * * * *".to_string(),
            daily_generation: "0 10 * * *".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
