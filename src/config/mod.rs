//! Configuration system (layered: code > env > config file).

pub mod credentials;

pub use credentials::{ApiKey, Credentials};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ParleyError;
use crate::models::ModelId;

/// Resolved configuration for a chat session.
///
/// Resolution order: values set in code override environment variables,
/// which override the TOML config file.
#[derive(Debug, Clone)]
pub struct ParleyConfig {
    pub api_key: Option<ApiKey>,
    pub model: ModelId,
    /// Override for the Chat Completions endpoint root.
    pub base_url: Option<String>,
    pub system_prompt: Option<String>,
    /// JSONL history file. `None` keeps history in process memory.
    pub history_path: Option<PathBuf>,
    pub request_timeout: Option<Duration>,
    /// Attempts per remote call, including the first.
    pub max_attempts: u32,
    /// Owner address baked into generated ERC721 contracts.
    pub owner_address: Option<String>,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: ModelId::default(),
            base_url: None,
            system_prompt: None,
            history_path: None,
            request_timeout: None,
            max_attempts: 1,
            owner_address: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    api_key: Option<ApiKey>,
    model: Option<String>,
    base_url: Option<String>,
    system_prompt: Option<String>,
    history_path: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    owner_address: Option<String>,
}

impl ParleyConfig {
    /// Default config file (`~/.parley/config.toml`), overlaid by the environment.
    pub fn load() -> Result<Self, ParleyError> {
        let mut config = Self::load_from_path(default_config_path())?;
        config.overlay_env()?;
        Ok(config)
    }

    /// Load from environment variables only (after reading `.env` if present).
    pub fn from_env() -> Result<Self, ParleyError> {
        let mut config = Self::default();
        config.overlay_env()?;
        Ok(config)
    }

    /// Load a TOML config file. A missing file yields the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ParleyError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(ParleyError::Io(err)),
        };
        let file: ConfigFile = toml::from_str(&raw)?;

        let mut config = Self::default();
        if let Some(key) = file.api_key {
            config.api_key = Some(key);
        }
        if let Some(model) = file.model {
            config.model = parse_model(&model, &path.display().to_string())?;
        }
        config.base_url = file.base_url;
        config.system_prompt = file.system_prompt;
        config.history_path = file.history_path;
        config.request_timeout = file.request_timeout_secs.map(Duration::from_secs);
        if let Some(attempts) = file.max_attempts {
            config.max_attempts = attempts.max(1);
        }
        config.owner_address = file.owner_address;
        Ok(config)
    }

    /// Apply process environment variables on top of the current values.
    pub fn overlay_env(&mut self) -> Result<(), ParleyError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        self.overlay_env_from(|name| std::env::var(name).ok())
    }

    /// Apply variables from an arbitrary lookup on top of the current values.
    pub fn overlay_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ParleyError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = var("PARLEY_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.api_key = Some(ApiKey::new(key));
        }
        if let Some(model) = var("PARLEY_MODEL") {
            self.model = parse_model(&model, "PARLEY_MODEL")?;
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(prompt) = var("PARLEY_SYSTEM_PROMPT") {
            self.system_prompt = Some(prompt);
        }
        if let Some(path) = var("PARLEY_HISTORY_PATH") {
            self.history_path = Some(PathBuf::from(path));
        }
        if let Some(secs) = var("PARLEY_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ParleyError::Configuration(format!("PARLEY_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(attempts) = var("PARLEY_MAX_ATTEMPTS") {
            let attempts: u32 = attempts.trim().parse().map_err(|_| {
                ParleyError::Configuration(format!(
                    "PARLEY_MAX_ATTEMPTS is not a number: {attempts}"
                ))
            })?;
            self.max_attempts = attempts.max(1);
        }
        if let Some(owner) = var("PARLEY_OWNER_ADDRESS") {
            self.owner_address = Some(owner);
        }
        Ok(())
    }

    pub fn with_api_key(mut self, key: impl Into<ApiKey>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = model;
        self
    }

    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    pub fn with_owner_address(mut self, owner: impl Into<String>) -> Self {
        self.owner_address = Some(owner.into());
        self
    }

    /// Build session credentials from the configured key and model.
    pub fn credentials(&self) -> Result<Credentials, ParleyError> {
        let key = self
            .api_key
            .clone()
            .ok_or_else(|| ParleyError::init("No API key configured (set PARLEY_API_KEY)"))?;
        Credentials::with_model(key, self.model)
    }
}

fn parse_model(raw: &str, origin: &str) -> Result<ModelId, ParleyError> {
    ModelId::parse_supported(raw).map_err(|err| ParleyError::Configuration(format!("{origin}: {err}")))
}

/// Directory holding Parley's config and history (`~/.parley`).
pub fn default_parley_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".parley"))
        .unwrap_or_else(|| PathBuf::from(".parley"))
}

pub fn default_config_path() -> PathBuf {
    default_parley_dir().join("config.toml")
}

pub fn default_history_path() -> PathBuf {
    default_parley_dir().join("history.jsonl")
}
