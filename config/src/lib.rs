//! Configuration loading and settings persistence.
//!
//! Two layers feed the [`Settings`] a session runs with:
//!
//! 1. `~/.quill/config.toml` ([`QuillConfig`]) seeds defaults. String values
//!    support `${VAR}` expansion so keys can stay in the environment.
//! 2. The settings blob saved by the user ([`store::SettingsStore`]) overrides
//!    the seed wholesale once it exists.

pub mod store;

use std::path::{Path, PathBuf};
use std::{env, fs};

use quill_types::Settings;
use serde::Deserialize;

pub use store::{
    FileKeyValueStore, KeyValueStore, Loaded, LocalKeyValueStore, MemoryKeyValueStore,
    SETTINGS_KEY, SaveReport, SettingsError, SettingsSource, SettingsStore, StoreError,
};

#[derive(Debug, Default, Deserialize)]
pub struct QuillConfig {
    pub endpoint: Option<EndpointConfig>,
    pub assistant: Option<AssistantConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Chat endpoint defaults.
///
/// ```toml
/// [endpoint]
/// api_base_url = "http://localhost:8000"
/// api_key = "${OPENAI_API_KEY}"
/// model = "gpt-4o-mini"
/// request_timeout_secs = 120
/// ```
#[derive(Default, Deserialize)]
pub struct EndpointConfig {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub models_url: Option<String>,
    pub model: Option<String>,
    /// Whole-request timeout. Absent means requests wait for the server.
    pub request_timeout_secs: Option<u64>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.api_key.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("EndpointConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &key)
            .field("models_url", &self.models_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssistantConfig {
    pub system_prompt: Option<String>,
    pub allow_edit: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for the persisted settings blob. Default: `~/.quill/storage`.
    pub settings_dir: Option<String>,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

impl QuillConfig {
    /// Load `~/.quill/config.toml`. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Settings to use when nothing has been saved yet.
    #[must_use]
    pub fn seed_settings(&self) -> Settings {
        let mut settings = Settings::default();

        if let Some(endpoint) = &self.endpoint {
            if let Some(base) = &endpoint.api_base_url {
                settings.api_base_url = expand_env_vars(base);
            }
            if let Some(key) = &endpoint.api_key {
                settings.api_key = expand_env_vars(key);
            }
            if let Some(url) = &endpoint.models_url {
                settings.models_url = Some(expand_env_vars(url));
            }
            if let Some(model) = &endpoint.model {
                settings.model = Some(expand_env_vars(model));
            }
        }

        if let Some(assistant) = &self.assistant {
            if let Some(prompt) = &assistant.system_prompt {
                settings.system_prompt = Some(prompt.clone());
            }
            if let Some(allow_edit) = assistant.allow_edit {
                settings.allow_edit = Some(allow_edit);
            }
        }

        settings
    }

    #[must_use]
    pub fn request_timeout_secs(&self) -> Option<u64> {
        self.endpoint
            .as_ref()
            .and_then(|e| e.request_timeout_secs)
            .filter(|secs| *secs > 0)
    }

    /// Primary settings directory: configured, else `~/.quill/storage`.
    #[must_use]
    pub fn settings_dir(&self) -> Option<PathBuf> {
        self.storage
            .as_ref()
            .and_then(|s| s.settings_dir.as_deref())
            .map(|raw| expand_home(&expand_env_vars(raw)))
            .or_else(|| quill_dir().map(|dir| dir.join("storage")))
    }
}

/// `~/.quill`
#[must_use]
pub fn quill_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".quill"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    quill_dir().map(|dir| dir.join("config.toml"))
}

/// Working-directory fallback for settings when the home directory store fails.
#[must_use]
pub fn local_settings_dir() -> PathBuf {
    PathBuf::from(".quill").join("storage")
}
