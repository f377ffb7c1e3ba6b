//! User-editable settings and the validated endpoint derived from them.
//!
//! `Settings` mirrors the persisted JSON blob: every field is optional or
//! defaulted so that older blobs keep loading. [`Settings::chat_endpoint`] is
//! the parse boundary that turns it into a [`ChatEndpoint`], whose existence
//! proves the base URL and API key are present.

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for Word authoring.";

/// Model ids offered before a models probe has succeeded.
pub const DEFAULT_MODELS: [&str; 3] = ["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IncompleteSettings {
    #[error("API base URL is not configured")]
    MissingEndpoint,
    #[error("API key is not configured")]
    MissingApiKey,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_edit: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            models_url: None,
            model: Some(DEFAULT_MODEL.to_string()),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            allow_edit: Some(true),
        }
    }
}

// Manual Debug impl to prevent leaking the API key in logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.api_key.is_empty() {
            "None"
        } else {
            "[REDACTED]"
        };
        f.debug_struct("Settings")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &key)
            .field("models_url", &self.models_url)
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("allow_edit", &self.allow_edit)
            .finish()
    }
}

impl Settings {
    /// Base URL without surrounding whitespace or a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    #[must_use]
    pub fn model_or_default(&self) -> &str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or_default()
    }

    /// Whether model-requested document edits may be applied. Defaults to true.
    #[must_use]
    pub fn allow_edit(&self) -> bool {
        self.allow_edit.unwrap_or(true)
    }

    /// Explicit models URL, else `<base>/v1/models`, else nothing.
    #[must_use]
    pub fn models_url(&self) -> Option<String> {
        if let Some(url) = self.models_url.as_deref().map(str::trim)
            && !url.is_empty()
        {
            return Some(url.to_string());
        }
        let base = self.base_url();
        (!base.is_empty()).then(|| format!("{base}/v1/models"))
    }

    #[must_use]
    pub fn health_url(&self) -> Option<String> {
        let base = self.base_url();
        (!base.is_empty()).then(|| format!("{base}/health"))
    }

    /// Validate the fields a chat request needs.
    pub fn chat_endpoint(&self) -> Result<ChatEndpoint, IncompleteSettings> {
        let base_url = self.base_url();
        if base_url.is_empty() {
            return Err(IncompleteSettings::MissingEndpoint);
        }
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(IncompleteSettings::MissingApiKey);
        }
        Ok(ChatEndpoint {
            base_url: base_url.to_string(),
            api_key: ApiKey::new(api_key),
            model: self.model_or_default().to_string(),
        })
    }

    /// Probe target for connection checks: models URL, base URL for the
    /// health fallback, and the (possibly empty) key.
    #[must_use]
    pub fn probe_target(&self) -> Option<ProbeTarget> {
        let models_url = self.models_url()?;
        let base_url = self.base_url();
        let api_key = self.api_key.trim();
        Some(ProbeTarget {
            models_url,
            base_url: (!base_url.is_empty()).then(|| base_url.to_string()),
            api_key: (!api_key.is_empty()).then(|| ApiKey::new(api_key)),
        })
    }
}

/// Bearer credential for the chat endpoint.
///
/// Note: `Debug` is manually implemented to redact the key value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

impl ApiKey {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Deliberately exposes the secret at the boundary where it enters the HTTP request.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

/// Validated chat target: non-empty base URL and key, resolved model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEndpoint {
    base_url: String,
    api_key: ApiKey,
    model: String,
}

impl ChatEndpoint {
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub models_url: String,
    pub base_url: Option<String>,
    pub api_key: Option<ApiKey>,
}

impl ProbeTarget {
    #[must_use]
    pub fn health_url(&self) -> Option<String> {
        self.base_url.as_ref().map(|base| format!("{base}/health"))
    }
}
