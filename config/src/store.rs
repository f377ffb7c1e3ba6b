//! Settings persistence with a primary store and a synchronous fallback.
//!
//! The settings blob lives under [`SETTINGS_KEY`]. Reads consult the primary
//! store; only a primary *failure* (not a miss) falls through to the fallback.
//! Writes go to the primary and fall back when it fails.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::{fs, io};

use quill_types::Settings;
use quill_utils::{AtomicWriteOptions, PersistMode, atomic_write_with_options};

pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous key-value store used as the primary settings location.
pub trait KeyValueStore {
    fn get_item(&self, key: &str)
    -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set_item(&self, key: &str, value: &str)
    -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Synchronous key-value store used when the primary fails.
pub trait LocalKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// ============================================================================
// File store
// ============================================================================

/// One `<key>.json` file per key inside `dir`, written atomically with
/// owner-only permissions.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.key_path(key);
        let options = AtomicWriteOptions {
            sync_all: true,
            mode: PersistMode::SensitiveOwnerOnly,
        };
        atomic_write_with_options(&path, value.as_bytes(), options)
            .map_err(|source| StoreError::Io { path, source })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send {
        std::future::ready(self.read(key))
    }

    fn set_item(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        std::future::ready(self.write(key, value))
    }
}

impl LocalKeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, value)
    }
}

// ============================================================================
// Memory store
// ============================================================================

/// In-process store. [`MemoryKeyValueStore::unavailable`] builds one whose
/// every operation fails, standing in for a host without storage.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<HashMap<String, String>>,
    unavailable: Option<String>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            items: Mutex::default(),
            unavailable: Some(reason.into()),
        }
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(reason) = &self.unavailable {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        let items = self
            .items
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(reason) = &self.unavailable {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        let mut items = self
            .items
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send {
        std::future::ready(self.read(key))
    }

    fn set_item(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        std::future::ready(self.write(key, value))
    }
}

impl LocalKeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, value)
    }
}

// ============================================================================
// Settings store
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    Primary,
    Fallback,
    /// Nothing stored; the seed settings were returned.
    Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub settings: Settings,
    pub source: SettingsSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveReport {
    Primary,
    /// The primary write failed and the blob went to the fallback instead.
    Fallback { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings could not be stored: {primary}; fallback: {fallback}")]
    Storage {
        primary: StoreError,
        fallback: StoreError,
    },
    #[error("stored settings are not a valid JSON object: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// The blob must be a JSON object. Serde would otherwise accept an array and
/// fill every defaulted field from it.
fn parse_settings(raw: &str) -> Result<Settings, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom(format!(
            "expected an object, found {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

pub struct SettingsStore<P, F> {
    primary: P,
    fallback: F,
    seed: Settings,
}

impl<P, F> SettingsStore<P, F>
where
    P: KeyValueStore,
    F: LocalKeyValueStore,
{
    /// `seed` is what [`SettingsStore::load`] returns when nothing was saved.
    pub fn new(primary: P, fallback: F, seed: Settings) -> Self {
        Self {
            primary,
            fallback,
            seed,
        }
    }

    pub async fn load(&self) -> Result<Loaded, SettingsError> {
        match self.primary.get_item(SETTINGS_KEY).await {
            Ok(Some(raw)) => match parse_settings(&raw) {
                Ok(settings) => {
                    return Ok(Loaded {
                        settings,
                        source: SettingsSource::Primary,
                    });
                }
                Err(e) => tracing::warn!("Primary settings blob is corrupt: {e}"),
            },
            Ok(None) => return Ok(self.defaults()),
            Err(e) => tracing::warn!("Primary settings store failed: {e}"),
        }

        match self.fallback.get_item(SETTINGS_KEY) {
            Ok(Some(raw)) => {
                let settings = parse_settings(&raw).map_err(SettingsError::Corrupt)?;
                Ok(Loaded {
                    settings,
                    source: SettingsSource::Fallback,
                })
            }
            Ok(None) => Ok(self.defaults()),
            Err(e) => {
                tracing::warn!("Fallback settings store failed: {e}");
                Ok(self.defaults())
            }
        }
    }

    pub async fn save(&self, settings: &Settings) -> Result<SaveReport, SettingsError> {
        let raw = serde_json::to_string(settings).map_err(SettingsError::Serialize)?;

        let primary = match self.primary.set_item(SETTINGS_KEY, &raw).await {
            Ok(()) => {
                tracing::debug!("Settings saved to primary store");
                return Ok(SaveReport::Primary);
            }
            Err(e) => e,
        };

        tracing::warn!("Primary settings store failed, using fallback: {primary}");
        match self.fallback.set_item(SETTINGS_KEY, &raw) {
            Ok(()) => Ok(SaveReport::Fallback {
                reason: primary.to_string(),
            }),
            Err(fallback) => Err(SettingsError::Storage { primary, fallback }),
        }
    }

    fn defaults(&self) -> Loaded {
        Loaded {
            settings: self.seed.clone(),
            source: SettingsSource::Defaults,
        }
    }
}
