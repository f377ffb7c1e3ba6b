//! Settings store against real directories

use quill_config::{
    FileKeyValueStore, MemoryKeyValueStore, QuillConfig, SaveReport, SettingsSource, SettingsStore,
};
use quill_types::Settings;

#[tokio::test]
async fn config_seed_is_overridden_by_saved_blob() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[endpoint]\napi_base_url = \"http://seed:8000\"\nmodel = \"gpt-4o\"\n",
    )
    .unwrap();
    let config = QuillConfig::load_from(&config_path).unwrap().unwrap();

    let store = SettingsStore::new(
        FileKeyValueStore::new(dir.path().join("primary")),
        FileKeyValueStore::new(dir.path().join("fallback")),
        config.seed_settings(),
    );

    let first = store.load().await.unwrap();
    assert_eq!(first.source, SettingsSource::Defaults);
    assert_eq!(first.settings.api_base_url, "http://seed:8000");

    let saved = Settings {
        api_base_url: "http://saved:9000".to_string(),
        api_key: "sk-saved".to_string(),
        ..first.settings
    };
    assert_eq!(store.save(&saved).await.unwrap(), SaveReport::Primary);

    let second = store.load().await.unwrap();
    assert_eq!(second.source, SettingsSource::Primary);
    assert_eq!(second.settings, saved);
    assert_eq!(second.settings.model_or_default(), "gpt-4o");
}

#[tokio::test]
async fn unavailable_primary_uses_local_directory() {
    let dir = tempfile::tempdir().unwrap();
    let fallback_dir = dir.path().join("local");
    let store = SettingsStore::new(
        MemoryKeyValueStore::unavailable("host storage missing"),
        FileKeyValueStore::new(&fallback_dir),
        Settings::default(),
    );

    let settings = Settings {
        api_key: "sk-local".to_string(),
        ..Settings::default()
    };
    let report = store.save(&settings).await.unwrap();
    assert!(matches!(report, SaveReport::Fallback { .. }));
    assert!(fallback_dir.join("settings.json").exists());

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.source, SettingsSource::Fallback);
    assert_eq!(loaded.settings.api_key, "sk-local");
}
