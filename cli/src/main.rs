//! Quill CLI - terminal chat that lets the model edit a document.
//!
//! ```text
//! main() -> config + stored settings -> ChatSession -> Repl::run(stdin)
//! ```
//!
//! With `--document` edits go to a text/markdown file (rewritten after every
//! edit); otherwise to an in-memory document that `/show` prints.

mod commands;
mod repl;

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use quill_config::{
    FileKeyValueStore, Loaded, QuillConfig, SettingsSource, SettingsStore, local_settings_dir,
};
use quill_core::{ChatSession, DocumentHost, MemoryDocument, TextFileDocument};
use quill_providers::ChatClient;

use crate::repl::Repl;

#[derive(Parser)]
#[command(name = "quill", version)]
#[command(about = "Chat with an OpenAI-compatible model and let it edit a document")]
#[command(long_about = None)]
struct Cli {
    /// Text or markdown file to edit. Created on first edit if missing.
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Config file to use instead of ~/.quill/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_quill_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Without a log file, stay silent rather than interleave logs with the REPL.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_quill_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in quill_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn quill_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.quill/logs/quill.log
    if let Some(dir) = quill_config::quill_dir() {
        candidates.push(dir.join("logs").join("quill.log"));
    }

    // Fallback: ./.quill/logs/quill.log
    candidates.push(PathBuf::from(".quill").join("logs").join("quill.log"));

    candidates
}

fn load_config(explicit: Option<&PathBuf>) -> Result<QuillConfig> {
    let loaded = match explicit {
        Some(path) => QuillConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => QuillConfig::load().unwrap_or_else(|e| {
            eprintln!("Ignoring config: {e}");
            None
        }),
    };
    Ok(loaded.unwrap_or_default())
}

enum Workspace {
    Memory(MemoryDocument),
    File(TextFileDocument),
}

impl Workspace {
    fn open(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => {
                let document = TextFileDocument::open(&path)
                    .with_context(|| format!("opening document {}", path.display()))?;
                Ok(Workspace::File(document))
            }
            None => Ok(Workspace::Memory(MemoryDocument::new())),
        }
    }

    fn host(&self) -> &dyn DocumentHost {
        match self {
            Workspace::Memory(document) => document,
            Workspace::File(document) => document,
        }
    }

    fn view(&self) -> &MemoryDocument {
        match self {
            Workspace::Memory(document) => document,
            Workspace::File(document) => document.document(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let primary_dir = config.settings_dir().unwrap_or_else(local_settings_dir);
    let store = SettingsStore::new(
        FileKeyValueStore::new(primary_dir),
        FileKeyValueStore::new(local_settings_dir()),
        config.seed_settings(),
    );
    let Loaded { settings, source } = store.load().await.unwrap_or_else(|e| {
        eprintln!("Stored settings are unreadable ({e}); using defaults.");
        Loaded {
            settings: config.seed_settings(),
            source: SettingsSource::Defaults,
        }
    });
    tracing::info!(?source, "Settings loaded");

    let client = match config.request_timeout_secs() {
        Some(secs) => ChatClient::with_timeout(secs).context("building HTTP client")?,
        None => ChatClient::new(),
    };

    let workspace = Workspace::open(cli.document)?;
    let mut session = ChatSession::new(client, workspace.host(), settings);
    session.check_connection().await;

    let mut repl = Repl {
        session,
        document: workspace.view(),
        store: &store,
    };
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl.run(stdin, &mut stdout).await
}
