//! Runtime options and their persistence.
//!
//! Options are loaded once when the engine is enabled, mutated by user
//! property toggles, and written back through a [`ConfigStore`] on every
//! change; there is no implicit reload. The store speaks string keys and
//! string values only, which keeps the host side (dconf, registry, plain
//! file) trivial.

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const KEY_WUBI_TABLE: &str = "engine.wubi-table";
pub const KEY_PINYIN: &str = "engine.pinyin";
pub const KEY_SPEECH: &str = "engine.speech";
pub const KEY_SPEECH_AK_ID: &str = "speech.ak-id";
pub const KEY_SPEECH_AK_SECRET: &str = "speech.ak-secret";

fn bool_str(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

/// Process-wide engine options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeOptions {
    /// Path of the selected Wubi table. Empty means the code dictionary is
    /// disabled.
    pub wubi_table: String,
    /// Whether the phonetic decoder contributes candidates.
    pub pinyin: bool,
    /// Whether the speech hot-key is live.
    pub speech: bool,
    /// Credentials for the speech service.
    pub speech_ak_id: String,
    pub speech_ak_secret: String,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            wubi_table: String::new(),
            pinyin: true,
            speech: true,
            speech_ak_id: String::new(),
            speech_ak_secret: String::new(),
        }
    }
}

impl RuntimeOptions {
    /// Read options from a store, falling back to defaults per key.
    pub fn load(store: &dyn ConfigStore) -> Self {
        let mut opts = Self::default();
        if let Some(v) = store.get_string(KEY_WUBI_TABLE) {
            opts.wubi_table = v;
        }
        if let Some(v) = store.get_string(KEY_PINYIN) {
            opts.pinyin = v == "true";
        }
        if let Some(v) = store.get_string(KEY_SPEECH) {
            opts.speech = v == "true";
        }
        if let Some(v) = store.get_string(KEY_SPEECH_AK_ID) {
            opts.speech_ak_id = v;
        }
        if let Some(v) = store.get_string(KEY_SPEECH_AK_SECRET) {
            opts.speech_ak_secret = v;
        }
        opts
    }

    /// Write every option into a store.
    pub fn persist(&self, store: &mut dyn ConfigStore) {
        store.set_string(KEY_WUBI_TABLE, &self.wubi_table);
        store.set_string(KEY_PINYIN, bool_str(self.pinyin));
        store.set_string(KEY_SPEECH, bool_str(self.speech));
        store.set_string(KEY_SPEECH_AK_ID, &self.speech_ak_id);
        store.set_string(KEY_SPEECH_AK_SECRET, &self.speech_ak_secret);
    }

    /// Deserialize options from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize options to TOML text.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Persisted configuration collaborator: string keys, string values.
pub trait ConfigStore {
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&mut self, key: &str, value: &str);
}

/// In-memory store for tests and hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: AHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// TOML-file-backed store. Each key is a top-level string entry; the file is
/// rewritten on every change.
#[derive(Debug)]
pub struct TomlStore {
    path: PathBuf,
    values: toml::Table,
}

impl TomlStore {
    /// Open a store at `path`. A missing file starts empty; a present but
    /// unparsable one is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("read config {}", path.display()))?;
            content
                .parse::<toml::Table>()
                .with_context(|| format!("parse config {}", path.display()))?
        } else {
            toml::Table::new()
        };
        Ok(Self { path, values })
    }

    fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("write config {}", self.path.display()))?;
        Ok(())
    }
}

impl ConfigStore for TomlStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), toml::Value::String(value.to_string()));
        if let Err(err) = self.save() {
            warn!(error = %err, key, "failed to persist config change");
        }
    }
}
