//! Persisted user preferences (`prefs.toml` next to the config file).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use crate::model::{DownloadOptions, ScanOptions};

/// Stored preference keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    BeautifyScripts,
    IncludeInlineScripts,
}

impl PreferenceKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::BeautifyScripts => "beautifyScripts",
            PreferenceKey::IncludeInlineScripts => "includeInlineScripts",
        }
    }
}

impl FromStr for PreferenceKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "beautifyScripts" => Ok(PreferenceKey::BeautifyScripts),
            "includeInlineScripts" => Ok(PreferenceKey::IncludeInlineScripts),
            other => anyhow::bail!("unknown preference key: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub beautify_scripts: bool,
    pub include_inline_scripts: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            beautify_scripts: true,
            include_inline_scripts: true,
        }
    }
}

impl Preferences {
    pub fn get(&self, key: PreferenceKey) -> bool {
        match key {
            PreferenceKey::BeautifyScripts => self.beautify_scripts,
            PreferenceKey::IncludeInlineScripts => self.include_inline_scripts,
        }
    }

    pub fn set(&mut self, key: PreferenceKey, value: bool) {
        match key {
            PreferenceKey::BeautifyScripts => self.beautify_scripts = value,
            PreferenceKey::IncludeInlineScripts => self.include_inline_scripts = value,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            include_inline_scripts: self.include_inline_scripts,
        }
    }

    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            beautify_scripts: self.beautify_scripts,
        }
    }
}

/// Key-value preference storage.
pub trait PreferenceStore: Send + Sync {
    /// Stored preferences; defaults for anything never set.
    fn load(&self) -> Result<Preferences>;

    fn save(&self, prefs: &Preferences) -> Result<()>;

    fn get(&self, key: PreferenceKey) -> Result<bool> {
        Ok(self.load()?.get(key))
    }

    fn set(&self, key: PreferenceKey, value: bool) -> Result<()> {
        let mut prefs = self.load()?;
        prefs.set(key, value);
        self.save(&prefs)
    }
}

/// Preferences in a TOML file.
#[derive(Debug, Clone)]
pub struct TomlPreferenceStore {
    path: PathBuf,
}

impl TomlPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/pagegrab/prefs.toml`.
    pub fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("pagegrab")?;
        Ok(Self::new(xdg_dirs.place_config_file("prefs.toml")?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for TomlPreferenceStore {
    fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("read preferences: {}", self.path.display()))?;
        Ok(toml::from_str(&data)?)
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(prefs)?)
            .with_context(|| format!("write preferences: {}", self.path.display()))?;
        Ok(())
    }
}

/// Non-persistent store.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    prefs: Mutex<Preferences>,
}

impl MemoryPreferenceStore {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Preferences> {
        Ok(*self.prefs.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        *self.prefs.lock().unwrap_or_else(PoisonError::into_inner) = *prefs;
        Ok(())
    }
}
