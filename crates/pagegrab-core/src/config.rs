use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration loaded from `~/.config/pagegrab/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagegrabConfig {
    /// Host default download location. None = the user's download dir, else cwd.
    pub download_dir: Option<PathBuf>,
    /// Fixed subfolder of the download location that every asset lands in.
    pub subfolder: String,
    /// Pause after each asset, in milliseconds.
    pub pace_ms: u64,
    /// Delay before a content handle is released after its save, in milliseconds.
    pub handle_grace_ms: u64,
    /// Timeout for script fetches and reference downloads, in seconds.
    pub fetch_timeout_secs: u64,
    /// Name of the external pretty-printer binary looked up on PATH.
    pub beautifier: String,
    /// Router socket for the background daemon. None = XDG state dir.
    pub socket_path: Option<PathBuf>,
}

impl Default for PagegrabConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            subfolder: "page_assets".to_string(),
            pace_ms: 300,
            handle_grace_ms: 1000,
            fetch_timeout_secs: 30,
            beautifier: "js-beautify".to_string(),
            socket_path: None,
        }
    }
}

impl PagegrabConfig {
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    pub fn handle_grace(&self) -> Duration {
        Duration::from_millis(self.handle_grace_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// Configured download dir, else the user's download dir, else cwd.
    pub fn resolved_download_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.download_dir {
            return Ok(dir.clone());
        }
        match dirs::download_dir() {
            Some(dir) => Ok(dir),
            None => Ok(std::env::current_dir()?),
        }
    }

    pub fn resolved_socket_path(&self) -> Result<PathBuf> {
        match &self.socket_path {
            Some(p) => Ok(p.clone()),
            None => default_socket_path(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pagegrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Default router socket (XDG state dir).
pub fn default_socket_path() -> Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("pagegrab")?.get_state_home();
    Ok(dir.join("router.sock"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PagegrabConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

pub fn load_or_init_at(path: &std::path::Path) -> Result<PagegrabConfig> {
    if !path.exists() {
        let default_cfg = PagegrabConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: PagegrabConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = PagegrabConfig::default();
        assert_eq!(cfg.subfolder, "page_assets");
        assert_eq!(cfg.pace(), Duration::from_millis(300));
        assert_eq!(cfg.handle_grace(), Duration::from_secs(1));
        assert_eq!(cfg.beautifier, "js-beautify");
        assert!(cfg.download_dir.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = PagegrabConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: PagegrabConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.subfolder, cfg.subfolder);
        assert_eq!(parsed.pace_ms, cfg.pace_ms);
        assert_eq!(parsed.handle_grace_ms, cfg.handle_grace_ms);
    }

    #[test]
    fn config_toml_partial_values() {
        let toml = r#"
            download_dir = "/srv/downloads"
            pace_ms = 0
        "#;
        let cfg: PagegrabConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.download_dir, Some(PathBuf::from("/srv/downloads")));
        assert_eq!(cfg.resolved_download_dir().unwrap(), PathBuf::from("/srv/downloads"));
        assert_eq!(cfg.pace_ms, 0);
        assert_eq!(cfg.subfolder, "page_assets");
        assert_eq!(cfg.fetch_timeout_secs, 30);
    }

    #[test]
    fn load_or_init_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.subfolder, "page_assets");

        fs::write(&path, "subfolder = \"grabs\"\n").unwrap();
        let cfg = load_or_init_at(&path).unwrap();
        assert_eq!(cfg.subfolder, "grabs");
    }
}
