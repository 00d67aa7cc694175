use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default key under which the custom token list is kept in the local store.
pub const DEFAULT_CUSTOM_TOKENS_KEY: &str = "nexus-custom-tokens";

// ---------------------------------------------------------------------------
// NexusConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.nexus/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Network assumed when nothing else tells us which chain is active.
    pub default_chain_id: u64,

    /// Local store key holding the serialized custom token list.
    pub custom_tokens_key: String,

    /// File name (relative to the base dir) of the local key/value store.
    pub storage_file: String,

    /// Overrides the block-explorer base URL for every chain when set.
    pub explorer_url: Option<String>,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            default_chain_id: 1,
            custom_tokens_key: DEFAULT_CUSTOM_TOKENS_KEY.into(),
            storage_file: "local_storage.json".into(),
            explorer_url: None,
        }
    }
}

impl NexusConfig {
    /// Returns the base config directory: `~/.nexus/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".nexus"))
    }

    /// Returns the config file path: `~/.nexus/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.nexus/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Returns the path of the local key/value store file.
    pub fn storage_path(&self) -> Result<PathBuf> {
        Ok(Self::base_dir()?.join(&self.storage_file))
    }

    /// Create `~/.nexus/` and `~/.nexus/logs/` if absent.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Read `~/.nexus/config.json`, writing the defaults first if it is absent.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// [`load`](Self::load) against an explicit path. Loaded values are validated.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self =
                serde_json::from_str(&content).with_context(|| "Failed to parse config.json")?;
            config.validate()?;
            info!(path = %path.display(), "config loaded");
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!(path = %path.display(), "default config written");
            Ok(config)
        }
    }

    /// Saves config to `~/.nexus/config.json`.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    /// Validate, then write pretty-printed JSON to `path`.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Reject values that would break consumers at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.custom_tokens_key.trim().is_empty() {
            anyhow::bail!("config: custom_tokens_key must not be empty");
        }
        if self.storage_file.trim().is_empty() {
            anyhow::bail!("config: storage_file must not be empty");
        }
        if let Some(url) = &self.explorer_url {
            if !validate_url(url) {
                anyhow::bail!("config: invalid explorer URL: {url}");
            }
        }
        Ok(())
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
