use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogConfig, DEFAULT_CATALOG_URL};
use crate::crypto::kdf::KdfParams;
use crate::errors::{CardLogError, Result};
use crate::store::STORE_EXTENSION;

/// Environment variable that overrides `api_key`.
pub const API_KEY_ENV: &str = "CARDLOG_API_KEY";

/// User-level configuration, loaded from `<config_dir>/config.toml`.
///
/// Every field has a default so cardlog works without any config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Where collection files and the audit log live.  Relative paths are
    /// resolved against the config directory; unset means the config
    /// directory itself.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Collection to use when `-c` is not given.
    #[serde(default = "default_collection")]
    pub default_collection: String,

    /// Catalog API key, sent as `X-Api-Key`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Attempts per catalog request, including the first.
    #[serde(default = "default_catalog_retries")]
    pub catalog_retries: u32,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Password attempts before an interactive unlock gives up.
    #[serde(default = "default_prompt_attempts")]
    pub prompt_attempts: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_collection() -> String {
    "default".to_string()
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_catalog_timeout_secs() -> u64 {
    10
}

fn default_catalog_retries() -> u32 {
    3
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_prompt_attempts() -> u32 {
    3
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_collection: default_collection(),
            api_key: None,
            catalog_url: default_catalog_url(),
            catalog_timeout_secs: default_catalog_timeout_secs(),
            catalog_retries: default_catalog_retries(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            prompt_attempts: default_prompt_attempts(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the config directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `<config_dir>/config.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CardLogError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.kdf_params().validate()?;
        Ok(settings)
    }

    /// Resolve the data directory.
    pub fn data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => config_dir.join(dir),
            None => config_dir.to_path_buf(),
        }
    }

    /// Build the full path to a collection file.
    ///
    /// Example: `~/.config/cardlog/default.cardlog`
    pub fn collection_path(&self, config_dir: &Path, name: &str) -> PathBuf {
        self.data_dir(config_dir)
            .join(format!("{name}.{STORE_EXTENSION}"))
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// Catalog client settings; `CARDLOG_API_KEY` wins over the file.
    pub fn catalog_config(&self) -> CatalogConfig {
        let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        CatalogConfig {
            base_url: self.catalog_url.clone(),
            api_key: env_key.or_else(|| self.api_key.clone()),
            timeout: Duration::from_secs(self.catalog_timeout_secs),
            retries: self.catalog_retries.max(1),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
