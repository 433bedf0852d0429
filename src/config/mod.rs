//! Configuration: `Settings` loaded from `config.toml` plus the
//! config-directory lookup.

pub mod settings;

use std::path::PathBuf;

use crate::errors::{CardLogError, Result};

pub use settings::Settings;

/// Default config directory: `$HOME/.config/cardlog` on all platforms.
pub fn default_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| {
            CardLogError::ConfigError(
                "cannot locate home directory; pass --config-dir or set CARDLOG_HOME".into(),
            )
        })?;
    Ok(PathBuf::from(home).join(".config").join("cardlog"))
}
