//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use clap_complete::Shell;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

use crate::audit::AuditOp;
use crate::catalog::PokemonTcgClient;
use crate::config::{default_config_dir, Settings};
use crate::errors::{CardLogError, Result};
use crate::store::{EncryptedStore, PrintType};
use crate::trade::TradeItem;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Password for the active collection (scripts and CI).
pub const PASSWORD_ENV: &str = "CARDLOG_PASSWORD";

/// Password for the counterparty collection of a trade.
pub const OTHER_PASSWORD_ENV: &str = "CARDLOG_OTHER_PASSWORD";

/// Log filter override, e.g. `CARDLOG_LOG=cardlog=debug`.
pub const LOG_ENV: &str = "CARDLOG_LOG";

/// cardlog CLI: encrypted trading-card collection tracker.
#[derive(Parser)]
#[command(
    name = "cardlog",
    about = "Encrypted trading-card collection tracker",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Collection to use (default: from config, usually "default")
    #[arg(short, long, global = true)]
    pub collection: Option<String>,

    /// Config directory (default: ~/.config/cardlog)
    #[arg(long, global = true, env = "CARDLOG_HOME")]
    pub config_dir: Option<PathBuf>,

    /// More diagnostic output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new encrypted collection
    Init,

    /// Add copies of a card
    Add {
        /// Card id from the catalog (e.g. swsh1-1)
        card_id: String,
        /// Print type: normal, holofoil, reverseHolofoil, 1stEditionNormal, 1stEditionHolofoil
        print_type: PrintType,
        /// Number of copies
        #[arg(default_value_t = 1)]
        qty: u64,
    },

    /// Remove copies of a card (clamps at zero)
    Remove {
        card_id: String,
        print_type: PrintType,
        #[arg(default_value_t = 1)]
        qty: u64,
    },

    /// Delete a record regardless of quantity
    Delete {
        card_id: String,
        print_type: PrintType,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show how many copies of a card you hold
    Show {
        card_id: String,
        /// Limit to one print type
        print_type: Option<PrintType>,
    },

    /// List every record in the collection
    List,

    /// Show the login history
    Logins,

    /// Trade cards with another collection
    Trade {
        /// Counterparty collection name
        #[arg(long)]
        with: String,
        /// Card you give, as card:print-type[:qty] (repeatable)
        #[arg(long, required = true)]
        give: Vec<TradeItem>,
        /// Card you take, as card:print-type[:qty] (repeatable)
        #[arg(long, required = true)]
        take: Vec<TradeItem>,
        /// Skip the value check confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Import records from a CSV file (card_id,print_type,qnty)
    Import {
        /// Path to the CSV file
        file: String,
    },

    /// Export records as CSV
    Export {
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Add a price column with the current market value
        #[arg(long)]
        prices: bool,
    },

    /// Value the collection at current market prices
    Value,

    /// Show catalog prices for a card
    Price {
        card_id: String,
    },

    /// Browse expansion sets
    Sets {
        #[command(subcommand)]
        action: SetsAction,
    },

    /// Check that the card catalog is reachable
    Status,

    /// List collections in the data directory
    Collections,

    /// View the audit log of collection operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 2w, 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
        /// Include every collection, not just the active one
        #[arg(long)]
        all: bool,
    },

    /// Manage authentication methods
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Set browsing subcommands.
#[derive(clap::Subcommand)]
pub enum SetsAction {
    /// List every set in the catalog
    List,
    /// Show one set's details
    Show {
        /// Set id (e.g. swsh1)
        set_id: String,
    },
}

/// Auth subcommands.
#[derive(clap::Subcommand)]
pub enum AuthAction {
    /// Save the collection password to the OS keyring (auto-unlock)
    Keyring {
        /// Remove password from keyring instead of saving
        #[arg(long)]
        delete: bool,
    },
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the stderr `tracing` subscriber.
///
/// `-v`/`-vv` pick the level; without them `CARDLOG_LOG` is used, falling
/// back to `warn`.
pub fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    // A second install (e.g. from tests) keeps the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// ---------------------------------------------------------------------------
// Resolved invocation context
// ---------------------------------------------------------------------------

/// Everything a command needs beyond its own arguments: where config and
/// data live, the loaded settings, and which collection is active.
pub struct Context {
    pub config_dir: PathBuf,
    pub settings: Settings,
    pub collection: String,
}

impl Context {
    /// Resolve the config directory, load settings and pick the collection.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_dir = match &cli.config_dir {
            Some(dir) => dir.clone(),
            None => default_config_dir()?,
        };
        let settings = Settings::load(&config_dir)?;
        let collection = cli
            .collection
            .clone()
            .unwrap_or_else(|| settings.default_collection.clone());
        validate_collection_name(&collection)?;

        Ok(Self {
            config_dir,
            settings,
            collection,
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        self.settings.data_dir(&self.config_dir)
    }

    /// Path of the active collection file.
    pub fn collection_path(&self) -> PathBuf {
        self.settings
            .collection_path(&self.config_dir, &self.collection)
    }

    /// Path of any named collection file.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_collection_name(name)?;
        Ok(self.settings.collection_path(&self.config_dir, name))
    }

    /// REST catalog client built from the settings.
    pub fn catalog(&self) -> PokemonTcgClient {
        PokemonTcgClient::new(self.settings.catalog_config())
    }

    /// Record an operation on the active collection in the audit log.
    pub fn audit(&self, op: AuditOp, card_id: Option<&str>, details: Option<&str>) {
        self.audit_for(&self.collection, op, card_id, details);
    }

    /// Record an operation on any collection in the data directory.
    pub fn audit_for(
        &self,
        collection: &str,
        op: AuditOp,
        card_id: Option<&str>,
        details: Option<&str>,
    ) {
        #[cfg(feature = "audit-log")]
        crate::audit::log_audit(&self.data_dir(), collection, op, card_id, details);

        #[cfg(not(feature = "audit-log"))]
        let _ = (collection, op, card_id, details);
    }

    /// Unlock the active collection.
    pub fn open_collection(&self) -> Result<EncryptedStore> {
        open_store(
            &self.collection_path(),
            &self.collection,
            PASSWORD_ENV,
            self.settings.prompt_attempts,
        )
    }

    /// Unlock another collection, e.g. a trade counterparty.
    pub fn open_other(&self, name: &str) -> Result<EncryptedStore> {
        open_store(
            &self.path_for(name)?,
            name,
            OTHER_PASSWORD_ENV,
            self.settings.prompt_attempts,
        )
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Read a non-empty password from an environment variable.
fn env_password(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Unlock a collection file, trying in order:
/// 1. the password environment variable (one attempt, no retry)
/// 2. OS keyring (if compiled with `keyring-store`)
/// 3. interactive prompt, up to `attempts` times on a wrong password
pub fn open_store(path: &Path, name: &str, env_var: &str, attempts: u32) -> Result<EncryptedStore> {
    if !path.exists() {
        output::tip(&format!("Run `cardlog -c {name} init` to create it."));
        return Err(CardLogError::CollectionNotFound(path.to_path_buf()));
    }

    if let Some(pw) = env_password(env_var) {
        return EncryptedStore::unlock(path, pw.as_bytes());
    }

    #[cfg(feature = "keyring-store")]
    {
        let id = path.to_string_lossy();
        if let Ok(Some(pw)) = crate::keyring::get_password(&id) {
            let pw = Zeroizing::new(pw);
            match EncryptedStore::unlock(path, pw.as_bytes()) {
                Err(CardLogError::Authentication) => {
                    output::warning("Password stored in the OS keyring no longer works.");
                }
                other => return other,
            }
        }
    }

    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        let pw = dialoguer::Password::new()
            .with_prompt(format!("Password for collection '{name}'"))
            .interact()
            .map_err(|e| CardLogError::CommandFailed(format!("password prompt: {e}")))?;
        let pw = Zeroizing::new(pw);

        match EncryptedStore::unlock(path, pw.as_bytes()) {
            Err(CardLogError::Authentication) if attempt < attempts => {
                output::warning(&format!(
                    "Wrong password ({} attempt(s) left).",
                    attempts - attempt
                ));
            }
            result => return result,
        }
    }

    Err(CardLogError::Authentication)
}

/// Prompt for a new password with confirmation (used during `init`).
///
/// Also respects `CARDLOG_PASSWORD` for scripted use.  Enforces a minimum
/// length; the interactive prompt gives up after `attempts` tries.
pub fn prompt_new_password(attempts: u32) -> Result<Zeroizing<String>> {
    if let Some(pw) = env_password(PASSWORD_ENV) {
        if pw.len() < MIN_PASSWORD_LEN {
            return Err(CardLogError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    for _ in 0..attempts.max(1) {
        let password = dialoguer::Password::new()
            .with_prompt("Choose collection password")
            .with_confirmation(
                "Confirm collection password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| CardLogError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }

    Err(CardLogError::Validation(format!(
        "password must be at least {MIN_PASSWORD_LEN} characters"
    )))
}

/// Validate that a collection name is safe to use as a file name.
///
/// Allowed: lowercase letters, digits, hyphens. Must not be empty
/// or start/end with a hyphen. Max length 64 characters.
pub fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CardLogError::ConfigError(
            "collection name cannot be empty".into(),
        ));
    }

    if name.len() > 64 {
        return Err(CardLogError::ConfigError(
            "collection name cannot exceed 64 characters".into(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CardLogError::ConfigError(format!(
            "collection name '{name}' is invalid — only lowercase letters, digits, and hyphens are allowed"
        )));
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(CardLogError::ConfigError(format!(
            "collection name '{name}' cannot start or end with a hyphen"
        )));
    }

    Ok(())
}
