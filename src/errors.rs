use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in cardlog.
#[derive(Debug, Error)]
pub enum CardLogError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Store errors ---
    #[error("Authentication failed — wrong password or tampered collection file")]
    Authentication,

    #[error("Collection file is corrupt: {0}")]
    CorruptStore(String),

    #[error("Collection not found at {0}")]
    CollectionNotFound(PathBuf),

    #[error("Collection already exists at {0}")]
    CollectionAlreadyExists(PathBuf),

    #[error(
        "Trade only half saved: {applied} holds the new state but {pending} could not be written: {reason}"
    )]
    PartialCommit {
        applied: PathBuf,
        pending: PathBuf,
        reason: String,
    },

    // --- Record errors ---
    #[error("Card '{0}' does not exist in the catalog")]
    UnknownCard(String),

    #[error("No {print_type} copies of '{card_id}' in the collection")]
    RecordNotFound { card_id: String, print_type: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    // --- Catalog errors ---
    #[error("Card catalog unavailable: {0}")]
    CatalogUnavailable(String),

    // --- Keyring errors ---
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV error: {0}")]
    Csv(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

impl CardLogError {
    /// Whether the CLI should stop the session instead of re-prompting.
    ///
    /// A corrupt collection file cannot be fixed by retrying; every other
    /// error is either caller input or a transient condition.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CorruptStore(_))
    }
}

/// Convenience type alias for cardlog results.
pub type Result<T> = std::result::Result<T, CardLogError>;
