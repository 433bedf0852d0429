//! OS keyring integration for password caching.
//!
//! Stores and retrieves a collection password from the operating system's
//! secure credential store (Keychain, Credential Manager, Secret Service).
//! If the keyring is unavailable the error is returned and the caller
//! falls back to a password prompt.

use crate::errors::{CardLogError, Result};

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "cardlog";

/// Keyring account for a collection file path.
fn entry_key(collection_path: &str) -> String {
    format!("collection:{collection_path}")
}

fn entry(collection_path: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, &entry_key(collection_path))
        .map_err(|e| CardLogError::KeyringError(format!("failed to create keyring entry: {e}")))
}

/// Store a password in the OS keyring for a specific collection.
pub fn store_password(collection_path: &str, password: &str) -> Result<()> {
    entry(collection_path)?.set_password(password).map_err(|e| {
        CardLogError::KeyringError(format!("failed to store password in keyring: {e}"))
    })
}

/// Retrieve a password from the OS keyring.
///
/// Returns `None` if no password is stored (rather than an error).
pub fn get_password(collection_path: &str) -> Result<Option<String>> {
    match entry(collection_path)?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(CardLogError::KeyringError(format!(
            "failed to read from keyring: {e}"
        ))),
    }
}

/// Delete a stored password from the OS keyring.
pub fn delete_password(collection_path: &str) -> Result<()> {
    match entry(collection_path)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(CardLogError::KeyringError(format!(
            "failed to delete from keyring: {e}"
        ))),
    }
}
