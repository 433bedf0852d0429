//! `cardlog auth`: manage stored credentials.
//!
//! Subcommands:
//! - `cardlog auth keyring`         : save password to OS keyring
//! - `cardlog auth keyring --delete`: remove password from keyring
//!
//! When the keyring feature is not compiled in, these commands return
//! an error saying how to enable it.

use crate::cli::Context;
use crate::errors::{CardLogError, Result};

/// Execute `cardlog auth keyring`: save or delete the password in the OS keyring.
pub fn execute_keyring(ctx: &Context, delete: bool) -> Result<()> {
    #[cfg(feature = "keyring-store")]
    {
        use crate::cli::output;

        let path = ctx.collection_path();
        let collection_id = path.to_string_lossy().to_string();

        if delete {
            crate::keyring::delete_password(&collection_id)?;
            output::success("Password removed from OS keyring.");
        } else {
            // Only a password that unlocks the collection is stored.
            let password = dialoguer::Password::new()
                .with_prompt(format!("Password for collection '{}'", ctx.collection))
                .interact()
                .map_err(|e| CardLogError::CommandFailed(format!("password prompt: {e}")))?;
            let password = zeroize::Zeroizing::new(password);
            crate::store::EncryptedStore::unlock(&path, password.as_bytes())?;

            crate::keyring::store_password(&collection_id, &password)?;
            output::success("Password saved to OS keyring. Future opens will be automatic.");
        }

        Ok(())
    }

    #[cfg(not(feature = "keyring-store"))]
    {
        let _ = (ctx, delete);
        Err(CardLogError::KeyringError(
            "keyring support not compiled — rebuild with `cargo build --features keyring-store`"
                .into(),
        ))
    }
}
