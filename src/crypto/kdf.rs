//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that makes offline guessing of the
//! collection password expensive.  The cost parameters are chosen when a
//! collection is created and stored in its file header, so re-opening
//! always re-derives the identical key even if the configured defaults
//! change later.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::{CardLogError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Largest memory cost accepted, in KiB (4 GiB).
const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Largest pass count or lane count accepted.
const MAX_ITERATIONS: u32 = 64;
const MAX_PARALLELISM: u32 = 64;

/// Argon2id cost parameters.
///
/// Serialized verbatim into the store header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of passes over memory (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Reject parameter sets too weak to be worth deriving a key with, or
    /// so costly that a derivation would never finish.
    pub fn validate(&self) -> Result<()> {
        self.check_bounds().map_err(CardLogError::KeyDerivationFailed)
    }

    /// Describe the first parameter outside its accepted range.
    pub(crate) fn check_bounds(&self) -> std::result::Result<(), String> {
        check_range("memory_kib", self.memory_kib, MIN_MEMORY_KIB, MAX_MEMORY_KIB)?;
        check_range("iterations", self.iterations, 1, MAX_ITERATIONS)?;
        check_range("parallelism", self.parallelism, 1, MAX_PARALLELISM)
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> std::result::Result<(), String> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Argon2 {name} must be between {min} and {max} (got {value})"
        ))
    }
}

/// Derive a 32-byte master key from a password and salt.
///
/// The same password + salt + params always produce the same key.
pub fn derive_master_key(
    password: &[u8],
    salt: &[u8],
    kdf_params: &KdfParams,
) -> Result<[u8; KEY_LEN]> {
    kdf_params.validate()?;

    let params = Params::new(
        kdf_params.memory_kib,
        kdf_params.iterations,
        kdf_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| CardLogError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| CardLogError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
