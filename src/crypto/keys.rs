//! Master key handling: sub-key derivation and password fingerprints.
//!
//! The Argon2id output is never used directly.  HKDF-SHA256 expands it
//! into the AES key that encrypts the collection, and a SHA-512 hash of it
//! becomes the fingerprint stored inside the collection so that a wrong
//! password can be recognised without storing the password or the key.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hkdf::Hkdf;
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::kdf::{derive_master_key, KdfParams, KEY_LEN};
use crate::errors::{CardLogError, Result};

/// HKDF `info` for the collection encryption key.
const STORE_KEY_INFO: &[u8] = b"cardlog-store-key";

/// Derive the collection encryption key from the master key.
pub fn derive_store_key(master_key: &[u8]) -> Result<[u8; KEY_LEN]> {
    // `salt` is None: the master key already has full entropy.
    let hk = Hkdf::<Sha256>::new(None, master_key);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(STORE_KEY_INFO, &mut okm)
        .map_err(|e| CardLogError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// One-way fingerprint of a master key (base64 SHA-512).
pub fn fingerprint(master_key: &[u8]) -> String {
    BASE64.encode(Sha512::digest(master_key))
}

/// Compare two fingerprints without leaking where they differ.
pub fn fingerprints_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// A 32-byte master key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Run the password KDF and wrap the result.
    ///
    /// The intermediate stack copy is zeroized before returning.
    pub fn derive(password: &[u8], salt: &[u8], params: &KdfParams) -> Result<Self> {
        let mut raw = derive_master_key(password, salt, params)?;
        let key = Self::new(raw);
        raw.zeroize();
        Ok(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive the AES-256 key used for the collection file.
    pub fn store_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_store_key(&self.bytes)
    }

    /// Fingerprint recorded in the collection for password validation.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.bytes)
    }
}
