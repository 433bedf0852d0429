//! Cryptographic primitives for cardlog.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption with associated data (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - HKDF store-key derivation and password fingerprints (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

pub use encryption::{decrypt, encrypt};
pub use kdf::{derive_master_key, generate_salt, KdfParams};
pub use keys::{derive_store_key, fingerprint, fingerprints_match, MasterKey};
