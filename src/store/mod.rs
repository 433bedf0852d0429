//! Store module: encrypted collection storage.
//!
//! This module provides:
//! - `PrintType`, `RecordKey` and `Record` (`record`)
//! - The in-memory `RecordCollection` (`collection`)
//! - Binary file format and atomic writes (`format`)
//! - Interrupt deferral around writes (`interrupt`)
//! - High-level `EncryptedStore` for creating, opening and mutating collections (`encrypted`)

pub mod collection;
pub mod encrypted;
pub mod format;
pub mod interrupt;
pub mod record;

pub use collection::{LoginTime, RecordCollection};
pub use encrypted::EncryptedStore;
pub use format::StoreHeader;
pub use interrupt::CriticalSection;
pub use record::{validate_card_id, PrintType, Record, RecordKey};

/// File extension of collection files.
pub const STORE_EXTENSION: &str = "cardlog";
