//! Binary collection file format and atomic writes.
//!
//! A `.cardlog` file has this layout:
//!
//! ```text
//! [CLOG: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][nonce: 12 bytes][ciphertext + tag]
//! ```
//!
//! - **Magic** (`CLOG`): identifies the file as a cardlog collection.
//! - **Version**: format version (currently `1`).
//! - **Header length**: little-endian u32 telling us where the header
//!   JSON ends and the encrypted payload begins.
//! - **Header JSON**: serialized `StoreHeader` (salt, KDF parameters).
//! - **Payload**: AES-256-GCM over the collection JSON.  Everything
//!   before the payload is passed as associated data, so the header is
//!   authenticated without being encrypted.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interrupt::CriticalSection;
use crate::crypto::kdf::KdfParams;
use crate::crypto::encryption::{NONCE_LEN, TAG_LEN};
use crate::errors::{CardLogError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every collection file.
const MAGIC: &[u8; 4] = b"CLOG";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

/// Headers are tiny; anything larger is a damaged length field.
const MAX_HEADER_LEN: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// StoreHeader
// ---------------------------------------------------------------------------

/// Plaintext metadata stored at the beginning of a collection file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHeader {
    /// Format version.
    pub version: u8,

    /// The salt used for Argon2id key derivation (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// KDF cost parameters chosen when the collection was created.
    pub kdf: KdfParams,

    /// When this collection was first created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize the prefix and header: the bytes that become the AEAD
/// associated data and the start of the file.
pub fn encode_prelude(header: &StoreHeader) -> Result<Vec<u8>> {
    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| CardLogError::SerializationError(format!("header: {e}")))?;

    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        CardLogError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + header_bytes.len());
    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(CURRENT_VERSION); // 1 byte
    buf.extend_from_slice(&header_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&header_bytes); // header JSON
    Ok(buf)
}

/// A collection file split into its parts, before decryption.
pub struct RawStore {
    pub header: StoreHeader,
    /// Prefix + header bytes exactly as stored on disk (the associated data).
    pub prelude: Vec<u8>,
    /// Nonce followed by ciphertext and tag.
    pub payload: Vec<u8>,
}

/// Split raw file bytes into header and payload.
///
/// Structural problems are `CorruptStore`: they mean the file is broken,
/// not that the password is wrong.
pub fn decode(data: &[u8]) -> Result<RawStore> {
    if data.len() < PREFIX_LEN + NONCE_LEN + TAG_LEN {
        return Err(CardLogError::CorruptStore(
            "file too small to be a collection".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(CardLogError::CorruptStore("missing CLOG magic bytes".into()));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(CardLogError::CorruptStore(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len_u32 = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| CardLogError::CorruptStore("bad header length".into()))?,
    );
    let header_len = usize::try_from(header_len_u32)
        .ok()
        .filter(|len| *len <= MAX_HEADER_LEN)
        .ok_or_else(|| {
            CardLogError::CorruptStore(format!("implausible header length {header_len_u32}"))
        })?;

    let header_end = PREFIX_LEN + header_len;
    if header_end + NONCE_LEN + TAG_LEN > data.len() {
        return Err(CardLogError::CorruptStore(
            "header length exceeds file size".into(),
        ));
    }

    let header: StoreHeader = serde_json::from_slice(&data[PREFIX_LEN..header_end])
        .map_err(|e| CardLogError::CorruptStore(format!("header JSON: {e}")))?;

    if header.version != version {
        return Err(CardLogError::CorruptStore(
            "header version does not match file version".into(),
        ));
    }

    // The header is only authenticated after Argon2 has run, so its cost
    // parameters must be sane before anything derives a key from them.
    header
        .kdf
        .check_bounds()
        .map_err(|e| CardLogError::CorruptStore(format!("header KDF parameters: {e}")))?;

    Ok(RawStore {
        header,
        prelude: data[..header_end].to_vec(),
        payload: data[header_end..].to_vec(),
    })
}

/// Read and split a collection file.
pub fn read_store(path: &Path) -> Result<RawStore> {
    if !path.exists() {
        return Err(CardLogError::CollectionNotFound(path.to_path_buf()));
    }
    let data = fs::read(path)?;
    decode(&data)
}

// ---------------------------------------------------------------------------
// Atomic writes
// ---------------------------------------------------------------------------

/// Encrypted bytes written to a temp file next to their target, waiting
/// to be renamed into place.
///
/// Dropping an uncommitted write removes the temp file, leaving the
/// target untouched.
#[must_use = "a staged write does nothing until committed"]
pub struct StagedWrite {
    tmp_path: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// Write `bytes` to `.<name>.tmp` in the target's directory and fsync it.
    pub fn prepare(target: &Path, bytes: &[u8]) -> Result<Self> {
        let parent = target.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            target.file_name().unwrap_or_default().to_string_lossy()
        ));

        let staged = Self {
            tmp_path,
            target: target.to_path_buf(),
            committed: false,
        };

        let mut file = create_private(&staged.tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;

        Ok(staged)
    }

    /// Atomically replace the target with the staged bytes.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp_path, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

/// Write a collection file **atomically**.
///
/// 1. Write the bytes to a temp file in the same directory and fsync.
/// 2. Rename the temp file over the target path.
///
/// Both steps run inside a critical section so an interrupt cannot land
/// between them; readers never see a half-written file.
pub fn write_store(path: &Path, bytes: &[u8]) -> Result<()> {
    let _guard = CriticalSection::enter();
    StagedWrite::prepare(path, bytes)?.commit()
}

/// Open a fresh file for writing, owner-only on Unix.
fn create_private(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    Ok(options.open(path)?)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn header() -> StoreHeader {
        StoreHeader {
            version: CURRENT_VERSION,
            salt: vec![3u8; 32],
            kdf: KdfParams::default(),
            created_at: Utc::now(),
        }
    }

    fn file_bytes(h: &StoreHeader) -> Vec<u8> {
        let mut data = encode_prelude(h).unwrap();
        data.extend_from_slice(&[0xEEu8; NONCE_LEN + TAG_LEN + 8]);
        data
    }

    #[test]
    fn decode_splits_prelude_and_payload() {
        let h = header();
        let data = file_bytes(&h);
        let raw = decode(&data).unwrap();
        assert_eq!(raw.header, h);
        assert_eq!(raw.prelude, encode_prelude(&h).unwrap());
        assert_eq!(raw.payload.len(), NONCE_LEN + TAG_LEN + 8);
    }

    #[test]
    fn bad_magic_is_corrupt() {
        let mut data = file_bytes(&header());
        data[0] = b'X';
        assert!(matches!(decode(&data), Err(CardLogError::CorruptStore(_))));
    }

    #[test]
    fn unknown_version_is_corrupt() {
        let mut data = file_bytes(&header());
        data[4] = 9;
        assert!(matches!(decode(&data), Err(CardLogError::CorruptStore(_))));
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let data = file_bytes(&header());
        assert!(matches!(
            decode(&data[..PREFIX_LEN + 5]),
            Err(CardLogError::CorruptStore(_))
        ));
        assert!(matches!(decode(&[]), Err(CardLogError::CorruptStore(_))));
    }

    #[test]
    fn oversized_header_length_is_corrupt() {
        let mut data = file_bytes(&header());
        data[5..9].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&data), Err(CardLogError::CorruptStore(_))));
    }

    #[test]
    fn out_of_range_kdf_params_are_corrupt() {
        let forged = [
            KdfParams {
                memory_kib: 1_024,
                ..KdfParams::default()
            },
            KdfParams {
                iterations: u32::MAX,
                ..KdfParams::default()
            },
            KdfParams {
                parallelism: 0,
                ..KdfParams::default()
            },
        ];
        for kdf in forged {
            let data = file_bytes(&StoreHeader { kdf, ..header() });
            match decode(&data) {
                Err(CardLogError::CorruptStore(msg)) => assert!(msg.contains("KDF"), "{msg}"),
                Err(other) => panic!("expected CorruptStore for {kdf:?}, got {other:?}"),
                Ok(_) => panic!("expected CorruptStore for {kdf:?}, got Ok"),
            }
        }
    }

    #[test]
    fn write_store_replaces_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mine.cardlog");

        write_store(&path, b"first").unwrap();
        write_store(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join(".mine.cardlog.tmp").exists());
    }

    #[test]
    fn dropped_stage_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mine.cardlog");
        write_store(&path, b"original").unwrap();

        let staged = StagedWrite::prepare(&path, b"replacement").unwrap();
        assert!(dir.path().join(".mine.cardlog.tmp").exists());
        drop(staged);

        assert_eq!(fs::read(&path).unwrap(), b"original");
        assert!(!dir.path().join(".mine.cardlog.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mine.cardlog");
        write_store(&path, b"bytes").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_store(&dir.path().join("nope.cardlog")),
            Err(CardLogError::CollectionNotFound(_))
        ));
    }
}
