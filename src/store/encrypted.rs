//! High-level collection operations used by CLI commands.
//!
//! `EncryptedStore` wraps the file format, the crypto layer and the
//! in-memory `RecordCollection`.  Every mutation is write-through: it is
//! applied to a staged copy, the copy is encrypted and written, and only
//! then does it replace the in-memory collection.  A failed write leaves
//! both the file and the in-memory state at the previous version.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error, info};
use zeroize::Zeroize;

use super::collection::{CollectionDocument, LoginTime, RecordCollection};
use super::format::{self, StagedWrite, StoreHeader, CURRENT_VERSION};
use super::interrupt::CriticalSection;
use super::record::{validate_card_id, PrintType, Record, RecordKey};
use crate::catalog::CatalogGateway;
use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::kdf::{generate_salt, KdfParams};
use crate::crypto::keys::{fingerprints_match, MasterKey};
use crate::errors::{CardLogError, Result};

/// An unlocked collection file.  Create one with `EncryptedStore::open`,
/// `create` or `unlock`, then use its methods to manage records.
pub struct EncryptedStore {
    /// Path to the `.cardlog` file on disk.
    path: PathBuf,

    /// Plaintext header (salt, KDF parameters, creation time).
    header: StoreHeader,

    /// The decrypted records and metadata.
    collection: RecordCollection,

    /// The derived master key (zeroized on drop).
    master_key: MasterKey,
}

impl EncryptedStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open the collection at `path`, creating it if the file is missing.
    ///
    /// `params` only matters on creation; existing files carry their own
    /// KDF parameters in the header.
    pub fn open(path: &Path, password: &[u8], params: &KdfParams) -> Result<Self> {
        if path.exists() {
            Self::unlock(path, password)
        } else {
            Self::create(path, password, params)
        }
    }

    /// Create a brand-new, empty collection file at `path`.
    ///
    /// Generates a random salt, derives the master key, records the
    /// password fingerprint and the creation login, and writes the file.
    pub fn create(path: &Path, password: &[u8], params: &KdfParams) -> Result<Self> {
        if path.exists() {
            return Err(CardLogError::CollectionAlreadyExists(path.to_path_buf()));
        }

        let salt = generate_salt();
        let master_key = MasterKey::derive(password, &salt, params)?;

        let header = StoreHeader {
            version: CURRENT_VERSION,
            salt: salt.to_vec(),
            kdf: *params,
            created_at: Utc::now(),
        };

        let mut collection = RecordCollection::new(master_key.fingerprint());
        collection.record_login(header.created_at);

        let mut store = Self {
            path: path.to_path_buf(),
            header,
            collection,
            master_key,
        };
        store.save()?;

        info!(path = %store.path.display(), "created collection");
        Ok(store)
    }

    /// Open an existing collection file and record the login.
    ///
    /// A wrong password is always `Authentication`: either the AEAD tag
    /// fails to verify, or (for a file re-keyed under the same password
    /// material) the stored fingerprint does not match.  Structural damage
    /// is `CorruptStore`.
    pub fn unlock(path: &Path, password: &[u8]) -> Result<Self> {
        let raw = format::read_store(path)?;

        let master_key = MasterKey::derive(password, &raw.header.salt, &raw.header.kdf)?;
        let collection = Self::decrypt_collection(&master_key, &raw.prelude, &raw.payload)?;

        if !fingerprints_match(collection.fingerprint(), &master_key.fingerprint()) {
            return Err(CardLogError::Authentication);
        }

        let mut store = Self {
            path: path.to_path_buf(),
            header: raw.header,
            collection,
            master_key,
        };
        store.commit(|c| {
            c.record_login(Utc::now());
            Ok(())
        })?;

        debug!(path = %store.path.display(), records = store.len(), "unlocked collection");
        Ok(store)
    }

    fn decrypt_collection(
        master_key: &MasterKey,
        prelude: &[u8],
        payload: &[u8],
    ) -> Result<RecordCollection> {
        let mut store_key = master_key.store_key()?;
        let plaintext = decrypt(&store_key, payload, prelude);
        store_key.zeroize();

        let mut plaintext = plaintext?;
        let doc: std::result::Result<CollectionDocument, _> = serde_json::from_slice(&plaintext);
        plaintext.zeroize();

        let doc = doc.map_err(|e| CardLogError::CorruptStore(format!("collection JSON: {e}")))?;
        RecordCollection::try_from(doc)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Encrypt a collection into complete file bytes.
    fn seal(&self, collection: &RecordCollection) -> Result<Vec<u8>> {
        let mut bytes = format::encode_prelude(&self.header)?;

        let mut plaintext = serde_json::to_vec(&CollectionDocument::from(collection))
            .map_err(|e| CardLogError::SerializationError(format!("collection: {e}")))?;

        let mut store_key = self.master_key.store_key()?;
        let sealed = encrypt(&store_key, &plaintext, &bytes);
        store_key.zeroize();
        plaintext.zeroize();

        bytes.extend_from_slice(&sealed?);
        Ok(bytes)
    }

    /// Serialize, encrypt and atomically write the current collection.
    pub fn save(&mut self) -> Result<()> {
        let bytes = self.seal(&self.collection)?;
        format::write_store(&self.path, &bytes)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "saved collection");
        Ok(())
    }

    /// Persist the final state and release the key.
    pub fn close(mut self) -> Result<()> {
        self.save()
    }

    /// Apply `mutate` to a staged copy, persist it, then publish it.
    fn commit<T>(&mut self, mutate: impl FnOnce(&mut RecordCollection) -> Result<T>) -> Result<T> {
        let mut staged = self.collection.clone();
        let out = mutate(&mut staged)?;

        let bytes = self.seal(&staged)?;
        format::write_store(&self.path, &bytes)?;

        self.collection = staged;
        Ok(out)
    }

    /// Persist new collections for two stores as one unit.
    ///
    /// Both files are fully written to temp files first; only then are both
    /// renamed into place, inside a single critical section.  If sealing or
    /// staging either side fails, neither file changes.
    ///
    /// If the second rename fails after the first succeeded, `first` is
    /// updated to match its file and `PartialCommit` names both paths.
    pub(crate) fn commit_pair(
        first: &mut EncryptedStore,
        first_next: RecordCollection,
        second: &mut EncryptedStore,
        second_next: RecordCollection,
    ) -> Result<()> {
        let first_bytes = first.seal(&first_next)?;
        let second_bytes = second.seal(&second_next)?;

        let _guard = CriticalSection::enter();
        let first_stage = StagedWrite::prepare(&first.path, &first_bytes)?;
        let second_stage = StagedWrite::prepare(&second.path, &second_bytes)?;

        first_stage.commit()?;
        first.collection = first_next;

        if let Err(e) = second_stage.commit() {
            error!(
                applied = %first.path.display(),
                pending = %second.path.display(),
                error = %e,
                "second half of paired write failed"
            );
            return Err(CardLogError::PartialCommit {
                applied: first.path.clone(),
                pending: second.path.clone(),
                reason: e.to_string(),
            });
        }
        second.collection = second_next;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Record operations (each one persists before returning)
    // ------------------------------------------------------------------

    /// Add `qty` copies of a card after confirming it exists in the catalog.
    ///
    /// Returns the new quantity.
    pub fn add_card(
        &mut self,
        catalog: &dyn CatalogGateway,
        card_id: &str,
        print_type: PrintType,
        qty: u64,
    ) -> Result<u64> {
        validate_card_id(card_id)?;
        if qty == 0 {
            return Err(CardLogError::Validation(
                "quantity must be a positive integer".into(),
            ));
        }
        if !catalog.card_exists(card_id)? {
            return Err(CardLogError::UnknownCard(card_id.to_string()));
        }

        let key = RecordKey::new(card_id, print_type);
        let new_qty = self.commit(|c| c.add(key, qty))?;
        info!(card_id, %print_type, qty, new_qty, "added cards");
        Ok(new_qty)
    }

    /// Remove up to `qty` copies.  Returns the remaining quantity, which is
    /// 0 (and the record gone) when more were removed than held.
    pub fn remove_card(&mut self, card_id: &str, print_type: PrintType, qty: u64) -> Result<u64> {
        let key = RecordKey::new(card_id, print_type);
        let remaining = self.commit(|c| c.remove(&key, qty))?;
        info!(card_id, %print_type, qty, remaining, "removed cards");
        Ok(remaining)
    }

    /// Delete a record regardless of quantity.  Returns the quantity dropped.
    pub fn delete_card(&mut self, card_id: &str, print_type: PrintType) -> Result<u64> {
        let key = RecordKey::new(card_id, print_type);
        let dropped = self.commit(|c| c.delete(&key))?;
        info!(card_id, %print_type, dropped, "deleted record");
        Ok(dropped)
    }

    /// Apply several quantity replacements as a single write.
    pub(crate) fn replace_quantities(&mut self, rows: &[(RecordKey, u64)]) -> Result<()> {
        self.commit(|c| {
            for (key, qty) in rows {
                c.set_quantity(key.clone(), *qty);
            }
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn quantity(&self, card_id: &str, print_type: PrintType) -> u64 {
        self.collection
            .quantity(&RecordKey::new(card_id, print_type))
    }

    pub fn variants(&self, card_id: &str) -> Vec<(PrintType, u64)> {
        self.collection.variants(card_id)
    }

    pub fn records(&self) -> Vec<Record> {
        self.collection.records()
    }

    /// Number of distinct records (not copies).
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn total_quantity(&self) -> u64 {
        self.collection.total_quantity()
    }

    pub fn logins(&self) -> Vec<LoginTime> {
        self.collection.logins()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The collection name, i.e. the file stem.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    pub fn collection(&self) -> &RecordCollection {
        &self.collection
    }

    pub fn created_at(&self) -> chrono::DateTime<Utc> {
        self.header.created_at
    }
}
