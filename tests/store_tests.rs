//! Integration tests for the encrypted collection store.

use std::fs;

use cardlog::catalog::MemoryCatalog;
use cardlog::crypto::KdfParams;
use cardlog::errors::CardLogError;
use cardlog::store::format;
use cardlog::store::{EncryptedStore, PrintType};
use tempfile::TempDir;

const FAST: KdfParams = KdfParams {
    memory_kib: 8_192,
    iterations: 1,
    parallelism: 1,
};

const PASSWORD: &[u8] = b"pikachu-rules";

/// Helper: a fresh collection path inside a temp dir.
fn collection_path() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("default.cardlog");
    (dir, path)
}

fn catalog() -> MemoryCatalog {
    MemoryCatalog::new().with_cards(&["swsh1-1", "swsh1-2", "base1-4"])
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn fresh_store_is_empty_with_one_login() {
    let (_dir, path) = collection_path();
    let store = EncryptedStore::open(&path, PASSWORD, &FAST).expect("create");

    assert!(path.exists());
    assert_eq!(store.len(), 0);
    assert_eq!(store.total_quantity(), 0);
    assert!(store.records().is_empty());
    assert_eq!(store.logins().len(), 1);
}

#[test]
fn reopen_reproduces_collection_with_extra_login() {
    let (_dir, path) = collection_path();
    let cat = catalog();

    let mut store = EncryptedStore::create(&path, PASSWORD, &FAST).expect("create");
    store
        .add_card(&cat, "swsh1-1", PrintType::Holofoil, 10)
        .unwrap();
    store.add_card(&cat, "swsh1-2", PrintType::Normal, 2).unwrap();
    let before = store.records();
    store.close().unwrap();

    let reopened = EncryptedStore::open(&path, PASSWORD, &FAST).expect("reopen");
    assert_eq!(reopened.records(), before);
    assert_eq!(reopened.logins().len(), 2);

    let again = EncryptedStore::unlock(&path, PASSWORD).expect("reopen again");
    assert_eq!(again.logins().len(), 3);
}

#[test]
fn create_refuses_existing_file() {
    let (_dir, path) = collection_path();
    EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();
    assert!(matches!(
        EncryptedStore::create(&path, PASSWORD, &FAST),
        Err(CardLogError::CollectionAlreadyExists(_))
    ));
}

#[test]
fn unlock_missing_file_is_not_found() {
    let (_dir, path) = collection_path();
    assert!(matches!(
        EncryptedStore::unlock(&path, PASSWORD),
        Err(CardLogError::CollectionNotFound(_))
    ));
}

#[test]
fn kdf_params_come_from_the_header() {
    let (_dir, path) = collection_path();
    EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    // The params passed to `open` only matter on creation.
    let store = EncryptedStore::open(&path, PASSWORD, &KdfParams::default()).unwrap();
    assert_eq!(store.header().kdf, FAST);
}

// ---------------------------------------------------------------------------
// Wrong password, tampering, corruption
// ---------------------------------------------------------------------------

#[test]
fn wrong_password_is_authentication_error() {
    let (_dir, path) = collection_path();
    EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();
    let before = fs::read(&path).unwrap();

    assert!(matches!(
        EncryptedStore::unlock(&path, b"team-rocket"),
        Err(CardLogError::Authentication)
    ));
    // A failed unlock records nothing.
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn tampered_payload_is_authentication_error() {
    let (_dir, path) = collection_path();
    EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        EncryptedStore::unlock(&path, PASSWORD),
        Err(CardLogError::Authentication)
    ));
}

#[test]
fn tampered_header_is_detected() {
    let (_dir, path) = collection_path();
    EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    let bytes = fs::read(&path).unwrap();
    let raw = format::decode(&bytes).unwrap();

    // Re-encode the header with a different creation time; the salt and
    // KDF params are untouched, so only the associated data changes.
    let mut header = raw.header.clone();
    header.created_at = header.created_at - chrono::Duration::days(365);
    let mut forged = format::encode_prelude(&header).unwrap();
    forged.extend_from_slice(&raw.payload);
    fs::write(&path, &forged).unwrap();

    assert!(matches!(
        EncryptedStore::unlock(&path, PASSWORD),
        Err(CardLogError::Authentication)
    ));
}

#[test]
fn forged_kdf_params_are_corrupt_not_derived() {
    let (_dir, path) = collection_path();
    EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    let bytes = fs::read(&path).unwrap();
    let raw = format::decode(&bytes).unwrap();

    // Too weak, and expensive enough that Argon2 would never return.
    let forgeries = [
        KdfParams {
            memory_kib: 1_024,
            ..FAST
        },
        KdfParams {
            iterations: u32::MAX,
            ..FAST
        },
        KdfParams {
            memory_kib: u32::MAX,
            ..FAST
        },
    ];

    for kdf in forgeries {
        let mut header = raw.header.clone();
        header.kdf = kdf;
        let mut forged = format::encode_prelude(&header).unwrap();
        forged.extend_from_slice(&raw.payload);
        fs::write(&path, &forged).unwrap();

        let err = EncryptedStore::unlock(&path, PASSWORD).err().unwrap();
        assert!(
            matches!(err, CardLogError::CorruptStore(_)),
            "{kdf:?} gave {err:?}"
        );
        assert!(err.is_fatal());
    }
}

#[test]
fn truncated_file_is_corrupt() {
    let (_dir, path) = collection_path();
    EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..6]).unwrap();

    let err = EncryptedStore::unlock(&path, PASSWORD).err().unwrap();
    assert!(matches!(err, CardLogError::CorruptStore(_)));
    assert!(err.is_fatal());
}

#[test]
fn foreign_file_is_corrupt() {
    let (_dir, path) = collection_path();
    fs::write(&path, b"card_id,print_type,qnty\nswsh1-1,holofoil,1\n").unwrap();
    assert!(matches!(
        EncryptedStore::unlock(&path, PASSWORD),
        Err(CardLogError::CorruptStore(_))
    ));
}

// ---------------------------------------------------------------------------
// Record operations
// ---------------------------------------------------------------------------

#[test]
fn add_then_remove_clamps_at_zero() {
    let (_dir, path) = collection_path();
    let cat = catalog();
    let mut store = EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    assert_eq!(
        store
            .add_card(&cat, "swsh1-1", PrintType::Holofoil, 10)
            .unwrap(),
        10
    );
    assert_eq!(store.quantity("swsh1-1", PrintType::Holofoil), 10);

    assert_eq!(
        store.remove_card("swsh1-1", PrintType::Holofoil, 15).unwrap(),
        0
    );
    assert_eq!(store.quantity("swsh1-1", PrintType::Holofoil), 0);
    assert!(store.is_empty());

    // Persisted, not just in memory.
    drop(store);
    let reopened = EncryptedStore::unlock(&path, PASSWORD).unwrap();
    assert!(reopened.is_empty());
}

#[test]
fn add_increments_existing_record() {
    let (_dir, path) = collection_path();
    let cat = catalog();
    let mut store = EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    store.add_card(&cat, "base1-4", PrintType::Normal, 1).unwrap();
    let before = store.quantity("base1-4", PrintType::Normal);
    let after = store.add_card(&cat, "base1-4", PrintType::Normal, 3).unwrap();
    assert_eq!(after, before + 3);
}

#[test]
fn add_rejects_zero_and_unknown_cards_without_writing() {
    let (_dir, path) = collection_path();
    let cat = catalog();
    let mut store = EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();
    let before = fs::read(&path).unwrap();

    assert!(matches!(
        store.add_card(&cat, "swsh1-1", PrintType::Normal, 0),
        Err(CardLogError::Validation(_))
    ));
    assert!(matches!(
        store.add_card(&cat, "swsh1-999", PrintType::Normal, 1),
        Err(CardLogError::UnknownCard(_))
    ));
    assert!(matches!(
        store.add_card(&cat, "bad id!", PrintType::Normal, 1),
        Err(CardLogError::Validation(_))
    ));
    assert!(matches!(
        store.add_card(&cat.clone().offline(), "swsh1-1", PrintType::Normal, 1),
        Err(CardLogError::CatalogUnavailable(_))
    ));

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(store.is_empty());
}

#[test]
fn delete_and_missing_records() {
    let (_dir, path) = collection_path();
    let cat = catalog();
    let mut store = EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    store
        .add_card(&cat, "swsh1-2", PrintType::ReverseHolofoil, 4)
        .unwrap();
    assert_eq!(
        store
            .delete_card("swsh1-2", PrintType::ReverseHolofoil)
            .unwrap(),
        4
    );

    assert!(matches!(
        store.delete_card("swsh1-2", PrintType::ReverseHolofoil),
        Err(CardLogError::RecordNotFound { .. })
    ));
    assert!(matches!(
        store.remove_card("swsh1-2", PrintType::Normal, 1),
        Err(CardLogError::RecordNotFound { .. })
    ));
}

#[test]
fn variants_lists_every_print_type() {
    let (_dir, path) = collection_path();
    let cat = catalog();
    let mut store = EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    store.add_card(&cat, "swsh1-1", PrintType::Normal, 1).unwrap();
    store.add_card(&cat, "swsh1-1", PrintType::Holofoil, 2).unwrap();

    assert_eq!(
        store.variants("swsh1-1"),
        vec![(PrintType::Normal, 1), (PrintType::Holofoil, 2)]
    );
    assert_eq!(store.total_quantity(), 3);
    assert_eq!(store.len(), 2);
}

#[cfg(unix)]
#[test]
fn collection_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = collection_path();
    EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn no_temp_files_left_behind() {
    let (dir, path) = collection_path();
    let cat = catalog();
    let mut store = EncryptedStore::create(&path, PASSWORD, &FAST).unwrap();
    store.add_card(&cat, "swsh1-1", PrintType::Normal, 1).unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["default.cardlog"]);
}
