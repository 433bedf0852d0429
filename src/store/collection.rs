//! In-memory collection: records, password fingerprint, login history.
//!
//! Everything here is pure data manipulation; persistence is the job of
//! `EncryptedStore`, which applies these operations to a staged copy and
//! writes it out before the change becomes visible.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::record::{PrintType, Record, RecordKey};
use crate::errors::{CardLogError, Result};

/// A login timestamp split into calendar fields (local time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTime {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl LoginTime {
    fn from_utc(at: DateTime<Utc>) -> Self {
        let local = at.with_timezone(&Local);
        Self {
            day: local.day(),
            month: local.month(),
            year: local.year(),
            hour: local.hour(),
            minute: local.minute(),
            second: local.second(),
        }
    }
}

/// The records a user owns plus the metadata stored with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCollection {
    fingerprint: String,
    login_times: Vec<DateTime<Utc>>,
    records: BTreeMap<RecordKey, u64>,
}

impl RecordCollection {
    /// An empty collection bound to a password fingerprint.
    pub fn new(fingerprint: String) -> Self {
        Self {
            fingerprint,
            login_times: Vec::new(),
            records: BTreeMap::new(),
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add `qty` copies, inserting the record if needed.  Returns the new quantity.
    pub fn add(&mut self, key: RecordKey, qty: u64) -> Result<u64> {
        require_positive(qty)?;
        let entry = self.records.entry(key).or_insert(0);
        *entry = entry.checked_add(qty).ok_or_else(|| {
            CardLogError::Validation(format!("quantity overflow when adding {qty}"))
        })?;
        Ok(*entry)
    }

    /// Remove up to `qty` copies.  Returns the remaining quantity.
    ///
    /// Removing more than is held clamps at zero, and a record that
    /// reaches zero is dropped so every record is strictly positive.
    pub fn remove(&mut self, key: &RecordKey, qty: u64) -> Result<u64> {
        require_positive(qty)?;
        let current = self
            .records
            .get_mut(key)
            .ok_or_else(|| not_found(key))?;

        let remaining = current.saturating_sub(qty);
        if remaining == 0 {
            self.records.remove(key);
        } else {
            *current = remaining;
        }
        Ok(remaining)
    }

    /// Drop a record entirely.  Returns the quantity it held.
    pub fn delete(&mut self, key: &RecordKey) -> Result<u64> {
        self.records.remove(key).ok_or_else(|| not_found(key))
    }

    /// Replace a record's quantity outright; zero deletes it.
    pub fn set_quantity(&mut self, key: RecordKey, qty: u64) {
        if qty == 0 {
            self.records.remove(&key);
        } else {
            self.records.insert(key, qty);
        }
    }

    /// Append a login timestamp.  The history is never rewritten.
    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.login_times.push(at);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Copies held of one (card, print type); 0 when absent.
    pub fn quantity(&self, key: &RecordKey) -> u64 {
        self.records.get(key).copied().unwrap_or(0)
    }

    /// Every print type held for a card, in print-type order.
    pub fn variants(&self, card_id: &str) -> Vec<(PrintType, u64)> {
        self.records
            .iter()
            .filter(|(k, _)| k.card_id == card_id)
            .map(|(k, qty)| (k.print_type, *qty))
            .collect()
    }

    /// Snapshot of all records sorted by card id, then print type.
    pub fn records(&self) -> Vec<Record> {
        self.records
            .iter()
            .map(|(k, qty)| Record {
                card_id: k.card_id.clone(),
                print_type: k.print_type,
                quantity: *qty,
            })
            .collect()
    }

    /// Number of distinct (card, print type) records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.records.values().sum()
    }

    /// Raw login timestamps, oldest first.
    pub fn login_times(&self) -> &[DateTime<Utc>] {
        &self.login_times
    }

    /// Login history decomposed into calendar fields, oldest first.
    pub fn logins(&self) -> Vec<LoginTime> {
        self.login_times
            .iter()
            .copied()
            .map(LoginTime::from_utc)
            .collect()
    }
}

fn require_positive(qty: u64) -> Result<()> {
    if qty == 0 {
        return Err(CardLogError::Validation(
            "quantity must be a positive integer".into(),
        ));
    }
    Ok(())
}

fn not_found(key: &RecordKey) -> CardLogError {
    CardLogError::RecordNotFound {
        card_id: key.card_id.clone(),
        print_type: key.print_type.to_string(),
    }
}

// ---------------------------------------------------------------------------
// On-disk document
// ---------------------------------------------------------------------------

/// Plaintext JSON shape of a collection inside the encrypted payload.
#[derive(Serialize, Deserialize)]
pub(crate) struct CollectionDocument {
    fingerprint: String,
    #[serde(default)]
    login_times: Vec<DateTime<Utc>>,
    #[serde(default)]
    records: Vec<Record>,
}

impl From<&RecordCollection> for CollectionDocument {
    fn from(collection: &RecordCollection) -> Self {
        Self {
            fingerprint: collection.fingerprint.clone(),
            login_times: collection.login_times.clone(),
            records: collection.records(),
        }
    }
}

impl TryFrom<CollectionDocument> for RecordCollection {
    type Error = CardLogError;

    /// Rebuild the keyed map, rejecting documents that break the record
    /// invariants instead of silently merging them.
    fn try_from(doc: CollectionDocument) -> Result<Self> {
        let mut records = BTreeMap::new();
        for record in doc.records {
            if record.quantity == 0 {
                return Err(CardLogError::CorruptStore(format!(
                    "zero-quantity record for {} ({})",
                    record.card_id, record.print_type
                )));
            }
            let key = RecordKey::new(&record.card_id, record.print_type);
            if records.insert(key, record.quantity).is_some() {
                return Err(CardLogError::CorruptStore(format!(
                    "duplicate record for {} ({})",
                    record.card_id, record.print_type
                )));
            }
        }

        Ok(Self {
            fingerprint: doc.fingerprint,
            login_times: doc.login_times,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, pt: PrintType) -> RecordKey {
        RecordKey::new(id, pt)
    }

    #[test]
    fn add_inserts_then_increments() {
        let mut c = RecordCollection::new("fp".into());
        assert_eq!(c.add(key("swsh1-1", PrintType::Holofoil), 10).unwrap(), 10);
        assert_eq!(c.add(key("swsh1-1", PrintType::Holofoil), 3).unwrap(), 13);
        assert_eq!(c.len(), 1);
        assert_eq!(c.quantity(&key("swsh1-1", PrintType::Holofoil)), 13);
    }

    #[test]
    fn add_zero_is_rejected() {
        let mut c = RecordCollection::new("fp".into());
        assert!(matches!(
            c.add(key("swsh1-1", PrintType::Normal), 0),
            Err(CardLogError::Validation(_))
        ));
        assert!(c.is_empty());
    }

    #[test]
    fn remove_clamps_and_drops_empty_records() {
        let mut c = RecordCollection::new("fp".into());
        let k = key("swsh1-1", PrintType::Holofoil);
        c.add(k.clone(), 10).unwrap();

        assert_eq!(c.remove(&k, 4).unwrap(), 6);
        assert_eq!(c.remove(&k, 15).unwrap(), 0);
        assert_eq!(c.quantity(&k), 0);
        assert!(c.is_empty());

        assert!(matches!(
            c.remove(&k, 1),
            Err(CardLogError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn delete_returns_previous_quantity() {
        let mut c = RecordCollection::new("fp".into());
        let k = key("base1-4", PrintType::FirstEditionHolofoil);
        c.add(k.clone(), 2).unwrap();
        assert_eq!(c.delete(&k).unwrap(), 2);
        assert!(c.delete(&k).is_err());
    }

    #[test]
    fn variants_and_totals() {
        let mut c = RecordCollection::new("fp".into());
        c.add(key("swsh1-1", PrintType::Normal), 2).unwrap();
        c.add(key("swsh1-1", PrintType::ReverseHolofoil), 1).unwrap();
        c.add(key("swsh1-2", PrintType::Normal), 5).unwrap();

        assert_eq!(
            c.variants("swsh1-1"),
            vec![(PrintType::Normal, 2), (PrintType::ReverseHolofoil, 1)]
        );
        assert!(c.variants("swsh1-99").is_empty());
        assert_eq!(c.len(), 3);
        assert_eq!(c.total_quantity(), 8);

        let ids: Vec<_> = c.records().into_iter().map(|r| r.card_id).collect();
        assert_eq!(ids, vec!["swsh1-1", "swsh1-1", "swsh1-2"]);
    }

    #[test]
    fn set_quantity_replaces_or_deletes() {
        let mut c = RecordCollection::new("fp".into());
        let k = key("swsh1-1", PrintType::Normal);
        c.add(k.clone(), 9).unwrap();
        c.set_quantity(k.clone(), 4);
        assert_eq!(c.quantity(&k), 4);
        c.set_quantity(k.clone(), 0);
        assert!(c.is_empty());
    }

    #[test]
    fn empty_login_history_is_empty() {
        let c = RecordCollection::new("fp".into());
        assert!(c.logins().is_empty());
    }

    #[test]
    fn login_decomposition_uses_local_time() {
        let mut c = RecordCollection::new("fp".into());
        let at = Utc::now();
        c.record_login(at);
        let local = at.with_timezone(&Local);

        let logins = c.logins();
        assert_eq!(logins.len(), 1);
        assert_eq!(logins[0].year, local.year());
        assert_eq!(logins[0].minute, local.minute());
        assert_eq!(logins[0].second, local.second());
    }

    #[test]
    fn document_roundtrip() {
        let mut c = RecordCollection::new("fp".into());
        c.add(key("swsh1-1", PrintType::Holofoil), 3).unwrap();
        c.record_login(Utc::now());

        let json = serde_json::to_vec(&CollectionDocument::from(&c)).unwrap();
        let doc: CollectionDocument = serde_json::from_slice(&json).unwrap();
        assert_eq!(RecordCollection::try_from(doc).unwrap(), c);
    }

    #[test]
    fn document_with_duplicates_is_corrupt() {
        let json = r#"{"fingerprint":"fp","records":[
            {"card_id":"a-1","print_type":"normal","quantity":1},
            {"card_id":"a-1","print_type":"normal","quantity":2}]}"#;
        let doc: CollectionDocument = serde_json::from_str(json).unwrap();
        assert!(matches!(
            RecordCollection::try_from(doc),
            Err(CardLogError::CorruptStore(_))
        ));
    }
}
