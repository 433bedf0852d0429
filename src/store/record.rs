//! Record types held in a collection.
//!
//! A record is one (card id, print type) pair and how many copies of it
//! the owner holds.  Print types use the catalog's price-table keys as
//! their canonical spelling so they round-trip through CSV and JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CardLogError, Result};

/// Physical printing variant of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrintType {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "holofoil")]
    Holofoil,
    #[serde(rename = "reverseHolofoil")]
    ReverseHolofoil,
    #[serde(rename = "1stEditionNormal")]
    FirstEditionNormal,
    #[serde(rename = "1stEditionHolofoil")]
    FirstEditionHolofoil,
}

impl PrintType {
    pub const ALL: [PrintType; 5] = [
        PrintType::Normal,
        PrintType::Holofoil,
        PrintType::ReverseHolofoil,
        PrintType::FirstEditionNormal,
        PrintType::FirstEditionHolofoil,
    ];

    /// Canonical name, identical to the catalog price key.
    pub fn as_str(self) -> &'static str {
        match self {
            PrintType::Normal => "normal",
            PrintType::Holofoil => "holofoil",
            PrintType::ReverseHolofoil => "reverseHolofoil",
            PrintType::FirstEditionNormal => "1stEditionNormal",
            PrintType::FirstEditionHolofoil => "1stEditionHolofoil",
        }
    }

    /// Human-readable label for tables.
    pub fn label(self) -> &'static str {
        match self {
            PrintType::Normal => "normal",
            PrintType::Holofoil => "holofoil",
            PrintType::ReverseHolofoil => "reverse holofoil",
            PrintType::FirstEditionNormal => "1st edition normal",
            PrintType::FirstEditionHolofoil => "1st edition holofoil",
        }
    }
}

impl fmt::Display for PrintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrintType {
    type Err = CardLogError;

    /// Accepts the canonical names, kebab/snake spellings, and the short
    /// codes older exports used (`n`, `h`, `rh`, `fen`, `feh`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "normal" | "n" | "unlimited" => Ok(PrintType::Normal),
            "holofoil" | "holo" | "h" => Ok(PrintType::Holofoil),
            "reverseholofoil" | "reverseholo" | "rh" => Ok(PrintType::ReverseHolofoil),
            "1steditionnormal" | "firsteditionnormal" | "fen" => Ok(PrintType::FirstEditionNormal),
            "1steditionholofoil" | "firsteditionholofoil" | "feh" => {
                Ok(PrintType::FirstEditionHolofoil)
            }
            _ => Err(CardLogError::Validation(format!(
                "unknown print type '{s}' — expected one of: normal, holofoil, reverseHolofoil, 1stEditionNormal, 1stEditionHolofoil"
            ))),
        }
    }
}

/// Identity of a record: at most one record per key in a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub card_id: String,
    pub print_type: PrintType,
}

impl RecordKey {
    pub fn new(card_id: &str, print_type: PrintType) -> Self {
        Self {
            card_id: card_id.to_string(),
            print_type,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.card_id, self.print_type)
    }
}

/// One row of a collection, as exposed to callers and serialized to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub card_id: String,
    pub print_type: PrintType,
    pub quantity: u64,
}

/// Validate a card identifier before it is stored or sent to the catalog.
///
/// Catalog ids are `<set id>-<collector number>`, e.g. `swsh1-1` or
/// `sv3pt5-TG01`.  Only ASCII letters, digits, hyphens and periods are
/// allowed, and the first character must be a letter or digit, which keeps
/// ids safe inside a URL path (no `.` or `..` segments).
pub fn validate_card_id(card_id: &str) -> Result<()> {
    if card_id.is_empty() {
        return Err(CardLogError::Validation("card id cannot be empty".into()));
    }
    if card_id.len() > 64 {
        return Err(CardLogError::Validation(
            "card id cannot exceed 64 characters".into(),
        ));
    }
    if !card_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
    {
        return Err(CardLogError::Validation(format!(
            "card id '{card_id}' contains invalid characters — only ASCII letters, digits, hyphens, and periods are allowed"
        )));
    }
    if !card_id.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(CardLogError::Validation(format!(
            "card id '{card_id}' must start with a letter or digit"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_type_canonical_roundtrip() {
        for pt in PrintType::ALL {
            assert_eq!(pt.as_str().parse::<PrintType>().unwrap(), pt);
        }
    }

    #[test]
    fn print_type_aliases() {
        assert_eq!("rh".parse::<PrintType>().unwrap(), PrintType::ReverseHolofoil);
        assert_eq!(
            "reverse-holofoil".parse::<PrintType>().unwrap(),
            PrintType::ReverseHolofoil
        );
        assert_eq!("FEH".parse::<PrintType>().unwrap(), PrintType::FirstEditionHolofoil);
        assert_eq!(
            "first_edition_normal".parse::<PrintType>().unwrap(),
            PrintType::FirstEditionNormal
        );
        assert_eq!("Holo".parse::<PrintType>().unwrap(), PrintType::Holofoil);
    }

    #[test]
    fn unknown_print_type_is_validation_error() {
        assert!(matches!(
            "shadowless".parse::<PrintType>(),
            Err(CardLogError::Validation(_))
        ));
    }

    #[test]
    fn print_type_serializes_as_catalog_key() {
        let json = serde_json::to_string(&PrintType::FirstEditionHolofoil).unwrap();
        assert_eq!(json, "\"1stEditionHolofoil\"");
    }

    #[test]
    fn card_id_validation() {
        assert!(validate_card_id("swsh1-1").is_ok());
        assert!(validate_card_id("sv3pt5-TG01").is_ok());
        assert!(validate_card_id("").is_err());
        assert!(validate_card_id("swsh1/1").is_err());
        assert!(validate_card_id("swsh1 1").is_err());
        assert!(validate_card_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn dot_segments_are_not_card_ids() {
        for id in [".", "..", "...", ".hidden", "-1"] {
            assert!(
                matches!(validate_card_id(id), Err(CardLogError::Validation(_))),
                "{id:?} should be rejected"
            );
        }
        assert!(validate_card_id("sv3.5-1").is_ok());
    }
}
