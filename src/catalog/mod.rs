//! Card catalog lookups.
//!
//! The store and trade code only need to know whether a card exists and,
//! for valuation, what it is worth.  They take a `&dyn CatalogGateway`, so
//! the REST client (`pokemontcg`) and the in-memory catalog used by tests
//! (`memory`) are interchangeable.

pub mod memory;
pub mod pokemontcg;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::errors::Result;
use crate::store::PrintType;

pub use memory::MemoryCatalog;
pub use pokemontcg::PokemonTcgClient;

/// Default REST endpoint.
pub const DEFAULT_CATALOG_URL: &str = "https://api.pokemontcg.io/v2";

/// Card fetched by the status probe; it has been in the catalog since the
/// Sword & Shield base set.
pub const PROBE_CARD_ID: &str = "swsh1-1";

/// One row of the market price table for a print type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceQuote {
    pub low: Option<f64>,
    pub mid: Option<f64>,
    pub high: Option<f64>,
    pub market: Option<f64>,
    pub direct_low: Option<f64>,
}

/// A single card as the catalog describes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardInfo {
    pub id: String,
    pub name: String,
    pub number: String,
    pub set_id: String,
    /// Only print types the catalog has prices for.
    pub prices: BTreeMap<PrintType, PriceQuote>,
}

impl CardInfo {
    /// Market price of one copy, when known.
    pub fn market_price(&self, print_type: PrintType) -> Option<f64> {
        self.prices.get(&print_type).and_then(|q| q.market)
    }
}

/// Details of an expansion set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetInfo {
    pub id: String,
    pub name: String,
    pub series: String,
    pub printed_total: u32,
    pub total: u32,
    pub release_date: String,
}

/// Entry in the set listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetSummary {
    pub id: String,
    pub name: String,
}

/// Connection settings for the REST catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Attempts per request, including the first.
    pub retries: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            retries: 3,
        }
    }
}

/// Lookup capability the collection logic depends on.
///
/// `Ok(None)` means the catalog answered and the id is unknown; transport
/// or server failures are `CatalogUnavailable`.
pub trait CatalogGateway {
    fn find_card(&self, card_id: &str) -> Result<Option<CardInfo>>;

    fn find_set(&self, set_id: &str) -> Result<Option<SetInfo>>;

    fn list_sets(&self) -> Result<Vec<SetSummary>>;

    fn card_exists(&self, card_id: &str) -> Result<bool> {
        Ok(self.find_card(card_id)?.is_some())
    }

    /// Check the catalog answers at all.
    fn probe(&self) -> Result<()> {
        self.find_card(PROBE_CARD_ID).map(|_| ())
    }
}

/// Round a monetary amount to cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_cents(3.14159), 3.14);
        assert_eq!(round_cents(2.675 * 4.0), 10.7);
        assert_eq!(round_cents(0.0), 0.0);
    }

    #[test]
    fn market_price_lookup() {
        let mut prices = BTreeMap::new();
        prices.insert(
            PrintType::Holofoil,
            PriceQuote {
                market: Some(1.25),
                ..PriceQuote::default()
            },
        );
        let card = CardInfo {
            id: "swsh1-1".into(),
            name: "Celebi V".into(),
            number: "1".into(),
            set_id: "swsh1".into(),
            prices,
        };
        assert_eq!(card.market_price(PrintType::Holofoil), Some(1.25));
        assert_eq!(card.market_price(PrintType::Normal), None);
    }
}
