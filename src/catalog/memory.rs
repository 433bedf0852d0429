//! In-memory catalog for tests and offline use.

use std::collections::BTreeMap;

use super::{CardInfo, CatalogGateway, PriceQuote, SetInfo, SetSummary};
use crate::errors::{CardLogError, Result};
use crate::store::PrintType;

/// A fixed set of cards and sets.  With `offline()` every lookup fails
/// with `CatalogUnavailable`, which is how tests simulate an outage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    cards: BTreeMap<String, CardInfo>,
    sets: BTreeMap<String, SetInfo>,
    offline: bool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card with market prices for the given print types.
    pub fn with_card(mut self, card_id: &str, prices: &[(PrintType, f64)]) -> Self {
        let set_id = card_id.split('-').next().unwrap_or(card_id).to_string();
        let number = card_id.rsplit('-').next().unwrap_or("").to_string();
        let prices = prices
            .iter()
            .map(|(pt, market)| {
                (
                    *pt,
                    PriceQuote {
                        market: Some(*market),
                        ..PriceQuote::default()
                    },
                )
            })
            .collect();

        self.cards.insert(
            card_id.to_string(),
            CardInfo {
                id: card_id.to_string(),
                name: card_id.to_string(),
                number,
                set_id,
                prices,
            },
        );
        self
    }

    /// Add several cards that exist but carry no prices.
    pub fn with_cards(self, card_ids: &[&str]) -> Self {
        card_ids
            .iter()
            .fold(self, |catalog, id| catalog.with_card(id, &[]))
    }

    pub fn with_set(mut self, set: SetInfo) -> Self {
        self.sets.insert(set.id.clone(), set);
        self
    }

    /// Make every lookup fail as if the network were down.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(CardLogError::CatalogUnavailable(
                "catalog is offline".into(),
            ));
        }
        Ok(())
    }
}

impl CatalogGateway for MemoryCatalog {
    fn find_card(&self, card_id: &str) -> Result<Option<CardInfo>> {
        self.check_online()?;
        Ok(self.cards.get(card_id).cloned())
    }

    fn find_set(&self, set_id: &str) -> Result<Option<SetInfo>> {
        self.check_online()?;
        Ok(self.sets.get(set_id).cloned())
    }

    fn list_sets(&self) -> Result<Vec<SetSummary>> {
        self.check_online()?;
        Ok(self
            .sets
            .values()
            .map(|s| SetSummary {
                id: s.id.clone(),
                name: s.name.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_cards() {
        let catalog = MemoryCatalog::new().with_card("swsh1-1", &[(PrintType::Holofoil, 2.5)]);
        assert!(catalog.card_exists("swsh1-1").unwrap());
        assert!(!catalog.card_exists("swsh1-999").unwrap());

        let card = catalog.find_card("swsh1-1").unwrap().unwrap();
        assert_eq!(card.set_id, "swsh1");
        assert_eq!(card.number, "1");
        assert_eq!(card.market_price(PrintType::Holofoil), Some(2.5));
    }

    #[test]
    fn offline_catalog_is_unavailable() {
        let catalog = MemoryCatalog::new().with_cards(&["swsh1-1"]).offline();
        assert!(matches!(
            catalog.card_exists("swsh1-1"),
            Err(CardLogError::CatalogUnavailable(_))
        ));
        assert!(catalog.probe().is_err());
    }

    #[test]
    fn sets_are_listed_in_id_order() {
        let set = |id: &str| SetInfo {
            id: id.into(),
            name: format!("Set {id}"),
            series: "Sword & Shield".into(),
            printed_total: 202,
            total: 216,
            release_date: "2020/02/07".into(),
        };
        let catalog = MemoryCatalog::new().with_set(set("swsh2")).with_set(set("swsh1"));
        let ids: Vec<_> = catalog.list_sets().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["swsh1", "swsh2"]);
        assert!(catalog.find_set("base1").unwrap().is_none());
    }
}
