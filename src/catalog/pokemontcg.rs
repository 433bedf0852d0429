//! REST client for the Pokémon TCG API (`/cards/{id}`, `/sets/{id}`, `/sets`).
//!
//! Requests carry the `X-Api-Key` header when a key is configured.  A 404
//! is an answer ("no such card"); transport errors, 5xx and 429 are
//! retried with linear backoff up to the configured attempt count.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use ureq::Agent;

use super::{CardInfo, CatalogConfig, CatalogGateway, PriceQuote, SetInfo, SetSummary};
use crate::errors::{CardLogError, Result};
use crate::store::{validate_card_id, PrintType};

const PAGE_SIZE: usize = 250;
const USER_AGENT: &str = concat!("cardlog/", env!("CARGO_PKG_VERSION"));
const BACKOFF_STEP: Duration = Duration::from_millis(500);

pub struct PokemonTcgClient {
    agent: Agent,
    config: CatalogConfig,
}

impl PokemonTcgClient {
    pub fn new(config: CatalogConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Self { agent, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GET a JSON document.  `Ok(None)` on 404.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = self.url(path);
        let attempts = self.config.retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let mut request = self.agent.get(&url).header("User-Agent", USER_AGENT);
            if let Some(key) = &self.config.api_key {
                request = request.header("X-Api-Key", key);
            }
            for (name, value) in query {
                request = request.query(*name, value);
            }

            debug!(%url, attempt, "catalog request");
            match request.call() {
                Ok(mut response) => {
                    return response
                        .body_mut()
                        .read_json::<T>()
                        .map(Some)
                        .map_err(|e| {
                            CardLogError::CatalogUnavailable(format!("bad response from {url}: {e}"))
                        });
                }
                Err(ureq::Error::StatusCode(404)) => return Ok(None),
                Err(ureq::Error::StatusCode(code)) if !is_retryable(code) => {
                    return Err(CardLogError::CatalogUnavailable(format!(
                        "{url} returned HTTP {code}"
                    )));
                }
                Err(e) => {
                    warn!(%url, attempt, error = %e, "catalog request failed");
                    last_error = e.to_string();
                }
            }

            if attempt < attempts {
                thread::sleep(BACKOFF_STEP * attempt);
            }
        }

        Err(CardLogError::CatalogUnavailable(format!(
            "{url} failed after {attempts} attempt(s): {last_error}"
        )))
    }
}

fn is_retryable(status: u16) -> bool {
    status == 429 || status >= 500
}

impl CatalogGateway for PokemonTcgClient {
    fn find_card(&self, card_id: &str) -> Result<Option<CardInfo>> {
        validate_card_id(card_id)?;
        let found: Option<Envelope<ApiCard>> = self.get_json(&format!("cards/{card_id}"), &[])?;
        Ok(found.map(|env| env.data.into()))
    }

    fn find_set(&self, set_id: &str) -> Result<Option<SetInfo>> {
        // Set ids follow the same character rules as card ids.
        validate_card_id(set_id)?;
        let found: Option<Envelope<ApiSet>> = self.get_json(&format!("sets/{set_id}"), &[])?;
        Ok(found.map(|env| env.data.into()))
    }

    fn list_sets(&self) -> Result<Vec<SetSummary>> {
        let mut sets = Vec::new();
        let mut page = 1usize;

        loop {
            let query = [("page", page.to_string()), ("pageSize", PAGE_SIZE.to_string())];
            let Some(batch): Option<Page<ApiSet>> = self.get_json("sets", &query)? else {
                break;
            };

            let fetched = batch.data.len();
            sets.extend(batch.data.into_iter().map(|s| SetSummary {
                id: s.id,
                name: s.name,
            }));

            let total = batch.total_count.unwrap_or(sets.len());
            if fetched == 0 || sets.len() >= total {
                break;
            }
            page += 1;
        }

        Ok(sets)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    total_count: Option<usize>,
}

#[derive(Deserialize)]
struct ApiCard {
    id: String,
    name: String,
    #[serde(default)]
    number: String,
    set: ApiSetRef,
    #[serde(default)]
    tcgplayer: Option<ApiTcgPlayer>,
}

#[derive(Deserialize)]
struct ApiSetRef {
    id: String,
}

#[derive(Deserialize)]
struct ApiTcgPlayer {
    #[serde(default)]
    prices: BTreeMap<String, ApiPrice>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPrice {
    low: Option<f64>,
    mid: Option<f64>,
    high: Option<f64>,
    market: Option<f64>,
    direct_low: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSet {
    id: String,
    name: String,
    #[serde(default)]
    series: String,
    #[serde(default)]
    printed_total: u32,
    #[serde(default)]
    total: u32,
    #[serde(default)]
    release_date: String,
}

impl From<ApiCard> for CardInfo {
    fn from(card: ApiCard) -> Self {
        // Price keys the catalog adds later are ignored rather than rejected.
        let prices = card
            .tcgplayer
            .map(|t| t.prices)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, p)| {
                let print_type = key.parse::<PrintType>().ok()?;
                Some((
                    print_type,
                    PriceQuote {
                        low: p.low,
                        mid: p.mid,
                        high: p.high,
                        market: p.market,
                        direct_low: p.direct_low,
                    },
                ))
            })
            .collect();

        Self {
            id: card.id,
            name: card.name,
            number: card.number,
            set_id: card.set.id,
            prices,
        }
    }
}

impl From<ApiSet> for SetInfo {
    fn from(set: ApiSet) -> Self {
        Self {
            id: set.id,
            name: set.name,
            series: set.series,
            printed_total: set.printed_total,
            total: set.total,
            release_date: set.release_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_JSON: &str = r#"{
        "data": {
            "id": "swsh1-1",
            "name": "Celebi V",
            "supertype": "Pokémon",
            "number": "1",
            "set": { "id": "swsh1", "name": "Sword & Shield" },
            "tcgplayer": {
                "url": "https://prices.example/swsh1-1",
                "updatedAt": "2021/08/04",
                "prices": {
                    "holofoil": { "low": 1.0, "mid": 1.73, "high": 5.0, "market": 1.62, "directLow": 1.38 },
                    "reverseHolofoil": { "low": 0.5, "market": 0.9 },
                    "unlimitedHolofoil": { "market": 12.0 }
                }
            }
        }
    }"#;

    #[test]
    fn card_response_maps_known_print_types() {
        let env: Envelope<ApiCard> = serde_json::from_str(CARD_JSON).unwrap();
        let card: CardInfo = env.data.into();

        assert_eq!(card.id, "swsh1-1");
        assert_eq!(card.set_id, "swsh1");
        assert_eq!(card.prices.len(), 2);
        let holo = card.prices[&PrintType::Holofoil];
        assert_eq!(holo.market, Some(1.62));
        assert_eq!(holo.direct_low, Some(1.38));
        assert_eq!(card.prices[&PrintType::ReverseHolofoil].mid, None);
    }

    #[test]
    fn card_without_prices() {
        let json = r#"{"data":{"id":"xy1-1","name":"Venusaur-EX","number":"1","set":{"id":"xy1"}}}"#;
        let env: Envelope<ApiCard> = serde_json::from_str(json).unwrap();
        let card: CardInfo = env.data.into();
        assert!(card.prices.is_empty());
    }

    #[test]
    fn set_page_parses() {
        let json = r#"{
            "data": [{
                "id": "base1", "name": "Base", "series": "Base",
                "printedTotal": 102, "total": 102, "releaseDate": "1999/01/09"
            }],
            "page": 1, "pageSize": 250, "count": 1, "totalCount": 1
        }"#;
        let page: Page<ApiSet> = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_count, Some(1));

        let set: SetInfo = page.data.into_iter().next().unwrap().into();
        assert_eq!(set.printed_total, 102);
        assert_eq!(set.release_date, "1999/01/09");
    }

    #[test]
    fn retry_policy() {
        assert!(is_retryable(500));
        assert!(is_retryable(503));
        assert!(is_retryable(429));
        assert!(!is_retryable(400));
        assert!(!is_retryable(403));
    }

    #[test]
    fn url_joining_ignores_trailing_slash() {
        let client = PokemonTcgClient::new(CatalogConfig {
            base_url: "https://catalog.test/v2/".into(),
            ..CatalogConfig::default()
        });
        assert_eq!(client.url("cards/swsh1-1"), "https://catalog.test/v2/cards/swsh1-1");
    }
}
