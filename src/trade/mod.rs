//! Two-party trades between collections.
//!
//! A trade is validated completely before anything is written: every card
//! must exist in the catalog, then the counterparty must hold what is
//! requested, then the own side must hold what is offered.  Only a fully
//! valid trade is applied, to staged copies of both collections, which are
//! committed together.  A rejected trade leaves both files untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::str::FromStr;

use tracing::{debug, info};

use crate::catalog::{round_cents, CardInfo, CatalogGateway};
use crate::errors::{CardLogError, Result};
use crate::store::{validate_card_id, EncryptedStore, PrintType, RecordCollection, RecordKey};

/// One line of a trade: `qty` copies of a (card, print type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeItem {
    pub card_id: String,
    pub print_type: PrintType,
    pub quantity: u64,
}

impl TradeItem {
    pub fn new(card_id: &str, print_type: PrintType, quantity: u64) -> Self {
        Self {
            card_id: card_id.to_string(),
            print_type,
            quantity,
        }
    }

    fn key(&self) -> RecordKey {
        RecordKey::new(&self.card_id, self.print_type)
    }
}

impl FromStr for TradeItem {
    type Err = CardLogError;

    /// Parse `card:print-type[:qty]`; the quantity defaults to 1.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        let (card_id, print_type, qty) = match parts.as_slice() {
            [card, pt] => (*card, *pt, "1"),
            [card, pt, qty] => (*card, *pt, *qty),
            _ => {
                return Err(CardLogError::Validation(format!(
                    "invalid trade item '{s}': expected card:print-type[:qty]"
                )))
            }
        };

        let quantity = qty.trim().parse::<u64>().map_err(|_| {
            CardLogError::Validation(format!("invalid quantity '{qty}' in trade item '{s}'"))
        })?;

        Ok(Self::new(card_id.trim(), print_type.parse()?, quantity))
    }
}

impl fmt::Display for TradeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x {} ({})", self.quantity, self.card_id, self.print_type)
    }
}

/// Which party a check failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    /// The collection initiating the trade.
    Own,
    /// The counterparty.
    Other,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Own => f.write_str("your collection"),
            TradeSide::Other => f.write_str("the other collection"),
        }
    }
}

/// Outcome of a trade.  Anything but `Success` means nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeResult {
    Success,
    CardNotInLog {
        side: TradeSide,
        card_id: String,
        print_type: PrintType,
    },
    CardDoesNotExist {
        card_id: String,
    },
    CardNotInLogQnty {
        side: TradeSide,
        card_id: String,
        print_type: PrintType,
        held: u64,
        requested: u64,
    },
}

impl TradeResult {
    /// Numeric status code: 0 success, 1 not held, 2 unknown card,
    /// 3 insufficient quantity.
    pub fn code(&self) -> u8 {
        match self {
            TradeResult::Success => 0,
            TradeResult::CardNotInLog { .. } => 1,
            TradeResult::CardDoesNotExist { .. } => 2,
            TradeResult::CardNotInLogQnty { .. } => 3,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TradeResult::Success)
    }
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeResult::Success => f.write_str("trade completed"),
            TradeResult::CardNotInLog {
                side,
                card_id,
                print_type,
            } => write!(f, "{side} holds no {card_id} ({print_type})"),
            TradeResult::CardDoesNotExist { card_id } => {
                write!(f, "card '{card_id}' does not exist in the catalog")
            }
            TradeResult::CardNotInLogQnty {
                side,
                card_id,
                print_type,
                held,
                requested,
            } => write!(
                f,
                "{side} holds {held} of {card_id} ({print_type}) but {requested} were requested"
            ),
        }
    }
}

/// Trade one line item each way.
pub fn trade(
    own: &mut EncryptedStore,
    other: &mut EncryptedStore,
    catalog: &dyn CatalogGateway,
    own_item: TradeItem,
    their_item: TradeItem,
) -> Result<TradeResult> {
    trade_many(own, other, catalog, &[own_item], &[their_item])
}

/// Trade `own_items` (leaving `own`) for `their_items` (leaving `other`).
///
/// Malformed input (empty side, zero quantity, bad card id, the same file
/// on both sides) is an `Err(Validation)`.  Rule failures come back as a
/// non-success `TradeResult`.
pub fn trade_many(
    own: &mut EncryptedStore,
    other: &mut EncryptedStore,
    catalog: &dyn CatalogGateway,
    own_items: &[TradeItem],
    their_items: &[TradeItem],
) -> Result<TradeResult> {
    validate_items(own_items, "offered")?;
    validate_items(their_items, "requested")?;
    if same_file(own, other) {
        return Err(CardLogError::Validation(
            "cannot trade a collection with itself".into(),
        ));
    }

    let outcome = check(own, other, catalog, own_items, their_items)?;
    if !outcome.is_success() {
        info!(code = outcome.code(), %outcome, "trade rejected");
        return Ok(outcome);
    }

    let offered = summed(own_items);
    let requested = summed(their_items);

    let own_next = apply(own.collection(), &offered, &requested)?;
    let other_next = apply(other.collection(), &requested, &offered)?;
    EncryptedStore::commit_pair(own, own_next, other, other_next)?;

    info!(
        own = %own.name(),
        other = %other.name(),
        offered = offered.len(),
        requested = requested.len(),
        "trade completed"
    );
    Ok(TradeResult::Success)
}

/// Market value of both sides of a proposed trade, in dollars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeValue {
    /// What the own collection gives away.
    pub offered: f64,
    /// What the own collection receives.
    pub requested: f64,
}

impl TradeValue {
    /// The side that receives more value, and by how much.  `None` when
    /// both sides are worth the same to the cent.
    pub fn favours(&self) -> Option<(TradeSide, f64)> {
        let diff = round_cents(self.requested - self.offered);
        if diff > 0.0 {
            Some((TradeSide::Own, diff))
        } else if diff < 0.0 {
            Some((TradeSide::Other, -diff))
        } else {
            None
        }
    }
}

impl fmt::Display for TradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.favours() {
            Some((side, diff)) => {
                write!(f, "the trade value is tipped in favor of {side} by ${diff:.2}")
            }
            None => f.write_str("the trade value is even"),
        }
    }
}

/// Price both sides of a trade at current market value.
///
/// Lines without a market price, including cards the catalog does not
/// know, count as 0; `trade_many` still rejects unknown cards.
pub fn trade_value(
    catalog: &dyn CatalogGateway,
    own_items: &[TradeItem],
    their_items: &[TradeItem],
) -> Result<TradeValue> {
    validate_items(own_items, "offered")?;
    validate_items(their_items, "requested")?;

    let mut cards = BTreeMap::new();
    Ok(TradeValue {
        offered: side_value(catalog, &mut cards, own_items)?,
        requested: side_value(catalog, &mut cards, their_items)?,
    })
}

fn side_value(
    catalog: &dyn CatalogGateway,
    cards: &mut BTreeMap<String, Option<CardInfo>>,
    items: &[TradeItem],
) -> Result<f64> {
    let mut total = 0.0;
    for item in items {
        if !cards.contains_key(&item.card_id) {
            debug!(card_id = %item.card_id, "fetching price data");
            cards.insert(item.card_id.clone(), catalog.find_card(&item.card_id)?);
        }
        let unit = cards
            .get(&item.card_id)
            .and_then(Option::as_ref)
            .and_then(|card| card.market_price(item.print_type));
        if let Some(unit) = unit {
            total += unit * item.quantity as f64;
        }
    }
    Ok(round_cents(total))
}

fn validate_items(items: &[TradeItem], what: &str) -> Result<()> {
    if items.is_empty() {
        return Err(CardLogError::Validation(format!(
            "a trade needs at least one {what} card"
        )));
    }
    for item in items {
        validate_card_id(&item.card_id)?;
        if item.quantity == 0 {
            return Err(CardLogError::Validation(format!(
                "trade quantity for {} must be positive",
                item.card_id
            )));
        }
    }
    Ok(())
}

fn same_file(a: &EncryptedStore, b: &EncryptedStore) -> bool {
    match (fs::canonicalize(a.path()), fs::canonicalize(b.path())) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.path() == b.path(),
    }
}

/// Quantities per key, with repeated lines added together.
fn summed(items: &[TradeItem]) -> BTreeMap<RecordKey, u64> {
    let mut totals = BTreeMap::new();
    for item in items {
        let total = totals.entry(item.key()).or_insert(0u64);
        *total = total.saturating_add(item.quantity);
    }
    totals
}

fn check(
    own: &EncryptedStore,
    other: &EncryptedStore,
    catalog: &dyn CatalogGateway,
    own_items: &[TradeItem],
    their_items: &[TradeItem],
) -> Result<TradeResult> {
    let mut seen = BTreeSet::new();
    for item in own_items.iter().chain(their_items) {
        if seen.insert(item.card_id.as_str()) && !catalog.card_exists(&item.card_id)? {
            return Ok(TradeResult::CardDoesNotExist {
                card_id: item.card_id.clone(),
            });
        }
    }

    if let Some(failure) = holdings(other.collection(), &summed(their_items), TradeSide::Other) {
        return Ok(failure);
    }
    if let Some(failure) = holdings(own.collection(), &summed(own_items), TradeSide::Own) {
        return Ok(failure);
    }
    Ok(TradeResult::Success)
}

/// First line the collection cannot cover, if any.
fn holdings(
    collection: &RecordCollection,
    wanted: &BTreeMap<RecordKey, u64>,
    side: TradeSide,
) -> Option<TradeResult> {
    wanted.iter().find_map(|(key, &requested)| {
        let held = collection.quantity(key);
        if held == 0 {
            Some(TradeResult::CardNotInLog {
                side,
                card_id: key.card_id.clone(),
                print_type: key.print_type,
            })
        } else if held < requested {
            Some(TradeResult::CardNotInLogQnty {
                side,
                card_id: key.card_id.clone(),
                print_type: key.print_type,
                held,
                requested,
            })
        } else {
            None
        }
    })
}

fn apply(
    current: &RecordCollection,
    outgoing: &BTreeMap<RecordKey, u64>,
    incoming: &BTreeMap<RecordKey, u64>,
) -> Result<RecordCollection> {
    let mut next = current.clone();
    for (key, &qty) in outgoing {
        next.remove(key, qty)?;
    }
    for (key, &qty) in incoming {
        next.add(key.clone(), qty)?;
    }
    Ok(next)
}
