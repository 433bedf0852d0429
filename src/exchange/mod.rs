//! CSV import/export and collection valuation.
//!
//! The CSV layout is `card_id,print_type,qnty[,price]`.  On import each row
//! is authoritative for its (card, print type): the stored quantity is
//! replaced, a later row for the same key wins, and `qnty` 0 deletes.  The
//! whole file is applied as a single write.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::{round_cents, CardInfo, CatalogGateway};
use crate::errors::{CardLogError, Result};
use crate::store::{validate_card_id, EncryptedStore, PrintType, Record, RecordKey};

/// One CSV line.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub card_id: String,
    pub print_type: PrintType,
    pub qnty: u64,
    /// Market value of the whole line, when exported with prices.
    pub price: Option<f64>,
}

#[derive(Deserialize)]
struct RawRow {
    card_id: String,
    print_type: String,
    qnty: String,
    #[serde(default)]
    price: Option<String>,
}

/// Result of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows written to the collection (including deletions).
    pub applied: usize,
    /// Card ids the catalog does not know; their rows were skipped.
    pub skipped: Vec<String>,
}

/// Priced line of a valuation report.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub card_id: String,
    pub print_type: PrintType,
    pub quantity: u64,
    pub unit_price: Option<f64>,
    pub value: f64,
}

fn csv_error(e: csv::Error) -> CardLogError {
    CardLogError::Csv(e.to_string())
}

// ---------------------------------------------------------------------------
// Reading and writing
// ---------------------------------------------------------------------------

/// Parse CSV rows.  Errors name the 1-based line they occurred on.
pub fn read_rows<R: io::Read>(reader: R) -> Result<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<RawRow>().enumerate() {
        // Line 1 is the header.
        let line = index + 2;
        let raw = result.map_err(csv_error)?;

        validate_card_id(&raw.card_id)
            .map_err(|e| CardLogError::Csv(format!("line {line}: {e}")))?;
        let print_type = raw
            .print_type
            .parse::<PrintType>()
            .map_err(|e| CardLogError::Csv(format!("line {line}: {e}")))?;
        let qnty = raw.qnty.parse::<u64>().map_err(|_| {
            CardLogError::Csv(format!("line {line}: invalid quantity '{}'", raw.qnty))
        })?;
        let price = match raw.price.as_deref() {
            None | Some("") => None,
            Some(p) => Some(p.parse::<f64>().map_err(|_| {
                CardLogError::Csv(format!("line {line}: invalid price '{p}'"))
            })?),
        };

        rows.push(CsvRow {
            card_id: raw.card_id,
            print_type,
            qnty,
            price,
        });
    }
    Ok(rows)
}

/// Write rows with a header; the `price` column is only present when
/// `with_prices` is set.
pub fn write_rows<W: io::Write>(writer: W, rows: &[CsvRow], with_prices: bool) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec!["card_id", "print_type", "qnty"];
    if with_prices {
        header.push("price");
    }
    writer.write_record(&header).map_err(csv_error)?;

    for row in rows {
        let qnty = row.qnty.to_string();
        let mut fields = vec![row.card_id.as_str(), row.print_type.as_str(), qnty.as_str()];
        let price = row.price.map(|p| format!("{p:.2}")).unwrap_or_default();
        if with_prices {
            fields.push(price.as_str());
        }
        writer.write_record(&fields).map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import a CSV file into the store.
pub fn import_csv(
    store: &mut EncryptedStore,
    catalog: &dyn CatalogGateway,
    path: &Path,
) -> Result<ImportSummary> {
    let file = std::fs::File::open(path)?;
    let rows = read_rows(file)?;
    import_rows(store, catalog, &rows)
}

/// Replace quantities from `rows`, skipping cards the catalog does not know.
pub fn import_rows(
    store: &mut EncryptedStore,
    catalog: &dyn CatalogGateway,
    rows: &[CsvRow],
) -> Result<ImportSummary> {
    let mut known: BTreeMap<&str, bool> = BTreeMap::new();
    let mut summary = ImportSummary::default();
    let mut updates = Vec::new();

    for row in rows {
        let exists = match known.get(row.card_id.as_str()) {
            Some(&exists) => exists,
            None => {
                let exists = catalog.card_exists(&row.card_id)?;
                known.insert(&row.card_id, exists);
                if !exists {
                    warn!(card_id = %row.card_id, "skipping unknown card in import");
                    summary.skipped.push(row.card_id.clone());
                }
                exists
            }
        };

        if exists {
            updates.push((RecordKey::new(&row.card_id, row.print_type), row.qnty));
        }
    }

    store.replace_quantities(&updates)?;
    summary.applied = updates.len();

    info!(
        applied = summary.applied,
        skipped = summary.skipped.len(),
        "imported CSV"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Export and valuation
// ---------------------------------------------------------------------------

/// Fetch catalog entries for every distinct card id in `records`.
fn lookup_cards(
    catalog: &dyn CatalogGateway,
    records: &[Record],
) -> Result<BTreeMap<String, Option<CardInfo>>> {
    let mut cards = BTreeMap::new();
    for record in records {
        if !cards.contains_key(&record.card_id) {
            debug!(card_id = %record.card_id, "fetching price data");
            cards.insert(record.card_id.clone(), catalog.find_card(&record.card_id)?);
        }
    }
    Ok(cards)
}

fn unit_price(cards: &BTreeMap<String, Option<CardInfo>>, record: &Record) -> Option<f64> {
    cards
        .get(&record.card_id)
        .and_then(Option::as_ref)
        .and_then(|card| card.market_price(record.print_type))
}

/// Build export rows, priced when a catalog is given.
pub fn export_rows(
    store: &EncryptedStore,
    catalog: Option<&dyn CatalogGateway>,
) -> Result<Vec<CsvRow>> {
    let records = store.records();
    let cards = match catalog {
        Some(catalog) => lookup_cards(catalog, &records)?,
        None => BTreeMap::new(),
    };

    Ok(records
        .iter()
        .map(|record| CsvRow {
            card_id: record.card_id.clone(),
            print_type: record.print_type,
            qnty: record.quantity,
            price: unit_price(&cards, record).map(|p| round_cents(p * record.quantity as f64)),
        })
        .collect())
}

/// Write the collection to `path` as CSV.  Returns the number of rows.
pub fn export_csv(
    store: &EncryptedStore,
    catalog: Option<&dyn CatalogGateway>,
    path: &Path,
) -> Result<usize> {
    let rows = export_rows(store, catalog)?;
    let file = std::fs::File::create(path)?;
    write_rows(file, &rows, catalog.is_some())?;
    info!(path = %path.display(), rows = rows.len(), "exported CSV");
    Ok(rows.len())
}

/// Price every record, most valuable first.  Records without a market
/// price are valued at 0.
pub fn valuation(store: &EncryptedStore, catalog: &dyn CatalogGateway) -> Result<Vec<Valuation>> {
    let records = store.records();
    let cards = lookup_cards(catalog, &records)?;

    let mut lines: Vec<Valuation> = records
        .iter()
        .map(|record| {
            let unit = unit_price(&cards, record);
            Valuation {
                card_id: record.card_id.clone(),
                print_type: record.print_type,
                quantity: record.quantity,
                unit_price: unit,
                value: unit
                    .map(|p| round_cents(p * record.quantity as f64))
                    .unwrap_or(0.0),
            }
        })
        .collect();

    lines.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.card_id.cmp(&b.card_id))
            .then_with(|| a.print_type.cmp(&b.print_type))
    });
    Ok(lines)
}

/// Sum of a valuation report, rounded to cents.
pub fn total_value(lines: &[Valuation]) -> f64 {
    round_cents(lines.iter().map(|l| l.value).sum())
}
