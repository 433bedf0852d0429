//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::catalog::{CardInfo, SetInfo, SetSummary};
use crate::exchange::Valuation;
use crate::store::{LoginTime, Record};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn money(amount: Option<f64>) -> String {
    amount.map_or_else(|| "-".to_string(), |v| format!("${v:.2}"))
}

/// Print the records of a collection (Card, Print type, Qty).
pub fn print_records_table(records: &[Record]) {
    if records.is_empty() {
        info("No cards in this collection yet.");
        tip("Run `cardlog add <CARD> <PRINT-TYPE> [QTY]` to add your first card.");
        return;
    }

    let mut t = table(vec!["Card", "Print type", "Qty"]);
    for r in records {
        t.add_row(vec![
            r.card_id.clone(),
            r.print_type.label().to_string(),
            r.quantity.to_string(),
        ]);
    }
    println!("{t}");
}

/// Print the login history, oldest first.
pub fn print_logins_table(logins: &[LoginTime]) {
    if logins.is_empty() {
        info("No logins recorded.");
        return;
    }

    let mut t = table(vec!["#", "Date", "Time"]);
    for (i, l) in logins.iter().enumerate() {
        t.add_row(vec![
            (i + 1).to_string(),
            format!("{:04}-{:02}-{:02}", l.year, l.month, l.day),
            format!("{:02}:{:02}:{:02}", l.hour, l.minute, l.second),
        ]);
    }
    println!("{t}");
}

/// Print a card's price table, one row per print type.
pub fn print_price_table(card: &CardInfo) {
    println!(
        "{} {} (#{} in {})",
        style(&card.name).bold(),
        style(format!("[{}]", card.id)).dim(),
        card.number,
        card.set_id
    );

    if card.prices.is_empty() {
        info("The catalog has no prices for this card.");
        return;
    }

    let mut t = table(vec!["Print type", "Low", "Mid", "High", "Market", "Direct low"]);
    for (pt, q) in &card.prices {
        t.add_row(vec![
            pt.label().to_string(),
            money(q.low),
            money(q.mid),
            money(q.high),
            money(q.market),
            money(q.direct_low),
        ]);
    }
    println!("{t}");
}

/// Print a valuation report followed by its total.
pub fn print_valuation_table(lines: &[Valuation], total: f64) {
    let mut t = table(vec!["Card", "Print type", "Qty", "Unit", "Value"]);
    for l in lines {
        t.add_row(vec![
            l.card_id.clone(),
            l.print_type.label().to_string(),
            l.quantity.to_string(),
            money(l.unit_price),
            format!("${:.2}", l.value),
        ]);
    }
    println!("{t}");
    println!("{} ${total:.2}", style("Total market value:").bold());
}

pub fn print_sets_table(sets: &[SetSummary]) {
    let mut t = table(vec!["Set", "Name"]);
    for s in sets {
        t.add_row(vec![s.id.clone(), s.name.clone()]);
    }
    println!("{t}");
}

pub fn print_set_details(set: &SetInfo) {
    let mut t = table(vec!["Field", "Value"]);
    t.add_row(vec!["Id".to_string(), set.id.clone()]);
    t.add_row(vec!["Name".to_string(), set.name.clone()]);
    t.add_row(vec!["Series".to_string(), set.series.clone()]);
    t.add_row(vec!["Printed total".to_string(), set.printed_total.to_string()]);
    t.add_row(vec!["Total".to_string(), set.total.to_string()]);
    t.add_row(vec!["Released".to_string(), set.release_date.clone()]);
    println!("{t}");
}
