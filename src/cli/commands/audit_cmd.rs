//! `cardlog audit`: show recent changes to the collection.
//!
//! Usage:
//!   cardlog audit               # last 50 entries for the active collection
//!   cardlog audit --last 20
//!   cardlog audit --since 2w    # w, d, h and m suffixes
//!   cardlog audit --all         # every collection in the data directory

use chrono::{DateTime, Duration, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::{AuditEntry, AuditLog, AuditQuery};
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{CardLogError, Result};

/// Execute the `audit` command.
pub fn execute(ctx: &Context, last: usize, since: Option<&str>, all: bool) -> Result<()> {
    let audit = AuditLog::open(&ctx.data_dir())
        .ok_or_else(|| CardLogError::AuditError("failed to open audit database".into()))?;

    let query = AuditQuery {
        limit: last,
        since: since.map(|s| parse_since(s, Utc::now())).transpose()?,
        collection: (!all).then(|| ctx.collection.clone()),
    };
    let entries = audit.query(&query)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    let scope = if all {
        "all collections".to_string()
    } else {
        format!("'{}'", ctx.collection)
    };
    println!(
        "{}",
        style(format!("{} change(s) to {scope}:", entries.len())).bold()
    );
    println!("{}", audit_table(&entries, all));
    Ok(())
}

/// Turn "2w", "7d", "24h" or "30m" into the instant that long before `now`.
fn parse_since(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || {
        CardLogError::Validation(format!(
            "invalid duration '{input}': expected a number followed by w, d, h or m"
        ))
    };

    let unit = input.chars().last().ok_or_else(invalid)?;
    let amount: i64 = input[..input.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;

    let span = match unit {
        'w' => Duration::try_weeks(amount),
        'd' => Duration::try_days(amount),
        'h' => Duration::try_hours(amount),
        'm' => Duration::try_minutes(amount),
        _ => None,
    }
    .filter(|span| *span >= Duration::zero())
    .ok_or_else(invalid)?;

    now.checked_sub_signed(span).ok_or_else(invalid)
}

fn audit_table(entries: &[AuditEntry], with_collection: bool) -> Table {
    let mut header = vec!["Time", "Operation"];
    if with_collection {
        header.push("Collection");
    }
    header.extend(["Card", "Details"]);

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);

    for entry in entries {
        let mut row = vec![
            entry
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            styled_operation(&entry.operation),
        ];
        if with_collection {
            row.push(entry.collection.clone());
        }
        row.push(entry.card_id.clone().unwrap_or_else(|| "-".into()));
        row.push(entry.details.clone().unwrap_or_else(|| "-".into()));
        table.add_row(row);
    }
    table
}

fn styled_operation(op: &str) -> String {
    match op {
        "init" | "add" => style(op).green().to_string(),
        "remove" | "delete" => style(op).red().to_string(),
        "trade" => style(op).magenta().to_string(),
        "import" | "export" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}
