//! `secretsync audit` — display the audit log.
//!
//! Usage:
//!   secretsync audit               # show last 50 entries
//!   secretsync audit --last 20     # show last 20
//!   secretsync audit --since 7d    # entries from last 7 days

use chrono::{DateTime, TimeDelta, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, SyncError};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    if !AuditLog::db_path(&ctx.state_dir).exists() {
        output::info("No audit entries found.");
        return Ok(());
    }

    let audit = AuditLog::open(&ctx.state_dir)
        .ok_or_else(|| SyncError::AuditError("failed to open audit database".into()))?;

    let since = since.map(parse_since).transpose()?;
    let entries = audit.query(last, since)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);
    Ok(())
}

/// Parse "7d", "24h" or "30m" into the instant that long ago.
fn parse_since(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || {
        SyncError::CommandFailed(format!(
            "invalid duration '{input}', use a format like 7d, 24h, or 30m"
        ))
    };

    let (split, _) = input.char_indices().last().ok_or_else(invalid)?;
    let (num, unit) = input.split_at(split);
    let num: i64 = num.parse().map_err(|_| invalid())?;

    let delta = match unit {
        "d" => TimeDelta::try_days(num),
        "h" => TimeDelta::try_hours(num),
        "m" => TimeDelta::try_minutes(num),
        _ => None,
    }
    .ok_or_else(invalid)?;

    Ok(Utc::now() - delta)
}

/// Print audit entries in a formatted table.
pub fn print_audit_table(entries: &[AuditEntry]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Key", "Secret", "Details"]);

    for entry in entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            entry.secret_key.clone().unwrap_or_else(|| "-".into()),
            entry
                .secret_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
            entry.details.clone().unwrap_or_else(|| "-".into()),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

fn colorize_operation(op: &str) -> String {
    match op {
        "create" | "import" => style(op).green().to_string(),
        "update" | "refresh" => style(op).blue().to_string(),
        "delete" => style(op).red().to_string(),
        "lease-open" | "lease-renew" => style(op).cyan().to_string(),
        "state-encrypt" | "state-decrypt" => style(op).yellow().to_string(),
        _ => op.to_string(),
    }
}
