//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use std::collections::BTreeMap;

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::lease::{FetchWarning, Lease, LookupResult};
use crate::model::{Field, SecretRecord};

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

/// One row per durable record.
pub fn print_records_table(records: &BTreeMap<String, SecretRecord>) {
    if records.is_empty() {
        info("No durable records yet.");
        tip("Run `secretsync apply` to create the secrets in your manifest.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Key", "Id", "Name", "Folder", "Template", "Fields"]);

    for (key, record) in records {
        table.add_row(vec![
            key.clone(),
            record.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            record.name.clone(),
            record.folder_id.to_string(),
            record.template_id.to_string(),
            record.fields.len().to_string(),
        ]);
    }

    println!("{table}");
}

/// Fields of one durable record.  Values are masked unless `show_values`.
pub fn print_record_fields(key: &str, record: &SecretRecord, show_values: bool) {
    println!(
        "{} {}",
        style(key).bold(),
        style(format!("({})", record.identity())).dim()
    );

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Slug", "Value", "Attachment"]);

    for field in &record.fields {
        table.add_row(vec![
            field.name.clone(),
            field.slug.clone(),
            display_value(field, show_values),
            field
                .attachment
                .as_ref()
                .map_or_else(|| "-".to_string(), |a| format!("{} (#{})", a.filename, a.attachment_id)),
        ]);
    }

    println!("{table}");
    if record.generation_active() {
        tip("Key generation was requested when this secret was created.");
    }
}

/// Values of a persistable lookup.
pub fn print_lookup(result: &LookupResult) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", result.field.as_str()]);
    for value in &result.values {
        table.add_row(vec![value.id.to_string(), value.value.clone()]);
    }
    println!("{table}");
    print_fetch_warnings(&result.warnings);
}

/// Values of an open lease plus how to renew it.
pub fn print_lease(lease: &Lease) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", lease.field.as_str()]);
    for leased in &lease.values {
        table.add_row(vec![leased.id.to_string(), leased.value.to_string()]);
    }
    println!("{table}");
    print_fetch_warnings(&lease.warnings);

    info(&format!(
        "Renew before {}",
        lease.renew_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    println!("{} {}", style("token:").dim(), lease.carry_state);
}

pub fn print_fetch_warnings(warnings: &[FetchWarning]) {
    for w in warnings {
        warning(&w.message);
    }
}

fn display_value(field: &Field, show_values: bool) -> String {
    if field.is_file {
        return style("<file>").dim().to_string();
    }
    if show_values || field.value.is_empty() {
        return field.value.clone();
    }
    style("\u{2022}".repeat(8)).dim().to_string()
}
