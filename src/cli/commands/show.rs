//! `secretsync show` — display durable records.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, SyncError};

/// Execute the `show` command.
pub fn execute(cli: &Cli, key: Option<&str>, show_values: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let session = ctx.open_state()?;

    match key {
        Some(key) => {
            let record = session
                .state
                .get(key)
                .ok_or_else(|| SyncError::NoDurableRecord(key.to_string()))?;
            output::print_record_fields(key, record, show_values);
        }
        None => {
            output::info(&format!(
                "{} durable record(s){}",
                session.state.records.len(),
                if session.is_encrypted() { " (encrypted at rest)" } else { "" }
            ));
            output::print_records_table(&session.state.records);
        }
    }
    Ok(())
}
