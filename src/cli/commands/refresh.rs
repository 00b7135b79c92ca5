//! `secretsync refresh` — read every durable record back from the store.

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, SyncError};
use crate::sync::SecretSync;

/// Execute the `refresh` command.
///
/// A record that fails to read is reported and left unchanged; the
/// command fails at the end if any did.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let store = ctx.open_store()?;
    let mut session = ctx.open_state()?;
    let sync = SecretSync::new(&store);

    if session.state.records.is_empty() {
        output::info("No durable records to refresh.");
        return Ok(());
    }

    let mut failed = Vec::new();
    let keys: Vec<String> = session.state.records.keys().cloned().collect();
    for key in keys {
        let Some(prior) = session.state.get(&key) else {
            continue;
        };
        match sync.read(prior) {
            Ok(record) => {
                let changed = &record != prior;
                let id = record.id;
                session.state.insert(&key, record);
                ctx.audit(AuditOp::Refresh, Some(&key), id, changed.then_some("changed"));
                if changed {
                    output::info(&format!("'{key}' changed remotely"));
                }
            }
            Err(e) => {
                output::error(&format!("'{key}': {e}"));
                failed.push(key);
            }
        }
    }

    ctx.save_state(&session)?;

    if failed.is_empty() {
        output::success(&format!(
            "Refreshed {} record(s)",
            session.state.records.len()
        ));
        Ok(())
    } else {
        Err(SyncError::CommandFailed(format!(
            "refresh failed for: {}",
            failed.join(", ")
        )))
    }
}
