//! `secretsync import` — adopt an existing remote secret.
//!
//! Usage:
//!   secretsync import db-admin 4021

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::declaration::parse_identifier;
use crate::errors::{Result, SyncError};
use crate::sync::SecretSync;

/// Execute the `import` command.
pub fn execute(cli: &Cli, key: &str, raw_id: &str) -> Result<()> {
    let id = parse_identifier("secret_id", raw_id)?;
    let ctx = Context::load(cli)?;
    let mut session = ctx.open_state()?;

    if session.state.get(key).is_some() {
        return Err(SyncError::DurableRecordExists(key.to_string()));
    }
    if let Some(existing) = session.state.key_for_id(id) {
        return Err(SyncError::CommandFailed(format!(
            "secret {id} is already tracked as '{existing}'"
        )));
    }

    let declared = ctx
        .load_manifest()
        .map(|m| m.get(key).is_some())
        .unwrap_or(false);

    let store = ctx.open_store()?;
    let record = SecretSync::new(&store).import(id)?;
    let details = format!("{} field(s)", record.fields.len());
    let name = record.name.clone();

    session.state.insert(key, record);
    ctx.save_state(&session)?;
    ctx.audit(AuditOp::Import, Some(key), Some(id), Some(&details));

    output::success(&format!("Imported secret {id} ('{name}') as '{key}'"));
    if !declared {
        output::warning(&format!("'{key}' is not declared in the manifest yet."));
        output::tip("Add a [[secret]] entry with this key before running `secretsync apply`.");
    }
    Ok(())
}
