//! `secretsync destroy` — delete a secret remotely and drop its record.

use dialoguer::Confirm;

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, SyncError};
use crate::store::StoreError;
use crate::sync::SecretSync;

/// Execute the `destroy` command.
pub fn execute(cli: &Cli, key: &str, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let mut session = ctx.open_state()?;

    let id = session
        .state
        .get(key)
        .and_then(|r| r.id)
        .ok_or_else(|| SyncError::NoDurableRecord(key.to_string()))?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete secret '{key}' (id {id}) from the store?"))
            .default(false)
            .interact()
            .map_err(|e| SyncError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let store = ctx.open_store()?;
    match SecretSync::new(&store).delete(id) {
        Ok(()) => {}
        Err(SyncError::Store {
            source: StoreError::SecretNotFound(_),
            ..
        }) => {
            output::warning(&format!("Secret {id} was already gone from the store."));
        }
        Err(e) => return Err(e),
    }

    session.state.remove(key);
    ctx.save_state(&session)?;
    ctx.audit(AuditOp::Delete, Some(key), Some(id), None);
    output::success(&format!("Destroyed '{key}'"));
    Ok(())
}
