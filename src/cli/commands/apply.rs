//! `secretsync apply` — create or update every declared secret.
//!
//! Secrets without a durable record are created; the rest are updated.
//! State is saved after each secret so a failure part-way through keeps
//! the records that already succeeded.

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, SyncError};
use crate::sync::SecretSync;

/// Execute the `apply` command.
pub fn execute(cli: &Cli, only: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let manifest = ctx.load_manifest()?;

    let targets: Vec<_> = match only {
        Some(key) => vec![manifest
            .get(key)
            .ok_or_else(|| SyncError::UndeclaredSecret(key.to_string()))?],
        None => manifest.secrets.iter().collect(),
    };
    if targets.is_empty() {
        output::info("Manifest declares no secrets.");
        return Ok(());
    }

    let store = ctx.open_store()?;
    let mut session = ctx.open_state()?;
    let sync = SecretSync::new(&store);

    let (mut created, mut updated) = (0usize, 0usize);
    for desired in targets {
        let (record, op) = match session.state.get(&desired.key) {
            Some(prior) => (sync.update(desired, prior)?, AuditOp::Update),
            None => (sync.create(desired)?, AuditOp::Create),
        };

        let id = record.id;
        let details = format!("{} field(s)", record.fields.len());
        session.state.insert(&desired.key, record);
        ctx.save_state(&session)?;
        ctx.audit(op, Some(&desired.key), id, Some(&details));

        match op {
            AuditOp::Create => {
                created += 1;
                output::success(&format!("Created '{}' ({details})", desired.key));
            }
            _ => {
                updated += 1;
                output::success(&format!("Updated '{}' ({details})", desired.key));
            }
        }
    }

    output::info(&format!("{created} created, {updated} updated"));
    Ok(())
}
