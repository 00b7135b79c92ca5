//! `secretsync lease` — ephemeral field reads.
//!
//! Usage:
//!   secretsync lease open password 12 13
//!   secretsync lease renew <token>
//!
//! Values go to stdout only.  The token carries secret ids and the field
//! name, never values, so it is safe to keep between renewals.

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::{parse_ids, Cli, Context};
use crate::errors::Result;
use crate::lease::LeaseManager;

/// Execute `lease open`.
pub fn execute_open(cli: &Cli, field: &str, raw_ids: &[String]) -> Result<()> {
    let ids = parse_ids(raw_ids)?;
    let ctx = Context::load(cli)?;
    let store = ctx.open_store()?;
    let manager = LeaseManager::new(&store);

    let lease = manager.open(&ids, field)?;
    output::print_lease(&lease);

    let details = format!("field={field} fetched={}", lease.values.len());
    ctx.audit(AuditOp::LeaseOpen, None, None, Some(&details));
    manager.close(lease);
    Ok(())
}

/// Execute `lease renew`.
pub fn execute_renew(cli: &Cli, token: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let store = ctx.open_store()?;
    let manager = LeaseManager::new(&store);

    let lease = manager.renew(token)?;
    output::print_lease(&lease);

    let details = format!("field={} fetched={}", lease.field, lease.values.len());
    ctx.audit(AuditOp::LeaseRenew, None, None, Some(&details));
    manager.close(lease);
    Ok(())
}
