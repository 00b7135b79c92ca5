//! `secretsync version` — display version and build features.

use console::style;

use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!("secretsync {}", env!("CARGO_PKG_VERSION"));
    let audit = if cfg!(feature = "audit-log") {
        style("enabled").green()
    } else {
        style("disabled").dim()
    };
    println!("  audit log: {audit}");
    Ok(())
}
