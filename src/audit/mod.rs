//! Audit module — lifecycle history.
//!
//! Records every lifecycle operation the CLI performs (create, update,
//! refresh, delete, import, lease open/renew, state encryption) in a
//! local SQLite database at `<state_dir>/audit.db`.  Field values are
//! never recorded.
//!
//! The SQLite log is behind the `audit-log` feature; `AuditOp` is always
//! available so callers don't need to care.

use std::fmt;

#[cfg(feature = "audit-log")]
mod sqlite;

#[cfg(feature = "audit-log")]
pub use sqlite::{log_audit, AuditEntry, AuditLog};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOp {
    Create,
    Update,
    Refresh,
    Delete,
    Import,
    LeaseOpen,
    LeaseRenew,
    StateEncrypt,
    StateDecrypt,
}

impl AuditOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOp::Create => "create",
            AuditOp::Update => "update",
            AuditOp::Refresh => "refresh",
            AuditOp::Delete => "delete",
            AuditOp::Import => "import",
            AuditOp::LeaseOpen => "lease-open",
            AuditOp::LeaseRenew => "lease-renew",
            AuditOp::StateEncrypt => "state-encrypt",
            AuditOp::StateDecrypt => "state-decrypt",
        }
    }
}

impl fmt::Display for AuditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
