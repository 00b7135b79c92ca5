//! One module per subcommand.  Each exposes an `execute` function.

pub mod apply;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod completions;
pub mod destroy;
pub mod import_cmd;
pub mod lease;
pub mod lookup;
pub mod refresh;
pub mod show;
pub mod state_cmd;
pub mod version;
