//! Sync module — reconciles declared secrets with the remote store.
//!
//! Provides:
//! - Template binding of declared fields (`binder`)
//! - The per-field value source decision (`resolve`)
//! - Post-round-trip field merging (`reconcile`)
//! - Create/read/update/delete/import orchestration (`lifecycle`)

pub mod binder;
pub mod lifecycle;
pub mod reconcile;
pub mod resolve;

pub use binder::{bind, bind_with_rule, BindRule};
pub use lifecycle::SecretSync;
pub use reconcile::merge;
pub use resolve::{decide, generation_eligible, Phase, ResolveInput, ValueSource};
