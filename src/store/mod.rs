//! Store module — the remote secret store collaborator.
//!
//! The reconciliation core only ever talks to a `RemoteStore`.  Two
//! implementations ship with the crate:
//! - `MemoryStore`: in-process, used by tests and as the engine behind
//!   `LocalStore` (`memory`)
//! - `LocalStore`: a JSON file acting as the store, for local dry runs (`local`)
//!
//! Transport, authentication and retry policy live behind this trait and
//! are not this crate's concern.

pub mod generator;
pub mod local;
pub mod memory;

use thiserror::Error;

use crate::model::{SecretRecord, TemplateDefinition};

pub use local::LocalStore;
pub use memory::MemoryStore;

/// Failures reported by a remote store.  Never retried by the core.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("secret {0} not found")]
    SecretNotFound(u64),

    #[error("secret template {0} not found")]
    TemplateNotFound(u64),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The operations the core consumes from the remote store.
///
/// A single handle is shared read-only across concurrent operations,
/// so every method takes `&self`.
pub trait RemoteStore: Send + Sync {
    /// Fetch a template definition by id.
    fn fetch_template(&self, template_id: u64) -> StoreResult<TemplateDefinition>;

    /// Generate a value for the template field identified by `field_slug`.
    fn generate_value(&self, field_slug: &str, template: &TemplateDefinition)
        -> StoreResult<String>;

    /// Create a secret.  The store assigns the id.
    fn create(&self, secret: &SecretRecord) -> StoreResult<SecretRecord>;

    /// Read a secret by id.
    fn read(&self, id: u64) -> StoreResult<SecretRecord>;

    /// Replace an existing secret.  `secret.id` must be set.
    fn update(&self, secret: &SecretRecord) -> StoreResult<SecretRecord>;

    /// Delete a secret by id.
    fn delete(&self, id: u64) -> StoreResult<()>;

    /// Extract a field's value from a fetched secret by name or slug.
    fn extract_field<'a>(&self, secret: &'a SecretRecord, field_name: &str) -> Option<&'a str> {
        secret.field_value(field_name)
    }
}
