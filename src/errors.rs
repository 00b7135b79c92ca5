use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// All errors that can occur in SecretSync.
#[derive(Debug, Error)]
pub enum SyncError {
    // --- Binding and coercion errors (pre-flight, no remote call made) ---
    #[error("field '{field}' not found in secret template {template_id} (available: {available})")]
    FieldNotInTemplate {
        field: String,
        template_id: u64,
        available: String,
    },

    #[error("invalid {attribute}: '{value}' is not a non-negative integer")]
    InvalidIdentifier {
        attribute: &'static str,
        value: String,
    },

    // --- Remote store errors ---
    #[error("failed to generate a value for field '{field}': {source}")]
    GenerationFailed {
        field: String,
        #[source]
        source: StoreError,
    },

    #[error("{operation} failed for secret {identity}: {source}")]
    Store {
        operation: &'static str,
        identity: String,
        #[source]
        source: StoreError,
    },

    // --- Ephemeral lease errors ---
    #[error("field '{field}' not found in secret {secret_id}")]
    FieldNotFound { secret_id: u64, field: String },

    #[error("lease carry-state is missing — renewal cannot proceed")]
    MissingCarryState,

    #[error("lease carry-state is invalid: {0}")]
    InvalidCarryState(String),

    #[error("lease request is incomplete: {0}")]
    IncompleteLeaseRequest(String),

    // --- Declaration errors ---
    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("Secret '{0}' is not declared in the manifest")]
    UndeclaredSecret(String),

    #[error("Secret '{0}' has no durable record (run `secretsync apply` or `import` first)")]
    NoDurableRecord(String),

    #[error("Secret '{0}' already has a durable record")]
    DurableRecordExists(String),

    // --- State file errors ---
    #[error("Invalid state file format: {0}")]
    InvalidStateFormat(String),

    #[error("State file at {0} is encrypted — set SECRETSYNC_STATE_PASSPHRASE")]
    StateEncrypted(PathBuf),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong passphrase or corrupted state")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

impl SyncError {
    /// Wrap a store failure with the operation and identity it concerned.
    pub fn store(operation: &'static str, identity: impl ToString, source: StoreError) -> Self {
        Self::Store {
            operation,
            identity: identity.to_string(),
            source,
        }
    }
}

/// Convenience type alias for SecretSync results.
pub type Result<T> = std::result::Result<T, SyncError>;
