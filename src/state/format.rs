//! Encrypted state file format.
//!
//! An encrypted state file has this layout:
//!
//! ```text
//! [SSYN: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][sealed payload]
//! ```
//!
//! - **Magic** (`SSYN`): identifies an encrypted state file.  Plain state
//!   files are JSON and never start with these bytes.
//! - **Header JSON**: serialized `StateHeader` (salt, Argon2 params).
//! - **Sealed payload**: AES-256-GCM output over the plain state JSON,
//!   with the header bytes as associated data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::{decrypt, derive_master_key_with_params, encrypt, generate_salt, Argon2Params};
use crate::errors::{Result, SyncError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"SSYN";

/// Current encrypted format version.
pub const CURRENT_VERSION: u8 = 1;

/// 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// StateHeader
// ---------------------------------------------------------------------------

/// Cleartext metadata needed to re-derive the payload key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHeader {
    pub version: u8,

    /// Argon2id salt (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    pub argon2: Argon2Params,

    pub encrypted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Whether `data` is an encrypted state file.
pub fn is_encrypted(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// Encrypt plain state bytes under `passphrase`.
pub fn seal(plaintext: &[u8], passphrase: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
    let header = StateHeader {
        version: CURRENT_VERSION,
        salt: generate_salt().to_vec(),
        argon2: *params,
        encrypted_at: Utc::now(),
    };
    let header_bytes = serde_json::to_vec(&header)
        .map_err(|e| SyncError::SerializationError(format!("state header: {e}")))?;
    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        SyncError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;

    let master = derive_master_key_with_params(passphrase, &header.salt, &header.argon2)?;
    let key = master.state_key(header.version)?;
    let payload = encrypt(key.as_bytes(), &header_bytes, plaintext)?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + header_bytes.len() + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.push(CURRENT_VERSION);
    buf.extend_from_slice(&header_len.to_le_bytes());
    buf.extend_from_slice(&header_bytes);
    buf.extend_from_slice(&payload);

    debug!(bytes = buf.len(), "sealed state");
    Ok(buf)
}

/// Decrypt an encrypted state file back to plain state bytes.
pub fn open(data: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    let (header, header_bytes, payload) = split(data)?;

    let master = derive_master_key_with_params(passphrase, &header.salt, &header.argon2)?;
    let key = master.state_key(header.version)?;
    decrypt(key.as_bytes(), header_bytes, payload)
}

/// Parse the cleartext header without decrypting.
pub fn read_header(data: &[u8]) -> Result<StateHeader> {
    split(data).map(|(header, _, _)| header)
}

fn split(data: &[u8]) -> Result<(StateHeader, &[u8], &[u8])> {
    if data.len() < PREFIX_LEN || !is_encrypted(data) {
        return Err(SyncError::InvalidStateFormat(
            "missing SSYN magic bytes".into(),
        ));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(SyncError::InvalidStateFormat(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| SyncError::InvalidStateFormat("bad header length".into()))?,
    );
    let header_end = usize::try_from(header_len)
        .ok()
        .and_then(|len| PREFIX_LEN.checked_add(len))
        .filter(|end| *end <= data.len())
        .ok_or_else(|| SyncError::InvalidStateFormat("header length exceeds file size".into()))?;

    let header_bytes = &data[PREFIX_LEN..header_end];
    let header: StateHeader = serde_json::from_slice(header_bytes)
        .map_err(|e| SyncError::InvalidStateFormat(format!("header JSON: {e}")))?;

    Ok((header, header_bytes, &data[header_end..]))
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
