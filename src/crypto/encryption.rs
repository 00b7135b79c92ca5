//! AES-256-GCM sealing for the state file payload.
//!
//! The state file header travels in the clear, so it is passed as
//! associated data: editing the header (salt, Argon2 params) makes the
//! payload fail to open rather than decrypt under a different key.
//!
//! Sealed layout: `[ 12-byte nonce | ciphertext + 16-byte tag ]`

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{Result, SyncError};

const NONCE_LEN: usize = 12;

/// Seal `plaintext` under `key`, authenticating `aad` alongside it.
pub fn encrypt(key: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SyncError::EncryptionFailed(format!("invalid key length: {e}")))?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|e| SyncError::EncryptionFailed(format!("AES-GCM: {e}")))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Open a buffer produced by `encrypt` with the same `key` and `aad`.
pub fn decrypt(key: &[u8], aad: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(SyncError::DecryptionFailed);
    }
    let (nonce, body) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SyncError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: body, aad })
        .map_err(|_| SyncError::DecryptionFailed)
}
