//! State key derivation using HKDF-SHA256.
//!
//! The Argon2id output is the master key.  The key that actually seals the
//! state payload is an HKDF sub-key bound to the state file format version,
//! so a future format can derive an unrelated key from the same passphrase.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, SyncError};

const KEY_LEN: usize = 32;

/// Derive the payload key for state format `version`.
pub fn derive_state_key(master_key: &[u8], version: u8) -> Result<[u8; KEY_LEN]> {
    let info = format!("secretsync-state:v{version}");
    let hk = Hkdf::<Sha256>::new(None, master_key);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info.as_bytes(), &mut okm)
        .map_err(|e| SyncError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}

/// A 32-byte master key, zeroed on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive the payload key for state format `version`.
    pub fn state_key(&self, version: u8) -> Result<StateKey> {
        derive_state_key(&self.bytes, version).map(StateKey)
    }
}

/// The payload sealing key, zeroed on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct StateKey([u8; KEY_LEN]);

impl StateKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}
