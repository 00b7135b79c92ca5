//! Passphrase-based key derivation using Argon2id.
//!
//! The state passphrase is stretched with Argon2id.  Parameters come from
//! `.secretsync.toml` and are recorded in the state file header, so a
//! file can always be reopened with the parameters it was written with.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::keys::MasterKey;
use crate::errors::{Result, SyncError};

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

const KEY_LEN: usize = 32;

/// Minimum accepted memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Argon2id cost parameters, mirroring the `[argon2]` settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Argon2Params {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    fn validate(&self) -> Result<()> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(SyncError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations == 0 || self.parallelism == 0 {
            return Err(SyncError::KeyDerivationFailed(
                "Argon2 iterations and parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Derive a master key with explicit parameters.
pub fn derive_master_key_with_params(
    passphrase: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<MasterKey> {
    params.validate()?;

    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| SyncError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let mut key = [0u8; KEY_LEN];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|e| SyncError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(MasterKey::new(key))
}

/// A fresh random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn same_inputs_same_key() {
        let salt = generate_salt();
        let a = derive_master_key_with_params(b"pass", &salt, &fast()).unwrap();
        let b = derive_master_key_with_params(b"pass", &salt, &fast()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salts_differ() {
        let a = derive_master_key_with_params(b"pass", &generate_salt(), &fast()).unwrap();
        let b = derive_master_key_with_params(b"pass", &generate_salt(), &fast()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn weak_params_rejected() {
        let weak = Argon2Params {
            memory_kib: 1024,
            ..fast()
        };
        assert!(matches!(
            derive_master_key_with_params(b"pass", &generate_salt(), &weak),
            Err(SyncError::KeyDerivationFailed(_))
        ));
    }
}
