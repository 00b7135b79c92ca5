//! Cryptographic primitives for the durable state file.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Argon2id passphrase-based key derivation (`kdf`)
//! - HKDF-based state key derivation and the zeroizing `MasterKey` (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

pub use encryption::{decrypt, encrypt};
pub use kdf::{derive_master_key_with_params, generate_salt, Argon2Params};
pub use keys::{derive_state_key, MasterKey, StateKey};
