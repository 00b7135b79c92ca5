//! State module — the host's durable records.
//!
//! Provides:
//! - `StateFile`: durable `SecretRecord`s keyed by manifest key
//! - Optional at-rest encryption of the whole file (`format`)
//!
//! The state file is plain pretty-printed JSON unless encryption is
//! enabled, in which case it starts with the `SSYN` magic.  Writes are
//! atomic (temp file + rename).  Ephemeral lease values never reach it.

pub mod format;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crypto::Argon2Params;
use crate::errors::{Result, SyncError};
use crate::model::SecretRecord;

/// File name of the state file inside the state directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Current plain state schema version.
pub const STATE_VERSION: u32 = 1;

/// How to write the state file.
#[derive(Clone, Copy)]
pub enum Protection<'a> {
    Plain,
    Encrypted {
        passphrase: &'a str,
        params: &'a Argon2Params,
    },
}

/// Durable records, keyed by manifest key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub records: BTreeMap<String, SecretRecord>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            records: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// `<state_dir>/state.json`
    pub fn path_in(state_dir: &Path) -> PathBuf {
        state_dir.join(STATE_FILE_NAME)
    }

    /// Whether the file at `path` is encrypted.  A missing file is not.
    pub fn is_encrypted_file(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        Ok(format::is_encrypted(&fs::read(path)?))
    }

    /// Load the state at `path`.  A missing file is an empty state.
    ///
    /// Encrypted files need `passphrase`; without one this fails with
    /// `StateEncrypted` so the caller can ask for it.
    pub fn load(path: &Path, passphrase: Option<&str>) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file yet");
            return Ok(Self::default());
        }

        let raw = fs::read(path)?;
        let plain = if format::is_encrypted(&raw) {
            let passphrase =
                passphrase.ok_or_else(|| SyncError::StateEncrypted(path.to_path_buf()))?;
            format::open(&raw, passphrase.as_bytes())?
        } else {
            raw
        };

        let state: StateFile = serde_json::from_slice(&plain)
            .map_err(|e| SyncError::InvalidStateFormat(format!("{}: {e}", path.display())))?;
        if state.version != STATE_VERSION {
            return Err(SyncError::InvalidStateFormat(format!(
                "unsupported state version {}, expected {STATE_VERSION}",
                state.version
            )));
        }

        debug!(path = %path.display(), records = state.records.len(), "loaded state");
        Ok(state)
    }

    /// Write the state to `path` atomically.
    pub fn save(&self, path: &Path, protection: Protection<'_>) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| SyncError::SerializationError(format!("state: {e}")))?;

        let bytes = match protection {
            Protection::Plain => json,
            Protection::Encrypted { passphrase, params } => {
                format::seal(&json, passphrase.as_bytes(), params)?
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let parent = path.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        fs::write(&tmp_path, &bytes)?;
        restrict_permissions(&tmp_path);
        fs::rename(&tmp_path, path)?;

        info!(
            path = %path.display(),
            records = self.records.len(),
            encrypted = matches!(protection, Protection::Encrypted { .. }),
            "saved state"
        );
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&SecretRecord> {
        self.records.get(key)
    }

    pub fn insert(&mut self, key: &str, record: SecretRecord) {
        self.records.insert(key.to_string(), record);
    }

    pub fn remove(&mut self, key: &str) -> Option<SecretRecord> {
        self.records.remove(key)
    }

    /// Manifest key of the record holding remote `id`, if any.
    pub fn key_for_id(&self, id: u64) -> Option<&str> {
        self.records
            .iter()
            .find(|(_, r)| r.id == Some(id))
            .map(|(k, _)| k.as_str())
    }
}

/// Owner-only permissions on Unix; no-op elsewhere.
fn restrict_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    let _ = path;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: u64) -> SecretRecord {
        SecretRecord {
            id: Some(id),
            name: format!("secret-{id}"),
            ..SecretRecord::default()
        }
    }

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn missing_file_is_empty_state() {
        let tmp = TempDir::new().unwrap();
        let state = StateFile::load(&StateFile::path_in(tmp.path()), None).unwrap();
        assert!(state.records.is_empty());
        assert_eq!(state.version, STATE_VERSION);
    }

    #[test]
    fn plain_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = StateFile::path_in(&tmp.path().join("nested"));
        let mut state = StateFile::default();
        state.insert("db", record(4));
        state.save(&path, Protection::Plain).unwrap();

        let loaded = StateFile::load(&path, None).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.key_for_id(4), Some("db"));
        assert!(!StateFile::is_encrypted_file(&path).unwrap());
    }

    #[test]
    fn encrypted_state_needs_passphrase() {
        let tmp = TempDir::new().unwrap();
        let path = StateFile::path_in(tmp.path());
        let mut state = StateFile::default();
        state.insert("db", record(1));
        state
            .save(
                &path,
                Protection::Encrypted {
                    passphrase: "s3cret-pass",
                    params: &fast(),
                },
            )
            .unwrap();

        assert!(StateFile::is_encrypted_file(&path).unwrap());
        assert!(matches!(
            StateFile::load(&path, None),
            Err(SyncError::StateEncrypted(_))
        ));
        assert!(matches!(
            StateFile::load(&path, Some("nope")),
            Err(SyncError::DecryptionFailed)
        ));
        assert_eq!(StateFile::load(&path, Some("s3cret-pass")).unwrap(), state);
    }

    #[test]
    fn rejects_unknown_version() {
        let tmp = TempDir::new().unwrap();
        let path = StateFile::path_in(tmp.path());
        fs::write(&path, r#"{"version": 9, "records": {}}"#).unwrap();
        assert!(matches!(
            StateFile::load(&path, None),
            Err(SyncError::InvalidStateFormat(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn state_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = StateFile::path_in(tmp.path());
        StateFile::default().save(&path, Protection::Plain).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
