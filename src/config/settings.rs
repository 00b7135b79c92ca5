use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::Argon2Params;
use crate::errors::{Result, SyncError};

/// Project-level configuration, loaded from `.secretsync.toml`.
///
/// Every field has a default, so no config file is needed at all.
/// Command-line flags override whatever is set here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to the project root) holding durable state
    /// and the audit log.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Manifest of declared secrets.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// JSON file backing the local store.
    #[serde(default = "default_store_file")]
    pub store_file: String,

    /// Encrypt the state file at rest.
    #[serde(default)]
    pub encrypt_state: bool,

    /// Default log filter when `SECRETSYNC_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Argon2id parameters for newly encrypted state files.
    #[serde(default)]
    pub argon2: Argon2Params,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_state_dir() -> String {
    ".secretsync".to_string()
}

fn default_manifest() -> String {
    "secrets.toml".to_string()
}

fn default_store_file() -> String {
    "store.json".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            manifest: default_manifest(),
            store_file: default_store_file(),
            encrypt_state: false,
            log_level: default_log_level(),
            argon2: Argon2Params::default(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".secretsync.toml";

    /// Load settings from `<project_dir>/.secretsync.toml`, or defaults
    /// when the file does not exist.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        toml::from_str(&contents).map_err(|e| {
            SyncError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })
    }

    /// `<project_dir>/<state_dir>`
    pub fn state_dir_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.state_dir)
    }

    /// `<project_dir>/<manifest>`
    pub fn manifest_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.manifest)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
