//! The manifest file: a TOML list of desired secrets.
//!
//! ```toml
//! [[secret]]
//! key = "db-admin"
//! name = "Database admin"
//! folder_id = "12"
//! site_id = "1"
//! template_id = "6003"
//!
//! [[secret.fields]]
//! name = "Username"
//! value = "admin"
//!
//! [[secret.fields]]
//! name = "Password"   # no value: generated on create, preserved afterwards
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::desired::DesiredSecret;
use crate::errors::{Result, SyncError};

/// All desired secrets declared in one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "secret")]
    pub secrets: Vec<DesiredSecret>,
}

impl Manifest {
    /// Parse a manifest from TOML text and validate it.
    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)
            .map_err(|e| SyncError::ManifestError(format!("invalid TOML: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load and validate the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::ManifestError(format!(
                "manifest not found at {}",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents).map_err(|e| match e {
            SyncError::ManifestError(msg) => {
                SyncError::ManifestError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Find a declared secret by its key.
    pub fn get(&self, key: &str) -> Option<&DesiredSecret> {
        self.secrets.iter().find(|s| s.key == key)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for secret in &self.secrets {
            if secret.key.trim().is_empty() {
                return Err(SyncError::ManifestError(format!(
                    "secret '{}' has an empty key",
                    secret.name
                )));
            }
            if !seen.insert(secret.key.as_str()) {
                return Err(SyncError::ManifestError(format!(
                    "duplicate secret key '{}'",
                    secret.key
                )));
            }
            if secret.name.trim().is_empty() {
                return Err(SyncError::ManifestError(format!(
                    "secret '{}' has an empty name",
                    secret.key
                )));
            }
        }
        Ok(())
    }
}
