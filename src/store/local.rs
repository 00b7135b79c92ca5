//! A `RemoteStore` backed by a JSON file on disk.
//!
//! Lets the CLI be exercised end to end without a real secret server:
//! templates are declared in the file, secrets are written back after
//! every mutation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::memory::{MemoryStore, StoreSnapshot};
use super::{RemoteStore, StoreError, StoreResult};
use crate::errors::{Result, SyncError};
use crate::model::{SecretRecord, TemplateDefinition};

/// File-backed store.  Reads are served from memory; mutations are
/// flushed to disk atomically (temp file + rename).
pub struct LocalStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl LocalStore {
    /// Open the store file at `path`.  A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot = if path.exists() {
            let contents = fs::read_to_string(path)?;
            serde_json::from_str::<StoreSnapshot>(&contents).map_err(|e| {
                SyncError::ConfigError(format!("Failed to parse store file {}: {e}", path.display()))
            })?
        } else {
            StoreSnapshot {
                next_id: 1,
                ..StoreSnapshot::default()
            }
        };

        debug!(
            path = %path.display(),
            templates = snapshot.templates.len(),
            secrets = snapshot.secrets.len(),
            "opened local store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            memory: MemoryStore::from_snapshot(snapshot),
        })
    }

    /// Register a template and flush.
    pub fn add_template(&self, template: TemplateDefinition) -> StoreResult<()> {
        self.memory.add_template(template);
        self.flush()
    }

    fn flush(&self) -> StoreResult<()> {
        let snapshot = self.memory.snapshot();
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::Rejected(format!("store serialization: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl RemoteStore for LocalStore {
    fn fetch_template(&self, template_id: u64) -> StoreResult<TemplateDefinition> {
        self.memory.fetch_template(template_id)
    }

    fn generate_value(
        &self,
        field_slug: &str,
        template: &TemplateDefinition,
    ) -> StoreResult<String> {
        self.memory.generate_value(field_slug, template)
    }

    fn create(&self, secret: &SecretRecord) -> StoreResult<SecretRecord> {
        let created = self.memory.create(secret)?;
        self.flush()?;
        Ok(created)
    }

    fn read(&self, id: u64) -> StoreResult<SecretRecord> {
        self.memory.read(id)
    }

    fn update(&self, secret: &SecretRecord) -> StoreResult<SecretRecord> {
        let updated = self.memory.update(secret)?;
        self.flush()?;
        Ok(updated)
    }

    fn delete(&self, id: u64) -> StoreResult<()> {
        self.memory.delete(id)?;
        self.flush()
    }
}
