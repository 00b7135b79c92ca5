//! In-process `RemoteStore`.
//!
//! Behaves like the real remote store where the core cares:
//! - ids and per-field item ids are assigned on create
//! - fields come back in template order, not submission order
//! - canonical field attributes are copied from the template
//! - generation intents are honored on create but never echoed back
//!
//! Tests can also inject read failures and mask password values to
//! mimic write-protected secrets.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::generator::generate_password;
use super::{RemoteStore, StoreError, StoreResult};
use crate::model::{Field, SecretRecord, TemplateDefinition};

/// Serializable contents of a store, used by `LocalStore`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default = "first_id")]
    pub next_id: u64,
    #[serde(default)]
    pub templates: Vec<TemplateDefinition>,
    #[serde(default)]
    pub secrets: Vec<SecretRecord>,
}

fn first_id() -> u64 {
    1
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    next_item_id: u64,
    templates: BTreeMap<u64, TemplateDefinition>,
    secrets: BTreeMap<u64, SecretRecord>,
    failing_reads: HashSet<u64>,
    /// Lowercased slugs whose generation requests fail.
    failing_generation: HashSet<String>,
    mask_passwords: bool,
}

/// A `RemoteStore` held entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_snapshot(StoreSnapshot {
            next_id: first_id(),
            ..StoreSnapshot::default()
        })
    }

    /// Rebuild a store from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let next_item_id = snapshot
            .secrets
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.item_id))
            .max()
            .unwrap_or(0)
            + 1;
        let max_secret_id = snapshot.secrets.iter().filter_map(|s| s.id).max().unwrap_or(0);

        let inner = Inner {
            next_id: snapshot.next_id.max(max_secret_id + 1),
            next_item_id,
            templates: snapshot.templates.into_iter().map(|t| (t.id, t)).collect(),
            secrets: snapshot
                .secrets
                .into_iter()
                .filter_map(|s| s.id.map(|id| (id, s)))
                .collect(),
            failing_reads: HashSet::new(),
            failing_generation: HashSet::new(),
            mask_passwords: false,
        };
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Capture the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.lock();
        StoreSnapshot {
            next_id: inner.next_id,
            templates: inner.templates.values().cloned().collect(),
            secrets: inner.secrets.values().cloned().collect(),
        }
    }

    /// Register (or replace) a template.
    pub fn add_template(&self, template: TemplateDefinition) {
        self.lock().templates.insert(template.id, template);
    }

    /// Make every subsequent `read(id)` fail as if the store were unreachable.
    pub fn fail_reads_for(&self, id: u64) {
        self.lock().failing_reads.insert(id);
    }

    /// Make every subsequent `generate_value` for `slug` fail.
    pub fn fail_generation_for(&self, slug: &str) {
        self.lock().failing_generation.insert(slug.to_ascii_lowercase());
    }

    /// When enabled, reads return password fields with an empty value.
    pub fn mask_passwords(&self, enabled: bool) {
        self.lock().mask_passwords = enabled;
    }

    /// Overwrite one field's value directly, bypassing the core.
    pub fn set_field_value(&self, id: u64, field_name: &str, value: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        let secret = inner
            .secrets
            .get_mut(&id)
            .ok_or(StoreError::SecretNotFound(id))?;
        let field = secret
            .fields
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(field_name))
            .ok_or_else(|| StoreError::Rejected(format!("secret {id} has no field '{field_name}'")))?;
        field.value = value.to_string();
        Ok(())
    }

    /// Number of secrets currently stored.
    pub fn secret_count(&self) -> usize {
        self.lock().secrets.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Rebuild the submitted field set in template order with canonical
    /// attributes, keeping item ids from `existing` where present.
    fn canonical_fields(
        &mut self,
        submitted: &SecretRecord,
        existing: Option<&SecretRecord>,
    ) -> StoreResult<Vec<Field>> {
        let template = self
            .templates
            .get(&submitted.template_id)
            .cloned()
            .ok_or(StoreError::TemplateNotFound(submitted.template_id))?;

        for field in &submitted.fields {
            let known = template
                .fields
                .iter()
                .any(|tf| tf.id == field.field_id || tf.name.eq_ignore_ascii_case(&field.name));
            if !known {
                return Err(StoreError::Rejected(format!(
                    "field '{}' is not part of template {}",
                    field.name, template.id
                )));
            }
        }

        let mut fields = Vec::new();
        for tf in &template.fields {
            let Some(sub) = submitted
                .fields
                .iter()
                .find(|f| f.field_id == tf.id || f.name.eq_ignore_ascii_case(&tf.name))
            else {
                continue;
            };

            let item_id = existing
                .and_then(|e| e.fields.iter().find(|f| f.field_id == tf.id))
                .map(|f| f.item_id)
                .unwrap_or_else(|| {
                    let id = self.next_item_id;
                    self.next_item_id += 1;
                    id
                });

            fields.push(Field {
                name: tf.name.clone(),
                slug: tf.slug.clone(),
                field_id: tf.id,
                item_id,
                value: sub.value.clone(),
                is_file: tf.is_file,
                is_notes: tf.is_notes,
                is_password: tf.is_password,
                attachment: if tf.is_file { sub.attachment.clone() } else { None },
                description: tf.description.clone(),
            });
        }
        Ok(fields)
    }

    fn present(&self, secret: &SecretRecord) -> SecretRecord {
        let mut out = secret.clone();
        out.generation = None;
        if self.mask_passwords {
            for field in out.fields.iter_mut().filter(|f| f.is_password) {
                field.value.clear();
            }
        }
        out
    }
}

impl RemoteStore for MemoryStore {
    fn fetch_template(&self, template_id: u64) -> StoreResult<TemplateDefinition> {
        self.lock()
            .templates
            .get(&template_id)
            .cloned()
            .ok_or(StoreError::TemplateNotFound(template_id))
    }

    fn generate_value(
        &self,
        field_slug: &str,
        template: &TemplateDefinition,
    ) -> StoreResult<String> {
        if self
            .lock()
            .failing_generation
            .contains(&field_slug.to_ascii_lowercase())
        {
            return Err(StoreError::Unavailable(format!(
                "password generator unavailable for '{field_slug}'"
            )));
        }
        if template.field_by_slug(field_slug).is_none() {
            return Err(StoreError::Rejected(format!(
                "template {} has no field with slug '{field_slug}'",
                template.id
            )));
        }
        Ok(generate_password(template.password_length))
    }

    fn create(&self, secret: &SecretRecord) -> StoreResult<SecretRecord> {
        let mut inner = self.lock();
        let mut fields = inner.canonical_fields(secret, None)?;

        // Server-side key generation fills key material the caller left empty.
        if let Some(intent) = secret.generation.filter(|g| g.is_active()) {
            for field in fields.iter_mut().filter(|f| f.value.is_empty()) {
                let lower = field.name.to_ascii_lowercase();
                let wanted = (intent.generate_passphrase && lower.contains("passphrase"))
                    || (intent.generate_keys && lower.contains("key"));
                if wanted {
                    field.value = generate_password(32);
                }
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let stored = SecretRecord {
            id: Some(id),
            fields,
            generation: None,
            ..secret.clone()
        };
        inner.secrets.insert(id, stored.clone());
        Ok(inner.present(&stored))
    }

    fn read(&self, id: u64) -> StoreResult<SecretRecord> {
        let inner = self.lock();
        if inner.failing_reads.contains(&id) {
            return Err(StoreError::Unavailable(format!(
                "connection reset while reading secret {id}"
            )));
        }
        inner
            .secrets
            .get(&id)
            .map(|s| inner.present(s))
            .ok_or(StoreError::SecretNotFound(id))
    }

    fn update(&self, secret: &SecretRecord) -> StoreResult<SecretRecord> {
        let id = secret
            .id
            .ok_or_else(|| StoreError::Rejected("update requires a secret id".into()))?;
        let mut inner = self.lock();
        let existing = inner
            .secrets
            .get(&id)
            .cloned()
            .ok_or(StoreError::SecretNotFound(id))?;
        if existing.template_id != secret.template_id {
            return Err(StoreError::Rejected(format!(
                "secret {id} cannot change template from {} to {}",
                existing.template_id, secret.template_id
            )));
        }

        let fields = inner.canonical_fields(secret, Some(&existing))?;
        let stored = SecretRecord {
            id: Some(id),
            fields,
            generation: None,
            ..secret.clone()
        };
        inner.secrets.insert(id, stored.clone());
        Ok(inner.present(&stored))
    }

    fn delete(&self, id: u64) -> StoreResult<()> {
        self.lock()
            .secrets
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::SecretNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GenerationIntent, TemplateField};

    fn template() -> TemplateDefinition {
        TemplateDefinition {
            id: 6003,
            name: "Password".into(),
            password_length: 20,
            fields: vec![
                TemplateField {
                    id: 1,
                    name: "Username".into(),
                    slug: "username".into(),
                    ..TemplateField::default()
                },
                TemplateField {
                    id: 2,
                    name: "Password".into(),
                    slug: "password".into(),
                    is_password: true,
                    ..TemplateField::default()
                },
            ],
        }
    }

    fn submitted(fields: &[(&str, &str)]) -> SecretRecord {
        SecretRecord {
            name: "db".into(),
            folder_id: 1,
            site_id: 1,
            template_id: 6003,
            fields: fields
                .iter()
                .map(|(n, v)| Field {
                    name: (*n).into(),
                    value: (*v).into(),
                    ..Field::default()
                })
                .collect(),
            ..SecretRecord::default()
        }
    }

    #[test]
    fn create_assigns_ids_and_template_order() {
        let store = MemoryStore::new();
        store.add_template(template());

        let created = store
            .create(&submitted(&[("Password", "pw"), ("Username", "admin")]))
            .unwrap();

        assert_eq!(created.id, Some(1));
        let names: Vec<_> = created.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Username", "Password"]);
        assert!(created.fields.iter().all(|f| f.item_id > 0));
        assert!(created.fields[1].is_password);
    }

    #[test]
    fn create_rejects_unknown_template() {
        let store = MemoryStore::new();
        let err = store.create(&submitted(&[])).unwrap_err();
        assert!(matches!(err, StoreError::TemplateNotFound(6003)));
    }

    #[test]
    fn update_keeps_item_ids() {
        let store = MemoryStore::new();
        store.add_template(template());
        let created = store.create(&submitted(&[("Username", "a")])).unwrap();

        let mut next = submitted(&[("Username", "b")]);
        next.id = created.id;
        let updated = store.update(&next).unwrap();

        assert_eq!(updated.fields[0].item_id, created.fields[0].item_id);
        assert_eq!(updated.fields[0].value, "b");
    }

    #[test]
    fn generation_failure_injection() {
        let store = MemoryStore::new();
        store.fail_generation_for("Password");
        assert!(matches!(
            store.generate_value("password", &template()),
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.generate_value("username", &template()).unwrap().len(), 20);
    }

    #[test]
    fn generation_intent_is_never_echoed() {
        let store = MemoryStore::new();
        store.add_template(template());
        let mut secret = submitted(&[("Username", "a")]);
        secret.generation = Some(GenerationIntent {
            generate_keys: true,
            generate_passphrase: false,
        });

        let created = store.create(&secret).unwrap();
        assert!(created.generation.is_none());
        assert!(store.read(1).unwrap().generation.is_none());
    }

    #[test]
    fn masked_reads_hide_passwords() {
        let store = MemoryStore::new();
        store.add_template(template());
        store
            .create(&submitted(&[("Username", "a"), ("Password", "pw")]))
            .unwrap();

        store.mask_passwords(true);
        let read = store.read(1).unwrap();
        assert_eq!(read.field_value("Password"), Some(""));
        assert_eq!(read.field_value("Username"), Some("a"));
    }

    #[test]
    fn failing_reads_are_reported() {
        let store = MemoryStore::new();
        store.add_template(template());
        store.create(&submitted(&[])).unwrap();
        store.fail_reads_for(1);
        assert!(matches!(store.read(1), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn generate_value_uses_template_length() {
        let store = MemoryStore::new();
        let value = store.generate_value("password", &template()).unwrap();
        assert_eq!(value.len(), 20);
        assert!(store.generate_value("nope", &template()).is_err());
    }

    #[test]
    fn snapshot_roundtrip_continues_numbering() {
        let store = MemoryStore::new();
        store.add_template(template());
        store.create(&submitted(&[("Username", "a")])).unwrap();

        let restored = MemoryStore::from_snapshot(store.snapshot());
        let second = restored.create(&submitted(&[("Username", "b")])).unwrap();
        assert_eq!(second.id, Some(2));
        assert_eq!(restored.secret_count(), 2);
    }
}
