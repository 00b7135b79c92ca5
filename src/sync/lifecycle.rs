//! Lifecycle operations: create, read, update, delete and import.
//!
//! Each operation runs sequentially against the remote store:
//!
//! 1. coerce placement identifiers and bind every declared field
//!    (binding and coercion failures abort before anything is written)
//! 2. resolve each field's value, generating where the policy says so
//! 3. submit, then read the secret back
//! 4. reconcile the read-back against the declaration and prior state
//!
//! The returned `SecretRecord` is the durable record the host persists.

use tracing::{debug, info};

use super::binder::bind;
use super::reconcile::merge;
use super::resolve::{decide, generation_eligible, Phase, ResolveInput, ValueSource};
use crate::declaration::{DesiredSecret, Placement};
use crate::errors::{Result, SyncError};
use crate::model::{Field, GenerationIntent, SecretRecord, TemplateDefinition};
use crate::store::{RemoteStore, StoreError};

/// Drives lifecycle operations against a shared remote store handle.
pub struct SecretSync<'s, S: RemoteStore + ?Sized> {
    store: &'s S,
}

/// A declaration after binding and value resolution.
struct Prepared {
    placement: Placement,
    /// Fields to submit, in declared order, with canonical attributes.
    fields: Vec<Field>,
    /// The declared value for each entry of `fields`.
    declared: Vec<Option<String>>,
}

impl Prepared {
    /// The submitted field called `name` and its declared value.
    fn submitted(&self, name: &str) -> Option<(&Field, Option<&str>)> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
            .map(|i| (&self.fields[i], self.declared[i].as_deref()))
    }
}

impl<'s, S: RemoteStore + ?Sized> SecretSync<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Lifecycle operations
    // ------------------------------------------------------------------

    /// Create the declared secret and return its first durable record.
    pub fn create(&self, desired: &DesiredSecret) -> Result<SecretRecord> {
        info!(key = %desired.key, name = %desired.name, "creating secret");

        let prepared = self.prepare(desired, Phase::Create, None)?;
        let submitted = SecretRecord {
            id: None,
            name: desired.name.clone(),
            folder_id: prepared.placement.folder_id,
            site_id: prepared.placement.site_id,
            template_id: prepared.placement.template_id,
            fields: prepared.fields.clone(),
            flags: desired.flags.apply_to(Default::default()),
            refs: desired.refs,
            generation: desired.generation,
        };

        let created = self
            .store
            .create(&submitted)
            .map_err(|e| SyncError::store("create", submitted.identity(), e))?;
        let id = created.id.ok_or_else(|| {
            SyncError::store(
                "create",
                submitted.identity(),
                StoreError::Rejected("store did not assign an id".into()),
            )
        })?;
        info!(id, name = %created.name, "secret created");

        let remote = self.read_remote(id)?;
        let record = self.finish(
            remote,
            &prepared,
            &submitted.fields,
            desired.generation,
            Phase::Create,
        );
        debug!(id, fields = record.fields.len(), "create reconciled");
        Ok(record)
    }

    /// Refresh a durable record from the remote store.
    pub fn read(&self, prior: &SecretRecord) -> Result<SecretRecord> {
        let id = prior
            .id
            .ok_or_else(|| SyncError::NoDurableRecord(prior.name.clone()))?;
        debug!(id, name = %prior.name, "reading secret");

        let remote = self.read_remote(id)?;
        let intent_active = prior.generation_active();
        let mut fields = merge(&prior.fields, &remote.fields, &prior.fields, intent_active);
        settle(&mut fields, None, &prior.fields, Phase::Read);

        Ok(SecretRecord {
            fields,
            generation: prior.generation,
            ..remote
        })
    }

    /// Push a changed declaration over an existing durable record.
    pub fn update(&self, desired: &DesiredSecret, prior: &SecretRecord) -> Result<SecretRecord> {
        let id = prior
            .id
            .ok_or_else(|| SyncError::NoDurableRecord(desired.key.clone()))?;
        info!(id, key = %desired.key, name = %desired.name, "updating secret");

        let prepared = self.prepare(desired, Phase::Update, Some(prior))?;
        let submitted = SecretRecord {
            id: Some(id),
            name: desired.name.clone(),
            folder_id: prepared.placement.folder_id,
            site_id: prepared.placement.site_id,
            template_id: prepared.placement.template_id,
            fields: prepared.fields.clone(),
            flags: desired.flags.apply_to(prior.flags),
            refs: desired.refs.or(prior.refs),
            // Generation is create-only; the store cannot regenerate keys.
            generation: None,
        };

        self.store
            .update(&submitted)
            .map_err(|e| SyncError::store("update", submitted.identity(), e))?;
        info!(id, "secret updated");

        let remote = self.read_remote(id)?;
        let generation = desired.generation.or(prior.generation);
        let record = self.finish(remote, &prepared, &prior.fields, generation, Phase::Update);
        debug!(id, fields = record.fields.len(), "update reconciled");
        Ok(record)
    }

    /// Delete a secret by id.
    pub fn delete(&self, id: u64) -> Result<()> {
        info!(id, "deleting secret");
        self.store
            .delete(id)
            .map_err(|e| SyncError::store("delete", id, e))
    }

    /// Adopt an existing remote secret that has no durable record yet.
    pub fn import(&self, id: u64) -> Result<SecretRecord> {
        info!(id, "importing secret");
        let remote = self.read_remote(id)?;
        let mut fields = merge(&remote.fields, &remote.fields, &[], false);
        settle(&mut fields, None, &[], Phase::Import);
        Ok(SecretRecord {
            fields,
            generation: None,
            ..remote
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn read_remote(&self, id: u64) -> Result<SecretRecord> {
        self.store
            .read(id)
            .map_err(|e| SyncError::store("read", id, e))
    }

    fn fetch_template(&self, template_id: u64) -> Result<TemplateDefinition> {
        self.store
            .fetch_template(template_id)
            .map_err(|e| SyncError::store("fetch template", format!("template {template_id}"), e))
    }

    /// Coerce, bind and resolve every declared field.
    fn prepare(
        &self,
        desired: &DesiredSecret,
        phase: Phase,
        prior: Option<&SecretRecord>,
    ) -> Result<Prepared> {
        let placement = desired.placement()?;
        let template = self.fetch_template(placement.template_id)?;

        // Bind everything before generating anything.
        let bound = desired
            .fields
            .iter()
            .map(|df| bind(df, &template).map(|tf| (df, tf)))
            .collect::<Result<Vec<_>>>()?;

        let intent_active = match phase {
            Phase::Create => desired.generation_active(),
            _ => desired.generation_active() || prior.is_some_and(|p| p.generation_active()),
        };

        let mut fields = Vec::with_capacity(bound.len());
        let mut declared = Vec::with_capacity(bound.len());

        for (df, tf) in bound {
            let prior_field = prior.and_then(|p| p.field(&tf.name));
            let input = ResolveInput {
                declared: df.value.as_deref(),
                prior: prior_field.map(|f| f.value.as_str()),
                phase,
                generation_eligible: generation_eligible(tf, intent_active),
            };
            let source = decide(&input);
            debug!(field = %tf.name, ?source, "resolved value source");

            let value = match source.value(&input) {
                Some(value) => value,
                None => self.generate(&df.name, &tf.slug, &template)?,
            };

            let attachment = if tf.is_file {
                df.attachment
                    .clone()
                    .or_else(|| prior_field.and_then(|f| f.attachment.clone()))
            } else {
                None
            };

            fields.push(Field {
                name: tf.name.clone(),
                slug: tf.slug.clone(),
                field_id: tf.id,
                item_id: prior_field.map_or(0, |f| f.item_id),
                value,
                is_file: tf.is_file,
                is_notes: tf.is_notes,
                is_password: tf.is_password,
                attachment,
                description: tf.description.clone(),
            });
            declared.push(df.value.clone());
        }

        Ok(Prepared {
            placement,
            fields,
            declared,
        })
    }

    fn generate(&self, field: &str, slug: &str, template: &TemplateDefinition) -> Result<String> {
        let value = self
            .store
            .generate_value(slug, template)
            .map_err(|source| SyncError::GenerationFailed {
                field: field.to_string(),
                source,
            })?;
        debug!(field, "generated value");
        Ok(value)
    }

    /// Reconcile a read-back into the durable record.
    fn finish(
        &self,
        remote: SecretRecord,
        prepared: &Prepared,
        prior_fields: &[Field],
        generation: Option<GenerationIntent>,
        phase: Phase,
    ) -> SecretRecord {
        let intent_active = generation.is_some_and(|g| g.is_active());
        let mut fields = merge(&prepared.fields, &remote.fields, prior_fields, intent_active);
        settle(&mut fields, Some(prepared), prior_fields, phase);
        SecretRecord {
            fields,
            generation,
            ..remote
        }
    }
}

/// Keep known values for fields the store returned empty.
///
/// Remote stores may write-protect values and never echo them back;
/// without this every refresh would drift the value to empty.  A field we
/// just submitted is known by what we submitted, whatever its source;
/// only a declared `""` lets the empty read-back stand.  Anything else
/// falls back to `prior`.
fn settle(fields: &mut [Field], prepared: Option<&Prepared>, prior: &[Field], phase: Phase) {
    let phase = match phase {
        // What we submitted on create is now the known value.
        Phase::Create => Phase::Read,
        other => other,
    };

    for field in fields.iter_mut().filter(|f| f.value.is_empty()) {
        let known = match prepared.and_then(|p| p.submitted(&field.name)) {
            Some((_, Some(""))) => continue,
            Some((submitted, _)) => Some(submitted.value.as_str()),
            None => prior
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(&field.name))
                .map(|p| p.value.as_str()),
        };
        let input = ResolveInput {
            declared: None,
            prior: known,
            phase,
            generation_eligible: false,
        };
        if decide(&input) == ValueSource::Preserve {
            if let Some(value) = ValueSource::Preserve.value(&input) {
                debug!(field = %field.name, "remote returned empty value; keeping known value");
                field.value = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::DesiredField;
    use crate::model::TemplateField;
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_template(TemplateDefinition {
            id: 6003,
            name: "Login".into(),
            password_length: 24,
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
                TemplateField {
                    id: 3,
                    name: "Notes".into(),
                    slug: "notes".into(),
                    is_notes: true,
                    ..TemplateField::default()
                },
            ],
        });
        store
    }

    fn desired(fields: Vec<DesiredField>) -> DesiredSecret {
        DesiredSecret {
            key: "db".into(),
            name: "db-admin".into(),
            folder_id: "12".into(),
            site_id: "1".into(),
            template_id: "6003".into(),
            fields,
            ..DesiredSecret::default()
        }
    }

    #[test]
    fn create_generates_missing_password() {
        let store = store();
        let sync = SecretSync::new(&store);
        let record = sync
            .create(&desired(vec![
                DesiredField::named("username", Some("admin")),
                DesiredField::named("password", None),
            ]))
            .unwrap();

        assert_eq!(record.id, Some(1));
        let pw = record.field_value("Password").unwrap();
        assert_eq!(pw.len(), 24);
        assert_eq!(store.read(1).unwrap().field_value("password"), Some(pw));
    }

    #[test]
    fn create_uses_canonical_names_in_declared_order() {
        let store = store();
        let record = SecretSync::new(&store)
            .create(&desired(vec![
                DesiredField::named("NOTES", Some("n")),
                DesiredField::named("username", Some("u")),
            ]))
            .unwrap();
        let names: Vec<_> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Notes", "Username"]);
    }

    #[test]
    fn explicit_empty_password_is_not_generated() {
        let store = store();
        let record = SecretSync::new(&store)
            .create(&desired(vec![DesiredField::named("password", Some(""))]))
            .unwrap();
        assert_eq!(record.field_value("Password"), Some(""));
    }

    #[test]
    fn binding_error_aborts_before_create() {
        let store = store();
        let err = SecretSync::new(&store)
            .create(&desired(vec![
                DesiredField::named("password", None),
                DesiredField::named("hostname", Some("x")),
            ]))
            .unwrap_err();
        assert!(matches!(err, SyncError::FieldNotInTemplate { .. }));
        assert_eq!(store.secret_count(), 0);
    }

    #[test]
    fn coercion_error_names_attribute() {
        let store = store();
        let mut d = desired(vec![]);
        d.site_id = "one".into();
        let err = SecretSync::new(&store).create(&d).unwrap_err();
        assert_eq!(err.to_string(), "invalid site_id: 'one' is not a non-negative integer");
    }

    #[test]
    fn update_preserves_unset_password_and_carries_intent() {
        let store = store();
        let sync = SecretSync::new(&store);
        let mut d = desired(vec![DesiredField::named("password", None)]);
        d.generation = Some(GenerationIntent {
            generate_keys: true,
            generate_passphrase: false,
        });
        let created = sync.create(&d).unwrap();
        let generated = created.field_value("Password").unwrap().to_string();
        assert!(created.generation.is_some());

        d.generation = None;
        let updated = sync.update(&d, &created).unwrap();
        assert_eq!(updated.field_value("Password"), Some(generated.as_str()));
        assert_eq!(updated.generation, created.generation);
    }

    #[test]
    fn masked_password_survives_create_and_read() {
        let store = store();
        store.mask_passwords(true);
        let sync = SecretSync::new(&store);
        let created = sync
            .create(&desired(vec![DesiredField::named("password", None)]))
            .unwrap();
        let generated = created.field_value("Password").unwrap().to_string();
        assert!(!generated.is_empty());

        let refreshed = sync.read(&created).unwrap();
        assert_eq!(refreshed.field_value("Password"), Some(generated.as_str()));
    }

    #[test]
    fn masked_explicit_password_is_recorded() {
        let store = store();
        store.mask_passwords(true);
        let created = SecretSync::new(&store)
            .create(&desired(vec![DesiredField::named("password", Some("chosen"))]))
            .unwrap();
        assert_eq!(created.field_value("Password"), Some("chosen"));
    }

    #[test]
    fn masked_cleared_password_stays_empty() {
        let store = store();
        store.mask_passwords(true);
        let sync = SecretSync::new(&store);
        let created = sync
            .create(&desired(vec![DesiredField::named("password", Some("chosen"))]))
            .unwrap();
        let cleared = sync
            .update(&desired(vec![DesiredField::named("password", Some(""))]), &created)
            .unwrap();
        assert_eq!(cleared.field_value("Password"), Some(""));
    }

    #[test]
    fn read_picks_up_remote_changes() {
        let store = store();
        let sync = SecretSync::new(&store);
        let created = sync
            .create(&desired(vec![DesiredField::named("username", Some("a"))]))
            .unwrap();
        store.set_field_value(1, "Username", "b").unwrap();
        assert_eq!(sync.read(&created).unwrap().field_value("Username"), Some("b"));
    }

    #[test]
    fn import_adopts_remote_secret() {
        let store = store();
        SecretSync::new(&store)
            .create(&desired(vec![DesiredField::named("username", Some("a"))]))
            .unwrap();
        let imported = SecretSync::new(&store).import(1).unwrap();
        assert_eq!(imported.id, Some(1));
        assert_eq!(imported.generation, None);
        assert_eq!(imported.field_value("username"), Some("a"));
    }

    #[test]
    fn delete_missing_secret_names_operation() {
        let store = store();
        let err = SecretSync::new(&store).delete(9).unwrap_err();
        assert!(err.to_string().starts_with("delete failed for secret 9"));
    }

    #[test]
    fn read_without_id_is_an_error() {
        let store = store();
        let err = SecretSync::new(&store)
            .read(&SecretRecord::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::NoDurableRecord(_)));
    }
}
