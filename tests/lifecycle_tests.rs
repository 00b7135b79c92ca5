//! Lifecycle integration tests: create → update → read → delete against
//! an in-memory store, including write-protected values and key
//! generation carried on the durable record.

mod common;

use common::{login, store, SSH_TEMPLATE};
use secretsync::declaration::{DesiredField, DesiredSecret};
use secretsync::errors::SyncError;
use secretsync::model::{AttachmentRef, GenerationIntent};
use secretsync::store::{RemoteStore, StoreError};
use secretsync::sync::SecretSync;

// ---------------------------------------------------------------------------
// Generate, then Preserve
// ---------------------------------------------------------------------------

#[test]
fn generated_password_is_recorded_then_preserved_on_update() {
    let store = store();
    let sync = SecretSync::new(&store);

    let mut desired = login("db", vec![DesiredField::named("Password", None)]);
    desired.generation = Some(GenerationIntent::default());
    let created = sync.create(&desired).unwrap();

    let generated = created.field_value("Password").unwrap().to_string();
    assert_eq!(generated.len(), 20);
    assert_eq!(
        store.read(created.id.unwrap()).unwrap().field_value("Password"),
        Some(generated.as_str())
    );

    let updated = sync.update(&desired, &created).unwrap();
    assert_eq!(updated.field_value("Password"), Some(generated.as_str()));
    assert_eq!(updated.id, created.id);
}

#[test]
fn explicit_empty_clears_on_update() {
    let store = store();
    let sync = SecretSync::new(&store);

    let created = sync
        .create(&login("db", vec![DesiredField::named("Password", Some("secret1"))]))
        .unwrap();
    let cleared = sync
        .update(
            &login("db", vec![DesiredField::named("Password", Some(""))]),
            &created,
        )
        .unwrap();

    assert_eq!(cleared.field_value("Password"), Some(""));
}

#[test]
fn explicit_value_replaces_generated_one() {
    let store = store();
    let sync = SecretSync::new(&store);

    let created = sync
        .create(&login("db", vec![DesiredField::named("Password", None)]))
        .unwrap();
    let updated = sync
        .update(
            &login("db", vec![DesiredField::named("Password", Some("chosen"))]),
            &created,
        )
        .unwrap();
    assert_eq!(updated.field_value("Password"), Some("chosen"));
}

#[test]
fn write_protected_value_survives_every_phase() {
    let store = store();
    store.mask_passwords(true);
    let sync = SecretSync::new(&store);

    let desired = login("db", vec![DesiredField::named("Password", None)]);
    let created = sync.create(&desired).unwrap();
    let generated = created.field_value("Password").unwrap().to_string();
    assert!(!generated.is_empty());

    let read = sync.read(&created).unwrap();
    assert_eq!(read.field_value("Password"), Some(generated.as_str()));

    let updated = sync.update(&desired, &read).unwrap();
    assert_eq!(updated.field_value("Password"), Some(generated.as_str()));
}

#[test]
fn write_protected_explicit_value_survives_unset_update() {
    let store = store();
    store.mask_passwords(true);
    let sync = SecretSync::new(&store);

    let created = sync
        .create(&login("db", vec![DesiredField::named("Password", Some("chosen"))]))
        .unwrap();
    assert_eq!(created.field_value("Password"), Some("chosen"));

    // Stop declaring the value: leave it alone.
    let updated = sync
        .update(&login("db", vec![DesiredField::named("Password", None)]), &created)
        .unwrap();
    assert_eq!(updated.field_value("Password"), Some("chosen"));

    store.mask_passwords(false);
    assert_eq!(
        store.read(created.id.unwrap()).unwrap().field_value("Password"),
        Some("chosen")
    );
}

#[test]
fn write_protected_explicit_update_is_recorded() {
    let store = store();
    store.mask_passwords(true);
    let sync = SecretSync::new(&store);

    let created = sync
        .create(&login("db", vec![DesiredField::named("Password", Some("first"))]))
        .unwrap();
    let updated = sync
        .update(
            &login("db", vec![DesiredField::named("Password", Some("second"))]),
            &created,
        )
        .unwrap();
    assert_eq!(updated.field_value("Password"), Some("second"));
    assert_eq!(sync.read(&updated).unwrap().field_value("Password"), Some("second"));
}

#[test]
fn generation_failure_aborts_create_without_writing() {
    let store = store();
    store.fail_generation_for("password");

    let err = SecretSync::new(&store)
        .create(&login(
            "db",
            vec![
                DesiredField::named("Username", Some("admin")),
                DesiredField::named("Password", None),
            ],
        ))
        .unwrap_err();

    match &err {
        SyncError::GenerationFailed { field, .. } => assert_eq!(field, "Password"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("'Password'"));
    assert_eq!(store.secret_count(), 0);
}

#[test]
fn generation_failure_is_not_hit_for_explicit_values() {
    let store = store();
    store.fail_generation_for("password");

    let created = SecretSync::new(&store)
        .create(&login("db", vec![DesiredField::named("Password", Some("chosen"))]))
        .unwrap();
    assert_eq!(created.field_value("Password"), Some("chosen"));
}

// ---------------------------------------------------------------------------
// Field order and binding
// ---------------------------------------------------------------------------

#[test]
fn declared_order_survives_store_reordering() {
    let store = store();
    let sync = SecretSync::new(&store);

    let created = sync
        .create(&login(
            "db",
            vec![
                DesiredField::named("notes", Some("n")),
                DesiredField::named("password", Some("p")),
                DesiredField::named("username", Some("u")),
            ],
        ))
        .unwrap();

    let stored = store.read(created.id.unwrap()).unwrap();
    let remote: Vec<_> = stored.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(remote, vec!["Username", "Password", "Notes"]);

    let ours: Vec<_> = created.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(ours, vec!["Notes", "Password", "Username"]);

    let refreshed = sync.read(&created).unwrap();
    assert_eq!(refreshed.fields, created.fields);
}

#[test]
fn fields_bind_by_slug_and_field_id() {
    let store = store();
    let created = SecretSync::new(&store)
        .create(&login(
            "db",
            vec![
                DesiredField {
                    name: "login".into(),
                    slug: Some("username".into()),
                    value: Some("admin".into()),
                    ..DesiredField::default()
                },
                DesiredField {
                    name: "whatever".into(),
                    field_id: Some(3),
                    value: Some("note".into()),
                    ..DesiredField::default()
                },
            ],
        ))
        .unwrap();

    assert_eq!(created.field_value("Username"), Some("admin"));
    assert_eq!(created.field_value("Notes"), Some("note"));
}

#[test]
fn unknown_field_aborts_before_any_write() {
    let store = store();
    let err = SecretSync::new(&store)
        .create(&login(
            "db",
            vec![
                DesiredField::named("Password", None),
                DesiredField::named("Hostname", Some("db.internal")),
            ],
        ))
        .unwrap_err();

    assert!(err.to_string().contains("Hostname"));
    assert!(err.to_string().contains("Username (slug: username, id: 1)"));
    assert_eq!(store.secret_count(), 0);
}

#[test]
fn bad_placement_identifier_is_rejected_before_fetch() {
    let store = store();
    let mut desired = login("db", vec![]);
    desired.template_id = "60O3".into();

    match SecretSync::new(&store).create(&desired).unwrap_err() {
        SyncError::InvalidIdentifier { attribute, value } => {
            assert_eq!(attribute, "template_id");
            assert_eq!(value, "60O3");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Key generation and attachments
// ---------------------------------------------------------------------------

fn ssh(generation: Option<GenerationIntent>) -> DesiredSecret {
    DesiredSecret {
        key: "bastion".into(),
        name: "bastion-ssh".into(),
        folder_id: "3".into(),
        site_id: "1".into(),
        template_id: SSH_TEMPLATE.to_string(),
        fields: vec![
            DesiredField::named("Machine", Some("bastion.internal")),
            DesiredField::named("Private Key", None),
            DesiredField::named("Private Key Passphrase", None),
        ],
        generation,
        ..DesiredSecret::default()
    }
}

#[test]
fn generation_intent_fills_key_fields_and_is_carried() {
    let store = store();
    let sync = SecretSync::new(&store);
    let intent = GenerationIntent {
        generate_keys: true,
        generate_passphrase: true,
    };

    let created = sync.create(&ssh(Some(intent))).unwrap();
    assert!(!created.field_value("Private Key").unwrap().is_empty());
    assert!(!created.field_value("Private Key Passphrase").unwrap().is_empty());
    assert_eq!(created.generation, Some(intent));

    // The store never echoes the intent; the durable record keeps it.
    assert!(store.read(created.id.unwrap()).unwrap().generation.is_none());
    assert_eq!(sync.read(&created).unwrap().generation, Some(intent));

    let updated = sync.update(&ssh(None), &created).unwrap();
    assert_eq!(updated.generation, Some(intent));
}

#[test]
fn without_intent_key_fields_stay_empty() {
    let store = store();
    let created = SecretSync::new(&store).create(&ssh(None)).unwrap();
    assert_eq!(created.field_value("Private Key"), Some(""));
    assert_eq!(created.generation, None);
}

#[test]
fn attachment_identity_is_restored_from_prior() {
    let store = store();
    let sync = SecretSync::new(&store);
    let attachment = AttachmentRef {
        attachment_id: 88,
        filename: "id_ed25519".into(),
    };

    let mut desired = ssh(None);
    desired.fields[1].attachment = Some(attachment.clone());
    let created = sync.create(&desired).unwrap();
    assert_eq!(
        created.field("Private Key").unwrap().attachment,
        Some(attachment.clone())
    );

    // Drop the attachment from the declaration; the prior record still knows it.
    let updated = sync.update(&ssh(None), &created).unwrap();
    assert_eq!(
        updated.field("Private Key").unwrap().attachment,
        Some(attachment)
    );
}

// ---------------------------------------------------------------------------
// Import and delete
// ---------------------------------------------------------------------------

#[test]
fn import_then_update_preserves_unknown_values() {
    let store = store();
    let sync = SecretSync::new(&store);
    let original = sync
        .create(&login(
            "db",
            vec![
                DesiredField::named("Username", Some("admin")),
                DesiredField::named("Password", Some("hunter2")),
            ],
        ))
        .unwrap();

    let imported = sync.import(original.id.unwrap()).unwrap();
    assert_eq!(imported.field_value("Password"), Some("hunter2"));

    let updated = sync
        .update(
            &login(
                "db",
                vec![
                    DesiredField::named("Username", Some("root")),
                    DesiredField::named("Password", None),
                ],
            ),
            &imported,
        )
        .unwrap();
    assert_eq!(updated.field_value("Username"), Some("root"));
    assert_eq!(updated.field_value("Password"), Some("hunter2"));
}

#[test]
fn delete_removes_remote_secret() {
    let store = store();
    let sync = SecretSync::new(&store);
    let created = sync
        .create(&login("db", vec![DesiredField::named("Username", Some("a"))]))
        .unwrap();

    sync.delete(created.id.unwrap()).unwrap();
    assert_eq!(store.secret_count(), 0);

    match sync.read(&created).unwrap_err() {
        SyncError::Store { operation, source, .. } => {
            assert_eq!(operation, "read");
            assert!(matches!(source, StoreError::SecretNotFound(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn template_change_is_rejected_by_store() {
    let store = store();
    let sync = SecretSync::new(&store);
    let created = sync
        .create(&login("db", vec![DesiredField::named("Username", Some("a"))]))
        .unwrap();

    let mut moved = ssh(None);
    moved.key = "db".into();
    let err = sync.update(&moved, &created).unwrap_err();
    assert!(matches!(err, SyncError::Store { operation: "update", .. }));
}
