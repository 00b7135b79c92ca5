//! Shared fixtures for integration tests.

#![allow(dead_code)]

use secretsync::declaration::{DesiredField, DesiredSecret};
use secretsync::model::{TemplateDefinition, TemplateField};
use secretsync::store::MemoryStore;

pub const LOGIN_TEMPLATE: u64 = 6003;
pub const SSH_TEMPLATE: u64 = 6010;

pub fn login_template() -> TemplateDefinition {
    TemplateDefinition {
        id: LOGIN_TEMPLATE,
        name: "Web Password".into(),
        password_length: 20,
        fields: vec![
            template_field(1, "Username", "username"),
            TemplateField {
                is_password: true,
                ..template_field(2, "Password", "password")
            },
            TemplateField {
                is_notes: true,
                ..template_field(3, "Notes", "notes")
            },
        ],
    }
}

pub fn ssh_template() -> TemplateDefinition {
    TemplateDefinition {
        id: SSH_TEMPLATE,
        name: "SSH Key".into(),
        password_length: 16,
        fields: vec![
            template_field(10, "Machine", "machine"),
            template_field(11, "Username", "username"),
            TemplateField {
                is_file: true,
                ..template_field(12, "Private Key", "private-key")
            },
            template_field(13, "Private Key Passphrase", "private-key-passphrase"),
        ],
    }
}

pub fn template_field(id: u64, name: &str, slug: &str) -> TemplateField {
    TemplateField {
        id,
        name: name.into(),
        slug: slug.into(),
        ..TemplateField::default()
    }
}

pub fn store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_template(login_template());
    store.add_template(ssh_template());
    store
}

pub fn login(key: &str, fields: Vec<DesiredField>) -> DesiredSecret {
    DesiredSecret {
        key: key.into(),
        name: format!("{key}-login"),
        folder_id: "12".into(),
        site_id: "1".into(),
        template_id: LOGIN_TEMPLATE.to_string(),
        fields,
        ..DesiredSecret::default()
    }
}
