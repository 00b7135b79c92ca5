//! Secret records as the remote store returns them and as the host
//! persists them between operations.
//!
//! The same `SecretRecord` type serves as the submitted payload, the
//! remote response, and the durable record.  `id` is `None` until the
//! first successful create and never changes afterwards.

use serde::{Deserialize, Serialize};

/// A secret stored in the remote store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Identifier assigned by the remote store on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub name: String,
    pub folder_id: u64,
    pub site_id: u64,
    pub template_id: u64,

    /// Ordered field set.
    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default)]
    pub flags: PolicyFlags,

    #[serde(default)]
    pub refs: PolicyRefs,

    /// Create-time generation request.  The remote store never echoes
    /// it, so on a durable record it is carried forward by the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationIntent>,
}

impl SecretRecord {
    /// Look up a field's value by name, then by slug (both case-insensitive).
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }

    /// Look up a field by name, then by slug (both case-insensitive).
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .or_else(|| self.fields.iter().find(|f| f.slug.eq_ignore_ascii_case(name)))
    }

    /// Whether an active generation intent is attached to this record.
    pub fn generation_active(&self) -> bool {
        self.generation.is_some_and(|g| g.is_active())
    }

    /// A short label for logs and error messages.
    pub fn identity(&self) -> String {
        match self.id {
            Some(id) => format!("{id} ({})", self.name),
            None => format!("'{}'", self.name),
        }
    }
}

/// A single field of a secret, bound to a template field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub slug: String,

    /// Template field id (`0` when unknown).
    #[serde(default)]
    pub field_id: u64,

    /// Remote item id for this field on this secret (`0` before create).
    #[serde(default)]
    pub item_id: u64,

    /// Current value.  An empty string is a real value, not "unset".
    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub is_file: bool,
    #[serde(default)]
    pub is_notes: bool,
    #[serde(default)]
    pub is_password: bool,

    /// Attachment identity, only meaningful for file-bearing fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,

    #[serde(default)]
    pub description: String,
}

impl Field {
    /// Whether this field's name suggests SSH key material.
    ///
    /// Used only when a generation intent is active.  Name-based, so a
    /// field called "monkey" matches too.
    pub fn looks_like_key_material(&self) -> bool {
        let lower = self.name.to_ascii_lowercase();
        lower.contains("key") || lower.contains("passphrase")
    }
}

/// Identity of a file attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    #[serde(default)]
    pub attachment_id: u64,
    #[serde(default)]
    pub filename: String,
}

/// Boolean policy switches on a secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFlags {
    pub active: bool,
    pub checked_out: bool,
    pub checkout_enabled: bool,
    pub checkout_change_password_enabled: bool,
    pub auto_change_enabled: bool,
    pub delay_indexing: bool,
    pub inherit_permissions: bool,
    pub inherit_policy: bool,
    pub proxy_enabled: bool,
    pub requires_comment: bool,
    pub session_recording: bool,
    pub incognito_launcher: bool,
}

/// Optional numeric references to other remote objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyRefs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_policy_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_script_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_as_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_interval_minutes: Option<u64>,
}

impl PolicyRefs {
    /// Take each reference from `self` when set, otherwise from `base`.
    pub fn or(self, base: PolicyRefs) -> PolicyRefs {
        PolicyRefs {
            secret_policy_id: self.secret_policy_id.or(base.secret_policy_id),
            web_script_id: self.web_script_id.or(base.web_script_id),
            connect_as_id: self.connect_as_id.or(base.connect_as_id),
            checkout_interval_minutes: self
                .checkout_interval_minutes
                .or(base.checkout_interval_minutes),
        }
    }
}

/// Request that the remote store generate key material on create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationIntent {
    pub generate_passphrase: bool,
    pub generate_keys: bool,
}

impl GenerationIntent {
    pub fn is_active(&self) -> bool {
        self.generate_passphrase || self.generate_keys
    }
}
