//! Desired secret declarations and their identifier coercion.
//!
//! A declaration keeps the caller's intent exactly as written: a field
//! with no `value` key is *unset*, which is not the same thing as a
//! field with `value = ""`.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};
use crate::model::{AttachmentRef, GenerationIntent, PolicyFlags, PolicyRefs};

/// The caller-specified target shape of one secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredSecret {
    /// Local instance name; the durable record is stored under it.
    pub key: String,

    pub name: String,

    /// Placement identifiers.  Declared as strings and coerced before
    /// any remote call.
    pub folder_id: String,
    pub site_id: String,
    pub template_id: String,

    #[serde(default)]
    pub fields: Vec<DesiredField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationIntent>,

    #[serde(default)]
    pub flags: DesiredFlags,

    #[serde(default)]
    pub refs: PolicyRefs,
}

/// One declared field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredField {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Template field id; `None` or `0` means "bind by name or slug".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<u64>,

    /// `None` = unset, `Some("")` = explicitly empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
}

impl DesiredField {
    /// A field bound by name with the given declared value.
    pub fn named(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            value: value.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Policy switches as declared.  Unset switches keep whatever the
/// prior durable record holds (or `false` on create).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredFlags {
    pub active: Option<bool>,
    pub checked_out: Option<bool>,
    pub checkout_enabled: Option<bool>,
    pub checkout_change_password_enabled: Option<bool>,
    pub auto_change_enabled: Option<bool>,
    pub delay_indexing: Option<bool>,
    pub inherit_permissions: Option<bool>,
    pub inherit_policy: Option<bool>,
    pub proxy_enabled: Option<bool>,
    pub requires_comment: Option<bool>,
    pub session_recording: Option<bool>,
    pub incognito_launcher: Option<bool>,
}

impl DesiredFlags {
    /// Overlay the declared switches on top of `base`.
    pub fn apply_to(&self, base: PolicyFlags) -> PolicyFlags {
        PolicyFlags {
            active: self.active.unwrap_or(base.active),
            checked_out: self.checked_out.unwrap_or(base.checked_out),
            checkout_enabled: self.checkout_enabled.unwrap_or(base.checkout_enabled),
            checkout_change_password_enabled: self
                .checkout_change_password_enabled
                .unwrap_or(base.checkout_change_password_enabled),
            auto_change_enabled: self.auto_change_enabled.unwrap_or(base.auto_change_enabled),
            delay_indexing: self.delay_indexing.unwrap_or(base.delay_indexing),
            inherit_permissions: self.inherit_permissions.unwrap_or(base.inherit_permissions),
            inherit_policy: self.inherit_policy.unwrap_or(base.inherit_policy),
            proxy_enabled: self.proxy_enabled.unwrap_or(base.proxy_enabled),
            requires_comment: self.requires_comment.unwrap_or(base.requires_comment),
            session_recording: self.session_recording.unwrap_or(base.session_recording),
            incognito_launcher: self.incognito_launcher.unwrap_or(base.incognito_launcher),
        }
    }
}

/// Placement identifiers after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub folder_id: u64,
    pub site_id: u64,
    pub template_id: u64,
}

impl DesiredSecret {
    /// Coerce the three placement identifiers, naming the first bad one.
    pub fn placement(&self) -> Result<Placement> {
        Ok(Placement {
            folder_id: parse_identifier("folder_id", &self.folder_id)?,
            site_id: parse_identifier("site_id", &self.site_id)?,
            template_id: parse_identifier("template_id", &self.template_id)?,
        })
    }

    /// Whether the declaration asks for create-time key generation.
    pub fn generation_active(&self) -> bool {
        self.generation.is_some_and(|g| g.is_active())
    }
}

/// Parse a supposedly-numeric identifier as a non-negative integer.
///
/// Surrounding whitespace is tolerated; signs and fractions are not.
pub fn parse_identifier(attribute: &'static str, raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SyncError::InvalidIdentifier {
            attribute,
            value: raw.to_string(),
        });
    }
    trimmed.parse::<u64>().map_err(|_| SyncError::InvalidIdentifier {
        attribute,
        value: raw.to_string(),
    })
}
