//! Secret templates: the remote-defined schema a secret's fields must follow.

use serde::{Deserialize, Serialize};

/// Default length for generated passwords when a template does not say.
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

/// A secret template, fetched read-only by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub id: u64,
    #[serde(default)]
    pub name: String,

    /// Length of passwords the generation facility produces for this template.
    #[serde(default = "default_password_length")]
    pub password_length: usize,

    /// Template fields in declaration order.
    #[serde(default)]
    pub fields: Vec<TemplateField>,
}

fn default_password_length() -> usize {
    DEFAULT_PASSWORD_LENGTH
}

/// One field definition inside a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateField {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub is_password: bool,
    #[serde(default)]
    pub is_file: bool,
    #[serde(default)]
    pub is_notes: bool,
    #[serde(default)]
    pub description: String,
}

impl TemplateDefinition {
    /// Find a template field by slug (case-insensitive).
    pub fn field_by_slug(&self, slug: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.slug.eq_ignore_ascii_case(slug))
    }

    /// A human-readable list of the template's fields, for error messages.
    pub fn describe_fields(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{} (slug: {}, id: {})", f.name, f.slug, f.id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
