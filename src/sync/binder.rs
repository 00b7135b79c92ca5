//! Template binding: map a declared field onto exactly one template field.
//!
//! Rules are tried in order and the first that matches wins:
//! 1. non-zero template field id
//! 2. case-insensitive name
//! 3. case-insensitive slug (the declared slug, or the declared name
//!    when no slug is given)
//!
//! Within a rule, the first template field in declaration order wins.

use tracing::{error, trace};

use crate::declaration::DesiredField;
use crate::errors::{Result, SyncError};
use crate::model::{TemplateDefinition, TemplateField};

/// Which rule produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindRule {
    FieldId,
    Name,
    Slug,
}

/// Bind `field` to its template definition.
pub fn bind<'t>(field: &DesiredField, template: &'t TemplateDefinition) -> Result<&'t TemplateField> {
    bind_with_rule(field, template).map(|(tf, _)| tf)
}

/// Bind `field` and report which rule matched.
pub fn bind_with_rule<'t>(
    field: &DesiredField,
    template: &'t TemplateDefinition,
) -> Result<(&'t TemplateField, BindRule)> {
    if let Some(id) = field.field_id.filter(|id| *id != 0) {
        if let Some(tf) = template.fields.iter().find(|tf| tf.id == id) {
            trace!(field = %field.name, template_field_id = tf.id, "bound by field id");
            return Ok((tf, BindRule::FieldId));
        }
    }

    if let Some(tf) = template
        .fields
        .iter()
        .find(|tf| tf.name.eq_ignore_ascii_case(&field.name))
    {
        trace!(field = %field.name, template_field_id = tf.id, "bound by name");
        return Ok((tf, BindRule::Name));
    }

    let slug = field.slug.as_deref().unwrap_or(&field.name);
    if let Some(tf) = template
        .fields
        .iter()
        .find(|tf| tf.slug.eq_ignore_ascii_case(slug))
    {
        trace!(field = %field.name, template_field_id = tf.id, "bound by slug");
        return Ok((tf, BindRule::Slug));
    }

    let available = template.describe_fields();
    error!(field = %field.name, template_id = template.id, %available, "field not found in template");
    Err(SyncError::FieldNotInTemplate {
        field: field.name.clone(),
        template_id: template.id,
        available,
    })
}
