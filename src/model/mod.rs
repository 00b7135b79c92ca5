//! Model module — the shapes exchanged with the remote store.
//!
//! This module provides:
//! - `SecretRecord`, `Field` and the policy bundles (`secret`)
//! - `TemplateDefinition` and `TemplateField` (`template`)

pub mod secret;
pub mod template;

pub use secret::{AttachmentRef, Field, GenerationIntent, PolicyFlags, PolicyRefs, SecretRecord};
pub use template::{TemplateDefinition, TemplateField};
