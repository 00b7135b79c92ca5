//! Post-round-trip field reconciliation.
//!
//! The remote store owns field content (ids, generated values, canonical
//! attributes) but not field order, and it does not reliably return
//! attachment identity.  `merge` rebuilds the field sequence in the
//! declared order from remote content, then patches attachment identity
//! back in from what we already knew.
//!
//! Pure: no I/O, no remote calls.  Anomalies are logged, never raised.

use std::collections::{HashMap, HashSet};

use tracing::{trace, warn};

use crate::model::{AttachmentRef, Field};

/// Merge the remote field set against the desired one.
///
/// - `desired`: bound fields in declared order (authoritative for order)
/// - `remote`: fields as the store returned them (authoritative for content)
/// - `prior`: previously known fields (authoritative for attachment identity)
/// - `intent_active`: whether a generation intent applies, which widens
///   attachment preservation to fields that look like key material
pub fn merge(desired: &[Field], remote: &[Field], prior: &[Field], intent_active: bool) -> Vec<Field> {
    let mut by_name: HashMap<String, &Field> = HashMap::with_capacity(remote.len());
    for field in remote {
        by_name.entry(field.name.to_lowercase()).or_insert(field);
    }

    let mut merged = Vec::with_capacity(remote.len());
    let mut emitted = HashSet::with_capacity(remote.len());

    for wanted in desired {
        let key = wanted.name.to_lowercase();
        let Some(found) = by_name.get(&key).copied() else {
            warn!(field = %wanted.name, "declared field missing from remote response; dropping");
            continue;
        };
        if !emitted.insert(key) {
            warn!(field = %wanted.name, "field declared more than once; keeping first");
            continue;
        }
        trace!(field = %wanted.name, "matched remote field");
        merged.push(found.clone());
    }

    for field in remote {
        if emitted.insert(field.name.to_lowercase()) {
            warn!(field = %field.name, "remote field was not declared; appending");
            merged.push(field.clone());
        }
    }

    for field in &mut merged {
        let carries_attachment =
            field.is_file || (intent_active && field.looks_like_key_material());
        if !carries_attachment {
            continue;
        }
        if let Some(known) = known_attachment(&field.name, prior, desired) {
            trace!(field = %field.name, filename = %known.filename, "restored attachment identity");
            field.attachment = Some(known);
        }
    }

    merged
}

/// Attachment identity we already knew for `name`: prior state first,
/// then the desired declaration.
fn known_attachment(name: &str, prior: &[Field], desired: &[Field]) -> Option<AttachmentRef> {
    let lookup = |fields: &[Field]| {
        fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .and_then(|f| f.attachment.clone())
    };
    lookup(prior).or_else(|| lookup(desired))
}
