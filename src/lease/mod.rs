//! Lease module — ephemeral, never-persisted field reads.
//!
//! Provides:
//! - The open/renew/close lifecycle of an ephemeral lease (`LeaseManager`)
//! - The opaque carry-state token handed back between renewals
//! - Persistable field lookups sharing the same batch semantics (`lookup`)
//!
//! A lease only ever carries `{ids, field}` across a renewal.  Values are
//! fetched fresh on every open and renew and are wiped from memory when
//! the lease is dropped.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Result, SyncError};
use crate::model::SecretRecord;
use crate::store::RemoteStore;

/// How long a lease stays valid before the host must renew it.
pub const RENEW_INTERVAL: TimeDelta = TimeDelta::minutes(5);

/// Lifecycle state of a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseStatus {
    Open,
    Closed,
}

/// One leased field value.  Zeroed on drop, never serialized.
pub struct LeasedValue {
    pub id: u64,
    pub value: Zeroizing<String>,
}

impl std::fmt::Debug for LeasedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeasedValue")
            .field("id", &self.id)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// A non-fatal per-secret fetch failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchWarning {
    pub id: u64,
    pub message: String,
}

/// An open (or closed) ephemeral lease.
#[derive(Debug)]
pub struct Lease {
    pub status: LeaseStatus,
    pub field: String,
    pub values: Vec<LeasedValue>,
    pub warnings: Vec<FetchWarning>,
    /// Opaque token to pass to `LeaseManager::renew`.
    pub carry_state: String,
    pub renew_at: DateTime<Utc>,
}

impl Lease {
    /// Value for a given secret id, if it was fetched.
    pub fn value_for(&self, id: u64) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.id == id)
            .map(|v| v.value.as_str())
    }
}

/// The minimal state retained across a renewal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryState {
    #[serde(default)]
    pub ids: Vec<u64>,
    #[serde(default)]
    pub field: String,
}

impl CarryState {
    /// Encode as base64 of the JSON form.
    pub fn encode(&self) -> Result<String> {
        let json =
            serde_json::to_vec(self).map_err(|e| SyncError::SerializationError(e.to_string()))?;
        Ok(BASE64.encode(json))
    }

    /// Decode a token produced by `encode`.  Rejects tokens missing ids or field.
    pub fn decode(token: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(token.trim())
            .map_err(|e| SyncError::InvalidCarryState(format!("not base64: {e}")))?;
        let state: CarryState = serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::InvalidCarryState(format!("not a carry-state: {e}")))?;
        state.validate()?;
        Ok(state)
    }

    fn validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(SyncError::IncompleteLeaseRequest(
                "at least one secret id is required".into(),
            ));
        }
        if self.field.trim().is_empty() {
            return Err(SyncError::IncompleteLeaseRequest(
                "a field name is required".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lease lifecycle
// ---------------------------------------------------------------------------

/// Opens and renews ephemeral leases against a shared store handle.
pub struct LeaseManager<'s, S: RemoteStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: RemoteStore + ?Sized> LeaseManager<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Fetch `field` from every secret in `ids` and open a lease.
    ///
    /// A secret that cannot be fetched becomes a warning.  A fetched
    /// secret without the field fails the whole batch.
    pub fn open(&self, ids: &[u64], field: &str) -> Result<Lease> {
        let carry = CarryState {
            ids: ids.to_vec(),
            field: field.to_string(),
        };
        carry.validate()?;
        info!(count = ids.len(), field, "opening lease");
        self.fetch(carry)
    }

    /// Re-open a lease from its carry-state token.
    pub fn renew(&self, carry_state: Option<&str>) -> Result<Lease> {
        let token = carry_state
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                error!("lease renewal without carry-state");
                SyncError::MissingCarryState
            })?;
        let carry = CarryState::decode(token)?;
        info!(count = carry.ids.len(), field = %carry.field, "renewing lease");
        self.fetch(carry)
    }

    /// Close a lease.  Values are wiped as they drop.
    pub fn close(&self, mut lease: Lease) -> Lease {
        debug!(field = %lease.field, "closing lease");
        lease.values.clear();
        lease.status = LeaseStatus::Closed;
        lease
    }

    fn fetch(&self, carry: CarryState) -> Result<Lease> {
        let (values, warnings) = fetch_batch(self.store, &carry.ids, &carry.field)?;
        Ok(Lease {
            status: LeaseStatus::Open,
            values: values
                .into_iter()
                .map(|(id, value)| LeasedValue {
                    id,
                    value: Zeroizing::new(value),
                })
                .collect(),
            warnings,
            carry_state: carry.encode()?,
            field: carry.field,
            renew_at: Utc::now() + RENEW_INTERVAL,
        })
    }
}

// ---------------------------------------------------------------------------
// Persistable lookups
// ---------------------------------------------------------------------------

/// A looked-up field value, safe to print or persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub id: u64,
    pub value: String,
}

/// Result of a multi-secret lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub field: String,
    pub values: Vec<FieldValue>,
    pub warnings: Vec<FetchWarning>,
}

/// Read `field` from each secret in `ids`, with lease batch semantics.
pub fn lookup<S: RemoteStore + ?Sized>(store: &S, ids: &[u64], field: &str) -> Result<LookupResult> {
    if ids.is_empty() || field.trim().is_empty() {
        return Err(SyncError::IncompleteLeaseRequest(
            "lookup needs at least one secret id and a field name".into(),
        ));
    }
    let (values, warnings) = fetch_batch(store, ids, field)?;
    Ok(LookupResult {
        field: field.to_string(),
        values: values
            .into_iter()
            .map(|(id, value)| FieldValue { id, value })
            .collect(),
        warnings,
    })
}

/// Read `field` from a single secret.  Fetch failures are fatal here.
pub fn lookup_one<S: RemoteStore + ?Sized>(store: &S, id: u64, field: &str) -> Result<String> {
    let secret = store
        .read(id)
        .map_err(|e| SyncError::store("read", id, e))?;
    take_field(store, secret, field).ok_or_else(|| SyncError::FieldNotFound {
        secret_id: id,
        field: field.to_string(),
    })
}

/// Shared fetch-and-extract loop for leases and lookups.
fn fetch_batch<S: RemoteStore + ?Sized>(
    store: &S,
    ids: &[u64],
    field: &str,
) -> Result<(Vec<(u64, String)>, Vec<FetchWarning>)> {
    let mut values = Vec::with_capacity(ids.len());
    let mut warnings = Vec::new();

    for &id in ids {
        let secret = match store.read(id) {
            Ok(secret) => secret,
            Err(e) => {
                warn!(id, error = %e, "failed to fetch secret; skipping");
                warnings.push(FetchWarning {
                    id,
                    message: format!("failed to fetch secret {id}: {e}"),
                });
                continue;
            }
        };

        let Some(value) = take_field(store, secret, field) else {
            error!(id, field, "field not found in secret");
            return Err(SyncError::FieldNotFound {
                secret_id: id,
                field: field.to_string(),
            });
        };
        values.push((id, value));
    }

    debug!(fetched = values.len(), skipped = warnings.len(), "batch fetched");
    Ok((values, warnings))
}

/// Copy `field` out of a fetched secret, then wipe every value it held.
fn take_field<S: RemoteStore + ?Sized>(
    store: &S,
    mut secret: SecretRecord,
    field: &str,
) -> Option<String> {
    let value = store.extract_field(&secret, field).map(str::to_string);
    wipe_values(&mut secret);
    value
}

fn wipe_values(secret: &mut SecretRecord) {
    for field in &mut secret.fields {
        field.value.zeroize();
    }
}
