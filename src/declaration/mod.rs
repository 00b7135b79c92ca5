//! Declaration module — what the caller wants the remote store to hold.
//!
//! This module provides:
//! - `DesiredSecret` / `DesiredField` and identifier coercion (`desired`)
//! - The TOML `Manifest` that lists desired secrets (`manifest`)

pub mod desired;
pub mod manifest;

pub use desired::{parse_identifier, DesiredField, DesiredFlags, DesiredSecret, Placement};
pub use manifest::Manifest;
