//! Configuration module — project settings from `.secretsync.toml`.

pub mod settings;

pub use settings::Settings;
