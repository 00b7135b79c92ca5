//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::audit::AuditOp;
use crate::config::Settings;
use crate::declaration::{parse_identifier, Manifest};
use crate::errors::{Result, SyncError};
use crate::state::{Protection, StateFile};
use crate::store::LocalStore;

/// Environment variable holding the state file passphrase.
pub const PASSPHRASE_ENV: &str = "SECRETSYNC_STATE_PASSPHRASE";

/// Minimum passphrase length for newly encrypted state.
const MIN_PASSPHRASE_LEN: usize = 8;

/// SecretSync CLI: declarative secret synchronization.
#[derive(Parser)]
#[command(
    name = "secretsync",
    about = "Reconcile declared secrets against a remote secret store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// State directory (default from .secretsync.toml, else .secretsync)
    #[arg(long, global = true)]
    pub state_dir: Option<String>,

    /// Manifest of declared secrets (default: secrets.toml)
    #[arg(long, global = true)]
    pub manifest: Option<String>,

    /// JSON file acting as the remote store (default: <state_dir>/store.json)
    #[arg(long, global = true)]
    pub store: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create or update every declared secret
    Apply {
        /// Only apply this manifest key
        #[arg(long)]
        key: Option<String>,
    },

    /// Read every durable record back from the store
    Refresh,

    /// Delete a secret remotely and drop its durable record
    Destroy {
        /// Manifest key
        key: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Adopt an existing remote secret under a manifest key
    Import {
        /// Manifest key to record it under
        key: String,
        /// Remote secret id
        id: String,
    },

    /// Show durable records
    Show {
        /// Show one record's fields
        key: Option<String>,
        /// Print field values instead of masking them
        #[arg(long)]
        show_values: bool,
    },

    /// Read one field from one or more secrets
    Lookup {
        /// Field name or slug
        field: String,
        /// Remote secret ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Ephemeral field reads that are never written to state
    Lease {
        #[command(subcommand)]
        action: LeaseAction,
    },

    /// Encrypt or decrypt the state file at rest
    State {
        #[command(subcommand)]
        action: StateAction,
    },

    /// View the audit log of lifecycle operations
    #[cfg(feature = "audit-log")]
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },

    /// Show version information
    Version,
}

/// Lease subcommands.
#[derive(clap::Subcommand)]
pub enum LeaseAction {
    /// Fetch field values and print a renewal token
    Open {
        /// Field name or slug
        field: String,
        /// Remote secret ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Re-fetch values using a token from `lease open`
    Renew {
        /// Carry-state token
        token: Option<String>,
    },
}

/// State subcommands.
#[derive(clap::Subcommand)]
pub enum StateAction {
    /// Encrypt the state file with a passphrase
    Encrypt,
    /// Write the state file back as plain JSON
    Decrypt,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolved paths and settings for one invocation.
pub struct Context {
    pub settings: Settings,
    pub state_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub store_path: PathBuf,
}

/// Loaded state plus the passphrase it must be written back with.
pub struct StateSession {
    pub state: StateFile,
    passphrase: Option<Zeroizing<String>>,
}

impl Context {
    /// Resolve settings from the working directory, then apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let settings = Settings::load(&cwd)?;
        Ok(Self::resolve(cli, &cwd, settings))
    }

    fn resolve(cli: &Cli, cwd: &Path, settings: Settings) -> Self {
        let state_dir = match &cli.state_dir {
            Some(dir) => cwd.join(dir),
            None => settings.state_dir_path(cwd),
        };
        let manifest_path = match &cli.manifest {
            Some(path) => cwd.join(path),
            None => settings.manifest_path(cwd),
        };
        let store_path = match &cli.store {
            Some(path) => cwd.join(path),
            None => state_dir.join(&settings.store_file),
        };
        Self {
            settings,
            state_dir,
            manifest_path,
            store_path,
        }
    }

    pub fn state_path(&self) -> PathBuf {
        StateFile::path_in(&self.state_dir)
    }

    pub fn open_store(&self) -> Result<LocalStore> {
        LocalStore::open(&self.store_path)
    }

    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path)
    }

    /// Load the state file, asking for the passphrase when it is encrypted
    /// (or when settings say new state should be encrypted).
    pub fn open_state(&self) -> Result<StateSession> {
        let path = self.state_path();
        let passphrase = if StateFile::is_encrypted_file(&path)? {
            Some(prompt_passphrase()?)
        } else if self.settings.encrypt_state {
            Some(prompt_new_passphrase()?)
        } else {
            None
        };

        let state = StateFile::load(&path, passphrase.as_deref().map(String::as_str))?;
        Ok(StateSession { state, passphrase })
    }

    /// Write the state back with the same protection it was loaded with.
    pub fn save_state(&self, session: &StateSession) -> Result<()> {
        let protection = match &session.passphrase {
            Some(passphrase) => Protection::Encrypted {
                passphrase: passphrase.as_str(),
                params: &self.settings.argon2,
            },
            None => Protection::Plain,
        };
        session.state.save(&self.state_path(), protection)
    }

    /// Record an audit event.  Never fails.
    pub fn audit(
        &self,
        op: AuditOp,
        key: Option<&str>,
        id: Option<u64>,
        details: Option<&str>,
    ) {
        #[cfg(feature = "audit-log")]
        {
            if std::fs::create_dir_all(&self.state_dir).is_ok() {
                crate::audit::log_audit(&self.state_dir, op, key, id, details);
            }
        }
        #[cfg(not(feature = "audit-log"))]
        let _ = (op, key, id, details);
    }
}

impl StateSession {
    /// Replace the passphrase used on the next save (`None` = plain).
    pub fn set_passphrase(&mut self, passphrase: Option<Zeroizing<String>>) {
        self.passphrase = passphrase;
    }

    pub fn is_encrypted(&self) -> bool {
        self.passphrase.is_some()
    }
}

/// Parse secret ids given on the command line.
pub fn parse_ids(raw: &[String]) -> Result<Vec<u64>> {
    raw.iter().map(|id| parse_identifier("secret_id", id)).collect()
}

/// Get the state passphrase, trying in order:
/// 1. `SECRETSYNC_STATE_PASSPHRASE` env var (CI/CD)
/// 2. Interactive prompt
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env() {
        return Ok(pw);
    }
    let pw = dialoguer::Password::new()
        .with_prompt("Enter state passphrase")
        .interact()
        .map_err(|e| SyncError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation.  Also respects
/// `SECRETSYNC_STATE_PASSPHRASE`.  Enforces a minimum length.
pub fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env() {
        if pw.len() < MIN_PASSPHRASE_LEN {
            return Err(SyncError::CommandFailed(format!(
                "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let pw = dialoguer::Password::new()
            .with_prompt("Choose state passphrase")
            .with_confirmation(
                "Confirm state passphrase",
                "Passphrases do not match, try again",
            )
            .interact()
            .map_err(|e| SyncError::CommandFailed(format!("passphrase prompt: {e}")))?;

        if pw.len() < MIN_PASSPHRASE_LEN {
            output::warning(&format!(
                "Passphrase must be at least {MIN_PASSPHRASE_LEN} characters. Try again."
            ));
            continue;
        }
        return Ok(Zeroizing::new(pw));
    }
}

fn passphrase_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}
