//! `secretsync state` — toggle at-rest encryption of the state file.

use crate::audit::AuditOp;
use crate::cli::output;
use crate::cli::{prompt_new_passphrase, Cli, Context};
use crate::errors::Result;
use crate::state::StateFile;

/// Execute `state encrypt`.
pub fn execute_encrypt(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    if StateFile::is_encrypted_file(&ctx.state_path())? {
        output::info("State file is already encrypted.");
        return Ok(());
    }

    let mut session = ctx.open_state()?;
    if !session.is_encrypted() {
        session.set_passphrase(Some(prompt_new_passphrase()?));
    }

    ctx.save_state(&session)?;
    ctx.audit(AuditOp::StateEncrypt, None, None, None);
    output::success(&format!("Encrypted {}", ctx.state_path().display()));
    output::tip("Set SECRETSYNC_STATE_PASSPHRASE to avoid the prompt in CI.");
    Ok(())
}

/// Execute `state decrypt`.
pub fn execute_decrypt(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    if !StateFile::is_encrypted_file(&ctx.state_path())? {
        output::info("State file is not encrypted.");
        return Ok(());
    }

    let mut session = ctx.open_state()?;
    session.set_passphrase(None);
    ctx.save_state(&session)?;
    ctx.audit(AuditOp::StateDecrypt, None, None, None);
    output::success(&format!("Decrypted {}", ctx.state_path().display()));
    if ctx.settings.encrypt_state {
        output::warning("encrypt_state is set in .secretsync.toml; the next write will re-encrypt.");
    }
    Ok(())
}
