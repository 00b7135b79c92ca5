use clap::Parser;
use secretsync::cli::{Cli, Commands, LeaseAction, StateAction};
use secretsync::config::Settings;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "SECRETSYNC_LOG";

fn main() {
    init_logging();
    let cli = Cli::parse();

    use secretsync::cli::commands;
    let result = match cli.command {
        Commands::Apply { ref key } => commands::apply::execute(&cli, key.as_deref()),
        Commands::Refresh => commands::refresh::execute(&cli),
        Commands::Destroy { ref key, force } => commands::destroy::execute(&cli, key, force),
        Commands::Import { ref key, ref id } => commands::import_cmd::execute(&cli, key, id),
        Commands::Show {
            ref key,
            show_values,
        } => commands::show::execute(&cli, key.as_deref(), show_values),
        Commands::Lookup { ref field, ref ids } => commands::lookup::execute(&cli, field, ids),
        Commands::Lease { ref action } => match action {
            LeaseAction::Open { field, ids } => commands::lease::execute_open(&cli, field, ids),
            LeaseAction::Renew { token } => commands::lease::execute_renew(&cli, token.as_deref()),
        },
        Commands::State { ref action } => match action {
            StateAction::Encrypt => commands::state_cmd::execute_encrypt(&cli),
            StateAction::Decrypt => commands::state_cmd::execute_decrypt(&cli),
        },
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Completions { ref shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(),
    };

    if let Err(e) = result {
        secretsync::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// `SECRETSYNC_LOG` wins; otherwise `log_level` from `.secretsync.toml`.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let level = std::env::current_dir()
            .ok()
            .and_then(|cwd| Settings::load(&cwd).ok())
            .map(|s| s.log_level)
            .unwrap_or_else(|| Settings::default().log_level);
        EnvFilter::new(level)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
