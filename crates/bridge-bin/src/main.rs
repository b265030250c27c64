//! slack-bridge - Slack Web API bridge with runtime scope detection.

use std::path::PathBuf;

use anyhow::Context;
use bridge_bin::app::{self, ResolveReport, StatusReport, ToolsReport};
use bridge_bin::output::{self, OutputFormat};
use bridge_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};
use credential_resolver::{resolve, CredentialSources};
use directory_cache::DirectoryKind;
use tokio_util::sync::CancellationToken;

/// slack-bridge command-line interface.
#[derive(Parser)]
#[command(name = "slack-bridge")]
#[command(about = "Expose Slack to an automation agent with scope-aware tool gating")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, logs). Defaults to ~/.slack-bridge
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect scopes and run until interrupted
    Serve,
    /// Show the credential kind and detected scopes
    Status,
    /// List the tools that would be advertised
    Tools,
    /// Resolve a #channel, @user or ID to a Slack ID
    Resolve {
        /// Reference to resolve
        reference: String,

        /// Look up in the user directory instead of conversations
        #[arg(long)]
        user: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(err) = run(cli).await {
        tracing::error!(error = %format!("{:#}", err), "slack-bridge failed");
        output::print_error(&format!("{:#}", err), format);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths).context("loading configuration")?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize logging
    init_logging(&config.log_level, Some(paths.log_file()));

    let credential =
        resolve(&CredentialSources::from_env()).context("resolving Slack credentials")?;

    let shutdown = CancellationToken::new();
    let state = app::build_state(config, paths, credential, shutdown)
        .await
        .context("starting bridge")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => app::run_bridge(state).await,
        Commands::Status => output::print(&StatusReport::from_state(&state), cli.format),
        Commands::Tools => output::print(&ToolsReport::from_state(&state), cli.format),
        Commands::Resolve { reference, user } => {
            let (directory, id) = if user {
                (DirectoryKind::Users, state.directory.resolve_user(&reference).await)
            } else {
                (DirectoryKind::Conversations, state.directory.resolve(&reference).await)
            };
            let id = id.with_context(|| format!("resolving {}", reference))?;
            output::print(
                &ResolveReport {
                    reference,
                    id,
                    directory,
                },
                cli.format,
            );
        }
    }

    Ok(())
}
