//! # qpm
//!
//! Command line client for the Qilletni package registry.
//!
//! This is the main entry point for the qpm CLI. It parses arguments, sets up
//! logging and the async runtime, loads user settings and dispatches to the
//! command handlers.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use qpm_config::SettingsLoader;
use qpm_core::error::{QpmError, QpmResult};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{CommandContext, CommandOutcome};
use output::errors::ErrorFormatter;

/// Package manager for Qilletni libraries
#[derive(Parser)]
#[command(name = "qpm", version, about = "Package manager for Qilletni libraries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Registry URL, overriding settings and QPM_REGISTRY_URL
    #[arg(long, global = true, value_name = "URL")]
    pub registry: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install dependencies from qilletni_info.yml, using qilletni.lock when present
    Install {
        /// Fail instead of resolving when qilletni.lock is missing or stale
        #[arg(long)]
        frozen: bool,
        /// Maximum concurrent downloads
        #[arg(short, long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=64))]
        jobs: u32,
    },
    /// Resolve dependencies and write qilletni.lock without installing
    Lock,
    /// Verify installed packages against qilletni.lock
    Verify,
    /// List packages in the registry
    List {
        /// Only show packages in this scope
        #[arg(long)]
        scope: Option<String>,
    },
    /// Publish a package archive
    Publish {
        /// Archive to upload (defaults to the latest build output)
        #[arg(value_name = "FILE")]
        file: Option<Utf8PathBuf>,
    },
    /// Delete a published version
    Delete {
        /// Package name, `scope/name`
        package: String,
        version: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    debug!("Starting qpm v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(CommandOutcome::Success) => ExitCode::SUCCESS,
        Ok(CommandOutcome::Failure) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> QpmResult<CommandOutcome> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| QpmError::io("Failed to create async runtime", e))?;

    rt.block_on(async {
        let settings = SettingsLoader::from_env()
            .registry_override(cli.registry)
            .load()
            .await?;
        let ctx = CommandContext::new(settings)?;

        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("qpm={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("qpm encountered an unexpected error: {}", panic_info);
        eprintln!("qpm crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/qilletni/qpm/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
