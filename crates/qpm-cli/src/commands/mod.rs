//! Command implementations and dispatch logic.
//!
//! Each command is an async function that takes a [`CommandContext`] and
//! reports a [`CommandOutcome`]; hard failures travel as `QpmError`.

use camino::Utf8PathBuf;
use qpm_config::manifest::{self, find_manifest, ManifestLocation};
use qpm_config::{lockfile, Manifest, Settings, LOCK_FILE_NAME};
use qpm_core::error::{QpmError, QpmResult};
use qpm_core::types::LockSet;
use qpm_registry::RegistryClient;
use qpm_resolver::{Resolution, Resolver};
use qpm_store::PackageStore;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod delete;
pub mod install;
pub mod list;
pub mod lock;
pub mod publish;
pub mod verify;


use crate::{output::OutputHandler, Commands};

/// Result of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Completed, but the process should exit non-zero
    Failure,
}

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub settings: Settings,
    pub output: OutputHandler,
    /// Fired on Ctrl-C
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Create a context rooted at the current directory
    pub fn new(settings: Settings) -> QpmResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| QpmError::io("Failed to get current directory", e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|p| QpmError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("current directory is not valid UTF-8: {}", p.display()),
        })?;

        Ok(Self {
            cwd,
            settings,
            output: OutputHandler::new(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn registry_client(&self) -> QpmResult<RegistryClient> {
        RegistryClient::with_token(self.settings.registry_url.clone(), self.settings.token.clone())
    }

    pub fn store(&self) -> QpmResult<PackageStore> {
        PackageStore::new(self.settings.packages_dir())
    }

    /// Locate the project containing the current directory
    pub fn project(&self) -> QpmResult<Project> {
        let ManifestLocation { root, path } =
            find_manifest(&self.cwd).ok_or_else(|| QpmError::ConfigValidation {
                field: "manifest".to_string(),
                reason: format!(
                    "{} not found in {} or any parent directory",
                    manifest::MANIFEST_FILE_NAME,
                    self.cwd
                ),
            })?;
        Ok(Project {
            root,
            manifest_path: path,
        })
    }
}

/// A directory holding `qilletni_info.yml`, directly or under `qilletni-src/`
#[derive(Debug, Clone)]
pub struct Project {
    pub root: Utf8PathBuf,
    pub manifest_path: Utf8PathBuf,
}

impl Project {
    pub fn lock_path(&self) -> Utf8PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    pub async fn manifest(&self) -> QpmResult<Manifest> {
        manifest::load_from_file(&self.manifest_path).await
    }

    pub async fn lock(&self) -> QpmResult<Option<LockSet>> {
        lockfile::load_from_file(&self.lock_path()).await
    }
}

/// Resolve a manifest against the registry and write the lock file
pub(crate) async fn resolve_and_lock(
    manifest: &Manifest,
    project: &Project,
    client: &RegistryClient,
    ctx: &CommandContext,
) -> QpmResult<Resolution> {
    ctx.output
        .info(&format!("Resolving dependencies for {}...", manifest.name));

    let resolution = Resolver::new(client)
        .resolve_with_cancel(manifest.dependencies.clone(), &ctx.cancel)
        .await?;
    lockfile::write_to_file(&resolution.lock_set, &project.lock_path()).await?;

    ctx.output.success(&format!(
        "Lock file written with {} package(s) in {}ms",
        resolution.lock_set.len(),
        resolution.resolution_time_ms
    ));
    Ok(resolution)
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> QpmResult<CommandOutcome> {
    match command {
        Commands::Install { frozen, jobs } => {
            info!("Installing dependencies (frozen: {}, jobs: {})", frozen, jobs);
            install::execute(install::InstallOptions { frozen, jobs: jobs as usize }, ctx).await
        },
        Commands::Lock => {
            info!("Writing lock file");
            lock::execute(ctx).await
        },
        Commands::Verify => {
            info!("Verifying installed packages");
            verify::execute(ctx).await
        },
        Commands::List { scope } => {
            info!("Listing registry packages (scope: {:?})", scope);
            list::execute(scope, ctx).await
        },
        Commands::Publish { file } => {
            info!("Publishing package (file: {:?})", file);
            publish::execute(file, ctx).await
        },
        Commands::Delete {
            package,
            version,
            yes,
        } => {
            info!("Deleting {}@{}", package, version);
            delete::execute(&package, &version, yes, ctx).await
        },
    }
}
