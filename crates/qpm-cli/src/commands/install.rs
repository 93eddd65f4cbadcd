//! `qpm install` command implementation.
//!
//! Resolves dependencies when no usable lock file exists, then downloads each
//! locked package into the local store. Downloads run concurrently up to the
//! job limit; an archive is only moved into the store after its integrity
//! matches the lock entry.

use std::sync::Arc;
use std::time::Instant;

use qpm_config::Manifest;
use qpm_core::error::{QpmError, QpmResult};
use qpm_core::types::{LockSet, ResolvedPackage};
use qpm_registry::RegistryClient;
use qpm_store::{PackageStatus, PackageStore};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{resolve_and_lock, CommandContext, CommandOutcome};
use crate::output::format_bytes;

/// Options for `qpm install`
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    pub frozen: bool,
    /// Maximum concurrent downloads
    pub jobs: usize,
}

/// How a single package ended up installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Installed {
    AlreadyPresent,
    Downloaded { bytes: u64 },
    /// A corrupt copy was replaced
    Repaired { bytes: u64 },
}

/// Execute the `qpm install` command
pub async fn execute(options: InstallOptions, ctx: &CommandContext) -> QpmResult<CommandOutcome> {
    let start_time = Instant::now();
    let project = ctx.project()?;
    let manifest = project.manifest().await?;
    let client = Arc::new(ctx.registry_client()?);

    let lock = match project.lock().await? {
        Some(lock) => match stale_reason(&manifest, &lock) {
            None => {
                ctx.output.info("Using qilletni.lock");
                lock
            },
            Some(reason) if options.frozen => {
                return Err(QpmError::ConfigValidation {
                    field: "lockfile".to_string(),
                    reason: format!("qilletni.lock is out of date: {}", reason),
                });
            },
            Some(reason) => {
                ctx.output.warn(&format!("qilletni.lock is out of date ({}), re-resolving", reason));
                resolve_and_lock(&manifest, &project, &client, ctx).await?.lock_set
            },
        },
        None if options.frozen => {
            return Err(QpmError::ConfigValidation {
                field: "lockfile".to_string(),
                reason: "--frozen requires an existing qilletni.lock".to_string(),
            });
        },
        None => {
            ctx.output.info("Lock file not found, resolving dependencies...");
            resolve_and_lock(&manifest, &project, &client, ctx).await?.lock_set
        },
    };

    if lock.is_empty() {
        ctx.output.info("No packages to install.");
        return Ok(CommandOutcome::Success);
    }

    let store = Arc::new(ctx.store()?);
    ctx.output
        .info(&format!("Installing {} package(s)...", lock.len()));

    let failures = install_all(&lock, store, client, options.jobs, ctx).await?;
    if failures > 0 {
        ctx.output
            .error(&format!("{} of {} package(s) failed to install", failures, lock.len()));
        return Ok(CommandOutcome::Failure);
    }

    ctx.output.success(&format!(
        "Installed {} package(s) in {:.2}s",
        lock.len(),
        start_time.elapsed().as_secs_f64()
    ));
    Ok(CommandOutcome::Success)
}

/// Why a lock file no longer matches the manifest, if it does not
fn stale_reason(manifest: &Manifest, lock: &LockSet) -> Option<String> {
    for dependency in &manifest.dependencies {
        let Some(locked) = lock.get_by_name(&dependency.name) else {
            return Some(format!("{} is not locked", dependency.name));
        };
        match dependency.parsed_constraint() {
            Ok(constraint) if constraint.matches(&locked.version) => {},
            _ => {
                return Some(format!(
                    "{} {} does not allow locked {}",
                    dependency.name, dependency.constraint, locked.version
                ))
            },
        }
    }
    if !lock.is_closed() {
        return Some("dependencies are missing from the lock".to_string());
    }
    None
}

/// Install every lock entry; returns the number of failures
async fn install_all(
    lock: &LockSet,
    store: Arc<PackageStore>,
    client: Arc<RegistryClient>,
    jobs: usize,
    ctx: &CommandContext,
) -> QpmResult<usize> {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();

    for package in lock.iter().cloned() {
        let store = Arc::clone(&store);
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let cancel = ctx.cancel.clone();

        tasks.spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(QpmError::Cancelled),
                result = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| QpmError::Cancelled)?;
                    install_one(&store, &client, &package).await
                } => result,
            };
            (package, result)
        });
    }

    let mut failures = 0;
    while let Some(joined) = tasks.join_next().await {
        let (package, result) = joined.map_err(|e| {
            QpmError::io("Install task failed", std::io::Error::other(e))
        })?;
        let key = package.key();
        match result {
            Ok(Installed::AlreadyPresent) => {
                ctx.output.success(&format!("{} (already installed)", key));
            },
            Ok(Installed::Downloaded { bytes }) => {
                ctx.output
                    .success(&format!("{} ({})", key, format_bytes(bytes)));
            },
            Ok(Installed::Repaired { bytes }) => {
                ctx.output
                    .success(&format!("{} (replaced corrupt copy, {})", key, format_bytes(bytes)));
            },
            Err(QpmError::Cancelled) => {
                tasks.abort_all();
                return Err(QpmError::Cancelled);
            },
            Err(e) => {
                failures += 1;
                ctx.output.error(&format!("{} - {}", key, e));
            },
        }
    }
    Ok(failures)
}

async fn install_one(
    store: &Arc<PackageStore>,
    client: &RegistryClient,
    package: &ResolvedPackage,
) -> QpmResult<Installed> {
    let status = {
        let store = Arc::clone(store);
        let package = package.clone();
        blocking(move || store.status(&package)).await?
    };

    let repaired = match status {
        PackageStatus::Verified => return Ok(Installed::AlreadyPresent),
        PackageStatus::Missing => false,
        PackageStatus::Corrupt { expected, actual } => {
            warn!(package = %package.key(), %expected, %actual, "integrity check failed, re-downloading");
            store.remove(package)?;
            true
        },
    };

    let bytes = match fetch_into_store(store, client, package).await {
        Err(QpmError::IntegrityMismatch { actual, .. }) => {
            warn!(package = %package.key(), %actual, "downloaded archive failed verification, retrying once");
            fetch_into_store(store, client, package).await?
        },
        other => other?,
    };

    Ok(if repaired {
        Installed::Repaired { bytes }
    } else {
        Installed::Downloaded { bytes }
    })
}

/// Download one archive into a staged file and commit it
async fn fetch_into_store(
    store: &Arc<PackageStore>,
    client: &RegistryClient,
    package: &ResolvedPackage,
) -> QpmResult<u64> {
    let staged = store.stage(package)?;
    let mut writer = staged.async_writer()?;
    let summary = client
        .download_package(&package.name, &package.version, &mut writer)
        .await?;
    drop(writer);
    debug!(package = %package.key(), bytes = summary.bytes, "download finished");

    let store = Arc::clone(store);
    let package = package.clone();
    blocking(move || store.commit(&package, staged)).await?;
    Ok(summary.bytes)
}

/// Run file hashing off the async workers
async fn blocking<T, F>(f: F) -> QpmResult<T>
where
    F: FnOnce() -> QpmResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| QpmError::io("Blocking task failed", std::io::Error::other(e)))?
}
