//! Breadth-first dependency resolution
//!
//! Resolution keeps exactly one version per package. The first constraint to
//! reach a package picks its version (the highest one satisfying that
//! constraint); every later constraint on the same package must accept that
//! version or resolution fails with a conflict. There is no backtracking.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use qpm_config::Manifest;
use qpm_core::error::QpmError;
use qpm_core::types::{
    source_locator, Constraint, DependencySpec, LockSet, PackageName, ResolvedPackage, Version,
};
use qpm_registry::{VersionIndex, VersionIndexEntry, VersionIndexProvider};

use crate::semver::VersionSelector;
use crate::ResolverResult;

/// Resolver tuning
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Upper bound on a single version index fetch
    pub fetch_timeout: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(60),
        }
    }
}

/// Result of dependency resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Resolved packages in resolution order
    pub lock_set: LockSet,
    /// Number of root dependencies requested
    pub root_count: usize,
    /// Number of version index fetches performed
    pub fetch_count: usize,
    /// Resolution time in milliseconds
    pub resolution_time_ms: u64,
}

/// Breadth-first single-version resolver
#[derive(Debug)]
pub struct Resolver<P> {
    /// Source of version indexes
    provider: P,
    options: ResolveOptions,
}

impl<P: VersionIndexProvider> Resolver<P> {
    /// Create a resolver with default options
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, ResolveOptions::default())
    }

    pub fn with_options(provider: P, options: ResolveOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve the direct dependencies of a manifest
    pub async fn resolve_manifest(&self, manifest: &Manifest) -> ResolverResult<Resolution> {
        info!(package = %manifest.name, "resolving dependencies");
        self.resolve(manifest.dependencies.clone()).await
    }

    /// Resolve a list of root dependencies
    pub async fn resolve(&self, roots: Vec<DependencySpec>) -> ResolverResult<Resolution> {
        self.resolve_with_cancel(roots, &CancellationToken::new())
            .await
    }

    /// Resolve, aborting with [`QpmError::Cancelled`] once `cancel` fires
    pub async fn resolve_with_cancel(
        &self,
        roots: Vec<DependencySpec>,
        cancel: &CancellationToken,
    ) -> ResolverResult<Resolution> {
        let span = info_span!("resolve", roots = roots.len());
        self.run(roots, cancel).instrument(span).await
    }

    async fn run(
        &self,
        roots: Vec<DependencySpec>,
        cancel: &CancellationToken,
    ) -> ResolverResult<Resolution> {
        let start = Instant::now();
        let root_count = roots.len();
        let mut fetch_count = 0;

        let mut resolved = LockSet::new();
        let mut queue: VecDeque<DependencySpec> = roots.into();

        loop {
            if cancel.is_cancelled() {
                return Err(QpmError::Cancelled);
            }
            let Some(DependencySpec { name, constraint }) = queue.pop_front() else {
                break;
            };

            if let Some(existing) = resolved.get_by_name(&name) {
                let parsed = Constraint::parse(&constraint)?;
                if !parsed.matches(&existing.version) {
                    return Err(QpmError::ResolutionConflict {
                        package: name.to_string(),
                        constraint,
                        existing: existing.version.to_string(),
                    });
                }
                debug!(
                    package = %name,
                    constraint = %constraint,
                    version = %existing.version,
                    "already resolved with a compatible version"
                );
                continue;
            }

            fetch_count += 1;
            let index = self.fetch_index(&name, cancel).await?;
            let (version, entry) = choose(&name, &constraint, &index)?;
            let package = build_package(name, version, entry)?;

            info!(package = %package.name, version = %package.version, "resolved");

            for (dep, dep_constraint) in &package.dependencies {
                queue.push_back(DependencySpec {
                    name: dep.clone(),
                    constraint: dep_constraint.clone(),
                });
            }
            resolved.insert(package);
        }

        let resolution_time_ms = start.elapsed().as_millis() as u64;
        info!(
            packages = resolved.len(),
            fetches = fetch_count,
            elapsed_ms = resolution_time_ms,
            "resolution complete"
        );

        Ok(Resolution {
            lock_set: resolved,
            root_count,
            fetch_count,
            resolution_time_ms,
        })
    }

    /// Fetch a version index, bounded by the fetch timeout and the cancel token
    async fn fetch_index(
        &self,
        name: &PackageName,
        cancel: &CancellationToken,
    ) -> ResolverResult<VersionIndex> {
        debug!(package = %name, "fetching version index");
        let fetch = tokio::time::timeout(self.options.fetch_timeout, self.provider.version_index(name));

        tokio::select! {
            _ = cancel.cancelled() => Err(QpmError::Cancelled),
            result = fetch => match result {
                Ok(Ok(index)) => Ok(index),
                Ok(Err(e)) => Err(QpmError::resolution_failure(name.to_string(), e)),
                Err(_) => Err(QpmError::resolution_failure(
                    name.to_string(),
                    QpmError::Network {
                        message: format!(
                            "timed out after {} ms",
                            self.options.fetch_timeout.as_millis()
                        ),
                        source: None,
                    },
                )),
            },
        }
    }
}

/// Pick the index entry for the highest version satisfying `constraint`
fn choose<'a>(
    name: &PackageName,
    constraint: &str,
    index: &'a VersionIndex,
) -> ResolverResult<(Version, &'a VersionIndexEntry)> {
    if index.versions.is_empty() {
        return Err(QpmError::NoVersionsAvailable {
            package: name.to_string(),
        });
    }

    let available = index.version_strings();
    let selector = VersionSelector::parse(&available)?;
    let parsed = Constraint::parse(constraint)?;

    // Selector positions line up with index entries
    match selector.best_index(&parsed) {
        Some(i) => Ok((selector.versions()[i].clone(), &index.versions[i])),
        None => Err(QpmError::NoSatisfyingVersion {
            package: name.to_string(),
            constraint: constraint.to_string(),
            available,
        }),
    }
}

/// Build the resolved record from the already fetched index entry
fn build_package(
    name: PackageName,
    version: Version,
    entry: &VersionIndexEntry,
) -> ResolverResult<ResolvedPackage> {
    let mut dependencies = IndexMap::with_capacity(entry.dependencies.len());
    for (dep, constraint) in &entry.dependencies {
        let spec = DependencySpec::parse(dep, constraint)?;
        dependencies.insert(spec.name, spec.constraint);
    }

    Ok(ResolvedPackage {
        source: source_locator(&name, &version),
        name,
        version,
        integrity: entry.integrity.clone(),
        size: Some(entry.size),
        dependencies,
    })
}

#[cfg(test)]
mod tests;
