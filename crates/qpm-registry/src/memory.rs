//! Deterministic in-process registry.
//!
//! Used by tests, benchmarks and offline runs. Every published version gets a
//! small synthetic archive whose integrity is recorded in the index, so the
//! same registry can back both resolution and installation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indexmap::IndexMap;
use qpm_core::error::QpmError;
use qpm_core::types::PackageName;
use qpm_core::utils::compute_integrity;

use crate::api::{VersionIndex, VersionIndexEntry};
use crate::provider::VersionIndexProvider;
use crate::RegistryResult;

/// Registry backed by in-memory maps
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    indexes: HashMap<PackageName, VersionIndex>,
    archives: HashMap<String, Vec<u8>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every index lookup by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Publish a version with a synthetic archive
    pub fn publish(
        &mut self,
        name: &str,
        version: &str,
        dependencies: &[(&str, &str)],
    ) -> RegistryResult<&mut Self> {
        let archive = format!("qll archive {}@{}", name, version).into_bytes();
        self.publish_archive(name, version, dependencies, archive)
    }

    /// Publish a version with explicit archive bytes
    pub fn publish_archive(
        &mut self,
        name: &str,
        version: &str,
        dependencies: &[(&str, &str)],
        archive: Vec<u8>,
    ) -> RegistryResult<&mut Self> {
        let package = parse_name(name)?;
        let entry = VersionIndexEntry {
            version: version.to_string(),
            integrity: compute_integrity(&archive),
            size: archive.len() as u64,
            uploaded_at: None,
            dependencies: dependencies
                .iter()
                .map(|(dep, constraint)| (dep.to_string(), constraint.to_string()))
                .collect::<IndexMap<_, _>>(),
        };

        self.archives
            .insert(format!("{}@{}", package, version), archive);

        let index = self
            .indexes
            .entry(package.clone())
            .or_insert_with(|| VersionIndex {
                name: package.to_string(),
                versions: Vec::new(),
                latest: None,
            });
        index.versions.push(entry.clone());
        index.latest = Some(entry);
        Ok(self)
    }

    /// Register a package that has no versions
    pub fn publish_empty(&mut self, name: &str) -> RegistryResult<&mut Self> {
        let package = parse_name(name)?;
        self.indexes.insert(
            package.clone(),
            VersionIndex {
                name: package.to_string(),
                versions: Vec::new(),
                latest: None,
            },
        );
        Ok(self)
    }

    /// Archive bytes for `name@version`
    pub fn archive(&self, name: &PackageName, version: &str) -> Option<&[u8]> {
        self.archives
            .get(&format!("{}@{}", name, version))
            .map(Vec::as_slice)
    }

    /// Number of index lookups served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

fn parse_name(name: &str) -> RegistryResult<PackageName> {
    PackageName::parse(name).map_err(|e| QpmError::ConfigValidation {
        field: "name".to_string(),
        reason: e.to_string(),
    })
}

impl VersionIndexProvider for InMemoryRegistry {
    async fn version_index(&self, name: &PackageName) -> RegistryResult<VersionIndex> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.indexes
            .get(name)
            .cloned()
            .ok_or_else(|| QpmError::PackageNotFound {
                name: name.to_string(),
            })
    }
}
