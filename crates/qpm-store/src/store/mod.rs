//! Package store implementation
//!
//! Archives are addressed by package name and version rather than by content.
//! The lock file's integrity string is the source of truth for what a stored
//! archive must contain; [`PackageStore::status`] compares the two.

mod staging;

use std::fs;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use qpm_core::error::QpmError;
use qpm_core::types::{LockSet, PackageName, ResolvedPackage};
use qpm_core::utils::compute_file_integrity;
use rayon::prelude::*;
use tracing::{debug, warn};

pub use staging::StagedArtifact;

use crate::StoreResult;

/// File extension of stored archives
pub const ARTIFACT_EXTENSION: &str = "qll";

/// State of a locked package in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageStatus {
    Missing,
    Verified,
    /// Present, but the content hash differs from the lock entry
    Corrupt { expected: String, actual: String },
}

impl PackageStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, PackageStatus::Verified)
    }
}

/// Verification outcome for one lock entry
#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// `name@version`
    pub key: String,
    pub path: Utf8PathBuf,
    pub status: PackageStatus,
}

/// On-disk package store
#[derive(Debug, Clone)]
pub struct PackageStore {
    /// Root directory for storage (~/.qilletni/packages)
    root: Utf8PathBuf,
}

impl PackageStore {
    /// Open a store, creating the root directory if needed
    pub fn new<P: AsRef<Utf8Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| QpmError::io(format!("Failed to create store directory {}", root), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// `<root>/@scope/name`
    pub fn package_dir(&self, name: &PackageName) -> Utf8PathBuf {
        self.root.join(name.with_sigil())
    }

    /// `<root>/@scope/name/<version>.qll`
    pub fn artifact_path(&self, package: &ResolvedPackage) -> Utf8PathBuf {
        self.package_dir(&package.name)
            .join(format!("{}.{}", package.version, ARTIFACT_EXTENSION))
    }

    /// Compare the stored archive against the lock entry's integrity
    pub fn status(&self, package: &ResolvedPackage) -> StoreResult<PackageStatus> {
        let path = self.artifact_path(package);
        match compute_file_integrity(path.as_std_path()) {
            Ok(actual) if actual == package.integrity => Ok(PackageStatus::Verified),
            Ok(actual) => Ok(PackageStatus::Corrupt {
                expected: package.integrity.clone(),
                actual,
            }),
            Err(QpmError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(PackageStatus::Missing)
            },
            Err(e) => Err(e),
        }
    }

    /// Start writing an archive for `package`
    pub fn stage(&self, package: &ResolvedPackage) -> StoreResult<StagedArtifact> {
        let dir = self.package_dir(&package.name);
        fs::create_dir_all(&dir)
            .map_err(|e| QpmError::io(format!("Failed to create package directory {}", dir), e))?;
        StagedArtifact::create_in(&dir)
    }

    /// Verify a staged archive and move it into place
    ///
    /// On mismatch the staged file is discarded and the existing artifact, if
    /// any, is left untouched.
    pub fn commit(
        &self,
        package: &ResolvedPackage,
        staged: StagedArtifact,
    ) -> StoreResult<Utf8PathBuf> {
        let actual = compute_file_integrity(staged.path().as_std_path())?;
        if actual != package.integrity {
            warn!(package = %package.key(), "discarding staged archive with wrong integrity");
            return Err(QpmError::IntegrityMismatch {
                subject: package.key(),
                expected: package.integrity.clone(),
                actual,
            });
        }

        let destination = self.artifact_path(package);
        staged.persist(&destination)?;
        debug!(package = %package.key(), path = %destination, "stored");
        Ok(destination)
    }

    /// Delete a stored archive; returns whether one existed
    pub fn remove(&self, package: &ResolvedPackage) -> StoreResult<bool> {
        let path = self.artifact_path(package);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(package = %package.key(), "removed");
                Ok(true)
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(QpmError::io(format!("Failed to remove {}", path), e)),
        }
    }

    /// Check every lock entry in parallel; reports follow lock order
    pub fn verify_all(&self, lock: &LockSet) -> StoreResult<Vec<VerifyReport>> {
        let packages: Vec<&ResolvedPackage> = lock.iter().collect();
        packages
            .par_iter()
            .map(|package| {
                Ok(VerifyReport {
                    key: package.key(),
                    path: self.artifact_path(package),
                    status: self.status(package)?,
                })
            })
            .collect()
    }
}
