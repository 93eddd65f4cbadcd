//! qilletni.lock parsing and serialization
//!
//! The lock file records one `[[package]]` table per resolved package, in
//! resolution order. It carries no resolution logic: parsing rebuilds a
//! [`LockSet`] exactly as it was written.

use crate::{line_column, ConfigResult};
use camino::Utf8Path;
use indexmap::IndexMap;
use qpm_core::error::QpmError;
use qpm_core::types::{LockSet, PackageName, ResolvedPackage, Version};
use qpm_core::utils::is_valid_integrity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lock file name in a project root
pub const LOCK_FILE_NAME: &str = "qilletni.lock";

/// Current lock file format version
pub const LOCK_FORMAT_VERSION: u32 = 1;

const HEADER: &str = "# This file is generated by qpm. Do not edit it by hand.\n\n";

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LockDocument {
    version: u32,
    #[serde(default, rename = "package")]
    packages: Vec<LockEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LockEntry {
    name: PackageName,
    version: Version,
    source: String,
    integrity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    dependencies: IndexMap<PackageName, String>,
}

impl From<&ResolvedPackage> for LockEntry {
    fn from(pkg: &ResolvedPackage) -> Self {
        Self {
            name: pkg.name.clone(),
            version: pkg.version.clone(),
            source: pkg.source.clone(),
            integrity: pkg.integrity.clone(),
            size: pkg.size,
            dependencies: pkg.dependencies.clone(),
        }
    }
}

impl From<LockEntry> for ResolvedPackage {
    fn from(entry: LockEntry) -> Self {
        Self {
            name: entry.name,
            version: entry.version,
            source: entry.source,
            integrity: entry.integrity,
            size: entry.size,
            dependencies: entry.dependencies,
        }
    }
}

fn malformed(message: impl Into<String>) -> QpmError {
    QpmError::MalformedLockFile {
        message: message.into(),
    }
}

/// Serialize a lock set to lock file text
pub fn serialize_lock_file(lock_set: &LockSet) -> ConfigResult<String> {
    let document = LockDocument {
        version: LOCK_FORMAT_VERSION,
        packages: lock_set.iter().map(LockEntry::from).collect(),
    };

    let body = toml::to_string(&document)
        .map_err(|e| malformed(format!("failed to serialize lock file: {}", e)))?;
    Ok(format!("{}{}", HEADER, body))
}

/// Parse lock file text into a lock set
pub fn parse_lock_file(content: &str) -> ConfigResult<LockSet> {
    let document: LockDocument = toml::from_str(content).map_err(|e| match e.span() {
        Some(span) => {
            let (line, column) = line_column(content, span.start);
            malformed(format!("{} at line {}, column {}", e.message(), line, column))
        },
        None => malformed(e.message()),
    })?;

    if document.version != LOCK_FORMAT_VERSION {
        return Err(malformed(format!(
            "unsupported lock file version {} (expected {})",
            document.version, LOCK_FORMAT_VERSION
        )));
    }

    let mut names = HashSet::new();
    let mut lock_set = LockSet::new();
    for entry in document.packages {
        let package = ResolvedPackage::from(entry);
        let key = package.key();

        if !is_valid_integrity(&package.integrity) {
            return Err(malformed(format!(
                "invalid integrity '{}' for '{}'",
                package.integrity, key
            )));
        }
        if lock_set.get(&key).is_some() {
            return Err(malformed(format!("duplicate entry '{}'", key)));
        }
        if !names.insert(package.name.clone()) {
            return Err(malformed(format!(
                "package '{}' is locked at more than one version",
                package.name
            )));
        }
        lock_set.insert(package);
    }

    Ok(lock_set)
}

/// Load a lock file, returning `None` when it does not exist
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<Option<LockSet>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(QpmError::io(format!("Failed to read {}", path), e)),
    };

    parse_lock_file(&content).map(Some).map_err(|e| match e {
        QpmError::MalformedLockFile { message } => malformed(format!("{}: {}", path, message)),
        other => other,
    })
}

/// Write a lock file atomically
pub async fn write_to_file(lock_set: &LockSet, path: &Utf8Path) -> ConfigResult<()> {
    let content = serialize_lock_file(lock_set)?;

    let temp_path = path.with_extension("lock.tmp");
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|e| QpmError::io(format!("Failed to write {}", temp_path), e))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| QpmError::io(format!("Failed to replace {}", path), e))?;

    tracing::debug!(path = %path, packages = lock_set.len(), "wrote lock file");
    Ok(())
}
