//! qilletni_info.yml parsing and serialization
//!
//! The manifest is a YAML document. Only `name`, `version` and `dependencies`
//! are read; other keys belong to the Qilletni toolchain and are ignored.
//! Dependencies are deserialized into an [`IndexMap`] so their order matches
//! the document.

use crate::{line_column, ConfigResult};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use qpm_core::error::QpmError;
use qpm_core::types::{DependencySpec, PackageName};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Manifest file name in a project root
pub const MANIFEST_FILE_NAME: &str = "qilletni_info.yml";

/// Source directory that may hold the manifest instead of the project root
pub const SOURCE_DIR_NAME: &str = "qilletni-src";

/// Project manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Package name, `scope/name`
    pub name: String,
    /// Package version
    pub version: String,
    /// Direct dependencies in document order
    pub dependencies: Vec<DependencySpec>,
}

impl Manifest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency, keeping declaration order
    pub fn with_dependency(mut self, dependency: DependencySpec) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    dependencies: Option<Value>,
}

#[derive(Serialize)]
struct ManifestDocument<'a> {
    name: &'a str,
    version: &'a str,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    dependencies: IndexMap<String, &'a str>,
}

/// Parse manifest text
pub fn parse_manifest(content: &str) -> ConfigResult<Manifest> {
    parse_manifest_named(content, MANIFEST_FILE_NAME)
}

fn parse_manifest_named(content: &str, file: &str) -> ConfigResult<Manifest> {
    let raw: RawManifest = if content.trim().is_empty() {
        RawManifest::default()
    } else {
        serde_yaml::from_str::<Option<RawManifest>>(content)
            .map_err(|e| parse_error(content, file, e))?
            .unwrap_or_default()
    };

    let name = required_scalar(raw.name, "name")?;
    let version = required_scalar(raw.version, "version")?;

    let mut dependencies = Vec::new();
    for (package, constraint) in dependency_map(raw.dependencies)? {
        let constraint = scalar(&constraint).ok_or_else(|| QpmError::InvalidDependencySpec {
            package: package.clone(),
            constraint: render(&constraint),
            reason: "constraint must be a string".to_string(),
        })?;
        dependencies.push(DependencySpec::parse(&package, &constraint)?);
    }

    Ok(Manifest {
        name,
        version,
        dependencies,
    })
}

fn parse_error(content: &str, file: &str, error: serde_yaml::Error) -> QpmError {
    let (line, column) = error
        .location()
        .map_or((1, 1), |location| line_column(content, location.index()));
    let message = error.to_string();
    let message = message
        .split_once(" at line ")
        .map_or(message.as_str(), |(head, _)| head)
        .to_string();
    QpmError::ManifestParse {
        file: file.to_string(),
        message,
        line,
        column,
    }
}

/// `dependencies` as an ordered map; absent or `null` means none
fn dependency_map(value: Option<Value>) -> ConfigResult<IndexMap<String, Value>> {
    match value {
        None | Some(Value::Null) => Ok(IndexMap::new()),
        Some(value) => serde_yaml::from_value(value.clone()).map_err(|e| {
            QpmError::InvalidDependencySpec {
                package: "dependencies".to_string(),
                constraint: render(&value),
                reason: format!("'dependencies' must map package names to constraints: {}", e),
            }
        }),
    }
}

fn render(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Strings and numbers; YAML reads `version: 1.0` as a float
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_scalar(value: Option<Value>, field: &str) -> ConfigResult<String> {
    value
        .as_ref()
        .and_then(scalar)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| QpmError::ManifestMissingField {
            field: field.to_string(),
        })
}

/// Serialize a manifest to YAML text
pub fn serialize_manifest(manifest: &Manifest) -> ConfigResult<String> {
    let document = ManifestDocument {
        name: &manifest.name,
        version: &manifest.version,
        dependencies: manifest
            .dependencies
            .iter()
            .map(|dep| (dep.name.to_string(), dep.constraint.as_str()))
            .collect(),
    };

    serde_yaml::to_string(&document).map_err(|e| QpmError::ConfigValidation {
        field: "manifest".to_string(),
        reason: format!("failed to serialize manifest: {}", e),
    })
}

/// Load and parse a manifest from disk
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<Manifest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| QpmError::io(format!("Failed to read {}", path), e))?;

    parse_manifest_named(&content, path.as_str())
}

/// Write a manifest to disk
pub async fn write_to_file(manifest: &Manifest, path: &Utf8Path) -> ConfigResult<()> {
    let content = serialize_manifest(manifest)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| QpmError::io(format!("Failed to write {}", path), e))
}

/// Where a project's manifest was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLocation {
    /// Project root; holds the lock file and `build/`
    pub root: Utf8PathBuf,
    /// The manifest itself, in `root` or `root/qilletni-src`
    pub path: Utf8PathBuf,
}

/// Find the manifest for `start`, walking up parent directories
///
/// Each directory is checked for `qilletni_info.yml`, then for
/// `qilletni-src/qilletni_info.yml`.
pub fn find_manifest(start: &Utf8Path) -> Option<ManifestLocation> {
    start.ancestors().find_map(|dir| {
        [
            dir.join(MANIFEST_FILE_NAME),
            dir.join(SOURCE_DIR_NAME).join(MANIFEST_FILE_NAME),
        ]
        .into_iter()
        .find(|candidate| candidate.is_file())
        .map(|path| ManifestLocation {
            root: dir.to_path_buf(),
            path,
        })
    })
}

/// Check that a manifest's own name and version are usable for publishing
pub fn validate_for_publish(manifest: &Manifest) -> ConfigResult<(PackageName, qpm_core::Version)> {
    let name = PackageName::parse(&manifest.name).map_err(|e| QpmError::ConfigValidation {
        field: "name".to_string(),
        reason: e.to_string(),
    })?;
    let version = qpm_core::Version::parse(&manifest.version)?;
    Ok((name, version))
}
