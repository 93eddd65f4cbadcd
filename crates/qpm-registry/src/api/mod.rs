//! qpm registry API response types

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Read an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Version listing for one package, `GET /packages/{scope}/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionIndex {
    /// Package name as reported by the registry
    pub name: String,
    /// Every published version
    pub versions: Vec<VersionIndexEntry>,
    /// Latest published version
    #[serde(default)]
    pub latest: Option<VersionIndexEntry>,
}

/// Metadata for a single published version
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionIndexEntry {
    /// Version string
    pub version: String,
    /// `sha256-<base64>` integrity of the archive
    pub integrity: String,
    /// Archive size in bytes, `0` when the registry omits it
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    /// Upload time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Declared dependencies, name to constraint
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: IndexMap<String, String>,
}

impl VersionIndex {
    /// Version strings in registry order
    pub fn version_strings(&self) -> Vec<String> {
        self.versions.iter().map(|v| v.version.clone()).collect()
    }

    /// Find the entry for an exact version string
    pub fn find(&self, version: &str) -> Option<&VersionIndexEntry> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// Single-version metadata, `GET /packages/{scope}/{name}/{version}/metadata`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub integrity: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: IndexMap<String, String>,
}

/// Response to a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub package_info: UploadedPackage,
}

/// Package details echoed back after an upload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadedPackage {
    pub name: String,
    pub version: String,
    /// Integrity computed by the registry
    pub integrity: String,
    pub size: u64,
}

/// Response to a version deletion
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: DeletedVersion,
    /// Present when other packages still depend on the deleted version
    #[serde(default)]
    pub warning: Option<DeleteWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeletedVersion {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeleteWarning {
    /// Packages that declare a dependency on the deleted version
    pub dependents: Vec<String>,
    pub message: String,
}

/// Registry package listing, `GET /packages`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageListResponse {
    pub packages: Vec<PackageSummary>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    pub name: String,
    pub latest: String,
    pub version_count: u32,
}

/// Error body returned by the registry on failure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: bool,
    /// Machine-readable error code
    pub error: String,
    /// Human-readable message
    pub message: String,
}

/// Summary of a streamed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Bytes written
    pub bytes: u64,
    /// Integrity of the bytes written
    pub integrity: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_index_parses_registry_json() {
        let json = r#"{
            "name": "alice/postgres",
            "versions": [
                {
                    "version": "1.5.0",
                    "integrity": "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
                    "size": 2048,
                    "uploadedAt": "2024-05-01T12:00:00Z",
                    "dependencies": {"alice/jsonutil": "~2.1.0", "bob/net": "^0.3.0"}
                },
                {
                    "version": "1.0.0",
                    "integrity": "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
                    "size": 1024
                }
            ],
            "latest": {
                "version": "1.5.0",
                "integrity": "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
                "size": 2048
            }
        }"#;

        let index: VersionIndex = serde_json::from_str(json).unwrap();
        assert_eq!(index.version_strings(), vec!["1.5.0", "1.0.0"]);

        let entry = index.find("1.5.0").unwrap();
        assert!(entry.uploaded_at.is_some());
        let deps: Vec<&str> = entry.dependencies.keys().map(String::as_str).collect();
        assert_eq!(deps, vec!["alice/jsonutil", "bob/net"]);

        assert!(index.find("1.0.0").unwrap().dependencies.is_empty());
        assert_eq!(index.latest.unwrap().version, "1.5.0");
    }

    #[test]
    fn test_version_entry_null_dependencies_and_missing_size() {
        let json = r#"{
            "version": "2.0.0",
            "integrity": "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
            "uploadedAt": null,
            "dependencies": null
        }"#;
        let entry: VersionIndexEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.size, 0);
        assert!(entry.dependencies.is_empty());
        assert!(entry.uploaded_at.is_none());

        let json = r#"{"name": "alice/postgres", "versions": [
            {"version": "1.0.0", "integrity": "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=", "size": null},
            {"version": "1.1.0", "integrity": "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=", "dependencies": null}
        ]}"#;
        let index: VersionIndex = serde_json::from_str(json).unwrap();
        assert_eq!(index.version_strings(), vec!["1.0.0", "1.1.0"]);
        assert!(index.versions.iter().all(|v| v.size == 0 && v.dependencies.is_empty()));
    }

    #[test]
    fn test_metadata_null_dependencies_and_missing_size() {
        let json = r#"{
            "name": "alice/postgres",
            "version": "1.5.0",
            "integrity": "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
            "dependencies": null
        }"#;
        let metadata: PackageMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.size, 0);
        assert!(metadata.dependencies.is_empty());
    }

    #[test]
    fn test_version_entry_requires_integrity() {
        let json = r#"{"version": "1.0.0", "size": 1}"#;
        assert!(serde_json::from_str::<VersionIndexEntry>(json).is_err());
    }

    #[test]
    fn test_delete_response_optional_warning() {
        let json = r#"{
            "success": true,
            "deleted": {"name": "alice/postgres", "version": "1.0.0"},
            "warning": {"dependents": ["bob/app"], "message": "1 package depends on this version"}
        }"#;
        let response: DeleteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.warning.unwrap().dependents, vec!["bob/app"]);

        let json = r#"{"success": true, "deleted": {"name": "alice/postgres", "version": "1.0.0"}}"#;
        let response: DeleteResponse = serde_json::from_str(json).unwrap();
        assert!(response.warning.is_none());
    }

    #[test]
    fn test_package_list_response() {
        let json = r#"{"packages": [{"name": "alice/postgres", "latest": "1.5.0", "versionCount": 4}], "total": 1}"#;
        let response: PackageListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.packages[0].version_count, 4);
        assert_eq!(response.total, 1);
    }
}
