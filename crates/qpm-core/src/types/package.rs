//! Package identity and resolved package records.

use super::Version;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A scoped package name such as `alice/postgres`.
///
/// The `@` sigil is never stored; it is accepted on input and only re-added
/// for store paths via [`PackageName::with_sigil`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName {
    scope: String,
    name: String,
}

/// Package name parsing error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid package name '{input}': {reason}")]
pub struct PackageNameError {
    pub input: String,
    pub reason: &'static str,
}

fn is_name_segment(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

impl PackageName {
    /// Parse `scope/name` or `@scope/name`
    pub fn parse(input: &str) -> Result<Self, PackageNameError> {
        let err = |reason| PackageNameError {
            input: input.to_string(),
            reason,
        };

        let stripped = input.strip_prefix('@').unwrap_or(input);
        let (scope, name) = stripped
            .split_once('/')
            .ok_or_else(|| err("expected the form scope/name"))?;

        if !is_name_segment(scope) {
            return Err(err("scope must match [a-zA-Z0-9-]+"));
        }
        if !is_name_segment(name) {
            return Err(err("name must match [a-zA-Z0-9-]+"));
        }

        Ok(Self {
            scope: scope.to_string(),
            name: name.to_string(),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `@scope/name`, the form used for on-disk paths
    pub fn with_sigil(&self) -> String {
        format!("@{}/{}", self.scope, self.name)
    }
}

impl FromStr for PackageName {
    type Err = PackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.name)
    }
}

impl Serialize for PackageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A package pinned to an exact version by resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    /// Package name
    pub name: PackageName,
    /// Exact resolved version
    pub version: Version,
    /// Registry locator, `scope/name/version`
    pub source: String,
    /// `sha256-<base64>` integrity string of the artifact
    pub integrity: String,
    /// Artifact size in bytes, when the registry reported it
    pub size: Option<u64>,
    /// Declared dependencies of this version, in registry order
    pub dependencies: IndexMap<PackageName, String>,
}

impl ResolvedPackage {
    /// Create a resolved package with the default source locator
    pub fn new(name: PackageName, version: Version, integrity: impl Into<String>) -> Self {
        let source = source_locator(&name, &version);
        Self {
            name,
            version,
            source,
            integrity: integrity.into(),
            size: None,
            dependencies: IndexMap::new(),
        }
    }

    /// Lock-set key, `name@version`
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Registry locator for a package version
pub fn source_locator(name: &PackageName, version: &Version) -> String {
    format!("{}/{}/{}", name.scope(), name.name(), version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_sigil() {
        let plain = PackageName::parse("alice/postgres").unwrap();
        let sigil = PackageName::parse("@alice/postgres").unwrap();

        assert_eq!(plain, sigil);
        assert_eq!(sigil.to_string(), "alice/postgres");
        assert_eq!(sigil.with_sigil(), "@alice/postgres");
        assert_eq!(sigil.scope(), "alice");
        assert_eq!(sigil.name(), "postgres");
    }

    #[test]
    fn test_invalid_names() {
        for input in [
            "", "postgres", "alice/", "/postgres", "alice/post/gres", "@@alice/x", "al ice/x",
            "alice/pg_sql", "alice/x@1.0.0",
        ] {
            assert!(PackageName::parse(input).is_err(), "accepted '{}'", input);
        }
    }

    #[test]
    fn test_resolved_package_key_and_source() {
        let name = PackageName::parse("alice/jsonutil").unwrap();
        let pkg = ResolvedPackage::new(name, Version::new(2, 1, 4), "sha256-abc");

        assert_eq!(pkg.key(), "alice/jsonutil@2.1.4");
        assert_eq!(pkg.source, "alice/jsonutil/2.1.4");
    }

    #[test]
    fn test_name_serializes_as_map_key() {
        let mut deps = IndexMap::new();
        deps.insert(PackageName::parse("@bob/utils").unwrap(), "^1.0.0".to_string());

        let json = serde_json::to_string(&deps).unwrap();
        assert_eq!(json, r#"{"bob/utils":"^1.0.0"}"#);

        let back: IndexMap<PackageName, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, deps);
    }
}
