//! Semantic version type.
//!
//! Versions follow `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`. Parsing is strict:
//! no surrounding whitespace, no sign, ASCII digits only in the numeric
//! components. Build metadata is kept for display but never takes part in
//! ordering, equality or hashing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Semantic version (major.minor.patch-prerelease+build)
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

/// Version parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("expected MAJOR.MINOR.PATCH, got '{input}'")]
    InvalidFormat { input: String },

    #[error("component '{component}' is not a non-negative integer")]
    InvalidNumber { input: String, component: String },

    #[error("invalid prerelease identifier '{prerelease}'")]
    InvalidPrerelease { input: String, prerelease: String },

    #[error("invalid build metadata '{build}'")]
    InvalidBuild { input: String, build: String },
}

impl VersionError {
    /// The full string that failed to parse
    pub fn input(&self) -> &str {
        match self {
            VersionError::InvalidFormat { input }
            | VersionError::InvalidNumber { input, .. }
            | VersionError::InvalidPrerelease { input, .. }
            | VersionError::InvalidBuild { input, .. } => input,
        }
    }
}

impl Version {
    /// Create a new release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Parse a version string
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        input.parse()
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Precedence ordering; build metadata is ignored
    fn precedence_cmp(&self, other: &Self) -> Ordering {
        match (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch)) {
            Ordering::Equal => match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            },
            other => other,
        }
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}

fn parse_component(input: &str, component: &str) -> Result<u64, VersionError> {
    let invalid = || VersionError::InvalidNumber {
        input: input.to_string(),
        component: component.to_string(),
    };

    // u64::from_str accepts a leading '+', so check the digits first
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    component.parse().map_err(|_| invalid())
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (version_part, build) = match input.split_once('+') {
            Some((v, b)) => {
                if !is_identifier(b) {
                    return Err(VersionError::InvalidBuild {
                        input: input.to_string(),
                        build: b.to_string(),
                    });
                }
                (v, Some(b.to_string()))
            },
            None => (input, None),
        };

        let (core_part, prerelease) = match version_part.split_once('-') {
            Some((c, p)) => {
                if !is_identifier(p) {
                    return Err(VersionError::InvalidPrerelease {
                        input: input.to_string(),
                        prerelease: p.to_string(),
                    });
                }
                (c, Some(p.to_string()))
            },
            None => (version_part, None),
        };

        let parts: Vec<&str> = core_part.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::InvalidFormat {
                input: input.to_string(),
            });
        }

        Ok(Version {
            major: parse_component(input, parts[0])?,
            minor: parse_component(input, parts[1])?,
            patch: parse_component(input, parts[2])?,
            prerelease,
            build,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }

        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }

        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.precedence_cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.prerelease.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_cmp(other)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v = Version::from_str("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert_eq!(v.prerelease, None);
        assert_eq!(v.build, None);
        assert!(!v.is_prerelease());
    }

    #[test]
    fn test_version_with_prerelease_and_build() {
        let v = Version::from_str("1.2.3-alpha.1+build-7").unwrap();
        assert_eq!(v.prerelease.as_deref(), Some("alpha.1"));
        assert!(v.is_prerelease());
        assert_eq!(v.build.as_deref(), Some("build-7"));
        assert_eq!(v.to_string(), "1.2.3-alpha.1+build-7");
    }

    #[test]
    fn test_rejects_malformed_versions() {
        for input in [
            "", "1", "1.2", "1.2.3.4", " 1.2.3", "1.2.3 ", "v1.2.3", "+1.2.3", "1.-2.3",
            "1.2.x", "1.2.3-", "1.2.3+", "1.2.3-al_pha", "1.2.3+b+c", "1..3",
        ] {
            assert!(Version::parse(input).is_err(), "accepted '{}'", input);
        }
    }

    #[test]
    fn test_error_carries_defect() {
        match Version::parse("1.x.3").unwrap_err() {
            VersionError::InvalidNumber { input, component } => {
                assert_eq!(input, "1.x.3");
                assert_eq!(component, "x");
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            Version::parse("1.2").unwrap_err(),
            VersionError::InvalidFormat { .. }
        ));
        assert!(matches!(
            Version::parse("1.2.3-a!").unwrap_err(),
            VersionError::InvalidPrerelease { .. }
        ));
    }

    #[test]
    fn test_version_comparison() {
        let v1 = Version::new(1, 0, 0);
        let v2 = Version::new(2, 0, 0);
        let v3 = Version::new(1, 1, 0);

        assert!(v1 < v2);
        assert!(v1 < v3);
        assert!(v3 < v2);
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 0));
    }

    #[test]
    fn test_prerelease_ordering() {
        let alpha = Version::parse("1.0.0-alpha").unwrap();
        let beta = Version::parse("1.0.0-beta").unwrap();
        let release = Version::parse("1.0.0").unwrap();

        assert!(alpha < beta);
        assert!(beta < release);
        assert!(Version::parse("0.9.9").unwrap() < alpha);
    }

    #[test]
    fn test_build_metadata_ignored() {
        use std::collections::HashSet;

        let a = Version::parse("1.0.0+linux").unwrap();
        let b = Version::parse("1.0.0+mac").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let set: HashSet<Version> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_serde_as_string() {
        let v = Version::parse("2.1.4-rc.1").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"2.1.4-rc.1\"");

        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<Version>("\"2.1\"").is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_version() -> impl Strategy<Value = Version> {
        (
            0u64..20,
            0u64..20,
            0u64..20,
            prop::option::of("[a-z]{1,3}(\\.[0-9]{1,2})?"),
        )
            .prop_map(|(major, minor, patch, prerelease)| Version {
                major,
                minor,
                patch,
                prerelease,
                build: None,
            })
    }

    proptest! {
        #[test]
        fn version_round_trip(
            major in 0u64..1000,
            minor in 0u64..1000,
            patch in 0u64..1000,
            prerelease in prop::option::of("[a-zA-Z0-9.-]+"),
            build in prop::option::of("[a-zA-Z0-9.-]+")
        ) {
            let original = Version {
                major,
                minor,
                patch,
                prerelease: prerelease.clone(),
                build: build.clone(),
            };

            let parsed = Version::from_str(&original.to_string()).unwrap();

            prop_assert_eq!(parsed.major, original.major);
            prop_assert_eq!(parsed.minor, original.minor);
            prop_assert_eq!(parsed.patch, original.patch);
            prop_assert_eq!(parsed.prerelease, original.prerelease);
            prop_assert_eq!(parsed.build, original.build);
        }

        #[test]
        fn version_ordering_is_total(a in arb_version(), b in arb_version()) {
            let lt = a < b;
            let eq = a == b;
            let gt = a > b;
            prop_assert_eq!(u8::from(lt) + u8::from(eq) + u8::from(gt), 1);
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }

        #[test]
        fn version_comparison_transitivity(
            a in arb_version(),
            b in arb_version(),
            c in arb_version(),
        ) {
            if a <= b && b <= c {
                prop_assert!(a <= c, "Transitivity violated: {} <= {} <= {} but {} > {}", a, b, c, a, c);
            }
            if a >= b && b >= c {
                prop_assert!(a >= c, "Transitivity violated: {} >= {} >= {} but {} < {}", a, b, c, a, c);
            }
        }
    }
}
