//! Version constraints: exact, caret (`^`) and tilde (`~`).

use super::Version;
use crate::error::{QpmError, QpmResult};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintOp {
    /// `1.2.3`
    Exact,
    /// `^1.2.3`
    Caret,
    /// `~1.2.3`
    Tilde,
}

/// A parsed version constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub op: ConstraintOp,
    pub version: Version,
}

impl Constraint {
    /// Parse a constraint, ignoring surrounding whitespace
    pub fn parse(input: &str) -> QpmResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(QpmError::InvalidConstraintFormat {
                constraint: input.to_string(),
                source: None,
            });
        }

        let (op, rest) = if let Some(rest) = trimmed.strip_prefix('^') {
            (ConstraintOp::Caret, rest)
        } else if let Some(rest) = trimmed.strip_prefix('~') {
            (ConstraintOp::Tilde, rest)
        } else {
            (ConstraintOp::Exact, trimmed)
        };

        let version = Version::parse(rest).map_err(|e| QpmError::InvalidConstraintFormat {
            constraint: input.to_string(),
            source: Some(e),
        })?;

        Ok(Self { op, version })
    }

    /// Check whether `version` satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        let base = &self.version;
        match self.op {
            ConstraintOp::Exact => version == base,
            ConstraintOp::Caret => {
                if version < base {
                    return false;
                }
                if base.major > 0 {
                    version.major == base.major
                } else if base.minor > 0 {
                    version.major == 0 && version.minor == base.minor
                } else {
                    version.major == 0 && version.minor == 0 && version.patch == base.patch
                }
            },
            ConstraintOp::Tilde => {
                version >= base && version.major == base.major && version.minor == base.minor
            },
        }
    }
}

impl FromStr for Constraint {
    type Err = QpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            ConstraintOp::Exact => write!(f, "{}", self.version),
            ConstraintOp::Caret => write!(f, "^{}", self.version),
            ConstraintOp::Tilde => write!(f, "~{}", self.version),
        }
    }
}

/// Check a version against a constraint string
pub fn satisfies(version: &Version, constraint: &str) -> QpmResult<bool> {
    Ok(Constraint::parse(constraint)?.matches(version))
}
