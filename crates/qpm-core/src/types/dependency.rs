//! Dependency specifications as declared in manifests and version indexes.

use super::{Constraint, PackageName};
use crate::error::{QpmError, QpmResult};
use serde::{Deserialize, Serialize};

/// A named dependency with its constraint string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: PackageName,
    /// Raw constraint text; only parsed when evaluated
    pub constraint: String,
}

impl DependencySpec {
    /// Create a dependency spec, rejecting a blank constraint
    pub fn new(name: PackageName, constraint: impl Into<String>) -> QpmResult<Self> {
        let constraint = constraint.into();
        if constraint.trim().is_empty() {
            return Err(QpmError::InvalidDependencySpec {
                package: name.to_string(),
                constraint,
                reason: "constraint must not be empty".to_string(),
            });
        }
        Ok(Self { name, constraint })
    }

    /// Parse both name and constraint from raw strings
    pub fn parse(name: &str, constraint: &str) -> QpmResult<Self> {
        let parsed = PackageName::parse(name).map_err(|e| QpmError::InvalidDependencySpec {
            package: name.to_string(),
            constraint: constraint.to_string(),
            reason: e.reason.to_string(),
        })?;
        Self::new(parsed, constraint)
    }

    /// Parse the constraint text
    pub fn parsed_constraint(&self) -> QpmResult<Constraint> {
        Constraint::parse(&self.constraint)
    }
}
