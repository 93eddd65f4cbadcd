//! Version selection against constraints
//!
//! Picks the highest available version that satisfies a constraint. Absence is
//! reported through [`Selection`], never as an error; errors are reserved for
//! malformed version or constraint strings.

use qpm_core::types::{Constraint, Version};

use crate::ResolverResult;

/// Outcome of selecting a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Highest satisfying version
    Found(Version),
    /// There were no candidates at all
    NoCandidates,
    /// Candidates exist but none satisfies the constraint
    NoneSatisfying,
}

impl Selection {
    pub fn found(&self) -> Option<&Version> {
        match self {
            Selection::Found(version) => Some(version),
            _ => None,
        }
    }
}

/// Version selector over the versions a registry offers for one package
#[derive(Debug, Clone, Default)]
pub struct VersionSelector {
    /// Available versions in registry order
    available_versions: Vec<Version>,
}

impl VersionSelector {
    /// Parse candidate strings; any malformed candidate fails the whole set
    pub fn parse<S: AsRef<str>>(candidates: &[S]) -> ResolverResult<Self> {
        let available_versions = candidates
            .iter()
            .map(|s| Version::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { available_versions })
    }

    pub fn versions(&self) -> &[Version] {
        &self.available_versions
    }

    /// Position of the highest version matching `constraint`; ties keep the earliest
    pub fn best_index(&self, constraint: &Constraint) -> Option<usize> {
        let mut best: Option<(usize, &Version)> = None;
        for (i, version) in self.available_versions.iter().enumerate() {
            if !constraint.matches(version) {
                continue;
            }
            match best {
                Some((_, current)) if version <= current => {},
                _ => best = Some((i, version)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Select the highest version matching `constraint`
    pub fn select(&self, constraint: &Constraint) -> Selection {
        if self.available_versions.is_empty() {
            return Selection::NoCandidates;
        }
        match self.best_index(constraint) {
            Some(i) => Selection::Found(self.available_versions[i].clone()),
            None => Selection::NoneSatisfying,
        }
    }
}

/// Highest candidate satisfying `constraint`
///
/// Every candidate and the constraint must parse, even when the answer would
/// otherwise be "no candidates".
pub fn find_max_satisfying<S: AsRef<str>>(
    candidates: &[S],
    constraint: &str,
) -> ResolverResult<Selection> {
    let selector = VersionSelector::parse(candidates)?;
    let constraint = Constraint::parse(constraint)?;
    Ok(selector.select(&constraint))
}
